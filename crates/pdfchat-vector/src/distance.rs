//! Distance metrics for vector similarity.
//!
//! Every metric is exposed as a similarity score where higher means closer,
//! so the store can rank results the same way regardless of the metric.

use std::fmt;

/// Similarity metric used when ranking stored embeddings against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DistanceMetric {
    /// Cosine similarity, range [-1, 1]. Zero-norm inputs score 0.
    #[default]
    Cosine,

    /// Euclidean (L2) distance mapped to `1 / (1 + d)`.
    Euclidean,

    /// Raw inner product.
    DotProduct,

    /// Manhattan (L1) distance mapped to `1 / (1 + d)`.
    Manhattan,
}

impl DistanceMetric {
    /// Similarity between `a` and `b`; higher is more similar.
    ///
    /// Callers are expected to pass vectors of equal length. Extra trailing
    /// components of the longer vector are ignored.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
            DistanceMetric::DotProduct => dot_product(a, b),
            DistanceMetric::Manhattan => 1.0 / (1.0 + manhattan_distance(a, b)),
        }
    }

    /// Name used in configuration and logs.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "dot" | "dot_product" | "inner" => Ok(DistanceMetric::DotProduct),
            "manhattan" | "l1" => Ok(DistanceMetric::Manhattan),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

/// Cosine similarity: `dot(a, b) / (|a| * |b|)`, or 0.0 when either norm is zero.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[inline]
fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
