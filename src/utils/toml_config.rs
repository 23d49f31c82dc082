//! TOML-based configuration for the pdfchat server
//!
//! Settings for the HTTP server, the OpenAI-compatible provider, the RAG
//! pipeline and the session registry live in a single TOML file
//! (`pdfchat.toml`). Every field has a default, so a missing file is not an
//! error for the server binary.
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `AppConfigManager` for thread-safe access to the current configuration.
//! Values are read per request, so a reload affects the next upload or
//! question; sessions that already exist keep the chunks they were built with.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Default instruction placed ahead of the retrieved context.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Use the following context from a PDF to answer the user's question.";

/// Root configuration structure loaded from pdfchat.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest accepted request body, uploads included
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============= Provider Configuration =============

/// OpenAI-compatible endpoint used for both chat and embeddings.
///
/// There is deliberately no API key here: every request supplies its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Upper bound for a single provider call, and for the gap between
    /// two streamed fragments
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            default_model: default_model(),
            embedding_model: default_embedding_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_system_prompt")]
    pub default_system_prompt: String,

    /// Maximum texts per embeddings request
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Where uploads are written while being parsed. Defaults to the
    /// system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    4
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_embedding_batch_size() -> usize {
    1024
}

impl RagConfig {
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            default_system_prompt: default_system_prompt(),
            embedding_batch_size: default_embedding_batch_size(),
            staging_dir: None,
        }
    }
}

// ============= Session Registry Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Least recently used sessions are evicted past this count
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Sessions idle longer than this are dropped; 0 disables expiry
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_sessions() -> usize {
    256
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl SessionsConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl AppConfig {
    /// Load and validate configuration from a TOML file. The file must exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();

        config.validate()?;

        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if path.exists() {
            return Self::load(path);
        }

        info!("No configuration at {:?}, using defaults", path);
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `PDFCHAT_HOST`, `PDFCHAT_PORT` and `PDFCHAT_API_BASE` win over the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PDFCHAT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PDFCHAT_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PDFCHAT_PORT value: {}", port),
            }
        }
        if let Ok(base) = std::env::var("PDFCHAT_API_BASE") {
            self.llm.api_base = base;
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }

        if self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "rag.top_k must be greater than 0".to_string(),
            ));
        }

        if self.rag.embedding_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.embedding_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "sessions.max_sessions must be greater than 0".to_string(),
            ));
        }

        if self.llm.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.api_base must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct AppConfigManager {
    config: Arc<ArcSwap<AppConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl AppConfigManager {
    /// Create a new configuration manager and load the initial config.
    ///
    /// A missing file is tolerated and yields defaults; a malformed or
    /// invalid one is an error.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = AppConfig::load_or_default(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.load_full()
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = AppConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let file_name = self.config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // The file may not exist yet, so watch its directory
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let mut last_reload: Option<std::time::Instant> = None;
            let debounce_duration = Duration::from_millis(500);

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|t| t.elapsed() < debounce_duration) {
                    continue;
                }

                // Let the writer finish
                tokio::time::sleep(Duration::from_millis(100)).await;

                match AppConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }

    /// Create a config manager directly from a config (useful for testing).
    /// This won't have file watching capabilities.
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("test-config.toml"),
            watcher: RwLock::new(None),
        }
    }
}
