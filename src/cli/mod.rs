//! CLI module for the pdfchat server
//!
//! Provides command-line interface parsing and handling for the pdfchat-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::toml_config::AppConfig;
use clap::{Parser, Subcommand};
use output::Output;
use std::path::PathBuf;

/// pdfchat - chat with your documents
///
/// Upload a PDF or text file, then ask questions answered from the passages
/// most similar to each question.
#[derive(Parser, Debug)]
#[command(
    name = "pdfchat-server",
    version,
    about = "pdfchat - document-grounded chat server",
    after_help = "EXAMPLES:\n    \
                  pdfchat-server                          # Start with ./pdfchat.toml or defaults\n    \
                  pdfchat-server --port 9000 --json-logs  # Override the port, log as JSON\n    \
                  pdfchat-server config --validate        # Check the configuration and exit"
)]
pub struct Cli {
    /// Path to the configuration file (defaults apply if it is missing)
    #[arg(short, long, default_value = "pdfchat.toml", global = true)]
    pub config: PathBuf,

    /// Bind address, overriding the configuration
    #[arg(long, env = "PDFCHAT_HOST")]
    pub host: Option<String>,

    /// Port, overriding the configuration
    #[arg(short, long, env = "PDFCHAT_PORT")]
    pub port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Do not reload the configuration when the file changes
    #[arg(long)]
    pub no_watch: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration information
    Config {
        /// Validate the configuration and exit with an error if it is invalid
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn output(&self) -> Output {
        if self.no_color {
            Output::no_color()
        } else {
            Output::new()
        }
    }
}

/// Print the effective configuration.
pub fn print_config(out: &Output, config: &AppConfig) {
    out.header("Server");
    out.kv("host", &config.server.host);
    out.kv("port", &config.server.port.to_string());
    out.kv("log_level", &config.server.log_level);
    out.kv("max_upload_bytes", &config.server.max_upload_bytes.to_string());

    out.header("Provider");
    out.kv("api_base", &config.llm.api_base);
    out.kv("default_model", &config.llm.default_model);
    out.kv("embedding_model", &config.llm.embedding_model);
    out.kv("request_timeout_secs", &config.llm.request_timeout_secs.to_string());

    out.header("Retrieval");
    out.kv("chunk_size", &config.rag.chunk_size.to_string());
    out.kv("chunk_overlap", &config.rag.chunk_overlap.to_string());
    out.kv("top_k", &config.rag.top_k.to_string());
    out.kv("embedding_batch_size", &config.rag.embedding_batch_size.to_string());
    out.kv("staging_dir", &config.rag.staging_dir().display().to_string());

    out.header("Sessions");
    out.kv("max_sessions", &config.sessions.max_sessions.to_string());
    out.kv("idle_ttl_secs", &config.sessions.idle_ttl_secs.to_string());
    out.kv("sweep_interval_secs", &config.sessions.sweep_interval_secs.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "pdfchat-server",
            "--config",
            "custom.toml",
            "--port",
            "9000",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.port, Some(9000));
        assert!(cli.json_logs);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["pdfchat-server", "config", "--validate"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config { validate: true })));
    }
}
