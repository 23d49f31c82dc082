use anyhow::Context;
use pdfchat::{
    AppConfigManager, AppState, OpenAIProviderFactory,
    api::routes::build_app,
    cli::{Cli, Commands, print_config},
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let out = cli.output();

    if let Some(Commands::Config { validate }) = &cli.command {
        return run_config_command(&cli, *validate);
    }

    let config_manager = AppConfigManager::new(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let config = config_manager.config();

    init_tracing(&config.server.log_level, cli.json_logs);

    if !cli.json_logs {
        out.banner();
    }

    if !cli.no_watch {
        if let Err(e) = config_manager.start_watching() {
            tracing::warn!(error = %e, "Configuration hot reload disabled");
        }
    }

    let config_manager = Arc::new(config_manager);
    let providers = Arc::new(OpenAIProviderFactory::new(Arc::clone(&config_manager)));
    let state = AppState::new(Arc::clone(&config_manager), providers);

    let sweeper = Arc::clone(&state.sessions).spawn_sweeper(config.sessions.sweep_interval());

    let host = cli.host.clone().unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    if !cli.json_logs {
        out.info(&format!("Listening on http://{}/api", addr));
    }

    tracing::info!(
        %addr,
        api_base = %config.llm.api_base,
        default_model = %config.llm.default_model,
        "pdfchat server listening"
    );

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    config_manager.stop_watching();
    tracing::info!("Server stopped");

    Ok(())
}

fn run_config_command(cli: &Cli, validate: bool) -> anyhow::Result<()> {
    let out = cli.output();

    match AppConfigManager::new(&cli.config) {
        Ok(manager) => {
            print_config(&out, &manager.config());
            if validate {
                out.success("Configuration is valid");
            }
            Ok(())
        }
        Err(e) => {
            out.error(&e.to_string());
            Err(e).context("invalid configuration")
        }
    }
}

/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdfchat={log_level},tower_http={log_level}")));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
