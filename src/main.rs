use anyhow::{Context, Result};
use clap::Parser;
use std::net::Ipv4Addr;
use std::sync::Arc;
use student_registry::{api, config, logging, service::StudentService};
use tokio::net::TcpListener;

/// In-memory student registry with generator-backed summaries.
#[derive(Parser)]
#[command(name = "student-registry", version)]
struct Cli {
    /// Port to listen on (overrides `SERVER_PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Base URL of the text-generation service (overrides `OLLAMA_URL`).
    #[arg(long)]
    ollama_url: Option<String>,
    /// Model used for summaries (overrides `SUMMARY_MODEL`).
    #[arg(long)]
    model: Option<String>,
    /// Upper bound on a summary request in seconds (overrides `SUMMARY_TIMEOUT_SECS`).
    #[arg(long)]
    summary_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv_path = config::load_dotenv();
    logging::init_tracing();
    if let Some(path) = &dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }
    let config = config::init_config(|config| {
        if let Some(port) = cli.port {
            config.server_port = port;
        }
        if let Some(url) = cli.ollama_url {
            config.ollama_url = url;
        }
        if let Some(model) = cli.model {
            config.summary_model = model;
        }
        if let Some(secs) = cli.summary_timeout_secs {
            config.summary_timeout_secs = Some(secs);
        }
    })
    .context("failed to load configuration")?;

    let service =
        StudentService::from_config(config).context("failed to build generator client")?;
    let app = api::create_router(Arc::new(service));

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}
