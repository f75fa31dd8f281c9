use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use netwarden::config::{LoggingConfig, NetwardenConfig};
use netwarden::filter::{FilterEngine, Request};
use netwarden::http::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "netwarden")]
#[command(author, version, about = "Request filtering engine with blocklists, rules and rate limiting")]
struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the HTTP listen address
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP filtering service (default)
    Serve,
    /// Evaluate a single request and print the verdict as JSON
    Check {
        #[arg(long)]
        source: String,
        #[arg(long)]
        dest: String,
        #[arg(long)]
        protocol: String,
        #[arg(long)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NetwardenConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NetwardenConfig::default(),
    };
    if let Some(addr) = args.listen {
        config.server.http_addr = addr;
    }

    init_tracing(&config.logging)?;

    let engine = Arc::new(FilterEngine::new(config.filter));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("Starting Netwarden filtering service");
            info!("Version: {}", env!("CARGO_PKG_VERSION"));

            HttpServer::new(config.server.http_addr, engine)
                .serve_with_shutdown(shutdown_signal())
                .await?;

            info!("Netwarden filtering service stopped");
        }
        Command::Check { source, dest, protocol, port } => {
            let response = engine.filter(&Request::new(source, dest, protocol, port));
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Install the global subscriber. RUST_LOG takes precedence over the config.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
