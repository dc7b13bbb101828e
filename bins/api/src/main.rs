//! nfv-test-api - HTTP API for remote network configuration of a test host.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nfvtest::api::{AppState, router};
use nfvtest::{Config, Host};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nfv-test-api",
    version,
    about = "Network configuration API for test hosts"
)]
struct Cli {
    /// Config file [default: /etc/nfv-test-api.yaml].
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;

    let host = Host::system().with_timeout(config.command_timeout());
    let state = AppState::new(host, &config);
    let app = router(state.clone());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to listen on {}", address))?;
    tracing::info!(%address, "serving nfv-test-api");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("stopping simulator processes");
    state.processes().shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown requested");
}
