use anyhow::Context;
use clap::Parser;
use deepcloud::api;
use deepcloud::cli::Cli;
use deepcloud::controller::ControllerService;
use deepcloud::k8s::K8sClient;
use deepcloud::metrics::ApiMetrics;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting deepcloud-controller v{}", deepcloud::VERSION);

    if let Err(e) = run(cli).await {
        eprintln!("deepcloud-controller: could not start service: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cluster = K8sClient::try_default(&cli.namespace)
        .await
        .context("Kubernetes API is not reachable")?;

    let controller = ControllerService::new(Arc::new(cluster), cli.launch_port)
        .with_request_timeout(cli.request_timeout());
    let metrics = ApiMetrics::new().context("Failed to register metrics")?;

    let app = api::router(Arc::new(controller), metrics);

    let addr = cli.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Listening on {} (namespace {}, launch port {})",
        addr, cli.namespace, cli.launch_port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("deepcloud-controller stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
