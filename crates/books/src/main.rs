mod app;
mod cache;
mod config;
mod consumer;
mod handlers;
mod idempotency;
mod queue;
mod service;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::create_app,
    config::Config,
    service::WriteMode,
    state::{AppState, Backends},
};

/// Books - CRUD service with an asynchronous ingestion pipeline
#[derive(Parser, Debug)]
#[command(name = "books")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "5000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "books=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing required settings are fatal here, before anything is bound
    let config = Config::from_env()?;
    tracing::info!(write_mode = %config.write_mode, "Loaded configuration");

    let backends = Backends::from_config(&config).await?;
    let state = AppState::new(&config, &backends);

    // The ingestion pipeline only has work to do when creates are staged
    let consumer_task = match config.write_mode {
        WriteMode::Async => {
            let consumer = backends.consumer(&config);
            let shutdown_rx = state.subscribe_shutdown();
            Some(tokio::spawn(async move { consumer.run(shutdown_rx).await }))
        }
        WriteMode::Sync => None,
    };

    // Build the application router
    let app = create_app(state.clone());

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    // Let the consumer finish the message it is working on
    if let Some(task) = consumer_task {
        if let Err(err) = task.await {
            tracing::error!(error = %err, "Consumer task failed");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM) and notify background tasks.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    // Stop the consumer loop
    state.signal_shutdown();
}
