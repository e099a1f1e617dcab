#![doc = include_str!("../README.md")]

mod server;

use axum::Router;
use clap::Parser;
use server::config::{CliArgs, ServerConfig};
use server::routes::build_router;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    #[cfg(feature = "tracing")]
    if config.pace_workers == 0 {
        tracing::warn!("PACE_WORKERS is 0: requests to /pace will never complete");
    }

    let listener = TcpListener::bind(config.server_addr).await?;
    log_startup_info(&config);

    let router = build_router(&config);
    serve(listener, router, shutdown_signal(), || providers.shutdown()).await
}

/// Serves `router` until `shutdown` resolves and every open connection has
/// been drained, then calls `on_drained`.
async fn serve<S, F>(
    listener: TcpListener,
    router: Router,
    shutdown: S,
    on_drained: F,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
    F: FnOnce(),
{
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await;

    #[cfg(feature = "tracing")]
    match &served {
        Ok(()) => tracing::info!("Server shut down successfully"),
        Err(e) => tracing::error!("Server stopped with an error: {e}"),
    }

    // Telemetry is flushed here, after the last in-flight request finished.
    on_drained();
    served?;
    Ok(())
}

fn log_startup_info(_config: &ServerConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Listening on {} with full config: {:#?}",
            _config.server_addr,
            _config
        );
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Listening on {} with {} pace workers and {} redirects",
            _config.server_addr,
            _config.pace_workers,
            _config.redirects.len()
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to install SIGTERM handler: {_e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(_e) = signal::ctrl_c().await {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to install Ctrl+C handler: {_e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Shutdown signal received, draining connections...");
}
