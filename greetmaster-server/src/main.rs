//! Greetmaster HTTP server.
//!
//! Usage: greetmaster [--config <path>]

mod api;
mod assets;
mod config;
mod error;
mod index;
mod logging;
mod pages;
mod params;
mod routes;
mod state;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use clap::Parser;
use config::Config;
use state::{display_path, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// Time open HTTPS connections get to finish after a shutdown signal.
const HTTPS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "greetmaster")]
#[command(about = "Serve the Greetmaster e-card archive")]
struct Args {
    /// Path to the JSON or YAML config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = Config::load(&args.config)?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();
    logging::init(&config)?;
    if config_found {
        info!(path = %display_path(&args.config), "loaded config");
    } else {
        info!(path = %args.config.display(), "config file not found, using defaults");
    }

    let listener = TcpListener::bind((config.host_name.as_str(), config.http_port)).await?;
    let https = match config.https_files() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            let addr = tokio::net::lookup_host((config.host_name.as_str(), config.https_port))
                .await?
                .next()
                .ok_or("host name did not resolve to an address")?;
            Some((addr, tls))
        }
        None => None,
    };
    let state = Arc::new(AppState::load(config)?);
    let router = routes::build_router(state);

    let https_handle = Handle::new();
    let https_server = https.map(|(addr, tls)| {
        info!("listening on https://{}", addr);
        let server = axum_server::bind_rustls(addr, tls)
            .handle(https_handle.clone())
            .serve(router.clone().into_make_service_with_connect_info::<SocketAddr>());
        tokio::spawn(server)
    });

    info!("listening on http://{}", listener.local_addr()?);
    let shutdown_handle = https_handle.clone();
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(HTTPS_SHUTDOWN_GRACE));
    })
    .await?;
    if let Some(server) = https_server {
        server.await??;
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
