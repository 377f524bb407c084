//! # accessgend
//!
//! Composition root of the access-event generator.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise structured logging
//! - Build the reqwest transport from the transport and boot settings
//! - Hand devices, users and pacing to the fleet runner
//! - Cancel every simulator on SIGINT/SIGTERM and wait for them to stop
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no simulation logic belongs here.

mod config;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use accessgen_adapter_http_reqwest::ReqwestTransport;
use accessgen_app::fleet::FleetRunner;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    tracing::info!(
        devices = config.devices.len(),
        users = config.users.len(),
        default_uri = %config.boot.default_uri,
        "starting accessgend"
    );

    let transport = Arc::new(ReqwestTransport::new(
        &config.transport,
        config.boot.certificate_validation,
    )?);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let summary = FleetRunner::new(
        transport,
        config.boot,
        config.requests,
        config.devices,
        config.users,
    )
    .run(shutdown)
    .await;

    if summary.started == 0 {
        return Err("no device could be set up".into());
    }
    Ok(())
}

async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        () = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
    shutdown.cancel();
}
