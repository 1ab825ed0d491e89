//! Tenant OAuth server binary.
//!
//! Main application entry point that loads the hosted tenants, mounts the
//! dynamic client registration endpoints and starts the HTTP server with
//! graceful shutdown.

use anyhow::Result;
use std::{env, sync::Arc};
use tenant_oauth::{
    config::Config,
    http::{AppState, build_router},
    storage::MemoryDocumentStore,
    tenant::{Tenant, TenantRegistry},
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tenant_oauth=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = tenant_oauth::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting tenant-oauth");

    let config = Config::new()?;

    // One document store per tenant
    let mut tenants = TenantRegistry::new();
    for tenant in config.tenants.as_ref() {
        if tenant.generated_key {
            tracing::warn!(
                domain = %tenant.domain,
                nspace = "oauth",
                "No signing key configured, generated one: tokens will not survive a restart"
            );
        }
        tenants.insert(Tenant::new(
            tenant.domain.clone(),
            tenant.signing_key.clone(),
            Arc::new(MemoryDocumentStore::new()),
        ));
        tracing::info!(domain = %tenant.domain, "Hosting tenant");
    }

    let http_port = *config.http_port.as_ref();
    if !*config.enable_client_registration.as_ref() {
        tracing::info!("Dynamic client registration is disabled");
    }

    // Build the router
    let app = build_router(AppState::new(config, tenants));

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    tracing::error!("failed to install signal handler: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Start HTTP server
    {
        let bind_address = format!("0.0.0.0:{http_port}");
        tracing::info!("Starting server on {bind_address}");
        let listener = TcpListener::bind(&bind_address).await?;

        let inner_token = token.clone();
        tracker.spawn(async move {
            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_token.cancelled().await;
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
