//! Roleguard API - authentication and role gateway
//!
//! Sits in front of a hosted backend platform. Identity verification, account
//! storage, profile rows and object storage all live on the platform; this
//! server verifies bearer tokens through it, decides each caller's role and
//! gates the admin operations.
//!
//! Role resolution:
//! - The configured fail-safe admin email is always `admin`, without a store lookup
//! - Everyone else gets the role stored in their profile row
//! - No row, or a failed lookup, means `user`

mod auth;
mod config;
mod error;
mod platform;
mod profiles;
mod routes;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("Starting Roleguard API...");

    // Load configuration
    let settings = Settings::load()?;
    info!("Configuration loaded, platform at {}", settings.platform.url);

    if settings.auth.fail_safe_admin_email.is_empty() {
        warn!("FAIL_SAFE_ADMIN_EMAIL not set, admin access depends on stored profile roles only");
    }

    let state = Arc::new(AppState::from_platform(&settings)?);

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("API Endpoints:");
    info!("   GET  /health                     - Health check");
    info!("   POST /api/auth/register          - Create account");
    info!("   POST /api/auth/login             - Login with email/password");
    info!("   GET  /api/auth/oauth/{{provider}}  - Start third-party sign-in");
    info!("   POST /api/auth/oauth/callback    - Finish third-party sign-in");
    info!("   GET  /api/auth/me                - Current user and role");
    info!("   POST /api/storage/upload-url     - Signed upload URL");
    info!("   GET  /api/admin/profiles         - List profiles (Admin only)");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roleguard_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
