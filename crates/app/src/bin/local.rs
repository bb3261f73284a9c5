// Tokenauth API - Local Development Server

use std::net::SocketAddr;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tokenauth_app::{Account, AccountStore};
use tokenauth_common::{ServerConfig, TokenAuthSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .pretty()
        .init();

    info!("Starting Tokenauth API local development server");

    let settings = TokenAuthSettings::from_env().map_err(|e| {
        error!("Failed to load token authentication settings: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let store = demo_accounts();

    let app = tokenauth_app::create_app(settings, store).map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .into_inner(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Server starting on http://{}", addr);
    info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Seed accounts from `DEMO_USER_TOKEN` and `DEMO_ADMIN_TOKEN`.
fn demo_accounts() -> AccountStore {
    let user_token = std::env::var("DEMO_USER_TOKEN").ok();
    let admin_token = std::env::var("DEMO_ADMIN_TOKEN").ok();

    if user_token.is_none() && admin_token.is_none() {
        warn!("No demo tokens configured; every token authentication attempt will fail");
    }

    AccountStore::new()
        .with_account(Account::new(
            "User",
            "demo@example.com",
            "demo",
            user_token.as_deref(),
        ))
        .with_account(Account::new(
            "AdminUser",
            "admin@example.com",
            "admin",
            admin_token.as_deref(),
        ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
