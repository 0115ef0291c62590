//! Totem - café ordering backend
//! Mission: Serve the menu, take orders and payments, keep staff in control

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use totem_backend::{
    api::create_router,
    auth::{AuthState, CredentialStore, JwtHandler},
    config::{load_env, Config},
    store::Database,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();
    info!("☕ Totem backend v{} starting", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&config.db_path, config.bcrypt_cost)
        .with_context(|| format!("Failed to open database at {}", config.db_path))?;
    info!("💾 Database ready at {}", config.db_path);

    let created = db
        .ensure_admin(&config.admin_name, &config.admin_email, &config.admin_password)
        .context("Failed to create bootstrap admin")?;
    if created && config.uses_default_admin_password() {
        warn!("⚠️  Bootstrap admin uses the default password - CHANGE IT IN PRODUCTION!");
    }

    if config.uses_dev_secret() {
        warn!("⚠️  JWT_SECRET not set - using the development secret");
    }

    let jwt_handler = Arc::new(
        JwtHandler::new(config.jwt_secret.clone())
            .with_expiration(Duration::minutes(config.jwt_expiration_minutes)),
    );
    let credentials = CredentialStore::new(db.clone())
        .with_reset_ttl(Duration::minutes(config.reset_ttl_minutes));
    let auth_state = AuthState::new(credentials, jwt_handler);

    let app = create_router(db, auth_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "totem_backend=debug,totem=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
