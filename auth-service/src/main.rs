use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use common_auth::{CredentialStore, TokenConfig, TokenService};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use auth_service::bootstrap::ensure_default_admin;
use auth_service::config::load_config;
use auth_service::metrics::AuthMetrics;
use auth_service::store::PgCredentialStore;
use auth_service::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        )
        .init();

    let config = load_config()?;

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url).await?;
    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));

    ensure_default_admin(store.as_ref(), &config).await?;

    let tokens = Arc::new(TokenService::new(TokenConfig {
        secret: config.jwt_secret.clone(),
        ttl_seconds: config.token_ttl_seconds,
    }));

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    let state = AppState {
        store,
        tokens,
        config: Arc::new(config),
        metrics: Arc::new(AuthMetrics::new()?),
    };
    let app = app::router(state).layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5001);
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::from((ip, port));

    info!(%addr, "starting auth-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
