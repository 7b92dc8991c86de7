use std::sync::Arc;
use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use auth_service::config::AuthServiceConfig;
use auth_service::metrics::AuthMetrics;
use auth_service::{app, AppState};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use common_auth::{
    CredentialStore, Identity, MemoryStore, NewIdentity, Role, TokenConfig, TokenService,
};
use http_body_util::BodyExt;
use pg_embed::pg_enums::PgAuthMethod;
use pg_embed::pg_fetch::{PgFetchSettings, PG_V13};
use pg_embed::postgres::{PgEmbed, PgSettings};
use portpicker::pick_unused_port;
use rand_core::OsRng;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt;

#[allow(dead_code)]
pub const SIGNING_SECRET: &str = "integration-test-secret";
#[allow(dead_code)]
pub const ENROLLMENT_CODE: &str = "integration-enroll";
#[allow(dead_code)]
pub const TOKEN_TTL_SECONDS: i64 = 900;

#[allow(dead_code)]
pub fn test_config() -> AuthServiceConfig {
    AuthServiceConfig {
        jwt_secret: SIGNING_SECRET.to_string(),
        token_ttl_seconds: TOKEN_TTL_SECONDS,
        admin_enrollment_code: ENROLLMENT_CODE.to_string(),
        bootstrap_admin: false,
        bootstrap_admin_email: None,
        bootstrap_admin_secret: None,
        cors_origins: Vec::new(),
    }
}

#[allow(dead_code)]
pub fn token_service() -> TokenService {
    TokenService::new(TokenConfig {
        secret: SIGNING_SECRET.to_string(),
        ttl_seconds: TOKEN_TTL_SECONDS,
    })
}

#[allow(dead_code)]
pub fn build_app(store: Arc<MemoryStore>) -> Router {
    let dyn_store: Arc<dyn CredentialStore> = store;
    let state = AppState {
        store: dyn_store,
        tokens: Arc::new(token_service()),
        config: Arc::new(test_config()),
        metrics: Arc::new(AuthMetrics::new().expect("metrics registry")),
    };
    app::router(state)
}

#[allow(dead_code)]
pub async fn seed_identity(
    store: &MemoryStore,
    name: &str,
    email: &str,
    secret: &str,
    role: Role,
) -> Identity {
    let salt = SaltString::generate(&mut OsRng);
    let secret_hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .expect("hash secret")
        .to_string();

    store
        .create(NewIdentity {
            name: name.to_string(),
            email: email.to_string(),
            secret_hash,
            role,
        })
        .await
        .expect("seed identity")
}

#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    app.clone().oneshot(request).await.expect("dispatch")
}

#[allow(dead_code)]
pub async fn get_with_token(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).expect("build request");
    app.clone().oneshot(request).await.expect("dispatch")
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("parse body json")
}

#[allow(dead_code)]
pub struct TestDatabase {
    pool: PgPool,
    embedded: Option<(PgEmbed, TempDir)>,
}

#[allow(dead_code)]
impl TestDatabase {
    /// Connects to `AUTH_TEST_DATABASE_URL` when set, or boots an embedded
    /// Postgres when `AUTH_TEST_USE_EMBED=1`. Returns `None` otherwise so
    /// the suite can skip on machines without Postgres.
    pub async fn setup() -> Result<Option<Self>> {
        if let Ok(url) = env::var("AUTH_TEST_DATABASE_URL") {
            let pool = connect(&url).await?;
            if flag("AUTH_TEST_APPLY_MIGRATIONS") {
                apply_migrations(&pool).await?;
            }
            return Ok(Some(Self {
                pool,
                embedded: None,
            }));
        }

        if !flag("AUTH_TEST_USE_EMBED") {
            eprintln!(
                "Skipping Postgres store tests: set AUTH_TEST_DATABASE_URL or AUTH_TEST_USE_EMBED=1 to run them.",
            );
            return Ok(None);
        }

        if flag("AUTH_TEST_EMBED_CLEAR_CACHE") {
            if let Some(cache) = dirs::cache_dir() {
                let _ = std::fs::remove_dir_all(cache.join("pg-embed"));
            }
        }

        let data_dir = tempdir()?;
        let port = pick_unused_port().context("no free port for embedded Postgres")?;

        let mut fetch_settings = PgFetchSettings::default();
        fetch_settings.version = PG_V13;

        let mut pg = PgEmbed::new(
            PgSettings {
                database_dir: data_dir.path().to_path_buf(),
                port,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                auth_method: PgAuthMethod::Plain,
                persistent: false,
                timeout: Some(Duration::from_secs(30)),
                migration_dir: None,
            },
            fetch_settings,
        )
        .await?;
        pg.setup().await?;
        pg.start_db().await?;

        let pool = connect(&format!("{}/postgres", pg.db_uri)).await?;
        apply_migrations(&pool).await?;

        Ok(Some(Self {
            pool,
            embedded: Some((pg, data_dir)),
        }))
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub async fn teardown(self) -> Result<()> {
        if let Some((mut pg, _data_dir)) = self.embedded {
            let _ = pg.stop_db().await;
        }
        Ok(())
    }
}

#[allow(dead_code)]
async fn connect(url: &str) -> Result<PgPool> {
    Ok(PgPoolOptions::new().max_connections(5).connect(url).await?)
}

#[allow(dead_code)]
async fn apply_migrations(pool: &PgPool) -> Result<()> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let mut files = std::fs::read_dir(&dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.sort();

    for path in files {
        let sql = std::fs::read_to_string(&path)?;
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(pool).await?;
        }
    }
    Ok(())
}

#[allow(dead_code)]
fn flag(key: &str) -> bool {
    matches!(
        env::var(key).as_deref(),
        Ok("1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
    )
}
