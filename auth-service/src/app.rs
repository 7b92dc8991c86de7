use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use common_auth::{CredentialStore, TokenService};

use crate::config::AuthServiceConfig;
use crate::handlers::{admin_login, admin_register, admin_stats, health, login, me, register};
use crate::metrics::{render_metrics, AuthMetrics};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AuthServiceConfig>,
    pub metrics: Arc<AuthMetrics>,
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CredentialStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<AuthServiceConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl AppState {
    pub fn record_login_metric(&self, outcome: &str) {
        self.metrics.login_attempt(outcome);
    }

    pub fn record_registration_metric(&self, outcome: &str) {
        self.metrics.registration(outcome);
    }
}

/// Routes shared by `main` and the integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(render_metrics))
        .route("/auth/register", post(register))
        .route("/auth/admin/register", post(admin_register))
        .route("/auth/login", post(login))
        .route("/auth/admin/login", post(admin_login))
        .route("/auth/me", get(me))
        .route("/auth/admin/stats", get(admin_stats))
        .with_state(state)
}
