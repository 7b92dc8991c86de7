use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common_auth::{ensure_admin, CurrentUser, GuardError, NewIdentity, PublicIdentity, Role, StoreError};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::AppState;

const MIN_SECRET_LENGTH: usize = 6;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

/// Handler-level failure: HTTP status plus a body that deliberately carries
/// no more detail than the client needs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code,
                message: message.into(),
            },
        }
    }

    /// Shared by unknown email, wrong secret, deactivated account, and the
    /// admin-variant role check, so none of them can be told apart.
    fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid credentials. Please try again.",
        )
    }

    fn conflict() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "EMAIL_TAKEN",
            "An account with this email already exists.",
        )
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    fn invalid_enrollment_code() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "ENROLLMENT_CODE",
            "Invalid admin enrollment code.",
        )
    }

    fn internal<E: std::fmt::Display>(err: E) -> Self {
        error!(error = %err, "internal error while handling auth request");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERVER_ERROR",
            "Something went wrong. Please try again later.",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        let GuardError::Forbidden { required } = err;
        warn!(required = %required, "request failed role requirement");
        Self::new(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Access denied. Admin only.",
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub secret: String,
    #[serde(default)]
    pub enrollment_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicIdentity,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    register_identity(state, request, false).await
}

pub async fn admin_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    register_identity(state, request, true).await
}

async fn register_identity(
    state: AppState,
    request: RegisterRequest,
    admin_variant: bool,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("Name must not be empty."));
    }
    let email = normalize_email(&request.email)?;

    let role = if admin_variant {
        match request.enrollment_code.as_deref() {
            Some(code) if code == state.config.admin_enrollment_code => Role::Admin,
            _ => {
                state.record_registration_metric("bad_enrollment");
                warn!(email = %email, "admin registration rejected: enrollment code mismatch");
                return Err(ApiError::invalid_enrollment_code());
            }
        }
    } else {
        Role::User
    };

    let secret_hash = hash_secret(&request.secret)?;

    let identity = match state
        .store
        .create(NewIdentity {
            name,
            email,
            secret_hash,
            role,
        })
        .await
    {
        Ok(identity) => identity,
        Err(StoreError::DuplicateEmail) => {
            state.record_registration_metric("conflict");
            return Err(ApiError::conflict());
        }
        Err(err) => return Err(ApiError::internal(err)),
    };

    let issued = state.tokens.issue(&identity).map_err(ApiError::internal)?;
    state.record_registration_metric("success");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: issued.token,
            user: identity.public(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    login_identity(state, request, false).await
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    login_identity(state, request, true).await
}

async fn login_identity(
    state: AppState,
    request: LoginRequest,
    admin_variant: bool,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = request.email.trim();

    let identity = match state.store.find_by_email(email).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            state.record_login_metric("invalid");
            warn!("login rejected: unknown email");
            return Err(ApiError::invalid_credentials());
        }
        Err(err) => return Err(ApiError::internal(err)),
    };

    if !verify_secret(&request.secret, &identity.secret_hash) {
        state.record_login_metric("invalid");
        warn!(identity = %identity.id, "login rejected: secret mismatch");
        return Err(ApiError::invalid_credentials());
    }

    if !identity.active {
        state.record_login_metric("inactive");
        warn!(identity = %identity.id, "login rejected: identity deactivated");
        return Err(ApiError::invalid_credentials());
    }

    if admin_variant && !identity.role.is_admin() {
        state.record_login_metric("not_admin");
        warn!(identity = %identity.id, "admin login rejected: identity is not an admin");
        return Err(ApiError::invalid_credentials());
    }

    let issued = state.tokens.issue(&identity).map_err(ApiError::internal)?;
    state.record_login_metric("success");

    Ok(Json(AuthResponse {
        token: issued.token,
        user: identity.public(),
    }))
}

pub async fn me(user: CurrentUser) -> Json<PublicIdentity> {
    Json(PublicIdentity {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub identities: i64,
    pub orders: i64,
    pub revenue: i64,
}

pub async fn admin_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<AdminStats>, ApiError> {
    ensure_admin(&user)?;

    let identities = state
        .store
        .count_identities()
        .await
        .map_err(ApiError::internal)?;

    // Order and revenue figures belong to services that do not exist yet;
    // the dashboard only has live data for the identity count.
    Ok(Json(AdminStats {
        identities,
        orders: 0,
        revenue: 0,
    }))
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_ascii_lowercase();
    let mut parts = email.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.')
    );
    if !valid {
        return Err(ApiError::validation("A valid email address is required."));
    }
    Ok(email)
}

fn hash_secret(secret: &str) -> Result<String, ApiError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ApiError::validation(format!(
            "Secret must be at least {MIN_SECRET_LENGTH} characters."
        )));
    }
    derive_secret_hash(secret).map_err(ApiError::internal)
}

pub(crate) fn derive_secret_hash(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(secret.as_bytes(), &salt)?
        .to_string())
}

fn verify_secret(secret: &str, secret_hash: &str) -> bool {
    match PasswordHash::new(secret_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}
