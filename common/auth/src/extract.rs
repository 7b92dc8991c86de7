use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::roles::Role;
use crate::store::CredentialStore;
use crate::tokens::TokenService;

/// Identity resolved for the current request by the access guard.
///
/// Extraction performs the full chain: bearer header, token verification,
/// identity re-resolution against the credential store, and the active
/// check. Handlers receiving a `CurrentUser` never re-check any of it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<TokenService>: FromRef<S>,
    Arc<dyn CredentialStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let store = Arc::<dyn CredentialStore>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = bearer_token(header_value)?;
        let claims = tokens.verify(token)?;

        // Re-resolve per request so deactivation and deletion take effect
        // immediately even while the token itself is still unexpired.
        let identity = store
            .find_by_id(claims.subject)
            .await
            .map_err(|err| AuthError::Store(err.to_string()))?
            .ok_or(AuthError::UnknownIdentity(claims.subject))?;

        if !identity.active {
            return Err(AuthError::Inactive(identity.id));
        }

        debug!(subject = %identity.id, "request credential verified");
        Ok(Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
        })
    }
}

/// Splits `Bearer <token>` out of the header. Only the exact `Bearer`
/// scheme is accepted; the credential may not be blank.
fn bearer_token(value: &axum::http::HeaderValue) -> AuthResult<&str> {
    let raw = value.to_str().map_err(|_| AuthError::InvalidAuthorization)?;
    match raw.trim().split_once(' ') {
        Some(("Bearer", credential)) if !credential.trim().is_empty() => Ok(credential.trim()),
        _ => Err(AuthError::InvalidAuthorization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_splits_scheme_from_credential() {
        let header = HeaderValue::from_static("Bearer eyJ.payload.sig");
        assert_eq!(bearer_token(&header).expect("token"), "eyJ.payload.sig");

        let padded = HeaderValue::from_static("  Bearer   eyJ.payload.sig  ");
        assert_eq!(bearer_token(&padded).expect("token"), "eyJ.payload.sig");
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_bare_credentials() {
        for raw in ["Basic Zm9vOmJhcg==", "bearer eyJ.payload.sig", "eyJ.payload.sig"] {
            let header = HeaderValue::from_static(raw);
            let err = bearer_token(&header).expect_err("should reject");
            assert!(matches!(err, AuthError::InvalidAuthorization), "{raw}");
        }
    }

    #[test]
    fn bearer_token_rejects_blank_credential() {
        for raw in ["Bearer", "Bearer    "] {
            let header = HeaderValue::from_static(raw);
            let err = bearer_token(&header).expect_err("should reject");
            assert!(matches!(err, AuthError::InvalidAuthorization), "{raw}");
        }
    }
}
