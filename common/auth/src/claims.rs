use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Application-facing view of verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Wire form of the claims as embedded in the token payload.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClaimsRepr {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let issued_at = Utc
            .timestamp_opt(value.iat, 0)
            .single()
            .ok_or(AuthError::Malformed)?;
        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or(AuthError::Malformed)?;

        Ok(Self {
            subject: value.sub,
            issued_at,
            expires_at,
        })
    }
}
