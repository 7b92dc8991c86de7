use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::{Claims, ClaimsRepr};
use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;

/// Signing configuration, fixed for the process lifetime. The secret is
/// loaded once at startup and never rotated at runtime.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

/// Issued bearer credential plus its expiry for callers that surface it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies HS256 bearer tokens. Stateless: issuance never touches
/// the credential store, and verification only checks signature and expiry.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::seconds(config.ttl_seconds),
        }
    }

    pub fn issue(&self, identity: &Identity) -> AuthResult<IssuedToken> {
        self.issue_at(identity.id, Utc::now())
    }

    /// Issuance with an explicit clock, so tests can mint tokens in the past.
    pub fn issue_at(&self, subject: Uuid, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let expires_at = now + self.ttl;
        let repr = ClaimsRepr {
            sub: subject,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &repr, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: the validity window is fixed at issuance.
        validation.leeway = 0;

        let data = decode::<ClaimsRepr>(token, &self.decoding_key, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            }
        })?;

        Claims::try_from(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    fn service(secret: &str, ttl_seconds: i64) -> TokenService {
        TokenService::new(TokenConfig {
            secret: secret.to_string(),
            ttl_seconds,
        })
    }

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            secret_hash: "$argon2id$stub".to_string(),
            role: Role::User,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verify_resolves_issued_subject() {
        let tokens = service("unit-secret", 900);
        let identity = identity();

        let issued = tokens.issue(&identity).expect("issue");
        let claims = tokens.verify(&issued.token).expect("verify");

        assert_eq!(claims.subject, identity.id);
        assert_eq!(claims.expires_at.timestamp(), issued.expires_at.timestamp());
        assert!(claims.issued_at < claims.expires_at);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let tokens = service("unit-secret", 60);
        let minted_in_the_past = Utc::now() - Duration::seconds(120);

        let issued = tokens
            .issue_at(Uuid::new_v4(), minted_in_the_past)
            .expect("issue");
        let err = tokens.verify(&issued.token).expect_err("must be expired");

        assert!(matches!(err, AuthError::Expired), "got {err:?}");
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let ours = service("server-secret", 900);
        let theirs = service("attacker-secret", 900);

        let forged = theirs.issue(&identity()).expect("issue");
        let err = ours.verify(&forged.token).expect_err("must reject");

        assert!(matches!(err, AuthError::InvalidSignature), "got {err:?}");
    }

    #[test]
    fn verify_rejects_garbage() {
        let tokens = service("unit-secret", 900);

        for garbage in ["", "not-a-token", "aaaa.bbbb.cccc"] {
            let err = tokens.verify(garbage).expect_err("must reject");
            assert!(matches!(err, AuthError::Malformed), "got {err:?}");
        }
    }
}
