use common_auth::{PublicIdentity, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::storage::SessionStorage;

/// The client's local view of "who is logged in". Either fully populated or
/// absent, never partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: PublicIdentity,
}

/// Owns the client-side authentication lifecycle: restores a persisted
/// session at startup, performs login/signup against the issuance endpoints,
/// and clears everything on logout.
pub struct SessionManager<S: SessionStorage> {
    http: Client,
    base_url: String,
    storage: S,
    session: Option<Session>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    secret: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    enrollment_code: Option<&'a str>,
}

#[derive(Deserialize)]
struct AuthResponseBody {
    token: String,
    user: PublicIdentity,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl<S: SessionStorage> SessionManager<S> {
    pub fn new(base_url: impl Into<String>, storage: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            storage,
            session: None,
        }
    }

    /// Restores the session from durable storage. No network call is made:
    /// the persisted snapshot is trusted until the server says otherwise on
    /// the next request. A corrupt or unreadable snapshot clears storage and
    /// leaves the manager logged out.
    pub fn restore(&mut self) {
        match self.storage.read() {
            Ok(Some((token, identity_json))) => {
                match serde_json::from_str::<PublicIdentity>(&identity_json) {
                    Ok(identity) => {
                        debug!(identity = %identity.id, "session restored from storage");
                        self.session = Some(Session { token, identity });
                    }
                    Err(err) => {
                        warn!(error = %err, "persisted identity snapshot is corrupt; clearing session storage");
                        self.clear_storage();
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "failed to read session storage; starting logged out");
                self.clear_storage();
            }
        }
    }

    pub async fn login(
        &mut self,
        email: &str,
        secret: &str,
        admin: bool,
    ) -> Result<Session, ClientError> {
        let path = if admin {
            "/auth/admin/login"
        } else {
            "/auth/login"
        };
        self.issue(path, &LoginBody { email, secret }).await
    }

    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
        admin: bool,
        enrollment_code: Option<&str>,
    ) -> Result<Session, ClientError> {
        let path = if admin {
            "/auth/admin/register"
        } else {
            "/auth/register"
        };
        self.issue(
            path,
            &SignupBody {
                name,
                email,
                secret,
                enrollment_code,
            },
        )
        .await
    }

    /// Clears the persisted credential and empties the session. Purely
    /// local: tokens are not revocable server-side.
    pub fn logout(&mut self) {
        self.clear_storage();
        self.session = None;
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self.session.as_ref(),
            Some(session) if session.identity.role == Role::Admin
        )
    }

    /// Value for the `Authorization` header on protected feature requests.
    pub fn authorization_header(&self) -> Option<String> {
        self.session
            .as_ref()
            .map(|session| format!("Bearer {}", session.token))
    }

    async fn issue<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<Session, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .unwrap_or_default()
                .message;
            warn!(status = status.as_u16(), path, "credential issuance rejected");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let issued: AuthResponseBody = response.json().await?;
        let snapshot = serde_json::to_string(&issued.user)?;

        // Persist first: the in-memory session must never claim a login the
        // next restore cannot see.
        self.storage.write(&issued.token, &snapshot)?;

        let session = Session {
            token: issued.token,
            identity: issued.user,
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    fn clear_storage(&mut self) {
        if let Err(err) = self.storage.clear() {
            warn!(error = %err, "failed to clear session storage");
        }
    }
}
