use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

/// A registered principal as persisted in the credential store.
///
/// Deliberately not `Serialize`: the secret hash must never cross the wire.
/// Use [`Identity::public`] for anything leaving the process.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub secret_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// The identity fields that are safe to return to clients and cache locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Fields supplied when creating an identity; the store assigns id and
/// creation time.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub secret_hash: String,
    pub role: Role,
}
