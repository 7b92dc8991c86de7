use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::{Identity, NewIdentity};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("unknown identity '{0}'")]
    UnknownIdentity(Uuid),
    #[error("credential store backend error: {0}")]
    Backend(String),
}

/// Contract the auth core expects from the persisted identity collection.
///
/// The store is an external collaborator: everything else in this workspace
/// goes through these four operations and never reaches past them.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Lookup by login key. Email comparison is case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    /// Persists a new identity, assigning id and creation time. Fails with
    /// [`StoreError::DuplicateEmail`] if the email is already registered.
    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    /// Writes back administrative mutations (name, role, active flag).
    async fn save(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Total number of registered identities, for admin dashboards.
    async fn count_identities(&self) -> Result<i64, StoreError>;
}

/// In-process store used by tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<Uuid, Identity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let guard = self.inner.read().expect("rwlock poisoned");
        Ok(guard
            .values()
            .find(|identity| identity.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let guard = self.inner.read().expect("rwlock poisoned");
        Ok(guard.get(&id).cloned())
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        if guard
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&identity.email))
        {
            return Err(StoreError::DuplicateEmail);
        }

        let created = Identity {
            id: Uuid::new_v4(),
            name: identity.name,
            email: identity.email,
            secret_hash: identity.secret_hash,
            role: identity.role,
            active: true,
            created_at: Utc::now(),
        };
        guard.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        match guard.get_mut(&identity.id) {
            Some(existing) => {
                *existing = identity.clone();
                Ok(())
            }
            None => Err(StoreError::UnknownIdentity(identity.id)),
        }
    }

    async fn count_identities(&self) -> Result<i64, StoreError> {
        let guard = self.inner.read().expect("rwlock poisoned");
        Ok(guard.len() as i64)
    }
}
