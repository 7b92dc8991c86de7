use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_auth::{CredentialStore, Identity, NewIdentity, Role, StoreError};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const PG_UNIQUE_VIOLATION: &str = "23505";

/// Production binding of the credential store contract.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    name: String,
    email: String,
    secret_hash: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self) -> Result<Identity, StoreError> {
        let role = Role::from_str(&self.role).map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(Identity {
            id: self.id,
            name: self.name,
            email: self.email,
            secret_hash: self.secret_hash,
            role,
            active: self.active,
            created_at: self.created_at,
        })
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, email, secret_hash, role, active, created_at
             FROM identities WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(IdentityRow::into_identity).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, email, secret_hash, role, active, created_at
             FROM identities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(IdentityRow::into_identity).transpose()
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "INSERT INTO identities (id, name, email, secret_hash, role, active)
             VALUES ($1, $2, $3, $4, $5, TRUE)
             RETURNING id, name, email, secret_hash, role, active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.secret_hash)
        .bind(identity.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            let unique_violation = err
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == PG_UNIQUE_VIOLATION)
                .unwrap_or(false);
            if unique_violation {
                StoreError::DuplicateEmail
            } else {
                backend(err)
            }
        })?;

        row.into_identity()
    }

    async fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE identities
             SET name = $2, email = $3, secret_hash = $4, role = $5, active = $6
             WHERE id = $1",
        )
        .bind(identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.secret_hash)
        .bind(identity.role.as_str())
        .bind(identity.active)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownIdentity(identity.id));
        }
        Ok(())
    }

    async fn count_identities(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM identities")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)
    }
}
