use anyhow::{Context, Result};
use common_auth::{CredentialStore, NewIdentity, Role};
use tracing::{info, warn};

use crate::config::AuthServiceConfig;
use crate::handlers::derive_secret_hash;

/// Creates the default admin account at startup when bootstrapping is
/// enabled. Idempotent: an already-registered email is left untouched.
pub async fn ensure_default_admin(
    store: &dyn CredentialStore,
    config: &AuthServiceConfig,
) -> Result<()> {
    if !config.bootstrap_admin {
        return Ok(());
    }

    let (Some(email), Some(secret)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_secret.as_deref(),
    ) else {
        warn!(
            "BOOTSTRAP_ADMIN is enabled but BOOTSTRAP_ADMIN_EMAIL or \
             BOOTSTRAP_ADMIN_SECRET is missing; skipping admin bootstrap"
        );
        return Ok(());
    };

    if store
        .find_by_email(email)
        .await
        .context("admin bootstrap lookup failed")?
        .is_some()
    {
        info!(email, "admin account already exists; skipping bootstrap");
        return Ok(());
    }

    let secret_hash =
        derive_secret_hash(secret).map_err(|err| anyhow::anyhow!("failed to hash bootstrap admin secret: {err}"))?;

    store
        .create(NewIdentity {
            name: "Admin".to_string(),
            email: email.to_string(),
            secret_hash,
            role: Role::Admin,
        })
        .await
        .context("failed to create bootstrap admin")?;

    info!(email, "default admin account created");
    Ok(())
}
