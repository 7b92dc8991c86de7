use anyhow::{anyhow, Result};
use std::env;
use tracing::warn;

/// Fixed development signing secret used when JWT_SECRET is absent. A known
/// weak default: keep it out of any real deployment.
pub const DEV_JWT_SECRET: &str = "lunevia_secret_key_2024";

/// Fixed development admin enrollment code, same caveat as the dev secret.
pub const DEV_ENROLLMENT_CODE: &str = "lunevia-admin-enroll";

const DEFAULT_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub admin_enrollment_code: String,
    pub bootstrap_admin: bool,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_secret: Option<String>,
    pub cors_origins: Vec<String>,
}

pub fn load_config() -> Result<AuthServiceConfig> {
    let jwt_secret = match env::var("JWT_SECRET").ok().and_then(|v| normalize_optional(&v)) {
        Some(secret) => secret,
        None => {
            warn!(
                "JWT_SECRET is not set; using the fixed development signing secret. \
                 Tokens signed with it are forgeable by anyone who reads the source."
            );
            DEV_JWT_SECRET.to_string()
        }
    };

    let token_ttl_seconds = match env::var("JWT_TTL_SECONDS") {
        Ok(value) => value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| anyhow!("Invalid JWT_TTL_SECONDS '{value}': expected a positive integer"))?,
        Err(_) => DEFAULT_TTL_SECONDS,
    };

    let admin_enrollment_code = match env::var("ADMIN_ENROLLMENT_CODE")
        .ok()
        .and_then(|v| normalize_optional(&v))
    {
        Some(code) => code,
        None => {
            warn!("ADMIN_ENROLLMENT_CODE is not set; using the fixed development code.");
            DEV_ENROLLMENT_CODE.to_string()
        }
    };

    let bootstrap_admin = bool_from_env("BOOTSTRAP_ADMIN").unwrap_or(false);
    let bootstrap_admin_email = env::var("BOOTSTRAP_ADMIN_EMAIL")
        .ok()
        .and_then(|v| normalize_optional(&v));
    let bootstrap_admin_secret = env::var("BOOTSTRAP_ADMIN_SECRET")
        .ok()
        .and_then(|v| normalize_optional(&v));

    let cors_origins = env::var("CORS_ORIGINS")
        .ok()
        .map(|value| parse_origins(&value))
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(default_origins);

    Ok(AuthServiceConfig {
        jwt_secret,
        token_ttl_seconds,
        admin_enrollment_code,
        bootstrap_admin,
        bootstrap_admin_email,
        bootstrap_admin_secret,
        cors_origins,
    })
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(|item| {
            let origin = item.trim();
            if origin.is_empty() {
                None
            } else {
                Some(origin.to_string())
            }
        })
        .collect()
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_from_env_parses() {
        std::env::set_var("AUTH_TEST_BOOL_TRUE", "true");
        std::env::set_var("AUTH_TEST_BOOL_ONE", "1");
        std::env::set_var("AUTH_TEST_BOOL_FALSE", "no");
        assert_eq!(bool_from_env("AUTH_TEST_BOOL_TRUE"), Some(true));
        assert_eq!(bool_from_env("AUTH_TEST_BOOL_ONE"), Some(true));
        assert_eq!(bool_from_env("AUTH_TEST_BOOL_FALSE"), Some(false));
    }

    #[test]
    fn parse_origins_splits_and_trims() {
        let origins = parse_origins("http://a.example, http://b.example;http://c.example");
        assert_eq!(
            origins,
            vec![
                "http://a.example".to_string(),
                "http://b.example".to_string(),
                "http://c.example".to_string(),
            ]
        );
    }

    #[test]
    fn normalize_optional_drops_blank() {
        assert_eq!(normalize_optional("  "), None);
        assert_eq!(normalize_optional(" x "), Some("x".to_string()));
    }
}
