//! Service configuration.

use std::path::Path;

use rand_core::{OsRng, RngCore};
use serde::Deserialize;

use dg_practice_core::{InputPolicy, UserId};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:3000").
    pub listen_addr: String,

    /// Path to the JSON document (default: "data/db.json").
    pub data_file: String,

    /// Secret used to sign session tokens.
    pub token_secret: String,

    /// Session token lifetime in hours (default: 720).
    pub token_ttl_hours: i64,

    /// Issuer claim of session tokens (default: "dg-practice").
    pub token_issuer: String,

    /// How malformed hit/attempt counts are handled.
    pub input_policy: InputPolicy,

    /// Rebuild every cached aggregate from the sessions at startup.
    pub normalize_on_start: bool,

    /// Owner given to stored records that predate per-user ownership.
    pub legacy_owner: Option<UserId>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Auth secrets file structure.
#[derive(Debug, Deserialize)]
struct AuthSecrets {
    token_secret: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_file: std::env::var("DATA_FILE").unwrap_or(defaults.data_file),
            token_secret: load_token_secret().unwrap_or(defaults.token_secret),
            token_ttl_hours: env_parse("TOKEN_TTL_HOURS").unwrap_or(defaults.token_ttl_hours),
            token_issuer: std::env::var("TOKEN_ISSUER").unwrap_or(defaults.token_issuer),
            input_policy: env_parse("STRICT_INPUT").unwrap_or(defaults.input_policy),
            normalize_on_start: env_parse("NORMALIZE_ON_START")
                .unwrap_or(defaults.normalize_on_start),
            legacy_owner: env_parse("LEGACY_OWNER"),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Load the token secret from file or environment.
fn load_token_secret() -> Option<String> {
    let secret_paths = [
        ".secrets/auth.json",
        "dg-practice/.secrets/auth.json",
        "../.secrets/auth.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<AuthSecrets>(path) {
            tracing::info!(path = %path, "Loaded auth secrets from file");
            return Some(secrets.token_secret);
        }
    }

    tracing::debug!("Auth secrets file not found, using environment variables");
    let secret = std::env::var("TOKEN_SECRET").ok().filter(|s| !s.is_empty());
    if secret.is_none() {
        tracing::warn!("TOKEN_SECRET not configured - issued tokens will not survive a restart");
    }
    secret
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// A random secret for when none is configured. Tokens signed with it do not
/// survive a restart.
fn ephemeral_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".into(),
            data_file: "data/db.json".into(),
            token_secret: ephemeral_secret(),
            token_ttl_hours: 24 * 30,
            token_issuer: "dg-practice".into(),
            input_policy: InputPolicy::Lenient,
            normalize_on_start: false,
            legacy_owner: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_secret_is_random() {
        let a = ServiceConfig::default();
        let b = ServiceConfig::default();
        assert_eq!(a.token_secret.len(), 64);
        assert_ne!(a.token_secret, b.token_secret);
        assert_eq!(a.input_policy, InputPolicy::Lenient);
    }
}
