//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Settings are read once at
//! startup and treated as immutable afterwards.

use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Global token authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenAuthSettings {
    /// Persist the signed-in record across requests. When false every
    /// request has to present its token again.
    pub sign_in_token: bool,

    /// Header name overrides: alias -> field -> header name.
    /// The token field is keyed as `authentication_token`.
    pub header_names: HashMap<String, HashMap<String, String>>,

    /// Identifier field overrides: alias -> field (default `email`).
    pub identifiers: HashMap<String, String>,

    /// Identifier fields whose values are lowercased before lookup.
    pub case_insensitive_keys: Vec<String>,

    /// Login paths used by the default redirector: alias -> path.
    pub sign_in_paths: HashMap<String, String>,
}

impl Default for TokenAuthSettings {
    fn default() -> Self {
        Self {
            sign_in_token: false,
            header_names: HashMap::new(),
            identifiers: HashMap::new(),
            case_insensitive_keys: vec!["email".to_string()],
            sign_in_paths: HashMap::new(),
        }
    }
}

impl TokenAuthSettings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let settings = Self::from_lookup(|key| env::var(key).ok())?;
        tracing::debug!(
            sign_in_token = settings.sign_in_token,
            case_insensitive_keys = ?settings.case_insensitive_keys,
            "Loaded token authentication settings"
        );
        Ok(settings)
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let sign_in_token = match lookup("TOKEN_AUTH_SIGN_IN_TOKEN") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("TOKEN_AUTH_SIGN_IN_TOKEN must be a boolean, got {raw:?}"))?,
            None => defaults.sign_in_token,
        };

        let case_insensitive_keys = match lookup("TOKEN_AUTH_CASE_INSENSITIVE_KEYS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.case_insensitive_keys,
        };

        Ok(Self {
            sign_in_token,
            header_names: json_var(&lookup, "TOKEN_AUTH_HEADER_NAMES")?.unwrap_or_default(),
            identifiers: json_var(&lookup, "TOKEN_AUTH_IDENTIFIERS")?.unwrap_or_default(),
            case_insensitive_keys,
            sign_in_paths: json_var(&lookup, "TOKEN_AUTH_SIGN_IN_PATHS")?.unwrap_or_default(),
        })
    }

    /// Header name override for `field` of the entity aliased `alias`.
    pub fn header_name(&self, alias: &str, field: &str) -> Option<&str> {
        self.header_names
            .get(alias)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    /// Identifier field for the entity aliased `alias`.
    pub fn identifier_for(&self, alias: &str) -> &str {
        self.identifiers
            .get(alias)
            .map(String::as_str)
            .unwrap_or("email")
    }
}

fn json_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: serde::de::DeserializeOwned,
{
    lookup(key)
        .map(|raw| serde_json::from_str(&raw).with_context(|| format!("{key} must be valid JSON")))
        .transpose()
}

/// Runtime configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub rust_log: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "tokenauth=debug".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        })
    }
}
