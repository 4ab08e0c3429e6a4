use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::stripe::StripeConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub stripe: StripeConfig,
    pub checkout_currency: String,
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str, default: &str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let port_raw = optional("PORT", "8080");
        let port = port_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "PORT",
            value: port_raw.clone(),
        })?;

        let timeout_raw = optional("STRIPE_TIMEOUT_SECS", "10");
        let timeout_secs: u64 = timeout_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "STRIPE_TIMEOUT_SECS",
            value: timeout_raw.clone(),
        })?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST", "0.0.0.0"),
            port,
            stripe: StripeConfig {
                api_base: optional("STRIPE_API_BASE", "https://api.stripe.com"),
                secret_key: required("STRIPE_SECRET_KEY")?,
                timeout: Duration::from_secs(timeout_secs),
            },
            checkout_currency: optional("CHECKOUT_CURRENCY", "eur").to_lowercase(),
            public_base_url: optional("PUBLIC_BASE_URL", "http://localhost:3000"),
        })
    }
}
