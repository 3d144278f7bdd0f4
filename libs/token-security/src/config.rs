//! Environment-driven token configuration
//!
//! Loaded from `MERIDIAN_TOKEN_*` variables. Secrets deserialize into
//! [`SecretString`] so they never appear in Debug output or logs, and
//! [`TokenConfig::validate`] refuses weak signing material at startup instead
//! of letting a short secret reach production.

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::lifecycle::TokenLifecycleManager;
use crate::service::SigningAlgorithm;

const ENV_PREFIX: &str = "MERIDIAN_TOKEN_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token configuration environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("signing secret rejected: {0}")]
    WeakSecret(#[from] crypto_core::CryptoError),
}

/// Signing secrets for the token pair
///
/// The refresh secret is optional; when unset the signing secret covers both
/// token kinds. A distinct refresh secret means a leaked access-token secret
/// cannot forge refresh tokens.
#[derive(Clone)]
pub struct SigningSecrets {
    signing: SecretString,
    refresh: Option<SecretString>,
}

impl SigningSecrets {
    pub fn new(signing: SecretString) -> Self {
        Self {
            signing,
            refresh: None,
        }
    }

    pub fn with_refresh_secret(mut self, refresh: SecretString) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn signing_secret(&self) -> &str {
        self.signing.expose_secret()
    }

    pub fn refresh_secret(&self) -> &str {
        self.refresh
            .as_ref()
            .unwrap_or(&self.signing)
            .expose_secret()
    }
}

impl std::fmt::Debug for SigningSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecrets")
            .field("signing", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_access_ttl_secs() -> i64 {
    900
}

fn default_refresh_ttl_secs() -> i64 {
    604_800
}

fn default_clock_tolerance_secs() -> u64 {
    0
}

fn default_algorithm() -> SigningAlgorithm {
    SigningAlgorithm::default()
}

#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    pub signing_secret: SecretString,
    /// Separate secret for refresh tokens; falls back to `signing_secret`
    pub refresh_signing_secret: Option<SecretString>,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    #[serde(default = "default_clock_tolerance_secs")]
    pub clock_tolerance_secs: u64,
    #[serde(default = "default_algorithm")]
    pub algorithm: SigningAlgorithm,
}

impl TokenConfig {
    /// Load from `MERIDIAN_TOKEN_*` environment variables and validate
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: TokenConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        info!(
            access_ttl_secs = config.access_ttl_secs,
            refresh_ttl_secs = config.refresh_ttl_secs,
            has_refresh_secret = config.refresh_signing_secret.is_some(),
            "token configuration loaded"
        );
        Ok(config)
    }

    /// Reject signing material that would be trivially brute-forceable
    pub fn validate(&self) -> Result<(), ConfigError> {
        crypto_core::require_strong_secret(self.signing_secret.expose_secret())?;
        if let Some(refresh) = &self.refresh_signing_secret {
            crypto_core::require_strong_secret(refresh.expose_secret())?;
        }
        Ok(())
    }

    pub fn secrets(&self) -> SigningSecrets {
        let mut secrets = SigningSecrets::new(self.signing_secret.clone());
        if let Some(refresh) = &self.refresh_signing_secret {
            secrets = secrets.with_refresh_secret(refresh.clone());
        }
        secrets
    }

    pub fn manager(&self) -> TokenLifecycleManager {
        let mut manager = TokenLifecycleManager::new(
            Duration::seconds(self.access_ttl_secs),
            Duration::seconds(self.refresh_ttl_secs),
        )
        .with_algorithm(self.algorithm);
        if let Some(issuer) = &self.issuer {
            manager = manager.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            manager = manager.with_audience(audience.clone());
        }
        manager
    }
}
