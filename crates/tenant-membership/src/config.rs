//! Membership service configuration.
//!
//! Configuration is loaded from environment variables with defaults for
//! local development. The JWT secret has no default outside of
//! [`MembershipConfig::default`].

use crate::notify::MessageTemplates;
use serde::{Deserialize, Serialize};
use tenant_auth::{JwtConfig, INVITATION_TTL_HOURS, MIN_SECRET_LEN};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for the membership engine.
#[derive(Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Process-wide secret for access and invitation tokens.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Base URL of the UI application, used in notification links.
    pub app_url: String,

    /// Sender address for notifications.
    pub from_address: String,

    /// Product name used in notification copy.
    pub product_name: String,

    /// Invitation token lifetime in hours.
    pub invitation_ttl_hours: i64,
}

impl std::fmt::Debug for MembershipConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("app_url", &self.app_url)
            .field("from_address", &self.from_address)
            .field("product_name", &self.product_name)
            .field("invitation_ttl_hours", &self.invitation_ttl_hours)
            .finish()
    }
}

impl Default for MembershipConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            jwt_secret: "local-development-secret-change-me-please".to_string(),
            app_url: "http://localhost:3000".to_string(),
            from_address: "no-reply@localhost".to_string(),
            product_name: "Vezhguesi".to_string(),
            invitation_ttl_hours: INVITATION_TTL_HOURS,
        }
    }
}

impl MembershipConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JWT_SECRET`: Token signing secret (required)
    /// - `UI_APP_URL`: UI application URL (default: http://localhost:3000)
    /// - `NOTIFY_FROM_ADDRESS`: Notification sender address
    /// - `PRODUCT_NAME`: Product name used in notifications (default: Vezhguesi)
    /// - `INVITATION_TTL_HOURS`: Invitation lifetime in hours (default: 24)
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        let invitation_ttl_hours = match std::env::var("INVITATION_TTL_HOURS") {
            Ok(raw) => raw.parse::<i64>().ok().filter(|h| *h > 0).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "INVITATION_TTL_HOURS".to_string(),
                    message: format!("expected a positive number of hours, got {:?}", raw),
                }
            })?,
            Err(_) => default.invitation_ttl_hours,
        };

        Ok(Self {
            jwt_secret,
            app_url: std::env::var("UI_APP_URL").unwrap_or(default.app_url),
            from_address: std::env::var("NOTIFY_FROM_ADDRESS").unwrap_or(default.from_address),
            product_name: std::env::var("PRODUCT_NAME").unwrap_or(default.product_name),
            invitation_ttl_hours,
        })
    }

    /// Invitation lifetime as a Duration.
    pub fn invitation_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.invitation_ttl_hours)
    }

    /// JWT settings derived from this configuration.
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::with_secret(self.jwt_secret.clone())
    }

    /// Notification templates derived from this configuration.
    pub fn templates(&self) -> MessageTemplates {
        MessageTemplates::new(&self.app_url, &self.from_address, &self.product_name)
    }

    /// Validate that the configuration is safe for production.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                key: "JWT_SECRET".to_string(),
                message: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }
        if self.jwt_secret == Self::default().jwt_secret {
            return Err(ConfigError::InvalidValue {
                key: "JWT_SECRET".to_string(),
                message: "development secret in use".to_string(),
            });
        }
        if !self.app_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "UI_APP_URL".to_string(),
                message: "must use https".to_string(),
            });
        }
        Ok(())
    }
}
