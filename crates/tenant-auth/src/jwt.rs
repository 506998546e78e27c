//! JWT token generation and validation
//!
//! This module provides JWT operations using the jsonwebtoken crate. Only
//! the HMAC family is supported: every instance of the service shares one
//! process-wide secret, so a token signed by one instance verifies on any
//! other.

use crate::claims::AccessClaims;
use crate::error::{AuthError, AuthResult};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum secret length accepted by [`JwtConfig::validate`].
pub const MIN_SECRET_LEN: usize = 32;

/// JWT configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,

    /// Algorithm to use
    pub algorithm: JwtAlgorithm,

    /// Token issuer
    pub issuer: String,

    /// Audience of access tokens
    pub audience: Vec<String>,

    /// Access token duration
    pub access_token_duration: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_duration", &self.access_token_duration)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: JwtAlgorithm::HS256,
            issuer: "tenant-access".to_string(),
            audience: vec!["tenant-api".to_string()],
            access_token_duration: Duration::hours(1),
        }
    }
}

impl JwtConfig {
    /// Configuration with the given secret and default settings.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Reject configurations that cannot sign safely.
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::ConfigError("Secret required for HMAC".to_string()));
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::ConfigError(format!(
                "Secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(())
    }
}

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// JWT service for token operations.
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration.
    ///
    /// # Returns
    ///
    /// JWT service or configuration error
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        config.validate()?;
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a simple secret (HS256).
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(JwtConfig::with_secret(secret))
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Base validation rules: configured algorithm, configured issuer,
    /// `exp` required, no clock leeway.
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.config.algorithm.into());
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;
        validation
    }

    /// Sign any serializable claim set.
    pub fn encode<T: Serialize>(&self, claims: &T) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.into());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Verify a token's signature and registered claims, then decode it.
    pub fn decode<T: DeserializeOwned>(&self, token: &str, validation: &Validation) -> AuthResult<T> {
        decode::<T>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Malformed token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidToken("Invalid issuer".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                    AuthError::InvalidToken("Invalid audience".to_string())
                }
                jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::MissingClaim(claim.clone())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user_id: Uuid, email: impl Into<String>) -> AuthResult<String> {
        let claims = AccessClaims::new(
            user_id,
            email,
            self.config.issuer.clone(),
            self.config.audience.clone(),
            self.config.access_token_duration,
        );
        self.encode(&claims)
    }

    /// Validate an access token and return its claims.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = self.validation();
        validation.set_audience(&self.config.audience);
        self.decode(token, &validation)
    }

    /// Resolve the caller's user id from an access token.
    pub fn authenticate(&self, token: &str) -> AuthResult<Uuid> {
        let claims = self.validate_access_token(token)?;
        claims
            .user_id()
            .ok_or_else(|| AuthError::Unauthorized("Invalid subject".to_string()))
    }
}
