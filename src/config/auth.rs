//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::auth::JwtConfig;

const MIN_SECRET_LEN: usize = 32;

/// Bearer token validation settings (HS256).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared signing secret
    pub jwt_secret: SecretString,

    /// Expected `iss` claim, checked when set
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim, checked when set
    #[serde(default)]
    pub audience: Option<String>,
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        let mut config = JwtConfig::new(self.jwt_secret.clone());
        if let Some(issuer) = &self.issuer {
            config = config.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            config = config.with_audience(audience.clone());
        }
        config
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ValidationError::WeakJwtSecret);
        }
        Ok(())
    }
}
