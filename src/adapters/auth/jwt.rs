//! HS256 JWT session validator.
//!
//! Validates bearer tokens signed with a shared secret. Signature and expiry
//! are always checked; issuer and audience are checked when configured.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// JWT validation settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct JwtSessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!(error = %e, "Token validation failed");
                    AuthError::InvalidToken
                }
            }
        })?;

        let id = UserId::new(data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser::new(id, data.claims.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const SECRET: &str = "test-secret-with-enough-entropy";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<&'a str>,
    }

    fn token(secret: &str, claims: &TestClaims<'_>) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(SecretString::new(SECRET.to_string())))
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let jwt = token(
            SECRET,
            &TestClaims {
                sub: "user-42",
                exp: in_an_hour(),
                iss: None,
                email: Some("u42@example.com"),
            },
        );

        let user = validator().validate(&jwt).await.unwrap();

        assert_eq!(user.id.as_str(), "user-42");
        assert_eq!(user.email.as_deref(), Some("u42@example.com"));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let jwt = token(
            SECRET,
            &TestClaims {
                sub: "user-42",
                exp: chrono::Utc::now().timestamp() - 3600,
                iss: None,
                email: None,
            },
        );

        assert_eq!(validator().validate(&jwt).await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let jwt = token(
            "another-secret",
            &TestClaims {
                sub: "user-42",
                exp: in_an_hour(),
                iss: None,
                email: None,
            },
        );

        assert_eq!(validator().validate(&jwt).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn issuer_is_enforced_when_configured() {
        let validator = JwtSessionValidator::new(
            JwtConfig::new(SecretString::new(SECRET.to_string())).with_issuer("https://auth.example.com"),
        );
        let jwt = token(
            SECRET,
            &TestClaims {
                sub: "user-42",
                exp: in_an_hour(),
                iss: Some("https://evil.example.com"),
                email: None,
            },
        );

        assert_eq!(validator.validate(&jwt).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator().validate("not-a-jwt").await,
            Err(AuthError::InvalidToken)
        );
    }
}
