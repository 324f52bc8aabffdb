//! Session validation port for bearer token validation.
//!
//! Provider-agnostic: the JWT adapter verifies locally signed tokens, the mock
//! adapter maps fixed tokens to users for tests.
//!
//! All implementations MUST validate signature, expiry and (when configured)
//! issuer and audience before returning a user.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    ///
    /// * `Err(AuthError::InvalidToken)` - malformed or bad signature
    /// * `Err(AuthError::TokenExpired)` - signature valid but expired
    /// * `Err(AuthError::ServiceUnavailable)` - validator cannot run
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
