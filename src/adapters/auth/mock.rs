//! Mock session validator for testing.
//!
//! # Example
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_test_user("provider-token", "provider-1")
//!     .with_test_user("subscriber-token", "subscriber-1");
//! ```

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Maps fixed tokens to users. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Returned for every validation when set.
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(&self) -> RwLockReadGuard<'_, HashMap<String, AuthenticatedUser>> {
        self.tokens.read().unwrap_or_else(|e| e.into_inner())
    }

    fn tokens_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, AuthenticatedUser>> {
        self.tokens.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a token for a user with a derived test email.
    ///
    /// Blank user ids are ignored.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        match UserId::new(user_id.as_str()) {
            Ok(id) => {
                let email = format!("{}@test.example.com", user_id);
                self.with_user(token, AuthenticatedUser::new(id, Some(email)))
            }
            Err(_) => self,
        }
    }

    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap_or_else(|e| e.into_inner()) = Some(error);
        self
    }

    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.tokens_mut().insert(token.into(), user);
    }

    pub fn remove_token(&self, token: &str) {
        self.tokens_mut().remove(token);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(error);
        }

        self.tokens()
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
