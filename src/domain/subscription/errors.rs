//! Subscription-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | TierNotFound / SubscriptionNotFound | 404 |
//! | Conflict | 409 |
//! | ValidationFailed / InvalidState / PaymentRejected | 400 |
//! | Forbidden | 403 |
//! | LedgerUnavailable | 503 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, TierId};

/// Errors surfaced by tier registry, ledger and access gate operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    TierNotFound(TierId),

    SubscriptionNotFound(SubscriptionId),

    /// Uniqueness or concurrency conflict (duplicate FREE tier, duplicate
    /// active subscription, reused ledger transaction, lost race).
    Conflict { code: ErrorCode, message: String },

    ValidationFailed { field: String, message: String },

    /// Operation not allowed in the current lifecycle state.
    InvalidState { code: ErrorCode, message: String },

    /// The ledger transaction does not prove the expected payment.
    PaymentRejected { reason: String },

    /// Caller does not own the resource.
    Forbidden(String),

    /// The ledger could not be reached or returned garbage.
    LedgerUnavailable(String),

    Infrastructure(String),
}

impl SubscriptionError {
    pub fn tier_not_found(id: TierId) -> Self {
        SubscriptionError::TierNotFound(id)
    }

    pub fn subscription_not_found(id: SubscriptionId) -> Self {
        SubscriptionError::SubscriptionNotFound(id)
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        SubscriptionError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn payment_rejected(reason: impl Into<String>) -> Self {
        SubscriptionError::PaymentRejected {
            reason: reason.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        SubscriptionError::Forbidden(message.into())
    }

    pub fn ledger_unavailable(message: impl Into<String>) -> Self {
        SubscriptionError::LedgerUnavailable(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SubscriptionError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::TierNotFound(_) => ErrorCode::TierNotFound,
            SubscriptionError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            SubscriptionError::Conflict { code, .. } => *code,
            SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::InvalidState { code, .. } => *code,
            SubscriptionError::PaymentRejected { .. } => ErrorCode::PaymentRejected,
            SubscriptionError::Forbidden(_) => ErrorCode::Forbidden,
            SubscriptionError::LedgerUnavailable(_) => ErrorCode::LedgerUnavailable,
            SubscriptionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::TierNotFound(id) => format!("Tier not found: {}", id),
            SubscriptionError::SubscriptionNotFound(id) => {
                format!("Subscription not found: {}", id)
            }
            SubscriptionError::Conflict { message, .. } => message.clone(),
            SubscriptionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SubscriptionError::InvalidState { message, .. } => message.clone(),
            SubscriptionError::PaymentRejected { reason } => {
                format!("Payment verification failed: {}", reason)
            }
            SubscriptionError::Forbidden(message) => message.clone(),
            SubscriptionError::LedgerUnavailable(message) => {
                format!("Ledger unavailable: {}", message)
            }
            SubscriptionError::Infrastructure(message) => format!("Error: {}", message),
        }
    }

    /// Returns true if the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::LedgerUnavailable(_) | SubscriptionError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        let field = err
            .details
            .get("field")
            .cloned()
            .unwrap_or_else(|| "request".to_string());
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => SubscriptionError::ValidationFailed {
                field,
                message: err.message,
            },
            ErrorCode::PriceLocked
            | ErrorCode::TierInactive
            | ErrorCode::InvalidStateTransition => SubscriptionError::InvalidState {
                code: err.code,
                message: err.message,
            },
            ErrorCode::FreeTierExists
            | ErrorCode::SubscriptionExists
            | ErrorCode::PaymentAlreadyApplied
            | ErrorCode::ConcurrentModification => SubscriptionError::Conflict {
                code: err.code,
                message: err.message,
            },
            ErrorCode::PaymentRejected => SubscriptionError::PaymentRejected {
                reason: err.message,
            },
            ErrorCode::Forbidden | ErrorCode::Unauthorized => {
                SubscriptionError::Forbidden(err.message)
            }
            ErrorCode::LedgerUnavailable => SubscriptionError::LedgerUnavailable(err.message),
            _ => SubscriptionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(err: SubscriptionError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
