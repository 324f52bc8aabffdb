//! Subscription status state machine and payment status.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a user's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Paid (or free) and within its period.
    Active,

    /// Ended by the subscriber or by tier cancellation. Terminal.
    Cancelled,

    /// Renewal payments kept failing. Access withheld until a renewal succeeds.
    Suspended,

    /// Period ended without renewal. Terminal.
    Expired,
}

impl SubscriptionStatus {
    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Statuses that still hold a seat in the tier's subscriber count.
    pub fn is_counted(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Suspended)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Active, Cancelled)
                | (Active, Suspended)
                | (Active, Expired)
                | (Suspended, Active)
                | (Suspended, Expired)
                | (Suspended, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Cancelled, Suspended, Expired],
            Suspended => vec![Active, Expired, Cancelled],
            Cancelled => vec![],
            Expired => vec![],
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "suspended" => Ok(SubscriptionStatus::Suspended),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("Invalid subscription status: {}", other)),
        }
    }
}

/// Outcome of the most recent payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("Invalid payment status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubscriptionStatus::*;

    #[test]
    fn active_can_be_cancelled_suspended_or_expired() {
        assert_eq!(Active.transition_to(Cancelled), Ok(Cancelled));
        assert_eq!(Active.transition_to(Suspended), Ok(Suspended));
        assert_eq!(Active.transition_to(Expired), Ok(Expired));
    }

    #[test]
    fn suspended_can_be_restored() {
        assert_eq!(Suspended.transition_to(Active), Ok(Active));
    }

    #[test]
    fn suspended_can_expire() {
        assert!(Suspended.can_transition_to(&Expired));
    }

    #[test]
    fn cancelled_and_expired_are_terminal() {
        assert!(Cancelled.is_terminal());
        assert!(Expired.is_terminal());
        assert!(!Active.is_terminal());
        assert!(!Suspended.is_terminal());
    }

    #[test]
    fn expired_cannot_come_back() {
        assert!(Expired.transition_to(Active).is_err());
        assert!(Cancelled.transition_to(Active).is_err());
    }

    #[test]
    fn active_cannot_transition_to_itself() {
        assert!(!Active.can_transition_to(&Active));
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for status in [Active, Cancelled, Suspended, Expired] {
            for target in status.valid_transitions() {
                assert!(status.can_transition_to(&target), "{:?} -> {:?}", status, target);
            }
        }
    }

    #[test]
    fn only_live_statuses_hold_a_seat() {
        assert!(Active.is_counted());
        assert!(Suspended.is_counted());
        assert!(!Cancelled.is_counted());
        assert!(!Expired.is_counted());
    }

    #[test]
    fn status_parses_storage_representation() {
        for status in [Active, Cancelled, Suspended, Expired] {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>(), Ok(status));
        }
        assert!("paused".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn statuses_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&Suspended).unwrap(), "\"SUSPENDED\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::Failed).unwrap(), "\"FAILED\"");
    }
}
