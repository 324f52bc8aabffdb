//! Completed payment records.
//!
//! Every verified ledger payment applied to a subscription leaves one record.
//! The ledger transaction hash is unique across records, so a single on-chain
//! payment can never pay for two periods.

use crate::domain::foundation::{SubscriptionId, TierId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RevenueSplit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    Initial,
    Renewal,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Initial => "initial",
            PaymentKind::Renewal => "renewal",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(PaymentKind::Initial),
            "renewal" => Ok(PaymentKind::Renewal),
            other => Err(format!("Invalid payment kind: {}", other)),
        }
    }
}

/// A verified payment that was applied to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub ledger_tx_hash: String,
    pub subscription_id: SubscriptionId,
    pub tier_id: TierId,
    pub provider_id: UserId,
    pub user_id: UserId,
    pub kind: PaymentKind,
    pub split: RevenueSplit,
    pub recorded_at: Timestamp,
}
