//! Billing cycle policy.

use crate::domain::foundation::Timestamp;

/// Length of a paid period and the notice window before it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
    pub cycle_days: i64,
    pub notice_days: i64,
    /// Consecutive failed renewals after which a subscription is suspended.
    pub max_payment_failures: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            cycle_days: 30,
            notice_days: 3,
            max_payment_failures: 3,
        }
    }
}

impl BillingPolicy {
    /// End of a period starting at `start`.
    pub fn period_end(&self, start: Timestamp) -> Timestamp {
        start.add_days(self.cycle_days)
    }

    /// When the renewal reminder for a period ending at `period_end` is due.
    pub fn renews_at(&self, period_end: Timestamp) -> Timestamp {
        period_end.minus_days(self.notice_days)
    }
}
