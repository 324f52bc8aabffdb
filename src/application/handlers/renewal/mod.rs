//! Renewal scheduling.
//!
//! Sweeps that expire lapsed subscriptions and decide when subscribers hear
//! about upcoming or failed renewals.

mod renewal_scheduler;

pub use renewal_scheduler::{RenewalScheduler, SweepReport};
