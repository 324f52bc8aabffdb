//! Scheduler adapters.
//!
//! Timer-driven background services.

mod renewal_driver;

pub use renewal_driver::{RenewalSchedulerConfig, RenewalSchedulerDriver};
