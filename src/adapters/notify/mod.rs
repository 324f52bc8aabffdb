//! Renewal notifier adapters.

mod tracing_notifier;

pub use tracing_notifier::TracingRenewalNotifier;
