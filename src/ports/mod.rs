//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `TierRepository` - Tier aggregate persistence and cancellation cascade
//! - `SubscriptionRepository` - Atomic subscription writes with counter updates
//! - `SubscriptionReader` - Queries for access checks, sweeps and dashboards
//!
//! ## External Service Ports
//!
//! - `LedgerClient` - Transaction lookup on the payment ledger
//! - `WalletDirectory` - Registered wallet addresses of users
//! - `RenewalNotifier` - Delivery of renewal reminders and retry prompts
//! - `SessionValidator` - Bearer token validation

mod ledger_client;
mod renewal_notifier;
mod session_validator;
mod subscription_reader;
mod subscription_repository;
mod tier_repository;
mod wallet_directory;

pub use ledger_client::{LedgerClient, LedgerError};
pub use renewal_notifier::RenewalNotifier;
pub use session_validator::SessionValidator;
pub use subscription_reader::{PaymentTotals, SubscriptionReader};
pub use subscription_repository::SubscriptionRepository;
pub use tier_repository::TierRepository;
pub use wallet_directory::WalletDirectory;
