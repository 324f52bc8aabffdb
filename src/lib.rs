//! Tier Ledger - paid access tiers backed by ledger payments
//!
//! Providers publish priced tiers, subscribers pay for them with an on-chain
//! stablecoin transfer, and the ledger keeps subscription state, revenue
//! splits and subscriber counts consistent while content systems ask it who
//! may see what.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
