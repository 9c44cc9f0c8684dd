//! Artha Rail
//!
//! Operator console for an agent spending vault: budget, cooldown and
//! pause state of an AI agent, vault funding, and merchant whitelisting.

pub mod app;
pub mod cli;
pub mod config;
pub mod contract;
pub mod dashboard;
pub mod error;
pub mod merchants;
pub mod system_status;
pub mod units;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
