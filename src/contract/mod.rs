//! Vault contract access
//!
//! Everything the dashboard knows about the chain goes through the
//! [`VaultContract`] trait. The production implementation binds the
//! deployed contract with `ethers`.
//!
//! # Architecture
//!
//! ```text
//! Dashboard → VaultContract ─┬→ EthersVault<M: Middleware> → JSON-RPC
//!                            └→ MockVault (tests)
//! ```

pub mod bindings;
pub mod client;
pub mod events;
#[cfg(test)]
pub mod mock;

pub use client::{AgentInfo, EthersVault, VaultContract};
pub use events::{DecodedEvent, EventKind, EventSet};
