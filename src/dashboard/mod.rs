//! Agent vault dashboard
//!
//! # Architecture
//!
//! ```text
//! DashboardPoller ──┬→ Dashboard::load_agent_state   (guarded)
//!                   ├→ Dashboard::fetch_transactions (guarded)
//!                   ├→ Dashboard::tick_cooldown
//!                   └→ SystemStatusClient → Dashboard::set_system_load
//!
//! user actions → Dashboard → VaultContract
//!                    ↓
//!              alerts channel → front end
//! ```

pub mod controller;
pub mod cooldown;
pub mod guard;
pub mod history;
pub mod poller;
pub mod render;
pub mod state;

pub use controller::{Alert, Dashboard, DashboardSettings};
pub use cooldown::Cooldown;
pub use history::TxRecord;
pub use poller::{DashboardPoller, PollIntervals};
pub use state::{DashboardState, Modal};
