//! Dashboard view state

use chrono::{DateTime, Utc};
use ethers::types::U256;

use super::cooldown::Cooldown;
use super::history::TxRecord;
use crate::merchants::MerchantForm;

/// Overlay dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    AddMerchant,
    RemoveMerchant,
}

/// Everything the dashboard renders, plus pending form input
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    // Contract-derived
    pub remaining_budget: U256,
    pub cooldown: Cooldown,
    pub paused: bool,
    pub user_balance: U256,
    pub vault_balance: U256,
    pub recent_tx: Vec<TxRecord>,
    pub last_refresh: Option<DateTime<Utc>>,

    // Agent runtime
    pub system_load: u8,

    // Form input
    pub fund_amount: String,
    pub new_limit: String,
    pub new_merchant: MerchantForm,
    pub selected_merchant: Option<u64>,

    // Overlays
    pub show_all_history: bool,
    pub modal: Option<Modal>,
    pub drawer_open: bool,
}

impl DashboardState {
    /// A modal or the account drawer covers the dashboard
    pub fn overlay_active(&self) -> bool {
        self.modal.is_some() || self.drawer_open
    }

    pub fn system_label(&self) -> String {
        if self.paused {
            "PAUSED".to_string()
        } else {
            format!("ACTIVE - {}%", self.system_load)
        }
    }

    pub fn is_high_load(&self, threshold_pct: u8) -> bool {
        self.system_load > threshold_pct
    }

    /// Caption of the emergency control
    pub fn pause_action_label(&self) -> &'static str {
        if self.paused {
            "Resume Agent"
        } else {
            "Pause Agent"
        }
    }
}
