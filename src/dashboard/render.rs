//! Plain-text rendering of the dashboard

use ethers::types::Address;
use std::fmt::Write;

use super::controller::DashboardSettings;
use super::history::HistoryView;
use super::state::DashboardState;
use crate::merchants::Merchant;
use crate::units::{format_eth, format_eth_fixed, short_address};

const RULE: &str = "------------------------------------------------------------";

/// Header line: product name and the shortened wallet
pub fn header(user: Option<Address>) -> String {
    let wallet = user
        .map(|u| short_address(&u))
        .unwrap_or_else(|| "read-only".to_string());
    format!(
        "ARTHA RAIL  |  The Autonomous Governance Layer for AI Commerce  |  {}",
        wallet
    )
}

/// The four metric cards
pub fn metrics(state: &DashboardState, settings: &DashboardSettings) -> Vec<(&'static str, String)> {
    let system = if state.is_high_load(settings.high_load_pct) && !state.paused {
        format!("{} (HIGH LOAD)", state.system_label())
    } else {
        state.system_label()
    };

    vec![
        (
            "Vault Balance",
            format!("{} ETH", format_eth_fixed(state.vault_balance, 4)),
        ),
        (
            "Remaining Budget",
            format!("{} ETH", format_eth(state.remaining_budget)),
        ),
        ("Cooldown Status", state.cooldown.label()),
        ("System Status", system),
    ]
}

/// Full dashboard view
pub fn render(
    state: &DashboardState,
    merchants: &[Merchant],
    settings: &DashboardSettings,
    user: Option<Address>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", header(user));
    let _ = writeln!(out, "{}", RULE);

    for (title, value) in metrics(state, settings) {
        let _ = writeln!(out, "  {:<18} {}", title, value);
    }
    if let Some(at) = state.last_refresh {
        let _ = writeln!(out, "  {:<18} {}", "Last refresh", at.format("%H:%M:%S UTC"));
    }

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "  Your Balance: {} ETH    Emergency Control: {}",
        format_eth_fixed(state.user_balance, 4),
        state.pause_action_label()
    );

    let _ = writeln!(out, "{}", RULE);
    out.push_str(&render_history(state, settings));

    let _ = writeln!(out, "{}", RULE);
    out.push_str(&render_merchants(merchants));

    out
}

pub fn render_history(state: &DashboardState, settings: &DashboardSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Recent Transactions");

    if state.recent_tx.is_empty() {
        let _ = writeln!(out, "  No transactions yet.");
        return out;
    }

    let view = HistoryView::new(
        &state.recent_tx,
        settings.history_preview,
        state.show_all_history,
    );

    for record in view.visible {
        let _ = writeln!(
            out,
            "  [{}] {}  block {}  Success",
            record.badge(),
            record.label,
            record.block_number
        );
        let _ = writeln!(
            out,
            "    {}  {}",
            record.short_hash(),
            record.explorer_url(&settings.explorer_tx_url)
        );
        for (name, value) in record.display_args() {
            let _ = writeln!(out, "      {}: {}", name, value);
        }
    }

    if let Some(toggle) = view.toggle_label(state.recent_tx.len(), settings.history_preview) {
        let _ = writeln!(out, "  {}", toggle);
    }

    out
}

pub fn render_merchants(merchants: &[Merchant]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Merchant Allowances");

    if merchants.is_empty() {
        let _ = writeln!(out, "  No merchants.");
        return out;
    }

    let _ = writeln!(out, "  {:<16} {:<10} {:<44} {}", "ID", "NAME", "WALLET", "LIMIT");
    for m in merchants {
        let _ = writeln!(
            out,
            "  {:<16} {:<10} {:<44} {} ETH",
            m.id, m.name, m.wallet, m.limit
        );
    }
    out
}
