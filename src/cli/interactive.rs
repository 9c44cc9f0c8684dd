//! Interactive terminal front end: landing, connect and dashboard pages

use anyhow::Result;
use dialoguer::{Input, Select};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use super::commands::print_alerts;
use crate::app::{App, Page};
use crate::config::Config;
use crate::dashboard::history::HistoryView;
use crate::dashboard::{
    render, Alert, Dashboard, DashboardPoller, DashboardSettings, DashboardState, PollIntervals,
};
use crate::merchants::{MerchantBook, MerchantForm};
use crate::system_status::SystemStatusClient;
use crate::units::short_address;
use crate::wallet::{Session, WalletConnector};

/// Run the page loop until the user quits
pub async fn run(config: &Config) -> Result<()> {
    let mut app = App::new();

    loop {
        match app.page() {
            Page::Landing => {
                println!("\n=== ARTHA RAIL ===");
                println!("The Autonomous Governance Layer for AI Commerce\n");
                match select("Menu", &["Connect Wallet", "Quit"]).await? {
                    0 => app.request_connect(),
                    _ => return Ok(()),
                }
            }
            Page::Connect => {
                println!("\n=== CONNECT WALLET ===\n");
                if let Some(last) = WalletConnector::new(config).last_session() {
                    println!(
                        "Last connected: {} ({})",
                        short_address(&last.address),
                        last.connected_at.format("%Y-%m-%d %H:%M UTC")
                    );
                }
                match select("Wallet", &["Connect", "Back"]).await? {
                    0 => {
                        let result = WalletConnector::new(config).connect().await;
                        for alert in app.on_connect_result(result) {
                            println!(">> {}", alert);
                        }
                    }
                    _ => app.back(),
                }
            }
            Page::Dashboard => {
                let Some(session) = app.session() else {
                    app.disconnect();
                    continue;
                };
                let leave = dashboard_page(config, session).await?;
                match leave {
                    Leave::Disconnect => {
                        WalletConnector::new(config).disconnect()?;
                        app.disconnect();
                    }
                    Leave::Quit => return Ok(()),
                }
            }
        }
    }
}

enum Leave {
    Disconnect,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Refresh,
    Fund,
    TogglePause,
    SetLimit,
    ToggleHistory,
    AddMerchant,
    RemoveMerchant,
    Account,
    Quit,
}

/// Dashboard menu; the history toggle only appears when the rendered view has one
fn menu_items(state: &DashboardState, preview: usize) -> Vec<(String, MenuAction)> {
    let mut items = vec![
        ("Refresh".to_string(), MenuAction::Refresh),
        ("Fund Agent".to_string(), MenuAction::Fund),
        (state.pause_action_label().to_string(), MenuAction::TogglePause),
        ("Set Daily Limit".to_string(), MenuAction::SetLimit),
    ];

    let view = HistoryView::new(&state.recent_tx, preview, state.show_all_history);
    if let Some(label) = view.toggle_label(state.recent_tx.len(), preview) {
        items.push((label, MenuAction::ToggleHistory));
    }

    items.extend([
        ("Add Merchant".to_string(), MenuAction::AddMerchant),
        ("Remove Merchant".to_string(), MenuAction::RemoveMerchant),
        ("Account".to_string(), MenuAction::Account),
        ("Quit".to_string(), MenuAction::Quit),
    ]);
    items
}

async fn dashboard_page(config: &Config, session: &Session) -> Result<Leave> {
    let settings = DashboardSettings::from_config(config)?;
    let merchants = MerchantBook::load(&config.wallet.data_dir())?;
    let (dashboard, mut alerts) =
        Dashboard::new(session.vault.clone(), Some(session.address), settings, merchants);
    let dashboard = Arc::new(dashboard);

    let status = if config.system_status.enabled {
        Some(SystemStatusClient::new(&config.system_status)?)
    } else {
        None
    };
    let poller = DashboardPoller::new(dashboard.clone(), status, PollIntervals::from_config(config));
    poller.start();

    let leave = loop {
        show(&dashboard, &mut alerts).await;

        let state = dashboard.snapshot().await;
        let menu = menu_items(&state, dashboard.settings().history_preview);
        let labels: Vec<&str> = menu.iter().map(|(label, _)| label.as_str()).collect();
        let choice = select("Action", &labels).await?;

        match menu.get(choice).map(|(_, action)| *action).unwrap_or(MenuAction::Quit) {
            MenuAction::Refresh => {}
            MenuAction::Fund => fund(&dashboard, &mut alerts).await?,
            MenuAction::TogglePause => {
                let _ = dashboard.toggle_pause().await;
            }
            MenuAction::SetLimit => {
                let limit = input("New daily limit (ETH)").await?;
                dashboard.set_new_limit(limit).await;
                let _ = dashboard.set_daily_limit().await;
            }
            MenuAction::ToggleHistory => {
                dashboard.toggle_history().await;
            }
            MenuAction::AddMerchant => add_merchant(&dashboard).await?,
            MenuAction::RemoveMerchant => remove_merchant(&dashboard).await?,
            MenuAction::Account => {
                dashboard.set_drawer(true).await;
                println!("\nConnected: {}", short_address(&session.address));
                let choice = select("Account", &["Disconnect", "Close"]).await?;
                if choice == 0 {
                    dashboard.disconnect().await;
                    break Leave::Disconnect;
                }
                dashboard.set_drawer(false).await;
            }
            MenuAction::Quit => break Leave::Quit,
        }
        print_alerts(&mut alerts);
    };

    poller.stop();
    info!("Left dashboard");
    Ok(leave)
}

async fn show(dashboard: &Dashboard, alerts: &mut mpsc::UnboundedReceiver<Alert>) {
    let state = dashboard.snapshot().await;
    let merchants = dashboard.merchants().await;
    println!();
    println!(
        "{}",
        render::render(&state, &merchants, dashboard.settings(), dashboard.user())
    );
    print_alerts(alerts);
}

async fn fund(dashboard: &Dashboard, alerts: &mut mpsc::UnboundedReceiver<Alert>) -> Result<()> {
    match select("Amount", &["Enter amount", "Max"]).await? {
        0 => {
            let amount = input("Amount (ETH)").await?;
            dashboard.set_fund_amount(amount).await;
        }
        _ => {
            let max = dashboard.set_max_amount().await;
            println!("Max: {} ETH", max);
        }
    }
    print_alerts(alerts);
    let _ = dashboard.fund_agent().await;
    Ok(())
}

async fn add_merchant(dashboard: &Dashboard) -> Result<()> {
    dashboard.open_add_merchant().await;
    let name = input("Merchant name").await?;
    let wallet = input("Wallet address").await?;
    let limit = input("Limit (ETH)").await?;
    dashboard
        .set_merchant_form(MerchantForm::new(name, wallet, limit))
        .await;

    if let Ok(id) = dashboard.add_merchant().await {
        info!("Merchant {} added", id);
    }
    Ok(())
}

async fn remove_merchant(dashboard: &Dashboard) -> Result<()> {
    let merchants = dashboard.merchants().await;
    if merchants.is_empty() {
        println!("No merchants.");
        return Ok(());
    }

    let mut items: Vec<String> = merchants
        .iter()
        .map(|m| format!("{} ({}, {} ETH)", m.name, m.wallet, m.limit))
        .collect();
    items.push("Cancel".to_string());

    let choice = select("Remove", &items).await?;
    let Some(merchant) = merchants.get(choice) else {
        return Ok(());
    };

    dashboard.select_merchant_for_removal(merchant.id).await;
    let confirm = select(
        &format!("Remove {}? Only the local list changes.", merchant.name),
        &["Remove", "Cancel"],
    )
    .await?;
    if confirm == 0 {
        let _ = dashboard.remove_merchant().await;
    } else {
        dashboard.close_modal().await;
    }
    Ok(())
}

/// Blocking prompts run off the async workers so the poller keeps ticking
async fn select<S: ToString>(prompt: &str, items: &[S]) -> Result<usize> {
    let prompt = prompt.to_string();
    let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    let choice = tokio::task::spawn_blocking(move || {
        Select::new()
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()
    })
    .await??;
    Ok(choice)
}

async fn input(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    let value = tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await??;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DecodedEvent, EventKind};
    use crate::dashboard::TxRecord;
    use ethers::types::{Address, H256};

    fn records(n: u64) -> Vec<TxRecord> {
        (1..=n)
            .map(|b| {
                TxRecord::from(DecodedEvent {
                    kind: EventKind::AgentRun,
                    tx_hash: H256::from_low_u64_be(b),
                    block_number: b,
                    args: vec![("agent".to_string(), ethers::abi::Token::Address(Address::zero()))],
                })
            })
            .collect()
    }

    fn actions(state: &DashboardState) -> Vec<MenuAction> {
        menu_items(state, 3).into_iter().map(|(_, a)| a).collect()
    }

    #[test]
    fn test_history_toggle_hidden_for_short_history() {
        let state = DashboardState {
            recent_tx: records(3),
            ..Default::default()
        };
        assert!(!actions(&state).contains(&MenuAction::ToggleHistory));
        assert_eq!(actions(&state).last(), Some(&MenuAction::Quit));
    }

    #[test]
    fn test_history_toggle_matches_rendered_caption() {
        let mut state = DashboardState {
            recent_tx: records(5),
            ..Default::default()
        };
        let menu = menu_items(&state, 3);
        assert!(menu.contains(&("Show More (2 more)".to_string(), MenuAction::ToggleHistory)));

        state.show_all_history = true;
        let menu = menu_items(&state, 3);
        assert!(menu.contains(&("Show Less".to_string(), MenuAction::ToggleHistory)));
    }
}
