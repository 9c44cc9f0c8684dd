//! CLI command implementations

use anyhow::{Context, Result};
use dialoguer::Confirm;
use ethers::types::Address;
use ethers::utils::{parse_ether, to_checksum};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::dashboard::{render, Alert, Dashboard, DashboardSettings};
use crate::error::Error;
use crate::merchants::{MerchantBook, MerchantForm};
use crate::system_status::SystemStatusClient;
use crate::units::{format_eth, format_eth_fixed};
use crate::wallet::{SignerSource, WalletConnector};

/// Dashboard bound to the connected wallet
async fn connected_dashboard(
    config: &Config,
) -> Result<(Arc<Dashboard>, mpsc::UnboundedReceiver<Alert>)> {
    let connector = WalletConnector::new(config);
    let session = connector
        .connect()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Wallet could not be unlocked"))?;

    build_dashboard(config, session.vault, Some(session.address))
}

/// Dashboard for the connected wallet, or read-only when none is configured
async fn viewing_dashboard(
    config: &Config,
) -> Result<(Arc<Dashboard>, mpsc::UnboundedReceiver<Alert>)> {
    let connector = WalletConnector::new(config);
    match connector.connect().await {
        Ok(Some(session)) => build_dashboard(config, session.vault, Some(session.address)),
        Ok(None) | Err(Error::NoWallet(_)) => {
            info!("No usable wallet, showing read-only view");
            let vault = connector.read_only().await?;
            build_dashboard(config, vault, None)
        }
        Err(e) => Err(e.into()),
    }
}

fn build_dashboard(
    config: &Config,
    vault: Arc<dyn crate::contract::VaultContract>,
    user: Option<Address>,
) -> Result<(Arc<Dashboard>, mpsc::UnboundedReceiver<Alert>)> {
    let settings = DashboardSettings::from_config(config)?;
    let merchants = MerchantBook::load(&config.wallet.data_dir())?;
    let (dashboard, alerts) = Dashboard::new(vault, user, settings, merchants);
    Ok((Arc::new(dashboard), alerts))
}

/// Print queued alerts
pub(crate) fn print_alerts(alerts: &mut mpsc::UnboundedReceiver<Alert>) {
    while let Ok(alert) = alerts.try_recv() {
        println!(">> {}", alert);
    }
}

/// Ask before a transaction unless confirmations are off or forced
fn confirm_tx(config: &Config, force: bool, prompt: String) -> Result<bool> {
    if force || !config.wallet.confirm_transactions {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !confirmed {
        println!("Cancelled.");
    }
    Ok(confirmed)
}

/// Show budget, cooldown, pause state, balances, history and merchants
pub async fn status(config: &Config) -> Result<()> {
    let (dashboard, _alerts) = viewing_dashboard(config).await?;

    futures::join!(dashboard.fetch_transactions(), dashboard.load_agent_state());

    let state = dashboard.snapshot().await;
    let merchants = dashboard.merchants().await;
    println!();
    println!(
        "{}",
        render::render(&state, &merchants, dashboard.settings(), dashboard.user())
    );

    Ok(())
}

/// Show the agent's transaction history
pub async fn history(config: &Config, all: bool) -> Result<()> {
    let (dashboard, _alerts) = viewing_dashboard(config).await?;

    dashboard.fetch_transactions().await;
    if all {
        dashboard.toggle_history().await;
    }

    let state = dashboard.snapshot().await;
    println!();
    println!("{}", render::render_history(&state, dashboard.settings()));
    Ok(())
}

/// Send ETH from the wallet to the vault
pub async fn fund(config: &Config, amount: Option<String>, max: bool, force: bool) -> Result<()> {
    let (dashboard, mut alerts) = connected_dashboard(config).await?;

    if max {
        dashboard.load_agent_state().await;
        let max_amount = dashboard.set_max_amount().await;
        println!("Max fundable amount: {} ETH", max_amount);
    } else {
        dashboard.set_fund_amount(amount.unwrap_or_default()).await;
    }

    let amount = dashboard.snapshot().await.fund_amount;
    if !amount.trim().is_empty()
        && !confirm_tx(
            config,
            force,
            format!(
                "Fund vault {} with {} ETH?",
                to_checksum(&dashboard.vault_address(), None),
                amount.trim()
            ),
        )?
    {
        return Ok(());
    }

    let result = dashboard.fund_agent().await;
    print_alerts(&mut alerts);
    result?;
    Ok(())
}

/// Pause or resume the agent
pub async fn toggle_pause(config: &Config, force: bool) -> Result<()> {
    let (dashboard, mut alerts) = connected_dashboard(config).await?;
    dashboard.load_agent_state().await;

    let state = dashboard.snapshot().await;
    warn!("=== EMERGENCY CONTROL: {} ===", state.pause_action_label());
    if !confirm_tx(config, force, format!("{}?", state.pause_action_label()))? {
        return Ok(());
    }

    let result = dashboard.toggle_pause().await;
    print_alerts(&mut alerts);
    let paused = result?;
    println!("System Status: {}", if paused { "PAUSED" } else { "ACTIVE" });
    Ok(())
}

/// Reconfigure the agent's daily limit
pub async fn set_limit(config: &Config, limit: &str, force: bool) -> Result<()> {
    let (dashboard, mut alerts) = connected_dashboard(config).await?;

    if !limit.trim().is_empty()
        && !confirm_tx(
            config,
            force,
            format!(
                "Set daily limit of {} to {} ETH (cooldown {}s)?",
                config.contract.agent_name,
                limit.trim(),
                config.contract.cooldown_secs
            ),
        )?
    {
        return Ok(());
    }

    dashboard.set_new_limit(limit).await;
    let result = dashboard.set_daily_limit().await;
    print_alerts(&mut alerts);
    result?;
    Ok(())
}

/// List locally tracked merchants
pub fn merchants_list(config: &Config) -> Result<()> {
    let book = MerchantBook::load(&config.wallet.data_dir())?;
    println!();
    println!("{}", render::render_merchants(book.list()));
    Ok(())
}

/// Whitelist a merchant on the contract and track it locally
pub async fn merchants_add(
    config: &Config,
    name: &str,
    wallet: &str,
    limit: &str,
    force: bool,
) -> Result<()> {
    let (dashboard, mut alerts) = connected_dashboard(config).await?;
    let form = MerchantForm::new(name, wallet, limit);

    if form.is_complete()
        && !confirm_tx(
            config,
            force,
            format!("Whitelist {} ({}) on the vault contract?", name, wallet),
        )?
    {
        return Ok(());
    }

    dashboard.open_add_merchant().await;
    dashboard.set_merchant_form(form).await;
    let result = dashboard.add_merchant().await;
    print_alerts(&mut alerts);
    let id = result?;
    println!("Merchant tracked with id {}", id);
    Ok(())
}

/// Stop tracking a merchant (the contract whitelist is unchanged)
pub fn merchants_remove(config: &Config, id: u64, force: bool) -> Result<()> {
    let mut book = MerchantBook::load(&config.wallet.data_dir())?;
    let merchant = book
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Merchant not found: {}", id))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {} from the local list?", merchant.name))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    book.remove(id)?;
    println!("Removed {}. The contract whitelist is unchanged.", merchant.name);
    Ok(())
}

/// Read-only check of the rules that gate an agent payment
pub async fn check_rules(config: &Config, merchant: &str) -> Result<()> {
    let merchant = Address::from_str(merchant)
        .with_context(|| format!("Invalid merchant address: {}", merchant))?;
    let agent = config.agent_address()?;
    let vault = WalletConnector::new(config).read_only().await?;

    println!("\n=== INSPECTING CONTRACT {} ===\n", to_checksum(&vault.address(), None));

    let allowed = vault.is_whitelisted(merchant).await?;
    println!(
        "Merchant {}: {}",
        to_checksum(&merchant, None),
        if allowed {
            "ALLOWED"
        } else {
            "BANNED (not whitelisted)"
        }
    );

    match vault.agent_info(agent).await {
        Ok(info) => {
            println!(
                "Agent {}: {}",
                to_checksum(&agent, None),
                if info.active { "ACTIVE" } else { "INACTIVE" }
            );
            println!("  Name: {}", info.name);
            println!("  Budget: {} ETH", format_eth(info.remaining_budget));
            println!("  Next allowed tx: {}", info.next_allowed_tx_time);
        }
        Err(e) => {
            warn!("Agent lookup failed: {}", e);
            println!(
                "Agent {}: NOT FOUND (never configured)",
                to_checksum(&agent, None)
            );
        }
    }

    println!();
    Ok(())
}

/// Owner bootstrap: authorize the agent, then whitelist a merchant
pub async fn setup(config: &Config, merchant: &str, label: &str, force: bool) -> Result<()> {
    let merchant = Address::from_str(merchant)
        .with_context(|| format!("Invalid merchant address: {}", merchant))?;
    let agent = config.agent_address()?;
    let daily_limit = parse_ether(config.contract.initial_daily_limit_eth)
        .context("Invalid initial_daily_limit_eth")?;

    let session = WalletConnector::new(config)
        .connect()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Wallet could not be unlocked. The contract owner key is required"))?;

    println!("Configuring contract: {}", to_checksum(&session.vault.address(), None));
    println!("Owner: {}", to_checksum(&session.address, None));

    if !confirm_tx(
        config,
        force,
        format!(
            "Authorize agent {} ({} ETH/day, {}s cooldown) and whitelist {}?",
            to_checksum(&agent, None),
            config.contract.initial_daily_limit_eth,
            config.contract.cooldown_secs,
            to_checksum(&merchant, None)
        ),
    )? {
        return Ok(());
    }

    println!("\n1. Authorizing agent...");
    let tx = session
        .vault
        .configure_agent(
            agent,
            &config.contract.agent_name,
            daily_limit,
            config.contract.cooldown_secs,
        )
        .await?;
    println!("   Agent authorized ({:?})", tx);

    println!("\n2. Whitelisting merchant...");
    let tx = session.vault.add_merchant(merchant, label).await?;
    println!("   Merchant whitelisted ({:?})", tx);

    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check RPC, contract, status endpoint and wallet
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;

    print!("RPC Endpoint... ");
    let start = Instant::now();
    let vault = match WalletConnector::new(config).read_only().await {
        Ok(vault) => {
            println!(
                "OK (chain {}, {}ms)",
                config.rpc.chain_id,
                start.elapsed().as_millis()
            );
            Some(vault)
        }
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
            None
        }
    };

    if let Some(vault) = vault {
        print!("Vault Contract... ");
        match vault.is_paused().await {
            Ok(paused) => match vault.balance_of(vault.address()).await {
                Ok(balance) => println!(
                    "OK ({}, {} ETH)",
                    if paused { "paused" } else { "active" },
                    format_eth_fixed(balance, 4)
                ),
                Err(e) => {
                    println!("FAILED: {}", e);
                    all_healthy = false;
                }
            },
            Err(e) => {
                println!("FAILED: {}", e);
                all_healthy = false;
            }
        }
    }

    if config.system_status.enabled {
        print!("Agent Status Endpoint... ");
        match SystemStatusClient::new(&config.system_status)?.fetch_load().await {
            Ok(load) => println!("OK (load {}%)", load),
            Err(e) => {
                println!("UNREACHABLE: {}", e);
            }
        }
    } else {
        println!("Agent Status Endpoint... DISABLED");
    }

    print!("Wallet... ");
    match SignerSource::detect(&config.wallet) {
        Some(source) => match source.load(config.rpc.chain_id) {
            Ok(signer) => {
                use ethers::signers::Signer;
                println!("OK ({})", to_checksum(&signer.address(), None));
            }
            Err(e) => {
                println!("FAILED: {}", e);
                all_healthy = false;
            }
        },
        None => println!("NOT CONFIGURED (read-only)"),
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
    } else {
        println!("Some systems are unhealthy. Check the errors above.");
    }

    Ok(())
}

/// Forget the connected session
pub fn disconnect(config: &Config) -> Result<()> {
    let connector = WalletConnector::new(config);
    if connector.disconnect()? {
        println!("Wallet disconnected.");
    } else {
        println!("No connected session.");
    }
    Ok(())
}
