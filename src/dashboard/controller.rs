//! Dashboard controller
//!
//! Owns the view state and turns user actions into contract calls. Results
//! are reported as alerts on a channel so the terminal front end can show
//! them in order, including the "pending" notice that precedes a slow
//! transaction.

use ethers::types::{Address, U256};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::cooldown::unix_now;
use super::guard::InFlight;
use super::history::build_history;
use super::state::{DashboardState, Modal};
use crate::config::Config;
use crate::contract::{EventKind, VaultContract};
use crate::error::{Error, Result};
use crate::merchants::{Merchant, MerchantBook, MerchantForm};
use crate::units::{max_fund_amount, parse_eth_amount, wei_to_eth};

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert(pub String);

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-deployment knobs the controller needs
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub agent: Address,
    pub agent_name: String,
    pub cooldown_secs: u64,
    pub fund_gas_limit: u64,
    pub balance_reserve_eth: f64,
    pub history_preview: usize,
    pub high_load_pct: u8,
    pub explorer_tx_url: String,
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            agent: config.agent_address()?,
            agent_name: config.contract.agent_name.clone(),
            cooldown_secs: config.contract.cooldown_secs,
            fund_gas_limit: config.dashboard.fund_gas_limit,
            balance_reserve_eth: config.dashboard.balance_reserve_eth,
            history_preview: config.dashboard.history_preview,
            high_load_pct: config.dashboard.high_load_pct,
            explorer_tx_url: config.contract.explorer_tx_url.clone(),
        })
    }
}

pub struct Dashboard {
    vault: Arc<dyn VaultContract>,
    /// Connected wallet; read-only views have none
    user: Option<Address>,
    settings: DashboardSettings,
    state: RwLock<DashboardState>,
    merchants: Mutex<MerchantBook>,
    loading_state: InFlight,
    loading_history: InFlight,
    alerts: mpsc::UnboundedSender<Alert>,
}

impl Dashboard {
    pub fn new(
        vault: Arc<dyn VaultContract>,
        user: Option<Address>,
        settings: DashboardSettings,
        merchants: MerchantBook,
    ) -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (alerts, alert_rx) = mpsc::unbounded_channel();
        let dashboard = Self {
            vault,
            user,
            settings,
            state: RwLock::new(DashboardState::default()),
            merchants: Mutex::new(merchants),
            loading_state: InFlight::new(),
            loading_history: InFlight::new(),
            alerts,
        };
        (dashboard, alert_rx)
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn user(&self) -> Option<Address> {
        self.user
    }

    pub fn vault_address(&self) -> Address {
        self.vault.address()
    }

    /// Copy of the current view state
    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn merchants(&self) -> Vec<Merchant> {
        self.merchants.lock().await.list().to_vec()
    }

    fn alert(&self, message: impl Into<String>) {
        let alert = Alert::new(message);
        debug!("Alert: {}", alert);
        // Receiver gone means the front end is shutting down
        let _ = self.alerts.send(alert);
    }

    // ---------------------------------------------------------------
    // Polled loads
    // ---------------------------------------------------------------

    /// Refresh budget, cooldown, pause flag and balances.
    ///
    /// Returns `false` without doing anything if a load is already running.
    pub async fn load_agent_state(&self) -> bool {
        let Some(_guard) = self.loading_state.try_begin() else {
            debug!("Agent state load already in flight, skipping");
            return false;
        };

        match self.read_agent_state().await {
            Ok(()) => info!("Agent state loaded"),
            Err(e) => error!("Error loading agent state: {}", e),
        }
        true
    }

    async fn read_agent_state(&self) -> Result<()> {
        let info = self.vault.agent_info(self.settings.agent).await?;
        let paused = self.vault.is_paused().await?;
        let user_balance = match self.user {
            Some(user) => Some(self.vault.balance_of(user).await?),
            None => None,
        };
        let vault_balance = self.vault.balance_of(self.vault.address()).await?;

        let mut state = self.state.write().await;
        state.remaining_budget = info.remaining_budget;
        state.cooldown.set_target(info.next_allowed_tx_time, unix_now());
        state.paused = paused;
        if let Some(balance) = user_balance {
            state.user_balance = balance;
        }
        state.vault_balance = vault_balance;
        state.last_refresh = Some(chrono::Utc::now());
        Ok(())
    }

    /// Refresh the transaction history from contract logs.
    ///
    /// Returns `false` without doing anything if a fetch is already running.
    pub async fn fetch_transactions(&self) -> bool {
        let Some(_guard) = self.loading_history.try_begin() else {
            debug!("History fetch already in flight, skipping");
            return false;
        };

        debug!("Fetching history...");
        let configured = match self.vault.past_events(EventKind::AgentConfigured).await {
            Ok(events) => events,
            Err(e) => {
                error!("Error fetching history: {}", e);
                return true;
            }
        };

        let runs = match self.vault.past_events(EventKind::AgentRun).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Could not fetch AgentRun events: {}", e);
                Vec::new()
            }
        };

        let records = build_history(configured, runs, self.settings.agent);
        debug!("History has {} records", records.len());
        self.state.write().await.recent_tx = records;
        true
    }

    /// Recompute the cooldown countdown
    pub async fn tick_cooldown(&self) {
        self.state.write().await.cooldown.tick(unix_now());
    }

    pub async fn set_system_load(&self, load_pct: u8) {
        self.state.write().await.system_load = load_pct;
    }

    // ---------------------------------------------------------------
    // Form input and overlays
    // ---------------------------------------------------------------

    pub async fn set_fund_amount(&self, amount: impl Into<String>) {
        self.state.write().await.fund_amount = amount.into();
    }

    pub async fn set_new_limit(&self, limit: impl Into<String>) {
        self.state.write().await.new_limit = limit.into();
    }

    /// Fill the fund input with the balance minus the gas reserve
    pub async fn set_max_amount(&self) -> String {
        let mut state = self.state.write().await;
        let max = max_fund_amount(
            wei_to_eth(state.user_balance),
            self.settings.balance_reserve_eth,
        );
        state.fund_amount = max.clone();
        max
    }

    pub async fn toggle_history(&self) -> bool {
        let mut state = self.state.write().await;
        state.show_all_history = !state.show_all_history;
        state.show_all_history
    }

    pub async fn open_add_merchant(&self) {
        self.state.write().await.modal = Some(Modal::AddMerchant);
    }

    pub async fn set_merchant_form(&self, form: MerchantForm) {
        self.state.write().await.new_merchant = form;
    }

    pub async fn select_merchant_for_removal(&self, id: u64) {
        let mut state = self.state.write().await;
        state.selected_merchant = Some(id);
        state.modal = Some(Modal::RemoveMerchant);
    }

    pub async fn close_modal(&self) {
        let mut state = self.state.write().await;
        state.modal = None;
        state.selected_merchant = None;
    }

    pub async fn set_drawer(&self, open: bool) {
        self.state.write().await.drawer_open = open;
    }

    // ---------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------

    /// Send the fund input to the vault
    pub async fn fund_agent(&self) -> Result<()> {
        let input = self.state.read().await.fund_amount.clone();
        let amount = match parse_eth_amount(&input) {
            Ok(amount) => amount,
            Err(e) => {
                self.alert(e.to_string());
                return Err(e);
            }
        };

        info!("Funding vault with {} ETH", input.trim());
        match self.vault.fund(amount, self.settings.fund_gas_limit).await {
            Ok(_) => {
                self.state.write().await.fund_amount.clear();
                self.alert("Success!");
                Ok(())
            }
            Err(e) => {
                self.alert(e.to_string());
                Err(e)
            }
        }
    }

    /// Flip the contract pause flag; the local flag follows on success
    pub async fn toggle_pause(&self) -> Result<bool> {
        match self.vault.toggle_pause().await {
            Ok(_) => {
                let mut state = self.state.write().await;
                state.paused = !state.paused;
                info!("Agent {}", if state.paused { "paused" } else { "resumed" });
                Ok(state.paused)
            }
            Err(e) => {
                self.alert(e.to_string());
                Err(e)
            }
        }
    }

    /// Reconfigure the agent with the daily limit from the limit input
    pub async fn set_daily_limit(&self) -> Result<()> {
        let input = self.state.read().await.new_limit.clone();
        let limit = match parse_eth_amount(&input) {
            Ok(limit) => limit,
            Err(e) => {
                self.alert(e.to_string());
                return Err(e);
            }
        };

        match self.configure_agent(limit).await {
            Ok(()) => {
                self.state.write().await.new_limit.clear();
                self.alert("Limit Updated!");
                Ok(())
            }
            Err(e) => {
                self.alert(e.to_string());
                Err(e)
            }
        }
    }

    async fn configure_agent(&self, daily_limit: U256) -> Result<()> {
        self.vault
            .configure_agent(
                self.settings.agent,
                &self.settings.agent_name,
                daily_limit,
                self.settings.cooldown_secs,
            )
            .await?;
        Ok(())
    }

    /// Whitelist the merchant from the form, then track it locally
    pub async fn add_merchant(&self) -> Result<u64> {
        let form = self.state.read().await.new_merchant.clone();
        if !form.is_complete() {
            let err = Error::MissingInput("Fill all fields".to_string());
            self.alert(err.to_string());
            return Err(err);
        }

        self.alert("Transaction Pending...");
        match self.whitelist(&form).await {
            Ok(id) => {
                let mut state = self.state.write().await;
                state.new_merchant = MerchantForm::default();
                state.modal = None;
                drop(state);
                self.alert("Success!");
                Ok(id)
            }
            Err(e) => {
                let message = e.to_string();
                self.alert(if message.is_empty() {
                    "Transaction failed".to_string()
                } else {
                    message
                });
                Err(e)
            }
        }
    }

    async fn whitelist(&self, form: &MerchantForm) -> Result<u64> {
        let wallet = Address::from_str(form.wallet.trim())
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", form.wallet.trim(), e)))?;

        self.vault.add_merchant(wallet, form.name.trim()).await?;

        // The transaction is mined, so a failed save only warns
        let mut book = self.merchants.lock().await;
        let id = book.insert(form)?;
        if let Err(e) = book.save() {
            warn!("Merchant {} whitelisted but not saved: {}", id, e);
            self.alert(format!("Merchant whitelisted, but the local list was not saved: {}", e));
        }
        Ok(id)
    }

    /// Drop the selected merchant from the local list only
    pub async fn remove_merchant(&self) -> Result<Option<Merchant>> {
        let selected = {
            let mut state = self.state.write().await;
            state.modal = None;
            state.selected_merchant.take()
        };

        let Some(id) = selected else {
            return Ok(None);
        };

        match self.merchants.lock().await.remove(id) {
            Ok(merchant) => Ok(Some(merchant)),
            Err(e) => {
                self.alert(e.to_string());
                Err(e)
            }
        }
    }

    /// Close the drawer ahead of leaving the dashboard
    pub async fn disconnect(&self) {
        info!("Disconnecting wallet...");
        let mut state = self.state.write().await;
        state.drawer_open = false;
        state.modal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::mock::MockVault;
    use crate::contract::{AgentInfo, DecodedEvent};
    use ethers::abi::Token;
    use ethers::types::H256;
    use tokio_test::assert_err;
    use std::time::Duration;

    const ETH: u64 = 1_000_000_000_000_000_000;

    fn vault_addr() -> Address {
        Address::from_low_u64_be(0xfa017)
    }

    fn user() -> Address {
        Address::from_low_u64_be(0x05e4)
    }

    fn agent() -> Address {
        Address::from_low_u64_be(0xa6e47)
    }

    fn settings() -> DashboardSettings {
        DashboardSettings {
            agent: agent(),
            agent_name: "AI-Agent".to_string(),
            cooldown_secs: 60,
            fund_gas_limit: 300_000,
            balance_reserve_eth: 0.001,
            history_preview: 3,
            high_load_pct: 90,
            explorer_tx_url: "https://sepolia.etherscan.io/tx/".to_string(),
        }
    }

    async fn mock() -> Arc<MockVault> {
        let vault = MockVault::new(vault_addr(), user());
        {
            let mut state = vault.state.lock().await;
            state.agents.insert(
                agent(),
                AgentInfo {
                    name: "AI-Agent".to_string(),
                    remaining_budget: U256::from(ETH / 2),
                    next_allowed_tx_time: unix_now() + 30,
                    active: true,
                },
            );
            state.balances.insert(user(), U256::from(2 * ETH));
            state.balances.insert(vault_addr(), U256::from(ETH / 100));
        }
        Arc::new(vault)
    }

    fn dashboard(vault: Arc<MockVault>) -> (Dashboard, mpsc::UnboundedReceiver<Alert>) {
        Dashboard::new(vault, Some(user()), settings(), MerchantBook::seeded())
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Alert>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(alert) = rx.try_recv() {
            out.push(alert.0);
        }
        out
    }

    fn run_event(block: u64, who: Address) -> DecodedEvent {
        DecodedEvent {
            kind: EventKind::AgentRun,
            tx_hash: H256::from_low_u64_be(block),
            block_number: block,
            args: vec![("agent".to_string(), Token::Address(who))],
        }
    }

    #[tokio::test]
    async fn test_load_agent_state() {
        let vault = mock().await;
        let (dash, _rx) = dashboard(vault);

        assert!(dash.load_agent_state().await);
        let state = dash.snapshot().await;
        assert_eq!(state.remaining_budget, U256::from(ETH / 2));
        assert_eq!(state.user_balance, U256::from(2 * ETH));
        assert_eq!(state.vault_balance, U256::from(ETH / 100));
        assert!(state.cooldown.active);
        assert!(state.cooldown.remaining_secs <= 30);
        assert!(state.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state_and_releases_guard() {
        let vault = mock().await;
        vault.state.lock().await.agents.clear();
        let (dash, _rx) = dashboard(vault.clone());

        assert!(dash.load_agent_state().await);
        assert_eq!(dash.snapshot().await.remaining_budget, U256::zero());
        // Guard released: a second load runs
        assert!(dash.load_agent_state().await);
        assert_eq!(vault.agent_info_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_overlapping_loads_are_skipped() {
        let vault = MockVault::new(vault_addr(), user()).with_read_delay(Duration::from_millis(100));
        vault.state.lock().await.agents.insert(
            agent(),
            AgentInfo {
                name: "AI-Agent".to_string(),
                remaining_budget: U256::one(),
                next_allowed_tx_time: 0,
                active: true,
            },
        );
        let vault = Arc::new(vault);
        let (dash, _rx) = dashboard(vault.clone());

        let (first, second) = tokio::join!(dash.load_agent_state(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            dash.load_agent_state().await
        });

        assert!(first);
        assert!(!second);
        assert_eq!(vault.agent_info_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_transactions_tolerates_missing_run_events() {
        let vault = mock().await;
        {
            let mut state = vault.state.lock().await;
            state.events.insert(
                EventKind::AgentConfigured,
                vec![DecodedEvent {
                    kind: EventKind::AgentConfigured,
                    tx_hash: H256::from_low_u64_be(1),
                    block_number: 4,
                    args: vec![("agent".to_string(), Token::Address(agent()))],
                }],
            );
            state.events.insert(EventKind::AgentRun, vec![run_event(9, agent())]);
            state.failing_events.insert(EventKind::AgentRun);
        }
        let (dash, _rx) = dashboard(vault.clone());

        assert!(dash.fetch_transactions().await);
        let history = dash.snapshot().await.recent_tx;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, EventKind::AgentConfigured);

        vault.state.lock().await.failing_events.clear();
        dash.fetch_transactions().await;
        let history = dash.snapshot().await.recent_tx;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].block_number, 9);
    }

    #[tokio::test]
    async fn test_failed_configured_fetch_keeps_previous_history() {
        let vault = mock().await;
        vault
            .state
            .lock()
            .await
            .events
            .insert(EventKind::AgentRun, vec![run_event(3, agent()), run_event(2, user())]);
        let (dash, _rx) = dashboard(vault.clone());

        dash.fetch_transactions().await;
        assert_eq!(dash.snapshot().await.recent_tx.len(), 1);

        vault
            .state
            .lock()
            .await
            .failing_events
            .insert(EventKind::AgentConfigured);
        dash.fetch_transactions().await;
        assert_eq!(dash.snapshot().await.recent_tx.len(), 1);
    }

    #[tokio::test]
    async fn test_fund_agent() {
        let vault = mock().await;
        let (dash, mut rx) = dashboard(vault.clone());

        assert_err!(dash.fund_agent().await);
        assert_eq!(drain(&mut rx), vec!["Enter amount"]);

        dash.set_fund_amount("0.25").await;
        dash.fund_agent().await.unwrap();
        assert_eq!(drain(&mut rx), vec!["Success!"]);
        assert!(dash.snapshot().await.fund_amount.is_empty());

        let funded = vault.state.lock().await.funded.clone();
        assert_eq!(funded, vec![(U256::from(ETH / 4), 300_000)]);
    }

    #[tokio::test]
    async fn test_fund_failure_keeps_input() {
        let vault = mock().await;
        vault.state.lock().await.fail_next_tx = Some("insufficient funds".to_string());
        let (dash, mut rx) = dashboard(vault);

        dash.set_fund_amount("1").await;
        assert_err!(dash.fund_agent().await);
        assert_eq!(
            drain(&mut rx),
            vec!["Transaction send failed: insufficient funds"]
        );
        assert_eq!(dash.snapshot().await.fund_amount, "1");
    }

    #[tokio::test]
    async fn test_set_max_amount() {
        let vault = mock().await;
        let (dash, _rx) = dashboard(vault);

        assert_eq!(dash.set_max_amount().await, "0.0000");
        dash.load_agent_state().await;
        assert_eq!(dash.set_max_amount().await, "1.9990");
        assert_eq!(dash.snapshot().await.fund_amount, "1.9990");
    }

    #[tokio::test]
    async fn test_toggle_pause() {
        let vault = mock().await;
        let (dash, mut rx) = dashboard(vault.clone());

        assert!(dash.toggle_pause().await.unwrap());
        assert!(vault.state.lock().await.paused);
        assert_eq!(dash.snapshot().await.system_label(), "PAUSED");

        vault.state.lock().await.fail_next_tx = Some("not owner".to_string());
        assert_err!(dash.toggle_pause().await);
        assert!(dash.snapshot().await.paused);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_set_daily_limit() {
        let vault = mock().await;
        let (dash, mut rx) = dashboard(vault.clone());

        dash.set_new_limit("0.75").await;
        dash.set_daily_limit().await.unwrap();
        assert_eq!(drain(&mut rx), vec!["Limit Updated!"]);
        assert!(dash.snapshot().await.new_limit.is_empty());

        let configured = vault.state.lock().await.configured.clone();
        assert_eq!(
            configured,
            vec![(agent(), "AI-Agent".to_string(), U256::from(3 * ETH / 4), 60)]
        );
    }

    #[tokio::test]
    async fn test_add_merchant() {
        let vault = mock().await;
        let (dash, mut rx) = dashboard(vault.clone());

        dash.open_add_merchant().await;
        dash.set_merchant_form(MerchantForm::new("Stripe", "", "10")).await;
        assert_err!(dash.add_merchant().await);
        assert_eq!(drain(&mut rx), vec!["Fill all fields"]);

        let wallet = "0xac9701e15726c9e7517007740ea722b194597e14";
        dash.set_merchant_form(MerchantForm::new("Stripe", wallet, "10")).await;
        let id = dash.add_merchant().await.unwrap();
        assert_eq!(drain(&mut rx), vec!["Transaction Pending...", "Success!"]);

        let state = dash.snapshot().await;
        assert_eq!(state.modal, None);
        assert_eq!(state.new_merchant, MerchantForm::default());

        let merchants = dash.merchants().await;
        assert_eq!(merchants.len(), 3);
        assert_eq!(merchants[2].id, id);
        assert_eq!(vault.state.lock().await.merchants_added.len(), 1);
    }

    #[tokio::test]
    async fn test_add_merchant_failure_leaves_list() {
        let vault = mock().await;
        let (dash, mut rx) = dashboard(vault.clone());

        dash.set_merchant_form(MerchantForm::new("Bad", "0xAWS", "1")).await;
        assert_err!(dash.add_merchant().await);
        let alerts = drain(&mut rx);
        assert_eq!(alerts[0], "Transaction Pending...");
        assert!(alerts[1].starts_with("Invalid address"));
        assert_eq!(dash.merchants().await.len(), 2);
        assert!(vault.state.lock().await.merchants_added.is_empty());
    }

    #[tokio::test]
    async fn test_add_merchant_unsaved_list_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("sub");
        let book = MerchantBook::load(&data_dir).unwrap();
        std::fs::write(&data_dir, b"").unwrap();

        let vault = mock().await;
        let (dash, mut rx) = Dashboard::new(vault.clone(), Some(user()), settings(), book);

        dash.open_add_merchant().await;
        let wallet = "0xac9701e15726c9e7517007740ea722b194597e14";
        dash.set_merchant_form(MerchantForm::new("Stripe", wallet, "10")).await;
        let id = dash.add_merchant().await.unwrap();

        let alerts = drain(&mut rx);
        assert_eq!(alerts.first().unwrap(), "Transaction Pending...");
        assert!(alerts[1].starts_with("Merchant whitelisted, but the local list was not saved"));
        assert_eq!(alerts.last().unwrap(), "Success!");

        let state = dash.snapshot().await;
        assert_eq!(state.modal, None);
        assert_eq!(state.new_merchant, MerchantForm::default());
        assert_eq!(dash.merchants().await.len(), 3);
        assert_eq!(dash.merchants().await[2].id, id);
        assert_eq!(vault.state.lock().await.merchants_added.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_merchant_unsaved_keeps_list() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("sub");
        let book = MerchantBook::load(&data_dir).unwrap();
        std::fs::write(&data_dir, b"").unwrap();

        let (dash, mut rx) = Dashboard::new(mock().await, Some(user()), settings(), book);

        dash.select_merchant_for_removal(2).await;
        assert_err!(dash.remove_merchant().await);
        assert_eq!(drain(&mut rx).len(), 1);
        assert_eq!(dash.merchants().await.len(), 2);
        assert_eq!(dash.snapshot().await.modal, None);
    }

    #[tokio::test]
    async fn test_remove_merchant_is_local() {
        let vault = mock().await;
        let (dash, _rx) = dashboard(vault.clone());

        dash.select_merchant_for_removal(2).await;
        assert_eq!(dash.snapshot().await.modal, Some(Modal::RemoveMerchant));

        let removed = dash.remove_merchant().await.unwrap().unwrap();
        assert_eq!(removed.name, "Uber");
        assert_eq!(dash.merchants().await.len(), 1);
        assert_eq!(dash.snapshot().await.modal, None);
        assert!(dash.remove_merchant().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_only_dashboard_skips_user_balance() {
        let vault = mock().await;
        let (dash, _rx) = Dashboard::new(vault, None, settings(), MerchantBook::seeded());
        dash.load_agent_state().await;
        let state = dash.snapshot().await;
        assert_eq!(state.user_balance, U256::zero());
        assert_eq!(state.vault_balance, U256::from(ETH / 100));
    }
}
