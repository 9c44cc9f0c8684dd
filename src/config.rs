//! Configuration loading and validation

use anyhow::{Context, Result};
use ethers::types::Address;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    pub contract: ContractConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub system_status: SystemStatusConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployed vault contract
    #[serde(default = "default_contract_address")]
    pub address: String,
    /// Agent whose budget and history the dashboard tracks
    #[serde(default = "default_agent_address")]
    pub agent_address: String,
    /// Name passed to configureAgent when the limit changes
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Cooldown passed to configureAgent when the limit changes
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Daily limit used by `setup`
    #[serde(default = "default_initial_daily_limit_eth")]
    pub initial_daily_limit_eth: f64,
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Human-readable ABI declarations of the contract events
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_agent_configured_event")]
    pub agent_configured: String,
    #[serde(default = "default_agent_run_event")]
    pub agent_run: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            agent_configured: default_agent_configured_event(),
            agent_run: default_agent_run_event(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Agent state + history refresh
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Cooldown countdown refresh
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Records shown before "show more"
    #[serde(default = "default_history_preview")]
    pub history_preview: usize,
    #[serde(default = "default_fund_gas_limit")]
    pub fund_gas_limit: u64,
    /// Left in the wallet by "max" so the funding tx can pay gas
    #[serde(default = "default_balance_reserve_eth")]
    pub balance_reserve_eth: f64,
    #[serde(default = "default_high_load_pct")]
    pub high_load_pct: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            history_preview: default_history_preview(),
            fund_gas_limit: default_fund_gas_limit(),
            balance_reserve_eth: default_balance_reserve_eth(),
            high_load_pct: default_high_load_pct(),
        }
    }
}

/// Local agent runtime status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SystemStatusConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_status_url")]
    pub url: String,
    #[serde(default = "default_status_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_status_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SystemStatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_status_url(),
            poll_interval_ms: default_status_poll_interval_ms(),
            timeout_ms: default_status_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Session marker and merchant list live here
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Encrypted JSON keystore; KEYSTORE_PATH overrides
    #[serde(default)]
    pub keystore_path: Option<String>,
    /// Ask before sending any transaction
    #[serde(default = "default_true")]
    pub confirm_transactions: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            keystore_path: None,
            confirm_transactions: true,
        }
    }
}

impl WalletConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    "https://ethereum-sepolia-rpc.publicnode.com".to_string()
}

fn default_chain_id() -> u64 {
    11_155_111
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_contract_address() -> String {
    "0xA2a438cA74A1F271D2Dc5158b7C6c1177403B43e".to_string()
}

fn default_agent_address() -> String {
    "0xdfb6fEd8Fc66614D19D21Bd6d720a7f39Ef32501".to_string()
}

fn default_agent_name() -> String {
    "AI-Agent".to_string()
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_initial_daily_limit_eth() -> f64 {
    0.5
}

fn default_explorer_tx_url() -> String {
    "https://sepolia.etherscan.io/tx/".to_string()
}

fn default_agent_configured_event() -> String {
    "event AgentConfigured(address indexed agent, string name, uint256 dailyLimit, uint256 cooldown)"
        .to_string()
}

fn default_agent_run_event() -> String {
    "event AgentRun(address indexed agent, address indexed merchant, uint256 amount)".to_string()
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_history_preview() -> usize {
    3
}

fn default_fund_gas_limit() -> u64 {
    300_000
}

fn default_balance_reserve_eth() -> f64 {
    0.001
}

fn default_high_load_pct() -> u8 {
    90
}

fn default_status_url() -> String {
    "http://127.0.0.1:5001/status".to_string()
}

fn default_status_poll_interval_ms() -> u64 {
    2_000
}

fn default_status_timeout_ms() -> u64 {
    1_500
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.chain_id", default_chain_id() as i64)?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            .set_default("rpc.max_retries", default_max_retries() as i64)?
            .set_default("contract.address", default_contract_address())?
            .set_default("contract.agent_address", default_agent_address())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix ARTHA__)
            .add_source(
                config::Environment::with_prefix("ARTHA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        self.contract_address()?;
        self.agent_address()?;

        if self.rpc.chain_id == 0 {
            anyhow::bail!("rpc.chain_id must be non-zero");
        }

        url::Url::parse(&self.rpc.endpoint)
            .with_context(|| format!("Invalid rpc.endpoint: {}", self.rpc.endpoint))?;

        if self.contract.agent_name.trim().is_empty() {
            anyhow::bail!("contract.agent_name cannot be empty");
        }

        if self.contract.initial_daily_limit_eth <= 0.0 {
            anyhow::bail!("contract.initial_daily_limit_eth must be positive");
        }

        if self.dashboard.poll_interval_ms == 0 || self.dashboard.tick_interval_ms == 0 {
            anyhow::bail!("dashboard poll intervals must be non-zero");
        }

        if self.dashboard.history_preview == 0 {
            anyhow::bail!("dashboard.history_preview must be at least 1");
        }

        if self.dashboard.balance_reserve_eth < 0.0 {
            anyhow::bail!("dashboard.balance_reserve_eth cannot be negative");
        }

        if self.dashboard.high_load_pct > 100 {
            anyhow::bail!("dashboard.high_load_pct cannot exceed 100");
        }

        if self.system_status.enabled {
            if self.system_status.poll_interval_ms == 0 {
                anyhow::bail!("system_status.poll_interval_ms must be non-zero");
            }
            url::Url::parse(&self.system_status.url)
                .with_context(|| format!("Invalid system_status.url: {}", self.system_status.url))?;
        }

        // Event declarations must parse and carry the agent argument
        crate::contract::events::EventSet::from_config(&self.contract.events)
            .context("Invalid contract.events")?;

        Ok(())
    }

    /// Parsed vault contract address
    pub fn contract_address(&self) -> Result<Address> {
        Address::from_str(&self.contract.address)
            .with_context(|| format!("Invalid contract.address: {}", self.contract.address))
    }

    /// Parsed agent address
    pub fn agent_address(&self) -> Result<Address> {
        Address::from_str(&self.contract.agent_address)
            .with_context(|| format!("Invalid contract.agent_address: {}", self.contract.agent_address))
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    chain_id: {}
    timeout: {}ms
    max_retries: {}
  Contract:
    address: {}
    agent: {} ({})
    cooldown: {}s
    explorer: {}
  Dashboard:
    poll_interval: {}ms
    history_preview: {}
    fund_gas_limit: {}
    balance_reserve: {} ETH
  System Status:
    enabled: {}
    url: {}
    poll_interval: {}ms
  Wallet:
    data_dir: {}
    keystore: {}
    private_key: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.chain_id,
            self.rpc.timeout_ms,
            self.rpc.max_retries,
            self.contract.address,
            self.contract.agent_address,
            self.contract.agent_name,
            self.contract.cooldown_secs,
            self.contract.explorer_tx_url,
            self.dashboard.poll_interval_ms,
            self.dashboard.history_preview,
            self.dashboard.fund_gas_limit,
            self.dashboard.balance_reserve_eth,
            self.system_status.enabled,
            self.system_status.url,
            self.system_status.poll_interval_ms,
            self.wallet.data_dir,
            self.wallet.keystore_path.as_deref().unwrap_or("(not set)"),
            if std::env::var(crate::wallet::PRIVATE_KEY_ENV).is_ok() {
                "***"
            } else {
                "(not set)"
            },
        )
    }
}

/// Mask URL for display (hide API keys in query params and path)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        return format!("{}?***", &url[..idx]);
    }

    // Infura/Alchemy style: project key as the last path segment
    match url::Url::parse(url) {
        Ok(parsed) => {
            let segments: Vec<&str> = parsed
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            match segments.last() {
                Some(last) if last.len() >= 16 => {
                    let mut masked = parsed.clone();
                    match masked.path_segments_mut() {
                        Ok(mut segments) => {
                            segments.pop_if_empty().pop();
                        }
                        Err(()) => return url.to_string(),
                    };
                    format!("{}/***", masked.as_str().trim_end_matches('/'))
                }
                _ => url.to_string(),
            }
        }
        Err(_) => url.to_string(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                endpoint: default_rpc_endpoint(),
                chain_id: default_chain_id(),
                timeout_ms: default_timeout_ms(),
                max_retries: default_max_retries(),
            },
            contract: ContractConfig {
                address: default_contract_address(),
                agent_address: default_agent_address(),
                agent_name: default_agent_name(),
                cooldown_secs: default_cooldown_secs(),
                initial_daily_limit_eth: default_initial_daily_limit_eth(),
                explorer_tx_url: default_explorer_tx_url(),
                events: EventsConfig::default(),
            },
            dashboard: DashboardConfig::default(),
            system_status: SystemStatusConfig::default(),
            wallet: WalletConfig::default(),
        }
    }
}
