//! In-memory vault contract for tests

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::client::{AgentInfo, VaultContract};
use super::events::{DecodedEvent, EventKind};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct MockState {
    pub agents: HashMap<Address, AgentInfo>,
    pub paused: bool,
    pub balances: HashMap<Address, U256>,
    pub whitelist: HashSet<Address>,
    pub events: HashMap<EventKind, Vec<DecodedEvent>>,
    /// Event kinds whose log query fails
    pub failing_events: HashSet<EventKind>,
    /// Next transaction fails with this message
    pub fail_next_tx: Option<String>,
    pub funded: Vec<(U256, u64)>,
    pub configured: Vec<(Address, String, U256, u64)>,
    pub merchants_added: Vec<(Address, String)>,
}

pub struct MockVault {
    pub address: Address,
    pub sender: Address,
    pub state: Mutex<MockState>,
    /// Artificial latency for agent_info, to hold a load in flight
    pub read_delay: Option<Duration>,
    pub agent_info_calls: AtomicU64,
    pub event_queries: AtomicU64,
    next_tx: AtomicU64,
}

impl MockVault {
    pub fn new(address: Address, sender: Address) -> Self {
        Self {
            address,
            sender,
            state: Mutex::new(MockState::default()),
            read_delay: None,
            agent_info_calls: AtomicU64::new(0),
            event_queries: AtomicU64::new(0),
            next_tx: AtomicU64::new(1),
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    async fn transact(&self) -> Result<TxHash> {
        let mut state = self.state.lock().await;
        if let Some(message) = state.fail_next_tx.take() {
            return Err(Error::TransactionSend(message));
        }
        Ok(TxHash::from_low_u64_be(
            self.next_tx.fetch_add(1, Ordering::SeqCst),
        ))
    }
}

#[async_trait]
impl VaultContract for MockVault {
    fn address(&self) -> Address {
        self.address
    }

    async fn agent_info(&self, agent: Address) -> Result<AgentInfo> {
        self.agent_info_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .await
            .agents
            .get(&agent)
            .cloned()
            .ok_or_else(|| Error::ContractCall("execution reverted: unknown agent".to_string()))
    }

    async fn is_paused(&self) -> Result<bool> {
        Ok(self.state.lock().await.paused)
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        Ok(self
            .state
            .lock()
            .await
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    async fn is_whitelisted(&self, merchant: Address) -> Result<bool> {
        Ok(self.state.lock().await.whitelist.contains(&merchant))
    }

    async fn fund(&self, amount: U256, gas_limit: u64) -> Result<TxHash> {
        let hash = self.transact().await?;
        let mut state = self.state.lock().await;
        state.funded.push((amount, gas_limit));
        let vault = self.address;
        let sender = self.sender;
        *state.balances.entry(vault).or_default() += amount;
        let from = state.balances.entry(sender).or_default();
        *from = from.saturating_sub(amount);
        Ok(hash)
    }

    async fn toggle_pause(&self) -> Result<TxHash> {
        let hash = self.transact().await?;
        let mut state = self.state.lock().await;
        state.paused = !state.paused;
        Ok(hash)
    }

    async fn configure_agent(
        &self,
        agent: Address,
        name: &str,
        daily_limit: U256,
        cooldown_secs: u64,
    ) -> Result<TxHash> {
        let hash = self.transact().await?;
        let mut state = self.state.lock().await;
        state
            .configured
            .push((agent, name.to_string(), daily_limit, cooldown_secs));
        state.agents.insert(
            agent,
            AgentInfo {
                name: name.to_string(),
                remaining_budget: daily_limit,
                next_allowed_tx_time: 0,
                active: true,
            },
        );
        Ok(hash)
    }

    async fn add_merchant(&self, merchant: Address, label: &str) -> Result<TxHash> {
        let hash = self.transact().await?;
        let mut state = self.state.lock().await;
        state.merchants_added.push((merchant, label.to_string()));
        state.whitelist.insert(merchant);
        Ok(hash)
    }

    async fn past_events(&self, kind: EventKind) -> Result<Vec<DecodedEvent>> {
        self.event_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if state.failing_events.contains(&kind) {
            return Err(Error::Rpc(format!("{} logs unavailable", kind)));
        }
        Ok(state.events.get(&kind).cloned().unwrap_or_default())
    }
}
