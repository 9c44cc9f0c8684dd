//! Vault contract client
//!
//! Reads are retried with exponential backoff; transactions are sent once
//! and awaited until their receipt is available.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use ethers::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::bindings::AgentVault;
use super::events::{DecodedEvent, EventKind, EventSet};
use crate::error::{Error, Result};

/// Agent record as returned by `getAgentInfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
    pub name: String,
    pub remaining_budget: U256,
    /// Unix seconds before which the agent may not transact again
    pub next_allowed_tx_time: u64,
    pub active: bool,
}

/// Operations the dashboard performs against the vault contract
#[async_trait]
pub trait VaultContract: Send + Sync {
    /// Contract address (the vault)
    fn address(&self) -> Address;

    async fn agent_info(&self, agent: Address) -> Result<AgentInfo>;

    async fn is_paused(&self) -> Result<bool>;

    /// Native balance of any account
    async fn balance_of(&self, account: Address) -> Result<U256>;

    async fn is_whitelisted(&self, merchant: Address) -> Result<bool>;

    /// Send `amount` wei from the connected wallet to the vault
    async fn fund(&self, amount: U256, gas_limit: u64) -> Result<TxHash>;

    async fn toggle_pause(&self) -> Result<TxHash>;

    async fn configure_agent(
        &self,
        agent: Address,
        name: &str,
        daily_limit: U256,
        cooldown_secs: u64,
    ) -> Result<TxHash>;

    async fn add_merchant(&self, merchant: Address, label: &str) -> Result<TxHash>;

    /// All logs of `kind` from genesis to latest
    async fn past_events(&self, kind: EventKind) -> Result<Vec<DecodedEvent>>;
}

/// `ethers`-backed vault client
pub struct EthersVault<M> {
    client: Arc<M>,
    contract: AgentVault<M>,
    events: EventSet,
    max_retries: u32,
}

impl<M: Middleware + 'static> EthersVault<M> {
    pub fn new(client: Arc<M>, address: Address, events: EventSet, max_retries: u32) -> Self {
        let contract = AgentVault::new(address, client.clone());
        Self {
            client,
            contract,
            events,
            max_retries,
        }
    }

    /// Wait for a sent transaction and check its status
    async fn confirm(&self, pending: PendingTransaction<'_, M::Provider>) -> Result<TxHash> {
        let tx_hash = pending.tx_hash();
        info!("Sent! Waiting for confirmation... (hash: {:?})", tx_hash);

        let receipt = pending
            .await?
            .ok_or_else(|| Error::TransactionDropped(format!("{:?}", tx_hash)))?;

        if receipt.status != Some(U64::from(1)) {
            return Err(Error::TransactionReverted(format!("{:?}", tx_hash)));
        }

        info!(
            "Confirmed {:?} in block {:?}",
            tx_hash,
            receipt.block_number.map(|n| n.as_u64())
        );
        Ok(tx_hash)
    }

    async fn send_call(&self, call: ContractCall<M, ()>, what: &str) -> Result<TxHash> {
        debug!("Sending {}", what);
        let pending = call
            .send()
            .await
            .map_err(|e| Error::TransactionSend(format!("{}: {}", what, e)))?;
        self.confirm(pending).await
    }
}

#[async_trait]
impl<M: Middleware + 'static> VaultContract for EthersVault<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn agent_info(&self, agent: Address) -> Result<AgentInfo> {
        let (name, remaining_budget, next_allowed_tx_time, active) =
            with_retry(self.max_retries, || async {
                self.contract
                    .get_agent_info(agent)
                    .call()
                    .await
                    .map_err(Error::from)
            })
            .await?;

        Ok(AgentInfo {
            name,
            remaining_budget,
            next_allowed_tx_time: next_allowed_tx_time.low_u64(),
            active,
        })
    }

    async fn is_paused(&self) -> Result<bool> {
        with_retry(self.max_retries, || async {
            self.contract.is_paused().call().await.map_err(Error::from)
        })
        .await
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        with_retry(self.max_retries, || async {
            self.client
                .get_balance(account, None)
                .await
                .map_err(|e| Error::Rpc(format!("get_balance {:?}: {}", account, e)))
        })
        .await
    }

    async fn is_whitelisted(&self, merchant: Address) -> Result<bool> {
        with_retry(self.max_retries, || async {
            self.contract
                .whitelisted_merchants(merchant)
                .call()
                .await
                .map_err(Error::from)
        })
        .await
    }

    async fn fund(&self, amount: U256, gas_limit: u64) -> Result<TxHash> {
        let from = self
            .client
            .default_sender()
            .ok_or_else(|| Error::NoWallet("no signer attached to the provider".to_string()))?;

        let tx = TransactionRequest::new()
            .from(from)
            .to(self.address())
            .value(amount)
            .gas(gas_limit);

        debug!("Funding vault with {} wei from {:?}", amount, from);
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| Error::TransactionSend(format!("fund: {}", e)))?;
        self.confirm(pending).await
    }

    async fn toggle_pause(&self) -> Result<TxHash> {
        self.send_call(self.contract.toggle_pause(), "togglePause").await
    }

    async fn configure_agent(
        &self,
        agent: Address,
        name: &str,
        daily_limit: U256,
        cooldown_secs: u64,
    ) -> Result<TxHash> {
        let call = self.contract.configure_agent(
            agent,
            name.to_string(),
            daily_limit,
            U256::from(cooldown_secs),
        );
        self.send_call(call, "configureAgent").await
    }

    async fn add_merchant(&self, merchant: Address, label: &str) -> Result<TxHash> {
        let call = self.contract.add_merchant(merchant, label.to_string());
        self.send_call(call, "addMerchant").await
    }

    async fn past_events(&self, kind: EventKind) -> Result<Vec<DecodedEvent>> {
        let filter = Filter::new()
            .address(self.address())
            .topic0(self.events.topic(kind))
            .from_block(0u64)
            .to_block(BlockNumber::Latest);

        let logs = with_retry(self.max_retries, || async {
            self.client
                .get_logs(&filter)
                .await
                .map_err(|e| Error::Rpc(format!("get_logs {}: {}", kind, e)))
        })
        .await?;

        debug!("Fetched {} {} logs", logs.len(), kind);

        logs.iter()
            .map(|log| self.events.decode(kind, log))
            .collect()
    }
}

/// Retry a read while its error is transient, at most `max_retries` times
async fn with_retry<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(200),
        max_interval: Duration::from_secs(2),
        max_elapsed_time: Some(Duration::from_secs(15)),
        ..Default::default()
    };

    let mut attempt = 0u32;
    retry(policy, || {
        attempt += 1;
        let current = attempt;
        let fut = op();
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() && current <= max_retries => {
                    warn!("Retryable RPC error (attempt {}): {}", current, e);
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        }
    })
    .await
}
