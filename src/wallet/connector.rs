//! Wallet connection
//!
//! Turns a signer source into a connected session: signer + JSON-RPC
//! provider + vault contract client, checked against the configured chain.

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::session::SessionStore;
use super::signer::SignerSource;
use crate::config::Config;
use crate::contract::{EthersVault, EventSet, VaultContract};
use crate::error::{Error, Result};

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// A connected wallet
#[derive(Clone)]
pub struct Session {
    pub address: Address,
    pub chain_id: u64,
    pub vault: Arc<dyn VaultContract>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("vault", &self.vault.address())
            .finish()
    }
}

pub struct WalletConnector<'a> {
    config: &'a Config,
    sessions: SessionStore,
}

impl<'a> WalletConnector<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            sessions: SessionStore::new(&config.wallet.data_dir()),
        }
    }

    /// Connect the configured wallet.
    ///
    /// `Err(Error::NoWallet)` when no signer is configured, `Ok(None)` when
    /// the key cannot be unlocked, other `Err`s when the provider is
    /// unreachable or on the wrong chain.
    pub async fn connect(&self) -> Result<Option<Session>> {
        let Some(source) = SignerSource::detect(&self.config.wallet) else {
            warn!("No wallet detected");
            return Err(Error::NoWallet(format!(
                "set {} or {}",
                super::PRIVATE_KEY_ENV,
                super::KEYSTORE_PATH_ENV
            )));
        };

        let signer = match source.load(self.config.rpc.chain_id) {
            Ok(signer) => signer,
            Err(e) => {
                error!("Account access denied or error occurred: {}", e);
                return Ok(None);
            }
        };

        let provider = self.provider()?;
        self.check_chain(&provider).await?;

        let address = signer.address();
        let client = Arc::new(SignerMiddleware::new(provider, signer));
        let vault = self.vault_for(client)?;

        self.sessions.save(address, self.config.rpc.chain_id)?;
        info!("Wallet connected: {:?}", address);

        Ok(Some(Session {
            address,
            chain_id: self.config.rpc.chain_id,
            vault,
        }))
    }

    /// Vault client without a signer, for read-only commands
    pub async fn read_only(&self) -> Result<Arc<dyn VaultContract>> {
        let provider = self.provider()?;
        self.check_chain(&provider).await?;
        self.vault_for(Arc::new(provider))
    }

    /// Forget the session
    pub fn disconnect(&self) -> Result<bool> {
        info!("Disconnecting wallet...");
        self.sessions.clear()
    }

    pub fn last_session(&self) -> Option<super::session::SessionMarker> {
        self.sessions.load()
    }

    fn provider(&self) -> Result<Provider<Http>> {
        let provider = Provider::<Http>::try_from(self.config.rpc.endpoint.as_str())
            .map_err(|e| Error::RpcConnection(format!("{}: {}", self.config.rpc.endpoint, e)))?;
        Ok(provider.interval(Duration::from_millis(2_000)))
    }

    async fn check_chain(&self, provider: &Provider<Http>) -> Result<()> {
        let timeout = Duration::from_millis(self.config.rpc.timeout_ms);
        let chain_id = tokio::time::timeout(timeout, provider.get_chainid())
            .await
            .map_err(|_| {
                Error::RpcConnection(format!(
                    "{} did not answer within {}ms",
                    self.config.rpc.endpoint, self.config.rpc.timeout_ms
                ))
            })??
            .as_u64();

        if chain_id != self.config.rpc.chain_id {
            return Err(Error::WrongChain {
                expected: self.config.rpc.chain_id,
                actual: chain_id,
            });
        }
        Ok(())
    }

    fn vault_for<M: Middleware + 'static>(&self, client: Arc<M>) -> Result<Arc<dyn VaultContract>> {
        let address = self
            .config
            .contract_address()
            .map_err(|e| Error::Config(e.to_string()))?;
        let events = EventSet::from_config(&self.config.contract.events)?;
        Ok(Arc::new(EthersVault::new(
            client,
            address,
            events,
            self.config.rpc.max_retries,
        )))
    }
}
