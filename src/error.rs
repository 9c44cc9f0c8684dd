//! Error types for the vault dashboard

use ethers::providers::{Middleware, ProviderError};
use ethers::signers::WalletError;
use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vault dashboard
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Wallet errors
    #[error("No wallet detected: {0}")]
    NoWallet(String),

    #[error("Invalid signer: {0}")]
    InvalidSigner(String),

    #[error("Insecure keystore permissions: {0}")]
    InsecureKeystore(String),

    #[error("Wrong chain: expected {expected}, provider reports {actual}")]
    WrongChain { expected: u64, actual: u64 },

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    // Contract errors
    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Transaction send failed: {0}")]
    TransactionSend(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Transaction dropped before confirmation: {0}")]
    TransactionDropped(String),

    #[error("Event decode failed: {0}")]
    EventDecode(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    // User input errors
    #[error("{0}")]
    MissingInput(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Merchant list errors
    #[error("Merchant not found: {0}")]
    MerchantNotFound(u64),

    #[error("Merchant list persistence failed: {0}")]
    MerchantPersistence(String),

    // System status errors
    #[error("System status unavailable: {0}")]
    SystemStatus(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_) | Error::RpcConnection(_) | Error::SystemStatus(_)
        )
    }

    /// Check if this error was caused by missing or malformed user input
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::MissingInput(_) | Error::InvalidAmount(_) | Error::InvalidAddress(_)
        )
    }
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::HTTPError(inner) => Error::RpcConnection(inner.to_string()),
            other => Error::Rpc(other.to_string()),
        }
    }
}

impl<M: Middleware> From<ethers::contract::ContractError<M>> for Error {
    fn from(e: ethers::contract::ContractError<M>) -> Self {
        if e.is_revert() {
            Error::ContractCall(e.to_string())
        } else {
            Error::Rpc(e.to_string())
        }
    }
}

impl From<WalletError> for Error {
    fn from(e: WalletError) -> Self {
        Error::InvalidSigner(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::SystemStatus(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
