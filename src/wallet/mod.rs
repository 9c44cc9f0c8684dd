//! Wallet connection
//!
//! The wallet is a local signer: a hex key from the environment or an
//! encrypted JSON keystore.
//!
//! # Architecture
//!
//! ```text
//! SignerSource → WalletConnector → Session { address, vault }
//!                      ↓
//!                 SessionStore (session.json)
//! ```

pub mod connector;
pub mod session;
pub mod signer;

pub use connector::{Session, SignerClient, WalletConnector};
pub use session::{SessionMarker, SessionStore};
pub use signer::{SignerSource, KEYSTORE_PASSWORD_ENV, KEYSTORE_PATH_ENV, PRIVATE_KEY_ENV};
