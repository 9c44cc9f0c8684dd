//! Signer discovery and loading
//!
//! A raw private key in the environment wins over a keystore file.

use ethers::signers::{LocalWallet, Signer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::WalletConfig;
use crate::error::{Error, Result};

/// Hex private key
pub const PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";
/// Encrypted JSON keystore path
pub const KEYSTORE_PATH_ENV: &str = "KEYSTORE_PATH";
/// Keystore password
pub const KEYSTORE_PASSWORD_ENV: &str = "KEYSTORE_PASSWORD";

/// Where the signing key comes from
#[derive(Clone)]
pub enum SignerSource {
    PrivateKey(String),
    Keystore { path: PathBuf, password: Option<String> },
}

impl std::fmt::Debug for SignerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerSource::PrivateKey(_) => write!(f, "PrivateKey(***)"),
            SignerSource::Keystore { path, .. } => {
                write!(f, "Keystore({})", path.display())
            }
        }
    }
}

impl SignerSource {
    /// Find a signer in the environment, then in configuration
    pub fn detect(config: &WalletConfig) -> Option<Self> {
        if let Ok(key) = std::env::var(PRIVATE_KEY_ENV) {
            if !key.trim().is_empty() {
                return Some(SignerSource::PrivateKey(key.trim().to_string()));
            }
        }

        let path = std::env::var(KEYSTORE_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| config.keystore_path.clone())?;

        Some(SignerSource::Keystore {
            path: PathBuf::from(path),
            password: std::env::var(KEYSTORE_PASSWORD_ENV).ok(),
        })
    }

    /// Unlock the key and bind it to `chain_id`
    pub fn load(&self, chain_id: u64) -> Result<LocalWallet> {
        let wallet = match self {
            SignerSource::PrivateKey(key) => key
                .trim_start_matches("0x")
                .parse::<LocalWallet>()
                .map_err(|e| Error::InvalidSigner(format!("Bad private key: {}", e)))?,
            SignerSource::Keystore { path, password } => {
                check_permissions(path)?;
                let password = password.as_deref().ok_or_else(|| {
                    Error::MissingEnvVar(KEYSTORE_PASSWORD_ENV.to_string())
                })?;
                debug!("Decrypting keystore {}", path.display());
                LocalWallet::decrypt_keystore(path, password)?
            }
        };

        let wallet = wallet.with_chain_id(chain_id);
        info!("Loaded signer: {:?}", wallet.address());
        Ok(wallet)
    }
}

/// Refuse keystores readable by group or others
pub fn check_permissions(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        Error::InvalidSigner(format!("Cannot read keystore {}: {}", path.display(), e))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(Error::InsecureKeystore(format!(
                "Keystore {} has insecure permissions {:o}. Run 'chmod 600 {}'",
                path.display(),
                mode & 0o777,
                path.display()
            )));
        }
    }

    #[cfg(not(unix))]
    let _ = metadata;

    Ok(())
}
