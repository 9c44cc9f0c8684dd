//! Connected-session marker
//!
//! Remembers the last connected address between runs. Disconnecting clears it.

use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub address: Address,
    pub chain_id: u64,
    pub connected_at: DateTime<Utc>,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn save(&self, address: Address, chain_id: u64) -> Result<SessionMarker> {
        let marker = SessionMarker {
            address,
            chain_id,
            connected_at: Utc::now(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&marker)?)?;
        debug!("Saved session marker for {:?}", address);
        Ok(marker)
    }

    /// Last session, if any; an unreadable marker counts as none
    pub fn load(&self) -> Option<SessionMarker> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Remove the marker; returns whether one existed
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!("Session cleared");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
