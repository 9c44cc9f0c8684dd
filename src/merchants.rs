//! Locally tracked merchant allowances
//!
//! The contract only knows whether a merchant is whitelisted. Names and
//! per-merchant limits are bookkeeping kept next to the session marker in
//! `merchants.json`. Removing a merchant here does not touch the contract.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

const MERCHANTS_FILE: &str = "merchants.json";

/// A merchant allowance entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: u64,
    pub name: String,
    /// As entered; not required to be a valid address for seeded entries
    pub wallet: String,
    /// Limit in ETH, as entered
    pub limit: String,
}

/// Add-merchant form contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MerchantForm {
    pub name: String,
    pub wallet: String,
    pub limit: String,
}

impl MerchantForm {
    pub fn new(name: impl Into<String>, wallet: impl Into<String>, limit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wallet: wallet.into(),
            limit: limit.into(),
        }
    }

    /// All three fields filled in
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.wallet.trim().is_empty()
            && !self.limit.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MerchantFile {
    version: String,
    merchants: Vec<Merchant>,
}

/// Merchant list with optional file persistence
#[derive(Debug)]
pub struct MerchantBook {
    merchants: Vec<Merchant>,
    path: Option<PathBuf>,
}

impl MerchantBook {
    /// Starting list for a fresh install
    pub fn seeded() -> Self {
        Self {
            merchants: vec![
                Merchant {
                    id: 1,
                    name: "AWS".to_string(),
                    wallet: "0xAWS".to_string(),
                    limit: "200".to_string(),
                },
                Merchant {
                    id: 2,
                    name: "Uber".to_string(),
                    wallet: "0xUBER".to_string(),
                    limit: "50".to_string(),
                },
            ],
            path: None,
        }
    }

    /// Load from `<data_dir>/merchants.json`, seeding when absent
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(MERCHANTS_FILE);

        let mut book = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::MerchantPersistence(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let file: MerchantFile = serde_json::from_str(&content).map_err(|e| {
                Error::MerchantPersistence(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            info!("Loaded {} merchants", file.merchants.len());
            Self {
                merchants: file.merchants,
                path: None,
            }
        } else {
            warn!("{} not found, starting from the default list", MERCHANTS_FILE);
            Self::seeded()
        };

        book.path = Some(path);
        Ok(book)
    }

    pub fn list(&self) -> &[Merchant] {
        &self.merchants
    }

    pub fn get(&self, id: u64) -> Option<&Merchant> {
        self.merchants.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }

    /// Append a merchant from a completed form and persist the list.
    ///
    /// The list is unchanged if the save fails.
    pub fn add(&mut self, form: &MerchantForm) -> Result<u64> {
        let id = self.insert(form)?;
        if let Err(e) = self.save() {
            self.merchants.retain(|m| m.id != id);
            return Err(e);
        }
        Ok(id)
    }

    /// Append a merchant in memory only; call [`MerchantBook::save`] to persist
    pub fn insert(&mut self, form: &MerchantForm) -> Result<u64> {
        if !form.is_complete() {
            return Err(Error::MissingInput("Fill all fields".to_string()));
        }

        let id = self.next_id();
        self.merchants.push(Merchant {
            id,
            name: form.name.trim().to_string(),
            wallet: form.wallet.trim().to_string(),
            limit: form.limit.trim().to_string(),
        });

        info!("Added merchant {} ({})", form.name.trim(), id);
        Ok(id)
    }

    /// Remove by id and persist. The list is unchanged if the save fails.
    pub fn remove(&mut self, id: u64) -> Result<Merchant> {
        let idx = self
            .merchants
            .iter()
            .position(|m| m.id == id)
            .ok_or(Error::MerchantNotFound(id))?;

        let removed = self.merchants.remove(idx);
        if let Err(e) = self.save() {
            self.merchants.insert(idx, removed);
            return Err(e);
        }

        info!("Removed merchant {} ({})", removed.name, id);
        Ok(removed)
    }

    /// Millisecond timestamp, bumped past the highest id in use
    fn next_id(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let highest = self.merchants.iter().map(|m| m.id).max().unwrap_or(0);
        now.max(highest + 1)
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::MerchantPersistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let file = MerchantFile {
            version: "1.0".to_string(),
            merchants: self.merchants.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json).map_err(|e| {
            Error::MerchantPersistence(format!("Failed to write {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_seeded_list() {
        let book = MerchantBook::seeded();
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(1).unwrap().name, "AWS");
        assert_eq!(book.get(2).unwrap().limit, "50");
    }

    #[test]
    fn test_add_requires_all_fields() {
        let mut book = MerchantBook::seeded();
        let err = book
            .add(&MerchantForm::new("Stripe", "", "10"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Fill all fields");
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut book = MerchantBook::seeded();
        let a = book.add(&MerchantForm::new("A", "0x1", "1")).unwrap();
        let b = book.add(&MerchantForm::new("B", "0x2", "2")).unwrap();
        assert!(b > a);
        assert!(a > 2);
    }

    #[test]
    fn test_remove() {
        let mut book = MerchantBook::seeded();
        let removed = book.remove(1).unwrap();
        assert_eq!(removed.name, "AWS");
        assert!(book.get(1).is_none());
        assert!(matches!(book.remove(1), Err(Error::MerchantNotFound(1))));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();

        let mut book = MerchantBook::load(dir.path()).unwrap();
        assert_eq!(book.len(), 2);
        let id = book
            .add(&MerchantForm::new("Stripe", "0xac9701e15726c9e7517007740ea722b194597e14", "25"))
            .unwrap();
        book.remove(2).unwrap();

        let reloaded = MerchantBook::load(dir.path()).unwrap();
        let names: Vec<&str> = reloaded.list().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["AWS", "Stripe"]);
        assert_eq!(reloaded.get(id).unwrap().limit, "25");
    }

    #[test]
    fn test_failed_save_leaves_list_unchanged() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");

        let mut book = MerchantBook::load(&data_dir).unwrap();
        // A regular file where the data dir should be makes every save fail
        std::fs::write(&data_dir, b"").unwrap();

        let form = MerchantForm::new("Stripe", "0xac9701e15726c9e7517007740ea722b194597e14", "25");
        assert!(matches!(book.add(&form), Err(Error::MerchantPersistence(_))));
        assert_eq!(book.len(), 2);

        assert!(matches!(book.remove(1), Err(Error::MerchantPersistence(_))));
        assert_eq!(book.len(), 2);
        assert_eq!(book.list()[0].name, "AWS");
    }
}
