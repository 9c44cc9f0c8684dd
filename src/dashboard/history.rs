//! Transaction history built from contract event logs

use ethers::abi::Token;
use ethers::types::{Address, H256};
use ethers::utils::to_checksum;

use crate::contract::{DecodedEvent, EventKind};
use crate::units::{format_eth, short_hash};

/// One history row, derived 1:1 from a contract log
#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    pub hash: H256,
    pub kind: EventKind,
    pub label: &'static str,
    pub block_number: u64,
    pub args: Vec<(String, Token)>,
}

impl From<DecodedEvent> for TxRecord {
    fn from(event: DecodedEvent) -> Self {
        Self {
            hash: event.tx_hash,
            kind: event.kind,
            label: event.kind.label(),
            block_number: event.block_number,
            args: event.args,
        }
    }
}

impl TxRecord {
    pub fn badge(&self) -> &'static str {
        if self.kind.is_payment() {
            "Payment Successful"
        } else {
            "Agent Setup"
        }
    }

    pub fn explorer_url(&self, explorer_tx_url: &str) -> String {
        format!("{}{:?}", explorer_tx_url, self.hash)
    }

    pub fn short_hash(&self) -> String {
        short_hash(&self.hash)
    }

    /// Named arguments rendered for display; positional names are skipped
    pub fn display_args(&self) -> Vec<(String, String)> {
        self.args
            .iter()
            .filter(|(name, _)| !name.is_empty() && name.parse::<u64>().is_err())
            .map(|(name, value)| (name.clone(), format_arg(name, value)))
            .collect()
    }
}

/// Merge both event streams, keep the agent's rows, newest block first
pub fn build_history(
    configured: Vec<DecodedEvent>,
    runs: Vec<DecodedEvent>,
    agent: Address,
) -> Vec<TxRecord> {
    let mut records: Vec<TxRecord> = configured
        .into_iter()
        .chain(runs)
        .filter(|event| event.agent() == Some(agent))
        .map(TxRecord::from)
        .collect();

    records.sort_by(|a, b| b.block_number.cmp(&a.block_number));
    records
}

/// Uint arguments are wei amounts unless the name marks a count or time
fn is_plain_number(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["cooldown", "time", "timestamp", "nonce", "id", "count", "seconds"]
        .iter()
        .any(|marker| lower.ends_with(marker))
}

pub fn format_arg(name: &str, value: &Token) -> String {
    match value {
        Token::Uint(n) if is_plain_number(name) => n.to_string(),
        Token::Uint(n) => format!("{} ETH", format_eth(*n)),
        Token::Int(n) => n.to_string(),
        Token::Address(addr) => to_checksum(addr, None),
        Token::String(s) => s.clone(),
        Token::Bool(b) => b.to_string(),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => {
            format!("0x{}", ethers::utils::hex::encode(bytes))
        }
        other => other.to_string(),
    }
}

/// What the history panel shows for the current toggle state
#[derive(Debug, PartialEq)]
pub struct HistoryView<'a> {
    pub visible: &'a [TxRecord],
    pub hidden: usize,
    pub expanded: bool,
}

impl<'a> HistoryView<'a> {
    pub fn new(records: &'a [TxRecord], preview: usize, show_all: bool) -> Self {
        let visible = if show_all {
            records
        } else {
            &records[..records.len().min(preview)]
        };
        Self {
            visible,
            hidden: records.len() - visible.len(),
            expanded: show_all,
        }
    }

    /// Toggle caption, shown only when there is more than the preview
    pub fn toggle_label(&self, total: usize, preview: usize) -> Option<String> {
        if total <= preview {
            None
        } else if self.expanded {
            Some("Show Less".to_string())
        } else {
            Some(format!("Show More ({} more)", total - preview))
        }
    }
}
