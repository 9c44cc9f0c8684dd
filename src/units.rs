//! ETH/wei conversion and short display forms

use ethers::types::{Address, H256, U256};
use ethers::utils::{format_ether, parse_ether, to_checksum};

use crate::error::{Error, Result};

/// Parse a user-entered ETH amount into wei.
///
/// Empty input maps to the "Enter amount" prompt the dashboard shows.
pub fn parse_eth_amount(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingInput("Enter amount".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(Error::InvalidAmount(format!("{} is negative", trimmed)));
    }

    parse_ether(trimmed).map_err(|e| Error::InvalidAmount(format!("{}: {}", trimmed, e)))
}

/// Wei as ETH with trailing zeros removed ("0.5", "12", "0")
pub fn format_eth(wei: U256) -> String {
    let full = format_ether(wei);
    if !full.contains('.') {
        return full;
    }
    let trimmed = full.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Wei as ETH rounded to `decimals` places
pub fn format_eth_fixed(wei: U256, decimals: usize) -> String {
    format!("{:.*}", decimals, wei_to_eth(wei))
}

/// Lossy wei to ETH, for display and arithmetic on balances only
pub fn wei_to_eth(wei: U256) -> f64 {
    format_ether(wei).parse::<f64>().unwrap_or(0.0)
}

/// Largest amount that still leaves `reserve_eth` for gas, 4 decimals
pub fn max_fund_amount(balance_eth: f64, reserve_eth: f64) -> String {
    format!("{:.4}", (balance_eth - reserve_eth).max(0.0))
}

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = to_checksum(address, None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// `0x12345678...9abcdef0`
pub fn short_hash(hash: &H256) -> String {
    let full = format!("{:?}", hash);
    format!("{}...{}", &full[..10], &full[full.len() - 8..])
}
