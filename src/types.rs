//! Shared types for the derivation core
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization and FFI compatibility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::wallet::coin_types;

// =============================================================================
// Chain Types
// =============================================================================

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "BTC")]
    Bitcoin,
    #[serde(rename = "ETH")]
    Ethereum,
    #[serde(rename = "BSC")]
    Bsc,
    #[serde(rename = "TRX")]
    Tron,
}

impl Chain {
    /// Every chain the core derives, in request order
    pub const ALL: [Chain; 4] = [Chain::Bitcoin, Chain::Ethereum, Chain::Bsc, Chain::Tron];

    pub fn is_evm(&self) -> bool {
        matches!(self, Chain::Ethereum | Chain::Bsc)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Bitcoin => "BTC",
            Chain::Ethereum => "ETH",
            Chain::Bsc => "BSC",
            Chain::Tron => "TRX",
        }
    }

    /// SLIP-0044 coin type used in the BIP-44 path
    pub fn coin_type(&self) -> u32 {
        match self {
            Chain::Bitcoin => coin_types::BITCOIN,
            Chain::Ethereum | Chain::Bsc => coin_types::ETHEREUM,
            Chain::Tron => coin_types::TRON,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Chain {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "bitcoin" | "btc" => Ok(Chain::Bitcoin),
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            "bsc" | "bnb" | "binance" | "bnb_smart_chain" => Ok(Chain::Bsc),
            "tron" | "trx" => Ok(Chain::Tron),
            _ => Err(WalletError::unsupported_chain(s.trim())),
        }
    }
}

/// Parse a comma separated chain list such as `"BTC,ETH"`
pub fn parse_chain_list(list: &str) -> Result<Vec<Chain>, WalletError> {
    let mut chains = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let chain: Chain = part.parse()?;
        if !chains.contains(&chain) {
            chains.push(chain);
        }
    }
    Ok(chains)
}

// =============================================================================
// Derivation Results
// =============================================================================

/// How an address was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    /// Encoded with the chain's own rules
    Derived,
    /// Reused from another chain's encoding; not spendable on this chain
    Degraded,
}

/// A chain-tagged address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAddress {
    pub chain: Chain,
    pub address: String,
    pub status: AddressStatus,
}

impl ChainAddress {
    pub fn derived(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            status: AddressStatus::Derived,
        }
    }

    pub fn degraded(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            status: AddressStatus::Degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == AddressStatus::Degraded
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Addresses for one (mnemonic, account, index) request.
/// Empty when the mnemonic failed validation.
pub type AddressMap = BTreeMap<Chain, ChainAddress>;

/// Hex-encoded raw private keys for one request.
///
/// SECURITY: never log or persist. `Debug` output is redacted and the
/// key strings are zeroized on drop.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PrivateKeys {
    keys: BTreeMap<Chain, String>,
}

impl PrivateKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, chain: Chain, private_hex: String) {
        if let Some(mut previous) = self.keys.insert(chain, private_hex) {
            previous.zeroize();
        }
    }

    pub fn get(&self, chain: Chain) -> Option<&str> {
        self.keys.get(&chain).map(String::as_str)
    }

    pub fn chains(&self) -> impl Iterator<Item = Chain> + '_ {
        self.keys.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Chain, &str)> + '_ {
        self.keys.iter().map(|(chain, key)| (*chain, key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for PrivateKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.keys.keys().map(|chain| (chain, "[REDACTED]")))
            .finish()
    }
}

impl Drop for PrivateKeys {
    fn drop(&mut self) {
        for key in self.keys.values_mut() {
            key.zeroize();
        }
    }
}

// =============================================================================
// FFI Response Types
// =============================================================================

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<crate::error::WalletError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: crate::error::WalletError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_chain_properties() {
        assert!(Chain::Ethereum.is_evm());
        assert!(Chain::Bsc.is_evm());
        assert!(!Chain::Tron.is_evm());
        assert_eq!(Chain::Bitcoin.coin_type(), 0);
        assert_eq!(Chain::Bsc.coin_type(), 60);
        assert_eq!(Chain::Tron.coin_type(), 195);
    }

    #[test]
    fn test_chain_from_str() {
        assert_eq!("btc".parse::<Chain>().unwrap(), Chain::Bitcoin);
        assert_eq!("BNB".parse::<Chain>().unwrap(), Chain::Bsc);
        assert_eq!(" Tron ".parse::<Chain>().unwrap(), Chain::Tron);

        let err = "doge".parse::<Chain>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedChain);
    }

    #[test]
    fn test_parse_chain_list_dedupes() {
        let chains = parse_chain_list("BTC, eth,BTC,,trx").unwrap();
        assert_eq!(chains, vec![Chain::Bitcoin, Chain::Ethereum, Chain::Tron]);
        assert!(parse_chain_list("BTC,SOL").is_err());
    }

    #[test]
    fn test_address_map_serializes_with_symbols() {
        let mut map = AddressMap::new();
        map.insert(Chain::Tron, ChainAddress::derived(Chain::Tron, "T123"));
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains(r#""TRX""#));
        assert!(json.contains(r#""derived""#));
    }

    #[test]
    fn test_private_keys_debug_is_redacted() {
        let mut keys = PrivateKeys::new();
        keys.insert(Chain::Bitcoin, "e284129cc0922579a535bbf4d1a3b25773090d28c909bc0fed73b5e0222cc372".into());
        let debug = format!("{:?}", keys);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("e284129c"));
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::ok("test_data".to_string());
        let json = response.to_json();
        assert!(json.contains("success"));
        assert!(json.contains("test_data"));
    }
}
