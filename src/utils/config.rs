//! Deriver Configuration
//!
//! Defaults for derivation requests, overridable from the environment:
//! - `SEEDPATH_CHAINS`     comma separated chain list (default `BTC,ETH,BSC,TRX`)
//! - `SEEDPATH_ACCOUNT`    BIP-44 account (default 0)
//! - `SEEDPATH_INDEX`      address index (default 0)
//! - `SEEDPATH_PASSPHRASE` BIP-39 passphrase (default empty)
//! - `SEEDPATH_DEBUG`      `1`/`true` enables debug logging

use std::fmt;

use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};
use crate::types::{parse_chain_list, Chain};
use crate::wallet::HARDENED;

pub const ENV_CHAINS: &str = "SEEDPATH_CHAINS";
pub const ENV_ACCOUNT: &str = "SEEDPATH_ACCOUNT";
pub const ENV_INDEX: &str = "SEEDPATH_INDEX";
pub const ENV_PASSPHRASE: &str = "SEEDPATH_PASSPHRASE";
pub const ENV_DEBUG: &str = "SEEDPATH_DEBUG";

/// Settings for a derivation request
#[derive(Clone, PartialEq, Eq)]
pub struct DeriverConfig {
    /// Chains to derive, in output order
    pub chains: Vec<Chain>,
    /// BIP-44 account (hardened level)
    pub account: u32,
    /// BIP-44 address index (non-hardened level)
    pub address_index: u32,
    /// BIP-39 passphrase ("25th word"), erased on drop
    pub passphrase: Zeroizing<String>,
    /// Emit debug-level log lines
    pub debug_logging: bool,
}

impl Default for DeriverConfig {
    fn default() -> Self {
        Self {
            chains: Chain::ALL.to_vec(),
            account: 0,
            address_index: 0,
            passphrase: Zeroizing::new(String::new()),
            debug_logging: false,
        }
    }
}

impl fmt::Debug for DeriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriverConfig")
            .field("chains", &self.chains)
            .field("account", &self.account)
            .field("address_index", &self.address_index)
            .field("passphrase", &if self.passphrase.is_empty() { "" } else { "[REDACTED]" })
            .field("debug_logging", &self.debug_logging)
            .finish()
    }
}

impl DeriverConfig {
    /// Defaults overlaid with `SEEDPATH_*` environment variables
    pub fn from_env() -> WalletResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> WalletResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(list) = lookup(ENV_CHAINS) {
            config.chains = parse_chain_list(&list)?;
        }
        if let Some(value) = lookup(ENV_ACCOUNT) {
            config.account = parse_u32(ENV_ACCOUNT, &value)?;
        }
        if let Some(value) = lookup(ENV_INDEX) {
            config.address_index = parse_u32(ENV_INDEX, &value)?;
        }
        if let Some(passphrase) = lookup(ENV_PASSPHRASE) {
            config.passphrase = Zeroizing::new(passphrase);
        }
        if let Some(flag) = lookup(ENV_DEBUG) {
            config.debug_logging = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot form a BIP-44 path
    pub fn validate(&self) -> WalletResult<()> {
        if self.chains.is_empty() {
            return Err(WalletError::invalid_input("At least one chain must be selected"));
        }
        if self.account >= HARDENED {
            return Err(WalletError::invalid_input(format!(
                "Account {} exceeds maximum {}",
                self.account,
                HARDENED - 1
            )));
        }
        if self.address_index >= HARDENED {
            return Err(WalletError::invalid_input(format!(
                "Address index {} exceeds maximum {}",
                self.address_index,
                HARDENED - 1
            )));
        }
        Ok(())
    }
}

fn parse_u32(name: &str, value: &str) -> WalletResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|e| WalletError::invalid_input(format!("{} must be a non-negative integer: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeriverConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, DeriverConfig::default());
        assert_eq!(config.chains.len(), 4);
    }

    #[test]
    fn test_env_overrides() {
        let config = DeriverConfig::from_lookup(lookup_from(&[
            (ENV_CHAINS, "trx,btc"),
            (ENV_ACCOUNT, "2"),
            (ENV_INDEX, " 7 "),
            (ENV_DEBUG, "true"),
        ]))
        .unwrap();

        assert_eq!(config.chains, vec![Chain::Tron, Chain::Bitcoin]);
        assert_eq!(config.account, 2);
        assert_eq!(config.address_index, 7);
        assert!(config.debug_logging);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(DeriverConfig::from_lookup(lookup_from(&[(ENV_ACCOUNT, "-1")])).is_err());
        assert!(DeriverConfig::from_lookup(lookup_from(&[(ENV_INDEX, "2147483648")])).is_err());
        assert!(DeriverConfig::from_lookup(lookup_from(&[(ENV_CHAINS, "BTC,XMR")])).is_err());
        assert!(DeriverConfig::from_lookup(lookup_from(&[(ENV_CHAINS, " , ")])).is_err());
    }

    #[test]
    fn test_debug_hides_passphrase() {
        let config = DeriverConfig {
            passphrase: Zeroizing::new("TREZOR".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("TREZOR"));
    }

    #[test]
    fn test_passphrase_from_env_is_wrapped() {
        let config = DeriverConfig::from_lookup(lookup_from(&[(ENV_PASSPHRASE, "TREZOR")])).unwrap();
        assert_eq!(config.passphrase.as_str(), "TREZOR");
        assert_ne!(config, DeriverConfig::default());
    }
}
