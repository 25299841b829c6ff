//! Wallet Module
//!
//! Mnemonic validation, seed derivation, BIP-44 key walking and the
//! derivation facade consumed by the CLI and FFI adapters.
//!
//! Every request is all-or-nothing: an invalid mnemonic yields an empty
//! result, never a partial mapping.

mod derivation;
mod derivation_path;
pub mod mnemonic;
pub mod seed;

pub use derivation::*;
pub use derivation_path::*;
pub use mnemonic::{generate_mnemonic, mnemonic_from_entropy, parse_mnemonic, MnemonicError, ValidatedMnemonic};
pub use seed::derive_seed;

use bitcoin::secp256k1::{All, Secp256k1};

use crate::error::{WalletError, WalletResult};
use crate::types::*;
use crate::utils::DeriverConfig;

/// Validate a mnemonic phrase
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    mnemonic::validate_mnemonic(mnemonic)
}

/// Derive addresses for `chains` (no passphrase, external branch)
pub fn derive_addresses(
    mnemonic: &str,
    account: u32,
    address_index: u32,
    chains: &[Chain],
) -> WalletResult<AddressMap> {
    Bip44Deriver::new().derive_addresses(mnemonic, account, address_index, chains)
}

/// Derive hex-encoded private keys for `chains` (no passphrase, external branch)
///
/// SECURITY: never log or persist the result.
pub fn derive_private_keys(
    mnemonic: &str,
    account: u32,
    address_index: u32,
    chains: &[Chain],
) -> WalletResult<PrivateKeys> {
    Bip44Deriver::new().derive_private_keys(mnemonic, account, address_index, chains)
}

/// Derivation capability shared by every front-end
pub trait WalletDeriver: Send + Sync {
    /// BIP-39 wordlist and checksum check
    fn validate(&self, mnemonic: &str) -> bool;

    /// Chain-tagged addresses; empty when the mnemonic is invalid
    fn derive_addresses(
        &self,
        mnemonic: &str,
        account: u32,
        address_index: u32,
        chains: &[Chain],
    ) -> WalletResult<AddressMap>;

    /// Hex private keys; empty when the mnemonic is invalid
    fn derive_private_keys(
        &self,
        mnemonic: &str,
        account: u32,
        address_index: u32,
        chains: &[Chain],
    ) -> WalletResult<PrivateKeys>;
}

/// BIP-44 deriver over the four supported chains
#[derive(Clone)]
pub struct Bip44Deriver {
    secp: Secp256k1<All>,
    passphrase: String,
    change: u32,
}

impl Default for Bip44Deriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bip44Deriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bip44Deriver")
            .field("passphrase", &if self.passphrase.is_empty() { "" } else { "[REDACTED]" })
            .field("change", &self.change)
            .finish()
    }
}

impl Drop for Bip44Deriver {
    fn drop(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.passphrase);
    }
}

impl Bip44Deriver {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
            passphrase: String::new(),
            change: change::EXTERNAL,
        }
    }

    /// BIP-39 passphrase ("25th word")
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = passphrase.into();
        self
    }

    /// BIP-44 change branch: [`change::EXTERNAL`] or [`change::INTERNAL`]
    pub fn with_change(mut self, change: u32) -> Self {
        self.change = change;
        self
    }

    pub fn from_config(config: &DeriverConfig) -> Self {
        Self::new().with_passphrase(config.passphrase.as_str())
    }

    /// Addresses for the chains, account and index named by `config`
    pub fn derive_configured(&self, mnemonic: &str, config: &DeriverConfig) -> WalletResult<AddressMap> {
        config.validate()?;
        self.derive_addresses(mnemonic, config.account, config.address_index, &config.chains)
    }

    /// Like [`WalletDeriver::derive_addresses`] but reports why a mnemonic
    /// was rejected instead of returning an empty map
    pub fn try_derive_addresses(
        &self,
        mnemonic: &str,
        account: u32,
        address_index: u32,
        chains: &[Chain],
    ) -> WalletResult<AddressMap> {
        let leaves = self.leaves(mnemonic, account, address_index, chains)?;

        let mut addresses = AddressMap::new();
        for chain in chains {
            let leaf = leaves
                .get(*chain)
                .ok_or_else(|| crate::error::WalletError::internal(format!("No leaf key for {}", chain)))?;
            let address = (chain_spec(*chain).encoder)(&leaf.public_key(&self.secp));
            addresses.insert(*chain, ChainAddress::derived(*chain, address));
        }

        crate::log_info!(
            "wallet",
            "Derived addresses",
            chains = addresses.len(),
            account = account,
            index = address_index,
        );
        Ok(addresses)
    }

    /// Like [`WalletDeriver::derive_private_keys`] but reports why a
    /// mnemonic was rejected
    pub fn try_derive_private_keys(
        &self,
        mnemonic: &str,
        account: u32,
        address_index: u32,
        chains: &[Chain],
    ) -> WalletResult<PrivateKeys> {
        let leaves = self.leaves(mnemonic, account, address_index, chains)?;

        let mut keys = PrivateKeys::new();
        for chain in chains {
            let leaf = leaves
                .get(*chain)
                .ok_or_else(|| crate::error::WalletError::internal(format!("No leaf key for {}", chain)))?;
            keys.insert(*chain, hex::encode(&leaf.private_key_bytes()[..]));
        }

        crate::log_info!("wallet", "Derived private keys", chains = keys.len());
        Ok(keys)
    }

    fn leaves(&self, mnemonic: &str, account: u32, address_index: u32, chains: &[Chain]) -> WalletResult<LeafKeys> {
        if chains.is_empty() {
            return Err(WalletError::invalid_input("At least one chain must be selected"));
        }
        if self.change != change::EXTERNAL && self.change != change::INTERNAL {
            return Err(WalletError::invalid_path(format!(
                "Change branch must be {} or {}, got {}",
                change::EXTERNAL,
                change::INTERNAL,
                self.change
            )));
        }

        let validated = parse_mnemonic(mnemonic)?;

        crate::log_debug!(
            "wallet",
            "Deriving keys",
            words = validated.word_count(),
            chains = chains.len(),
            account = account,
            index = address_index,
        );

        let seed = derive_seed(validated.phrase(), &self.passphrase);
        LeafKeys::derive(&self.secp, seed.as_ref(), chains, account, self.change, address_index)
    }
}

impl WalletDeriver for Bip44Deriver {
    fn validate(&self, mnemonic: &str) -> bool {
        validate_mnemonic(mnemonic)
    }

    fn derive_addresses(
        &self,
        mnemonic: &str,
        account: u32,
        address_index: u32,
        chains: &[Chain],
    ) -> WalletResult<AddressMap> {
        match self.try_derive_addresses(mnemonic, account, address_index, chains) {
            Err(e) if e.code == crate::error::ErrorCode::InvalidMnemonic => {
                crate::log_warn!("wallet", "Rejected mnemonic", reason = e.message);
                Ok(AddressMap::new())
            }
            other => other,
        }
    }

    fn derive_private_keys(
        &self,
        mnemonic: &str,
        account: u32,
        address_index: u32,
        chains: &[Chain],
    ) -> WalletResult<PrivateKeys> {
        match self.try_derive_private_keys(mnemonic, account, address_index, chains) {
            Err(e) if e.code == crate::error::ErrorCode::InvalidMnemonic => {
                crate::log_warn!("wallet", "Rejected mnemonic", reason = e.message);
                Ok(PrivateKeys::new())
            }
            other => other,
        }
    }
}
