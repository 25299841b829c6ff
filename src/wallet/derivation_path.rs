//! Derivation Paths
//!
//! BIP-32 path parsing and formatting, plus the fixed BIP-44 layout
//! `m/44'/coin_type'/account'/change/address_index` used by every chain.

use std::fmt;
use std::str::FromStr;

use crate::error::{WalletError, WalletResult};

/// Standard BIP purposes
pub mod bip_purposes {
    pub const BIP44: u32 = 44;
}

/// Coin types from SLIP-0044
pub mod coin_types {
    pub const BITCOIN: u32 = 0;
    pub const ETHEREUM: u32 = 60;
    pub const TRON: u32 = 195;
}

/// BIP-44 change branch
pub mod change {
    pub const EXTERNAL: u32 = 0;
    pub const INTERNAL: u32 = 1;
}

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x80000000;

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    pub fn hardened(index: u32) -> Self {
        Self::new(index, true)
    }

    pub fn normal(index: u32) -> Self {
        Self::new(index, false)
    }

    /// Get the full index including hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Parsed derivation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    components: Vec<DerivationComponent>,
}

impl DerivationPath {
    pub fn new(components: Vec<DerivationComponent>) -> Self {
        Self { components }
    }

    /// `m/44'/coin_type'/account'/change/address_index`
    pub fn bip44(coin_type: u32, account: u32, change: u32, address_index: u32) -> Self {
        Self::new(vec![
            DerivationComponent::hardened(bip_purposes::BIP44),
            DerivationComponent::hardened(coin_type),
            DerivationComponent::hardened(account),
            DerivationComponent::normal(change),
            DerivationComponent::normal(address_index),
        ])
    }

    pub fn components(&self) -> &[DerivationComponent] {
        &self.components
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn purpose(&self) -> Option<u32> {
        self.components.first().map(|c| c.index)
    }

    pub fn coin_type(&self) -> Option<u32> {
        self.components.get(1).map(|c| c.index)
    }

    pub fn account(&self) -> Option<u32> {
        self.components.get(2).map(|c| c.index)
    }

    pub fn change(&self) -> Option<u32> {
        self.components.get(3).map(|c| c.index)
    }

    pub fn address_index(&self) -> Option<u32> {
        self.components.get(4).map(|c| c.index)
    }

    /// True when the path has the BIP-44 shape: five levels, the first
    /// three hardened and the last two not
    pub fn is_bip44(&self) -> bool {
        self.components.len() == 5
            && self.purpose() == Some(bip_purposes::BIP44)
            && self.components[..3].iter().all(|c| c.hardened)
            && self.components[3..].iter().all(|c| !c.hardened)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

/// Parse a derivation path string such as `m/44'/0'/0'/0/0`
pub fn parse_path(path: &str) -> WalletResult<DerivationPath> {
    let trimmed = path.trim();

    if trimmed == "m" || trimmed == "M" {
        return Ok(DerivationPath::new(Vec::new()));
    }

    // Must start with m/
    if !trimmed.starts_with("m/") && !trimmed.starts_with("M/") {
        return Err(WalletError::invalid_path("Derivation path must start with 'm/'"));
    }

    let components = trimmed[2..]
        .split('/')
        .map(parse_component)
        .collect::<WalletResult<Vec<_>>>()?;

    Ok(DerivationPath::new(components))
}

/// Parse a single path component
fn parse_component(s: &str) -> WalletResult<DerivationComponent> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(WalletError::invalid_path("Empty path component"));
    }

    // Check for hardened indicator
    let (number_str, hardened) = if trimmed.ends_with('\'') || trimmed.ends_with('h') || trimmed.ends_with('H') {
        (&trimmed[..trimmed.len() - 1], true)
    } else {
        (trimmed, false)
    };

    let index: u32 = number_str
        .parse()
        .map_err(|e| WalletError::invalid_path(format!("Invalid path component '{}': {}", s, e)))?;

    // Check for overflow (excluding hardened bit)
    if index >= HARDENED {
        return Err(WalletError::invalid_path(format!(
            "Path component {} exceeds maximum value",
            index
        )));
    }

    Ok(DerivationComponent::new(index, hardened))
}
