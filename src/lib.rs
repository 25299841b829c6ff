//! Seedpath Core Library
//!
//! Deterministic BIP-39 / BIP-32 / BIP-44 key and address derivation for
//! Bitcoin, Ethereum, BNB Smart Chain and Tron.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: mnemonic validation, seed derivation, the BIP-44 walker and
//!   the derivation facade (`derive_addresses`, `derive_private_keys`)
//! - **crypto**: BIP-32 extended keys over secp256k1
//! - **bitcoin_wallet / ethereum_wallet / tron_wallet**: address encoders
//! - **ffi**: C-ABI exports (JSON in, JSON out)
//! - **utils**: hashing helpers, structured logging, configuration
//!
//! The core is pure: no network, disk or global mutable state beyond the
//! logging switches.
//!
//! # FFI Usage
//!
//! All public FFI functions are in the `ffi` module and follow this pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `seedpath_free_string`)
//!
//! # Security
//!
//! Entropy, seeds, chain codes and private keys are zeroized when dropped.
//! Results of `derive_private_keys` must never be logged or persisted.
//!
//! # Example
//!
//! ```rust
//! use seedpath::{derive_addresses, Chain};
//!
//! let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
//! let addresses = derive_addresses(phrase, 0, 0, &Chain::ALL).unwrap();
//! assert_eq!(addresses[&Chain::Bitcoin].address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
//! ```

pub mod error;
pub mod types;
pub mod crypto;
pub mod wallet;
pub mod utils;
pub mod ffi;

pub mod bitcoin_wallet;
pub mod ethereum_wallet;
pub mod tron_wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, WalletError, WalletResult};
pub use types::*;
pub use utils::DeriverConfig;

// Re-export the derivation facade
pub use wallet::{
    derive_addresses,
    derive_private_keys,
    derive_seed,
    encode_address,
    encode_address_for,
    generate_mnemonic,
    validate_mnemonic,
    Bip44Deriver,
    WalletDeriver,
};

pub use crypto::{ExtendedKey, KeyTreeError};

// Re-export crypto utilities for binaries
pub use utils::crypto::{base58check_decode, base58check_encode, hash160, keccak256, to_checksum_address};

// Re-export FFI functions at crate root
pub use ffi::{
    seedpath_derive_addresses,
    seedpath_derive_private_keys,
    seedpath_encode_address,
    seedpath_free_string,
    seedpath_generate_mnemonic,
    seedpath_validate_mnemonic,
};
