//! Cryptographic primitives
//!
//! BIP-32 key tree over secp256k1.

pub mod hd_key;

pub use hd_key::{derive_child, master_key, parse_public_key, ExtendedKey, KeyTreeError};
