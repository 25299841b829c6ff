//! Crypto Utilities
//!
//! Hash and encoding helpers shared by the address encoders and the
//! extended-key serializer.

use bitcoin::hashes::{Hash, hash160, sha256d};
use tiny_keccak::{Hasher, Keccak};

use crate::error::{WalletError, WalletResult};

/// Length of the Base58Check checksum suffix
pub const CHECKSUM_LEN: usize = 4;

/// Keccak256 hash (used for Ethereum and Tron addresses)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Convert raw address bytes to checksummed Ethereum address (EIP-55)
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() {
            result.push(ch);
        } else if nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Base58Check-encode `payload` (checksum = first 4 bytes of double SHA-256)
pub fn base58check_encode(payload: &[u8]) -> String {
    let checksum = sha256d::Hash::hash(payload).to_byte_array();
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    bs58::encode(data).into_string()
}

/// Decode a Base58Check string and verify its checksum, returning the payload
pub fn base58check_decode(encoded: &str) -> WalletResult<Vec<u8>> {
    let data = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| WalletError::parse_error(format!("Invalid base58: {}", e)))?;

    if data.len() <= CHECKSUM_LEN {
        return Err(WalletError::parse_error("Base58Check payload too short"));
    }

    let (payload, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    let expected = sha256d::Hash::hash(payload).to_byte_array();
    if checksum != &expected[..CHECKSUM_LEN] {
        return Err(WalletError::parse_error("Base58Check checksum mismatch"));
    }

    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_checksum_address() {
        // EIP-55 reference vector
        let addr_bytes = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            to_checksum_address(&addr_bytes),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_base58check_genesis_address() {
        // HASH160 of the genesis block coinbase key
        let mut payload = vec![0x00];
        payload.extend_from_slice(&hex::decode("62e907b15cbf27d5425399ebf6f0fb50ebb88f18").unwrap());
        assert_eq!(base58check_encode(&payload), "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");

        let decoded = base58check_decode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_base58check_rejects_corruption() {
        assert!(base58check_decode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb").is_err());
        assert!(base58check_decode("0OIl").is_err());
        assert!(base58check_decode("1").is_err());
    }
}
