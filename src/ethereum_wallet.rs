// Ethereum (ETH) and BNB Smart Chain (BSC) Address Encoding
// Keccak-256 of the 64-byte uncompressed public key, last 20 bytes, EIP-55
// Derivation path: m/44'/60'/account'/change/index (shared by BSC)

use bitcoin::secp256k1::PublicKey;

use crate::utils::crypto::{keccak256, to_checksum_address};

/// 20-byte account identifier shared by ETH, BSC and TRX
pub fn ethereum_address_bytes(public_key: &PublicKey) -> [u8; 20] {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]); // skip 0x04 prefix

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// `0x`-prefixed, EIP-55 checksummed address
pub fn encode_ethereum_address(public_key: &PublicKey) -> String {
    to_checksum_address(&ethereum_address_bytes(public_key))
}

/// Parse a `0x` hex address (any letter case) into its 20 bytes
pub fn parse_ethereum_address(address: &str) -> Option<[u8; 20]> {
    let hex_addr = address.trim().strip_prefix("0x")?;
    let bytes = hex::decode(hex_addr).ok()?;
    bytes.try_into().ok()
}
