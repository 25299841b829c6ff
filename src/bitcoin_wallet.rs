// Bitcoin (BTC) Address Encoding
// Legacy P2PKH: Base58Check(0x00 || HASH160(compressed pubkey))
// Derivation path: m/44'/0'/account'/change/index

use bitcoin::secp256k1::PublicKey;

use crate::utils::crypto::{base58check_decode, base58check_encode, hash160};

/// Mainnet P2PKH version byte
pub const P2PKH_VERSION: u8 = 0x00;

/// Encode a P2PKH address; always hashes the compressed key form
pub fn encode_bitcoin_address(public_key: &PublicKey) -> String {
    let pubkey_hash = hash160(&public_key.serialize());

    let mut payload = Vec::with_capacity(21);
    payload.push(P2PKH_VERSION);
    payload.extend_from_slice(&pubkey_hash);

    base58check_encode(&payload)
}

/// True for a mainnet P2PKH address with a valid checksum
pub fn is_valid_bitcoin_address(address: &str) -> bool {
    match base58check_decode(address) {
        Ok(payload) => payload.len() == 21 && payload[0] == P2PKH_VERSION,
        Err(_) => false,
    }
}
