// Tron (TRX) Address Encoding
// Same 20-byte Keccak digest as Ethereum, version byte 0x41, Base58Check
// Derivation path: m/44'/195'/account'/change/index

use bitcoin::secp256k1::PublicKey;

use crate::error::{WalletError, WalletResult};
use crate::ethereum_wallet::{ethereum_address_bytes, parse_ethereum_address};
use crate::types::{Chain, ChainAddress};
use crate::utils::crypto::{base58check_decode, base58check_encode, to_checksum_address};

/// Mainnet address version byte
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Encode a Tron address (`T...`) from a public key
pub fn encode_tron_address(public_key: &PublicKey) -> String {
    tron_address_from_bytes(&ethereum_address_bytes(public_key))
}

fn tron_address_from_bytes(address_bytes: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(TRON_ADDRESS_PREFIX);
    payload.extend_from_slice(address_bytes);

    base58check_encode(&payload)
}

/// Convert an Ethereum hex address to the Tron address of the same account
pub fn eth_to_tron_address(eth_address: &str) -> WalletResult<String> {
    let bytes = parse_ethereum_address(eth_address)
        .ok_or_else(|| WalletError::invalid_input("Expected a 0x-prefixed 20-byte hex address"))?;
    Ok(tron_address_from_bytes(&bytes))
}

/// Convert a Tron address back to its Ethereum hex form
pub fn tron_to_eth_address(tron_address: &str) -> WalletResult<String> {
    let payload = base58check_decode(tron_address)?;
    if payload.len() != 21 || payload[0] != TRON_ADDRESS_PREFIX {
        return Err(WalletError::invalid_input("Not a mainnet Tron address"));
    }
    Ok(to_checksum_address(&payload[1..]))
}

pub fn is_valid_tron_address(address: &str) -> bool {
    tron_to_eth_address(address).is_ok()
}

/// Legacy fallback: the ETH hex string offered as the TRX address.
///
/// The result is not spendable on Tron and is always tagged
/// [`AddressStatus::Degraded`](crate::types::AddressStatus::Degraded).
pub fn degraded_tron_address(eth_address: &str) -> ChainAddress {
    crate::log_warn!(
        "tron_wallet",
        "Reusing ETH address for TRX; result is not a valid Tron address",
        address = eth_address,
    );
    ChainAddress::degraded(Chain::Tron, eth_address)
}
