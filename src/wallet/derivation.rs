//! Key Derivation
//!
//! Per-chain table `{chain, coin_type, encoder}` and the single BIP-44 walker
//! shared by every chain. Chains with the same coin type (ETH and BSC) share
//! one walk per request.
//!
//! SECURITY: leaf keys live only as long as the request that derived them.

use std::collections::BTreeMap;

use bitcoin::secp256k1::{All, PublicKey, Secp256k1};

use crate::bitcoin_wallet::encode_bitcoin_address;
use crate::crypto::{parse_public_key, ExtendedKey};
use crate::error::WalletResult;
use crate::ethereum_wallet::encode_ethereum_address;
use crate::tron_wallet::encode_tron_address;
use crate::types::{Chain, ChainAddress};

use super::derivation_path::{coin_types, DerivationPath};

/// Public key to address transform
pub type AddressEncoder = fn(&PublicKey) -> String;

/// Derivation parameters for one chain
#[derive(Clone, Copy)]
pub struct ChainSpec {
    pub chain: Chain,
    pub coin_type: u32,
    pub encoder: AddressEncoder,
}

/// Every supported chain; the only place chain differences live
pub const CHAIN_SPECS: [ChainSpec; 4] = [
    ChainSpec {
        chain: Chain::Bitcoin,
        coin_type: coin_types::BITCOIN,
        encoder: encode_bitcoin_address,
    },
    ChainSpec {
        chain: Chain::Ethereum,
        coin_type: coin_types::ETHEREUM,
        encoder: encode_ethereum_address,
    },
    ChainSpec {
        chain: Chain::Bsc,
        coin_type: coin_types::ETHEREUM,
        encoder: encode_ethereum_address,
    },
    ChainSpec {
        chain: Chain::Tron,
        coin_type: coin_types::TRON,
        encoder: encode_tron_address,
    },
];

/// Table entry for `chain`
pub fn chain_spec(chain: Chain) -> &'static ChainSpec {
    match chain {
        Chain::Bitcoin => &CHAIN_SPECS[0],
        Chain::Ethereum => &CHAIN_SPECS[1],
        Chain::Bsc => &CHAIN_SPECS[2],
        Chain::Tron => &CHAIN_SPECS[3],
    }
}

/// Encode a 33- or 65-byte secp256k1 public key for `chain`
pub fn encode_address(chain: Chain, public_key: &[u8]) -> WalletResult<ChainAddress> {
    let public_key = parse_public_key(public_key)?;
    Ok(ChainAddress::derived(chain, (chain_spec(chain).encoder)(&public_key)))
}

/// Same as [`encode_address`] for a chain given by symbol or name.
/// Unknown identifiers fail with `UnsupportedChain`.
pub fn encode_address_for(chain_id: &str, public_key: &[u8]) -> WalletResult<ChainAddress> {
    let chain: Chain = chain_id.parse()?;
    encode_address(chain, public_key)
}

/// Walk `m/44'/coin_type'/account'/change/address_index` from the master key
pub fn walk_bip44(
    secp: &Secp256k1<All>,
    master: &ExtendedKey,
    coin_type: u32,
    account: u32,
    change: u32,
    address_index: u32,
) -> WalletResult<ExtendedKey> {
    let path = DerivationPath::bip44(coin_type, account, change, address_index);
    crate::log_debug!("derivation", "Walking BIP-44 path", path = path);
    Ok(master.derive_path(secp, &path)?)
}

/// Leaf keys for one request, one per distinct coin type
pub struct LeafKeys {
    by_coin_type: BTreeMap<u32, ExtendedKey>,
}

impl LeafKeys {
    /// Derive the master key from `seed` and walk once per coin type in `chains`
    pub fn derive(
        secp: &Secp256k1<All>,
        seed: &[u8],
        chains: &[Chain],
        account: u32,
        change: u32,
        address_index: u32,
    ) -> WalletResult<Self> {
        let master = ExtendedKey::master(seed)?;
        let mut by_coin_type = BTreeMap::new();

        for chain in chains {
            let coin_type = chain_spec(*chain).coin_type;
            if by_coin_type.contains_key(&coin_type) {
                continue;
            }
            let leaf = walk_bip44(secp, &master, coin_type, account, change, address_index)?;
            by_coin_type.insert(coin_type, leaf);
        }

        Ok(Self { by_coin_type })
    }

    pub fn get(&self, chain: Chain) -> Option<&ExtendedKey> {
        self.by_coin_type.get(&chain_spec(chain).coin_type)
    }

    /// Number of path walks performed
    pub fn walks(&self) -> usize {
        self.by_coin_type.len()
    }
}
