//! Cross-checks derived addresses against the `bitcoin` and `bip39` crates.
//!
//! Input (file argument or stdin):
//! ```json
//! { "mnemonic": "...", "passphrase": "", "account": 0, "address_index": 0,
//!   "addresses": { "BTC": { "chain": "BTC", "address": "1...", "status": "derived" } } }
//! ```
//! `addresses` is optional; when present each entry must match as well.

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::{PublicKey, Secp256k1};
use bitcoin::{Address, Network};
use seedpath::wallet::{coin_types, HARDENED};
use seedpath::{keccak256, to_checksum_address, AddressMap, Bip44Deriver, Chain, WalletDeriver};
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct ValidationInput {
    mnemonic: String,
    #[serde(default)]
    passphrase: String,
    #[serde(default)]
    account: u32,
    #[serde(default)]
    address_index: u32,
    #[serde(default)]
    #[zeroize(skip)]
    addresses: Option<AddressMap>,
}

struct ValidationResult {
    name: &'static str,
    success: bool,
    message: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let payload = if let Some(path) = args.get(1) {
        fs::read_to_string(path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let input: ValidationInput = serde_json::from_str(&payload)?;
    let mnemonic = bip39::Mnemonic::parse(&input.mnemonic)?;
    let seed = zeroize::Zeroizing::new(mnemonic.to_seed(&input.passphrase));

    let derived = Bip44Deriver::new()
        .with_passphrase(input.passphrase.clone())
        .derive_addresses(&input.mnemonic, input.account, input.address_index, &Chain::ALL)?;
    if derived.is_empty() {
        return Err("mnemonic rejected by seedpath".into());
    }

    let secp = Secp256k1::new();
    let master = Xpriv::new_master(Network::Bitcoin, seed.as_ref())?;
    let leaf_key = |coin_type: u32| -> Result<PublicKey, String> {
        let path = bip44_path(coin_type, input.account, input.address_index)?;
        let xpriv = master.derive_priv(&secp, &path).map_err(|e| e.to_string())?;
        Ok(xpriv.private_key.public_key(&secp))
    };

    let mut results = Vec::new();
    for chain in Chain::ALL {
        let name = chain.symbol();
        results.push(run_validation(name, || {
            let expected = match chain {
                Chain::Bitcoin => {
                    let public_key = leaf_key(coin_types::BITCOIN)?;
                    let pubkey_hash = bitcoin::PublicKey::new(public_key).pubkey_hash();
                    Address::p2pkh(pubkey_hash, Network::Bitcoin).to_string()
                }
                Chain::Ethereum | Chain::Bsc => {
                    let public_key = leaf_key(coin_types::ETHEREUM)?;
                    to_checksum_address(&account_id(&public_key))
                }
                Chain::Tron => {
                    let public_key = leaf_key(coin_types::TRON)?;
                    let mut payload = vec![0x41];
                    payload.extend_from_slice(&account_id(&public_key));
                    bitcoin::base58::encode_check(&payload)
                }
            };
            compare(chain, &expected, &derived, input.addresses.as_ref())
        }));
    }

    println!("================ Derivation Validation ================");
    for result in &results {
        let status = if result.success {
            "✅ PASS"
        } else {
            "❌ FAIL"
        };
        println!("{:<10} {}", result.name, status);
        if !result.success {
            println!("    {}", result.message);
        }
    }

    let overall_success = results.iter().all(|r| r.success);
    println!("=======================================================");
    if overall_success {
        println!("Overall status: ✅ All derived addresses verified");
        Ok(())
    } else {
        println!("Overall status: ❌ Validation failed");
        Err("derivation validation failed".into())
    }
}

fn run_validation<F>(name: &'static str, f: F) -> ValidationResult
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(_) => ValidationResult {
            name,
            success: true,
            message: String::new(),
        },
        Err(err) => ValidationResult {
            name,
            success: false,
            message: err,
        },
    }
}

fn bip44_path(coin_type: u32, account: u32, index: u32) -> Result<DerivationPath, String> {
    if account >= HARDENED || index >= HARDENED {
        return Err("account and index must be below 2^31".to_string());
    }
    let hardened = |i: u32| ChildNumber::from_hardened_idx(i).map_err(|e| e.to_string());
    let normal = |i: u32| ChildNumber::from_normal_idx(i).map_err(|e| e.to_string());

    Ok(DerivationPath::from(vec![
        hardened(44)?,
        hardened(coin_type)?,
        hardened(account)?,
        normal(0)?,
        normal(index)?,
    ]))
}

/// Last 20 bytes of Keccak-256 over the uncompressed key body
fn account_id(public_key: &PublicKey) -> [u8; 20] {
    let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
    let mut id = [0u8; 20];
    id.copy_from_slice(&hash[12..]);
    id
}

fn compare(chain: Chain, expected: &str, derived: &AddressMap, supplied: Option<&AddressMap>) -> Result<(), String> {
    let ours = derived
        .get(&chain)
        .ok_or_else(|| format!("{} missing from derived addresses", chain))?;
    if ours.address != expected {
        return Err(format!("derived {} but reference gives {}", ours.address, expected));
    }

    if let Some(entry) = supplied.and_then(|map| map.get(&chain)) {
        if entry.is_degraded() {
            return Err("supplied address is a degraded fallback".to_string());
        }
        if entry.address != expected {
            return Err(format!("supplied {} but reference gives {}", entry.address, expected));
        }
    }

    Ok(())
}
