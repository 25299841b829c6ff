//! BIP-32 Hierarchical Deterministic Keys (secp256k1)
//!
//! - Master key: HMAC-SHA512("Bitcoin seed", seed)
//! - Hardened child: HMAC-SHA512(chain_code, 0x00 || k_par || ser32(i + 2^31))
//! - Normal child: HMAC-SHA512(chain_code, serP(K_par) || ser32(i))
//! - Child key: parse256(IL) + k_par (mod n)
//!
//! An `IL >= n` or a zero child key makes the index invalid. Callers that
//! follow the BIP-32 policy move on to the next index, see
//! [`ExtendedKey::derive_child_or_next`].

use bitcoin::secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::utils::crypto::{base58check_decode, base58check_encode, hash160};
use crate::wallet::{DerivationPath, HARDENED};

type HmacSha512 = Hmac<Sha512>;

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Mainnet extended key version bytes
const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

const SERIALIZED_LEN: usize = 78;

/// Errors raised while building or walking the key tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyTreeError {
    #[error("Invalid derived key: {0}")]
    InvalidKey(String),

    #[error("Child index {0} out of range (use the hardened flag instead of the high bit)")]
    IndexOutOfRange(u32),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid extended key serialization: {0}")]
    InvalidSerialization(String),
}

/// A private extended key: secret scalar plus chain code and tree position.
///
/// Not `Clone`: every derivation owns its own tree. Secret material is
/// erased on drop.
pub struct ExtendedKey {
    secret_key: SecretKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
}

/// Run `derive` at `index`, then `index + 1` and so on while it reports an
/// invalid key. Other errors are returned as-is. Running past the last
/// non-hardened index gives `IndexOutOfRange`.
fn retry_next<T, F>(index: u32, mut derive: F) -> Result<T, KeyTreeError>
where
    F: FnMut(u32) -> Result<T, KeyTreeError>,
{
    let mut current = index;
    loop {
        match derive(current) {
            Err(KeyTreeError::InvalidKey(reason)) => {
                crate::log_warn!(
                    "hd_key",
                    "Skipping invalid child index",
                    index = current,
                    reason = reason,
                );
                current = current
                    .checked_add(1)
                    .filter(|next| *next < HARDENED)
                    .ok_or(KeyTreeError::IndexOutOfRange(current))?;
            }
            other => return other,
        }
    }
}

impl ExtendedKey {
    /// Master key from a BIP-39 seed (16..=64 bytes per BIP-32)
    pub fn master(seed: &[u8]) -> Result<Self, KeyTreeError> {
        let mut mac = HmacSha512::new_from_slice(MASTER_HMAC_KEY)
            .map_err(|e| KeyTreeError::InvalidKey(e.to_string()))?;
        mac.update(seed);
        let mut result = Zeroizing::new([0u8; 64]);
        result.copy_from_slice(&mac.finalize().into_bytes());

        let (il, ir) = result.split_at(32);
        let secret_key = SecretKey::from_slice(il)
            .map_err(|_| KeyTreeError::InvalidKey("master key out of range".into()))?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(Self {
            secret_key,
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
        })
    }

    /// Derive child `index` (0..2^31). `hardened` sets the high bit.
    pub fn derive_child(
        &self,
        secp: &Secp256k1<All>,
        index: u32,
        hardened: bool,
    ) -> Result<Self, KeyTreeError> {
        if index >= HARDENED {
            return Err(KeyTreeError::IndexOutOfRange(index));
        }
        let child_number = if hardened { index | HARDENED } else { index };

        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| KeyTreeError::InvalidKey(e.to_string()))?;

        if hardened {
            // Hardened: 0x00 || private_key || index
            let secret_bytes = Zeroizing::new(self.secret_key.secret_bytes());
            mac.update(&[0x00]);
            mac.update(&secret_bytes[..]);
        } else {
            // Normal: public_key || index
            mac.update(&self.public_key(secp).serialize());
        }
        mac.update(&child_number.to_be_bytes());

        let mut result = Zeroizing::new([0u8; 64]);
        result.copy_from_slice(&mac.finalize().into_bytes());
        let (il, ir) = result.split_at(32);

        let mut tweak_bytes = Zeroizing::new([0u8; 32]);
        tweak_bytes.copy_from_slice(il);

        let tweak = Scalar::from_be_bytes(*tweak_bytes)
            .map_err(|_| KeyTreeError::InvalidKey(format!("tweak >= curve order at index {}", index)))?;
        let secret_key = self
            .secret_key
            .add_tweak(&tweak)
            .map_err(|_| KeyTreeError::InvalidKey(format!("zero child key at index {}", index)))?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(Self {
            secret_key,
            chain_code,
            depth: self.depth.saturating_add(1),
            parent_fingerprint: self.fingerprint(secp),
            child_number,
        })
    }

    /// Derive child `index`, moving to `index + 1` while the result is an
    /// invalid key. The returned key's [`child_index`](Self::child_index)
    /// records the index actually used.
    pub fn derive_child_or_next(
        &self,
        secp: &Secp256k1<All>,
        index: u32,
        hardened: bool,
    ) -> Result<Self, KeyTreeError> {
        retry_next(index, |current| self.derive_child(secp, current, hardened))
    }

    /// Walk every component of `path` from this key, applying the retry policy
    pub fn derive_path(&self, secp: &Secp256k1<All>, path: &DerivationPath) -> Result<Self, KeyTreeError> {
        let mut components = path.components().iter();

        let first = match components.next() {
            Some(component) => component,
            None => return Ok(self.duplicate()),
        };

        let mut current = self.derive_child_or_next(secp, first.index, first.hardened)?;
        for component in components {
            current = current.derive_child_or_next(secp, component.index, component.hardened)?;
        }
        Ok(current)
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Raw 32-byte private key
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret_key.secret_bytes())
    }

    pub fn public_key(&self, secp: &Secp256k1<All>) -> PublicKey {
        PublicKey::from_secret_key(secp, &self.secret_key)
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    /// Child number including the hardened bit
    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    /// Child index without the hardened bit
    pub fn child_index(&self) -> u32 {
        self.child_number & !HARDENED
    }

    pub fn is_hardened(&self) -> bool {
        self.child_number & HARDENED != 0
    }

    /// First four bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self, secp: &Secp256k1<All>) -> [u8; 4] {
        let id = hash160(&self.public_key(secp).serialize());
        [id[0], id[1], id[2], id[3]]
    }

    /// BIP-32 `xprv` serialization
    pub fn to_xprv(&self) -> Zeroizing<String> {
        let mut data = Zeroizing::new(Vec::with_capacity(SERIALIZED_LEN));
        self.write_header(&mut data, XPRV_VERSION);
        data.push(0x00);
        data.extend_from_slice(&self.private_key_bytes()[..]);
        Zeroizing::new(base58check_encode(&data))
    }

    /// BIP-32 `xpub` serialization
    pub fn to_xpub(&self, secp: &Secp256k1<All>) -> String {
        let mut data = Vec::with_capacity(SERIALIZED_LEN);
        self.write_header(&mut data, XPUB_VERSION);
        data.extend_from_slice(&self.public_key(secp).serialize());
        base58check_encode(&data)
    }

    /// Parse a mainnet `xprv` string
    pub fn from_xprv(encoded: &str) -> Result<Self, KeyTreeError> {
        let data = Zeroizing::new(
            base58check_decode(encoded).map_err(|e| KeyTreeError::InvalidSerialization(e.message))?,
        );

        if data.len() != SERIALIZED_LEN {
            return Err(KeyTreeError::InvalidSerialization(format!(
                "expected {} bytes, got {}",
                SERIALIZED_LEN,
                data.len()
            )));
        }
        if data[..4] != XPRV_VERSION {
            return Err(KeyTreeError::InvalidSerialization("not a mainnet xprv".into()));
        }
        if data[45] != 0x00 {
            return Err(KeyTreeError::InvalidSerialization("missing private key marker".into()));
        }

        let depth = data[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut child_bytes = [0u8; 4];
        child_bytes.copy_from_slice(&data[9..13]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        let secret_key = SecretKey::from_slice(&data[46..78])
            .map_err(|e| KeyTreeError::InvalidKey(e.to_string()))?;

        if depth == 0 && (parent_fingerprint != [0u8; 4] || child_bytes != [0u8; 4]) {
            return Err(KeyTreeError::InvalidSerialization(
                "master key with non-zero parent fingerprint or index".into(),
            ));
        }

        Ok(Self {
            secret_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number: u32::from_be_bytes(child_bytes),
        })
    }

    fn write_header(&self, data: &mut Vec<u8>, version: [u8; 4]) {
        data.extend_from_slice(&version);
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_be_bytes());
        data.extend_from_slice(&self.chain_code);
    }

    fn duplicate(&self) -> Self {
        Self {
            secret_key: self.secret_key,
            chain_code: self.chain_code,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
        }
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
        self.chain_code.zeroize();
    }
}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

/// Master key from a seed
pub fn master_key(seed: &[u8]) -> Result<ExtendedKey, KeyTreeError> {
    ExtendedKey::master(seed)
}

/// Single BIP-32 child derivation step
pub fn derive_child(parent: &ExtendedKey, index: u32, hardened: bool) -> Result<ExtendedKey, KeyTreeError> {
    let secp = Secp256k1::new();
    parent.derive_child(&secp, index, hardened)
}

/// Parse a compressed (33-byte) or uncompressed (65-byte) secp256k1 key
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, KeyTreeError> {
    PublicKey::from_slice(bytes).map_err(|e| KeyTreeError::InvalidPublicKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP-32 test vector 1
    const SEED_1: &str = "000102030405060708090a0b0c0d0e0f";

    fn vector_master() -> ExtendedKey {
        ExtendedKey::master(&hex::decode(SEED_1).unwrap()).unwrap()
    }

    #[test]
    fn test_vector1_master() {
        let secp = Secp256k1::new();
        let master = vector_master();

        assert_eq!(
            master.to_xprv().as_str(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.to_xpub(&secp),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
        assert_eq!(master.depth(), 0);
    }

    #[test]
    fn test_vector1_hardened_child() {
        let secp = Secp256k1::new();
        let child = vector_master().derive_child(&secp, 0, true).unwrap();

        assert_eq!(
            child.to_xprv().as_str(),
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7"
        );
        assert_eq!(
            child.to_xpub(&secp),
            "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw"
        );
        assert_eq!(child.depth(), 1);
        assert!(child.is_hardened());
        assert_eq!(child.child_index(), 0);
    }

    #[test]
    fn test_hardened_and_normal_children_differ() {
        let secp = Secp256k1::new();
        let master = vector_master();
        let hardened = master.derive_child(&secp, 1, true).unwrap();
        let normal = master.derive_child(&secp, 1, false).unwrap();

        assert_ne!(*hardened.private_key_bytes(), *normal.private_key_bytes());
        assert_eq!(hardened.parent_fingerprint(), normal.parent_fingerprint());
        assert_eq!(hardened.parent_fingerprint(), master.fingerprint(&secp));
    }

    #[test]
    fn test_high_bit_index_rejected() {
        let secp = Secp256k1::new();
        let err = vector_master().derive_child(&secp, HARDENED, false).unwrap_err();
        assert_eq!(err, KeyTreeError::IndexOutOfRange(HARDENED));
    }

    #[test]
    fn test_retry_is_noop_for_valid_index() {
        let secp = Secp256k1::new();
        let master = vector_master();
        let direct = master.derive_child(&secp, 7, false).unwrap();
        let retried = master.derive_child_or_next(&secp, 7, false).unwrap();

        assert_eq!(retried.child_index(), 7);
        assert_eq!(*direct.private_key_bytes(), *retried.private_key_bytes());
    }

    #[test]
    fn test_retry_moves_to_next_index() {
        let secp = Secp256k1::new();
        let master = vector_master();
        let mut attempts = Vec::new();

        let child = retry_next(11, |i| {
            attempts.push(i);
            if i == 11 {
                Err(KeyTreeError::InvalidKey("IL >= n".to_string()))
            } else {
                master.derive_child(&secp, i, false)
            }
        })
        .unwrap();

        assert_eq!(attempts, vec![11, 12]);
        assert_eq!(child.child_index(), 12);
        assert_eq!(
            *child.private_key_bytes(),
            *master.derive_child(&secp, 12, false).unwrap().private_key_bytes()
        );
    }

    #[test]
    fn test_retry_stops_at_last_normal_index() {
        let last = HARDENED - 1;
        let err = retry_next::<(), _>(last, |_| Err(KeyTreeError::InvalidKey("zero".to_string()))).unwrap_err();
        assert_eq!(err, KeyTreeError::IndexOutOfRange(last));
    }

    #[test]
    fn test_retry_passes_other_errors_through() {
        let mut attempts = 0;
        let err = retry_next::<(), _>(3, |_| {
            attempts += 1;
            Err(KeyTreeError::InvalidPublicKey("bad".to_string()))
        })
        .unwrap_err();

        assert_eq!(attempts, 1);
        assert_eq!(err, KeyTreeError::InvalidPublicKey("bad".to_string()));
    }

    #[test]
    fn test_derive_path_matches_stepwise() {
        let secp = Secp256k1::new();
        let master = vector_master();
        let path: DerivationPath = "m/0'/1/2'".parse().unwrap();

        let walked = master.derive_path(&secp, &path).unwrap();
        let stepwise = master
            .derive_child(&secp, 0, true)
            .and_then(|k| k.derive_child(&secp, 1, false))
            .and_then(|k| k.derive_child(&secp, 2, true))
            .unwrap();

        assert_eq!(walked.to_xprv(), stepwise.to_xprv());
        assert_eq!(walked.depth(), 3);
    }

    #[test]
    fn test_xprv_roundtrip() {
        let secp = Secp256k1::new();
        let child = vector_master().derive_child(&secp, 0, true).unwrap();
        let parsed = ExtendedKey::from_xprv(&child.to_xprv()).unwrap();

        assert_eq!(parsed.depth(), 1);
        assert_eq!(parsed.child_number(), HARDENED);
        assert_eq!(parsed.to_xpub(&secp), child.to_xpub(&secp));
    }

    #[test]
    fn test_from_xprv_rejects_xpub() {
        let secp = Secp256k1::new();
        let xpub = vector_master().to_xpub(&secp);
        assert!(matches!(
            ExtendedKey::from_xprv(&xpub),
            Err(KeyTreeError::InvalidSerialization(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let master = vector_master();
        let debug = format!("{:?}", master);
        let secret = hex::encode(&master.private_key_bytes()[..]);
        assert!(!debug.contains(&secret));
    }

    #[test]
    fn test_parse_public_key_lengths() {
        let secp = Secp256k1::new();
        let pk = vector_master().public_key(&secp);
        assert_eq!(parse_public_key(&pk.serialize()).unwrap(), pk);
        assert_eq!(parse_public_key(&pk.serialize_uncompressed()).unwrap(), pk);
        assert!(parse_public_key(&[0x02; 20]).is_err());
    }
}
