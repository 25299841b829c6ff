//! Seed Derivation
//!
//! BIP-39 seed function: PBKDF2-HMAC-SHA512, 2048 rounds,
//! password = NFKD(mnemonic), salt = "mnemonic" + NFKD(passphrase).
//!
//! No validation happens here; callers validate the phrase first.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const PBKDF2_ROUNDS: u32 = 2048;
pub const SEED_LEN: usize = 64;

const SALT_PREFIX: &str = "mnemonic";

/// Derive the 64-byte BIP-39 seed
pub fn derive_seed(mnemonic: &str, passphrase: &str) -> Zeroizing<[u8; SEED_LEN]> {
    let password = Zeroizing::new(mnemonic.nfkd().collect::<String>());

    let mut salt = Zeroizing::new(String::with_capacity(SALT_PREFIX.len() + passphrase.len()));
    salt.push_str(SALT_PREFIX);
    salt.extend(passphrase.nfkd());

    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, seed.as_mut());
    seed
}
