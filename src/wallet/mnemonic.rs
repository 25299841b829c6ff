//! Mnemonic Validation and Generation
//!
//! BIP-39 checks against the embedded English wordlist:
//! - word count in {12, 15, 18, 21, 24}
//! - every word is a list member
//! - the trailing `count / 3` bits equal the leading bits of SHA-256(entropy)
//!
//! SECURITY: entropy and canonical phrases are zeroized on drop. Errors carry
//! word positions, never the words themselves.

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};

/// Word counts allowed by BIP-39
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

const BITS_PER_WORD: usize = 11;

/// Why a phrase failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MnemonicError {
    #[error("Invalid word count {0} (expected 12, 15, 18, 21 or 24)")]
    InvalidWordCount(usize),

    #[error("Word {position} is not in the BIP-39 wordlist")]
    UnknownWord { position: usize },

    #[error("Checksum mismatch")]
    ChecksumMismatch,
}

impl From<MnemonicError> for WalletError {
    fn from(e: MnemonicError) -> Self {
        WalletError::invalid_mnemonic(e.to_string())
    }
}

/// A phrase that passed validation, held in canonical form
/// (NFKD, single spaces between words)
pub struct ValidatedMnemonic {
    phrase: Zeroizing<String>,
    entropy: Zeroizing<Vec<u8>>,
    word_count: usize,
}

impl ValidatedMnemonic {
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

impl std::fmt::Debug for ValidatedMnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedMnemonic")
            .field("word_count", &self.word_count)
            .finish_non_exhaustive()
    }
}

/// Check a phrase, returning `false` on any failure
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// Check a phrase and report which rule it broke
pub fn parse_mnemonic(phrase: &str) -> Result<ValidatedMnemonic, MnemonicError> {
    let normalized = Zeroizing::new(phrase.trim().nfkd().collect::<String>());
    let words: Vec<&str> = normalized.split_whitespace().collect();

    if !VALID_WORD_COUNTS.contains(&words.len()) {
        return Err(MnemonicError::InvalidWordCount(words.len()));
    }

    let wordlist = Language::English.word_list();
    let mut indices = Zeroizing::new(Vec::with_capacity(words.len()));
    for (position, word) in words.iter().enumerate() {
        let index = wordlist
            .binary_search(word)
            .map_err(|_| MnemonicError::UnknownWord { position: position + 1 })?;
        indices.push(index as u16);
    }

    let entropy = checked_entropy(&indices)?;

    Ok(ValidatedMnemonic {
        phrase: Zeroizing::new(words.join(" ")),
        entropy,
        word_count: words.len(),
    })
}

/// Unpack 11-bit word indices into entropy bytes and verify the checksum
fn checked_entropy(indices: &[u16]) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
    let total_bits = indices.len() * BITS_PER_WORD;
    let mut bits = Zeroizing::new(vec![0u8; total_bits.div_ceil(8)]);

    for (i, index) in indices.iter().enumerate() {
        for bit in 0..BITS_PER_WORD {
            if (index >> (BITS_PER_WORD - 1 - bit)) & 1 == 1 {
                let pos = i * BITS_PER_WORD + bit;
                bits[pos / 8] |= 1 << (7 - pos % 8);
            }
        }
    }

    let checksum_bits = indices.len() / 3;
    let entropy_len = (total_bits - checksum_bits) / 8;

    let hash = Sha256::digest(&bits[..entropy_len]);
    let expected = hash[0] >> (8 - checksum_bits);
    let actual = bits[entropy_len] >> (8 - checksum_bits);

    if expected != actual {
        return Err(MnemonicError::ChecksumMismatch);
    }

    Ok(Zeroizing::new(bits[..entropy_len].to_vec()))
}

/// Generate a new phrase from OS randomness
pub fn generate_mnemonic(word_count: usize) -> WalletResult<Zeroizing<String>> {
    if !VALID_WORD_COUNTS.contains(&word_count) {
        return Err(MnemonicError::InvalidWordCount(word_count).into());
    }

    let mut entropy = Zeroizing::new(vec![0u8; word_count * 4 / 3]);
    OsRng.fill_bytes(entropy.as_mut_slice());

    mnemonic_from_entropy(&entropy)
}

/// Encode caller-supplied entropy (16, 20, 24, 28 or 32 bytes) as a phrase
pub fn mnemonic_from_entropy(entropy: &[u8]) -> WalletResult<Zeroizing<String>> {
    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy)
        .map_err(|e| WalletError::crypto_error(format!("Failed to create mnemonic: {}", e)))?;

    Ok(Zeroizing::new(mnemonic.to_string()))
}
