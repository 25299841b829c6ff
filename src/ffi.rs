//! FFI Layer
//!
//! All C-ABI exports are defined here. Every function follows one pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `seedpath_free_string`)
//!
//! Error handling: every response carries a `success` field. On error,
//! `success: false` and the `error` object is populated.
//!
//! SECURITY: request structs holding mnemonics or passphrases are zeroized
//! on drop. Responses from `seedpath_derive_private_keys` contain raw keys;
//! the caller must not log or persist them.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WalletError;
use crate::types::*;
use crate::wallet::{self, Bip44Deriver, WalletDeriver};

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any seedpath_* function
///
/// # Safety
/// The pointer must have been returned by a seedpath_* function
#[unsafe(no_mangle)]
pub extern "C" fn seedpath_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Copy a C string into an owned Rust string, returning error JSON if invalid
fn parse_input(input: *const c_char) -> Result<String, *mut c_char> {
    if input.is_null() {
        return Err(error_response(WalletError::invalid_input("Null input pointer")));
    }

    let c_str = unsafe { CStr::from_ptr(input) };
    match c_str.to_str() {
        Ok(s) => Ok(s.to_owned()),
        Err(_) => Err(error_response(WalletError::invalid_input("Invalid UTF-8 string"))),
    }
}

/// Parse a JSON request body
fn parse_request<T: for<'de> Deserialize<'de>>(input: *const c_char) -> Result<T, *mut c_char> {
    let mut json_str = parse_input(input)?;
    let parsed = serde_json::from_str(&json_str)
        .map_err(|e| error_response(WalletError::parse_error(format!("Invalid JSON: {}", e))));
    json_str.zeroize();
    parsed
}

/// Create a success response JSON string
fn success_response<T: Serialize>(data: T) -> *mut c_char {
    let response = ApiResponse::ok(data);
    string_to_ptr(response.to_json())
}

/// Create an error response JSON string
fn error_response(error: WalletError) -> *mut c_char {
    let response: ApiResponse<()> = ApiResponse::err(error);
    string_to_ptr(response.to_json())
}

/// Convert Rust string to C string pointer
fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        // Last resort: return a minimal error
        Err(_) => CString::from(c"{\"success\":false,\"error\":{\"code\":\"internal\",\"message\":\"String conversion failed\"}}")
            .into_raw(),
    }
}

// =============================================================================
// Requests and Responses
// =============================================================================

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct MnemonicRequest {
    mnemonic: String,
}

#[derive(Deserialize, Default)]
struct GenerateRequest {
    #[serde(default)]
    word_count: Option<usize>,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct DeriveRequest {
    mnemonic: String,
    #[serde(default)]
    passphrase: String,
    #[serde(default)]
    account: u32,
    #[serde(default)]
    address_index: u32,
    #[serde(default)]
    change: u32,
    /// Chain symbols or names; all chains when absent
    #[serde(default)]
    chains: Option<Vec<String>>,
}

impl DeriveRequest {
    fn chains(&self) -> Result<Vec<Chain>, WalletError> {
        match &self.chains {
            None => Ok(Chain::ALL.to_vec()),
            Some(ids) => {
                let chains = parse_chain_list(&ids.join(","))?;
                if chains.is_empty() {
                    return Err(WalletError::invalid_input("At least one chain must be selected"));
                }
                Ok(chains)
            }
        }
    }

    fn deriver(&self) -> Bip44Deriver {
        Bip44Deriver::new()
            .with_passphrase(self.passphrase.clone())
            .with_change(self.change)
    }
}

#[derive(Deserialize)]
struct EncodeRequest {
    chain: String,
    /// Hex of a 33-byte compressed or 65-byte uncompressed key
    public_key: String,
}

#[derive(Serialize)]
struct ValidationResponse {
    valid: bool,
    word_count: usize,
    reason: Option<String>,
}

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct MnemonicResponse {
    mnemonic: String,
}

// =============================================================================
// Mnemonic Operations
// =============================================================================

/// Validate a mnemonic phrase
///
/// # Input
/// ```json
/// { "mnemonic": "word1 word2 ..." }
/// ```
///
/// # Output
/// ```json
/// { "success": true, "data": { "valid": false, "word_count": 12, "reason": "Checksum mismatch" } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn seedpath_validate_mnemonic(input: *const c_char) -> *mut c_char {
    let request: MnemonicRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let response = match wallet::parse_mnemonic(&request.mnemonic) {
        Ok(validated) => ValidationResponse {
            valid: true,
            word_count: validated.word_count(),
            reason: None,
        },
        Err(e) => ValidationResponse {
            valid: false,
            word_count: request.mnemonic.split_whitespace().count(),
            reason: Some(e.to_string()),
        },
    };
    success_response(response)
}

/// Generate a new mnemonic from OS randomness
///
/// # Input
/// ```json
/// { "word_count": 24 }
/// ```
/// `word_count` defaults to 12. A null pointer is treated as `{}`.
#[unsafe(no_mangle)]
pub extern "C" fn seedpath_generate_mnemonic(input: *const c_char) -> *mut c_char {
    let request: GenerateRequest = if input.is_null() {
        GenerateRequest::default()
    } else {
        match parse_request(input) {
            Ok(r) => r,
            Err(ptr) => return ptr,
        }
    };

    match wallet::generate_mnemonic(request.word_count.unwrap_or(12)) {
        Ok(phrase) => success_response(MnemonicResponse {
            mnemonic: phrase.to_string(),
        }),
        Err(e) => error_response(e),
    }
}

// =============================================================================
// Derivation Operations
// =============================================================================

/// Derive addresses for the requested chains
///
/// # Input
/// ```json
/// {
///   "mnemonic": "word1 word2 ...",
///   "passphrase": "",
///   "account": 0,
///   "address_index": 0,
///   "chains": ["BTC", "ETH", "BSC", "TRX"]
/// }
/// ```
///
/// # Output
/// ```json
/// {
///   "success": true,
///   "data": { "BTC": { "chain": "BTC", "address": "1...", "status": "derived" }, ... }
/// }
/// ```
/// An invalid mnemonic yields `"data": {}`.
#[unsafe(no_mangle)]
pub extern "C" fn seedpath_derive_addresses(input: *const c_char) -> *mut c_char {
    let request: DeriveRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let result = request.chains().and_then(|chains| {
        request
            .deriver()
            .derive_addresses(&request.mnemonic, request.account, request.address_index, &chains)
    });

    match result {
        Ok(addresses) => success_response(addresses),
        Err(e) => error_response(e),
    }
}

/// Derive hex-encoded private keys for the requested chains
///
/// Same input as `seedpath_derive_addresses`. Output data maps chain symbol
/// to 64 hex digits.
///
/// SECURITY: the response contains raw private keys. Free it promptly with
/// `seedpath_free_string` and never log it.
#[unsafe(no_mangle)]
pub extern "C" fn seedpath_derive_private_keys(input: *const c_char) -> *mut c_char {
    let request: DeriveRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let result = request.chains().and_then(|chains| {
        request
            .deriver()
            .derive_private_keys(&request.mnemonic, request.account, request.address_index, &chains)
    });

    match result {
        Ok(keys) => success_response(&keys),
        Err(e) => error_response(e),
    }
}

/// Encode a public key as an address
///
/// # Input
/// ```json
/// { "chain": "TRX", "public_key": "02..." }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn seedpath_encode_address(input: *const c_char) -> *mut c_char {
    let request: EncodeRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let result = hex::decode(request.public_key.trim().trim_start_matches("0x"))
        .map_err(WalletError::from)
        .and_then(|bytes| wallet::encode_address_for(&request.chain, &bytes));

    match result {
        Ok(address) => success_response(address),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn call(f: extern "C" fn(*const c_char) -> *mut c_char, input: &str) -> Value {
        let input = CString::new(input).unwrap();
        let ptr = f(input.as_ptr());
        let json = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        seedpath_free_string(ptr);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_validate_mnemonic() {
        let ok = call(seedpath_validate_mnemonic, &format!(r#"{{"mnemonic":"{}"}}"#, ABANDON));
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["valid"], true);

        let bad = call(seedpath_validate_mnemonic, r#"{"mnemonic":"abandon about"}"#);
        assert_eq!(bad["data"]["valid"], false);
        assert_eq!(bad["data"]["word_count"], 2);
    }

    #[test]
    fn test_derive_addresses() {
        let response = call(
            seedpath_derive_addresses,
            &format!(r#"{{"mnemonic":"{}","chains":["BTC","eth"]}}"#, ABANDON),
        );
        assert_eq!(response["success"], true);
        assert_eq!(response["data"]["BTC"]["address"], "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
        assert_eq!(response["data"]["ETH"]["status"], "derived");
        assert!(response["data"].get("TRX").is_none());
    }

    #[test]
    fn test_invalid_mnemonic_returns_empty_data() {
        let bad = ABANDON.replace("about", "abandon");
        let response = call(seedpath_derive_addresses, &format!(r#"{{"mnemonic":"{}"}}"#, bad));
        assert_eq!(response["success"], true);
        assert_eq!(response["data"], serde_json::json!({}));
    }

    #[test]
    fn test_unsupported_chain() {
        let response = call(
            seedpath_derive_addresses,
            &format!(r#"{{"mnemonic":"{}","chains":["DOGE"]}}"#, ABANDON),
        );
        assert_eq!(response["success"], false);
        assert_eq!(response["error"]["code"], "unsupported_chain");
    }

    #[test]
    fn test_change_outside_bip44_branches_rejected() {
        let response = call(
            seedpath_derive_addresses,
            &format!(r#"{{"mnemonic":"{}","chains":["BTC"],"change":7}}"#, ABANDON),
        );
        assert_eq!(response["success"], false);
        assert_eq!(response["error"]["code"], "invalid_path");

        let internal = call(
            seedpath_derive_addresses,
            &format!(r#"{{"mnemonic":"{}","chains":["BTC"],"change":1}}"#, ABANDON),
        );
        assert_eq!(internal["success"], true);
        assert_eq!(internal["data"]["BTC"]["status"], "derived");
    }

    #[test]
    fn test_private_keys_shape() {
        let response = call(
            seedpath_derive_private_keys,
            &format!(r#"{{"mnemonic":"{}","chains":["ETH","BSC"]}}"#, ABANDON),
        );
        let eth = response["data"]["ETH"].as_str().unwrap();
        assert_eq!(eth.len(), 64);
        assert_eq!(response["data"]["BSC"], response["data"]["ETH"]);
    }

    #[test]
    fn test_generate_mnemonic() {
        let response = call(seedpath_generate_mnemonic, r#"{"word_count":18}"#);
        let phrase = response["data"]["mnemonic"].as_str().unwrap();
        assert_eq!(phrase.split(' ').count(), 18);
        assert!(wallet::validate_mnemonic(phrase));

        let ptr = seedpath_generate_mnemonic(std::ptr::null());
        let json = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        seedpath_free_string(ptr);
        assert!(json.contains(r#""success":true"#));
    }

    #[test]
    fn test_encode_address() {
        // Compressed public key of secret 0x00..01
        let response = call(
            seedpath_encode_address,
            r#"{"chain":"ETH","public_key":"0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"}"#,
        );
        assert_eq!(response["data"]["address"], "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");

        let response = call(seedpath_encode_address, r#"{"chain":"XMR","public_key":"02"}"#);
        assert_eq!(response["success"], false);
    }

    #[test]
    fn test_malformed_input() {
        let response = call(seedpath_derive_addresses, "not json");
        assert_eq!(response["error"]["code"], "parse_error");

        let ptr = seedpath_validate_mnemonic(std::ptr::null());
        let json = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        seedpath_free_string(ptr);
        assert!(json.contains("invalid_input"));
    }
}
