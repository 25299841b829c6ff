use seedpath::{AddressMap, Chain};
use serde_json::Value;
use std::process::{Command, Output};

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

const ENV_VARS: [&str; 5] = [
    "SEEDPATH_CHAINS",
    "SEEDPATH_ACCOUNT",
    "SEEDPATH_INDEX",
    "SEEDPATH_PASSPHRASE",
    "SEEDPATH_DEBUG",
];

fn seedpath() -> Command {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin!("seedpath"));
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command
}

fn run(args: &[&str]) -> Output {
    seedpath().args(args).output().expect("cli runs")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

#[test]
fn derive_prints_known_addresses_as_json() {
    let output = run(&["--json", "derive", ABANDON]);
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);

    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    let addresses: AddressMap = serde_json::from_str(&stdout).expect("json matches AddressMap schema");

    assert_eq!(addresses.len(), 4);
    assert_eq!(addresses[&Chain::Bitcoin].address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    assert_eq!(addresses[&Chain::Ethereum].address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    assert_eq!(addresses[&Chain::Bsc].address, addresses[&Chain::Ethereum].address);
}

#[test]
fn derive_accepts_unquoted_words_and_chain_filter() {
    let mut args = vec!["derive", "--chains", "btc"];
    args.extend(ABANDON.split(' '));
    let output = run(&args);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
    assert!(stdout.contains("m/44'/0'/0'/0/0"));
    assert!(!stdout.contains("0x9858"));
}

#[test]
fn derive_reads_mnemonic_from_stdin() {
    let assert = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("seedpath"))
        .env_remove("SEEDPATH_CHAINS")
        .args(["--json", "derive", "--chains", "ETH"])
        .write_stdin(format!("{}\n", ABANDON))
        .assert()
        .success();

    let json: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["ETH"]["address"], "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
}

#[test]
fn environment_sets_defaults_and_flags_override() {
    let output = seedpath()
        .env("SEEDPATH_CHAINS", "TRX")
        .env("SEEDPATH_INDEX", "4")
        .args(["--json", "derive", ABANDON])
        .output()
        .unwrap();
    let from_env = stdout_json(&output);
    assert_eq!(from_env.as_object().unwrap().len(), 1);

    let output = run(&["--json", "derive", "--chains", "TRX", "--index", "4", ABANDON]);
    assert_eq!(stdout_json(&output), from_env);

    let output = seedpath()
        .env("SEEDPATH_CHAINS", "TRX")
        .env("SEEDPATH_INDEX", "4")
        .args(["--json", "derive", "--index", "0", ABANDON])
        .output()
        .unwrap();
    assert_ne!(stdout_json(&output), from_env);
}

#[test]
fn invalid_mnemonic_fails_without_output() {
    let bad = ABANDON.replace("about", "abandon");
    let output = run(&["--json", "derive", &bad]);
    assert!(!output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "invalid_mnemonic");
    assert!(json.get("BTC").is_none());
}

#[test]
fn unsupported_chain_is_reported() {
    let output = run(&["derive", "--chains", "BTC,DOGE", ABANDON]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Unsupported chain: DOGE"));
}

#[test]
fn validate_sets_exit_status() {
    assert!(run(&["validate", ABANDON]).status.success());

    let output = run(&["--json", "validate", "abandon", "about"]);
    assert!(!output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["valid"], false);
    assert_eq!(json["word_count"], 2);
}

#[test]
fn generate_emits_valid_phrase() {
    let output = run(&["--json", "generate", "--words", "24"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let phrase = json["mnemonic"].as_str().unwrap();
    assert_eq!(phrase.split(' ').count(), 24);
    assert!(seedpath::validate_mnemonic(phrase));

    assert!(!run(&["generate", "--words", "13"]).status.success());
}

#[test]
fn keys_match_library_and_stay_out_of_stderr() {
    let output = run(&["--json", "--debug", "keys", "--chains", "BTC,ETH", ABANDON]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let expected = seedpath::derive_private_keys(ABANDON, 0, 0, &[Chain::Bitcoin, Chain::Ethereum]).unwrap();
    let btc = expected.get(Chain::Bitcoin).unwrap();
    assert_eq!(json["BTC"], btc);
    assert_eq!(json["ETH"], expected.get(Chain::Ethereum).unwrap());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(!stderr.contains(btc));
}

#[test]
fn wallet_validator_passes_on_known_phrase() {
    let document = serde_json::json!({
        "mnemonic": ABANDON,
        "addresses": seedpath::derive_addresses(ABANDON, 0, 0, &Chain::ALL).unwrap(),
    });

    let assert = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("wallet_validator"))
        .write_stdin(document.to_string())
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for chain in Chain::ALL {
        assert!(stdout.contains(&format!("{:<10} ✅ PASS", chain.symbol())), "{}", stdout);
    }
    assert!(stdout.contains("All derived addresses verified"));
}

#[test]
fn wallet_validator_fails_on_wrong_address() {
    let document = serde_json::json!({
        "mnemonic": ABANDON,
        "addresses": {
            "BTC": { "chain": "BTC", "address": "1Mu7g4SwL8A34Kpsrpt4cU8HN27UmmbeB8", "status": "derived" }
        },
    });

    let assert = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("wallet_validator"))
        .write_stdin(document.to_string())
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("❌ FAIL"));
}
