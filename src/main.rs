use std::io::{IsTerminal, Read};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use zeroize::Zeroizing;

use seedpath::utils::logging;
use seedpath::wallet::{self, change, Bip44Deriver, DerivationPath};
use seedpath::{log_warn, parse_chain_list, ApiResponse, DeriverConfig, WalletError, WalletResult};

#[derive(Parser)]
#[command(name = "seedpath", version)]
#[command(about = "BIP-39 / BIP-44 address derivation for BTC, ETH, BSC and TRX")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new mnemonic from OS randomness
    Generate {
        /// Number of words: 12, 15, 18, 21 or 24
        #[arg(short, long, default_value_t = 12)]
        words: usize,
    },
    /// Check a mnemonic's words and checksum
    Validate {
        /// Mnemonic words; read from stdin when omitted
        mnemonic: Vec<String>,
    },
    /// Derive addresses
    Derive(DeriveArgs),
    /// Derive raw private keys (hex). Handle the output with care.
    Keys(DeriveArgs),
}

#[derive(Args)]
struct DeriveArgs {
    /// Mnemonic words; read from stdin when omitted
    mnemonic: Vec<String>,

    /// BIP-44 account (overrides SEEDPATH_ACCOUNT)
    #[arg(short, long)]
    account: Option<u32>,

    /// Address index (overrides SEEDPATH_INDEX)
    #[arg(short, long)]
    index: Option<u32>,

    /// Comma separated chains, e.g. BTC,TRX (overrides SEEDPATH_CHAINS)
    #[arg(short, long, value_name = "LIST")]
    chains: Option<String>,

    /// BIP-39 passphrase (overrides SEEDPATH_PASSPHRASE)
    #[arg(long)]
    passphrase: Option<String>,

    /// Use the internal (change) branch instead of the external one
    #[arg(long)]
    internal: bool,
}

impl DeriveArgs {
    /// Environment defaults overlaid with command-line flags
    fn config(&self) -> WalletResult<DeriverConfig> {
        let mut config = DeriverConfig::from_env()?;
        if let Some(account) = self.account {
            config.account = account;
        }
        if let Some(index) = self.index {
            config.address_index = index;
        }
        if let Some(list) = &self.chains {
            config.chains = parse_chain_list(list)?;
        }
        if let Some(passphrase) = &self.passphrase {
            config.passphrase = Zeroizing::new(passphrase.clone());
        }
        config.validate()?;
        Ok(config)
    }

    fn deriver(&self, config: &DeriverConfig) -> Bip44Deriver {
        Bip44Deriver::from_config(config).with_change(self.branch())
    }

    fn branch(&self) -> u32 {
        if self.internal {
            change::INTERNAL
        } else {
            change::EXTERNAL
        }
    }
}

#[derive(Serialize)]
struct ValidationOutput {
    valid: bool,
    word_count: usize,
    reason: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug_from_env = DeriverConfig::from_env().map(|c| c.debug_logging).unwrap_or(false);
    if cli.debug || debug_from_env {
        logging::enable_debug();
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                println!("{}", ApiResponse::<()>::err(e).to_json());
            } else {
                eprintln!("error: {}", e.message);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> WalletResult<ExitCode> {
    match &cli.command {
        Command::Generate { words } => {
            let phrase = wallet::generate_mnemonic(*words)?;
            if cli.json {
                print_json(&serde_json::json!({ "mnemonic": phrase.as_str() }))?;
            } else {
                println!("{}", phrase.as_str());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { mnemonic } => {
            let phrase = read_mnemonic(mnemonic)?;
            let output = match wallet::parse_mnemonic(&phrase) {
                Ok(validated) => ValidationOutput {
                    valid: true,
                    word_count: validated.word_count(),
                    reason: None,
                },
                Err(e) => ValidationOutput {
                    valid: false,
                    word_count: phrase.split_whitespace().count(),
                    reason: Some(e.to_string()),
                },
            };

            if cli.json {
                print_json(&output)?;
            } else if output.valid {
                println!("valid ({} words)", output.word_count);
            } else {
                println!("invalid: {}", output.reason.as_deref().unwrap_or("unknown"));
            }
            Ok(if output.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Derive(args) => {
            let config = args.config()?;
            let phrase = read_mnemonic(&args.mnemonic)?;
            let addresses = args.deriver(&config).try_derive_addresses(
                &phrase,
                config.account,
                config.address_index,
                &config.chains,
            )?;

            if cli.json {
                print_json(&addresses)?;
            } else {
                for (chain, address) in &addresses {
                    let path = DerivationPath::bip44(chain.coin_type(), config.account, args.branch(), config.address_index);
                    println!("{:<4} {:<42} {}", chain.symbol(), address.address, path);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Keys(args) => {
            let config = args.config()?;
            let phrase = read_mnemonic(&args.mnemonic)?;
            let keys = args.deriver(&config).try_derive_private_keys(
                &phrase,
                config.account,
                config.address_index,
                &config.chains,
            )?;

            if std::io::stdout().is_terminal() {
                log_warn!("cli", "Printing raw private keys to the terminal");
            }

            if cli.json {
                print_json(&keys)?;
            } else {
                for (chain, key) in keys.iter() {
                    println!("{:<4} {}", chain.symbol(), key);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Mnemonic from positional words, or from stdin when none were given
fn read_mnemonic(words: &[String]) -> WalletResult<Zeroizing<String>> {
    if !words.is_empty() {
        return Ok(Zeroizing::new(words.join(" ")));
    }

    let mut input = Zeroizing::new(String::new());
    std::io::stdin().read_to_string(&mut *input)?;
    if input.trim().is_empty() {
        return Err(WalletError::invalid_input("No mnemonic given (pass words as arguments or on stdin)"));
    }
    Ok(input)
}

fn print_json<T: Serialize>(value: &T) -> WalletResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
