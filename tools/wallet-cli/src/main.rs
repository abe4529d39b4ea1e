use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use wallet_core::{
    build_and_sign, default_derivation_path, derive_btc_address, generate_mnemonic, init_logging,
    portfolio, refresh_wallets, send, BtcNetwork, ChainDataGateway, CostBasisMethod,
    DerivedAddress, FlatPrice, Freshness, GatewayConfig, RefreshReport, SendRequest,
    WalletRecord,
};

#[derive(Debug, Parser)]
#[command(name = "wallet-cli", about = "Bitcoin wallet core CLI")]
struct Cli {
    /// mainnet or testnet
    #[arg(long, global = true, default_value = "mainnet")]
    network: BtcNetwork,

    /// Gateway settings (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a new mnemonic and its first address
    Generate {
        /// 12, 15, 18, 21 or 24
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    /// Derive an address from a mnemonic read on stdin
    Derive {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 0)]
        account: u32,
        #[arg(long, default_value_t = 0)]
        index: u32,
    },
    Balance {
        address: String,
    },
    History {
        address: String,
    },
    Utxos {
        address: String,
    },
    Fees,
    /// Build and sign a transaction; mnemonic read on stdin
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// BTC
        #[arg(long)]
        amount: f64,
        /// sat/vB; defaults to the half-hour estimate
        #[arg(long)]
        fee_rate: Option<f64>,
        #[arg(long)]
        path: Option<String>,
        /// Submit the signed transaction instead of printing it
        #[arg(long)]
        broadcast: bool,
    },
    /// Cost basis summary from on-chain history at a flat price
    Portfolio {
        address: String,
        /// USD per BTC
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "fifo")]
        method: CostBasisMethod,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GatewayConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(GatewayConfig::from_toml_str(&text)?)
        }
        None => Ok(GatewayConfig::default()),
    }
}

fn read_mnemonic() -> anyhow::Result<SecretString> {
    eprintln!("Enter mnemonic:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    if line.trim().is_empty() {
        bail!("no mnemonic on stdin");
    }
    Ok(SecretString::from(line))
}

/// Refuse to report on defaults; warn when the data is stale.
fn require_chain_data(reports: &[RefreshReport]) -> anyhow::Result<()> {
    for report in reports {
        match report.freshness {
            Freshness::Fallback => bail!("no chain data provider answered; refusing to report"),
            Freshness::Stale => {
                tracing::warn!(wallet = %report.wallet_id, "providers unreachable, using stale data")
            }
            Freshness::Live | Freshness::Cached => {}
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let network = cli.network;
    let config = load_config(cli.config.as_ref())?;
    let gateway = || ChainDataGateway::from_config(network, &config);

    match cli.command {
        Commands::Generate { words } => {
            let phrase = generate_mnemonic(words * 32 / 3)?;
            let path = default_derivation_path(network, 0, 0);
            let derived = derive_btc_address(&phrase, &path, network)?;
            eprintln!("Write this phrase down. It is not stored anywhere.");
            println!("{}", &*phrase);
            print_json(&derived)?;
        }
        Commands::Derive { path, account, index } => {
            let mnemonic = read_mnemonic()?;
            let path = path.unwrap_or_else(|| default_derivation_path(network, account, index));
            let derived = derive_btc_address(mnemonic.expose_secret(), &path, network)?;
            print_json(&derived)?;
        }
        Commands::Balance { address } => {
            let fetched = gateway()?.get_balance(&address).await;
            tracing::debug!(freshness = ?fetched.freshness, "balance");
            print_json(&fetched.value)?;
        }
        Commands::History { address } => {
            print_json(&gateway()?.get_transactions(&address).await.value)?;
        }
        Commands::Utxos { address } => {
            print_json(&gateway()?.get_utxos(&address).await.value)?;
        }
        Commands::Fees => {
            print_json(&gateway()?.get_fee_estimates().await.value)?;
        }
        Commands::Send { from, to, amount, fee_rate, path, broadcast } => {
            let gateway = gateway()?;
            let fee_rate = match fee_rate {
                Some(rate) => rate,
                None => gateway.get_fee_estimates().await.value.half_hour,
            };
            let request = SendRequest {
                mnemonic: read_mnemonic()?,
                derivation_path: path.unwrap_or_else(|| default_derivation_path(network, 0, 0)),
                source_address: from,
                destination: to,
                amount_btc: amount,
                fee_rate,
            };
            if broadcast {
                print_json(&send(&gateway, &request).await?)?;
            } else {
                print_json(&build_and_sign(&gateway, &request).await?)?;
            }
        }
        Commands::Portfolio { address, price, method } => {
            if !price.is_finite() || price < 0.0 {
                bail!("price must be a non-negative number");
            }
            let gateway = gateway()?;
            let mut record = WalletRecord::new(
                "portfolio",
                DerivedAddress {
                    network,
                    address,
                    derivation_path: String::new(),
                },
            );
            let reports = refresh_wallets(&gateway, std::slice::from_mut(&mut record)).await;
            require_chain_data(&reports)?;
            let (_, summary) = portfolio(&mut record, method, &FlatPrice(price), price)?;
            print_json(&summary)?;
        }
    }
    Ok(())
}
