//! Bridge Relayer CLI
//!
//! Single-shot commands over the relayer library. An external scheduler
//! drives relays by calling these and persisting the printed records.

use alloy::primitives::{Address, B256};
use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

use bridge_relayer::builder::parse_address;
use bridge_relayer::{
    metrics, ChainClient, Config, EvmChainClient, RelayContext, RelayRecord, Relayer,
    SignerIdentitySet, TransferIntent,
};

#[derive(Parser)]
#[command(name = "bridge-relayer")]
#[command(about = "Relay source-chain transfers as wrapped token mints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env file
    #[arg(long, global = true, default_value = ".env")]
    env_file: String,

    /// Print Prometheus metrics after the command completes
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the relaying address and the ordered authorization signers
    Signers,

    /// Show the relaying identity's pending nonce
    Nonce,

    /// Show the destination chain's current gas price
    GasPrice,

    /// Build and sign the mint transaction for a transfer
    Build {
        /// Transfer intent as JSON, or @path to a JSON file
        #[arg(long)]
        intent: String,

        /// Minter contract nonce (multi-sig path only)
        #[arg(long, default_value_t = 0)]
        minter_nonce: u64,

        /// Transaction nonce; defaults to the pending nonce
        #[arg(long)]
        nonce: Option<u64>,

        /// Gas price in wei; defaults to the node's gas price
        #[arg(long)]
        gas_price: Option<u128>,

        /// Broadcast the record after building it
        #[arg(long)]
        send: bool,
    },

    /// Build and sign transferOwnership on a wrapped token
    TransferOwnership {
        #[arg(long)]
        new_owner: String,

        #[arg(long)]
        token: String,

        #[arg(long)]
        nonce: Option<u64>,

        #[arg(long)]
        gas_price: Option<u128>,

        #[arg(long)]
        send: bool,
    },

    /// Re-sign a record at a higher gas price (same nonce)
    Bump {
        /// Relay record as JSON, or @path to a JSON file
        #[arg(long)]
        record: String,

        /// Target gas price in wei
        #[arg(long)]
        gas_price: u128,

        #[arg(long)]
        send: bool,
    },

    /// Broadcast a signed record
    Relay {
        #[arg(long)]
        record: String,
    },

    /// Look up a transaction by hash
    Tx { hash: B256 },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load_from_file(&cli.env_file)?;
    tracing::info!(
        chain_id = config.chain_id,
        network = ?config.network(),
        signers = config.signer_indexes.len(),
        "Configuration loaded"
    );

    let identities = SignerIdentitySet::from_mnemonic(
        &config.mnemonic,
        config.relayer_index,
        &config.signer_indexes,
    )?;

    let client = Arc::new(EvmChainClient::new(
        &config.rpc_url,
        config.chain_id,
        &identities,
        config.rpc_timeout,
    )?);
    let context = Arc::new(RelayContext::new(
        identities,
        config.donation_address,
        config.chain_id,
        config.gas_limits,
    ));
    let relayer = Relayer::new(context, client);

    match cli.command {
        Commands::Signers => {
            print_json(&SignersView::from(relayer.context().identities()))?;
        }
        Commands::Nonce => {
            println!("{}", relayer.load_nonce().await?);
        }
        Commands::GasPrice => {
            println!("{}", relayer.get_gas_price().await?);
        }
        Commands::Build {
            intent,
            minter_nonce,
            nonce,
            gas_price,
            send,
        } => {
            let intent: TransferIntent = read_json(&intent).wrap_err("Invalid transfer intent")?;
            let nonce = match nonce {
                Some(n) => n,
                None => relayer.load_nonce().await?,
            };
            let gas_price = match gas_price {
                Some(p) => p,
                None => relayer.get_gas_price().await?,
            };

            let record = relayer.build(&intent, nonce, minter_nonce, gas_price).await?;
            emit(&relayer, record, send, &mut std::io::stdout()).await?;
        }
        Commands::TransferOwnership {
            new_owner,
            token,
            nonce,
            gas_price,
            send,
        } => {
            let new_owner = address_arg("new-owner", &new_owner)?;
            let token = address_arg("token", &token)?;
            let nonce = match nonce {
                Some(n) => n,
                None => relayer.load_nonce().await?,
            };
            let gas_price = match gas_price {
                Some(p) => p,
                None => relayer.get_gas_price().await?,
            };

            let record = relayer
                .transfer_ownership(new_owner, token, nonce, gas_price)
                .await?;
            emit(&relayer, record, send, &mut std::io::stdout()).await?;
        }
        Commands::Bump {
            record,
            gas_price,
            send,
        } => {
            let record: RelayRecord = read_json(&record).wrap_err("Invalid relay record")?;
            let record = relayer.increase_gas_price(record, gas_price).await?;
            emit(&relayer, record, send, &mut std::io::stdout()).await?;
        }
        Commands::Relay { record } => {
            let record: RelayRecord = read_json(&record).wrap_err("Invalid relay record")?;
            let hash = relayer.relay(&record).await?;
            println!("{}", hash);
        }
        Commands::Tx { hash } => match relayer.get_transaction(hash).await? {
            Some(tx) => print_json(&tx)?,
            None => println!("null"),
        },
    }

    finish(cli.metrics)
}

/// Print the record, then broadcast it when asked.
///
/// The record is written before broadcasting so a rejected send still leaves
/// the caller something to bump at the same nonce.
async fn emit<C: ChainClient, W: Write>(
    relayer: &Relayer<C>,
    record: RelayRecord,
    send: bool,
    out: &mut W,
) -> Result<()> {
    write_json(out, &record)?;
    if send {
        relayer.relay(&record).await?;
    }
    Ok(())
}

fn finish(print_metrics: bool) -> Result<()> {
    if print_metrics {
        eprint!("{}", metrics::gather_text());
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignersView {
    relayer: Address,
    signers: Vec<Address>,
}

impl From<&SignerIdentitySet> for SignersView {
    fn from(identities: &SignerIdentitySet) -> Self {
        Self {
            relayer: identities.relayer_address(),
            signers: identities.authorization().addresses(),
        }
    }
}

/// Inline JSON, or `@path` to read it from a file
fn read_json<T: DeserializeOwned>(arg: &str) -> Result<T> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path))?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    write_json(&mut std::io::stdout(), value)
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    out.flush()?;
    Ok(())
}

fn address_arg(name: &str, value: &str) -> Result<Address> {
    parse_address(value).ok_or_else(|| eyre!("--{} is not a valid address: {}", name, value))
}

/// Initialize tracing/logging with structured output
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bridge_relayer=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    }
}
