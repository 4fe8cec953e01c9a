use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::builder::parse_address;
use crate::networks::{resolve_chain_id, Network};
use crate::relayer::{GasLimits, DEFAULT_MINT_GAS_LIMIT, DEFAULT_TRANSFER_OWNERSHIP_GAS_LIMIT};

/// Relayer configuration, read from the environment once at startup
#[derive(Clone)]
pub struct Config {
    /// BIP-39 phrase all identities are derived from
    pub mnemonic: String,
    /// Derivation index of the relaying identity
    pub relayer_index: u32,
    /// Derivation indexes of the authorization signers
    pub signer_indexes: Vec<u32>,
    pub rpc_url: String,
    /// Recipient used when a transfer's recipient is not a valid address
    pub donation_address: Address,
    pub chain_id: u64,
    pub rpc_timeout: Duration,
    pub gas_limits: GasLimits,
}

/// Custom Debug that redacts the mnemonic to prevent accidental log leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("mnemonic", &"<redacted>")
            .field("relayer_index", &self.relayer_index)
            .field("signer_indexes", &self.signer_indexes)
            .field("rpc_url", &self.rpc_url)
            .field("donation_address", &self.donation_address)
            .field("chain_id", &self.chain_id)
            .field("rpc_timeout", &self.rpc_timeout)
            .field("gas_limits", &self.gas_limits)
            .finish()
    }
}

fn default_rpc_timeout_ms() -> u64 {
    30_000
}

/// Parse `ETH_SIGNER_INDEXES`.
///
/// Blank entries are ignored and the relaying index is skipped (it never
/// signs authorizations). Anything non-numeric, or listed twice, is an error.
pub fn parse_signer_indexes(raw: &str, relayer_index: u32) -> Result<Vec<u32>> {
    let mut indexes = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let index: u32 = entry
            .parse()
            .map_err(|_| eyre!("Invalid signer index {:?} in ETH_SIGNER_INDEXES", entry))?;

        if index == relayer_index {
            warn!(
                index,
                "Skipping signer index equal to the relaying identity's index"
            );
            continue;
        }
        if indexes.contains(&index) {
            return Err(eyre!("Duplicate signer index {} in ETH_SIGNER_INDEXES", index));
        }
        indexes.push(index);
    }

    Ok(indexes)
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("{} environment variable is required", name))
}

fn optional_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| eyre!("{} has an invalid value: {:?}", name, value)),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    /// Loads .env file if present, then reads from environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let relayer_index: u32 = optional_parse("ETH_RELAYER_INDEX", 0)?;
        let signer_indexes = parse_signer_indexes(
            &env::var("ETH_SIGNER_INDEXES").unwrap_or_default(),
            relayer_index,
        )?;

        let donation_raw = required("ETH_DONATION")?;
        let donation_address = parse_address(donation_raw.trim())
            .ok_or_else(|| eyre!("ETH_DONATION must be a valid EVM address"))?;

        let chain_id = resolve_chain_id(&required("ETH_NETWORK_NUMBER")?)
            .map_err(|e| eyre!("ETH_NETWORK_NUMBER: {}", e))?;

        let config = Config {
            mnemonic: required("ETH_MNEMONIC")?.trim().to_string(),
            relayer_index,
            signer_indexes,
            rpc_url: required("ETH_URL")?.trim().to_string(),
            donation_address,
            chain_id,
            rpc_timeout: Duration::from_millis(optional_parse(
                "ETH_RPC_TIMEOUT_MS",
                default_rpc_timeout_ms(),
            )?),
            gas_limits: GasLimits {
                mint: optional_parse("ETH_MINT_GAS_LIMIT", DEFAULT_MINT_GAS_LIMIT)?,
                transfer_ownership: optional_parse(
                    "ETH_OWNERSHIP_GAS_LIMIT",
                    DEFAULT_TRANSFER_OWNERSHIP_GAS_LIMIT,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Known network name for the configured chain id
    pub fn network(&self) -> Option<Network> {
        Network::from_chain_id(self.chain_id)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        bip39::Mnemonic::parse_normalized(&self.mnemonic)
            .map_err(|e| eyre!("ETH_MNEMONIC is not a valid BIP-39 phrase: {}", e))?;

        if self.rpc_url.is_empty() {
            return Err(eyre!("ETH_URL cannot be empty"));
        }
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(eyre!("ETH_URL must be an http(s) URL"));
        }

        if self.donation_address == Address::ZERO {
            return Err(eyre!("ETH_DONATION cannot be the zero address"));
        }

        if self.chain_id == 0 {
            return Err(eyre!("ETH_NETWORK_NUMBER must be non-zero"));
        }

        if self.rpc_timeout.is_zero() {
            return Err(eyre!("ETH_RPC_TIMEOUT_MS must be greater than zero"));
        }

        if self.gas_limits.mint < 21_000 || self.gas_limits.transfer_ownership < 21_000 {
            return Err(eyre!("Gas limits must be at least 21000"));
        }

        if self.signer_indexes.is_empty() {
            warn!("No authorization signers configured; multi-sig mints will carry no signatures");
        }

        Ok(())
    }
}
