//! Known destination networks
//!
//! Same name → chain id table the contract deployments use. Lets
//! `ETH_NETWORK_NUMBER` be given as a name, and labels logs for known ids.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Ropsten,
    Kovan,
    Bsc,
    BscTestnet,
}

impl Network {
    pub const ALL: [Network; 5] = [
        Network::Mainnet,
        Network::Ropsten,
        Network::Kovan,
        Network::Bsc,
        Network::BscTestnet,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Kovan => 42,
            Network::Bsc => 56,
            Network::BscTestnet => 97,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Kovan => "kovan",
            Network::Bsc => "bsc",
            Network::BscTestnet => "bsc_testnet",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|n| n.name() == normalized)
            .ok_or_else(|| format!("Unknown network: {}", s))
    }
}

/// Resolve a chain id given either as a number or a known network name
pub fn resolve_chain_id(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    if let Ok(id) = trimmed.parse::<u64>() {
        if id == 0 {
            return Err("Chain id must be non-zero".to_string());
        }
        return Ok(id);
    }
    trimmed.parse::<Network>().map(|n| n.chain_id())
}
