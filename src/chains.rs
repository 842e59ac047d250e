use std::fmt;

use crate::{engine::ChainPolicy, error::GasOracleError};

/// Chains the oracle serves. The id values are the canonical EVM chain
/// ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SupportedChain {
    Mainnet,
    Optimism,
    Polygon,
    ArbitrumOne,
}

impl SupportedChain {
    pub const ALL: [SupportedChain; 4] = [
        SupportedChain::Mainnet,
        SupportedChain::Optimism,
        SupportedChain::Polygon,
        SupportedChain::ArbitrumOne,
    ];

    pub fn id(self) -> u64 {
        match self {
            SupportedChain::Mainnet => 1,
            SupportedChain::Optimism => 10,
            SupportedChain::Polygon => 137,
            SupportedChain::ArbitrumOne => 42161,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SupportedChain::Mainnet => "ethereum",
            SupportedChain::Optimism => "optimism",
            SupportedChain::Polygon => "polygon",
            SupportedChain::ArbitrumOne => "arbitrum-one",
        }
    }

    pub fn native_currency(self) -> &'static str {
        match self {
            SupportedChain::Polygon => "MATIC",
            _ => "ETH",
        }
    }

    /// Chains priced through the EIP-1559 suggestion engine. Optimism
    /// and Arbitrum quote legacy gas prices plus their own surcharges.
    pub fn is_eip1559(self) -> bool {
        matches!(self, SupportedChain::Mainnet | SupportedChain::Polygon)
    }

    /// Engine knobs for this chain. Polygon rewards are too variable for
    /// outlier detection, and the gwei tier bounds are mainnet-only.
    pub fn fee_policy(self) -> ChainPolicy {
        match self {
            SupportedChain::Polygon => ChainPolicy {
                skip_outlier_filter: true,
                exempt_from_priority_bounds: true,
            },
            _ => ChainPolicy::default(),
        }
    }

    pub fn infura_subdomain(self) -> &'static str {
        match self {
            SupportedChain::Mainnet => "mainnet",
            SupportedChain::Optimism => "optimism-mainnet",
            SupportedChain::Polygon => "polygon-mainnet",
            SupportedChain::ArbitrumOne => "arbitrum-mainnet",
        }
    }
}

impl TryFrom<u64> for SupportedChain {
    type Error = GasOracleError;

    fn try_from(chain_id: u64) -> Result<Self, Self::Error> {
        match chain_id {
            1 => Ok(SupportedChain::Mainnet),
            10 => Ok(SupportedChain::Optimism),
            137 => Ok(SupportedChain::Polygon),
            42161 => Ok(SupportedChain::ArbitrumOne),
            other => Err(GasOracleError::UnsupportedChain(other)),
        }
    }
}

impl fmt::Display for SupportedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
