use std::sync::Arc;
use std::time::Duration;

use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256,
};
use moka::future::Cache;

use crate::{
    chains::SupportedChain,
    engine,
    error::GasOracleError,
    models::{FeeResponse, FeeSuggestion, FeeTiers},
    services::EthereumService,
};

/// Multiplier applied to the node's gas estimate before pricing.
const GAS_LIMIT_INFLATION: (u64, u64) = (6, 5);

/// Tier multipliers for chains priced with a legacy gas price.
const GAS_FAST_MULTIPLIER: (u64, u64) = (5, 4);
const GAS_URGENT_MULTIPLIER: (u64, u64) = (3, 2);

// L1 data-fee parameters fixed by the Optimism gas-price oracle.
const OP_FIXED_OVERHEAD: u64 = 2100;
const OP_DYNAMIC_OVERHEAD: u64 = 1;
/// Calldata allowance for the signature fields of the eventual signed
/// transaction (68 bytes charged at the nonzero rate). Opaque
/// calibration constant from the upstream oracle formula.
const OP_SIGNED_TX_GAS: u64 = 68 * 16;

const CALLDATA_ZERO_BYTE_GAS: u64 = 4;
const CALLDATA_NONZERO_BYTE_GAS: u64 = 16;

/// A fee-calculation request parsed from the HTTP layer.
#[derive(Debug, Clone)]
pub struct GasFeeRequest {
    pub chain: SupportedChain,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub data: Option<Bytes>,
}

impl GasFeeRequest {
    fn to_transaction(&self) -> TypedTransaction {
        let mut tx = TransactionRequest::new();
        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        if let Some(to) = self.to {
            tx = tx.to(to);
        }
        if let Some(value) = self.value {
            tx = tx.value(value);
        }
        if let Some(data) = &self.data {
            tx = tx.data(data.clone());
        }
        tx.into()
    }
}

/// Per-chain fee calculation on top of the suggestion engine.
pub struct GasFeeService {
    ethereum: Arc<EthereumService>,
    suggestions: Cache<SupportedChain, FeeSuggestion>,
}

impl GasFeeService {
    pub fn new(ethereum: Arc<EthereumService>, suggestion_ttl: Duration) -> Self {
        let suggestions = Cache::builder()
            .max_capacity(SupportedChain::ALL.len() as u64)
            .time_to_live(suggestion_ttl)
            .build();
        Self {
            ethereum,
            suggestions,
        }
    }

    pub async fn calculate(&self, request: &GasFeeRequest) -> Result<FeeResponse, GasOracleError> {
        match request.chain {
            chain if chain.is_eip1559() => self.calculate_eip1559(request).await,
            SupportedChain::Optimism => self.calculate_optimism(request).await,
            _ => self.calculate_arbitrum(request).await,
        }
    }

    /// Runs the suggestion engine for a chain, serving from the
    /// short-TTL cache when a fresh suggestion exists.
    pub async fn suggest_fees(
        &self,
        chain: SupportedChain,
    ) -> Result<FeeSuggestion, GasOracleError> {
        if let Some(cached) = self.suggestions.get(&chain).await {
            tracing::debug!(%chain, "Returning cached fee suggestion");
            return Ok(cached);
        }

        let suggestion = engine::suggest_fees(self.ethereum.client(chain), chain.fee_policy()).await?;
        self.suggestions.insert(chain, suggestion.clone()).await;

        tracing::info!(
            %chain,
            base_fee_suggestion = %suggestion.base_fee_suggestion,
            trend = ?suggestion.base_fee_trend,
            "Computed fee suggestion"
        );

        Ok(suggestion)
    }

    async fn calculate_eip1559(
        &self,
        request: &GasFeeRequest,
    ) -> Result<FeeResponse, GasOracleError> {
        let chain = request.chain;
        let base_gas_limit = self
            .ethereum
            .estimate_gas(chain, &request.to_transaction())
            .await?;
        let gas_limit = inflate_gas_limit(base_gas_limit);

        let suggestion = self.suggest_fees(chain).await?;
        let base_fee = suggestion.base_fee_suggestion;
        let tiers = suggestion.priority_fee_suggestions;

        Ok(FeeResponse::Eip1559 {
            gas_limit,
            gas_fee: FeeTiers {
                normal: (base_fee + tiers.normal) * gas_limit,
                fast: (base_fee + tiers.fast) * gas_limit,
                urgent: (base_fee + tiers.urgent) * gas_limit,
            },
            max_base_fee_per_gas: base_fee,
            max_priority_fee_per_gas: tiers,
        })
    }

    async fn calculate_optimism(
        &self,
        request: &GasFeeRequest,
    ) -> Result<FeeResponse, GasOracleError> {
        let chain = SupportedChain::Optimism;
        let base_gas_limit = self
            .ethereum
            .estimate_gas(chain, &request.to_transaction())
            .await?;
        let gas_limit = inflate_gas_limit(base_gas_limit);
        let gas_price = self.ethereum.gas_price(chain).await?;

        let l1_data_fee = self.optimism_l1_data_fee(request.data.as_ref()).await?;
        let l2_execution_fee = gas_price * gas_limit;

        Ok(legacy_response(
            gas_limit,
            gas_price,
            l1_data_fee + l2_execution_fee,
        ))
    }

    async fn calculate_arbitrum(
        &self,
        request: &GasFeeRequest,
    ) -> Result<FeeResponse, GasOracleError> {
        let chain = SupportedChain::ArbitrumOne;
        let base_gas_limit = self
            .ethereum
            .estimate_gas(chain, &request.to_transaction())
            .await?;
        let gas_limit = inflate_gas_limit(base_gas_limit);
        let gas_price = self.ethereum.gas_price(chain).await?;

        Ok(legacy_response(gas_limit, gas_price, gas_limit * gas_price))
    }

    /// Rollup calldata is paid for at L1 prices, so the surcharge uses
    /// the mainnet gas price, not Optimism's.
    async fn optimism_l1_data_fee(&self, data: Option<&Bytes>) -> Result<U256, GasOracleError> {
        let mainnet_gas_price = self.ethereum.gas_price(SupportedChain::Mainnet).await?;
        Ok(optimism_data_gas(data) * mainnet_gas_price * U256::from(OP_DYNAMIC_OVERHEAD))
    }
}

fn inflate_gas_limit(gas_limit: U256) -> U256 {
    scale(gas_limit, GAS_LIMIT_INFLATION)
}

fn scale(value: U256, (numerator, denominator): (u64, u64)) -> U256 {
    value * U256::from(numerator) / U256::from(denominator)
}

fn legacy_response(gas_limit: U256, gas_price: U256, base_gas_fee: U256) -> FeeResponse {
    FeeResponse::Legacy {
        gas_limit,
        gas_fee: FeeTiers {
            normal: base_gas_fee,
            fast: scale(base_gas_fee, GAS_FAST_MULTIPLIER),
            urgent: scale(base_gas_fee, GAS_URGENT_MULTIPLIER),
        },
        gas_price: FeeTiers {
            normal: gas_price,
            fast: scale(gas_price, GAS_FAST_MULTIPLIER),
            urgent: scale(gas_price, GAS_URGENT_MULTIPLIER),
        },
    }
}

/// Gas charged for posting calldata to L1: 4 per zero byte, 16 per
/// nonzero byte, plus the oracle's fixed overheads. No calldata means no
/// data fee at all.
fn optimism_data_gas(data: Option<&Bytes>) -> U256 {
    let Some(data) = data.filter(|data| !data.is_empty()) else {
        return U256::zero();
    };

    let byte_gas: u64 = data
        .iter()
        .map(|byte| {
            if *byte == 0 {
                CALLDATA_ZERO_BYTE_GAS
            } else {
                CALLDATA_NONZERO_BYTE_GAS
            }
        })
        .sum();

    U256::from(OP_FIXED_OVERHEAD + byte_gas + OP_SIGNED_TX_GAS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_gas_is_zero_without_calldata() {
        assert_eq!(optimism_data_gas(None), U256::zero());
        assert_eq!(optimism_data_gas(Some(&Bytes::new())), U256::zero());
    }

    #[test]
    fn data_gas_counts_zero_and_nonzero_bytes() {
        let data = Bytes::from(vec![0x00, 0x00, 0x01, 0xff]);
        // 2 zero bytes + 2 nonzero bytes + fixed overhead + signature allowance
        let expected = 2 * 4 + 2 * 16 + OP_FIXED_OVERHEAD + OP_SIGNED_TX_GAS;
        assert_eq!(optimism_data_gas(Some(&data)), U256::from(expected));
    }

    #[test]
    fn gas_limit_inflation() {
        assert_eq!(inflate_gas_limit(U256::from(100_000u64)), U256::from(120_000u64));
    }

    #[test]
    fn legacy_tiers_scale_fee_and_price() {
        let response = legacy_response(
            U256::from(21_000u64),
            U256::from(100u64),
            U256::from(2_100_000u64),
        );
        let FeeResponse::Legacy {
            gas_limit,
            gas_fee,
            gas_price,
        } = response
        else {
            panic!("expected a legacy response");
        };
        assert_eq!(gas_limit, U256::from(21_000u64));
        assert_eq!(gas_fee.normal, U256::from(2_100_000u64));
        assert_eq!(gas_fee.fast, U256::from(2_625_000u64));
        assert_eq!(gas_fee.urgent, U256::from(3_150_000u64));
        assert_eq!(gas_price.fast, U256::from(125u64));
        assert_eq!(gas_price.urgent, U256::from(150u64));
    }

    #[test]
    fn request_builds_a_transaction() {
        let request = GasFeeRequest {
            chain: SupportedChain::Mainnet,
            from: Some(Address::zero()),
            to: Some(Address::repeat_byte(0x11)),
            value: Some(U256::from(1_000u64)),
            data: Some(Bytes::from(vec![0xde, 0xad])),
        };
        let tx = request.to_transaction();
        assert_eq!(tx.value(), Some(&U256::from(1_000u64)));
        assert!(tx.to().is_some());
        assert!(tx.data().is_some());
    }
}
