//! Fee-estimation engine.
//!
//! Turns a window of historical per-block fee data into a forward-looking
//! base-fee suggestion, tiered priority-fee suggestions, and a
//! confirmation-latency table. The engine never touches the network: data
//! arrives through [`FeeHistoryProvider`], every computation is a pure
//! function of its inputs, and nothing is cached or persisted here.

pub mod base_fee;
pub mod math;
pub mod outliers;
pub mod priority_fee;
pub mod trend;

use async_trait::async_trait;

use crate::{
    error::GasOracleError,
    models::{FeeHistory, FeeSuggestion},
};

// Calibration constants. None of these are derived; they are tuning
// knobs validated against mainnet behavior.

/// Cumulative-weight window sampled by the base-fee suggester.
pub const SAMPLE_MIN_PERCENTILE: f64 = 0.1;
pub const SAMPLE_MAX_PERCENTILE: f64 = 0.3;

/// Largest exponential-decay horizon tried by the base-fee suggester.
pub const MAX_TIME_FACTOR: usize = 15;

/// Safety headroom applied to the final base-fee suggestion.
pub const SUGGESTED_MAX_FEE_MULTIPLIER: f64 = 1.2;

/// Rewards above this many gwei at the 10th percentile mark a block as
/// an outlier.
pub const GWEI_REWARD_OUTLIER_THRESHOLD: f64 = 5.0;

/// Per-tier priority-fee bounds in gwei, calibrated for mainnet.
pub const MIN_GWEI_NORMAL_PRI_FEE: f64 = 1.0;
pub const MAX_GWEI_NORMAL_PRI_FEE: f64 = 4.0;
pub const MIN_GWEI_FAST_PRI_FEE: f64 = 1.5;
pub const MAX_GWEI_FAST_PRI_FEE: f64 = 6.0;
pub const MIN_GWEI_URGENT_PRI_FEE: f64 = 2.0;
pub const MAX_GWEI_URGENT_PRI_FEE: f64 = 9.0;

/// Slope-to-current-fee ratio (in percent) under which the base-fee
/// trend reads as flat.
pub const TREND_FLAT_THRESHOLD_PCT: f64 = 0.75;

/// Lookback depths for the two history fetches.
pub const BASE_FEE_BLOCK_COUNT: u64 = 100;
pub const PRIORITY_FEE_BLOCK_COUNT: u64 = 10;

/// Percentile cuts requested for per-block rewards.
pub const REWARD_PERCENTILES: [f64; 4] = [10.0, 25.0, 50.0, 75.0];

/// Confirmation latencies reported in the fee table, in seconds.
pub const CONFIRMATION_SECONDS: [u32; 4] = [15, 30, 45, 60];

/// Per-chain knobs for the priority-fee suggester.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainPolicy {
    /// Reward variance is so high that no block counts as an outlier.
    pub skip_outlier_filter: bool,
    /// The fixed gwei tier bounds do not apply on this chain.
    pub exempt_from_priority_bounds: bool,
}

/// Source of `eth_feeHistory` windows. The engine's only seam to the
/// outside world; implemented by the RPC layer and by test doubles.
#[async_trait]
pub trait FeeHistoryProvider: Send + Sync {
    async fn fee_history(
        &self,
        block_count: u64,
        reward_percentiles: &[f64],
    ) -> Result<FeeHistory, GasOracleError>;
}

/// Fetches the two history windows concurrently, runs both suggesters,
/// and merges their results. Pure composition, no partial results: if
/// either half fails the whole suggestion fails.
pub async fn suggest_fees(
    provider: &impl FeeHistoryProvider,
    policy: ChainPolicy,
) -> Result<FeeSuggestion, GasOracleError> {
    let max_base_fee = async {
        let history = provider.fee_history(BASE_FEE_BLOCK_COUNT, &[]).await?;
        base_fee::suggest_max_base_fee(&history)
    };
    let max_priority_fee = async {
        let history = provider
            .fee_history(PRIORITY_FEE_BLOCK_COUNT, &REWARD_PERCENTILES)
            .await?;
        priority_fee::suggest_max_priority_fee(&history.reward, policy)
    };

    let (max_base_fee, max_priority_fee) = futures::try_join!(max_base_fee, max_priority_fee)?;

    Ok(FeeSuggestion {
        current_base_fee: max_base_fee.current_base_fee,
        base_fee_suggestion: max_base_fee.base_fee_suggestion,
        base_fee_trend: max_base_fee.base_fee_trend,
        priority_fee_suggestions: max_priority_fee.priority_fee_suggestions,
        confirmation_seconds_to_priority_fee: max_priority_fee.confirmation_seconds_to_priority_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    fn gwei(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000_000u64)
    }

    /// Canned-response provider: serves one window for the base-fee
    /// fetch (no percentiles) and another for the reward fetch.
    struct MockFeeHistoryProvider {
        base_window: FeeHistory,
        reward_window: FeeHistory,
    }

    impl MockFeeHistoryProvider {
        fn healthy() -> Self {
            let base_window = FeeHistory {
                base_fee_per_gas: (0..101).map(|i| gwei(30 + i % 7)).collect(),
                gas_used_ratio: vec![0.5; 100],
                reward: Vec::new(),
            };
            let reward_window = FeeHistory {
                base_fee_per_gas: (0..11).map(|i| gwei(30 + i % 7)).collect(),
                gas_used_ratio: vec![0.5; 10],
                reward: (0..10)
                    .map(|_| vec![gwei(1), gwei(2), gwei(3), gwei(4)])
                    .collect(),
            };
            Self {
                base_window,
                reward_window,
            }
        }
    }

    #[async_trait]
    impl FeeHistoryProvider for MockFeeHistoryProvider {
        async fn fee_history(
            &self,
            _block_count: u64,
            reward_percentiles: &[f64],
        ) -> Result<FeeHistory, GasOracleError> {
            if reward_percentiles.is_empty() {
                Ok(self.base_window.clone())
            } else {
                Ok(self.reward_window.clone())
            }
        }
    }

    #[tokio::test]
    async fn facade_merges_both_halves() {
        let provider = MockFeeHistoryProvider::healthy();
        let suggestion = suggest_fees(&provider, ChainPolicy::default()).await.unwrap();

        assert_eq!(suggestion.current_base_fee, gwei(30 + 100 % 7));
        assert!(suggestion.base_fee_suggestion > U256::zero());
        assert!(suggestion.priority_fee_suggestions.urgent >= suggestion.priority_fee_suggestions.normal);

        let table = &suggestion.confirmation_seconds_to_priority_fee;
        assert_eq!(table.len(), CONFIRMATION_SECONDS.len());
        assert!(table[&15] >= table[&60]);
    }

    #[tokio::test]
    async fn facade_fails_when_either_half_fails() {
        let mut provider = MockFeeHistoryProvider::healthy();
        provider.reward_window.reward.clear();

        let err = suggest_fees(&provider, ChainPolicy::default()).await.unwrap_err();
        assert!(matches!(err, GasOracleError::EmptyRewardHistory));
    }
}
