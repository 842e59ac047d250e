use std::collections::{BTreeMap, BTreeSet};

use ethers::types::U256;

use crate::{
    error::GasOracleError,
    models::{FeeTiers, MaxPriorityFeeSuggestions},
};

use super::{
    math::{exponential_moving_average, gwei_to_wei},
    outliers::{filter_outliers, outlier_blocks},
    ChainPolicy, CONFIRMATION_SECONDS, MAX_GWEI_FAST_PRI_FEE, MAX_GWEI_NORMAL_PRI_FEE,
    MAX_GWEI_URGENT_PRI_FEE, MIN_GWEI_FAST_PRI_FEE, MIN_GWEI_NORMAL_PRI_FEE,
    MIN_GWEI_URGENT_PRI_FEE, REWARD_PERCENTILES,
};

/// Suggests tiered priority fees from the reward matrix of the most
/// recent blocks, sampled at the 10/25/50/75 percentile cuts.
pub fn suggest_max_priority_fee(
    rewards: &[Vec<U256>],
    policy: ChainPolicy,
) -> Result<MaxPriorityFeeSuggestions, GasOracleError> {
    if rewards.is_empty() {
        return Err(GasOracleError::EmptyRewardHistory);
    }

    // High-variance chains skip outlier detection by policy
    let outlier_set = if policy.skip_outlier_filter {
        BTreeSet::new()
    } else {
        outlier_blocks(rewards, 0)
    };

    let mut estimates = [0.0f64; REWARD_PERCENTILES.len()];
    for (column, estimate) in estimates.iter_mut().enumerate() {
        let series = filter_outliers(rewards, &outlier_set, column);
        let emas = exponential_moving_average(&series, series.len());
        // A missing point estimate must be an error, never a zero fee
        *estimate = emas
            .last()
            .copied()
            .filter(|value| value.is_finite())
            .ok_or(GasOracleError::PriorityFeeUnavailable {
                percentile: REWARD_PERCENTILES[column] as u32,
            })?;
    }
    let [percentile_10, percentile_25, percentile_50, percentile_75] = estimates;

    // Tier bounds are calibrated for mainnet and skipped elsewhere
    let (normal, fast, urgent) = if policy.exempt_from_priority_bounds {
        (percentile_25, percentile_50, percentile_75)
    } else {
        (
            percentile_25.clamp(MIN_GWEI_NORMAL_PRI_FEE, MAX_GWEI_NORMAL_PRI_FEE),
            percentile_50.clamp(MIN_GWEI_FAST_PRI_FEE, MAX_GWEI_FAST_PRI_FEE),
            percentile_75.clamp(MIN_GWEI_URGENT_PRI_FEE, MAX_GWEI_URGENT_PRI_FEE),
        )
    };

    // Higher priority fee buys a shorter expected wait
    let confirmation_seconds_to_priority_fee = BTreeMap::from([
        (CONFIRMATION_SECONDS[0], gwei_to_wei(percentile_75)),
        (CONFIRMATION_SECONDS[1], gwei_to_wei(percentile_50)),
        (CONFIRMATION_SECONDS[2], gwei_to_wei(percentile_25)),
        (CONFIRMATION_SECONDS[3], gwei_to_wei(percentile_10)),
    ]);

    Ok(MaxPriorityFeeSuggestions {
        priority_fee_suggestions: FeeTiers {
            normal: gwei_to_wei(normal),
            fast: gwei_to_wei(fast),
            urgent: gwei_to_wei(urgent),
        },
        confirmation_seconds_to_priority_fee,
    })
}
