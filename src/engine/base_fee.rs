use std::cmp::Ordering;

use crate::{
    error::GasOracleError,
    models::{FeeHistory, MaxFeeSuggestions},
};

use super::{
    math::{gwei_to_wei, sampling_curve, wei_to_gwei},
    trend::classify_base_fee_trend,
    MAX_TIME_FACTOR, SAMPLE_MAX_PERCENTILE, SAMPLE_MIN_PERCENTILE, SUGGESTED_MAX_FEE_MULTIPLIER,
};

/// Utilization above which a block is treated as full and its base fee
/// replaced with the next block's value during adjustment.
const FULL_BLOCK_GAS_USED_RATIO: f64 = 0.9;

/// Suggests a maximum base fee from a window of recent per-block fee
/// history, along with the current base fee and its trend.
pub fn suggest_max_base_fee(history: &FeeHistory) -> Result<MaxFeeSuggestions, GasOracleError> {
    if history.base_fee_per_gas.is_empty() {
        return Err(GasOracleError::EmptyFeeHistory("baseFeePerGas"));
    }
    if history.gas_used_ratio.is_empty() {
        return Err(GasOracleError::EmptyFeeHistory("gasUsedRatio"));
    }

    let current_base_fee = history.base_fee_per_gas[history.base_fee_per_gas.len() - 1];

    let base_fees_gwei: Vec<f64> = history
        .base_fee_per_gas
        .iter()
        .map(|fee| wei_to_gwei(*fee))
        .collect();

    // Trend is read off the raw series, before any adjustment
    let base_fee_trend = classify_base_fee_trend(&base_fees_gwei, current_base_fee);

    let adjusted = adjusted_base_fees(base_fees_gwei, &history.gas_used_ratio);
    let order = sorted_order(&adjusted);

    let suggestions = per_time_factor_suggestions(&adjusted, &order);
    let max_suggestion = suggestions.iter().cloned().fold(0.0, f64::max);
    let suggested = max_suggestion * SUGGESTED_MAX_FEE_MULTIPLIER;

    Ok(MaxFeeSuggestions {
        current_base_fee,
        base_fee_suggestion: gwei_to_wei(suggested),
        base_fee_trend,
    })
}

/// Two-pass adjustment over the gwei series: inflate the newest entry by
/// 9/8 (one base-fee step of headroom), then walk newest to oldest and
/// give every almost-full block the next block's already-adjusted value.
fn adjusted_base_fees(mut base_fees: Vec<f64>, gas_used_ratio: &[f64]) -> Vec<f64> {
    let newest = base_fees.len() - 1;
    base_fees[newest] *= 9.0 / 8.0;

    for i in (0..gas_used_ratio.len()).rev() {
        if gas_used_ratio[i] > FULL_BLOCK_GAS_USED_RATIO && i + 1 < base_fees.len() {
            base_fees[i] = base_fees[i + 1];
        }
    }
    base_fees
}

/// Index permutation sorting the series ascending by value. The sort is
/// stable, so equal values keep their original block order.
fn sorted_order(base_fees: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..base_fees.len()).collect();
    order.sort_by(|&a, &b| {
        base_fees[a]
            .partial_cmp(&base_fees[b])
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Computes one suggestion per time factor, from the maximum down to 0,
/// clamping each value up to the running maximum so a myopic near-term
/// estimate can never undercut a calmer long-horizon one.
fn per_time_factor_suggestions(base_fees: &[f64], order: &[usize]) -> Vec<f64> {
    let mut result = vec![0.0; MAX_TIME_FACTOR + 1];
    let mut max_base_fee = 0.0f64;
    for time_factor in (0..=MAX_TIME_FACTOR).rev() {
        let mut base_fee = sample_base_fee(
            base_fees,
            order,
            time_factor as f64,
            SAMPLE_MIN_PERCENTILE,
            SAMPLE_MAX_PERCENTILE,
        );
        if base_fee > max_base_fee {
            max_base_fee = base_fee;
        } else {
            base_fee = max_base_fee;
        }
        result[time_factor] = base_fee;
    }
    result
}

/// Weighted-percentile sample of the value-sorted series.
///
/// Blocks are visited in value-ascending order but contribute weight by
/// recency, decaying with `time_factor`. The cumulative weight is mapped
/// through the sampling curve and each block adds its value times the
/// curve increment, a continuous take on "the recency-weighted
/// percentile between sample_min and sample_max".
fn sample_base_fee(
    base_fees: &[f64],
    order: &[usize],
    time_factor: f64,
    sample_min: f64,
    sample_max: f64,
) -> f64 {
    let len = base_fees.len() as f64;
    if time_factor < 1e-6 {
        // Zero smoothing: the newest block speaks for itself
        return base_fees[base_fees.len() - 1];
    }

    let pending_weight =
        (1.0 - (-1.0 / time_factor).exp()) / (1.0 - (-len / time_factor).exp());

    let mut sum_weight = 0.0;
    let mut result = 0.0;
    let mut sampling_curve_prev = 0.0;
    for &i in order {
        sum_weight += pending_weight * ((i as f64 - len + 1.0) / time_factor).exp();
        let sampling_curve_value = sampling_curve(sum_weight, sample_min, sample_max);
        result += (sampling_curve_value - sampling_curve_prev) * base_fees[i];
        if sampling_curve_value >= 1.0 {
            return result;
        }
        sampling_curve_prev = sampling_curve_value;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaseFeeTrend;
    use ethers::types::U256;

    fn gwei(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000_000u64)
    }

    fn history(fees_gwei: &[u64], ratios: &[f64]) -> FeeHistory {
        FeeHistory {
            base_fee_per_gas: fees_gwei.iter().map(|&f| gwei(f)).collect(),
            gas_used_ratio: ratios.to_vec(),
            reward: Vec::new(),
        }
    }

    #[test]
    fn full_block_takes_next_blocks_adjusted_value() {
        let adjusted = adjusted_base_fees(
            vec![10.0, 12.0, 14.0, 50.0, 13.0],
            &[0.5, 0.5, 0.95, 0.5, 0.5],
        );
        // Newest entry inflated by 9/8, block 2 overwritten by block 3
        assert_eq!(adjusted, vec![10.0, 12.0, 50.0, 50.0, 13.0 * 9.0 / 8.0]);
    }

    #[test]
    fn consecutive_full_blocks_propagate_forward_values() {
        let adjusted = adjusted_base_fees(vec![10.0, 11.0, 12.0, 16.0], &[0.95, 0.95, 0.5, 0.5]);
        // Backward pass: block 1 reads block 2 first, then block 0 reads block 1
        assert_eq!(adjusted, vec![12.0, 12.0, 12.0, 18.0]);
    }

    #[test]
    fn full_newest_block_is_left_alone() {
        let adjusted = adjusted_base_fees(vec![10.0, 20.0], &[0.5, 0.95]);
        assert_eq!(adjusted, vec![10.0, 22.5]);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        assert_eq!(sorted_order(&[5.0, 3.0, 5.0, 1.0]), vec![3, 1, 0, 2]);
    }

    #[test]
    fn zero_time_factor_returns_newest_value() {
        let fees = [10.0, 20.0, 30.0];
        let order = sorted_order(&fees);
        assert_eq!(sample_base_fee(&fees, &order, 0.0, 0.1, 0.3), 30.0);
    }

    #[test]
    fn single_block_window_samples_that_block() {
        let fees = [42.0];
        let order = sorted_order(&fees);
        let sampled = sample_base_fee(&fees, &order, 7.0, 0.1, 0.3);
        assert!((sampled - 42.0).abs() < 1e-9);
    }

    #[test]
    fn suggestions_are_monotonic_as_time_factor_decreases() {
        // A spiky window, where raw per-time-factor samples do fluctuate
        let fees: Vec<f64> = (0..40)
            .map(|i| if i % 7 == 0 { 120.0 } else { 15.0 + i as f64 })
            .collect();
        let order = sorted_order(&fees);
        let suggestions = per_time_factor_suggestions(&fees, &order);
        for tf in 0..MAX_TIME_FACTOR {
            assert!(
                suggestions[tf] >= suggestions[tf + 1],
                "suggestion at time factor {} undercuts {}",
                tf,
                tf + 1
            );
        }
    }

    #[test]
    fn suggestion_is_positive_for_ordinary_window() {
        let fees: Vec<u64> = (0..21).map(|i| 30 + i % 5).collect();
        let ratios = vec![0.5; 20];
        let result = suggest_max_base_fee(&history(&fees, &ratios)).unwrap();
        assert!(result.base_fee_suggestion > U256::zero());
        assert_eq!(result.current_base_fee, gwei(30 + 20 % 5));
    }

    #[test]
    fn flat_history_reports_flat_trend() {
        let fees = vec![25u64; 30];
        let ratios = vec![0.5; 29];
        let result = suggest_max_base_fee(&history(&fees, &ratios)).unwrap();
        assert_eq!(result.base_fee_trend, BaseFeeTrend::Flat);
    }

    #[test]
    fn empty_base_fees_are_rejected() {
        let err = suggest_max_base_fee(&history(&[], &[0.5])).unwrap_err();
        assert!(matches!(err, GasOracleError::EmptyFeeHistory("baseFeePerGas")));
    }

    #[test]
    fn empty_gas_used_ratio_is_rejected() {
        let err = suggest_max_base_fee(&history(&[10, 11], &[])).unwrap_err();
        assert!(matches!(err, GasOracleError::EmptyFeeHistory("gasUsedRatio")));
    }
}
