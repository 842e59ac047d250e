use ethers::types::U256;

use crate::models::BaseFeeTrend;

use super::{
    math::{linear_regression, percent_difference, wei_to_gwei},
    TREND_FLAT_THRESHOLD_PCT,
};

/// Classifies the direction of a gwei base-fee series (oldest to newest).
///
/// The regression slope is expressed as a percentage of the current base
/// fee; movements inside the flat threshold are treated as noise. A
/// series with fewer than two points has no slope and reads as flat.
pub fn classify_base_fee_trend(base_fees_gwei: &[f64], current_base_fee: U256) -> BaseFeeTrend {
    let slope = linear_regression(base_fees_gwei);
    let current = wei_to_gwei(current_base_fee);
    if !slope.is_finite() || current <= 0.0 {
        return BaseFeeTrend::Flat;
    }

    let magnitude = percent_difference(current, current + slope);
    if magnitude <= TREND_FLAT_THRESHOLD_PCT {
        BaseFeeTrend::Flat
    } else if slope > 0.0 {
        BaseFeeTrend::Rising
    } else {
        BaseFeeTrend::Falling
    }
}
