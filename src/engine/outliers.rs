use std::collections::BTreeSet;

use ethers::types::U256;

use super::{math::wei_to_gwei, GWEI_REWARD_OUTLIER_THRESHOLD};

/// Collects the indices of blocks whose reward at `percentile_index`
/// exceeds the outlier threshold. Detection always runs against the
/// 10th-percentile column; the resulting set is shared by all columns.
pub fn outlier_blocks(rewards: &[Vec<U256>], percentile_index: usize) -> BTreeSet<usize> {
    rewards
        .iter()
        .enumerate()
        .filter(|(_, block)| {
            block
                .get(percentile_index)
                .map(|reward| wei_to_gwei(*reward) > GWEI_REWARD_OUTLIER_THRESHOLD)
                .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Returns the gwei reward series for one percentile column, skipping
/// excluded block indices and preserving relative order.
pub fn filter_outliers(
    rewards: &[Vec<U256>],
    outlier_set: &BTreeSet<usize>,
    percentile_index: usize,
) -> Vec<f64> {
    rewards
        .iter()
        .enumerate()
        .filter(|(i, _)| !outlier_set.contains(i))
        .filter_map(|(_, block)| block.get(percentile_index).copied())
        .map(wei_to_gwei)
        .collect()
}
