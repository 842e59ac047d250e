use ethers::types::U256;

/// One `eth_feeHistory` window, oldest block first.
///
/// `base_fee_per_gas` carries one more entry than `gas_used_ratio`: the
/// node appends its base-fee estimate for the next (pending) block.
/// `reward` is empty unless percentile cuts were requested.
#[derive(Debug, Clone, Default)]
pub struct FeeHistory {
    pub base_fee_per_gas: Vec<U256>,
    pub gas_used_ratio: Vec<f64>,
    pub reward: Vec<Vec<U256>>,
}

impl From<ethers::types::FeeHistory> for FeeHistory {
    fn from(history: ethers::types::FeeHistory) -> Self {
        Self {
            base_fee_per_gas: history.base_fee_per_gas,
            gas_used_ratio: history.gas_used_ratio,
            reward: history.reward,
        }
    }
}
