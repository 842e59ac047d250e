use ethers::types::U256;

const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Converts wei to a gwei float. Precision loss past ~2^53 is accepted:
/// gwei values are only used for ranking and smoothing, the final
/// suggestions are always quantized back through `gwei_to_wei`.
pub fn wei_to_gwei(wei: U256) -> f64 {
    if wei.is_zero() {
        return 0.0;
    }
    let divisor = U256::from(WEI_PER_GWEI);
    let whole = (wei / divisor).as_u128() as f64;
    let frac = (wei % divisor).as_u128() as f64;
    whole + frac / WEI_PER_GWEI as f64
}

/// Quantizes a gwei float back to integer wei, rounding to 9 decimal
/// places of gwei (i.e. whole wei).
pub fn gwei_to_wei(gwei: f64) -> U256 {
    let wei = (gwei * WEI_PER_GWEI as f64).round();
    if !(wei > 0.0) {
        return U256::zero();
    }
    U256::from(wei as u128)
}

/// Soft percentile selector: 0 below `sample_min`, 1 above `sample_max`,
/// a cosine ease in between. Used instead of a hard cutoff so each
/// block's influence fades in and out as cumulative weight crosses the
/// sampling window.
pub fn sampling_curve(sum_weight: f64, sample_min: f64, sample_max: f64) -> f64 {
    if sum_weight <= sample_min {
        return 0.0;
    }
    if sum_weight >= sample_max {
        return 1.0;
    }
    (1.0 - ((sum_weight - sample_min) * 2.0 * std::f64::consts::PI / (sample_max - sample_min)).cos())
        / 2.0
}

/// Ordinary least-squares slope of `y` against its index sequence.
/// Fewer than two points has no defined slope and yields 0.
pub fn linear_regression(y: &[f64]) -> f64 {
    let n = y.len();
    if n < 2 {
        return 0.0;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, &cy) in y.iter().enumerate() {
        let cx = i as f64;
        sum_x += cx;
        sum_y += cy;
        sum_xy += cx * cy;
        sum_xx += cx * cx;
    }

    let n = n as f64;
    (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x)
}

/// Percentage difference between two values, relative to the first.
pub fn percent_difference(t1: f64, t2: f64) -> f64 {
    100.0 * ((t2 - t1).abs() / t1)
}

/// Exponential moving average with `alpha = 2 / (size + 1)`.
///
/// Explicit left-fold: the first finite value seeds the average, a
/// non-finite element repeats the previous output (hold-last-value),
/// and the last element of the result is the current smoothed estimate.
pub fn exponential_moving_average(data: &[f64], size: usize) -> Vec<f64> {
    let alpha = 2.0 / (size as f64 + 1.0);

    let mut out = Vec::with_capacity(data.len());
    let mut state: Option<f64> = None;
    for &datum in data {
        let value = match state {
            None if datum.is_finite() => {
                state = Some(datum);
                datum
            }
            // Still waiting for a first valid sample
            None => f64::NAN,
            Some(prev) if datum.is_finite() => {
                let next = alpha * datum + (1.0 - alpha) * prev;
                state = Some(next);
                next
            }
            Some(prev) => prev,
        };
        out.push(value);
    }
    out
}
