/// Relative Strength Index over the last `period` price changes.
///
/// Average gain and average loss are plain means over the window (no Wilder
/// smoothing), and `RSI = 100 − 100 / (1 + gain / loss)`. A window with no
/// losses is treated as maximal strength, so a zero loss mean yields 100 even
/// when the gain mean is zero as well.
///
/// Returns `None` if `period` is zero or there are fewer than `period + 1`
/// values.
pub fn relative_strength_index(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 || series.len() < period + 1 {
        return None;
    }

    let window = &series[series.len() - (period + 1)..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), change| {
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// RSI evaluated at every index of `series`, aligned index-for-index.
/// The first `period` entries are `None`.
pub fn rolling_rsi(series: &[f64], period: usize) -> Vec<Option<f64>> {
    (1..=series.len())
        .map(|end| relative_strength_index(&series[..end], period))
        .collect()
}
