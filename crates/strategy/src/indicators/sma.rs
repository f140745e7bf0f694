/// Arithmetic mean of the last `period` values.
/// Returns `None` if `period` is zero or there are fewer than `period` values.
pub fn simple_moving_average(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 || series.len() < period {
        return None;
    }
    let window = &series[series.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// SMA evaluated at every index of `series`, aligned index-for-index.
/// The first `period - 1` entries are `None`.
pub fn rolling_sma(series: &[f64], period: usize) -> Vec<Option<f64>> {
    (1..=series.len())
        .map(|end| simple_moving_average(&series[..end], period))
        .collect()
}
