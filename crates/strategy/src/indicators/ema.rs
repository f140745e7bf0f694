/// Exponential Moving Average over the whole of `series`.
///
/// The running average is seeded with the **first element of the slice** and
/// then updated for every later element with `α = 2 / (period + 1)`. Its
/// effective memory therefore depends on how much history is passed, so
/// callers comparing values across steps must pass consistently anchored
/// prefixes.
///
/// Returns `None` if `period` is zero or there are fewer than `period` values.
pub fn exponential_moving_average(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 || series.len() < period {
        return None;
    }
    let mut ema = Ema::new(period);
    for &price in series {
        ema.update(price);
    }
    ema.value()
}

/// Incremental form of [`exponential_moving_average`].
///
/// After feeding the first `n` prices of a series, `value()` is bit-identical
/// to `exponential_moving_average(&series[..n], period)`.
#[derive(Debug, Clone)]
pub struct Ema {
    multiplier: f64,
    period: usize,
    current: f64,
    count: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            multiplier: 2.0 / (period as f64 + 1.0),
            period,
            current: 0.0,
            count: 0,
        }
    }

    /// Feed one price.
    pub fn update(&mut self, price: f64) {
        if self.count == 0 {
            self.current = price;
        } else {
            self.current = (price - self.current) * self.multiplier + self.current;
        }
        self.count += 1;
    }

    /// Current average, or `None` until `period` prices have been seen.
    pub fn value(&self) -> Option<f64> {
        if self.period == 0 || self.count < self.period {
            None
        } else {
            Some(self.current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeds_with_first_price() {
        // alpha = 2/(3+1) = 0.5
        // 10 -> 10.5 -> 11.25 -> 12.125
        let v = exponential_moving_average(&[10.0, 11.0, 12.0, 13.0], 3).unwrap();
        assert!((v - 12.125).abs() < 1e-10, "got {v}");
    }

    #[test]
    fn ema_returns_none_when_insufficient_data() {
        assert!(exponential_moving_average(&[1.0, 2.0], 3).is_none());
        assert!(exponential_moving_average(&[], 1).is_none());
        assert!(exponential_moving_average(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn ema_depends_on_history_depth() {
        let long = [50.0, 10.0, 11.0, 12.0];
        let short = &long[1..];
        let a = exponential_moving_average(&long, 3).unwrap();
        let b = exponential_moving_average(short, 3).unwrap();
        assert!((a - b).abs() > 1e-6);
    }

    #[test]
    fn incremental_matches_slice_form() {
        let prices = [10.0, 11.0, 9.0, 12.0, 8.0, 13.0, 7.0, 14.0];
        let mut ema = Ema::new(3);
        for (n, &p) in prices.iter().enumerate() {
            ema.update(p);
            assert_eq!(ema.value(), exponential_moving_average(&prices[..=n], 3));
        }
    }
}
