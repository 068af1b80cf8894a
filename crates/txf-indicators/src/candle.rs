use txf_types::Bar;

/// Position of the close within the bar's range: `0` at the low, `1` at the
/// high. Doji bars (`high == low`) read as neutral (`0.5`).
pub fn candle_strength(bar: &Bar) -> f64 {
    let range = bar.high - bar.low;
    if range <= 0 {
        0.5
    } else {
        (bar.close - bar.low) as f64 / range as f64
    }
}

/// Bollinger bands over the last `period` closes, using population variance
/// (divide by `period`, not `period - 1`). `None` if fewer than `period`
/// bars are available.
pub fn bollinger_bands(bars: &[Bar], period: usize, num_std: f64) -> Option<(f64, f64, f64)> {
    if bars.len() < period {
        return None;
    }
    let closes: Vec<f64> = bars[bars.len() - period..].iter().map(|b| b.close as f64).collect();
    let mean = closes.iter().sum::<f64>() / period as f64;
    let variance = closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / period as f64;
    let std = variance.sqrt();
    Some((mean + num_std * std, mean, mean - num_std * std))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doji_bar_is_neutral() {
        let bar = Bar::new("TXF", 0, 100, 100, 100, 100, 10);
        assert_eq!(candle_strength(&bar), 0.5);
    }

    #[test]
    fn strong_bullish_close_near_high() {
        let bar = Bar::new("TXF", 0, 100, 110, 100, 109, 10);
        assert!(candle_strength(&bar) > 0.85);
    }

    #[test]
    fn bollinger_needs_full_period() {
        let bars: Vec<Bar> = (0..10).map(|i| Bar::new("TXF", i, 100, 101, 99, 100, 10)).collect();
        assert_eq!(bollinger_bands(&bars, 20, 3.0), None);
    }
}
