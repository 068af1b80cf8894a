use txf_types::Bar;

/// Current bar's volume over the mean of the preceding `lookback` bars with
/// positive volume. Requires at least `lookback + 1` bars. `None` if there is
/// no positive-volume bar to average against.
pub fn rvol(bars: &[Bar], lookback: usize) -> Option<f64> {
    if bars.len() < lookback + 1 {
        return None;
    }
    let n = bars.len();
    let current_volume = bars[n - 1].volume as f64;
    if current_volume <= 0.0 {
        return None;
    }
    let window = &bars[n - 1 - lookback..n - 1];

    let positive: Vec<f64> = window.iter().filter(|b| b.volume > 0).map(|b| b.volume as f64).collect();
    if positive.is_empty() {
        return None;
    }
    let mean = positive.iter().sum::<f64>() / positive.len() as f64;
    if mean == 0.0 {
        None
    } else {
        Some(current_volume / mean)
    }
}

/// Fraction of the preceding `lookback` bars (excluding both the still-forming
/// last bar and the confirmed bar itself) with strictly smaller volume than
/// the confirmed bar at index `len - 2`.
pub fn volume_percentile(bars: &[Bar], lookback: usize) -> Option<f64> {
    if bars.len() < lookback + 1 {
        return None;
    }
    let n = bars.len();
    let current = &bars[n - 2];
    let start = n - lookback - 1;
    let end = n - 2;
    if start >= end {
        return None;
    }
    let window = &bars[start..end];
    let smaller = window.iter().filter(|b| b.volume < current.volume).count();
    Some(smaller as f64 / window.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_with_volume(i: i64, volume: i64) -> Bar {
        Bar::new("TXF", i, 100, 101, 99, 100, volume)
    }

    #[test]
    fn rvol_requires_lookback_plus_one() {
        let bars: Vec<Bar> = (0..10).map(|i| bar_with_volume(i, 100)).collect();
        assert_eq!(rvol(&bars, 20), None);
    }

    #[test]
    fn rvol_doubles_when_current_volume_doubles_mean() {
        let mut bars: Vec<Bar> = (0..21).map(|i| bar_with_volume(i, 100)).collect();
        let last = bars.len() - 1;
        bars[last] = bar_with_volume(last as i64, 200);
        assert_eq!(rvol(&bars, 20), Some(2.0));
    }
}
