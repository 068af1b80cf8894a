use txf_types::Bar;

/// One point of a MACD series.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Adjusted exponential weighted mean over `values`, matching pandas'
/// `Series.ewm(span=period).mean()` (adjust=True): each output point is a
/// weighted average of *all* prior observations, not a simple recursive EMA.
/// Returned sequence has the same length as `values`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut numerator = values[0];
    let mut denominator = 1.0_f64;
    out.push(numerator / denominator);

    for &x in &values[1..] {
        numerator = x + decay * numerator;
        denominator = 1.0 + decay * denominator;
        out.push(numerator / denominator);
    }
    out
}

/// EMA of bar closes. Returns one value per bar.
pub fn ema(bars: &[Bar], period: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close as f64).collect();
    ema_series(&closes, period)
}

/// MACD line/signal/histogram, one point per bar.
pub fn macd(bars: &[Bar], fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close as f64).collect();
    let ema_fast = ema_series(&closes, fast);
    let ema_slow = ema_series(&closes, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_series(&macd_line, signal);

    macd_line
        .into_iter()
        .zip(signal_line)
        .map(|(m, s)| MacdPoint {
            macd: m,
            signal: s,
            histogram: m - s,
        })
        .collect()
}

/// True iff the confirmed second-to-last point crosses from `macd <= signal`
/// to `macd > signal` relative to the point before it.
pub fn check_golden_cross(macd_seq: &[MacdPoint], min_strength: Option<f64>) -> bool {
    if macd_seq.len() < 3 {
        return false;
    }
    let n = macd_seq.len();
    let current = macd_seq[n - 2];
    let previous = macd_seq[n - 3];

    let crossed = previous.macd <= previous.signal && current.macd > current.signal;
    if !crossed {
        return false;
    }
    match min_strength {
        Some(threshold) => (current.macd - current.signal).abs() >= threshold,
        None => true,
    }
}

/// Mirror of [`check_golden_cross`]; `min_acceleration` bounds the
/// bar-over-bar change in `macd - signal`.
pub fn check_death_cross(macd_seq: &[MacdPoint], min_acceleration: Option<f64>) -> bool {
    if macd_seq.len() < 3 {
        return false;
    }
    let n = macd_seq.len();
    let current = macd_seq[n - 2];
    let previous = macd_seq[n - 3];

    let crossed = previous.macd >= previous.signal && current.macd < current.signal;
    if !crossed {
        return false;
    }
    match min_acceleration {
        Some(threshold) => {
            let current_diff = current.macd - current.signal;
            let previous_diff = previous.macd - previous.signal;
            (current_diff - previous_diff).abs() >= threshold
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_series_first_point_equals_input() {
        let v = [10.0, 20.0, 30.0];
        let e = ema_series(&v, 5);
        assert_eq!(e[0], 10.0);
    }

    #[test]
    fn golden_cross_needs_three_points() {
        let pts = [
            MacdPoint { macd: 1.0, signal: 2.0, histogram: -1.0 },
            MacdPoint { macd: 1.0, signal: 2.0, histogram: -1.0 },
        ];
        assert!(!check_golden_cross(&pts, None));
    }

    #[test]
    fn golden_cross_fires_on_upward_cross() {
        let pts = [
            MacdPoint { macd: 0.0, signal: 1.0, histogram: -1.0 },
            MacdPoint { macd: 0.5, signal: 0.4, histogram: 0.1 },
            MacdPoint { macd: 0.9, signal: 0.5, histogram: 0.4 },
        ];
        assert!(check_golden_cross(&pts, None));
    }
}
