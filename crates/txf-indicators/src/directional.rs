use txf_types::Bar;

/// Wilder smoothing: `s[0] = values[0]`, `s[i] = alpha*values[i] + (1-alpha)*s[i-1]`
/// with `alpha = 1/period`. Unlike [`crate::ema::ema_series`], this is the
/// unadjusted (recursive-only) form Wilder's indicators use.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let alpha = 1.0 / period as f64;
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

fn true_range(bar: &Bar, prev_close: i64) -> f64 {
    let hl = (bar.high - bar.low).abs() as f64;
    let hc = (bar.high - prev_close).abs() as f64;
    let lc = (bar.low - prev_close).abs() as f64;
    hl.max(hc).max(lc)
}

fn directional_moves(bars: &[Bar]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut tr = Vec::with_capacity(bars.len() - 1);
    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);

    for i in 1..bars.len() {
        let prev = &bars[i - 1];
        let cur = &bars[i];
        tr.push(true_range(cur, prev.close));

        let up_move = (cur.high - prev.high) as f64;
        let down_move = (prev.low - cur.low) as f64;
        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
    }
    (tr, plus_dm, minus_dm)
}

/// Average True Range, Wilder-smoothed. Requires at least `period + 1` bars.
pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.len() < period + 1 {
        return None;
    }
    let (tr, _, _) = directional_moves(bars);
    wilder_smooth(&tr, period).last().copied()
}

/// Average Directional Index, Wilder-smoothed throughout. Requires at least
/// `period * 3` bars (enough history for the smoothed DX itself to settle).
pub fn adx(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.len() < period * 3 {
        return None;
    }
    let (tr, plus_dm, minus_dm) = directional_moves(bars);
    let atr_smooth = wilder_smooth(&tr, period);
    let plus_smooth = wilder_smooth(&plus_dm, period);
    let minus_smooth = wilder_smooth(&minus_dm, period);

    let dx: Vec<f64> = atr_smooth
        .iter()
        .zip(plus_smooth.iter())
        .zip(minus_smooth.iter())
        .map(|((atr_v, plus_v), minus_v)| {
            if *atr_v == 0.0 {
                return 0.0;
            }
            let plus_di = 100.0 * plus_v / atr_v;
            let minus_di = 100.0 * minus_v / atr_v;
            let sum = plus_di + minus_di;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / sum
            }
        })
        .collect();

    wilder_smooth(&dx, period).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_types::Bar;

    fn flat_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar::new("TXF", i as i64, 100, 101, 99, 100, 1000))
            .collect()
    }

    #[test]
    fn atr_needs_period_plus_one_bars() {
        assert_eq!(atr(&flat_bars(10), 14), None);
        assert!(atr(&flat_bars(15), 14).is_some());
    }

    #[test]
    fn adx_needs_triple_period_bars() {
        assert_eq!(adx(&flat_bars(30), 14), None);
        assert!(adx(&flat_bars(42), 14).is_some());
    }
}
