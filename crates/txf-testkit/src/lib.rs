//! Deterministic bar fixtures shared across crate test suites.
//!
//! Every helper here builds plain in-memory `Bar` sequences; there is no
//! broker, filesystem, or network surface to fake.

use txf_types::Bar;

/// One 30-minute bar's wall-clock spacing, in seconds. Fixture timestamps
/// only need to be strictly increasing and timeframe-consistent; the actual
/// epoch is otherwise arbitrary.
pub const BAR_STEP_SECS: i64 = 30 * 60;

/// Builds a flat run of `count` bars around `price`, each `step_secs` apart
/// starting at `start_time`. Useful as a base sequence to mutate for a
/// specific scenario (inject a breakout bar, a gap, a cross, ...).
pub fn flat_bars(symbol: &str, start_time: i64, count: usize, price: i64, volume: i64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            Bar::new(
                symbol,
                start_time + i as i64 * BAR_STEP_SECS,
                price,
                price + 1,
                price - 1,
                price,
                volume,
            )
        })
        .collect()
}

/// A fluent single-bar builder for scenarios that need explicit OHLCV control.
#[derive(Clone, Debug)]
pub struct BarBuilder {
    symbol: String,
    time: i64,
    open: i64,
    high: i64,
    low: i64,
    close: i64,
    volume: i64,
}

impl BarBuilder {
    pub fn new(symbol: impl Into<String>, time: i64, close: i64) -> Self {
        Self {
            symbol: symbol.into(),
            time,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    pub fn open(mut self, v: i64) -> Self {
        self.open = v;
        self
    }

    pub fn high(mut self, v: i64) -> Self {
        self.high = v;
        self
    }

    pub fn low(mut self, v: i64) -> Self {
        self.low = v;
        self
    }

    pub fn volume(mut self, v: i64) -> Self {
        self.volume = v;
        self
    }

    pub fn build(self) -> Bar {
        Bar::new(self.symbol, self.time, self.open, self.high, self.low, self.close, self.volume)
    }
}

/// Appends a bar driving the close `delta` points away from the last bar's
/// close, holding the high/low to bracket both, with the given volume.
pub fn push_move(bars: &mut Vec<Bar>, delta: i64, volume: i64) {
    let last = bars.last().expect("push_move requires a non-empty sequence");
    let symbol = last.symbol.clone();
    let time = last.time + BAR_STEP_SECS;
    let open = last.close;
    let close = open + delta;
    let high = open.max(close);
    let low = open.min(close);
    bars.push(Bar::new(symbol, time, open, high, low, close, volume));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_bars_are_time_ascending() {
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        for w in bars.windows(2) {
            assert!(w[0].time < w[1].time);
        }
    }

    #[test]
    fn push_move_tracks_previous_close() {
        let mut bars = flat_bars("TXF", 0, 1, 18000, 100);
        push_move(&mut bars, 50, 500);
        assert_eq!(bars.last().unwrap().close, 18050);
    }
}
