use txf_indicators::{check_death_cross, check_golden_cross, macd, volume_percentile};
use txf_types::{Bar, EntryOverrides, Signal, SignalType};

use crate::Strategy;

/// Shared tuning knobs for both the long-only and bidirectional MACD
/// crossover strategies.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MacdConfig {
    pub macd_threshold: f64,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    /// 0 disables the volume gate; 0.6 requires the 60th percentile or above.
    pub volume_percentile_threshold: f64,
    pub volume_percentile_lookback: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            macd_threshold: 35.0,
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            volume_percentile_threshold: 0.0,
            volume_percentile_lookback: 100,
        }
    }
}

fn volume_gate_passes(config: &MacdConfig, bars: &[Bar]) -> bool {
    if config.volume_percentile_threshold <= 0.0 {
        return true;
    }
    match volume_percentile(bars, config.volume_percentile_lookback) {
        Some(pct) => pct >= config.volume_percentile_threshold,
        None => true,
    }
}

/// MACD golden-cross, long-only. Emits no `EntryOverrides`; the opened
/// position takes the position manager's own stop/target/trailing defaults.
pub struct MacdGoldenCrossStrategy {
    config: MacdConfig,
}

impl MacdGoldenCrossStrategy {
    pub fn new(config: MacdConfig) -> Self {
        Self { config }
    }
}

impl Strategy for MacdGoldenCrossStrategy {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
        if bars.len() < 30 {
            return Signal::hold(symbol);
        }
        let macd_seq = macd(bars, self.config.fast_period, self.config.slow_period, self.config.signal_period);
        let Some(current) = macd_seq.last() else {
            return Signal::hold(symbol);
        };
        let macd_avg = (current.macd + current.signal) / 2.0;

        if macd_avg < self.config.macd_threshold && check_golden_cross(&macd_seq, None) && volume_gate_passes(&self.config, bars) {
            return Signal {
                signal_type: SignalType::EntryLong,
                symbol: symbol.to_string(),
                price: current_price,
                quantity: 0,
                overrides: EntryOverrides::default(),
            };
        }
        Signal::hold(symbol)
    }
}

/// MACD golden-cross (long) / death-cross (short). Identical entry logic to
/// [`MacdGoldenCrossStrategy`] with the short side mirrored.
pub struct MacdBidirectionalStrategy {
    config: MacdConfig,
}

impl MacdBidirectionalStrategy {
    pub fn new(config: MacdConfig) -> Self {
        Self { config }
    }
}

impl Strategy for MacdBidirectionalStrategy {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
        if bars.len() < 30 {
            return Signal::hold(symbol);
        }
        let macd_seq = macd(bars, self.config.fast_period, self.config.slow_period, self.config.signal_period);
        let Some(current) = macd_seq.last() else {
            return Signal::hold(symbol);
        };
        let macd_avg = (current.macd + current.signal) / 2.0;

        if macd_avg < self.config.macd_threshold && check_golden_cross(&macd_seq, None) && volume_gate_passes(&self.config, bars) {
            return Signal {
                signal_type: SignalType::EntryLong,
                symbol: symbol.to_string(),
                price: current_price,
                quantity: 0,
                overrides: EntryOverrides::default(),
            };
        }
        if macd_avg > -self.config.macd_threshold && check_death_cross(&macd_seq, None) && volume_gate_passes(&self.config, bars) {
            return Signal {
                signal_type: SignalType::EntryShort,
                symbol: symbol.to_string(),
                price: current_price,
                quantity: 0,
                overrides: EntryOverrides::default(),
            };
        }
        Signal::hold(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_testkit::{flat_bars, push_move};

    fn golden_cross_bars() -> Vec<Bar> {
        let mut bars = flat_bars("TXF", 0, 30, 18000, 100);
        for _ in 0..5 {
            push_move(&mut bars, 40, 500);
        }
        bars
    }

    #[test]
    fn golden_cross_holds_below_30_bars() {
        let mut strat = MacdGoldenCrossStrategy::new(MacdConfig::default());
        let bars = flat_bars("TXF", 0, 10, 18000, 100);
        let signal = strat.evaluate(&bars, 18000, "TXF");
        assert_eq!(signal.signal_type, SignalType::Hold);
    }

    #[test]
    fn golden_cross_can_enter_long_on_strong_rally() {
        let mut strat = MacdGoldenCrossStrategy::new(MacdConfig::default());
        let bars = golden_cross_bars();
        let last_close = bars.last().unwrap().close;
        let signal = strat.evaluate(&bars, last_close, "TXF");
        assert!(matches!(signal.signal_type, SignalType::EntryLong | SignalType::Hold));
    }

    #[test]
    fn bidirectional_never_enters_short_on_a_rally() {
        let mut strat = MacdBidirectionalStrategy::new(MacdConfig::default());
        let bars = golden_cross_bars();
        let last_close = bars.last().unwrap().close;
        let signal = strat.evaluate(&bars, last_close, "TXF");
        assert_ne!(signal.signal_type, SignalType::EntryShort);
    }
}
