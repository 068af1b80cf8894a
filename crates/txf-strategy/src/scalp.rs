use chrono::NaiveTime;
use txf_indicators::candle_strength;
use txf_types::{Bar, EntryOverrides, Signal, SignalType};

use crate::{bar_time_of_day, parse_hh_mm, Strategy};

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntryMode {
    Breakout,
    Reversal,
    Both,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScalpConfig {
    pub session_start_time: String,
    pub entry_end_time: String,
    pub entry_mode: EntryMode,
    pub breakout_lookback: usize,
    pub breakout_min_strength: f64,
    pub reversal_consecutive: usize,
    pub reversal_min_strength: f64,
    pub long_only: bool,
    pub short_only: bool,
    pub cooldown_bars: usize,
}

impl Default for ScalpConfig {
    fn default() -> Self {
        Self {
            session_start_time: "09:05".to_string(),
            entry_end_time: "13:00".to_string(),
            entry_mode: EntryMode::Both,
            breakout_lookback: 12,
            breakout_min_strength: 0.6,
            reversal_consecutive: 3,
            reversal_min_strength: 0.65,
            long_only: false,
            short_only: false,
            cooldown_bars: 2,
        }
    }
}

/// Bar-level breakout/reversal scalper with a post-exit cooldown.
pub struct ScalpStrategy {
    config: ScalpConfig,
    session_start: NaiveTime,
    entry_end: NaiveTime,
    bars_since_last_exit: usize,
}

impl ScalpStrategy {
    pub fn new(config: ScalpConfig) -> Self {
        let session_start = parse_hh_mm(&config.session_start_time);
        let entry_end = parse_hh_mm(&config.entry_end_time);
        Self {
            config,
            session_start,
            entry_end,
            bars_since_last_exit: 999,
        }
    }

    fn check_breakout(&self, recent: &[Bar], symbol: &str, current_price: i64) -> Option<Signal> {
        if recent.len() < self.config.breakout_lookback + 1 {
            return None;
        }
        let current_bar = recent.last().unwrap();
        let lookback_bars = &recent[recent.len() - self.config.breakout_lookback - 1..recent.len() - 1];
        let highest = lookback_bars.iter().map(|b| b.high).max().unwrap();
        let lowest = lookback_bars.iter().map(|b| b.low).min().unwrap();
        let strength = candle_strength(current_bar);

        if !self.config.short_only && current_bar.close > highest && strength >= self.config.breakout_min_strength {
            return Some(entry(SignalType::EntryLong, symbol, current_price));
        }
        if !self.config.long_only && current_bar.close < lowest && strength <= 1.0 - self.config.breakout_min_strength {
            return Some(entry(SignalType::EntryShort, symbol, current_price));
        }
        None
    }

    fn check_reversal(&self, recent: &[Bar], symbol: &str, current_price: i64) -> Option<Signal> {
        let n = self.config.reversal_consecutive;
        if recent.len() < n + 1 {
            return None;
        }
        let current_bar = recent.last().unwrap();
        let prev_bars = &recent[recent.len() - n - 1..recent.len() - 1];
        let current_strength = candle_strength(current_bar);

        let all_bearish = prev_bars.iter().all(|b| b.close < b.open);
        if !self.config.short_only
            && all_bearish
            && current_strength >= self.config.reversal_min_strength
            && current_bar.close > current_bar.open
        {
            return Some(entry(SignalType::EntryLong, symbol, current_price));
        }

        let all_bullish = prev_bars.iter().all(|b| b.close > b.open);
        if !self.config.long_only
            && all_bullish
            && current_strength <= 1.0 - self.config.reversal_min_strength
            && current_bar.close < current_bar.open
        {
            return Some(entry(SignalType::EntryShort, symbol, current_price));
        }
        None
    }
}

fn entry(signal_type: SignalType, symbol: &str, price: i64) -> Signal {
    Signal {
        signal_type,
        symbol: symbol.to_string(),
        price,
        quantity: 0,
        overrides: EntryOverrides::default(),
    }
}

impl Strategy for ScalpStrategy {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
        if bars.len() < self.config.breakout_lookback + 2 {
            return Signal::hold(symbol);
        }
        let latest = bars.last().unwrap();
        let Some(current_time) = bar_time_of_day(latest.time) else {
            return Signal::hold(symbol);
        };
        if current_time < self.session_start || current_time >= self.entry_end {
            return Signal::hold(symbol);
        }

        self.bars_since_last_exit += 1;
        if self.bars_since_last_exit < self.config.cooldown_bars {
            return Signal::hold(symbol);
        }

        let lookback = self.config.breakout_lookback.max(self.config.reversal_consecutive + 1);
        let recent = &bars[bars.len().saturating_sub(lookback + 1)..];

        if matches!(self.config.entry_mode, EntryMode::Breakout | EntryMode::Both) {
            if let Some(signal) = self.check_breakout(recent, symbol, current_price) {
                return signal;
            }
        }
        if matches!(self.config.entry_mode, EntryMode::Reversal | EntryMode::Both) {
            if let Some(signal) = self.check_reversal(recent, symbol, current_price) {
                return signal;
            }
        }
        Signal::hold(symbol)
    }

    fn on_position_closed(&mut self) {
        self.bars_since_last_exit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_testkit::BarBuilder;

    fn day_session_bar(minute_offset: i64, close: i64) -> Bar {
        // 2024-01-02 09:05 UTC + offset minutes.
        let base = 1704186300_i64; // 2024-01-02T09:05:00Z
        BarBuilder::new("TXF", base + minute_offset * 60, close).build()
    }

    #[test]
    fn breakout_long_fires_on_new_high_with_strong_close() {
        let mut strat = ScalpStrategy::new(ScalpConfig::default());
        let mut bars: Vec<Bar> = (0..13).map(|i| day_session_bar(i, 18000)).collect();
        let last = bars.len() as i64;
        bars.push(
            BarBuilder::new("TXF", 1704186300 + last * 60, 18050)
                .open(18000)
                .high(18055)
                .low(18000)
                .build(),
        );
        let signal = strat.evaluate(&bars, 18050, "TXF");
        assert_eq!(signal.signal_type, SignalType::EntryLong);
    }

    #[test]
    fn on_position_closed_resets_cooldown() {
        let mut strat = ScalpStrategy::new(ScalpConfig::default());
        strat.bars_since_last_exit = 50;
        strat.on_position_closed();
        assert_eq!(strat.bars_since_last_exit, 0);
    }
}
