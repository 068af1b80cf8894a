use chrono::{NaiveDate, NaiveTime};
use txf_indicators::bollinger_bands;
use txf_types::{Bar, EntryOverrides, Signal, SignalType};

use crate::{bar_date, bar_time_of_day, parse_hh_mm, Strategy};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Idle,
    TouchLower,
    ReversalLong,
    TouchUpper,
    ReversalShort,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TakeProfitTarget {
    Middle,
    Opposite,
    Hybrid,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BollingerConfig {
    pub bb_period: usize,
    pub bb_std: f64,
    pub session_start_time: String,
    pub entry_end_time: String,
    pub session_end_time: String,
    pub tp_target: TakeProfitTarget,
    pub tp_buffer: i64,
    pub hybrid_ts_trail_points: i64,
    pub sl_buffer: i64,
    pub trend_filter_bars: usize,
    pub long_only: bool,
    pub short_only: bool,
    pub max_entries_per_day: u32,
    pub cooldown_bars: usize,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            bb_period: 20,
            bb_std: 3.0,
            session_start_time: "09:05".to_string(),
            entry_end_time: "13:00".to_string(),
            session_end_time: "13:45".to_string(),
            tp_target: TakeProfitTarget::Middle,
            tp_buffer: 5,
            hybrid_ts_trail_points: 30,
            sl_buffer: 10,
            trend_filter_bars: 4,
            long_only: false,
            short_only: false,
            max_entries_per_day: 99,
            cooldown_bars: 2,
        }
    }
}

/// Five-state mean-reversion machine: wait for a touch of a band, confirm a
/// stalling/reversal bar, then enter on the breakout of that bar's extreme.
pub struct BollingerStrategy {
    config: BollingerConfig,
    session_start: NaiveTime,
    entry_end: NaiveTime,
    session_end: NaiveTime,

    current_date: Option<NaiveDate>,
    state: State,
    trades_today: u32,
    bars_since_exit: usize,
    reversal_bar: Option<Bar>,
    recent_low: i64,
    recent_high: i64,
}

impl BollingerStrategy {
    pub fn new(config: BollingerConfig) -> Self {
        let session_start = parse_hh_mm(&config.session_start_time);
        let entry_end = parse_hh_mm(&config.entry_end_time);
        let session_end = parse_hh_mm(&config.session_end_time);
        Self {
            config,
            session_start,
            entry_end,
            session_end,
            current_date: None,
            state: State::Idle,
            trades_today: 0,
            bars_since_exit: 999,
            reversal_bar: None,
            recent_low: 0,
            recent_high: 0,
        }
    }

    fn reset_daily_state(&mut self) {
        self.state = State::Idle;
        self.trades_today = 0;
        self.bars_since_exit = 999;
        self.reversal_bar = None;
        self.recent_low = 0;
        self.recent_high = 0;
    }

    fn is_reversal_bullish(bar: &Bar) -> bool {
        let body = (bar.close - bar.open).unsigned_abs() as f64;
        let lower_shadow = (bar.open.min(bar.close) - bar.low) as f64;
        let range = (bar.high - bar.low) as f64;
        if range <= 0.0 {
            return false;
        }
        if bar.close > bar.open && body > range * 0.2 {
            return true;
        }
        lower_shadow > range * 0.4
    }

    fn is_reversal_bearish(bar: &Bar) -> bool {
        let body = (bar.close - bar.open).unsigned_abs() as f64;
        let upper_shadow = (bar.high - bar.open.max(bar.close)) as f64;
        let range = (bar.high - bar.low) as f64;
        if range <= 0.0 {
            return false;
        }
        if bar.close < bar.open && body > range * 0.2 {
            return true;
        }
        upper_shadow > range * 0.4
    }

    fn is_hugging_band(&self, bars: &[Bar], upper: f64, lower: f64) -> bool {
        let n = self.config.trend_filter_bars;
        if bars.len() < n {
            return false;
        }
        let recent = &bars[bars.len() - n..];
        let hugging_upper = recent.iter().all(|b| b.close as f64 >= upper * 0.998);
        let hugging_lower = recent.iter().all(|b| b.close as f64 <= lower * 1.002);
        hugging_upper || hugging_lower
    }

    #[allow(clippy::too_many_arguments)]
    fn update_state(
        &mut self,
        bar: &Bar,
        close: i64,
        upper: f64,
        middle: f64,
        lower: f64,
        symbol: &str,
        current_price: i64,
    ) -> Option<Signal> {
        match self.state {
            State::Idle => {
                if !self.config.short_only && (close as f64) <= lower {
                    self.state = State::TouchLower;
                    self.recent_low = bar.low;
                } else if !self.config.long_only && (close as f64) >= upper {
                    self.state = State::TouchUpper;
                    self.recent_high = bar.high;
                }
                None
            }
            State::TouchLower => {
                self.recent_low = self.recent_low.min(bar.low);
                if Self::is_reversal_bullish(bar) {
                    self.state = State::ReversalLong;
                    self.reversal_bar = Some(bar.clone());
                } else if (close as f64) > middle {
                    self.state = State::Idle;
                }
                None
            }
            State::ReversalLong => {
                if let Some(reversal_bar) = self.reversal_bar.clone() {
                    if close > reversal_bar.high {
                        self.state = State::Idle;
                        self.trades_today += 1;
                        return Some(self.build_long_entry(middle, upper, symbol, current_price));
                    }
                }
                if (close as f64) <= lower {
                    self.state = State::TouchLower;
                    self.recent_low = self.recent_low.min(bar.low);
                } else if (close as f64) > middle {
                    self.state = State::Idle;
                }
                None
            }
            State::TouchUpper => {
                self.recent_high = self.recent_high.max(bar.high);
                if Self::is_reversal_bearish(bar) {
                    self.state = State::ReversalShort;
                    self.reversal_bar = Some(bar.clone());
                } else if (close as f64) < middle {
                    self.state = State::Idle;
                }
                None
            }
            State::ReversalShort => {
                if let Some(reversal_bar) = self.reversal_bar.clone() {
                    if close < reversal_bar.low {
                        self.state = State::Idle;
                        self.trades_today += 1;
                        return Some(self.build_short_entry(middle, lower, symbol, current_price));
                    }
                }
                if (close as f64) >= upper {
                    self.state = State::TouchUpper;
                    self.recent_high = self.recent_high.max(bar.high);
                } else if (close as f64) < middle {
                    self.state = State::Idle;
                }
                None
            }
        }
    }

    fn build_long_entry(&self, middle: f64, upper: f64, symbol: &str, entry: i64) -> Signal {
        let sl_price = self.recent_low - self.config.sl_buffer;
        let mid_dist = middle as i64 - self.config.tp_buffer - entry;
        let opp_dist = upper as i64 - self.config.tp_buffer - entry;
        let tp_dist = match self.config.tp_target {
            TakeProfitTarget::Opposite => opp_dist,
            _ => mid_dist,
        };

        let mut overrides = EntryOverrides {
            stop_loss_price: Some(sl_price),
            take_profit_points: Some(tp_dist.max(20)),
            ..Default::default()
        };
        if self.config.tp_target == TakeProfitTarget::Hybrid {
            overrides.start_trailing_stop_points = Some(mid_dist.max(20));
            overrides.trailing_stop_points = Some(self.config.hybrid_ts_trail_points);
        }

        Signal {
            signal_type: SignalType::EntryLong,
            symbol: symbol.to_string(),
            price: entry,
            quantity: 0,
            overrides,
        }
    }

    fn build_short_entry(&self, middle: f64, lower: f64, symbol: &str, entry: i64) -> Signal {
        let sl_price = self.recent_high + self.config.sl_buffer;
        let mid_dist = entry - (middle as i64 + self.config.tp_buffer);
        let opp_dist = entry - (lower as i64 + self.config.tp_buffer);
        let tp_dist = match self.config.tp_target {
            TakeProfitTarget::Opposite => opp_dist,
            _ => mid_dist,
        };

        let mut overrides = EntryOverrides {
            stop_loss_price: Some(sl_price),
            take_profit_points: Some(tp_dist.max(20)),
            ..Default::default()
        };
        if self.config.tp_target == TakeProfitTarget::Hybrid {
            overrides.start_trailing_stop_points = Some(mid_dist.max(20));
            overrides.trailing_stop_points = Some(self.config.hybrid_ts_trail_points);
        }

        Signal {
            signal_type: SignalType::EntryShort,
            symbol: symbol.to_string(),
            price: entry,
            quantity: 0,
            overrides,
        }
    }
}

impl Strategy for BollingerStrategy {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
        if bars.len() < self.config.bb_period + 2 {
            return Signal::hold(symbol);
        }
        let latest = bars.last().unwrap();
        let Some(today) = bar_date(latest.time) else {
            return Signal::hold(symbol);
        };
        if self.current_date != Some(today) {
            self.reset_daily_state();
            self.current_date = Some(today);
        }

        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        if self.session_start != midnight {
            let Some(t) = bar_time_of_day(latest.time) else {
                return Signal::hold(symbol);
            };
            if t < self.session_start || t >= self.session_end || t >= self.entry_end {
                return Signal::hold(symbol);
            }
        }

        if self.trades_today >= self.config.max_entries_per_day {
            return Signal::hold(symbol);
        }

        self.bars_since_exit += 1;
        if self.bars_since_exit < self.config.cooldown_bars {
            return Signal::hold(symbol);
        }

        let Some((upper, middle, lower)) = bollinger_bands(bars, self.config.bb_period, self.config.bb_std) else {
            return Signal::hold(symbol);
        };

        if self.is_hugging_band(bars, upper, lower) {
            self.state = State::Idle;
            return Signal::hold(symbol);
        }

        let close = latest.close;
        match self.update_state(latest, close, upper, middle, lower, symbol, current_price) {
            Some(signal) => signal,
            None => Signal::hold(symbol),
        }
    }

    fn on_position_closed(&mut self) {
        self.bars_since_exit = 0;
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_testkit::flat_bars;

    #[test]
    fn idle_transitions_to_touch_lower_then_back_to_idle_on_recovery() {
        let mut strat = BollingerStrategy::new(BollingerConfig::default());
        // Flat bars keep the band effectively at the flat price; use enough
        // bars to clear the warm-up guard without forcing a band touch.
        let bars = flat_bars("TXF", 1704186300, 25, 18000, 100);
        let signal = strat.evaluate(&bars, 18000, "TXF");
        assert_eq!(signal.signal_type, SignalType::Hold);
    }

    #[test]
    fn on_position_closed_resets_state_machine() {
        let mut strat = BollingerStrategy::new(BollingerConfig::default());
        strat.state = State::ReversalLong;
        strat.on_position_closed();
        assert_eq!(strat.state, State::Idle);
    }
}
