use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use txf_indicators::{adx, candle_strength, ema, rvol, session_vwap};
use txf_types::{Bar, EntryOverrides, MomentumParams, Signal, SignalType};

use crate::{bar_date, bar_time_of_day, parse_hh_mm, Strategy};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BreakoutState {
    Idle,
    WaitingPullback,
    TestingLevel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DailyDirection {
    Long,
    Short,
    Both,
}

#[derive(Copy, Clone, Debug, Default)]
struct SessionOhlc {
    open: i64,
    high: i64,
    low: i64,
    close: i64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrbConfig {
    pub or_bars: usize,
    pub or_start_time: String,
    pub entry_end_time: String,
    pub session_end_time: String,

    pub strong_rvol: f64,
    pub strong_candle: f64,

    pub retest_tolerance_pct: f64,
    pub pullback_timeout_bars: u32,
    pub min_bounce_strength: f64,

    pub tp_multiplier: f64,
    pub ts_start_multiplier: f64,
    pub ts_distance_ratio: f64,

    pub long_only: bool,
    pub use_vwap_filter: bool,
    pub adx_threshold: Option<f64>,
    pub adx_period: usize,

    pub use_prev_pressure_filter: bool,
    pub min_pressure_space_pct: f64,
    pub use_prev_direction_filter: bool,

    pub use_key_level_trailing: bool,
    pub key_level_buffer: i64,
    pub key_level_min_profit_pct: f64,
    pub key_level_min_distance_pct: f64,

    pub use_key_level_tp: bool,
    pub key_level_tp_min_pct: f64,
    pub use_key_level_tp_max: bool,

    pub use_momentum_exit: bool,
    pub momentum_min_profit_pct: f64,
    pub momentum_lookback: usize,
    pub momentum_weak_threshold: f64,
    pub momentum_min_weak_bars: usize,

    pub fixed_tp_points: i64,
    pub max_entries_per_day: u32,

    pub use_ema_direction: bool,
    pub ema_direction_period: usize,

    pub rvol_lookback: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            or_bars: 3,
            or_start_time: "08:45".to_string(),
            entry_end_time: "12:30".to_string(),
            session_end_time: "13:45".to_string(),
            strong_rvol: 1.5,
            strong_candle: 0.7,
            retest_tolerance_pct: 0.3,
            pullback_timeout_bars: 12,
            min_bounce_strength: 0.55,
            tp_multiplier: 2.0,
            ts_start_multiplier: 1.0,
            ts_distance_ratio: 0.5,
            long_only: false,
            use_vwap_filter: false,
            adx_threshold: None,
            adx_period: 14,
            use_prev_pressure_filter: false,
            min_pressure_space_pct: 1.0,
            use_prev_direction_filter: false,
            use_key_level_trailing: false,
            key_level_buffer: 10,
            key_level_min_profit_pct: 0.0,
            key_level_min_distance_pct: 0.0,
            use_key_level_tp: false,
            key_level_tp_min_pct: 0.5,
            use_key_level_tp_max: false,
            use_momentum_exit: false,
            momentum_min_profit_pct: 1.0,
            momentum_lookback: 5,
            momentum_weak_threshold: 0.45,
            momentum_min_weak_bars: 3,
            fixed_tp_points: 0,
            max_entries_per_day: 1,
            use_ema_direction: false,
            ema_direction_period: 200,
            rvol_lookback: 20,
        }
    }
}

/// Dual-mode Opening Range Breakout: a strong-RVOL/strong-candle breakout
/// enters immediately, a weak breakout waits for a pullback-and-retest of
/// the opening range edge. Long and short run independent state machines
/// against a shared opening range computed once per day.
pub struct OrbStrategy {
    config: OrbConfig,
    or_start: NaiveTime,
    entry_end: NaiveTime,
    session_end: NaiveTime,

    current_date: Option<NaiveDate>,
    or_high: Option<i64>,
    or_low: Option<i64>,
    or_mid: Option<i64>,
    or_range: Option<i64>,
    or_calculated: bool,
    long_trades_today: u32,
    short_trades_today: u32,

    long_state: BreakoutState,
    short_state: BreakoutState,
    long_bars_since_breakout: u32,
    short_bars_since_breakout: u32,

    prev_day: Option<SessionOhlc>,
    prev_night: Option<SessionOhlc>,
    daily_adx: Option<f64>,
    daily_direction: DailyDirection,
}

impl OrbStrategy {
    pub fn new(config: OrbConfig) -> Self {
        let or_start = parse_hh_mm(&config.or_start_time);
        let entry_end = parse_hh_mm(&config.entry_end_time);
        let session_end = parse_hh_mm(&config.session_end_time);
        Self {
            config,
            or_start,
            entry_end,
            session_end,
            current_date: None,
            or_high: None,
            or_low: None,
            or_mid: None,
            or_range: None,
            or_calculated: false,
            long_trades_today: 0,
            short_trades_today: 0,
            long_state: BreakoutState::Idle,
            short_state: BreakoutState::Idle,
            long_bars_since_breakout: 0,
            short_bars_since_breakout: 0,
            prev_day: None,
            prev_night: None,
            daily_adx: None,
            daily_direction: DailyDirection::Both,
        }
    }

    fn reset_daily_state(&mut self) {
        self.or_high = None;
        self.or_low = None;
        self.or_mid = None;
        self.or_range = None;
        self.or_calculated = false;
        self.long_trades_today = 0;
        self.short_trades_today = 0;
        self.long_state = BreakoutState::Idle;
        self.short_state = BreakoutState::Idle;
        self.long_bars_since_breakout = 0;
        self.short_bars_since_breakout = 0;
        self.prev_day = None;
        self.prev_night = None;
        self.daily_adx = None;
        self.daily_direction = DailyDirection::Both;
    }

    fn is_day_session(&self, time: i64) -> bool {
        match bar_time_of_day(time) {
            Some(t) => self.or_start <= t && t < self.session_end,
            None => false,
        }
    }

    fn is_in_trading_window(&self, time: i64) -> bool {
        self.or_calculated && bar_time_of_day(time).is_some_and(|t| t <= self.entry_end)
    }

    fn try_calculate_or(&mut self, bars: &[Bar]) -> bool {
        let Some(today) = self.current_date else { return false };

        let today_day_bars: Vec<&Bar> = bars
            .iter()
            .filter(|b| {
                bar_date(b.time) == Some(today)
                    && bar_time_of_day(b.time).is_some_and(|t| t >= self.or_start && t < self.session_end)
            })
            .collect();
        if today_day_bars.len() < self.config.or_bars {
            return false;
        }

        let or_bars = &today_day_bars[..self.config.or_bars];
        let high = or_bars.iter().map(|b| b.high).max().unwrap();
        let low = or_bars.iter().map(|b| b.low).min().unwrap();
        self.or_high = Some(high);
        self.or_low = Some(low);
        self.or_mid = Some((high + low) / 2);
        self.or_range = Some(high - low);
        self.or_calculated = true;

        self.calculate_previous_sessions(bars, today);
        self.daily_adx = adx(bars, self.config.adx_period);

        if self.config.use_ema_direction {
            let ema_series = ema(bars, self.config.ema_direction_period);
            if let Some(&ema_val) = ema_series.last() {
                let open_price = or_bars[0].open as f64;
                self.daily_direction = if open_price >= ema_val { DailyDirection::Long } else { DailyDirection::Short };
            }
        }
        true
    }

    fn calculate_previous_sessions(&mut self, bars: &[Bar], today: NaiveDate) {
        let night_boundary = NaiveTime::from_hms_opt(5, 0, 0).unwrap();
        let night_start = NaiveTime::from_hms_opt(15, 0, 0).unwrap();

        let mut day_sessions: std::collections::BTreeMap<NaiveDate, Vec<&Bar>> = Default::default();
        let mut night_sessions: std::collections::BTreeMap<NaiveDate, Vec<&Bar>> = Default::default();

        for bar in bars {
            let Some(d) = bar_date(bar.time) else { continue };
            let Some(t) = bar_time_of_day(bar.time) else { continue };

            if self.or_start <= t && t < self.session_end && d < today {
                day_sessions.entry(d).or_default().push(bar);
            } else if t >= night_start && d < today {
                night_sessions.entry(d).or_default().push(bar);
            } else if t < night_boundary {
                let ns_date = d.pred_opt().unwrap_or(d);
                if ns_date < today {
                    night_sessions.entry(ns_date).or_default().push(bar);
                }
            }
        }

        if let Some((_, mut bars)) = day_sessions.into_iter().next_back() {
            bars.sort_by_key(|b| b.time);
            self.prev_day = Some(SessionOhlc {
                open: bars[0].open,
                high: bars.iter().map(|b| b.high).max().unwrap(),
                low: bars.iter().map(|b| b.low).min().unwrap(),
                close: bars.last().unwrap().close,
            });
        }
        if let Some((_, mut bars)) = night_sessions.into_iter().next_back() {
            bars.sort_by_key(|b| b.time);
            self.prev_night = Some(SessionOhlc {
                open: bars[0].open,
                high: bars.iter().map(|b| b.high).max().unwrap(),
                low: bars.iter().map(|b| b.low).min().unwrap(),
                close: bars.last().unwrap().close,
            });
        }
    }

    fn check_adx_filter(&self) -> bool {
        match self.config.adx_threshold {
            None => true,
            Some(threshold) => self.daily_adx.is_none_or(|adx| adx >= threshold),
        }
    }

    fn check_vwap_filter(&self, bars: &[Bar], close: i64, is_long: bool) -> bool {
        if !self.config.use_vwap_filter {
            return true;
        }
        let Some(vwap) = session_vwap(bars, self.or_start, self.session_end) else { return true };
        if is_long {
            close as f64 > vwap
        } else {
            (close as f64) < vwap
        }
    }

    fn combined_prev_high(&self) -> Option<i64> {
        [self.prev_day.map(|s| s.high), self.prev_night.map(|s| s.high)].into_iter().flatten().max()
    }

    fn combined_prev_low(&self) -> Option<i64> {
        [self.prev_day.map(|s| s.low), self.prev_night.map(|s| s.low)].into_iter().flatten().min()
    }

    fn check_pressure_space_filter(&self, is_long: bool) -> bool {
        if !self.config.use_prev_pressure_filter {
            return true;
        }
        let Some(or_range) = self.or_range.filter(|&r| r != 0) else { return true };
        let min_space = self.config.min_pressure_space_pct * or_range as f64;

        if is_long {
            let (Some(or_high), Some(prev_high)) = (self.or_high, self.combined_prev_high()) else { return true };
            if or_high >= prev_high {
                return true;
            }
            (prev_high - or_high) as f64 >= min_space
        } else {
            let (Some(or_low), Some(prev_low)) = (self.or_low, self.combined_prev_low()) else { return true };
            if or_low <= prev_low {
                return true;
            }
            (or_low - prev_low) as f64 >= min_space
        }
    }

    fn check_direction_bias_filter(&self, is_long: bool) -> bool {
        if !self.config.use_prev_direction_filter {
            return true;
        }
        let (Some(prev_day), Some(or_mid)) = (self.prev_day, self.or_mid) else { return true };
        if is_long {
            or_mid > prev_day.close
        } else {
            or_mid < prev_day.close
        }
    }

    fn run_filters(&self, bars: &[Bar], close: i64, is_long: bool) -> bool {
        self.check_vwap_filter(bars, close, is_long)
            && self.check_pressure_space_filter(is_long)
            && self.check_direction_bias_filter(is_long)
    }

    fn classify_breakout(&self, bars: &[Bar], is_long: bool) -> bool {
        let latest = bars.last().unwrap();
        let rvol_ok = rvol(bars, self.config.rvol_lookback).is_some_and(|r| r >= self.config.strong_rvol);
        let strength = candle_strength(latest);
        let candle_ok = if is_long { strength >= self.config.strong_candle } else { 1.0 - strength >= self.config.strong_candle };
        rvol_ok && candle_ok
    }

    /// `override_take_profit_points = max(tp_multiplier × OR_Range, key-level
    /// distance when gated in, fixed_tp_points when set)`.
    fn resolve_take_profit_points(&self, is_long: bool, or_range: i64) -> i64 {
        let mut tp_points = (self.config.tp_multiplier * or_range as f64) as i64;

        if self.config.use_key_level_tp && or_range > 0 {
            let min_tp = (self.config.key_level_tp_min_pct * or_range as f64) as i64;
            if let Some(kl_tp) = self.compute_key_level_tp(is_long, min_tp) {
                tp_points = tp_points.max(kl_tp);
            }
        }
        if self.config.fixed_tp_points > 0 {
            tp_points = tp_points.max(self.config.fixed_tp_points);
        }
        tp_points
    }

    fn compute_key_level_tp(&self, is_long: bool, min_tp: i64) -> Option<i64> {
        let mut candidates = Vec::new();
        if let Some(d) = self.prev_day {
            candidates.extend([d.high, d.close, d.low]);
        }
        if let Some(n) = self.prev_night {
            candidates.extend([n.high, n.close, n.low]);
        }

        if is_long {
            let or_high = self.or_high.unwrap_or(0);
            let mut levels: Vec<i64> = candidates.into_iter().filter(|&lv| lv > or_high).collect();
            levels.sort_unstable();
            levels.into_iter().map(|lv| lv - or_high).find(|&dist| dist >= min_tp)
        } else {
            let or_low = self.or_low.unwrap_or(i64::MAX);
            let mut levels: Vec<i64> = candidates.into_iter().filter(|&lv| lv < or_low).collect();
            levels.sort_unstable_by(|a, b| b.cmp(a));
            levels.into_iter().map(|lv| or_low - lv).find(|&dist| dist >= min_tp)
        }
    }

    fn build_key_levels(&self, is_long: bool) -> Vec<i64> {
        let or_range = self.or_range.unwrap_or(0);
        let min_dist = (self.config.key_level_min_distance_pct * or_range as f64) as i64;

        let mut levels: BTreeSet<i64> = BTreeSet::new();
        if is_long {
            let or_high = self.or_high.unwrap_or(0);
            let threshold = or_high + min_dist;
            if let Some(d) = self.prev_day {
                levels.insert(d.high);
                levels.insert(d.close);
            }
            if let Some(n) = self.prev_night {
                levels.insert(n.high);
            }
            levels.retain(|&lv| lv > threshold);
            levels.into_iter().collect()
        } else {
            let or_low = self.or_low.unwrap_or(i64::MAX);
            let threshold = or_low - min_dist;
            if let Some(d) = self.prev_day {
                levels.insert(d.low);
                levels.insert(d.close);
            }
            if let Some(n) = self.prev_night {
                levels.insert(n.low);
            }
            levels.retain(|&lv| lv < threshold);
            levels.into_iter().rev().collect()
        }
    }

    fn build_entry_metadata(&self, is_long: bool) -> EntryOverrides {
        let or_range = self.or_range.unwrap_or(0);
        let mut overrides = EntryOverrides {
            start_trailing_stop_points: Some((self.config.ts_start_multiplier * or_range as f64) as i64),
            trailing_stop_points: Some((self.config.ts_distance_ratio * or_range as f64) as i64),
            stop_loss_price: self.or_mid,
            ..Default::default()
        };

        let tp_points = self.resolve_take_profit_points(is_long, or_range);
        if tp_points > 0 {
            overrides.take_profit_points = Some(tp_points);
        }

        if self.config.use_key_level_trailing {
            let key_levels = self.build_key_levels(is_long);
            if !key_levels.is_empty() {
                overrides.key_level_buffer = Some(self.config.key_level_buffer);
                if self.config.key_level_min_profit_pct > 0.0 {
                    overrides.key_level_min_profit = Some((self.config.key_level_min_profit_pct * or_range as f64) as i64);
                }
                if self.config.use_key_level_tp_max {
                    let entry_ref = if is_long { self.or_high.unwrap_or(0) } else { self.or_low.unwrap_or(0) };
                    let max_level = *key_levels.last().unwrap();
                    let kl_tp_max = if is_long { max_level - entry_ref } else { entry_ref - max_level };
                    if kl_tp_max > 0 {
                        let current_tp = overrides.take_profit_points.unwrap_or(0);
                        overrides.take_profit_points = Some(current_tp.max(kl_tp_max));
                    }
                }
                overrides.key_levels = Some(key_levels);
            }
        }

        if self.config.use_momentum_exit {
            overrides.momentum = Some(MomentumParams {
                min_profit: (self.config.momentum_min_profit_pct * or_range as f64) as i64,
                lookback: self.config.momentum_lookback,
                weak_threshold_milli: (self.config.momentum_weak_threshold * 1000.0) as i64,
                min_weak_bars: self.config.momentum_min_weak_bars,
            });
        }

        overrides
    }

    fn update_long_state(&mut self, bars: &[Bar], close: i64, symbol: &str, current_price: i64) -> Option<Signal> {
        if self.long_trades_today >= self.config.max_entries_per_day {
            return None;
        }
        let or_high = self.or_high?;
        let or_mid = self.or_mid?;
        let or_range = self.or_range?;
        let tolerance = (self.config.retest_tolerance_pct * or_range as f64) as i64;

        match self.long_state {
            BreakoutState::Idle => {
                if close > or_high {
                    if self.classify_breakout(bars, true) {
                        if !self.run_filters(bars, close, true) {
                            return None;
                        }
                        self.long_trades_today += 1;
                        return Some(self.emit_entry(SignalType::EntryLong, symbol, current_price, true));
                    }
                    self.long_state = BreakoutState::WaitingPullback;
                    self.long_bars_since_breakout = 0;
                }
                None
            }
            BreakoutState::WaitingPullback => {
                self.long_bars_since_breakout += 1;
                if self.long_bars_since_breakout > self.config.pullback_timeout_bars {
                    self.long_state = BreakoutState::Idle;
                    return None;
                }
                if close < or_mid {
                    self.long_state = BreakoutState::Idle;
                    return None;
                }
                if or_high - tolerance <= close && close <= or_high + tolerance {
                    self.long_state = BreakoutState::TestingLevel;
                }
                None
            }
            BreakoutState::TestingLevel => {
                self.long_bars_since_breakout += 1;
                if self.long_bars_since_breakout > self.config.pullback_timeout_bars {
                    self.long_state = BreakoutState::Idle;
                    return None;
                }
                if close < or_mid {
                    self.long_state = BreakoutState::Idle;
                    return None;
                }
                let strength = candle_strength(bars.last().unwrap());
                if close > or_high && strength >= self.config.min_bounce_strength {
                    if !self.run_filters(bars, close, true) {
                        return None;
                    }
                    self.long_trades_today += 1;
                    self.long_state = BreakoutState::Idle;
                    return Some(self.emit_entry(SignalType::EntryLong, symbol, current_price, false));
                }
                if close < or_high - tolerance {
                    self.long_state = BreakoutState::WaitingPullback;
                }
                None
            }
        }
    }

    fn update_short_state(&mut self, bars: &[Bar], close: i64, symbol: &str, current_price: i64) -> Option<Signal> {
        if self.short_trades_today >= self.config.max_entries_per_day {
            return None;
        }
        let or_low = self.or_low?;
        let or_mid = self.or_mid?;
        let or_range = self.or_range?;
        let tolerance = (self.config.retest_tolerance_pct * or_range as f64) as i64;

        match self.short_state {
            BreakoutState::Idle => {
                if close < or_low {
                    if self.classify_breakout(bars, false) {
                        if !self.run_filters(bars, close, false) {
                            return None;
                        }
                        self.short_trades_today += 1;
                        return Some(self.emit_entry(SignalType::EntryShort, symbol, current_price, true));
                    }
                    self.short_state = BreakoutState::WaitingPullback;
                    self.short_bars_since_breakout = 0;
                }
                None
            }
            BreakoutState::WaitingPullback => {
                self.short_bars_since_breakout += 1;
                if self.short_bars_since_breakout > self.config.pullback_timeout_bars {
                    self.short_state = BreakoutState::Idle;
                    return None;
                }
                if close > or_mid {
                    self.short_state = BreakoutState::Idle;
                    return None;
                }
                if or_low - tolerance <= close && close <= or_low + tolerance {
                    self.short_state = BreakoutState::TestingLevel;
                }
                None
            }
            BreakoutState::TestingLevel => {
                self.short_bars_since_breakout += 1;
                if self.short_bars_since_breakout > self.config.pullback_timeout_bars {
                    self.short_state = BreakoutState::Idle;
                    return None;
                }
                if close > or_mid {
                    self.short_state = BreakoutState::Idle;
                    return None;
                }
                let strength = 1.0 - candle_strength(bars.last().unwrap());
                if close < or_low && strength >= self.config.min_bounce_strength {
                    if !self.run_filters(bars, close, false) {
                        return None;
                    }
                    self.short_trades_today += 1;
                    self.short_state = BreakoutState::Idle;
                    return Some(self.emit_entry(SignalType::EntryShort, symbol, current_price, false));
                }
                if close > or_low + tolerance {
                    self.short_state = BreakoutState::WaitingPullback;
                }
                None
            }
        }
    }

    fn emit_entry(&self, signal_type: SignalType, symbol: &str, current_price: i64, is_strong: bool) -> Signal {
        let is_long = matches!(signal_type, SignalType::EntryLong);
        let _ = is_strong;
        Signal {
            signal_type,
            symbol: symbol.to_string(),
            price: current_price,
            quantity: 0,
            overrides: self.build_entry_metadata(is_long),
        }
    }
}

impl Strategy for OrbStrategy {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
        if bars.len() < 2 {
            return Signal::hold(symbol);
        }
        let latest = bars.last().unwrap();

        let today = bar_date(latest.time);
        if self.current_date != today {
            self.reset_daily_state();
            self.current_date = today;
        }

        if !self.is_day_session(latest.time) {
            return Signal::hold(symbol);
        }

        if !self.or_calculated {
            self.try_calculate_or(bars);
            return Signal::hold(symbol);
        }

        if self.or_range.is_some_and(|r| r < 10) {
            return Signal::hold(symbol);
        }

        if !self.check_adx_filter() {
            return Signal::hold(symbol);
        }

        let in_window = self.is_in_trading_window(latest.time);
        let close = latest.close;

        if in_window {
            let allow_long = matches!(self.daily_direction, DailyDirection::Long | DailyDirection::Both) || self.config.long_only;
            let allow_short = matches!(self.daily_direction, DailyDirection::Short | DailyDirection::Both) && !self.config.long_only;

            if allow_long {
                if let Some(signal) = self.update_long_state(bars, close, symbol, current_price) {
                    return signal;
                }
            }
            if allow_short {
                if let Some(signal) = self.update_short_state(bars, close, symbol, current_price) {
                    return signal;
                }
            }
        }

        Signal::hold(symbol)
    }

    fn on_position_closed(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_testkit::BarBuilder;

    const DAY_START: i64 = 1704157500; // 2024-01-02T08:45:00Z

    fn or_bar(i: i64, open: i64, high: i64, low: i64, close: i64) -> Bar {
        BarBuilder::new("TXF", DAY_START + i * 300, close).open(open).high(high).low(low).volume(1000).build()
    }

    #[test]
    fn holds_until_opening_range_is_established() {
        let mut strat = OrbStrategy::new(OrbConfig::default());
        let bars = vec![or_bar(0, 100, 105, 95, 100), or_bar(1, 100, 103, 97, 101)];
        let signal = strat.evaluate(&bars, 101, "TXF");
        assert_eq!(signal.signal_type, SignalType::Hold);
        assert!(!strat.or_calculated);
    }

    #[test]
    fn opening_range_locks_in_after_or_bars() {
        let mut strat = OrbStrategy::new(OrbConfig::default());
        let bars = vec![
            or_bar(0, 100, 105, 95, 102),
            or_bar(1, 102, 108, 98, 104),
            or_bar(2, 104, 110, 100, 106),
        ];
        strat.evaluate(&bars, 106, "TXF");
        assert!(strat.or_calculated);
        assert_eq!(strat.or_high, Some(110));
        assert_eq!(strat.or_low, Some(95));
        assert_eq!(strat.or_mid, Some((110 + 95) / 2));
    }

    #[test]
    fn strong_breakout_emits_entry_with_range_derived_overrides() {
        let mut strat = OrbStrategy::new(OrbConfig {
            or_bars: 3,
            adx_threshold: None,
            ..OrbConfig::default()
        });
        let mut bars = vec![
            or_bar(0, 18000, 18020, 17990, 18010),
            or_bar(1, 18010, 18030, 18000, 18020),
            or_bar(2, 18020, 18040, 18010, 18030),
        ];
        strat.evaluate(&bars, 18030, "TXF");
        assert!(strat.or_calculated);

        // Strong breakout bar: closes well above OR_High with a wide high
        // candle and big volume, well inside the trading window.
        bars.push(
            BarBuilder::new("TXF", DAY_START + 3 * 300, 18120)
                .open(18040)
                .high(18125)
                .low(18035)
                .volume(5000)
                .build(),
        );
        let signal = strat.evaluate(&bars, 18120, "TXF");
        assert_eq!(signal.signal_type, SignalType::EntryLong);
        assert_eq!(signal.overrides.stop_loss_price, strat.or_mid);
        assert!(signal.overrides.take_profit_points.is_some());
    }
}
