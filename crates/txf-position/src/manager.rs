use txf_indicators::{candle_strength, check_death_cross, check_golden_cross, macd};
use txf_types::{
    Bar, Direction, ExitReason, ExitRule, LegStatus, LegType, ManagedPosition, OrderAction,
    PositionLeg, PositionManagerConfig, PositionMetadata, PositionStatus, Signal, SignalType,
};

fn short_position_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Owns at most one [`ManagedPosition`] at a time and turns signals and
/// observed prices into `OrderAction` commands. Never fails: every public
/// method is a pure state transition plus a list of intents for the caller's
/// executor to carry out.
pub struct PositionManager {
    config: PositionManagerConfig,
    position: Option<ManagedPosition>,
    last_fast_stop_check_time: Option<i64>,
}

impl PositionManager {
    pub fn new(config: PositionManagerConfig) -> Self {
        Self {
            config,
            position: None,
            last_fast_stop_check_time: None,
        }
    }

    pub fn config(&self) -> &PositionManagerConfig {
        &self.config
    }

    pub fn has_position(&self) -> bool {
        self.position.as_ref().is_some_and(|p| !p.is_closed())
    }

    pub fn position(&self) -> Option<&ManagedPosition> {
        self.position.as_ref()
    }

    pub fn position_mut(&mut self) -> Option<&mut ManagedPosition> {
        self.position.as_mut()
    }

    fn close_direction(&self) -> Direction {
        match self.position.as_ref().map(|p| p.direction) {
            Some(Direction::Buy) => Direction::Sell,
            _ => Direction::Buy,
        }
    }

    /// Opens a position on `ENTRY_LONG`/`ENTRY_SHORT` if none is held.
    pub fn on_signal(&mut self, signal: &Signal, bars: &[Bar], symbol: &str, sub_symbol: &str) -> Vec<OrderAction> {
        if self.has_position() {
            return Vec::new();
        }
        match signal.signal_type {
            SignalType::EntryLong | SignalType::EntryShort => self.open_position(signal, bars, symbol, sub_symbol),
            SignalType::Hold => Vec::new(),
        }
    }

    fn open_position(&mut self, signal: &Signal, bars: &[Bar], symbol: &str, sub_symbol: &str) -> Vec<OrderAction> {
        let is_long = signal.is_long();
        let direction = if is_long { Direction::Buy } else { Direction::Sell };
        let entry_price = signal.price;
        let overrides = &signal.overrides;

        let stop_loss_price = overrides
            .stop_loss_price
            .or_else(|| overrides.stop_loss_distance.map(|d| if is_long { entry_price - d } else { entry_price + d }))
            .unwrap_or_else(|| Self::calculate_initial_stop_loss(bars, entry_price, is_long, &self.config));

        let take_profit_price = {
            let tp_points = overrides.take_profit_points.or_else(|| {
                PositionManagerConfig::resolve_points(self.config.take_profit_points, self.config.take_profit_points_rate, entry_price)
            });
            tp_points.map(|p| if is_long { entry_price + p } else { entry_price - p })
        };

        let start_trailing_stop_price = {
            let start_points = overrides.start_trailing_stop_points.or(self.config.start_trailing_stop_points);
            start_points.map(|p| if is_long { entry_price + p } else { entry_price - p })
        };

        let (tighten_after_price, tightened_trailing_stop_points) = if self.config.has_tightened_trailing_stop() {
            let tighten_after_points = PositionManagerConfig::resolve_points(
                self.config.tighten_after_points,
                self.config.tighten_after_points_rate,
                entry_price,
            );
            let tightened_points = PositionManagerConfig::resolve_points(
                self.config.tightened_trailing_stop_points,
                self.config.tightened_trailing_stop_points_rate,
                entry_price,
            );
            (
                tighten_after_points.map(|p| if is_long { entry_price + p } else { entry_price - p }),
                tightened_points,
            )
        } else {
            (None, None)
        };

        let position_id = short_position_id();
        let base_rule = ExitRule {
            stop_loss_price,
            take_profit_price: None,
            start_trailing_stop_price,
            trailing_stop_active: false,
            trailing_stop_price: None,
            tighten_after_price,
            tightened_trailing_stop_points,
            is_tightened: false,
        };

        let mut legs = Vec::new();
        if self.config.tp_leg_quantity > 0 {
            let mut exit_rule = base_rule.clone();
            exit_rule.take_profit_price = take_profit_price;
            legs.push(PositionLeg {
                leg_id: format!("{position_id}-TP"),
                leg_type: LegType::TakeProfit,
                quantity: self.config.tp_leg_quantity,
                exit_rule,
                status: LegStatus::Open,
                exit_price: None,
                exit_time: None,
                exit_reason: None,
            });
        }
        if self.config.ts_leg_quantity > 0 {
            legs.push(PositionLeg {
                leg_id: format!("{position_id}-TS"),
                leg_type: LegType::TrailingStop,
                quantity: self.config.ts_leg_quantity,
                exit_rule: base_rule,
                status: LegStatus::Open,
                exit_price: None,
                exit_time: None,
                exit_reason: None,
            });
        }

        let mut metadata = PositionMetadata::default();
        metadata.override_trailing_stop_points = overrides.trailing_stop_points;
        if let Some(levels) = &overrides.key_levels {
            metadata.key_levels = Some(levels.clone());
            metadata.key_level_buffer = overrides.key_level_buffer.unwrap_or(10);
            metadata.key_level_min_profit = overrides.key_level_min_profit.unwrap_or(0);
        }
        if let Some(m) = &overrides.momentum {
            metadata.use_momentum_exit = true;
            metadata.momentum_min_profit = m.min_profit;
            metadata.momentum_lookback = m.lookback;
            metadata.momentum_weak_threshold_milli = m.weak_threshold_milli;
            metadata.momentum_min_weak_bars = m.min_weak_bars;
        }

        self.position = Some(ManagedPosition {
            position_id,
            symbol: symbol.to_string(),
            sub_symbol: sub_symbol.to_string(),
            direction,
            entry_price,
            entry_time: bars.last().map(|b| b.time).unwrap_or(0),
            total_quantity: self.config.total_quantity,
            highest_price: entry_price,
            lowest_price: entry_price,
            status: PositionStatus::Open,
            legs,
            is_in_macd_adverse_cross: false,
            metadata,
        });

        vec![OrderAction::open(direction, symbol, sub_symbol, self.config.total_quantity)]
    }

    fn calculate_initial_stop_loss(bars: &[Bar], entry_price: i64, is_long: bool, config: &PositionManagerConfig) -> i64 {
        let distance = PositionManagerConfig::resolve_points(config.stop_loss_points, config.stop_loss_points_rate, entry_price).unwrap_or(0);

        if bars.len() >= 31 {
            let window = &bars[bars.len() - 31..];
            if is_long {
                let min_low = window.iter().map(|b| b.low).min().unwrap();
                return min_low - distance;
            } else {
                let max_high = window.iter().map(|b| b.high).max().unwrap();
                return max_high + distance;
            }
        }

        if is_long { entry_price - distance } else { entry_price + distance }
    }

    /// Updates price extremes, then runs fast-stop / momentum / per-leg exit
    /// checks and trailing updates, in that order. `bars`, when supplied, is
    /// used only by the fast-stop and momentum-exhaustion checks.
    pub fn on_price_update(&mut self, current_price: i64, bars: Option<&[Bar]>) -> Vec<OrderAction> {
        if !self.has_position() {
            return Vec::new();
        }

        {
            let position = self.position.as_mut().unwrap();
            position.highest_price = position.highest_price.max(current_price);
            position.lowest_price = position.lowest_price.min(current_price);
        }

        if let Some(bars) = bars {
            if self.config.enable_macd_fast_stop {
                if self.check_macd_fast_stop(current_price, bars) {
                    return self.close_all_legs(current_price, ExitReason::FastStop);
                }
            }
            if self.check_momentum_exhaustion(current_price, bars) {
                return self.close_all_legs(current_price, ExitReason::MomentumExit);
            }
        }

        let actions = self.check_leg_exits(current_price);
        self.update_trailing_stops(current_price);
        actions
    }

    fn check_leg_exits(&self, current_price: i64) -> Vec<OrderAction> {
        let Some(position) = self.position.as_ref() else { return Vec::new() };
        let is_long = position.direction.is_long();
        let close_direction = self.close_direction();
        let mut actions = Vec::new();

        for leg in position.open_legs() {
            let er = &leg.exit_rule;

            let sl_hit = if is_long { current_price <= er.stop_loss_price } else { current_price >= er.stop_loss_price };
            if sl_hit {
                actions.push(OrderAction::close_leg(
                    close_direction,
                    &position.symbol,
                    &position.sub_symbol,
                    leg.quantity,
                    &leg.leg_id,
                    ExitReason::StopLoss,
                    Some(er.stop_loss_price),
                ));
                continue;
            }

            if er.trailing_stop_active {
                if let Some(ts_price) = er.trailing_stop_price {
                    let ts_hit = if is_long { current_price <= ts_price } else { current_price >= ts_price };
                    if ts_hit {
                        actions.push(OrderAction::close_leg(
                            close_direction,
                            &position.symbol,
                            &position.sub_symbol,
                            leg.quantity,
                            &leg.leg_id,
                            ExitReason::TrailingStop,
                            Some(ts_price),
                        ));
                        continue;
                    }
                }
            }

            if leg.leg_type == LegType::TakeProfit {
                if let Some(tp_price) = er.take_profit_price {
                    let tp_hit = if is_long { current_price >= tp_price } else { current_price <= tp_price };
                    if tp_hit {
                        actions.push(OrderAction::close_leg(
                            close_direction,
                            &position.symbol,
                            &position.sub_symbol,
                            leg.quantity,
                            &leg.leg_id,
                            ExitReason::TakeProfit,
                            Some(tp_price),
                        ));
                    }
                }
            }
        }

        actions
    }

    /// Current trailing distance for a leg: tightened distance once
    /// tightened, else the position's per-trade override, else the
    /// config-resolved default distance.
    fn resolve_trailing_distance(
        exit_rule: &ExitRule,
        override_points: Option<i64>,
        config_distance: i64,
    ) -> i64 {
        if exit_rule.is_tightened {
            if let Some(p) = exit_rule.tightened_trailing_stop_points {
                return p;
            }
        }
        override_points.unwrap_or(config_distance)
    }

    fn update_trailing_stops(&mut self, current_price: i64) {
        let trailing_stop_points = self.config.trailing_stop_points;
        let trailing_stop_points_rate = self.config.trailing_stop_points_rate;

        let Some(position) = self.position.as_mut() else { return };
        let is_long = position.direction.is_long();
        let override_points = position.metadata.override_trailing_stop_points;
        let config_distance =
            PositionManagerConfig::resolve_points(trailing_stop_points, trailing_stop_points_rate, position.entry_price).unwrap_or(0);

        if let Some(key_levels) = position.metadata.key_levels.clone() {
            let min_profit = position.metadata.key_level_min_profit;
            let unrealized = position.unrealized_points(current_price);
            if min_profit <= 0 || unrealized >= min_profit {
                Self::update_key_level_trailing(position, &key_levels, current_price, is_long);
                if position.metadata.next_key_level_idx < key_levels.len() {
                    return;
                }
                Self::update_dynamic_post_key_level_trailing(position, current_price, is_long);
                return;
            }
        }

        for leg in position.legs.iter_mut().filter(|l| l.is_open()) {
            let er = &mut leg.exit_rule;
            let Some(start_price) = er.start_trailing_stop_price else { continue };

            if !er.trailing_stop_active {
                let should_activate = if is_long { current_price >= start_price } else { current_price <= start_price };
                if should_activate {
                    er.trailing_stop_active = true;
                    let ts_points = Self::resolve_trailing_distance(er, override_points, config_distance);
                    er.trailing_stop_price = Some(if is_long { current_price - ts_points } else { current_price + ts_points });
                }
                continue;
            }

            if !er.is_tightened {
                if let (Some(tighten_after), Some(tightened_points)) = (er.tighten_after_price, er.tightened_trailing_stop_points) {
                    let should_tighten = if is_long { current_price >= tighten_after } else { current_price <= tighten_after };
                    if should_tighten {
                        er.is_tightened = true;
                        let new_stop = if is_long { current_price - tightened_points } else { current_price + tightened_points };
                        let improves = match er.trailing_stop_price {
                            None => true,
                            Some(existing) => if is_long { new_stop > existing } else { new_stop < existing },
                        };
                        if improves {
                            er.trailing_stop_price = Some(new_stop);
                        }
                        continue;
                    }
                }
            }

            let ts_points = Self::resolve_trailing_distance(er, override_points, config_distance);
            let new_stop = if is_long { current_price - ts_points } else { current_price + ts_points };
            let improves = match er.trailing_stop_price {
                None => true,
                Some(existing) => if is_long { new_stop > existing } else { new_stop < existing },
            };
            if improves {
                er.trailing_stop_price = Some(new_stop);
            }
        }
    }

    fn update_key_level_trailing(position: &mut ManagedPosition, key_levels: &[i64], current_price: i64, is_long: bool) {
        let buffer = position.metadata.key_level_buffer;
        let mut idx = position.metadata.next_key_level_idx;

        while idx < key_levels.len() {
            let next_level = key_levels[idx];
            let crossed = if is_long { current_price > next_level } else { current_price < next_level };
            if !crossed {
                break;
            }
            let stop_price = if is_long { next_level - buffer } else { next_level + buffer };
            for leg in position.legs.iter_mut().filter(|l| l.is_open()) {
                let er = &mut leg.exit_rule;
                er.trailing_stop_active = true;
                let improves = match er.trailing_stop_price {
                    None => true,
                    Some(existing) => if is_long { stop_price > existing } else { stop_price < existing },
                };
                if improves {
                    er.trailing_stop_price = Some(stop_price);
                }
            }
            idx += 1;
        }
        position.metadata.next_key_level_idx = idx;
    }

    fn update_dynamic_post_key_level_trailing(position: &mut ManagedPosition, current_price: i64, is_long: bool) {
        let dynamic_ts = (position.entry_price as f64 * 0.005) as i64;
        for leg in position.legs.iter_mut().filter(|l| l.is_open()) {
            let er = &mut leg.exit_rule;
            if !er.trailing_stop_active {
                continue;
            }
            let new_stop = if is_long { current_price - dynamic_ts } else { current_price + dynamic_ts };
            let improves = match er.trailing_stop_price {
                None => true,
                Some(existing) => if is_long { new_stop > existing } else { new_stop < existing },
            };
            if improves {
                er.trailing_stop_price = Some(new_stop);
            }
        }
    }

    fn check_macd_fast_stop(&mut self, current_price: i64, bars: &[Bar]) -> bool {
        if bars.len() < 35 {
            return false;
        }
        let latest_time = bars.last().unwrap().time;
        if self.last_fast_stop_check_time == Some(latest_time) {
            return false;
        }
        self.last_fast_stop_check_time = Some(latest_time);

        let position = self.position.as_mut().unwrap();
        let is_long = position.direction.is_long();
        let current_profit = position.unrealized_points(current_price);
        let stop_loss_threshold =
            PositionManagerConfig::resolve_points(self.config.stop_loss_points, self.config.stop_loss_points_rate, position.entry_price)
                .unwrap_or(0);

        let any_trailing_active = position.open_legs().any(|l| l.exit_rule.trailing_stop_active);

        if position.is_in_macd_adverse_cross && !any_trailing_active && current_profit < -stop_loss_threshold {
            return true;
        }

        let macd_seq = macd(bars, 12, 26, 9);
        let is_death_cross = check_death_cross(&macd_seq, None);
        let is_golden_cross = check_golden_cross(&macd_seq, None);

        let (is_adverse_cross, is_favorable_cross) = if is_long {
            (is_death_cross, is_golden_cross)
        } else {
            (is_golden_cross, is_death_cross)
        };

        if is_adverse_cross {
            position.is_in_macd_adverse_cross = true;
            if !any_trailing_active && current_profit < -stop_loss_threshold {
                return true;
            }
        } else if is_favorable_cross && position.is_in_macd_adverse_cross {
            position.is_in_macd_adverse_cross = false;
        }

        false
    }

    fn check_momentum_exhaustion(&mut self, current_price: i64, bars: &[Bar]) -> bool {
        let position = self.position.as_mut().unwrap();
        if !position.metadata.use_momentum_exit {
            return false;
        }

        let is_long = position.direction.is_long();
        let unrealized = position.unrealized_points(current_price);
        if unrealized < position.metadata.momentum_min_profit {
            return false;
        }

        let lookback = position.metadata.momentum_lookback;
        if bars.len() < lookback + 2 {
            return false;
        }

        let latest_time = bars.last().unwrap().time;
        if position.metadata.last_momentum_check_time == Some(latest_time) {
            return false;
        }
        position.metadata.last_momentum_check_time = Some(latest_time);

        let recent = &bars[bars.len() - lookback..];
        let weak_threshold = position.metadata.momentum_weak_threshold_milli as f64 / 1000.0;

        let mut consecutive_weak = 0usize;
        for bar in recent.iter().rev() {
            let strength = candle_strength(bar);
            let is_weak = if is_long { strength < weak_threshold } else { strength > 1.0 - weak_threshold };
            if is_weak {
                consecutive_weak += 1;
            } else {
                break;
            }
        }

        let bodies: Vec<f64> = recent.iter().map(|b| (b.close - b.open).abs() as f64).collect();
        let mut shrinking = 0usize;
        for i in 1..bodies.len() {
            if bodies[i] < bodies[i - 1] * 0.7 {
                shrinking += 1;
            }
        }

        let min_weak_bars = position.metadata.momentum_min_weak_bars;
        if consecutive_weak >= min_weak_bars {
            return true;
        }
        if lookback >= 2 && shrinking >= lookback - 2 && consecutive_weak >= 2 {
            return true;
        }
        false
    }

    fn close_all_legs(&self, current_price: i64, exit_reason: ExitReason) -> Vec<OrderAction> {
        let Some(position) = self.position.as_ref() else { return Vec::new() };
        let total_quantity: i64 = position.open_legs().map(|l| l.quantity).sum();
        if total_quantity == 0 {
            return Vec::new();
        }
        let leg_ids: Vec<String> = position.open_legs().map(|l| l.leg_id.clone()).collect();
        let _ = current_price;
        vec![OrderAction::close_all(
            self.close_direction(),
            &position.symbol,
            &position.sub_symbol,
            total_quantity,
            leg_ids,
            exit_reason,
        )]
    }

    /// Closes the named leg at the given fill; clears the held position once
    /// every leg has closed.
    pub fn on_fill(&mut self, leg_id: &str, fill_price: i64, fill_time: i64, exit_reason: ExitReason) {
        let Some(position) = self.position.as_mut() else { return };
        if let Some(leg) = position.legs.iter_mut().find(|l| l.leg_id == leg_id) {
            leg.status = LegStatus::Closed;
            leg.exit_price = Some(fill_price);
            leg.exit_time = Some(fill_time);
            leg.exit_reason = Some(exit_reason);
        }
        position.recompute_status();
        if position.is_closed() {
            self.position = None;
            self.last_fast_stop_check_time = None;
        }
    }

    /// Force-exit at the end of the trading day. "HH:MM" comparison only;
    /// the caller is expected to pass the same calendar day's bars throughout.
    pub fn check_time_exit(&self, current_hour: u32, current_minute: u32, current_price: i64) -> Vec<OrderAction> {
        if !self.has_position() {
            return Vec::new();
        }
        let Some(force_exit_time) = self.config.force_exit_time.as_deref() else { return Vec::new() };
        let Some((exit_h, exit_m)) = parse_hh_mm(force_exit_time) else { return Vec::new() };

        if current_hour > exit_h || (current_hour == exit_h && current_minute >= exit_m) {
            return self.close_all_legs(current_price, ExitReason::TimeExit);
        }
        Vec::new()
    }

    pub fn reset(&mut self) {
        self.position = None;
        self.last_fast_stop_check_time = None;
    }
}

fn parse_hh_mm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    Some((h.parse().ok()?, m.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_testkit::flat_bars;
    use txf_types::{EntryOverrides, MomentumParams, Signal, SignalType};

    fn long_signal(price: i64) -> Signal {
        Signal {
            signal_type: SignalType::EntryLong,
            symbol: "TXF".to_string(),
            price,
            quantity: 4,
            overrides: EntryOverrides::default(),
        }
    }

    fn short_signal(price: i64) -> Signal {
        Signal {
            signal_type: SignalType::EntryShort,
            symbol: "TXF".to_string(),
            price,
            quantity: 4,
            overrides: EntryOverrides::default(),
        }
    }

    fn default_pm() -> PositionManager {
        let config = PositionManagerConfig::new(4, 2, 2).unwrap();
        PositionManager::new(config)
    }

    #[test]
    fn opens_position_and_ignores_second_signal() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        let actions = pm.on_signal(&long_signal(18000), &bars, "TXF", "TXF01");
        assert_eq!(actions.len(), 1);
        assert!(pm.has_position());
        assert_eq!(pm.position().unwrap().legs.len(), 2);

        let actions2 = pm.on_signal(&long_signal(18100), &bars, "TXF", "TXF01");
        assert!(actions2.is_empty());
        assert_eq!(pm.position().unwrap().entry_price, 18000);
    }

    #[test]
    fn construction_rejects_leg_quantity_mismatch() {
        assert!(PositionManagerConfig::new(4, 1, 1).is_err());
    }

    #[test]
    fn stop_loss_fires_long() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        pm.on_signal(&long_signal(18000), &bars, "TXF", "TXF01");
        let sl = pm.position().unwrap().legs[0].exit_rule.stop_loss_price;

        let actions = pm.on_price_update(sl - 1, None);
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.exit_reason == Some(ExitReason::StopLoss)));
    }

    #[test]
    fn take_profit_fires_only_tp_leg() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        pm.on_signal(&long_signal(18000), &bars, "TXF", "TXF01");
        let tp = pm.position().unwrap().legs[0].exit_rule.take_profit_price.unwrap();

        let actions = pm.on_price_update(tp, None);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].exit_reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn trailing_stop_activates_and_is_monotonic_long() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        pm.on_signal(&long_signal(18000), &bars, "TXF", "TXF01");

        pm.on_price_update(18200, None);
        let ts_leg = pm.position().unwrap().legs.iter().find(|l| l.leg_type == LegType::TrailingStop).unwrap();
        assert!(ts_leg.exit_rule.trailing_stop_active);
        let first_stop = ts_leg.exit_rule.trailing_stop_price.unwrap();
        assert_eq!(first_stop, 18200 - 200);

        pm.on_price_update(18100, None);
        let ts_leg = pm.position().unwrap().legs.iter().find(|l| l.leg_type == LegType::TrailingStop).unwrap();
        assert_eq!(ts_leg.exit_rule.trailing_stop_price, Some(first_stop));

        pm.on_price_update(18400, None);
        let ts_leg = pm.position().unwrap().legs.iter().find(|l| l.leg_type == LegType::TrailingStop).unwrap();
        assert_eq!(ts_leg.exit_rule.trailing_stop_price, Some(18400 - 200));
    }

    #[test]
    fn key_level_trailing_advances_cursor_and_then_goes_dynamic() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        let mut signal = long_signal(18000);
        signal.overrides.key_levels = Some(vec![18100, 18200]);
        signal.overrides.key_level_buffer = Some(10);
        pm.on_signal(&signal, &bars, "TXF", "TXF01");

        pm.on_price_update(18150, None);
        let leg = &pm.position().unwrap().legs[0];
        assert_eq!(leg.exit_rule.trailing_stop_price, Some(18100 - 10));
        assert_eq!(pm.position().unwrap().metadata.next_key_level_idx, 1);

        pm.on_price_update(18250, None);
        let leg = &pm.position().unwrap().legs[0];
        assert_eq!(leg.exit_rule.trailing_stop_price, Some(18200 - 10));
        assert_eq!(pm.position().unwrap().metadata.next_key_level_idx, 2);

        pm.on_price_update(18400, None);
        let dynamic_distance = (18000_f64 * 0.005) as i64;
        let leg = &pm.position().unwrap().legs[0];
        assert_eq!(leg.exit_rule.trailing_stop_price, Some(18400 - dynamic_distance));
    }

    #[test]
    fn time_exit_closes_all_open_legs() {
        let mut pm = default_pm();
        pm.config.force_exit_time = Some("13:30".to_string());
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        pm.on_signal(&long_signal(18000), &bars, "TXF", "TXF01");

        let actions = pm.check_time_exit(13, 0, 18000);
        assert!(actions.is_empty());

        let actions = pm.check_time_exit(13, 30, 18050);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].exit_reason, Some(ExitReason::TimeExit));
        assert_eq!(actions[0].leg_ids.len(), 2);
    }

    #[test]
    fn on_fill_closes_leg_and_clears_position_when_all_closed() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        pm.on_signal(&long_signal(18000), &bars, "TXF", "TXF01");
        let leg_ids: Vec<String> = pm.position().unwrap().legs.iter().map(|l| l.leg_id.clone()).collect();

        pm.on_fill(&leg_ids[0], 18500, 100, ExitReason::TakeProfit);
        assert!(pm.has_position());

        pm.on_fill(&leg_ids[1], 18500, 100, ExitReason::TrailingStop);
        assert!(!pm.has_position());
    }

    #[test]
    fn short_stop_loss_direction_is_mirrored() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 5, 18000, 100);
        pm.on_signal(&short_signal(18000), &bars, "TXF", "TXF01");
        let sl = pm.position().unwrap().legs[0].exit_rule.stop_loss_price;
        assert!(sl > 18000);

        let actions = pm.on_price_update(sl + 1, None);
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.action == Direction::Buy));
    }

    #[test]
    fn momentum_exit_requires_profit_gate() {
        let mut pm = default_pm();
        let bars = flat_bars("TXF", 0, 40, 18000, 100);
        let mut signal = long_signal(18000);
        signal.overrides.momentum = Some(MomentumParams {
            min_profit: 100,
            lookback: 5,
            weak_threshold_milli: 450,
            min_weak_bars: 3,
        });
        pm.on_signal(&signal, &bars, "TXF", "TXF01");

        let actions = pm.on_price_update(18050, Some(&bars));
        assert!(actions.is_empty());
    }
}
