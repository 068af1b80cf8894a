use chrono::Timelike;
use tracing::debug;
use txf_execution::{BacktestExecutor, Executor};
use txf_position::PositionManager;
use txf_strategy::Strategy;
use txf_types::{point_value, Bar, Direction, ExitReason, OrderAction, Signal};

use crate::fill_price::resolve_fill_price;
use crate::stats::{compute_buy_hold, compute_statistics};
use crate::types::{BacktestConfig, BacktestReport, Trade, UnitReport};

/// One strategy paired with its own position manager. Units are independent:
/// the driver replays the same bar stream through each in turn, but no state
/// crosses between them.
pub struct TradingUnit {
    pub name: String,
    pub symbol: String,
    pub sub_symbol: String,
    pub strategy: Box<dyn Strategy>,
    pub pm: PositionManager,
}

impl TradingUnit {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        sub_symbol: impl Into<String>,
        strategy: Box<dyn Strategy>,
        pm: PositionManager,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            sub_symbol: sub_symbol.into(),
            strategy,
            pm,
        }
    }
}

/// Replays a bar stream through one or more [`TradingUnit`]s and produces a
/// per-unit report plus a shared buy-and-hold benchmark.
///
/// Entirely synchronous and suspension-free: one tight loop over bars per
/// unit, no network or time dependency anywhere in the path.
pub struct BacktestDriver {
    config: BacktestConfig,
    units: Vec<TradingUnit>,
}

impl BacktestDriver {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config, units: Vec::new() }
    }

    pub fn add_unit(&mut self, unit: TradingUnit) -> &mut Self {
        self.units.push(unit);
        self
    }

    pub fn run(&mut self, bars: &[Bar]) -> BacktestReport {
        let benchmark_quantity = self.units.iter().map(|u| u.pm.config().total_quantity).max().unwrap_or(0);
        let benchmark_symbol = self.units.first().map(|u| u.symbol.clone()).unwrap_or_default();
        let buy_hold = compute_buy_hold(bars, self.config.warmup_bars, benchmark_quantity, &benchmark_symbol);

        let units = self.units.iter_mut().map(|unit| run_unit(unit, bars, &self.config)).collect();

        BacktestReport { units, buy_hold }
    }
}

fn hour_minute(time: i64) -> (u32, u32) {
    match chrono::DateTime::from_timestamp(time, 0) {
        Some(dt) => (dt.hour(), dt.minute()),
        None => (0, 0),
    }
}

fn run_unit(unit: &mut TradingUnit, bars: &[Bar], config: &BacktestConfig) -> UnitReport {
    if bars.len() <= config.warmup_bars {
        tracing::warn!(unit = %unit.name, bar_count = bars.len(), warmup_bars = config.warmup_bars, "not enough bars to clear warmup");
        return UnitReport {
            name: unit.name.clone(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            stats: compute_statistics(&[], &[]),
        };
    }

    let mut executor = BacktestExecutor::new(config.slippage_points);
    let mut cash = config.initial_cash_twd;
    let mut trades: Vec<Trade> = Vec::new();
    let mut equity_curve: Vec<(i64, i64)> = Vec::new();
    let mut pending: Option<(Signal, usize)> = None;

    for i in config.warmup_bars..bars.len() {
        let bar = &bars[i];
        let sub_bars = &bars[..=i];

        if let Some((signal, signal_idx)) = pending.take() {
            execute_deferred_entry(unit, &signal, signal_idx, bar, bars, &mut executor);
        }

        if unit.pm.has_position() {
            process_exits(unit, bar, sub_bars, &mut executor, &mut cash, &mut trades);
        }

        if !unit.pm.has_position() && pending.is_none() {
            let signal = unit.strategy.evaluate(sub_bars, bar.close, &unit.symbol);
            if signal.is_entry() {
                pending = Some((signal, i));
            }
        }

        let unrealized = unit
            .pm
            .position()
            .map(|p| p.unrealized_points(bar.close) * p.total_quantity * point_value(&unit.symbol))
            .unwrap_or(0);
        equity_curve.push((bar.time, cash + unrealized));
    }

    let stats = compute_statistics(&trades, &equity_curve);
    UnitReport {
        name: unit.name.clone(),
        trades,
        equity_curve,
        stats,
    }
}

/// Fills the signal's entry at this bar's open, then opens the position
/// against the *original* signal price so stop-loss/take-profit/trailing
/// distances are derived from the signal-time reference — only
/// `entry_price`/`entry_time`/`highest_price`/`lowest_price` are patched to
/// the realized fill afterward. `bars` passed to `on_signal` stop at the
/// bar the signal was generated on, never reaching into this bar's own
/// high/low/close.
fn execute_deferred_entry(
    unit: &mut TradingUnit,
    signal: &Signal,
    signal_idx: usize,
    bar: &Bar,
    bars: &[Bar],
    executor: &mut BacktestExecutor,
) {
    let direction = if signal.is_long() { Direction::Buy } else { Direction::Sell };
    let probe = OrderAction::open(direction, &unit.symbol, &unit.sub_symbol, unit.pm.config().total_quantity);
    executor.set_market_state(bar.open, bar.time);
    let fill = executor.execute(&probe);

    let prior_bars = &bars[..=signal_idx];
    let actions = unit.pm.on_signal(signal, prior_bars, &unit.symbol, &unit.sub_symbol);
    if actions.is_empty() {
        return;
    }

    if let (Some(price), Some(time)) = (fill.fill_price, fill.fill_time) {
        if let Some(pos) = unit.pm.position_mut() {
            pos.entry_price = price;
            pos.entry_time = time;
            pos.highest_price = price;
            pos.lowest_price = price;
        }
        debug!(unit = %unit.name, symbol = %unit.symbol, price, "entry filled");
    }
}

/// Runs the exit-check chain for one bar: forced time exit, then a gap
/// probe at the open, then a direction-aware probe of the bar's favorable
/// extreme then its adverse one, then the close. Only the first step that
/// returns actions is acted upon — later steps are skipped so a bar that
/// already closed a leg doesn't double-probe it at a second price.
fn process_exits(
    unit: &mut TradingUnit,
    bar: &Bar,
    sub_bars: &[Bar],
    executor: &mut BacktestExecutor,
    cash: &mut i64,
    trades: &mut Vec<Trade>,
) {
    let (hour, minute) = hour_minute(bar.time);
    let mut actions = unit.pm.check_time_exit(hour, minute, bar.close);

    if actions.is_empty() {
        actions = unit.pm.on_price_update(bar.open, Some(sub_bars));
    }
    if actions.is_empty() {
        let is_long = unit.pm.position().map(|p| p.direction.is_long()).unwrap_or(true);
        let (first, second) = if is_long { (bar.low, bar.high) } else { (bar.high, bar.low) };
        actions = unit.pm.on_price_update(first, Some(sub_bars));
        if actions.is_empty() {
            actions = unit.pm.on_price_update(second, Some(sub_bars));
        }
    }
    if actions.is_empty() {
        actions = unit.pm.on_price_update(bar.close, Some(sub_bars));
    }

    if actions.is_empty() {
        return;
    }

    let entry_price = unit.pm.position().map(|p| p.entry_price).unwrap_or(bar.close);
    let entry_time = unit.pm.position().map(|p| p.entry_time).unwrap_or(bar.time);
    let direction = unit.pm.position().map(|p| p.direction).unwrap_or(Direction::Buy);
    let is_long = direction.is_long();

    for action in &actions {
        let reason = action.exit_reason.unwrap_or(ExitReason::Hold);
        let resolved_price = resolve_fill_price(reason, direction, action.trigger_price, bar);
        executor.set_market_state(resolved_price, bar.time);
        let fill = executor.execute(action);
        let fill_price = fill.fill_price.unwrap_or(resolved_price);
        let fill_time = fill.fill_time.unwrap_or(bar.time);

        let leg_ids: Vec<&str> = if !action.leg_ids.is_empty() {
            action.leg_ids.iter().map(String::as_str).collect()
        } else {
            action.leg_id.iter().map(String::as_str).collect()
        };
        for leg_id in leg_ids.iter().copied() {
            unit.pm.on_fill(leg_id, fill_price, fill_time, reason);
        }

        let pnl_points = if is_long { fill_price - entry_price } else { entry_price - fill_price };
        let pnl_twd = pnl_points * action.quantity * point_value(&unit.symbol);
        *cash += pnl_twd;

        debug!(unit = %unit.name, reason = reason.as_str(), pnl_twd, "leg closed");
        trades.push(Trade {
            direction,
            entry_price,
            entry_time,
            exit_price: fill_price,
            exit_time: fill_time,
            quantity: action.quantity,
            reason,
            pnl_points,
            pnl_twd,
        });
    }

    if !unit.pm.has_position() {
        unit.strategy.on_position_closed();
    }
}
