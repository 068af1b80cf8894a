use txf_types::{Direction, ExitReason};

/// Replay-loop knobs. `warmup_bars` bars are consumed before the first
/// strategy evaluation so indicators (MACD, ADX, Bollinger bands, ...) have
/// enough history to be meaningful on their first real call.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestConfig {
    pub warmup_bars: usize,
    pub initial_cash_twd: i64,
    pub slippage_points: i64,
}

impl BacktestConfig {
    pub fn new(initial_cash_twd: i64, slippage_points: i64) -> Self {
        Self {
            warmup_bars: 30,
            initial_cash_twd,
            slippage_points,
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::new(1_000_000, 1)
    }
}

/// One realized leg-close: entry shared across a position's legs, exit
/// specific to the leg that just fired.
#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub direction: Direction,
    pub entry_price: i64,
    pub entry_time: i64,
    pub exit_price: i64,
    pub exit_time: i64,
    pub quantity: i64,
    pub reason: ExitReason,
    pub pnl_points: i64,
    pub pnl_twd: i64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl_twd > 0
    }
}

/// Aggregate performance figures over a unit's closed trades and equity
/// curve.
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub total_trades: usize,
    pub win_rate: f64,
    pub total_pnl_points: i64,
    pub total_pnl_twd: i64,
    /// Gross profit / gross loss. `+inf` when there are winners and no
    /// losers; `0.0` when there are neither.
    pub profit_factor: f64,
    /// Largest peak-to-trough fraction of the equity curve, as a positive
    /// ratio (0.1 == 10%).
    pub max_drawdown: f64,
    /// Mean/stddev of per-bar equity returns. Deliberately *not*
    /// annualized — see the crate-level docs.
    pub sharpe_ratio: f64,
}

/// Buy-and-hold benchmark: enter at `bars[warmup_bars].close`, exit at the
/// last bar's close, sized to the run's largest single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct BuyHoldResult {
    pub entry_price: i64,
    pub exit_price: i64,
    pub quantity: i64,
    pub pnl_twd: i64,
    pub return_pct: f64,
    pub max_drawdown: f64,
}

/// Full report for one trading unit.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitReport {
    pub name: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<(i64, i64)>,
    pub stats: Statistics,
}

/// Top-level result of a driver run: one report per unit plus the shared
/// buy-and-hold benchmark.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestReport {
    pub units: Vec<UnitReport>,
    pub buy_hold: BuyHoldResult,
}
