//! Turns a position manager's `OrderAction` into a `FillResult`. Two
//! implementations: a synchronous backtest executor driven by the replay
//! loop's own market-state cursor, and an async live executor that places a
//! broker order and polls it to completion.

mod backtest;
mod live;

pub use backtest::BacktestExecutor;
pub use live::{BrokerOrderStatus, LiveBroker, LiveExecutor, LiveExecutorError, MarketDataFeed};

use txf_types::{FillResult, OrderAction};

/// Synchronous execution capability — the contract the backtest driver
/// drives directly in its tight per-bar loop.
pub trait Executor {
    fn execute(&mut self, action: &OrderAction) -> FillResult;
}
