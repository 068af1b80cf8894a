//! Synchronous replay of a bar stream through one or more [`TradingUnit`]s.
//!
//! The driver owns the anti-look-ahead discipline described across the
//! position-manager and execution crates: a signal emitted on bar `i` fills
//! at bar `i+1`'s open, exits are probed through a fixed open/extreme/close
//! chain per bar, and the equity curve is evaluated at each bar's close.

mod driver;
mod fill_price;
mod report;
mod stats;
mod types;

pub use driver::{BacktestDriver, TradingUnit};
pub use fill_price::resolve_fill_price;
pub use report::render_report;
pub use stats::{compute_buy_hold, compute_statistics};
pub use types::{BacktestConfig, BacktestReport, BuyHoldResult, Statistics, Trade, UnitReport};
