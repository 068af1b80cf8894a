//! Async live orchestration: a polling loop that drives one
//! `PositionManager` + `Strategy` pair against a broker/market-data pair,
//! persisting position state to disk between restarts.
//!
//! Kept deliberately separate from the synchronous `txf-backtest` crate —
//! the replay loop's tight per-bar iteration has no I/O to wait on, while
//! this driver's only work between polls *is* waiting on I/O.

mod driver;
mod position_record;

pub use driver::{LiveConfig, LiveDriver};
pub use position_record::{PositionRecord, PositionStore};
