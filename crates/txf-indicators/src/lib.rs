//! Pure technical-indicator functions over bar sequences. Stateless: every
//! function takes a bar slice and returns a value or sequence, with no
//! hidden state carried between calls.
//!
//! Callers treating the last element of a bar slice as the currently-forming
//! bar should read index `len - 2` for "the latest confirmed bar" — several
//! functions here ([`volume::volume_percentile`]) bake that convention in
//! directly; others (indicators computed over a full window) leave the
//! choice of slice to the caller.

mod candle;
mod directional;
mod ema;
mod vwap;
mod volume;

pub use candle::{bollinger_bands, candle_strength};
pub use directional::{adx, atr};
pub use ema::{check_death_cross, check_golden_cross, ema, ema_series, macd, MacdPoint};
pub use volume::{rvol, volume_percentile};
pub use vwap::session_vwap;
