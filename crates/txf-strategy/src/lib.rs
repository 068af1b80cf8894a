//! Pluggable entry-signal producers over bar sequences: MACD crossover
//! (long-only and bidirectional), Opening Range Breakout, Scalp, and
//! Bollinger mean-reversion. Each strategy is a pure function of bars plus
//! whatever per-instance state its own state machine needs; none of them
//! touch position-management concerns (stops, targets, trailing) beyond the
//! `EntryOverrides` they attach to an entry signal.

mod bollinger;
mod macd;
mod orb;
mod scalp;

pub use bollinger::{BollingerConfig, BollingerStrategy, TakeProfitTarget};
pub use macd::{MacdBidirectionalStrategy, MacdConfig, MacdGoldenCrossStrategy};
pub use orb::{DailyDirection, OrbConfig, OrbStrategy};
pub use scalp::{EntryMode, ScalpConfig, ScalpStrategy};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use txf_types::{Bar, Signal};

/// The capability every entry-signal producer exposes. Implementations may
/// hold private per-instance state (a day-scoped state machine, a cooldown
/// counter) but must never share it across instances.
pub trait Strategy {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal;

    /// Called by the position manager's owner once the held position fully
    /// closes. Most strategies use this only to reset a cooldown counter.
    fn on_position_closed(&mut self) {}
}

/// Bar timestamp (epoch seconds) as a naive date/time, exchange-local.
pub(crate) fn bar_datetime(time: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp(time, 0).map(|dt| dt.naive_utc())
}

pub(crate) fn bar_date(time: i64) -> Option<NaiveDate> {
    bar_datetime(time).map(|dt| dt.date())
}

pub(crate) fn bar_time_of_day(time: i64) -> Option<NaiveTime> {
    bar_datetime(time).map(|dt| dt.time())
}

pub(crate) fn parse_hh_mm(s: &str) -> NaiveTime {
    let (h, m) = s.split_once(':').expect("HH:MM");
    NaiveTime::from_hms_opt(h.parse().unwrap(), m.parse().unwrap(), 0).expect("valid HH:MM")
}
