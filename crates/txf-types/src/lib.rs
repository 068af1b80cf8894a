//! Shared data model for the TXF/MXF trading engine: bars, signals,
//! managed positions, and the order/fill contract between the position
//! manager and an executor.

mod bar;
mod exit;
mod order;
mod position;
mod signal;

pub use bar::{point_value, Bar};
pub use exit::ExitReason;
pub use order::{FillResult, OrderAction, OrderType};
pub use position::{
    Direction, ExitRule, LegQuantityMismatch, LegStatus, LegType, ManagedPosition, PositionLeg,
    PositionManagerConfig, PositionMetadata, PositionStatus,
};
pub use signal::{EntryOverrides, MomentumParams, Signal, SignalType};
