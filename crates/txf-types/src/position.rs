use std::collections::HashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn is_long(&self) -> bool {
        matches!(self, Direction::Buy)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    PartiallyClosed,
    Closed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LegStatus {
    Open,
    Closed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LegType {
    TakeProfit,
    TrailingStop,
}

/// Per-leg exit thresholds. Mutated in place as trailing stops advance.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ExitRule {
    pub stop_loss_price: i64,
    /// Only present on `TakeProfit` legs.
    pub take_profit_price: Option<i64>,
    pub start_trailing_stop_price: Option<i64>,
    pub trailing_stop_active: bool,
    pub trailing_stop_price: Option<i64>,
    pub tighten_after_price: Option<i64>,
    pub tightened_trailing_stop_points: Option<i64>,
    pub is_tightened: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionLeg {
    pub leg_id: String,
    pub leg_type: LegType,
    pub quantity: i64,
    pub exit_rule: ExitRule,
    pub status: LegStatus,
    pub exit_price: Option<i64>,
    pub exit_time: Option<i64>,
    pub exit_reason: Option<crate::ExitReason>,
}

impl PositionLeg {
    pub fn is_open(&self) -> bool {
        matches!(self.status, LegStatus::Open)
    }
}

/// Free-form values a strategy attaches to `position.metadata`, carried over
/// from the opening signal's `EntryOverrides` for the life of the position.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PositionMetadata {
    pub override_trailing_stop_points: Option<i64>,
    pub key_levels: Option<Vec<i64>>,
    pub key_level_buffer: i64,
    pub key_level_min_profit: i64,
    pub next_key_level_idx: usize,
    pub use_momentum_exit: bool,
    pub momentum_min_profit: i64,
    pub momentum_lookback: usize,
    pub momentum_weak_threshold_milli: i64,
    pub momentum_min_weak_bars: usize,
    pub last_momentum_check_time: Option<i64>,
    pub extra: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ManagedPosition {
    pub position_id: String,
    pub symbol: String,
    pub sub_symbol: String,
    pub direction: Direction,
    pub entry_price: i64,
    pub entry_time: i64,
    pub total_quantity: i64,
    pub highest_price: i64,
    pub lowest_price: i64,
    pub status: PositionStatus,
    pub legs: Vec<PositionLeg>,
    pub is_in_macd_adverse_cross: bool,
    pub metadata: PositionMetadata,
}

impl ManagedPosition {
    pub fn open_legs(&self) -> impl Iterator<Item = &PositionLeg> {
        self.legs.iter().filter(|l| l.is_open())
    }

    pub fn open_legs_mut(&mut self) -> impl Iterator<Item = &mut PositionLeg> {
        self.legs.iter_mut().filter(|l| l.is_open())
    }

    pub fn recompute_status(&mut self) {
        let open = self.legs.iter().filter(|l| l.is_open()).count();
        self.status = if open == 0 {
            PositionStatus::Closed
        } else if open == self.legs.len() {
            PositionStatus::Open
        } else {
            PositionStatus::PartiallyClosed
        };
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.status, PositionStatus::Closed)
    }

    /// Unrealized profit in index points, positive favorable, using the
    /// original entry price (never a partially-closed blended price).
    pub fn unrealized_points(&self, current_price: i64) -> i64 {
        if self.direction.is_long() {
            current_price - self.entry_price
        } else {
            self.entry_price - current_price
        }
    }
}

/// Immutable per-trading-unit configuration resolved once at PM construction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositionManagerConfig {
    pub total_quantity: i64,
    pub tp_leg_quantity: i64,
    pub ts_leg_quantity: i64,
    pub stop_loss_points: Option<i64>,
    pub stop_loss_points_rate: Option<f64>,
    pub take_profit_points: Option<i64>,
    pub take_profit_points_rate: Option<f64>,
    pub start_trailing_stop_points: Option<i64>,
    pub trailing_stop_points: Option<i64>,
    pub trailing_stop_points_rate: Option<f64>,
    pub tighten_after_points: Option<i64>,
    pub tighten_after_points_rate: Option<f64>,
    pub tightened_trailing_stop_points: Option<i64>,
    pub tightened_trailing_stop_points_rate: Option<f64>,
    pub timeframe: String,
    pub enable_macd_fast_stop: bool,
    /// "HH:MM", force-exit time of day.
    pub force_exit_time: Option<String>,
}

/// Raised when `tp_leg_quantity + ts_leg_quantity != total_quantity`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LegQuantityMismatch {
    pub total_quantity: i64,
    pub tp_leg_quantity: i64,
    pub ts_leg_quantity: i64,
}

impl std::fmt::Display for LegQuantityMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tp_leg_quantity ({}) + ts_leg_quantity ({}) != total_quantity ({})",
            self.tp_leg_quantity, self.ts_leg_quantity, self.total_quantity
        )
    }
}

impl std::error::Error for LegQuantityMismatch {}

impl PositionManagerConfig {
    pub fn new(
        total_quantity: i64,
        tp_leg_quantity: i64,
        ts_leg_quantity: i64,
    ) -> Result<Self, LegQuantityMismatch> {
        if tp_leg_quantity + ts_leg_quantity != total_quantity {
            return Err(LegQuantityMismatch {
                total_quantity,
                tp_leg_quantity,
                ts_leg_quantity,
            });
        }
        Ok(Self {
            total_quantity,
            tp_leg_quantity,
            ts_leg_quantity,
            stop_loss_points: Some(50),
            stop_loss_points_rate: None,
            take_profit_points: Some(500),
            take_profit_points_rate: None,
            start_trailing_stop_points: Some(200),
            trailing_stop_points: Some(200),
            trailing_stop_points_rate: None,
            tighten_after_points: None,
            tighten_after_points_rate: None,
            tightened_trailing_stop_points: None,
            tightened_trailing_stop_points_rate: None,
            timeframe: "30m".to_string(),
            enable_macd_fast_stop: true,
            force_exit_time: None,
        })
    }

    pub fn has_tightened_trailing_stop(&self) -> bool {
        (self.tighten_after_points.is_some() || self.tighten_after_points_rate.is_some())
            && (self.tightened_trailing_stop_points.is_some()
                || self.tightened_trailing_stop_points_rate.is_some())
    }

    /// Resolves a fixed/rate point-pair against a reference price, fixed
    /// points taking precedence over the rate when both are set.
    pub fn resolve_points(fixed: Option<i64>, rate: Option<f64>, reference_price: i64) -> Option<i64> {
        match (fixed, rate) {
            (Some(p), _) => Some(p),
            (None, Some(r)) => Some((r * reference_price as f64) as i64),
            (None, None) => None,
        }
    }
}
