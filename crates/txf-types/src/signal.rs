/// Direction a strategy wants to take, or no action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalType {
    EntryLong,
    EntryShort,
    Hold,
}

/// Momentum-exhaustion exit parameters, carried on a signal when a strategy
/// wants the opened position to also watch for fading candle momentum.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MomentumParams {
    /// Minimum unrealized profit (points) before momentum exit arms.
    pub min_profit: i64,
    pub lookback: usize,
    /// Candle-strength threshold below which a bar counts as "weak", x1000.
    pub weak_threshold_milli: i64,
    pub min_weak_bars: usize,
}

/// Per-entry overrides a strategy may attach to a signal, letting it
/// customize the position manager's stop/target/trailing placement instead
/// of relying solely on the manager's static config.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EntryOverrides {
    pub stop_loss_price: Option<i64>,
    pub stop_loss_distance: Option<i64>,
    pub take_profit_points: Option<i64>,
    pub start_trailing_stop_points: Option<i64>,
    pub trailing_stop_points: Option<i64>,
    /// Ordered key levels for key-level trailing / key-level take-profit.
    pub key_levels: Option<Vec<i64>>,
    pub key_level_buffer: Option<i64>,
    pub key_level_min_profit: Option<i64>,
    pub use_key_level_tp: bool,
    /// When widening a key-level take-profit, target the farthest level
    /// instead of the nearest one beyond the minimum distance.
    pub use_key_level_tp_max: bool,
    pub momentum: Option<MomentumParams>,
}

/// A strategy's decision for the current bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    pub signal_type: SignalType,
    pub symbol: String,
    /// Reference price at signal time (the bar close the strategy evaluated
    /// against). The position manager opens against this price unchanged;
    /// the backtest driver patches `entry_price`/`entry_time` on the opened
    /// position afterward with the realized next-bar-open fill. Stop-loss,
    /// take-profit, and trailing distances are derived from this original
    /// reference and are not recomputed against the realized fill.
    pub price: i64,
    pub quantity: i64,
    pub overrides: EntryOverrides,
}

impl Signal {
    pub fn hold(symbol: impl Into<String>) -> Self {
        Self {
            signal_type: SignalType::Hold,
            symbol: symbol.into(),
            price: 0,
            quantity: 0,
            overrides: EntryOverrides::default(),
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self.signal_type, SignalType::EntryLong | SignalType::EntryShort)
    }

    pub fn is_long(&self) -> bool {
        matches!(self.signal_type, SignalType::EntryLong)
    }
}
