/// Why a leg (or the whole position) closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    FastStop,
    TimeExit,
    MomentumExit,
    Hold,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::FastStop => "fast_stop",
            ExitReason::TimeExit => "time_exit",
            ExitReason::MomentumExit => "momentum_exit",
            ExitReason::Hold => "hold",
        }
    }
}
