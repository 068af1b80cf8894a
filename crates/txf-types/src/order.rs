use crate::{Direction, ExitReason};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrderType {
    Open,
    Close,
}

/// Command emitted by the position manager towards an executor.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderAction {
    pub action: Direction,
    pub symbol: String,
    pub sub_symbol: String,
    pub quantity: i64,
    pub order_type: OrderType,
    pub leg_id: Option<String>,
    pub reason: String,
    pub exit_reason: Option<ExitReason>,
    /// Price at which the exit condition fired; `None` for opens and for
    /// close-all actions where the driver must fall back to the close.
    pub trigger_price: Option<i64>,
    /// Populated on a combined close-all action (`FastStop`/`MomentumExit`/`TimeExit`).
    pub leg_ids: Vec<String>,
}

impl OrderAction {
    pub fn open(direction: Direction, symbol: impl Into<String>, sub_symbol: impl Into<String>, quantity: i64) -> Self {
        Self {
            action: direction,
            symbol: symbol.into(),
            sub_symbol: sub_symbol.into(),
            quantity,
            order_type: OrderType::Open,
            leg_id: None,
            reason: "entry".to_string(),
            exit_reason: None,
            trigger_price: None,
            leg_ids: Vec::new(),
        }
    }

    pub fn close_leg(
        direction: Direction,
        symbol: impl Into<String>,
        sub_symbol: impl Into<String>,
        quantity: i64,
        leg_id: impl Into<String>,
        exit_reason: ExitReason,
        trigger_price: Option<i64>,
    ) -> Self {
        Self {
            action: direction,
            symbol: symbol.into(),
            sub_symbol: sub_symbol.into(),
            quantity,
            order_type: OrderType::Close,
            leg_id: Some(leg_id.into()),
            reason: exit_reason.as_str().to_string(),
            exit_reason: Some(exit_reason),
            trigger_price,
            leg_ids: Vec::new(),
        }
    }

    pub fn close_all(
        direction: Direction,
        symbol: impl Into<String>,
        sub_symbol: impl Into<String>,
        quantity: i64,
        leg_ids: Vec<String>,
        exit_reason: ExitReason,
    ) -> Self {
        Self {
            action: direction,
            symbol: symbol.into(),
            sub_symbol: sub_symbol.into(),
            quantity,
            order_type: OrderType::Close,
            leg_id: None,
            reason: exit_reason.as_str().to_string(),
            exit_reason: Some(exit_reason),
            trigger_price: None,
            leg_ids,
        }
    }
}

/// Outcome of submitting an `OrderAction` to an executor.
#[derive(Clone, Debug, PartialEq)]
pub struct FillResult {
    pub success: bool,
    pub fill_price: Option<i64>,
    pub fill_time: Option<i64>,
    pub fill_quantity: i64,
    pub order_id: Option<String>,
    pub message: String,
}

impl FillResult {
    pub fn filled(price: i64, time: i64, quantity: i64) -> Self {
        Self {
            success: true,
            fill_price: Some(price),
            fill_time: Some(time),
            fill_quantity: quantity,
            order_id: None,
            message: "filled".to_string(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            fill_price: None,
            fill_time: None,
            fill_quantity: 0,
            order_id: None,
            message: message.into(),
        }
    }
}
