use txf_types::{Direction, FillResult, OrderAction, OrderType};

use crate::Executor;

/// Fills every order against a market state the backtest driver pushes
/// before each `execute` call. Entries take slippage against the trader
/// (buys fill higher, sells fill lower); exits are handed the driver's
/// already-resolved fill price and returned unchanged.
pub struct BacktestExecutor {
    slippage_points: i64,
    current_price: i64,
    current_time: i64,
}

impl BacktestExecutor {
    pub fn new(slippage_points: i64) -> Self {
        Self {
            slippage_points,
            current_price: 0,
            current_time: 0,
        }
    }

    /// Called by the driver before every `execute` to advance the executor's
    /// view of "now". For exits this is the price the driver already
    /// resolved via the §4.5 fill-price table.
    pub fn set_market_state(&mut self, price: i64, time: i64) {
        self.current_price = price;
        self.current_time = time;
    }
}

impl Executor for BacktestExecutor {
    fn execute(&mut self, action: &OrderAction) -> FillResult {
        let price = match action.order_type {
            OrderType::Open => match action.action {
                Direction::Buy => self.current_price + self.slippage_points,
                Direction::Sell => self.current_price - self.slippage_points,
            },
            OrderType::Close => self.current_price,
        };
        FillResult::filled(price, self.current_time, action.quantity)
    }
}
