use std::time::Duration;

use tracing::{debug, warn};
use txf_types::{FillResult, OrderAction};

/// Status of a broker order as reported by a poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerOrderStatus {
    Pending,
    /// Filled, with at least one deal's price/time.
    Filled { price: i64, time: i64 },
    Cancelled,
    Rejected { reason: String },
}

/// Broker adapter boundary. No network client lives in this crate; a real
/// deployment supplies its own implementation (REST/FIX/whatever the
/// brokerage speaks) the same way a paper or live gateway would elsewhere in
/// a larger trading stack.
pub trait LiveBroker: Send + Sync {
    async fn place_market_order(&self, action: &OrderAction) -> Result<String, LiveExecutorError>;
    async fn poll_order_status(&self, order_id: &str) -> Result<BrokerOrderStatus, LiveExecutorError>;
}

/// Market-data boundary for the live driver's signal-check loop. Kept
/// separate from `LiveBroker` since a deployment may source prices from a
/// different feed than the one it trades through.
pub trait MarketDataFeed: Send + Sync {
    async fn latest_price(&self, symbol: &str) -> Option<i64>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiveExecutorError {
    BrokerRejected(String),
    Timeout,
}

impl std::fmt::Display for LiveExecutorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiveExecutorError::BrokerRejected(msg) => write!(f, "broker rejected order: {msg}"),
            LiveExecutorError::Timeout => write!(f, "order status poll timed out"),
        }
    }
}

impl std::error::Error for LiveExecutorError {}

/// Places a market order then polls status up to `timeout_minutes`,
/// sleeping `poll_interval` between polls. A poll that never reaches
/// `Filled` within the timeout is treated as a cancellation.
pub struct LiveExecutor<B: LiveBroker> {
    broker: B,
    timeout_minutes: u64,
    poll_interval: Duration,
}

impl<B: LiveBroker> LiveExecutor<B> {
    pub fn new(broker: B, timeout_minutes: u64) -> Self {
        Self {
            broker,
            timeout_minutes,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub async fn execute(&self, action: &OrderAction) -> FillResult {
        let order_id = match self.broker.place_market_order(action).await {
            Ok(id) => id,
            Err(e) => return FillResult::rejected(e.to_string()),
        };
        debug!(order_id = %order_id, symbol = %action.symbol, "live order placed");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(self.timeout_minutes * 60);
        loop {
            match self.broker.poll_order_status(&order_id).await {
                Ok(BrokerOrderStatus::Filled { price, time }) => {
                    return FillResult::filled(price, time, action.quantity);
                }
                Ok(BrokerOrderStatus::Cancelled) => {
                    warn!(order_id = %order_id, "live order cancelled");
                    return FillResult::rejected("order cancelled");
                }
                Ok(BrokerOrderStatus::Rejected { reason }) => {
                    warn!(order_id = %order_id, reason = %reason, "live order rejected");
                    return FillResult::rejected(reason);
                }
                Ok(BrokerOrderStatus::Pending) => {}
                Err(e) => return FillResult::rejected(e.to_string()),
            }

            if tokio::time::Instant::now() >= deadline {
                warn!(order_id = %order_id, "live order status poll timed out");
                return FillResult::rejected(LiveExecutorError::Timeout.to_string());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use txf_types::Direction;

    struct ImmediateFillBroker;

    impl LiveBroker for ImmediateFillBroker {
        async fn place_market_order(&self, _action: &OrderAction) -> Result<String, LiveExecutorError> {
            Ok("ord-1".to_string())
        }

        async fn poll_order_status(&self, _order_id: &str) -> Result<BrokerOrderStatus, LiveExecutorError> {
            Ok(BrokerOrderStatus::Filled { price: 18010, time: 1000 })
        }
    }

    struct RejectingBroker;

    impl LiveBroker for RejectingBroker {
        async fn place_market_order(&self, _action: &OrderAction) -> Result<String, LiveExecutorError> {
            Err(LiveExecutorError::BrokerRejected("no margin".to_string()))
        }

        async fn poll_order_status(&self, _order_id: &str) -> Result<BrokerOrderStatus, LiveExecutorError> {
            unreachable!("never reached when placement itself fails")
        }
    }

    struct PendingThenFillBroker {
        polls: Arc<AtomicUsize>,
    }

    impl LiveBroker for PendingThenFillBroker {
        async fn place_market_order(&self, _action: &OrderAction) -> Result<String, LiveExecutorError> {
            Ok("ord-2".to_string())
        }

        async fn poll_order_status(&self, _order_id: &str) -> Result<BrokerOrderStatus, LiveExecutorError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Ok(BrokerOrderStatus::Pending)
            } else {
                Ok(BrokerOrderStatus::Filled { price: 18020, time: 2000 })
            }
        }
    }

    #[tokio::test]
    async fn filled_status_yields_success_fill() {
        let executor = LiveExecutor::new(ImmediateFillBroker, 1);
        let action = OrderAction::open(Direction::Buy, "TXF", "TXF202403", 1);
        let fill = executor.execute(&action).await;
        assert!(fill.success);
        assert_eq!(fill.fill_price, Some(18010));
    }

    #[tokio::test]
    async fn placement_failure_surfaces_as_rejected() {
        let executor = LiveExecutor::new(RejectingBroker, 1);
        let action = OrderAction::open(Direction::Buy, "TXF", "TXF202403", 1);
        let fill = executor.execute(&action).await;
        assert!(!fill.success);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_polls_retry_until_filled() {
        let polls = Arc::new(AtomicUsize::new(0));
        let broker = PendingThenFillBroker { polls: polls.clone() };
        let executor = LiveExecutor::new(broker, 1);
        let action = OrderAction::open(Direction::Sell, "TXF", "TXF202403", 1);

        let handle = tokio::spawn(async move { executor.execute(&action).await });
        tokio::time::advance(Duration::from_secs(10)).await;
        let fill = handle.await.unwrap();

        assert!(fill.success);
        assert_eq!(fill.fill_price, Some(18020));
        assert!(polls.load(Ordering::SeqCst) >= 3);
    }
}
