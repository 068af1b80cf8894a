use std::time::Duration;

use chrono::Timelike;
use tracing::{debug, info, warn};
use txf_execution::{LiveBroker, LiveExecutor, MarketDataFeed};
use txf_position::PositionManager;
use txf_strategy::Strategy;
use txf_types::{Bar, Direction, ExitReason, OrderAction, Signal};

use crate::position_record::{PositionRecord, PositionStore};

/// Cadence knobs from the `monitoring` config block, converted from the
/// YAML's minutes/seconds into `Duration`s once at driver construction.
pub struct LiveConfig {
    pub symbol: String,
    pub sub_symbol: String,
    pub signal_check_interval: Duration,
    pub position_check_interval: Duration,
    /// How many synthesized bars to retain for strategy evaluation. A real
    /// market-data feed that already aggregates OHLC bars would make this
    /// unnecessary; `MarketDataFeed` here only exposes a last-price tick, so
    /// the driver builds its own single-price bars from successive polls.
    pub bar_buffer_len: usize,
    pub order_timeout_minutes: u64,
}

impl LiveConfig {
    pub fn new(symbol: impl Into<String>, sub_symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sub_symbol: sub_symbol.into(),
            signal_check_interval: Duration::from_secs(5 * 60),
            position_check_interval: Duration::from_secs(30),
            bar_buffer_len: 200,
            order_timeout_minutes: 5,
        }
    }
}

/// Single-threaded live orchestration loop: polls the market-data feed on
/// two independent cadences (a slower signal check, a faster position
/// check), drives one `PositionManager` + `Strategy` pair, and persists
/// position state to a JSON file after every transition.
///
/// No PM or strategy state is shared across driver instances — one process
/// runs one `LiveDriver` per trading unit, matching the one-live-PM-per-
/// process discipline of the source.
pub struct LiveDriver<B: LiveBroker, F: MarketDataFeed> {
    config: LiveConfig,
    pm: PositionManager,
    strategy: Box<dyn Strategy>,
    executor: LiveExecutor<B>,
    feed: F,
    store: PositionStore,
    bars: Vec<Bar>,
}

impl<B: LiveBroker, F: MarketDataFeed> LiveDriver<B, F> {
    pub fn new(
        config: LiveConfig,
        pm: PositionManager,
        strategy: Box<dyn Strategy>,
        broker: B,
        feed: F,
        store: PositionStore,
    ) -> Self {
        let order_timeout = config.order_timeout_minutes;
        Self {
            config,
            pm,
            strategy,
            executor: LiveExecutor::new(broker, order_timeout),
            feed,
            store,
            bars: Vec::new(),
        }
    }

    /// Runs until ctrl-c. A signal-check tick that coincides with a
    /// position-check tick always runs the position check first, so a fresh
    /// exit is never masked by a same-tick entry evaluation.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut signal_ticker = tokio::time::interval(self.config.signal_check_interval);
        let mut position_ticker = tokio::time::interval(self.config.position_check_interval);

        info!(symbol = %self.config.symbol, sub_symbol = %self.config.sub_symbol, "live driver starting");

        loop {
            tokio::select! {
                _ = position_ticker.tick() => {
                    if self.pm.has_position() {
                        if let Err(e) = self.position_check_tick().await {
                            warn!(error = %e, "position check tick failed");
                        }
                    }
                }
                _ = signal_ticker.tick() => {
                    if let Err(e) = self.signal_check_tick().await {
                        warn!(error = %e, "signal check tick failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("ctrl-c received, shutting down live driver");
                    return Ok(());
                }
            }
        }
    }

    async fn latest_synthetic_bar(&mut self) -> Option<Bar> {
        let price = self.feed.latest_price(&self.config.symbol).await?;
        let time = chrono::Utc::now().timestamp();
        let bar = Bar::new(&self.config.symbol, time, price, price, price, price, 0);
        self.bars.push(bar.clone());
        if self.bars.len() > self.config.bar_buffer_len {
            self.bars.remove(0);
        }
        Some(bar)
    }

    async fn signal_check_tick(&mut self) -> anyhow::Result<()> {
        if self.pm.has_position() {
            return Ok(());
        }
        let Some(bar) = self.latest_synthetic_bar().await else {
            warn!(symbol = %self.config.symbol, "market data gap: no price on signal check");
            return Ok(());
        };

        let signal = self.strategy.evaluate(&self.bars, bar.close, &self.config.symbol);
        if !signal.is_entry() {
            return Ok(());
        }

        let direction = if signal.is_long() { Direction::Buy } else { Direction::Sell };
        let probe = OrderAction::open(direction, &self.config.symbol, &self.config.sub_symbol, self.pm.config().total_quantity);
        let fill = self.executor.execute(&probe).await;
        if !fill.success {
            warn!(message = %fill.message, "live entry order failed");
            return Ok(());
        }

        let actions = self.pm.on_signal(&signal, &self.bars, &self.config.symbol, &self.config.sub_symbol);
        if actions.is_empty() {
            return Ok(());
        }
        if let (Some(price), Some(time)) = (fill.fill_price, fill.fill_time) {
            if let Some(pos) = self.pm.position_mut() {
                pos.entry_price = price;
                pos.entry_time = time;
                pos.highest_price = price;
                pos.lowest_price = price;
            }
            info!(symbol = %self.config.symbol, price, "live entry filled");
        }
        self.persist_position()?;
        Ok(())
    }

    async fn position_check_tick(&mut self) -> anyhow::Result<()> {
        let Some(price) = self.feed.latest_price(&self.config.symbol).await else {
            warn!(symbol = %self.config.symbol, "market data gap: no price on position check");
            return Ok(());
        };

        let now = chrono::Utc::now();
        let time_exit_actions = self.pm.check_time_exit(now.time().hour(), now.time().minute(), price);
        let actions = if !time_exit_actions.is_empty() {
            time_exit_actions
        } else {
            self.pm.on_price_update(price, Some(&self.bars))
        };

        for action in &actions {
            let fill = self.executor.execute(action).await;
            if !fill.success {
                warn!(message = %fill.message, "live exit order failed, PM state left untouched");
                continue;
            }
            let reason = action.exit_reason.unwrap_or(ExitReason::Hold);
            let fill_price = fill.fill_price.unwrap_or(price);
            let fill_time = fill.fill_time.unwrap_or_else(|| now.timestamp());

            let leg_ids: Vec<&str> = if !action.leg_ids.is_empty() {
                action.leg_ids.iter().map(String::as_str).collect()
            } else {
                action.leg_id.iter().map(String::as_str).collect()
            };
            for leg_id in leg_ids.iter().copied() {
                self.pm.on_fill(leg_id, fill_price, fill_time, reason);
            }
            debug!(reason = reason.as_str(), fill_price, "live leg closed");
        }

        if !self.pm.has_position() {
            self.strategy.on_position_closed();
            self.store.remove(&self.config.sub_symbol)?;
        } else if !actions.is_empty() {
            self.persist_position()?;
        }

        Ok(())
    }

    fn persist_position(&mut self) -> anyhow::Result<()> {
        let Some(position) = self.pm.position() else {
            return Ok(());
        };
        let mut record = PositionRecord::from_position(position);
        record.timeframe = self.pm.config().timeframe.clone();
        self.store.upsert(self.config.sub_symbol.clone(), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use txf_execution::{BrokerOrderStatus, LiveExecutorError};
    use txf_types::{EntryOverrides, PositionManagerConfig, SignalType};

    struct OneShotLongStrategy {
        fired: bool,
    }

    impl Strategy for OneShotLongStrategy {
        fn evaluate(&mut self, _bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
            if !self.fired {
                self.fired = true;
                return Signal {
                    signal_type: SignalType::EntryLong,
                    symbol: symbol.to_string(),
                    price: current_price,
                    quantity: 0,
                    overrides: EntryOverrides::default(),
                };
            }
            Signal::hold(symbol)
        }
    }

    struct FixedPriceFeed {
        price: i64,
    }

    impl MarketDataFeed for FixedPriceFeed {
        async fn latest_price(&self, _symbol: &str) -> Option<i64> {
            Some(self.price)
        }
    }

    struct ImmediateFillBroker {
        fill_price: i64,
        calls: Arc<AtomicUsize>,
    }

    impl LiveBroker for ImmediateFillBroker {
        async fn place_market_order(&self, _action: &OrderAction) -> Result<String, LiveExecutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("ord".to_string())
        }

        async fn poll_order_status(&self, _order_id: &str) -> Result<BrokerOrderStatus, LiveExecutorError> {
            Ok(BrokerOrderStatus::Filled { price: self.fill_price, time: 1_700_000_000 })
        }
    }

    #[tokio::test]
    async fn signal_check_tick_opens_a_position_on_entry_signal() {
        let pm_config = PositionManagerConfig::new(1, 0, 1).unwrap();
        let pm = PositionManager::new(pm_config);
        let strategy = Box::new(OneShotLongStrategy { fired: false });
        let broker = ImmediateFillBroker { fill_price: 18000, calls: Arc::new(AtomicUsize::new(0)) };
        let feed = FixedPriceFeed { price: 18000 };

        let mut path = std::env::temp_dir();
        path.push(format!("txf-runtime-driver-test-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let store = PositionStore::load(&path).unwrap();

        let config = LiveConfig::new("TXF", "TXF202403");
        let mut driver = LiveDriver::new(config, pm, strategy, broker, feed, store);

        driver.signal_check_tick().await.unwrap();
        assert!(driver.pm.has_position());
        assert_eq!(driver.pm.position().unwrap().entry_price, 18000);

        let _ = std::fs::remove_file(&path);
    }
}
