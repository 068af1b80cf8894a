use txf_backtest::{BacktestConfig, BacktestDriver, TradingUnit};
use txf_position::PositionManager;
use txf_strategy::Strategy;
use txf_testkit::flat_bars;
use txf_types::{Bar, EntryOverrides, ExitReason, PositionManagerConfig, Signal, SignalType};

struct OneShotEntry {
    fire_at_index: usize,
    fired: bool,
}

impl Strategy for OneShotEntry {
    fn evaluate(&mut self, bars: &[Bar], current_price: i64, symbol: &str) -> Signal {
        let idx = bars.len() - 1;
        if !self.fired && idx == self.fire_at_index {
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

/// A take-profit leg and a trailing-stop leg close independently: the TP
/// leg fires on the up-move, the TS leg rides the retrace down to its
/// trailing distance below the peak.
#[test]
fn tp_leg_and_trailing_leg_close_independently_with_combined_pnl() {
    let mut bars = flat_bars("TXF", 0, 31, 18000, 1000); // indices 0..=30
    bars.push(Bar::new("TXF", bars[30].time + 1800, 18000, 18001, 17999, 18000, 1000)); // 31: entry fill
    bars.push(Bar::new("TXF", bars[31].time + 1800, 18000, 18100, 18000, 18090, 1000)); // 32: peak at +100
    bars.push(Bar::new("TXF", bars[32].time + 1800, 18090, 18095, 18050, 18055, 1000)); // 33: retrace

    let mut pm_config = PositionManagerConfig::new(2, 1, 1).unwrap();
    pm_config.stop_loss_points = Some(50);
    pm_config.take_profit_points = Some(100);
    pm_config.start_trailing_stop_points = Some(80);
    pm_config.trailing_stop_points = Some(40);
    pm_config.enable_macd_fast_stop = false;

    let strategy = Box::new(OneShotEntry { fire_at_index: 30, fired: false });
    let unit = TradingUnit::new("tp-ts", "TXF", "TXF202403", strategy, PositionManager::new(pm_config));

    let mut config = BacktestConfig::new(0, 0);
    config.warmup_bars = 1;
    let mut driver = BacktestDriver::new(config);
    driver.add_unit(unit);

    let report = driver.run(&bars);
    let trades = &report.units[0].trades;

    assert_eq!(trades.len(), 2);

    let tp = &trades[0];
    assert_eq!(tp.reason, ExitReason::TakeProfit);
    assert_eq!(tp.pnl_points, 100);

    let ts = &trades[1];
    assert_eq!(ts.reason, ExitReason::TrailingStop);
    assert_eq!(ts.pnl_points, 60);

    let total_pnl_twd: i64 = trades.iter().map(|t| t.pnl_twd).sum();
    assert_eq!(total_pnl_twd, 160 * 200);
}
