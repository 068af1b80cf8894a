use txf_backtest::{BacktestConfig, BacktestDriver, TradingUnit};
use txf_position::PositionManager;
use txf_strategy::Strategy;
use txf_testkit::{flat_bars, push_move};
use txf_types::{Bar, EntryOverrides, PositionManagerConfig, Signal, SignalType};

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

fn scenario_bars() -> Vec<Bar> {
    let mut bars = flat_bars("TXF", 0, 31, 18000, 1000);
    push_move(&mut bars, 0, 1000); // 31: entry fill bar, flat
    push_move(&mut bars, 90, 1000); // 32: rally
    push_move(&mut bars, -70, 1000); // 33: retrace
    push_move(&mut bars, -10, 1000); // 34: further drift
    bars
}

fn build_driver() -> BacktestDriver {
    let mut pm_config = PositionManagerConfig::new(1, 0, 1).unwrap();
    pm_config.stop_loss_points = Some(200);
    pm_config.take_profit_points = None;
    pm_config.start_trailing_stop_points = Some(50);
    pm_config.trailing_stop_points = Some(30);
    pm_config.enable_macd_fast_stop = false;

    let strategy = Box::new(OneShotEntry { fire_at_index: 30, fired: false });
    let unit = TradingUnit::new("det", "TXF", "TXF202403", strategy, PositionManager::new(pm_config));

    let mut config = BacktestConfig::new(500_000, 0);
    config.warmup_bars = 1;
    let mut driver = BacktestDriver::new(config);
    driver.add_unit(unit);
    driver
}

/// Running the same bars through an identically configured driver twice
/// must produce byte-identical reports: no hidden clock, RNG, or iteration
/// order dependent on hash-map layout anywhere in the replay path.
#[test]
fn identical_inputs_produce_identical_reports() {
    let bars = scenario_bars();

    let mut driver1 = build_driver();
    let report1 = driver1.run(&bars);

    let mut driver2 = build_driver();
    let report2 = driver2.run(&bars);

    assert_eq!(report1.units[0].trades, report2.units[0].trades);
    assert_eq!(report1.units[0].equity_curve, report2.units[0].equity_curve);
    assert_eq!(report1.units[0].stats, report2.units[0].stats);
    assert_eq!(report1.buy_hold, report2.buy_hold);
}
