use txf_types::{Bar, Direction, ExitReason};

/// Resolves an exit's realized fill price from the bar it triggers on,
/// reproducing the gap-through-vs-settle-at-trigger table: a bar that opens
/// past the trigger fills at the open (the market gapped through it
/// overnight/intrabar); otherwise the trigger price itself, the trigger
/// having been touched mid-bar.
pub fn resolve_fill_price(reason: ExitReason, direction: Direction, trigger_price: Option<i64>, bar: &Bar) -> i64 {
    let trigger = trigger_price.unwrap_or(bar.close);
    let is_long = direction.is_long();

    match reason {
        ExitReason::TakeProfit => {
            let gapped = if is_long { bar.open >= trigger } else { bar.open <= trigger };
            if gapped { bar.open } else { trigger }
        }
        ExitReason::StopLoss | ExitReason::TrailingStop => {
            let gapped = if is_long { bar.open <= trigger } else { bar.open >= trigger };
            if gapped { bar.open } else { trigger }
        }
        ExitReason::FastStop => bar.open,
        ExitReason::TimeExit | ExitReason::MomentumExit | ExitReason::Hold => bar.close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_testkit::BarBuilder;

    fn bar(open: i64, high: i64, low: i64, close: i64) -> Bar {
        BarBuilder::new("TXF", 0, close).open(open).high(high).low(low).volume(1).build()
    }

    #[test]
    fn long_stop_loss_gaps_through_fills_at_open() {
        let b = bar(17900, 17910, 17880, 17905);
        let price = resolve_fill_price(ExitReason::StopLoss, Direction::Buy, Some(17950), &b);
        assert_eq!(price, 17900);
    }

    #[test]
    fn long_stop_loss_touched_midbar_fills_at_trigger() {
        let b = bar(18000, 18010, 17940, 17990);
        let price = resolve_fill_price(ExitReason::StopLoss, Direction::Buy, Some(17950), &b);
        assert_eq!(price, 17950);
    }

    #[test]
    fn short_take_profit_gaps_down_fills_at_open() {
        let b = bar(17900, 17905, 17850, 17880);
        let price = resolve_fill_price(ExitReason::TakeProfit, Direction::Sell, Some(17950), &b);
        assert_eq!(price, 17900);
    }

    #[test]
    fn fast_stop_always_fills_at_open() {
        let b = bar(18000, 18050, 17980, 18010);
        let price = resolve_fill_price(ExitReason::FastStop, Direction::Buy, Some(17999), &b);
        assert_eq!(price, 18000);
    }

    #[test]
    fn time_exit_fills_at_close() {
        let b = bar(18000, 18050, 17980, 18010);
        let price = resolve_fill_price(ExitReason::TimeExit, Direction::Sell, None, &b);
        assert_eq!(price, 18010);
    }
}
