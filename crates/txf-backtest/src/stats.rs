use txf_types::{point_value, Bar};

use crate::types::{BuyHoldResult, Statistics, Trade};

pub fn compute_statistics(trades: &[Trade], equity_curve: &[(i64, i64)]) -> Statistics {
    let total_trades = trades.len();
    let wins = trades.iter().filter(|t| t.is_win()).count();
    let win_rate = if total_trades == 0 { 0.0 } else { wins as f64 / total_trades as f64 };

    let total_pnl_points: i64 = trades.iter().map(|t| t.pnl_points).sum();
    let total_pnl_twd: i64 = trades.iter().map(|t| t.pnl_twd).sum();

    let gross_profit: f64 = trades.iter().filter(|t| t.pnl_twd > 0).map(|t| t.pnl_twd as f64).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.pnl_twd < 0).map(|t| -t.pnl_twd as f64).sum();
    let profit_factor = if gross_loss == 0.0 {
        if gross_profit > 0.0 { f64::INFINITY } else { 0.0 }
    } else {
        gross_profit / gross_loss
    };

    let max_drawdown = max_drawdown_of(equity_curve.iter().map(|(_, eq)| *eq));
    let sharpe_ratio = sharpe_of(equity_curve);

    Statistics {
        total_trades,
        win_rate,
        total_pnl_points,
        total_pnl_twd,
        profit_factor,
        max_drawdown,
        sharpe_ratio,
    }
}

fn max_drawdown_of(values: impl Iterator<Item = i64>) -> f64 {
    let mut peak = i64::MIN;
    let mut worst = 0.0_f64;
    for v in values {
        peak = peak.max(v);
        if peak > 0 {
            let dd = (peak - v) as f64 / peak as f64;
            if dd > worst {
                worst = dd;
            }
        }
    }
    worst
}

/// Mean over standard deviation of successive equity-curve returns. Not
/// annualized: the source reports this per-bar ratio directly rather than
/// scaling by a bar-count-per-year factor, and this port keeps that choice
/// rather than inventing an annualization convention the source never had.
fn sharpe_of(equity_curve: &[(i64, i64)]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter_map(|w| {
            let (prev, curr) = (w[0].1, w[1].1);
            if prev == 0 { None } else { Some((curr - prev) as f64 / prev as f64) }
        })
        .collect();
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let stddev = variance.sqrt();
    if stddev == 0.0 { 0.0 } else { mean / stddev }
}

/// Enters at `bars[warmup_bars].close`, exits at the last bar's close.
/// `quantity` is the run's largest single unit's total quantity, supplied
/// by the driver so the benchmark is sized comparably to the strategies it
/// is judged against.
pub fn compute_buy_hold(bars: &[Bar], warmup_bars: usize, quantity: i64, symbol: &str) -> BuyHoldResult {
    if bars.len() <= warmup_bars || quantity <= 0 {
        return BuyHoldResult {
            entry_price: 0,
            exit_price: 0,
            quantity: 0,
            pnl_twd: 0,
            return_pct: 0.0,
            max_drawdown: 0.0,
        };
    }

    let entry_price = bars[warmup_bars].close;
    let exit_price = bars.last().unwrap().close;
    let pv = point_value(symbol);
    let pnl_twd = (exit_price - entry_price) * quantity * pv;
    let return_pct = if entry_price == 0 { 0.0 } else { (exit_price - entry_price) as f64 / entry_price as f64 * 100.0 };

    let mark_to_market = bars[warmup_bars..].iter().map(|b| b.close as i64 * quantity * pv);
    let max_drawdown = max_drawdown_of(mark_to_market);

    BuyHoldResult {
        entry_price,
        exit_price,
        quantity,
        pnl_twd,
        return_pct,
        max_drawdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txf_types::{Direction, ExitReason};

    fn trade(pnl_twd: i64) -> Trade {
        Trade {
            direction: Direction::Buy,
            entry_price: 18000,
            entry_time: 0,
            exit_price: 18000,
            exit_time: 0,
            quantity: 1,
            reason: ExitReason::TakeProfit,
            pnl_points: pnl_twd / 200,
            pnl_twd,
        }
    }

    #[test]
    fn profit_factor_is_infinite_with_no_losers() {
        let trades = vec![trade(1000), trade(2000)];
        let stats = compute_statistics(&trades, &[(0, 100), (1, 110)]);
        assert_eq!(stats.profit_factor, f64::INFINITY);
    }

    #[test]
    fn profit_factor_is_zero_with_no_trades() {
        let stats = compute_statistics(&[], &[]);
        assert_eq!(stats.profit_factor, 0.0);
        assert_eq!(stats.win_rate, 0.0);
    }

    #[test]
    fn max_drawdown_tracks_peak_to_trough() {
        let dd = max_drawdown_of(vec![100, 120, 90, 130].into_iter());
        assert!((dd - 0.25).abs() < 1e-9);
    }

    #[test]
    fn win_rate_and_totals_aggregate_correctly() {
        let trades = vec![trade(1000), trade(-400)];
        let stats = compute_statistics(&trades, &[(0, 0), (1, 600)]);
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.win_rate, 0.5);
        assert_eq!(stats.total_pnl_twd, 600);
    }
}
