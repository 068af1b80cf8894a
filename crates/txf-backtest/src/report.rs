use std::fmt::Write as _;

use crate::types::{BacktestReport, UnitReport};

/// Renders a monospaced text report: one block per trading unit (counts,
/// win rate, PnL, profit factor, drawdown, Sharpe, delta vs. buy-and-hold),
/// followed by its numbered trade list.
pub fn render_report(report: &BacktestReport) -> String {
    let mut out = String::new();
    for unit in &report.units {
        render_unit(&mut out, unit, report);
        out.push('\n');
    }
    out
}

fn render_unit(out: &mut String, unit: &UnitReport, report: &BacktestReport) {
    let s = &unit.stats;
    let _ = writeln!(out, "== {} ==", unit.name);
    let _ = writeln!(out, "trades: {}  win_rate: {:.1}%", s.total_trades, s.win_rate * 100.0);
    let _ = writeln!(out, "pnl_points: {}  pnl_twd: {}", s.total_pnl_points, s.total_pnl_twd);
    let _ = writeln!(out, "profit_factor: {}  max_drawdown: {:.2}%  sharpe: {:.3}", fmt_ratio(s.profit_factor), s.max_drawdown * 100.0, s.sharpe_ratio);

    let delta = s.total_pnl_twd - report.buy_hold.pnl_twd;
    let _ = writeln!(out, "vs buy_hold ({} twd): {:+}", report.buy_hold.pnl_twd, delta);

    for (i, trade) in unit.trades.iter().enumerate() {
        let side = if trade.direction.is_long() { "L" } else { "S" };
        let _ = writeln!(
            out,
            "{}. [{}] {} -> {} | {} | {} | {}",
            i + 1,
            side,
            trade.entry_price,
            trade.exit_price,
            trade.quantity,
            trade.reason.as_str(),
            trade.pnl_twd
        );
    }
}

fn fmt_ratio(r: f64) -> String {
    if r.is_infinite() {
        "inf".to_string()
    } else {
        format!("{r:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuyHoldResult, Statistics};

    #[test]
    fn render_includes_unit_name_and_trade_count() {
        let report = BacktestReport {
            units: vec![UnitReport {
                name: "macd-long".to_string(),
                trades: Vec::new(),
                equity_curve: Vec::new(),
                stats: Statistics {
                    total_trades: 0,
                    win_rate: 0.0,
                    total_pnl_points: 0,
                    total_pnl_twd: 0,
                    profit_factor: 0.0,
                    max_drawdown: 0.0,
                    sharpe_ratio: 0.0,
                },
            }],
            buy_hold: BuyHoldResult {
                entry_price: 18000,
                exit_price: 18100,
                quantity: 1,
                pnl_twd: 20000,
                return_pct: 0.5,
                max_drawdown: 0.0,
            },
        };
        let text = render_report(&report);
        assert!(text.contains("macd-long"));
        assert!(text.contains("trades: 0"));
    }
}
