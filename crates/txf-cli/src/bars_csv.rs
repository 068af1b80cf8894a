//! Historical bar ingestion for the `backtest` subcommand: a hand-rolled CSV
//! reader, not the `csv` crate, matching how the corpus's own market-data
//! ingestion boundary reads OHLCV files.
//!
//! ## Column contract (case-insensitive, order-independent)
//!
//! `symbol, time, open, high, low, close, volume` — `time` is epoch seconds,
//! prices/volume are whole index points (TXF/MXF trade in integer ticks, no
//! decimal parsing needed).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use txf_types::Bar;

const REQUIRED_COLUMNS: [&str; 7] = ["symbol", "time", "open", "high", "low", "close", "volume"];

/// Reads `path`, keeps rows for `symbol` whose `time` falls within
/// `[start, end]` inclusive (exchange-local midnight-to-midnight), and
/// returns them sorted by time. Rows for other symbols are skipped
/// silently; a structurally broken header is a hard error.
pub fn load_bars(path: &Path, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read bar file: {}", path.display()))?;

    let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
    let end_ts = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();

    let mut lines = raw.lines();
    let header = match lines.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    let col_idx = build_col_index(header)?;

    let mut bars = Vec::new();
    for (row_num, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let get = |name: &str| -> Result<&str> {
            let i = *col_idx
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("missing header column: {name}"))?;
            fields
                .get(i)
                .copied()
                .map(str::trim)
                .ok_or_else(|| anyhow::anyhow!("row {}: missing field {name}", row_num + 2))
        };

        let row_symbol = get("symbol")?;
        if !row_symbol.eq_ignore_ascii_case(symbol) {
            continue;
        }

        let time: i64 = get("time")?.parse().with_context(|| format!("row {}: bad time", row_num + 2))?;
        if time < start_ts || time > end_ts {
            continue;
        }

        let open: i64 = get("open")?.parse().with_context(|| format!("row {}: bad open", row_num + 2))?;
        let high: i64 = get("high")?.parse().with_context(|| format!("row {}: bad high", row_num + 2))?;
        let low: i64 = get("low")?.parse().with_context(|| format!("row {}: bad low", row_num + 2))?;
        let close: i64 = get("close")?.parse().with_context(|| format!("row {}: bad close", row_num + 2))?;
        let volume: i64 = get("volume")?.parse().with_context(|| format!("row {}: bad volume", row_num + 2))?;

        bars.push(Bar::new(row_symbol, time, open, high, low, close, volume));
    }

    bars.sort_by_key(|b| b.time);
    if bars.is_empty() {
        bail!("no bars found for symbol '{symbol}' in [{start}, {end}] from {}", path.display());
    }
    Ok(bars)
}

fn build_col_index(header_line: &str) -> Result<HashMap<String, usize>> {
    let mut idx = HashMap::new();
    for (i, col) in header_line.split(',').enumerate() {
        idx.insert(col.trim().to_ascii_lowercase(), i);
    }
    for required in REQUIRED_COLUMNS {
        if !idx.contains_key(required) {
            bail!("bar csv missing required header column: '{required}'");
        }
    }
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("txf-cli-bars-test-{}-{}.csv", std::process::id(), contents.len()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn rows_outside_symbol_or_date_range_are_skipped() {
        let csv = "symbol,time,open,high,low,close,volume\n\
                   TXF,1700000000,100,110,90,105,10\n\
                   MXF,1700000000,1,2,0,1,5\n\
                   TXF,1800000000,200,210,190,205,20\n";
        let path = write_csv(csv);
        let start = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 11, 30).unwrap();
        let bars = load_bars(&path, "TXF", start, end).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 105);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "symbol,time,open,high,low,close\nTXF,1700000000,100,110,90,105\n";
        let path = write_csv(csv);
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(load_bars(&path, "TXF", start, end).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_result_set_is_an_error_not_a_silent_empty_report() {
        let csv = "symbol,time,open,high,low,close,volume\nMXF,1700000000,1,2,0,1,5\n";
        let path = write_csv(csv);
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(load_bars(&path, "TXF", start, end).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
