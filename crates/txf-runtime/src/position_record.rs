//! Persisted live-process position state, one JSON file per process keying
//! `sub_symbol -> PositionRecord`.
//!
//! Deserialization is tolerant of key absence: a record written by an older
//! build of this process must still load under a newer one that has added
//! fields since. Every field beyond the identifying ones carries
//! `#[serde(default)]` for exactly that reason.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use txf_types::{Direction, ManagedPosition};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionRecord {
    pub symbol: String,
    pub sub_symbol: String,
    pub direction: Direction,
    pub quantity: i64,
    pub entry_price: i64,
    /// ISO-8601, exchange-local.
    pub entry_time: String,
    pub stop_loss_price: i64,
    pub timeframe: String,
    #[serde(default)]
    pub trailing_active: bool,
    #[serde(default)]
    pub activation_price: Option<i64>,
    #[serde(default)]
    pub take_profit_price: Option<i64>,
    /// Live-only "buy-back" extension (spec.md §9): out of scope for this
    /// engine's PM, but the record shape still carries the flag so an older
    /// file that set it doesn't fail to load.
    #[serde(default)]
    pub buy_back_pending: bool,
    /// Opaque row number into an external sheet logger; that logger is out
    /// of scope here, the field exists only so its presence round-trips.
    #[serde(default)]
    pub sheet_row: Option<String>,
}

impl PositionRecord {
    /// Builds a record from the live position's current state, taking the
    /// stop-loss/take-profit/trailing fields from whichever leg still
    /// carries them (a TP leg's `exit_rule` for the take-profit price, any
    /// open leg's for the shared stop-loss/trailing fields).
    pub fn from_position(position: &ManagedPosition) -> Self {
        let any_rule = position.open_legs().next().map(|l| &l.exit_rule);
        let tp_price = position
            .legs
            .iter()
            .find_map(|l| l.exit_rule.take_profit_price);

        Self {
            symbol: position.symbol.clone(),
            sub_symbol: position.sub_symbol.clone(),
            direction: position.direction,
            quantity: position.total_quantity,
            entry_price: position.entry_price,
            entry_time: chrono::DateTime::from_timestamp(position.entry_time, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            stop_loss_price: any_rule.map(|r| r.stop_loss_price).unwrap_or(0),
            timeframe: String::new(),
            trailing_active: any_rule.is_some_and(|r| r.trailing_stop_active),
            activation_price: any_rule.and_then(|r| r.start_trailing_stop_price),
            take_profit_price: tp_price,
            buy_back_pending: false,
            sheet_row: None,
        }
    }
}

/// A JSON file of `sub_symbol -> PositionRecord`, loaded once at startup and
/// rewritten in full after every state-changing call. One store per live
/// process; never shared across processes.
pub struct PositionStore {
    path: PathBuf,
    records: HashMap<String, PositionRecord>,
}

impl PositionStore {
    /// Loads `path` if it exists; an absent file starts empty rather than
    /// erroring (first run of a fresh process).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("read position store: {path:?}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parse position store: {path:?}"))?
        } else {
            HashMap::new()
        };
        Ok(Self { path, records })
    }

    pub fn get(&self, sub_symbol: &str) -> Option<&PositionRecord> {
        self.records.get(sub_symbol)
    }

    pub fn upsert(&mut self, sub_symbol: impl Into<String>, record: PositionRecord) -> Result<()> {
        self.records.insert(sub_symbol.into(), record);
        self.flush()
    }

    pub fn remove(&mut self, sub_symbol: &str) -> Result<()> {
        self.records.remove(sub_symbol);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.records).context("serialize position store")?;
        std::fs::write(&self.path, raw).with_context(|| format!("write position store: {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_missing_optional_keys_still_deserializes() {
        let raw = r#"{"TXF202403": {
            "symbol": "TXF",
            "sub_symbol": "TXF202403",
            "direction": "Buy",
            "quantity": 1,
            "entry_price": 18000,
            "entry_time": "2026-01-01T09:00:00+08:00",
            "stop_loss_price": 17950,
            "timeframe": "30m"
        }}"#;
        let records: HashMap<String, PositionRecord> = serde_json::from_str(raw).unwrap();
        let record = &records["TXF202403"];
        assert!(!record.trailing_active);
        assert!(record.activation_price.is_none());
        assert!(record.sheet_row.is_none());
    }

    #[test]
    fn store_round_trips_through_a_real_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("txf-runtime-position-store-test-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut store = PositionStore::load(&path).unwrap();
        assert!(store.get("TXF202403").is_none());

        let record = PositionRecord {
            symbol: "TXF".to_string(),
            sub_symbol: "TXF202403".to_string(),
            direction: Direction::Buy,
            quantity: 1,
            entry_price: 18000,
            entry_time: "2026-01-01T09:00:00+08:00".to_string(),
            stop_loss_price: 17950,
            timeframe: "30m".to_string(),
            trailing_active: false,
            activation_price: None,
            take_profit_price: Some(18500),
            buy_back_pending: false,
            sheet_row: None,
        };
        store.upsert("TXF202403", record.clone()).unwrap();

        let reloaded = PositionStore::load(&path).unwrap();
        assert_eq!(reloaded.get("TXF202403"), Some(&record));

        let mut reloaded = reloaded;
        reloaded.remove("TXF202403").unwrap();
        assert!(PositionStore::load(&path).unwrap().get("TXF202403").is_none());

        let _ = std::fs::remove_file(&path);
    }
}
