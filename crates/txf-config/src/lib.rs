//! Layered YAML configuration loading and mapping into the runtime types
//! `PositionManagerConfig` and the boxed `Strategy` trait object.
//!
//! Mirrors the canonicalize-then-hash discipline used for reproducible runs:
//! every layer is deep-merged, the result is canonicalized (sorted keys) and
//! SHA-256 hashed, and that hash is what a CLI run or report should print
//! alongside its results so two runs can be compared for config drift.

mod model;
mod secrets;
mod yaml;

pub use model::{ConfigError, MonitoringConfig, PositionBlock, RootConfig, StrategyBlock, SymbolConfig, TradingConfig};
pub use secrets::{resolve_secrets_for_mode, ResolvedSecrets, RunMode};
pub use yaml::{load_layered_yaml, merge_over_default, LoadedConfig};

use anyhow::{Context, Result};
use txf_strategy::{
    BollingerConfig, BollingerStrategy, MacdBidirectionalStrategy, MacdConfig, MacdGoldenCrossStrategy, OrbConfig,
    OrbStrategy, ScalpConfig, ScalpStrategy, Strategy,
};
use txf_types::PositionManagerConfig;

/// Everything needed to build one `TradingUnit`, resolved from the active
/// strategy block named by `active_strategy`.
pub struct ResolvedConfig {
    pub config_hash: String,
    pub symbol: SymbolConfig,
    pub active_strategy_name: String,
    pub position_manager_config: PositionManagerConfig,
    pub monitoring: MonitoringConfig,
}

/// Loads layered YAML files, validates the quantity-sum and strategy-name
/// invariants, and returns both the resolved `PositionManagerConfig` and a
/// freshly constructed `Strategy` for the `active_strategy` block.
///
/// Any other key present in the active block but not recognized by its
/// strategy type's config struct is silently ignored by serde's flatten
/// capture; any key *absent* falls back to that strategy's own default.
pub fn load_config(paths: &[&str]) -> Result<(ResolvedConfig, Box<dyn Strategy>)> {
    let loaded = load_layered_yaml(paths)?;
    let root: RootConfig = serde_json::from_value(loaded.config_json.clone()).context("config shape mismatch")?;
    resolve_block(&root.active_strategy.clone(), &root, loaded.config_hash)
}

/// Same as [`load_config`] but resolves a named strategy block instead of
/// `active_strategy` — used by `txf backtest --strategies a,b` to build one
/// `TradingUnit` per requested block from a single config document.
pub fn load_named_strategy(paths: &[&str], block_name: &str) -> Result<(ResolvedConfig, Box<dyn Strategy>)> {
    let loaded = load_layered_yaml(paths)?;
    let root: RootConfig = serde_json::from_value(loaded.config_json.clone()).context("config shape mismatch")?;
    resolve_block(block_name, &root, loaded.config_hash)
}

fn resolve_block(block_name: &str, root: &RootConfig, config_hash: String) -> Result<(ResolvedConfig, Box<dyn Strategy>)> {
    let block = root
        .strategies
        .get(block_name)
        .ok_or_else(|| ConfigError::UnknownActiveStrategy { name: block_name.to_string() })?;

    let pm_config = block.position_manager_config(block_name)?;
    let strategy = build_strategy(block_name, block)?;

    let resolved = ResolvedConfig {
        config_hash,
        symbol: root.symbol.clone(),
        active_strategy_name: block_name.to_string(),
        position_manager_config: pm_config,
        monitoring: block.monitoring.clone().unwrap_or_default(),
    };

    Ok((resolved, strategy))
}

/// Dispatches on `strategy_type` to build the concrete `Strategy`, mapping
/// the block's flattened strategy-specific keys onto that strategy's config
/// type with `merge_over_default`.
fn build_strategy(block_name: &str, block: &StrategyBlock) -> Result<Box<dyn Strategy>, ConfigError> {
    let strategy_type = block.strategy_type.as_deref().unwrap_or("macd_golden_cross");
    let params = &block.trading.strategy_params;

    let into_err = |_: anyhow::Error| ConfigError::UnknownStrategyType {
        block: block_name.to_string(),
        strategy_type: strategy_type.to_string(),
    };

    match strategy_type {
        "macd_golden_cross" => {
            let cfg: MacdConfig = merge_over_default(params).map_err(into_err)?;
            Ok(Box::new(MacdGoldenCrossStrategy::new(cfg)))
        }
        "macd_bidirectional" => {
            let cfg: MacdConfig = merge_over_default(params).map_err(into_err)?;
            Ok(Box::new(MacdBidirectionalStrategy::new(cfg)))
        }
        "orb" => {
            let cfg: OrbConfig = merge_over_default(params).map_err(into_err)?;
            Ok(Box::new(OrbStrategy::new(cfg)))
        }
        "scalp" => {
            let cfg: ScalpConfig = merge_over_default(params).map_err(into_err)?;
            Ok(Box::new(ScalpStrategy::new(cfg)))
        }
        "bollinger" => {
            let cfg: BollingerConfig = merge_over_default(params).map_err(into_err)?;
            Ok(Box::new(BollingerStrategy::new(cfg)))
        }
        other => Err(ConfigError::UnknownStrategyType {
            block: block_name.to_string(),
            strategy_type: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_yaml(contents: &str) -> tempfile_path::TempYaml {
        tempfile_path::TempYaml::new(contents)
    }

    mod tempfile_path {
        use std::io::Write;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        /// Minimal scratch-file helper: writes `contents` under the process
        /// temp dir and removes it on drop. Avoids pulling in a `tempfile`
        /// dependency for a handful of config tests.
        pub struct TempYaml {
            pub path: std::path::PathBuf,
        }

        impl TempYaml {
            pub fn new(contents: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut path = std::env::temp_dir();
                path.push(format!("txf-config-test-{}-{n}.yaml", std::process::id()));
                let mut f = std::fs::File::create(&path).unwrap();
                f.write_all(contents.as_bytes()).unwrap();
                TempYaml { path }
            }
        }

        impl Drop for TempYaml {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    #[test]
    fn quantity_mismatch_fails_loudly() {
        let yaml = write_temp_yaml(
            r#"
active_strategy: main
symbol:
  current: TXF202403
  contract: TXF
main:
  strategy_type: macd_golden_cross
  trading:
    timeframe: 30m
    stop_loss_points: 50
    take_profit_points: 500
    start_trailing_stop_points: 200
    trailing_stop_points: 200
  position:
    total_quantity: 2
    tp_leg_quantity: 1
    ts_leg_quantity: 2
"#,
        );
        let path = yaml.path.to_str().unwrap();
        let result = load_config(&[path]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_active_strategy_fails_loudly() {
        let yaml = write_temp_yaml(
            r#"
active_strategy: missing
symbol:
  current: TXF202403
  contract: TXF
main:
  strategy_type: macd_golden_cross
  trading:
    timeframe: 30m
    stop_loss_points: 50
    take_profit_points: 500
    start_trailing_stop_points: 200
    trailing_stop_points: 200
"#,
        );
        let path = yaml.path.to_str().unwrap();
        let result = load_config(&[path]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_strategy_params_fall_back_to_defaults() {
        let yaml = write_temp_yaml(
            r#"
active_strategy: main
symbol:
  current: TXF202403
  contract: TXF
main:
  strategy_type: macd_golden_cross
  trading:
    timeframe: 30m
    macd_threshold: 40.0
    stop_loss_points: 50
    take_profit_points: 500
    start_trailing_stop_points: 200
    trailing_stop_points: 200
  position:
    total_quantity: 1
    tp_leg_quantity: 0
    ts_leg_quantity: 1
"#,
        );
        let path = yaml.path.to_str().unwrap();
        let (resolved, _strategy) = load_config(&[path]).unwrap();
        assert_eq!(resolved.position_manager_config.timeframe, "30m");
        assert_eq!(resolved.active_strategy_name, "main");
        assert!(!resolved.config_hash.is_empty());
    }
}
