use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use txf_types::PositionManagerConfig;

/// Raised for the configuration errors spec'd as "fails loudly at startup":
/// a leg-quantity mismatch, an unrecognized strategy name, or an unrecognized
/// `strategy_type`. Everything else (a missing tuning knob inside a strategy
/// block) falls back to that strategy's own default rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownActiveStrategy { name: String },
    UnknownStrategyType { block: String, strategy_type: String },
    LegQuantityMismatch { block: String, detail: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownActiveStrategy { name } => {
                write!(f, "active_strategy '{name}' has no matching strategy block")
            }
            ConfigError::UnknownStrategyType { block, strategy_type } => {
                write!(f, "strategy block '{block}' has unrecognized strategy_type '{strategy_type}'")
            }
            ConfigError::LegQuantityMismatch { block, detail } => {
                write!(f, "strategy block '{block}': {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    pub current: String,
    pub contract: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PositionBlock {
    pub total_quantity: i64,
    #[serde(default)]
    pub tp_leg_quantity: i64,
    #[serde(default)]
    pub ts_leg_quantity: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MonitoringConfig {
    /// Minutes between signal-check polls in the live driver.
    #[serde(default)]
    pub signal_check_interval: Option<u64>,
    /// Seconds between position-check polls in the live driver.
    #[serde(default)]
    pub position_check_interval: Option<u64>,
}

/// The recognized `trading` keys, plus anything strategy-specific captured
/// in `strategy_params` for later mapping into that strategy's own config
/// type.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TradingConfig {
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Hard error if absent: the four required trading keys.
    pub stop_loss_points: i64,
    #[serde(default)]
    pub stop_loss_points_rate: Option<f64>,
    pub take_profit_points: i64,
    #[serde(default)]
    pub take_profit_points_rate: Option<f64>,
    pub start_trailing_stop_points: i64,
    pub trailing_stop_points: i64,
    #[serde(default)]
    pub trailing_stop_points_rate: Option<f64>,
    #[serde(default)]
    pub tighten_after_points: Option<i64>,
    #[serde(default)]
    pub tighten_after_points_rate: Option<f64>,
    #[serde(default)]
    pub tightened_trailing_stop_points: Option<i64>,
    #[serde(default)]
    pub tightened_trailing_stop_points_rate: Option<f64>,
    #[serde(default)]
    pub enable_macd_fast_stop: Option<bool>,
    #[serde(default)]
    pub force_exit_time: Option<String>,
    /// Strategy-specific keys (MACD/ORB/Scalp/Bollinger parameters) live here
    /// unparsed until `strategy_type` picks which config type maps them.
    #[serde(flatten)]
    pub strategy_params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyBlock {
    #[serde(default)]
    pub strategy_type: Option<String>,
    pub trading: TradingConfig,
    #[serde(default)]
    pub position: Option<PositionBlock>,
    #[serde(default)]
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    pub active_strategy: String,
    pub symbol: SymbolConfig,
    #[serde(flatten)]
    pub strategies: HashMap<String, StrategyBlock>,
}

impl StrategyBlock {
    /// Builds the `PositionManagerConfig` for this block. `tp_leg_quantity`
    /// and `ts_leg_quantity` default to `0` and `total_quantity` respectively
    /// when `position` is omitted entirely (a single trailing-stop leg is the
    /// common single-quantity setup).
    pub fn position_manager_config(&self, block_name: &str) -> Result<PositionManagerConfig, ConfigError> {
        let position = self.position.clone().unwrap_or_default();
        let (total, tp, ts) = if self.position.is_some() {
            (position.total_quantity, position.tp_leg_quantity, position.ts_leg_quantity)
        } else {
            (1, 0, 1)
        };

        let mut config = PositionManagerConfig::new(total, tp, ts).map_err(|e| ConfigError::LegQuantityMismatch {
            block: block_name.to_string(),
            detail: e.to_string(),
        })?;

        let t = &self.trading;
        config.stop_loss_points = Some(t.stop_loss_points);
        config.stop_loss_points_rate = t.stop_loss_points_rate;
        config.take_profit_points = Some(t.take_profit_points);
        config.take_profit_points_rate = t.take_profit_points_rate;
        config.start_trailing_stop_points = Some(t.start_trailing_stop_points);
        config.trailing_stop_points = Some(t.trailing_stop_points);
        config.trailing_stop_points_rate = t.trailing_stop_points_rate.or(config.trailing_stop_points_rate);
        config.tighten_after_points = t.tighten_after_points.or(config.tighten_after_points);
        config.tighten_after_points_rate = t.tighten_after_points_rate.or(config.tighten_after_points_rate);
        config.tightened_trailing_stop_points =
            t.tightened_trailing_stop_points.or(config.tightened_trailing_stop_points);
        config.tightened_trailing_stop_points_rate = t
            .tightened_trailing_stop_points_rate
            .or(config.tightened_trailing_stop_points_rate);
        if let Some(v) = t.enable_macd_fast_stop {
            config.enable_macd_fast_stop = v;
        }
        if let Some(tf) = &t.timeframe {
            config.timeframe = tf.clone();
        }
        config.force_exit_time = t.force_exit_time.clone().or(config.force_exit_time.clone());

        Ok(config)
    }
}
