//! Live-mode credential resolution.
//!
//! Config YAML never carries secret values, only (implicitly) the contract
//! that these env vars exist when `RunMode::Live` is selected. Backtest mode
//! never touches the environment for any of this.

use anyhow::{bail, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    Backtest,
    Live,
}

/// Broker credentials resolved from the environment for live trading.
/// `Debug` redacts every field; only presence/absence is ever logged.
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub broker_api_key: Option<String>,
    pub broker_api_secret: Option<String>,
    pub ca_path: Option<String>,
    pub ca_password: Option<String>,
    /// `true` routes orders to the broker's simulation endpoint instead of
    /// the live one even though credentials are present.
    pub simulate: bool,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("broker_api_key", &self.broker_api_key.as_ref().map(|_| "<REDACTED>"))
            .field("broker_api_secret", &self.broker_api_secret.as_ref().map(|_| "<REDACTED>"))
            .field("ca_path", &self.ca_path.as_ref().map(|_| "<REDACTED>"))
            .field("ca_password", &self.ca_password.as_ref().map(|_| "<REDACTED>"))
            .field("simulate", &self.simulate)
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolves broker credentials for `mode`. `BACKTEST` never requires
/// anything; `LIVE` requires the API key/secret pair and the CA cert
/// path/password a TXF broker API demands for order placement.
///
/// # Errors
/// Returns `Err` naming the missing env var; the value is never mentioned.
pub fn resolve_secrets_for_mode(mode: RunMode) -> Result<ResolvedSecrets> {
    let broker_api_key = resolve_env("TXF_BROKER_API_KEY");
    let broker_api_secret = resolve_env("TXF_BROKER_API_SECRET");
    let ca_path = resolve_env("TXF_CA_PATH");
    let ca_password = resolve_env("TXF_CA_PASSWORD");
    let simulate = resolve_env("TXF_SIMULATE").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    if mode == RunMode::Live {
        if broker_api_key.is_none() {
            bail!("SECRETS_MISSING mode=LIVE: required env var 'TXF_BROKER_API_KEY' is not set or empty");
        }
        if broker_api_secret.is_none() {
            bail!("SECRETS_MISSING mode=LIVE: required env var 'TXF_BROKER_API_SECRET' is not set or empty");
        }
        if ca_path.is_none() {
            bail!("SECRETS_MISSING mode=LIVE: required env var 'TXF_CA_PATH' is not set or empty");
        }
        if ca_password.is_none() {
            bail!("SECRETS_MISSING mode=LIVE: required env var 'TXF_CA_PASSWORD' is not set or empty");
        }
    }

    Ok(ResolvedSecrets { broker_api_key, broker_api_secret, ca_path, ca_password, simulate })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtest_mode_never_requires_credentials() {
        // No TXF_* env vars are set in the test environment; BACKTEST must
        // still resolve successfully even with everything absent.
        assert!(resolve_secrets_for_mode(RunMode::Backtest).is_ok());
    }

    #[test]
    fn debug_impl_never_prints_secret_values() {
        let resolved = ResolvedSecrets {
            broker_api_key: Some("super-secret".to_string()),
            broker_api_secret: Some("also-secret".to_string()),
            ca_path: None,
            ca_password: None,
            simulate: false,
        };
        let rendered = format!("{resolved:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("also-secret"));
    }
}
