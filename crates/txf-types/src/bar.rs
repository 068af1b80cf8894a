/// A single OHLCV bar for one symbol.
///
/// Prices and volume are integer index points, matching the exchange's
/// tick-sized quoting (TXF/MXF trade in whole index points). Indicator math
/// converts to `f64` internally; the wire/storage type stays integral.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bar {
    pub symbol: String,
    /// Bar close timestamp (epoch seconds, exchange-local).
    pub time: i64,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
}

impl Bar {
    pub fn new(symbol: impl Into<String>, time: i64, open: i64, high: i64, low: i64, close: i64, volume: i64) -> Self {
        Self {
            symbol: symbol.into(),
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// TWD value of one index point of movement, per contract, per symbol.
///
/// Unrecognized symbols fall back to the MXF (mini) multiplier rather than
/// erroring, since the strategies operate on whichever rolling-front symbol
/// the data feed names.
pub fn point_value(symbol: &str) -> i64 {
    match symbol {
        "TXF" => 200,
        "MXF" => 50,
        "EXF" => 200,
        "FXF" => 200,
        "NXF" => 200,
        _ => 50,
    }
}
