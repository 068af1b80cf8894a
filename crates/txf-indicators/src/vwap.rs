use chrono::{NaiveDateTime, NaiveTime};
use txf_types::Bar;

fn naive(time: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp(time, 0).map(|dt| dt.naive_utc())
}

/// Session-scoped VWAP, restricted to the most recent bar's calendar date and
/// `[session_start, session_end)`. Volume-less bars are floored to 1.0 rather
/// than dropped, so this only returns `None` when no bar in the sequence
/// falls in the session at all.
pub fn session_vwap(bars: &[Bar], session_start: NaiveTime, session_end: NaiveTime) -> Option<f64> {
    let latest_date = naive(bars.last()?.time)?.date();

    let mut total_tp_vol = 0.0_f64;
    let mut total_vol = 0.0_f64;

    for bar in bars {
        let Some(dt) = naive(bar.time) else { continue };
        if dt.date() != latest_date {
            continue;
        }
        let t = dt.time();
        if t < session_start || t >= session_end {
            continue;
        }
        let typical_price = (bar.high + bar.low + bar.close) as f64 / 3.0;
        let vol = if bar.volume > 0 { bar.volume as f64 } else { 1.0 };
        total_tp_vol += typical_price * vol;
        total_vol += vol;
    }

    if total_vol == 0.0 {
        None
    } else {
        Some(total_tp_vol / total_vol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn empty_bars_returns_none() {
        let bars: Vec<Bar> = Vec::new();
        let start = NaiveTime::from_hms_opt(8, 45, 0).unwrap();
        let end = NaiveTime::from_hms_opt(13, 45, 0).unwrap();
        assert_eq!(session_vwap(&bars, start, end), None);
    }
}
