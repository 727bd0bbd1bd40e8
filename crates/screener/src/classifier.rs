//! Multi-timeframe trend classification.
//!
//! A timeframe is Long when `fast > medium > slow` and the reference price is
//! above `fast`; Short when `slow > medium > fast` and the price is below
//! `fast`. All comparisons are strict. A pairing fires only when both of its
//! timeframes agree on the direction.

use chrono::{DateTime, Utc};
use tracing::debug;

use common::{
    Direction, EmaTriple, Error, InstrumentClass, Result, TimeframePairing, TrendSignal,
};

use crate::indicators::EmaSnapshot;

pub fn is_long(price: f64, emas: &EmaTriple) -> bool {
    emas.fast > emas.medium && emas.medium > emas.slow && price > emas.fast
}

pub fn is_short(price: f64, emas: &EmaTriple) -> bool {
    emas.slow > emas.medium && emas.medium > emas.fast && price < emas.fast
}

/// Direction shared by both timeframes, or `None` when they disagree or
/// neither trends.
pub fn classify(higher: &EmaTriple, lower: &EmaTriple, price: f64) -> Option<Direction> {
    if is_long(price, higher) && is_long(price, lower) {
        Some(Direction::Long)
    } else if is_short(price, higher) && is_short(price, lower) {
        Some(Direction::Short)
    } else {
        None
    }
}

/// Most decimal places a reported value may be rounded to.
pub const MAX_PRECISION: u32 = 15;

/// Round to `decimals` places (capped at [`MAX_PRECISION`]).
///
/// Goes through fixed-precision formatting, which rounds the exact binary
/// value. Scaling by `10^decimals` first would round twice and can tip a
/// value sitting just below a half over it.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let decimals = decimals.min(MAX_PRECISION) as usize;
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

pub fn round_triple(emas: &EmaTriple, decimals: u32) -> EmaTriple {
    EmaTriple {
        fast: round_to(emas.fast, decimals),
        medium: round_to(emas.medium, decimals),
        slow: round_to(emas.slow, decimals),
    }
}

/// Evaluate one pairing for one instrument.
///
/// The reference price is the lower timeframe's latest close. Reported EMAs
/// are rounded to `precision` decimal places; the comparison itself runs on
/// the raw values.
///
/// Returns `Ok(None)` for a valid no-trend outcome and
/// `Err(Error::UndefinedEma)` when either snapshot lacks an EMA, in which
/// case the pairing should be skipped rather than the instrument failed.
pub fn evaluate_pairing(
    instrument: &str,
    class: InstrumentClass,
    pairing: &TimeframePairing,
    higher: &EmaSnapshot,
    lower: &EmaSnapshot,
    precision: u32,
    timestamp: DateTime<Utc>,
) -> Result<Option<TrendSignal>> {
    let higher_emas = higher.triple().ok_or_else(|| Error::UndefinedEma {
        instrument: instrument.to_string(),
        granularity: pairing.higher,
    })?;
    let lower_emas = lower.triple().ok_or_else(|| Error::UndefinedEma {
        instrument: instrument.to_string(),
        granularity: pairing.lower,
    })?;

    let price = lower.current_price;
    let Some(direction) = classify(&higher_emas, &lower_emas, price) else {
        debug!(instrument, pairing = %pairing.name, "No trend on both timeframes");
        return Ok(None);
    };

    Ok(Some(TrendSignal {
        instrument: instrument.to_string(),
        class,
        price,
        pairing: pairing.name.clone(),
        direction,
        higher: round_triple(&higher_emas, precision),
        lower: round_triple(&lower_emas, precision),
        timestamp,
    }))
}
