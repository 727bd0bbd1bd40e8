use serde::{Deserialize, Serialize};

use common::EmaTriple;

/// Exponential Moving Average over the whole of `prices` (oldest first).
///
/// The accumulator is seeded with the FIRST price, not with an SMA of the
/// first `period` values, then each later price is folded in with
/// `ema = p * k + ema * (1 - k)` where `k = 2 / (period + 1)`.
///
/// Returns `None` when `period == 0` or there are fewer than `period` prices.
pub fn ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let (&seed, rest) = prices.split_first()?;

    Some(rest.iter().fold(seed, |acc, &price| price * k + acc * (1.0 - k)))
}

/// The three EMA periods computed per timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaPeriods {
    pub fast: usize,
    pub medium: usize,
    pub slow: usize,
}

impl Default for EmaPeriods {
    fn default() -> Self {
        Self {
            fast: 8,
            medium: 50,
            slow: 200,
        }
    }
}

impl EmaPeriods {
    /// How many trailing closes feed the EMAs. Older history is ignored.
    pub fn window(&self) -> usize {
        self.slow
    }

    pub fn is_valid(&self) -> bool {
        self.fast > 0 && self.fast < self.medium && self.medium < self.slow
    }
}

/// EMA values of one (instrument, granularity) plus its latest close.
/// An EMA is `None` when the series was shorter than its period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaSnapshot {
    pub ema_fast: Option<f64>,
    pub ema_medium: Option<f64>,
    pub ema_slow: Option<f64>,
    pub current_price: f64,
}

impl EmaSnapshot {
    /// All three EMAs, or `None` if any of them is undefined.
    pub fn triple(&self) -> Option<EmaTriple> {
        Some(EmaTriple {
            fast: self.ema_fast?,
            medium: self.ema_medium?,
            slow: self.ema_slow?,
        })
    }
}

/// Turns a close series into an [`EmaSnapshot`].
#[derive(Debug, Clone)]
pub struct EmaEngine {
    periods: EmaPeriods,
}

impl Default for EmaEngine {
    fn default() -> Self {
        Self::new(EmaPeriods::default())
    }
}

impl EmaEngine {
    pub fn new(periods: EmaPeriods) -> Self {
        assert!(
            periods.is_valid(),
            "EMA periods must satisfy 0 < fast < medium < slow"
        );
        Self { periods }
    }

    pub fn periods(&self) -> &EmaPeriods {
        &self.periods
    }

    /// Compute the snapshot from closes (oldest first).
    /// Only the last `window()` closes are used. Returns `None` for an empty series.
    pub fn snapshot(&self, closes: &[f64]) -> Option<EmaSnapshot> {
        let current_price = *closes.last()?;
        let start = closes.len().saturating_sub(self.periods.window());
        let window = &closes[start..];

        Some(EmaSnapshot {
            ema_fast: ema(window, self.periods.fast),
            ema_medium: ema(window, self.periods.medium),
            ema_slow: ema(window, self.periods.slow),
            current_price,
        })
    }
}
