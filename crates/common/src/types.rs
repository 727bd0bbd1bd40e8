use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One price observation from the broker.
/// Only candles where `complete == true` (interval fully elapsed) feed the EMAs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    /// Mid close price.
    pub close: f64,
    pub complete: bool,
}

/// Candle interval, using OANDA's granularity codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "W")]
    Weekly,
    #[serde(rename = "M")]
    Monthly,
}

impl Granularity {
    /// The code the OANDA candles endpoint expects.
    pub fn code(&self) -> &'static str {
        match self {
            Granularity::M1 => "M1",
            Granularity::M5 => "M5",
            Granularity::M15 => "M15",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H4 => "H4",
            Granularity::Daily => "D",
            Granularity::Weekly => "W",
            Granularity::Monthly => "M",
        }
    }

    /// Short label used in pairing names and report headings.
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::M1 => "1min",
            Granularity::M5 => "5min",
            Granularity::M15 => "15min",
            Granularity::M30 => "30min",
            Granularity::H1 => "1hr",
            Granularity::H4 => "4hr",
            Granularity::Daily => "1d",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M1" => Ok(Granularity::M1),
            "M5" => Ok(Granularity::M5),
            "M15" => Ok(Granularity::M15),
            "M30" => Ok(Granularity::M30),
            "H1" => Ok(Granularity::H1),
            "H4" => Ok(Granularity::H4),
            "D" => Ok(Granularity::Daily),
            "W" => Ok(Granularity::Weekly),
            "M" => Ok(Granularity::Monthly),
            other => Err(Error::Config(format!("unknown granularity '{other}'"))),
        }
    }
}

/// A higher/lower granularity pair evaluated jointly for trend confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframePairing {
    pub name: String,
    pub higher: Granularity,
    pub lower: Granularity,
}

impl TimeframePairing {
    pub fn new(name: impl Into<String>, higher: Granularity, lower: Granularity) -> Self {
        Self {
            name: name.into(),
            higher,
            lower,
        }
    }

    /// The four pairings every instrument class scans unless configured otherwise.
    pub fn canonical() -> Vec<TimeframePairing> {
        vec![
            TimeframePairing::new("1hr vs 1d", Granularity::Daily, Granularity::H1),
            TimeframePairing::new("4hr vs weekly", Granularity::Weekly, Granularity::H4),
            TimeframePairing::new("5min vs 1hr", Granularity::H1, Granularity::M5),
            TimeframePairing::new("15min vs 4hr", Granularity::H4, Granularity::M15),
        ]
    }

    /// Bracketed tag used in console headings, e.g. `[1hr,1d]`.
    pub fn tag(&self) -> String {
        format!("[{},{}]", self.lower.label(), self.higher.label())
    }
}

/// Instrument family. Decides the default rounding of reported EMA values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentClass {
    Forex,
    Commodity,
    Index,
    Bond,
}

impl InstrumentClass {
    /// Decimal places for reported EMA values.
    pub fn default_precision(&self) -> u32 {
        match self {
            InstrumentClass::Forex | InstrumentClass::Commodity => 5,
            InstrumentClass::Index | InstrumentClass::Bond => 2,
        }
    }
}

impl std::fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentClass::Forex => write!(f, "forex"),
            InstrumentClass::Commodity => write!(f, "commodity"),
            InstrumentClass::Index => write!(f, "index"),
            InstrumentClass::Bond => write!(f, "bond"),
        }
    }
}

/// Trend direction confirmed on both timeframes of a pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

/// Fast / medium / slow EMA values of one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaTriple {
    pub fast: f64,
    pub medium: f64,
    pub slow: f64,
}

/// Closing prices for one instrument at one granularity, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub instrument: String,
    pub granularity: Granularity,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from raw candles, dropping incomplete ones.
    pub fn from_candles(
        instrument: impl Into<String>,
        granularity: Granularity,
        candles: &[Candle],
    ) -> Self {
        Self {
            instrument: instrument.into(),
            granularity,
            closes: candles.iter().filter(|c| c.complete).map(|c| c.close).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Most recent close.
    pub fn latest(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// Reject the series when it holds fewer than `required` complete closes.
    pub fn ensure_usable(&self, required: usize) -> Result<(), Error> {
        if self.closes.len() < required {
            return Err(Error::InsufficientData {
                instrument: self.instrument.clone(),
                granularity: self.granularity,
                available: self.closes.len(),
                required,
            });
        }
        Ok(())
    }
}

/// A fired multi-timeframe trend for one instrument and pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub instrument: String,
    pub class: InstrumentClass,
    /// Reference price the conditions were checked against.
    pub price: f64,
    pub pairing: String,
    pub direction: Direction,
    /// Rounded to the class precision.
    pub higher: EmaTriple,
    /// Rounded to the class precision.
    pub lower: EmaTriple,
    pub timestamp: DateTime<Utc>,
}

/// Which OANDA REST host to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OandaEnvironment {
    #[default]
    Practice,
    Live,
}

impl std::fmt::Display for OandaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OandaEnvironment::Practice => write!(f, "practice"),
            OandaEnvironment::Live => write!(f, "live"),
        }
    }
}
