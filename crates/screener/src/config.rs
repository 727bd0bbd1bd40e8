use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use common::{Error, Granularity, InstrumentClass, Result, TimeframePairing};

use crate::classifier::MAX_PRECISION;
use crate::indicators::EmaPeriods;

/// Top-level screener config file (TOML).
///
/// Example `config/screener.toml`:
/// ```toml
/// candle_count = 250
///
/// [ema]
/// fast = 8
/// medium = 50
/// slow = 200
///
/// [[class]]
/// name = "indices"
/// kind = "index"
/// instruments = ["SPX500_USD", "NAS100_USD"]
///
/// [[class.pairing]]
/// name = "1hr vs 1d"
/// higher = "D"
/// lower = "H1"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScreenerFileConfig {
    /// Candles requested per (instrument, granularity).
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,
    /// Complete candles required before a series is usable.
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    #[serde(default)]
    pub ema: EmaPeriods,
    #[serde(rename = "class")]
    pub classes: Vec<ClassConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassConfig {
    /// Name shown in logs and used in export file names, e.g. "forex".
    pub name: String,
    pub kind: InstrumentClass,
    /// Decimal places for reported EMAs. Defaults by `kind`.
    #[serde(default)]
    pub precision: Option<u32>,
    pub instruments: Vec<String>,
    /// Pairings to evaluate. Defaults to the four canonical pairings.
    #[serde(rename = "pairing", default = "TimeframePairing::canonical")]
    pub pairings: Vec<TimeframePairing>,
}

fn default_candle_count() -> usize {
    250
}

fn default_min_observations() -> usize {
    200
}

impl ClassConfig {
    pub fn precision(&self) -> u32 {
        self.precision.unwrap_or_else(|| self.kind.default_precision())
    }

    /// Every granularity some pairing of this class needs, each once.
    pub fn granularities(&self) -> Vec<Granularity> {
        self.pairings
            .iter()
            .flat_map(|p| [p.higher, p.lower])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl ScreenerFileConfig {
    /// Load and validate a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read screener config at '{path}': {e}"))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("Invalid screener config at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ema.is_valid() {
            return Err(Error::Config(format!(
                "EMA periods must satisfy 0 < fast < medium < slow, got {}/{}/{}",
                self.ema.fast, self.ema.medium, self.ema.slow
            )));
        }
        if self.min_observations < self.ema.slow {
            return Err(Error::Config(format!(
                "min_observations ({}) must be at least the slow EMA period ({})",
                self.min_observations, self.ema.slow
            )));
        }
        if self.candle_count < self.min_observations {
            return Err(Error::Config(format!(
                "candle_count ({}) must be at least min_observations ({})",
                self.candle_count, self.min_observations
            )));
        }
        if self.classes.is_empty() {
            return Err(Error::Config("no [[class]] entries configured".to_string()));
        }

        let mut names = BTreeSet::new();
        for class in &self.classes {
            if !names.insert(class.name.as_str()) {
                return Err(Error::Config(format!("duplicate class name '{}'", class.name)));
            }
            if class.instruments.is_empty() {
                return Err(Error::Config(format!("class '{}' has no instruments", class.name)));
            }
            if let Some(precision) = class.precision {
                if precision > MAX_PRECISION {
                    return Err(Error::Config(format!(
                        "class '{}' precision {precision} exceeds the maximum of {MAX_PRECISION}",
                        class.name
                    )));
                }
            }
            if class.pairings.is_empty() {
                return Err(Error::Config(format!("class '{}' has no pairings", class.name)));
            }
            for pairing in &class.pairings {
                if pairing.higher == pairing.lower {
                    return Err(Error::Config(format!(
                        "pairing '{}' in class '{}' uses {} for both timeframes",
                        pairing.name, class.name, pairing.higher
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&ClassConfig> {
        self.classes.iter().find(|c| c.name == name)
    }
}
