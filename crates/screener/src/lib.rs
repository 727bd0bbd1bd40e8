pub mod classifier;
pub mod config;
pub mod indicators;
pub mod pipeline;

pub use classifier::{classify, evaluate_pairing, is_long, is_short, round_to, MAX_PRECISION};
pub use config::{ClassConfig, ScreenerFileConfig};
pub use indicators::{ema, EmaEngine, EmaPeriods, EmaSnapshot};
pub use pipeline::{evaluate_instrument, ClassOutcome, InstrumentFailure, ScanReport, Screener};
