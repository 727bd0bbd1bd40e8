pub mod ema;

pub use ema::{ema, EmaEngine, EmaPeriods, EmaSnapshot};
