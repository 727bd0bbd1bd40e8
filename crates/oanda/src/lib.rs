pub mod client;
pub mod discovery;

pub use client::{parse_candles, InstrumentInfo, OandaClient};
pub use discovery::{classify_instrument, InstrumentCatalog};
