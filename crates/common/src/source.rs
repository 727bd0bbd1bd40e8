use async_trait::async_trait;

use crate::{Candle, Granularity, Result};

/// Abstraction over the broker's candle history endpoint.
///
/// `OandaClient` implements this against the REST API. Tests plug in an
/// in-memory source. The screener never talks HTTP directly.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the most recent `count` candles, oldest first.
    /// May include a trailing incomplete candle.
    async fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<Candle>>;
}
