use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Candle, CandleSource, Error, Granularity, OandaEnvironment, Result};

const PRACTICE_URL: &str = "https://api-fxpractice.oanda.com";
const LIVE_URL: &str = "https://api-fxtrade.oanda.com";

/// REST client for the OANDA v20 API. Used for candle history and account instruments.
pub struct OandaClient {
    token: String,
    base_url: String,
    http: Client,
}

impl OandaClient {
    pub fn new(token: impl Into<String>, environment: OandaEnvironment) -> Result<Self> {
        let base_url = match environment {
            OandaEnvironment::Practice => PRACTICE_URL,
            OandaEnvironment::Live => LIVE_URL,
        };
        Self::with_base_url(token, base_url)
    }

    /// Point the client at another host, e.g. a local mock.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Tradeable instruments of an account.
    pub async fn list_instruments(&self, account_id: &str) -> Result<Vec<InstrumentInfo>> {
        debug!(account_id, "Listing account instruments");
        let body = self
            .get(&format!("/v3/accounts/{account_id}/instruments"), &[])
            .await?;
        let resp: InstrumentsResponse = serde_json::from_str(&body)?;
        Ok(resp.instruments)
    }
}

#[async_trait]
impl CandleSource for OandaClient {
    async fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<Candle>> {
        debug!(instrument, %granularity, count, "Fetching candles from OANDA");
        let body = self
            .get(
                &format!("/v3/instruments/{instrument}/candles"),
                &[
                    ("count", count.to_string()),
                    ("granularity", granularity.code().to_string()),
                    ("price", "M".to_string()),
                ],
            )
            .await?;
        parse_candles(&body)
    }
}

/// Decode a candles response body into [`Candle`]s (oldest first).
/// Candles without mid prices are dropped.
pub fn parse_candles(body: &str) -> Result<Vec<Candle>> {
    let resp: CandlesResponse = serde_json::from_str(body)?;

    resp.candles
        .into_iter()
        .filter_map(|raw| raw.mid.map(|mid| (raw.time, raw.complete, mid)))
        .map(|(time, complete, mid)| -> Result<Candle> {
            let time = DateTime::parse_from_rfc3339(&time)
                .map_err(|e| Error::Other(format!("bad candle time '{time}': {e}")))?
                .with_timezone(&Utc);
            let close = mid
                .c
                .parse::<f64>()
                .map_err(|e| Error::Other(format!("bad close price '{}': {e}", mid.c)))?;
            Ok(Candle {
                time,
                close,
                complete,
            })
        })
        .collect()
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<RawCandle>,
}

#[derive(Deserialize)]
struct RawCandle {
    time: String,
    #[serde(default)]
    complete: bool,
    mid: Option<MidPrice>,
}

#[derive(Deserialize)]
struct MidPrice {
    c: String,
}

#[derive(Deserialize)]
struct InstrumentsResponse {
    instruments: Vec<InstrumentInfo>,
}

/// One entry of the account instruments listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub instrument_type: String,
}
