use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use common::{
    CandleSource, Error, Granularity, InstrumentClass, PriceSeries, Result, TimeframePairing,
    TrendSignal,
};

use crate::classifier::evaluate_pairing;
use crate::config::{ClassConfig, ScreenerFileConfig};
use crate::indicators::{EmaEngine, EmaSnapshot};

/// Evaluate every pairing for one instrument and return the signals that fired.
///
/// Pairings are independent; an instrument may fire on none, some or all of
/// them. A pairing whose snapshots are missing or carry an undefined EMA is
/// logged and skipped.
pub fn evaluate_instrument(
    instrument: &str,
    class: InstrumentClass,
    pairings: &[TimeframePairing],
    snapshots: &HashMap<Granularity, EmaSnapshot>,
    precision: u32,
    timestamp: DateTime<Utc>,
) -> Vec<TrendSignal> {
    pairings
        .iter()
        .filter_map(|pairing| {
            let (Some(higher), Some(lower)) =
                (snapshots.get(&pairing.higher), snapshots.get(&pairing.lower))
            else {
                warn!(instrument, pairing = %pairing.name, "Missing timeframe data, pairing skipped");
                return None;
            };

            match evaluate_pairing(instrument, class, pairing, higher, lower, precision, timestamp) {
                Ok(Some(signal)) => {
                    info!(
                        instrument,
                        pairing = %pairing.name,
                        direction = %signal.direction,
                        price = signal.price,
                        "Trend confirmed"
                    );
                    Some(signal)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(instrument, pairing = %pairing.name, error = %e, "Pairing skipped");
                    None
                }
            }
        })
        .collect()
}

/// An instrument that could not be evaluated. The rest of the batch still runs.
#[derive(Debug, Clone)]
pub struct InstrumentFailure {
    pub class: String,
    pub instrument: String,
    pub reason: String,
    /// Coverage gap (not enough history) rather than a fetch or API failure.
    pub insufficient_data: bool,
}

/// Result of scanning one configured class.
#[derive(Debug, Clone)]
pub struct ClassOutcome {
    pub name: String,
    pub kind: InstrumentClass,
    /// Decimal places used for this class's reported values.
    pub precision: u32,
    pub pairings: Vec<TimeframePairing>,
    pub scanned: usize,
    pub signals: Vec<TrendSignal>,
    pub failures: Vec<InstrumentFailure>,
}

/// Everything one run produced. Partial when some instruments failed.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub timestamp: DateTime<Utc>,
    pub classes: Vec<ClassOutcome>,
}

impl ScanReport {
    pub fn signals(&self) -> impl Iterator<Item = &TrendSignal> {
        self.classes.iter().flat_map(|c| c.signals.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstrumentFailure> {
        self.classes.iter().flat_map(|c| c.failures.iter())
    }

    pub fn instruments_scanned(&self) -> usize {
        self.classes.iter().map(|c| c.scanned).sum()
    }
}

/// Drives the batch: fetch → EMA snapshots → pairing evaluation, per instrument.
pub struct Screener {
    source: Arc<dyn CandleSource>,
    config: ScreenerFileConfig,
    engine: EmaEngine,
}

impl Screener {
    pub fn new(source: Arc<dyn CandleSource>, config: ScreenerFileConfig) -> Self {
        let engine = EmaEngine::new(config.ema);
        Self {
            source,
            config,
            engine,
        }
    }

    pub fn config(&self) -> &ScreenerFileConfig {
        &self.config
    }

    /// Fetch one granularity and compute its snapshot.
    /// Fails with `InsufficientData` when fewer than `min_observations` complete candles arrive.
    pub async fn snapshot(&self, instrument: &str, granularity: Granularity) -> Result<EmaSnapshot> {
        let candles = self
            .source
            .fetch_candles(instrument, granularity, self.config.candle_count)
            .await?;
        let series = PriceSeries::from_candles(instrument, granularity, &candles);
        series.ensure_usable(self.config.min_observations)?;

        debug!(instrument, %granularity, closes = series.len(), "Computing EMAs");
        self.engine
            .snapshot(&series.closes)
            .ok_or_else(|| Error::InsufficientData {
                instrument: instrument.to_string(),
                granularity,
                available: series.len(),
                required: self.config.min_observations,
            })
    }

    /// Scan one instrument across every pairing of its class.
    /// Any granularity that cannot be fetched or is too short fails the instrument.
    pub async fn scan_instrument(
        &self,
        class: &ClassConfig,
        instrument: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<TrendSignal>> {
        info!(instrument, class = %class.name, "Analyzing");

        let mut snapshots = HashMap::new();
        for granularity in class.granularities() {
            let snapshot = self.snapshot(instrument, granularity).await?;
            snapshots.insert(granularity, snapshot);
        }

        Ok(evaluate_instrument(
            instrument,
            class.kind,
            &class.pairings,
            &snapshots,
            class.precision(),
            timestamp,
        ))
    }

    /// Scan every instrument of a class, isolating failures per instrument.
    pub async fn scan_class(&self, class: &ClassConfig, timestamp: DateTime<Utc>) -> ClassOutcome {
        let mut signals = Vec::new();
        let mut failures = Vec::new();

        for instrument in &class.instruments {
            match self.scan_instrument(class, instrument, timestamp).await {
                Ok(found) => signals.extend(found),
                Err(e) => {
                    let insufficient_data = e.is_insufficient_data();
                    if insufficient_data {
                        warn!(instrument = %instrument, error = %e, "Not enough history, instrument skipped");
                    } else {
                        warn!(instrument = %instrument, error = %e, "Instrument failed");
                    }
                    failures.push(InstrumentFailure {
                        class: class.name.clone(),
                        instrument: instrument.clone(),
                        reason: e.to_string(),
                        insufficient_data,
                    });
                }
            }
        }

        info!(
            class = %class.name,
            scanned = class.instruments.len(),
            signals = signals.len(),
            failures = failures.len(),
            "Class scan complete"
        );

        ClassOutcome {
            name: class.name.clone(),
            kind: class.kind,
            precision: class.precision(),
            pairings: class.pairings.clone(),
            scanned: class.instruments.len(),
            signals,
            failures,
        }
    }

    /// Run the whole batch, or only the named classes when `only` is non-empty.
    /// One timestamp is stamped on every signal of the run.
    pub async fn run(&self, only: &[String]) -> Result<ScanReport> {
        if let Some(unknown) = only.iter().find(|n| self.config.class(n).is_none()) {
            return Err(Error::Config(format!("unknown class '{unknown}'")));
        }

        let timestamp = Utc::now();
        let mut classes = Vec::new();
        for class in &self.config.classes {
            if !only.is_empty() && !only.contains(&class.name) {
                continue;
            }
            classes.push(self.scan_class(class, timestamp).await);
        }

        Ok(ScanReport { timestamp, classes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::{Candle, Direction};

    /// Serves canned close series keyed by (instrument, granularity).
    struct MemorySource {
        series: HashMap<(String, Granularity), Vec<f64>>,
    }

    #[async_trait]
    impl CandleSource for MemorySource {
        async fn fetch_candles(
            &self,
            instrument: &str,
            granularity: Granularity,
            count: usize,
        ) -> Result<Vec<Candle>> {
            let closes = self
                .series
                .get(&(instrument.to_string(), granularity))
                .ok_or_else(|| Error::Api {
                    status: 404,
                    body: format!("no candles for {instrument}"),
                })?;
            let start = closes.len().saturating_sub(count);
            let mut candles: Vec<Candle> = closes[start..]
                .iter()
                .map(|&close| Candle {
                    time: Utc::now(),
                    close,
                    complete: true,
                })
                .collect();
            // The broker appends the still-forming candle.
            candles.push(Candle {
                time: Utc::now(),
                close: -1.0,
                complete: false,
            });
            Ok(candles)
        }
    }

    fn rising(n: usize, start: f64) -> Vec<f64> {
        (0..n).map(|i| start + i as f64 * 0.5).collect()
    }

    fn falling(n: usize, start: f64) -> Vec<f64> {
        (0..n).map(|i| start - i as f64 * 0.5).collect()
    }

    fn config(instruments: &[&str], pairings: Vec<TimeframePairing>) -> ScreenerFileConfig {
        ScreenerFileConfig {
            candle_count: 250,
            min_observations: 200,
            ema: Default::default(),
            classes: vec![ClassConfig {
                name: "forex".into(),
                kind: InstrumentClass::Forex,
                precision: None,
                instruments: instruments.iter().map(|s| s.to_string()).collect(),
                pairings,
            }],
        }
    }

    fn hourly_vs_daily() -> Vec<TimeframePairing> {
        vec![TimeframePairing::new("1hr vs 1d", Granularity::Daily, Granularity::H1)]
    }

    fn snap(fast: f64, medium: f64, slow: f64, price: f64) -> EmaSnapshot {
        EmaSnapshot {
            ema_fast: Some(fast),
            ema_medium: Some(medium),
            ema_slow: Some(slow),
            current_price: price,
        }
    }

    #[test]
    fn evaluate_instrument_unions_independent_pairings() {
        let mut snapshots = HashMap::new();
        snapshots.insert(Granularity::Daily, snap(105.0, 100.0, 90.0, 0.0));
        snapshots.insert(Granularity::H1, snap(106.0, 101.0, 95.0, 108.0));
        snapshots.insert(Granularity::Weekly, snap(90.0, 100.0, 110.0, 0.0));
        snapshots.insert(Granularity::H4, snap(95.0, 101.0, 106.0, 80.0));
        snapshots.insert(Granularity::M5, snap(107.0, 102.0, 96.0, 108.0));
        // M15 missing: 15min vs 4hr is skipped, not fatal.

        let signals = evaluate_instrument(
            "EUR_USD",
            InstrumentClass::Forex,
            &TimeframePairing::canonical(),
            &snapshots,
            5,
            Utc::now(),
        );

        let fired: Vec<(&str, Direction)> =
            signals.iter().map(|s| (s.pairing.as_str(), s.direction)).collect();
        // 4hr vs weekly uses the H4 price (80) which is below both fast EMAs.
        assert_eq!(
            fired,
            vec![
                ("1hr vs 1d", Direction::Long),
                ("4hr vs weekly", Direction::Short),
                ("5min vs 1hr", Direction::Long),
            ]
        );
    }

    #[test]
    fn evaluate_instrument_skips_undefined_emas() {
        let mut snapshots = HashMap::new();
        snapshots.insert(
            Granularity::Daily,
            EmaSnapshot {
                ema_slow: None,
                ..snap(105.0, 100.0, 90.0, 0.0)
            },
        );
        snapshots.insert(Granularity::H1, snap(106.0, 101.0, 95.0, 108.0));
        let signals = evaluate_instrument(
            "EUR_USD",
            InstrumentClass::Forex,
            &hourly_vs_daily(),
            &snapshots,
            5,
            Utc::now(),
        );
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn uptrend_on_both_timeframes_is_reported_long() {
        let mut series = HashMap::new();
        series.insert(("EUR_USD".to_string(), Granularity::Daily), rising(250, 100.0));
        series.insert(("EUR_USD".to_string(), Granularity::H1), rising(250, 150.0));
        let screener = Screener::new(
            Arc::new(MemorySource { series }),
            config(&["EUR_USD"], hourly_vs_daily()),
        );

        let report = screener.run(&[]).await.unwrap();
        let signals: Vec<_> = report.signals().collect();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Long);
        // Reference price is the hourly (lower) close, not the incomplete candle.
        assert_eq!(signals[0].price, 150.0 + 249.0 * 0.5);
        assert_eq!(signals[0].timestamp, report.timestamp);
        assert_eq!(report.instruments_scanned(), 1);
        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.classes[0].precision, 5);
    }

    #[tokio::test]
    async fn class_outcome_carries_precision_override() {
        let mut series = HashMap::new();
        series.insert(("EUR_USD".to_string(), Granularity::Daily), rising(250, 100.0));
        series.insert(("EUR_USD".to_string(), Granularity::H1), rising(250, 150.0));
        let mut cfg = config(&["EUR_USD"], hourly_vs_daily());
        cfg.classes[0].precision = Some(1);
        let screener = Screener::new(Arc::new(MemorySource { series }), cfg);

        let report = screener.run(&[]).await.unwrap();
        assert_eq!(report.classes[0].precision, 1);
        let signal = report.signals().next().unwrap();
        assert_eq!(signal.higher.fast, crate::round_to(signal.higher.fast, 1));
    }

    #[tokio::test]
    async fn downtrend_on_both_timeframes_is_reported_short() {
        let mut series = HashMap::new();
        series.insert(("GBP_USD".to_string(), Granularity::Daily), falling(250, 400.0));
        series.insert(("GBP_USD".to_string(), Granularity::H1), falling(250, 300.0));
        let screener = Screener::new(
            Arc::new(MemorySource { series }),
            config(&["GBP_USD"], hourly_vs_daily()),
        );

        let report = screener.run(&[]).await.unwrap();
        let signals: Vec<_> = report.signals().collect();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Short);
    }

    #[tokio::test]
    async fn failing_instrument_does_not_abort_batch() {
        let mut series = HashMap::new();
        series.insert(("EUR_USD".to_string(), Granularity::Daily), rising(250, 100.0));
        series.insert(("EUR_USD".to_string(), Granularity::H1), rising(250, 150.0));
        // Too little hourly history for USD_JPY; nothing at all for AUD_USD.
        series.insert(("USD_JPY".to_string(), Granularity::Daily), rising(250, 100.0));
        series.insert(("USD_JPY".to_string(), Granularity::H1), rising(150, 100.0));

        let screener = Screener::new(
            Arc::new(MemorySource { series }),
            config(&["USD_JPY", "AUD_USD", "EUR_USD"], hourly_vs_daily()),
        );
        let report = screener.run(&[]).await.unwrap();

        assert_eq!(report.instruments_scanned(), 3);
        assert_eq!(report.signals().count(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].instrument, "USD_JPY");
        assert!(failures[0].insufficient_data);
        assert_eq!(failures[1].instrument, "AUD_USD");
        assert!(!failures[1].insufficient_data);
    }

    #[tokio::test]
    async fn flat_market_fires_nothing() {
        let mut series = HashMap::new();
        series.insert(("XAU_USD".to_string(), Granularity::Daily), vec![1900.0; 250]);
        series.insert(("XAU_USD".to_string(), Granularity::H1), vec![1900.0; 250]);
        let screener = Screener::new(
            Arc::new(MemorySource { series }),
            config(&["XAU_USD"], hourly_vs_daily()),
        );
        let report = screener.run(&[]).await.unwrap();
        assert_eq!(report.signals().count(), 0);
        assert_eq!(report.failures().count(), 0);
    }

    #[tokio::test]
    async fn unknown_class_filter_is_rejected() {
        let screener = Screener::new(
            Arc::new(MemorySource {
                series: HashMap::new(),
            }),
            config(&["EUR_USD"], hourly_vs_daily()),
        );
        let err = screener.run(&["metals".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
