use chrono::{TimeZone, Utc};

use common::{Direction, EmaTriple, InstrumentClass, TimeframePairing, TrendSignal};
use screener::{ClassOutcome, InstrumentFailure, ScanReport};

fn signal(
    instrument: &str,
    class: InstrumentClass,
    price: f64,
    pairing: &str,
    direction: Direction,
    higher: (f64, f64, f64),
    lower: (f64, f64, f64),
) -> TrendSignal {
    TrendSignal {
        instrument: instrument.into(),
        class,
        price,
        pairing: pairing.into(),
        direction,
        higher: EmaTriple {
            fast: higher.0,
            medium: higher.1,
            slow: higher.2,
        },
        lower: EmaTriple {
            fast: lower.0,
            medium: lower.1,
            slow: lower.2,
        },
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    }
}

/// Two classes, three signals and one skipped instrument. Indices carry a
/// precision override of 3.
pub fn sample_report() -> ScanReport {
    let forex = ClassOutcome {
        name: "forex".into(),
        kind: InstrumentClass::Forex,
        precision: 5,
        pairings: TimeframePairing::canonical(),
        scanned: 3,
        signals: vec![
            signal(
                "EUR_USD",
                InstrumentClass::Forex,
                1.0715,
                "1hr vs 1d",
                Direction::Long,
                (1.0701, 1.065, 1.06),
                (1.0712, 1.0705, 1.07),
            ),
            signal(
                "GBP_USD",
                InstrumentClass::Forex,
                1.2401,
                "4hr vs weekly",
                Direction::Short,
                (1.25, 1.26, 1.27),
                (1.2450, 1.2480, 1.2510),
            ),
        ],
        failures: vec![InstrumentFailure {
            class: "forex".into(),
            instrument: "USD_JPY".into(),
            reason: "Insufficient data for USD_JPY W: 120 complete candles, need 200".into(),
            insufficient_data: true,
        }],
    };

    let indices = ClassOutcome {
        name: "indices".into(),
        kind: InstrumentClass::Index,
        precision: 3,
        pairings: TimeframePairing::canonical(),
        scanned: 2,
        signals: vec![signal(
            "SPX500_USD",
            InstrumentClass::Index,
            5100.25,
            "1hr vs 1d",
            Direction::Long,
            (5050.1, 4980.55, 4700.0),
            (5090.3, 5070.12, 5010.0),
        )],
        failures: vec![],
    };

    ScanReport {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        classes: vec![forex, indices],
    }
}
