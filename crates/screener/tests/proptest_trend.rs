use chrono::Utc;
use proptest::prelude::*;

use common::{Direction, EmaTriple, Granularity, InstrumentClass, TimeframePairing};
use screener::{classify, ema, evaluate_pairing, is_long, is_short, round_to, EmaEngine, EmaSnapshot};

fn triple() -> impl Strategy<Value = EmaTriple> {
    (0.01f64..10_000.0, 0.01f64..10_000.0, 0.01f64..10_000.0)
        .prop_map(|(fast, medium, slow)| EmaTriple { fast, medium, slow })
}

proptest! {
    /// Series shorter than the period never yield a value and never panic.
    #[test]
    fn ema_is_undefined_below_period(
        prices in prop::collection::vec(0.0001f64..1_000_000.0, 0..50),
        extra in 1usize..50,
    ) {
        let period = prices.len() + extra;
        prop_assert!(ema(&prices, period).is_none());
    }

    /// A constant series has an EMA equal to that constant.
    #[test]
    fn ema_of_constant_series_is_the_constant(
        value in 0.0001f64..1_000_000.0,
        period in 1usize..200,
        extra in 0usize..100,
    ) {
        let prices = vec![value; period + extra];
        let result = ema(&prices, period).unwrap();
        prop_assert!((result - value).abs() <= value * 1e-12, "{} vs {}", result, value);
    }

    /// The EMA always stays within the range of its inputs.
    #[test]
    fn ema_is_bounded_by_inputs(
        prices in prop::collection::vec(0.0001f64..1_000_000.0, 1..300),
        period in 1usize..300,
    ) {
        prop_assume!(prices.len() >= period);
        let value = ema(&prices, period).unwrap();
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(value >= min - 1e-6 && value <= max + 1e-6);
    }

    /// Long and Short can never both hold for the same timeframe and price.
    #[test]
    fn long_and_short_are_disjoint(emas in triple(), price in 0.01f64..10_000.0) {
        prop_assert!(!(is_long(price, &emas) && is_short(price, &emas)));
    }

    /// A pairing fires only when both timeframes agree.
    #[test]
    fn classify_requires_agreement(
        higher in triple(),
        lower in triple(),
        price in 0.01f64..10_000.0,
    ) {
        match classify(&higher, &lower, price) {
            Some(Direction::Long) => {
                prop_assert!(is_long(price, &higher) && is_long(price, &lower));
            }
            Some(Direction::Short) => {
                prop_assert!(is_short(price, &higher) && is_short(price, &lower));
            }
            None => {
                prop_assert!(!(is_long(price, &higher) && is_long(price, &lower)));
                prop_assert!(!(is_short(price, &higher) && is_short(price, &lower)));
            }
        }
    }

    /// Rounding moves a value by at most half a unit in the last place kept.
    #[test]
    fn rounding_error_is_bounded(value in -100_000.0f64..100_000.0, decimals in 0u32..6) {
        let rounded = round_to(value, decimals);
        let half_unit = 0.5 / 10f64.powi(decimals as i32);
        prop_assert!((rounded - value).abs() <= half_unit + 1e-9);
    }

    /// Re-running the classifier on the same snapshots gives the same answer.
    #[test]
    fn evaluation_is_idempotent(
        higher_closes in prop::collection::vec(1.0f64..2.0, 200..260),
        lower_closes in prop::collection::vec(1.0f64..2.0, 200..260),
    ) {
        let engine = EmaEngine::default();
        let higher: EmaSnapshot = engine.snapshot(&higher_closes).unwrap();
        let lower: EmaSnapshot = engine.snapshot(&lower_closes).unwrap();
        let pairing = TimeframePairing::new("1hr vs 1d", Granularity::Daily, Granularity::H1);
        let ts = Utc::now();

        let first = evaluate_pairing("EUR_USD", InstrumentClass::Forex, &pairing, &higher, &lower, 5, ts).unwrap();
        let second = evaluate_pairing("EUR_USD", InstrumentClass::Forex, &pairing, &higher, &lower, 5, ts).unwrap();
        prop_assert_eq!(first, second);
    }
}
