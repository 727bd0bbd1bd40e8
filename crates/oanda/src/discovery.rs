use std::collections::BTreeMap;

use common::InstrumentClass;

use crate::client::InstrumentInfo;

const COMMODITY_KEYWORDS: &[&str] = &[
    "XAU", "XAG", "XPD", "XPT", "BCO", "WTICO", "NATGAS", "CORN", "SOYBN", "WHEAT", "SUGAR",
];

const BOND_KEYWORDS: &[&str] = &["DE10YB", "UK10YB", "USB10Y", "USB02Y", "USB05Y", "USB30Y"];

const INDEX_KEYWORDS: &[&str] = &[
    "SPX500", "NAS100", "US30", "UK100", "DE30", "GER30", "DE40", "GER40", "JPN225", "AUS200",
    "FRA40", "HK33",
];

/// Guess the class of an OANDA instrument from its name.
/// Anything not matching a commodity, bond or index keyword is treated as forex.
pub fn classify_instrument(name: &str) -> InstrumentClass {
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    if has_any(COMMODITY_KEYWORDS) {
        InstrumentClass::Commodity
    } else if has_any(BOND_KEYWORDS) {
        InstrumentClass::Bond
    } else if has_any(INDEX_KEYWORDS) {
        InstrumentClass::Index
    } else {
        InstrumentClass::Forex
    }
}

/// Instruments grouped by class, in the order they were listed.
#[derive(Debug, Default)]
pub struct InstrumentCatalog {
    pub forex: Vec<InstrumentInfo>,
    pub commodities: Vec<InstrumentInfo>,
    pub indices: Vec<InstrumentInfo>,
    pub bonds: Vec<InstrumentInfo>,
}

impl InstrumentCatalog {
    pub fn from_listing(instruments: &[InstrumentInfo]) -> Self {
        let mut catalog = Self::default();
        for info in instruments {
            let bucket = match classify_instrument(&info.name) {
                InstrumentClass::Forex => &mut catalog.forex,
                InstrumentClass::Commodity => &mut catalog.commodities,
                InstrumentClass::Index => &mut catalog.indices,
                InstrumentClass::Bond => &mut catalog.bonds,
            };
            bucket.push(info.clone());
        }
        catalog
    }

    pub fn total(&self) -> usize {
        self.forex.len() + self.commodities.len() + self.indices.len() + self.bonds.len()
    }

    /// Counts keyed by class, for the discovery summary.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("bonds", self.bonds.len()),
            ("commodities", self.commodities.len()),
            ("forex", self.forex.len()),
            ("indices", self.indices.len()),
        ])
    }
}

impl std::fmt::Display for InstrumentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sections = [
            ("COMMODITIES", &self.commodities),
            ("INDICES", &self.indices),
            ("BONDS", &self.bonds),
            ("FOREX", &self.forex),
        ];
        for (title, items) in sections {
            writeln!(f, "=== {title} ===")?;
            for info in items {
                writeln!(f, "{} - {} ({})", info.name, info.display_name, info.instrument_type)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "=== SUMMARY ===")?;
        for (class, count) in self.counts() {
            writeln!(f, "{class}: {count}")?;
        }
        write!(f, "Total: {}", self.total())
    }
}
