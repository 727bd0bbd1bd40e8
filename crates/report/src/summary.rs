use common::{Direction, TimeframePairing};
use screener::ScanReport;

const RULE_WIDTH: usize = 60;

/// Instruments that fired one (pairing, direction) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub pairing: String,
    /// Bracketed timeframes, e.g. `[1hr,1d]`.
    pub tag: String,
    pub direction: Direction,
    /// Instrument and reference price.
    pub entries: Vec<(String, f64)>,
}

impl Category {
    pub fn label(&self) -> String {
        format!("{} Trending Markets {}", self.direction, self.tag)
    }
}

/// Every configured pairing crossed with Long/Short, in configuration order.
/// Categories with no instruments are included.
pub fn categories(report: &ScanReport) -> Vec<Category> {
    let mut pairings: Vec<&TimeframePairing> = Vec::new();
    for pairing in report.classes.iter().flat_map(|c| c.pairings.iter()) {
        if !pairings.iter().any(|p| p.name == pairing.name) {
            pairings.push(pairing);
        }
    }

    pairings
        .into_iter()
        .flat_map(|pairing| {
            [Direction::Long, Direction::Short].map(|direction| Category {
                pairing: pairing.name.clone(),
                tag: pairing.tag(),
                direction,
                entries: report
                    .signals()
                    .filter(|s| s.pairing == pairing.name && s.direction == direction)
                    .map(|s| (s.instrument.clone(), s.price))
                    .collect(),
            })
        })
        .collect()
}

/// Console rendering of a finished run.
pub struct Summary<'a> {
    report: &'a ScanReport,
}

impl<'a> Summary<'a> {
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Precision of the class that produced `instrument`'s signals.
    fn precision_of(&self, instrument: &str) -> usize {
        self.report
            .classes
            .iter()
            .find(|c| c.signals.iter().any(|s| s.instrument == instrument))
            .map_or(5, |c| c.precision as usize)
    }
}

impl std::fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "{:^width$}", "TREND ANALYSIS RESULTS", width = RULE_WIDTH)?;
        writeln!(f, "{rule}")?;

        if self.report.signals().next().is_none() {
            writeln!(f, "\nNo trending instruments found at this time.")?;
        } else {
            for category in categories(self.report) {
                writeln!(f, "\n{}: {}", category.label(), category.entries.len())?;
                for (instrument, price) in &category.entries {
                    let precision = self.precision_of(instrument);
                    writeln!(f, "  {instrument} - Price: {price:.precision$}")?;
                }
            }
        }

        writeln!(f, "\n{rule}")?;
        writeln!(f, "MARKET BREAKDOWN:")?;
        for class in &self.report.classes {
            let long = class.signals.iter().filter(|s| s.direction == Direction::Long).count();
            let short = class.signals.len() - long;
            writeln!(
                f,
                "  - {}: {} analyzed (Long: {long}, Short: {short}, Failed: {})",
                class.name,
                class.scanned,
                class.failures.len()
            )?;
        }
        writeln!(f, "  - Total trend signals: {}", self.report.signals().count())?;

        let failures: Vec<_> = self.report.failures().collect();
        if !failures.is_empty() {
            writeln!(f, "\nSKIPPED:")?;
            for failure in failures {
                writeln!(f, "  {} ({}): {}", failure.instrument, failure.class, failure.reason)?;
            }
        }
        write!(f, "{rule}")
    }
}
