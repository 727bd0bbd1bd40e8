use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use common::{Result, TrendSignal};
use screener::{EmaPeriods, ScanReport};

use crate::summary::categories;

/// Format of the `Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Format of the timestamp embedded in export file names.
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Column order: instrument, price, pairing, direction, higher EMAs, lower EMAs, date.
pub fn signal_headers(periods: &EmaPeriods) -> Vec<String> {
    let mut headers = vec![
        "Instrument".to_string(),
        "Price".to_string(),
        "Timeframe_Combination".to_string(),
        "Trend_Type".to_string(),
    ];
    for side in ["Higher", "Lower"] {
        for period in [periods.fast, periods.medium, periods.slow] {
            headers.push(format!("{side}_TF_EMA_{period}"));
        }
    }
    headers.push("Date".to_string());
    headers
}

fn signal_record(signal: &TrendSignal) -> Vec<String> {
    vec![
        signal.instrument.clone(),
        signal.price.to_string(),
        signal.pairing.clone(),
        signal.direction.to_string(),
        signal.higher.fast.to_string(),
        signal.higher.medium.to_string(),
        signal.higher.slow.to_string(),
        signal.lower.fast.to_string(),
        signal.lower.medium.to_string(),
        signal.lower.slow.to_string(),
        signal.timestamp.format(DATE_FORMAT).to_string(),
    ]
}

/// Write signals as CSV. The header row is always written.
pub fn write_signals<'a, W: Write>(
    writer: W,
    signals: impl IntoIterator<Item = &'a TrendSignal>,
    periods: &EmaPeriods,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(signal_headers(periods))?;
    for signal in signals {
        csv.write_record(signal_record(signal))?;
    }
    csv.flush()?;
    Ok(())
}

/// One row per (pairing, direction): category, count, instruments.
pub fn write_summary<W: Write>(writer: W, report: &ScanReport) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Category", "Count", "Instruments"])?;
    for category in categories(report) {
        let instruments = if category.entries.is_empty() {
            "None".to_string()
        } else {
            category
                .entries
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        csv.write_record([
            format!("{} {}", category.direction, category.pairing),
            category.entries.len().to_string(),
            instruments,
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write one CSV per class, a combined CSV when several classes ran, and a
/// summary CSV into `dir`. Returns the paths written.
pub fn export_report(report: &ScanReport, periods: &EmaPeriods, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let stamp = report.timestamp.format(FILE_STAMP_FORMAT).to_string();
    let mut written = Vec::new();

    for class in &report.classes {
        let path = dir.join(format!("{}_trend_analysis_{stamp}.csv", class.name));
        write_signals(File::create(&path)?, &class.signals, periods)?;
        info!(class = %class.name, rows = class.signals.len(), path = %path.display(), "Results saved");
        written.push(path);
    }

    if report.classes.len() > 1 {
        let path = dir.join(format!("all_trend_analysis_{stamp}.csv"));
        write_signals(File::create(&path)?, report.signals(), periods)?;
        info!(rows = report.signals().count(), path = %path.display(), "Combined results saved");
        written.push(path);
    }

    let path = dir.join(format!("summary_{stamp}.csv"));
    write_summary(File::create(&path)?, report)?;
    info!(path = %path.display(), "Summary saved");
    written.push(path);

    Ok(written)
}
