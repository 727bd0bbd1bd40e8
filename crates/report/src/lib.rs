pub mod csv_export;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use csv_export::{export_report, signal_headers, write_signals, write_summary};
pub use summary::{categories, Category, Summary};
