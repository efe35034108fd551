//! Market-data source adapters.

pub mod csv_file;
pub mod yahoo;

pub use csv_file::CsvDirectorySource;
pub use yahoo::YahooAdapter;

use crate::RawObservation;

/// Ascending by date with one row per day. Among rows sharing a date the one
/// appearing last in `rows` is kept.
pub(crate) fn normalize_daily(mut rows: Vec<RawObservation>) -> Vec<RawObservation> {
    rows.sort_by_key(|row| row.date);
    let mut normalized: Vec<RawObservation> = Vec::with_capacity(rows.len());
    for row in rows {
        match normalized.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => normalized.push(row),
        }
    }
    normalized
}
