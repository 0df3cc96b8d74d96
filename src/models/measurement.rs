//! Canonical wide-format measurement row.
//!
//! Represents one fully-pivoted timestamp of the history table: every
//! component concentration the analysis knows about, in one row.

use serde::{Deserialize, Serialize};

/// One row of the history table.
///
/// `date` is `YYYY-MM-DD` and `time` is minute-level `HH:MM`, so the
/// lexicographic order of `(date, time)` equals chronological order and
/// the string pair doubles as the table's sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub date: String,
    pub time: String,
    pub bacteria: f64,
    pub fungi: f64,
    pub pollen: f64,
    /// Particulate channels are not wired to a sensor yet; always 0.0.
    pub pm2_5: f64,
    pub pm10: f64,
}

impl MeasurementRow {
    /// Unique key of the row within the history table.
    pub fn key(&self) -> (&str, &str) {
        (self.date.as_str(), self.time.as_str())
    }
}
