//! Long-format record emitted by the analysis process.

use serde::{Deserialize, Serialize};

/// A single (timestamp, classification) observation from one batch.
///
/// Mirrors the analysis output 1:1; `classification` is an open string
/// set and only the known labels survive pivoting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchObservation {
    pub date: String,
    pub time: String,
    pub classification: String,
    pub conc: f64,
}
