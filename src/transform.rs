//! Long-to-wide reshaping of analysis output batches.
//!
//! The analysis process emits one row per (timestamp, classification)
//! observation. The history table wants one row per timestamp with one
//! column per component, so each batch is pivoted here before merging.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::IterationError;
use crate::models::{BatchObservation, MeasurementRow};

/// Column names the analysis process must emit (case-sensitive).
const REQUIRED_COLUMNS: [&str; 4] = ["date", "time", "classification", "conc"];

/// Parse the raw batch CSV into long-format observations.
///
/// Columns are located by header name, so extra columns and reordering
/// are tolerated. A header missing any required column, or a `conc` cell
/// that is not a number, rejects the whole batch. An empty file parses
/// to an empty batch rather than an error.
pub fn parse_batch_csv(
    path: &Path,
    content: &str,
) -> Result<Vec<BatchObservation>, IterationError> {
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
        match columns.iter().position(|column| column == name) {
            Some(index) => indices[slot] = index,
            None => missing.push(*name),
        }
    }
    if !missing.is_empty() {
        return Err(IterationError::MalformedBatch {
            path: path.to_path_buf(),
            detail: format!("missing required columns {missing:?}; found {columns:?}"),
        });
    }
    let [date_idx, time_idx, class_idx, conc_idx] = indices;

    let mut observations = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |index: usize| fields.get(index).copied().unwrap_or("");

        let conc_raw = field(conc_idx);
        let conc: f64 = conc_raw.parse().map_err(|_| IterationError::MalformedBatch {
            path: path.to_path_buf(),
            // +2: one for the header, one for 1-based line numbers
            detail: format!("line {}: unparseable conc value '{conc_raw}'", line_no + 2),
        })?;

        observations.push(BatchObservation {
            date: field(date_idx).to_string(),
            time: field(time_idx).to_string(),
            classification: field(class_idx).to_string(),
            conc,
        });
    }
    Ok(observations)
}

/// Pivot long observations into one row per (date, time).
///
/// Known classifications become concentration fields; unknown labels are
/// dropped silently. Components with no observation for a timestamp stay
/// at 0.0, as do the particulate fields the analysis never produces.
/// Zero groups in means zero rows out — "no new data", not an error.
pub fn pivot_wide(observations: Vec<BatchObservation>) -> Vec<MeasurementRow> {
    let mut groups: BTreeMap<(String, String), MeasurementRow> = BTreeMap::new();

    for obs in observations {
        let key = (obs.date.clone(), obs.time.clone());
        let row = groups.entry(key).or_insert_with(|| MeasurementRow {
            date: obs.date.clone(),
            time: obs.time.clone(),
            bacteria: 0.0,
            fungi: 0.0,
            pollen: 0.0,
            pm2_5: 0.0,
            pm10: 0.0,
        });

        match obs.classification.as_str() {
            "Bacteria" => row.bacteria = obs.conc,
            "Fungi" => row.fungi = obs.conc,
            "Pollen" => row.pollen = obs.conc,
            _ => {}
        }
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Vec<BatchObservation>, IterationError> {
        parse_batch_csv(Path::new("batch.csv"), content)
    }

    #[test]
    fn pivots_one_timestamp_into_one_wide_row() {
        let observations = parse(
            "date,time,classification,conc\n\
             2024-01-01,00:00,Bacteria,10\n\
             2024-01-01,00:00,Fungi,3\n",
        )
        .unwrap();

        let rows = pivot_wide(observations);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.date, "2024-01-01");
        assert_eq!(row.time, "00:00");
        assert_eq!(row.bacteria, 10.0);
        assert_eq!(row.fungi, 3.0);
        assert_eq!(row.pollen, 0.0);
        assert_eq!(row.pm2_5, 0.0);
        assert_eq!(row.pm10, 0.0);
    }

    #[test]
    fn groups_are_sorted_by_date_then_time() {
        let observations = parse(
            "date,time,classification,conc\n\
             2024-01-02,00:00,Pollen,1\n\
             2024-01-01,23:59,Bacteria,2\n\
             2024-01-01,00:30,Fungi,3\n",
        )
        .unwrap();

        let rows = pivot_wide(observations);
        let keys: Vec<(&str, &str)> = rows.iter().map(MeasurementRow::key).collect();
        assert_eq!(
            keys,
            [
                ("2024-01-01", "00:30"),
                ("2024-01-01", "23:59"),
                ("2024-01-02", "00:00"),
            ]
        );
    }

    #[test]
    fn unknown_classifications_are_dropped() {
        let observations = parse(
            "date,time,classification,conc\n\
             2024-01-01,00:00,Bacteria,5\n\
             2024-01-01,00:00,Mystery,99\n",
        )
        .unwrap();

        let rows = pivot_wide(observations);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bacteria, 5.0);
        // The mystery concentration must not leak into any field
        assert_eq!(rows[0].fungi, 0.0);
        assert_eq!(rows[0].pollen, 0.0);
    }

    #[test]
    fn reordered_and_extra_columns_are_tolerated() {
        let observations = parse(
            "site,conc,time,date,classification\n\
             lab1,7.5,08:00,2024-03-05,Pollen\n",
        )
        .unwrap();

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].date, "2024-03-05");
        assert_eq!(observations[0].time, "08:00");
        assert_eq!(observations[0].classification, "Pollen");
        assert_eq!(observations[0].conc, 7.5);
    }

    #[test]
    fn missing_required_column_rejects_the_batch() {
        let err = parse("date,time,classification\n2024-01-01,00:00,Bacteria\n").unwrap_err();
        match err {
            IterationError::MalformedBatch { detail, .. } => {
                assert!(detail.contains("conc"), "detail was: {detail}");
            }
            other => panic!("expected MalformedBatch, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_concentration_rejects_the_batch() {
        let err = parse("date,time,classification,conc\n2024-01-01,00:00,Bacteria,lots\n")
            .unwrap_err();
        assert!(matches!(err, IterationError::MalformedBatch { .. }));
    }

    #[test]
    fn empty_content_is_an_empty_batch() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("date,time,classification,conc\n").unwrap().is_empty());
        assert!(pivot_wide(Vec::new()).is_empty());
    }
}
