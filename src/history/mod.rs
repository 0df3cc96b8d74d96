//! Durable, deduplicated, capped history of measurements.
//!
//! The on-disk CSV is both the restart checkpoint and the artifact the
//! dashboard reads, so it is only ever replaced atomically: readers see
//! the previous table or the new one, never a partial write.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::models::MeasurementRow;

/// Header of the persisted artifact; also the dashboard's read contract.
const HEADER: &str = "Date,Time,Bacteria,Fungi,Pollen,PM2.5,PM10";

/// In-memory canonical table.
///
/// Invariant: rows are sorted ascending by (date, time) and no two rows
/// share that key. `merge` and `load` both re-establish the invariant.
#[derive(Debug, Default, Clone)]
pub struct HistoryTable {
    rows: Vec<MeasurementRow>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load the persisted history. A missing, unreadable, or
    /// wrong-schema file yields an empty table: a damaged history must
    /// never prevent the service from starting.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(
                    "Could not read history {}; starting fresh: {err}",
                    path.display()
                );
                return Self::new();
            }
        };

        let mut lines = contents.lines();
        let Some(header) = lines.next() else {
            return Self::new();
        };
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let position = |name: &str| columns.iter().position(|column| *column == name);

        let (Some(date_idx), Some(time_idx)) = (position("Date"), position("Time")) else {
            warn!(
                "History {} is missing Date/Time columns; starting fresh",
                path.display()
            );
            return Self::new();
        };
        // Concentration columns may be absent from an older file; they
        // read as 0.0 rather than invalidating the whole table.
        let concentration_columns = [
            position("Bacteria"),
            position("Fungi"),
            position("Pollen"),
            position("PM2.5"),
            position("PM10"),
        ];

        let mut rows = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            match parse_row(&fields, date_idx, time_idx, &concentration_columns) {
                Some(row) => rows.push(row),
                None => warn!(
                    "Skipping malformed history row {} in {}",
                    line_no + 2,
                    path.display()
                ),
            }
        }

        let mut table = Self { rows };
        table.normalize();
        info!("Loaded {} rows from history.", table.len());
        table
    }

    /// Merge a batch into the table. On key conflict the incoming row
    /// wins: a newer computation for the same timestamp always overrides
    /// a stale one. Returns the number of incoming rows applied.
    pub fn merge(&mut self, incoming: Vec<MeasurementRow>) -> usize {
        let applied = incoming.len();
        self.rows.extend(incoming);
        self.normalize();
        applied
    }

    /// Drop the oldest rows until at most `max_rows` remain.
    pub fn cap(&mut self, max_rows: usize) {
        if self.rows.len() > max_rows {
            let excess = self.rows.len() - max_rows;
            self.rows.drain(..excess);
        }
    }

    /// Write-then-rename so a concurrent reader never observes a partial
    /// file and a crash mid-write leaves the previous table intact.
    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");

        let mut out = String::with_capacity((self.rows.len() + 1) * 48);
        out.push_str(HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format_row(row));
            out.push('\n');
        }

        fs::write(&tmp_path, out).with_context(|| {
            format!("failed to write temporary history {}", tmp_path.display())
        })?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to replace history {}", path.display()))
    }

    /// Re-establish the table invariant: later occurrences of a key win,
    /// then everything sorts ascending by (date, time).
    fn normalize(&mut self) {
        let mut deduped: BTreeMap<(String, String), MeasurementRow> = BTreeMap::new();
        for row in self.rows.drain(..) {
            deduped.insert((row.date.clone(), row.time.clone()), row);
        }
        self.rows = deduped.into_values().collect();
    }
}

fn parse_row(
    fields: &[&str],
    date_idx: usize,
    time_idx: usize,
    concentration_columns: &[Option<usize>; 5],
) -> Option<MeasurementRow> {
    let date = fields.get(date_idx)?;
    let time = fields.get(time_idx)?;
    if date.is_empty() || time.is_empty() {
        return None;
    }

    let mut values = [0.0f64; 5];
    for (value, column) in values.iter_mut().zip(concentration_columns) {
        if let Some(index) = column {
            *value = fields.get(*index)?.parse().ok()?;
        }
    }

    Some(MeasurementRow {
        date: date.to_string(),
        time: time.to_string(),
        bacteria: values[0],
        fungi: values[1],
        pollen: values[2],
        pm2_5: values[3],
        pm10: values[4],
    })
}

fn format_row(row: &MeasurementRow) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        row.date, row.time, row.bacteria, row.fungi, row.pollen, row.pm2_5, row.pm10
    )
}
