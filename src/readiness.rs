//! Input readiness gate.
//!
//! The instrument drops two kinds of capture files into the input
//! directory; the analysis script needs at least one of each before it
//! can produce anything meaningful.

use std::fs;
use std::path::Path;

/// Filename marker for air-quality capture files.
const AQ_MARKER: &str = "AQ_";
/// Filename marker for fluorescence trace files.
const FT_MARKER: &str = "FT_";

/// True when the input directory holds at least one file of each
/// required category. Absence is a steady state, not an error, so an
/// unreadable directory simply reads as "not ready yet".
pub fn inputs_ready(input_dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(input_dir) else {
        return false;
    };

    let mut has_aq = false;
    let mut has_ft = false;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        has_aq |= name.contains(AQ_MARKER);
        has_ft |= name.contains(FT_MARKER);
        if has_aq && has_ft {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn missing_directory_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!inputs_ready(&dir.path().join("does-not-exist")));
    }

    #[test]
    fn empty_directory_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!inputs_ready(dir.path()));
    }

    #[test]
    fn one_category_alone_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("AQ_20240101.txt")).unwrap();
        assert!(!inputs_ready(dir.path()));
    }

    #[test]
    fn both_categories_are_ready() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("AQ_20240101.txt")).unwrap();
        File::create(dir.path().join("FT_20240101.txt")).unwrap();
        assert!(inputs_ready(dir.path()));
    }

    #[test]
    fn marker_matches_anywhere_in_name() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("site3_AQ_export.dat")).unwrap();
        File::create(dir.path().join("site3_FT_export.dat")).unwrap();
        assert!(inputs_ready(dir.path()));
    }
}
