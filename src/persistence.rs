//! Persistence: versioned per-crystal snapshots and a results table (spec §6).
//!
//! Grounded on the teacher's use of `serde_json` for cluster serialization
//! (see `Cargo.toml`'s retained `serde`/`serde_json` dependencies) generalized
//! to a directory-of-snapshots layout, plus a `csv`-backed results table
//! (spec's ambient persistence tooling carries the teacher's stack even though
//! GUI/CLI surfaces are a Non-goal).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::crystal::{CrystalBody, State};
use crate::error::{Result, XtalError};

/// On-disk format version; bump whenever [`CrystalSnapshot`]'s shape changes
/// so old runs can be detected and rejected cleanly rather than silently
/// misparsed.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrystalSnapshot {
    pub version: u32,
    pub tag: String,
    pub status: State,
    pub body: CrystalBody,
}

impl CrystalSnapshot {
    pub fn new(tag: String, status: State, body: CrystalBody) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tag,
            status,
            body,
        }
    }
}

/// Write a single crystal's snapshot to `<dir>/<tag>.json`.
pub fn save_snapshot(dir: &Path, snapshot: &CrystalSnapshot) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| XtalError::ConfigError(format!("failed to create snapshot directory {dir:?}: {e}")))?;
    let path = dir.join(format!("{}.json", snapshot.tag));
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| XtalError::ConfigError(format!("failed to serialize snapshot: {e}")))?;
    fs::write(&path, json).map_err(|e| XtalError::ConfigError(format!("failed to write {path:?}: {e}")))
}

/// Load a single crystal's snapshot, rejecting a mismatched format version.
pub fn load_snapshot(path: &Path) -> Result<CrystalSnapshot> {
    let text = fs::read_to_string(path)
        .map_err(|e| XtalError::ConfigError(format!("failed to read {path:?}: {e}")))?;
    let snapshot: CrystalSnapshot = serde_json::from_str(&text)
        .map_err(|e| XtalError::ConfigError(format!("failed to parse snapshot {path:?}: {e}")))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(XtalError::ConfigError(format!(
            "snapshot {path:?} has version {} but this build expects {SNAPSHOT_VERSION}",
            snapshot.version
        )));
    }
    Ok(snapshot)
}

/// One row of the results table (spec §6): a compact, append-only CSV summary
/// of every finished structure, independent of the full JSON snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsRow {
    pub tag: String,
    pub generation: u32,
    pub enthalpy: Option<f64>,
    pub energy: Option<f64>,
    pub hardness: f64,
    pub objectives: String,
}

pub fn append_results_row(csv_path: &Path, row: &ResultsRow) -> Result<()> {
    let file_exists = csv_path.exists();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)
        .map_err(|e| XtalError::ConfigError(format!("failed to open results file {csv_path:?}: {e}")))?;
    let mut writer = csv::WriterBuilder::new().has_headers(!file_exists).from_writer(file);
    writer
        .serialize(row)
        .map_err(|e| XtalError::ConfigError(format!("failed to append results row: {e}")))?;
    writer
        .flush()
        .map_err(|e| XtalError::ConfigError(format!("failed to flush results file: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Cell;
    use nalgebra::Matrix3;
    use tempfile_like::TempDir;

    fn cubic(a: f64) -> Cell {
        Cell::new(Matrix3::new(a, 0.0, 0.0, 0.0, a, 0.0, 0.0, 0.0, a))
    }

    /// Minimal temp-directory helper; avoids adding a `tempfile` dependency
    /// for a single test module.
    mod tempfile_like {
        use std::path::PathBuf;

        pub struct TempDir(pub PathBuf);
        impl TempDir {
            pub fn new(label: &str) -> Self {
                let dir = std::env::temp_dir().join(format!("xtalopt-core-test-{label}-{}", std::process::id()));
                let _ = std::fs::remove_dir_all(&dir);
                Self(dir)
            }
            pub fn path(&self) -> &std::path::Path {
                &self.0
            }
        }
        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    #[test]
    fn snapshot_roundtrips() {
        let tmp = TempDir::new("snapshot");
        let body = CrystalBody::new(cubic(4.0));
        let snapshot = CrystalSnapshot::new("1x0".to_string(), State::Optimized, body);
        save_snapshot(tmp.path(), &snapshot).unwrap();
        let loaded = load_snapshot(&tmp.path().join("1x0.json")).unwrap();
        assert_eq!(loaded.tag, "1x0");
        assert_eq!(loaded.status, State::Optimized);
    }

    #[test]
    fn mismatched_version_is_rejected() {
        let tmp = TempDir::new("version");
        std::fs::create_dir_all(tmp.path()).unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, r#"{"version":999,"tag":"x","status":"Optimized","body":{}}"#).unwrap();
        let result = load_snapshot(&path);
        assert!(result.is_err());
    }

    #[test]
    fn results_row_appends_with_single_header() {
        let tmp = TempDir::new("results");
        std::fs::create_dir_all(tmp.path()).unwrap();
        let csv_path = tmp.path().join("results.csv");
        for i in 0..3 {
            let row = ResultsRow {
                tag: format!("1x{i}"),
                generation: 1,
                enthalpy: Some(-10.0 - i as f64),
                energy: Some(-9.0),
                hardness: 12.0,
                objectives: "[]".to_string(),
            };
            append_results_row(&csv_path, &row).unwrap();
        }
        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(contents.lines().count(), 4); // header + 3 rows
    }
}
