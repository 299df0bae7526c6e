//! Centralized test helpers for perf-graphs
//!
//! Sample payloads and fixture files shared by unit tests and integration tests.

use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

use crate::api::{CommitRef, GraphData, Series};

/// A small payload with two commits and three series.
///
/// - `regex/opt/incr-full`: fully measured
/// - `syn/check/full`: second point interpolated
/// - `syn/debug/full`: fully measured
pub fn sample_graph_data() -> GraphData {
    let mut data = GraphData::new(vec![
        CommitRef::new(1_700_000_000, "0123456789abcdef"),
        CommitRef::new(1_700_086_400, "fedcba9876543210"),
    ]);
    data.insert(
        "syn",
        "check",
        "full",
        Series::new(vec![100.0, 101.5], [1]).expect("index in range"),
    );
    data.insert(
        "syn",
        "debug",
        "full",
        Series::measured_only(vec![250.0, 240.0]),
    );
    data.insert(
        "regex",
        "opt",
        "incr-full",
        Series::measured_only(vec![7.0, 8.0]),
    );
    data
}

/// Writes `data` as JSON into a fresh temporary directory.
///
/// # Returns
/// The directory guard (keep it alive while the file is used) and the file path.
///
/// # Panics
/// Panics if the directory or file cannot be created.
pub fn write_graph_data_fixture(data: &GraphData) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("Failed to create temporary directory");
    let path = dir.path().join("graphs.json");
    fs::write(&path, data.to_json().expect("Failed to serialize graph data"))
        .expect("Failed to write graph data fixture");
    (dir, path)
}
