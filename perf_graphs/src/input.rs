use std::{
    fs::{self, File},
    io::{self, ErrorKind, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};

use crate::api::GraphData;

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

/// Read a graph payload from a JSON file, or from stdin for "-".
pub fn load_graph_data(path: &Path) -> Result<GraphData> {
    let json = if is_stdio(path) {
        let mut json = String::new();
        io::stdin()
            .read_to_string(&mut json)
            .context("Failed to read graph data from stdin")?;
        json
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph data from {}", path.display()))?
    };

    let data = GraphData::from_json(&json)
        .with_context(|| format!("Failed to parse graph data from {}", path.display()))?;
    log::info!(
        "Loaded {} series over {} commits from {}",
        data.series_count(),
        data.commits.len(),
        path.display()
    );
    Ok(data)
}

/// Write to a file, or to stdout for "-". A closed stdout pipe is not an error.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if is_stdio(path) {
        match io::stdout().write_all(bytes) {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            res => res,
        }?;
    } else {
        File::create(path)
            .and_then(|mut f| f.write_all(bytes))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
