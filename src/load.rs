#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reading exported rows and generated hint files from disk.
//!
//! Row files are JSON: either one array of row objects, or one object per line
//! when the extension is `.jsonl` / `.ndjson`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::{
    ast::parse_value,
    hints::{GeneratedHintDocument, GoldRow},
    trace::{SnapshotRow, TraceRepository},
    util::{ancestor_name, file_stem, find_files},
};

/// Reads a row file into typed records.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;

    let line_delimited = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jsonl") | Some("ndjson")
    );

    if line_delimited {
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Bad row at {}:{}", path.display(), n + 1))
            })
            .collect()
    } else {
        serde_json::from_str(&source)
            .with_context(|| format!("{} is not a JSON array of rows", path.display()))
    }
}

/// Loads a trace export and groups it into traces.
pub fn load_traces(path: &Path) -> Result<TraceRepository> {
    let rows: Vec<SnapshotRow> = read_rows(path)?;
    let count = rows.len();
    let repo = TraceRepository::from_rows(rows)
        .with_context(|| format!("Invalid snapshot in {}", path.display()))?;
    tracing::info!("Loaded {count} snapshots in {} traces from {}", repo.len(), path.display());
    Ok(repo)
}

/// Loads the gold-standard export.
pub fn load_gold(path: &Path) -> Result<Vec<GoldRow>> {
    let rows: Vec<GoldRow> = read_rows(path)?;
    tracing::info!("Loaded {} gold hints from {}", rows.len(), path.display());
    Ok(rows)
}

/// Finds generated hints laid out as `<dir>/<algorithm>/<assignment>/<id>.json`.
///
/// A file that is not valid JSON stops the load; a valid document in an
/// unknown shape is left for normalization to skip.
pub fn discover_generated(dir: &Path) -> Result<Vec<GeneratedHintDocument>> {
    if !dir.is_dir() {
        tracing::warn!("No generated hint directory at {}", dir.display());
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for path in find_files("json", 2, dir)? {
        let (Some(algorithm), Some(assignment_id), Some(id)) =
            (ancestor_name(&path, 2), ancestor_name(&path, 1), file_stem(&path))
        else {
            tracing::warn!("Skipping {}: unexpected location", path.display());
            continue;
        };

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let document = parse_value(&source)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;

        documents.push(GeneratedHintDocument {
            algorithm,
            assignment_id,
            id,
            document,
            origin: Some(path.display().to_string()),
        });
    }

    tracing::info!("Found {} generated hints under {}", documents.len(), dir.display());
    Ok(documents)
}
