//! Edge-list and types-file parsing: tab-delimited by default with
//! comma/whitespace fallbacks.

use std::fs;
use std::path::Path;

use bisbm_types::{BisbmError, Edge, Result};

fn split_fields(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').map(str::trim).filter(|s| !s.is_empty()).collect()
    } else if line.contains(',') {
        line.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Reads a 0-indexed edge list from `path`. Blank lines are skipped.
pub fn read_edges(path: &Path) -> Result<Vec<Edge>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| BisbmError::Resource(format!("could not read edge list {path:?}: {e}")))?;
    let mut edges = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields = split_fields(line);
        if fields.len() != 2 {
            return Err(BisbmError::InvalidInput(format!(
                "edge list line {} has {} fields, expected 2: {line:?}",
                lineno + 1,
                fields.len()
            )));
        }
        let u: u32 = fields[0].parse().map_err(|_| {
            BisbmError::InvalidInput(format!("edge list line {}: bad node index {:?}", lineno + 1, fields[0]))
        })?;
        let v: u32 = fields[1].parse().map_err(|_| {
            BisbmError::InvalidInput(format!("edge list line {}: bad node index {:?}", lineno + 1, fields[1]))
        })?;
        edges.push((u, v));
    }
    Ok(edges)
}

/// Reads the types file: one `{1,2}` label per line.
pub fn read_types(path: &Path) -> Result<Vec<u8>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| BisbmError::Resource(format!("could not read types file {path:?}: {e}")))?;
    let mut types = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let t: u8 = line.parse().map_err(|_| {
            BisbmError::InvalidInput(format!("types file line {}: bad type label {line:?}", lineno + 1))
        })?;
        types.push(t);
    }
    Ok(types)
}
