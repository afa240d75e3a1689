//! Scoped edge-list temp file handed to the external engine. Modeled
//! as a scoped resource: acquired on driver start, released on drop;
//! it owns its own deletion policy.

use std::io::Write;
use std::path::{Path, PathBuf};

use bisbm_types::{BisbmError, Edge, Result};
use tempfile::NamedTempFile;

/// Owns the on-disk, 1-indexed edge-list file the engine reads.
/// Parallel workers inherit the path (`Clone`-able `PathBuf` via
/// `path()`), not the handle; the file itself is deleted when this
/// value drops.
pub struct EdgeListTempFile {
    file: NamedTempFile,
}

impl EdgeListTempFile {
    /// Writes `edges` (0-indexed, normalized) to a fresh temp file
    /// using 1-indexed node numbers: node indices are 0-based inside
    /// the driver but 1-based in the file handed to the KL-style
    /// engine, so every endpoint gets a `+1` offset on write.
    pub fn write(edges: &[Edge]) -> Result<Self> {
        let mut file = NamedTempFile::new()
            .map_err(|e| BisbmError::Resource(format!("could not create temp edge file: {e}")))?;
        for &(u, v) in edges {
            writeln!(file, "{}\t{}", u + 1, v + 1)
                .map_err(|e| BisbmError::Resource(format!("could not write temp edge file: {e}")))?;
        }
        file.flush()
            .map_err(|e| BisbmError::Resource(format!("could not flush temp edge file: {e}")))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// A scoped bundle of the engine's scratch input, released when the
/// driver instance that owns it is dropped. Type counts are passed to
/// the engine directly via the `-y` CLI flag (`process.rs`), so no
/// on-disk types file is needed alongside the edge list.
pub struct EngineScratch {
    pub edges: EdgeListTempFile,
}

impl EngineScratch {
    pub fn new(edges: &[Edge]) -> Result<Self> {
        Ok(Self {
            edges: EdgeListTempFile::write(edges)?,
        })
    }

    pub fn edges_path(&self) -> PathBuf {
        self.edges.path().to_path_buf()
    }
}
