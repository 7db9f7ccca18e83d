//! The output manifest: one row per group, one column per mate.
//!
//! The manifest is a header-less TSV listing the trimmed (or linked) FASTQ paths in input
//! group order. Downstream workflow steps read it to find the outputs of each merge unit.

use std::io::Write;
use std::path::PathBuf;

use fgoxide::io::Io;

use crate::errors::{Result, TrimError};
use crate::matrix::read_tsv;

/// Ordered output paths for every group of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    rows: Vec<Vec<PathBuf>>,
}

impl Manifest {
    /// Wraps rows already in group order.
    #[must_use]
    pub fn new(rows: Vec<Vec<PathBuf>>) -> Self {
        Self { rows }
    }

    /// Rows in group order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<PathBuf>] {
        &self.rows
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the manifest as tab-separated rows.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::Io`] if the file cannot be created or written.
    pub fn write(&self, path: &PathBuf) -> Result<()> {
        let io_err = |e: std::io::Error| TrimError::io("write manifest", path, e);
        let mut writer =
            Io::default().new_writer(path).map_err(|e| io_err(std::io::Error::other(e)))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|p| p.display().to_string()).collect();
            writeln!(writer, "{}", cells.join("\t")).map_err(io_err)?;
        }
        writer.flush().map_err(io_err)
    }

    /// Reads a manifest written by [`Manifest::write`].
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::Io`] if the file cannot be read.
    pub fn read(path: &PathBuf) -> Result<Self> {
        let rows = read_tsv(path)?
            .into_iter()
            .map(|row| row.into_iter().map(PathBuf::from).collect())
            .collect();
        Ok(Self { rows })
    }
}
