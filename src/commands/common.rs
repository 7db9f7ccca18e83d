//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fqtrim_lib::adapter::DEFAULT_MAX_READS;
use fqtrim_lib::matrix::{Matrix, MatrixSource};
use fqtrim_lib::validation::{validate_file_exists, validate_files_exist, validate_positive};

/// FASTQ inputs given either as a list of files or as a TSV of groups.
#[derive(Debug, Clone, Args)]
pub struct FastqInputOptions {
    /// FASTQ files (one group each), or a TSV with one group per line and one FASTQ per column
    #[arg(value_name = "FASTQS", required = true, num_args = 1..)]
    pub fastqs: Vec<String>,
}

impl FastqInputOptions {
    /// Resolves the inputs into a FASTQ matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the TSV cannot be read or a listed FASTQ does not exist.
    pub fn matrix(&self) -> Result<Matrix> {
        let source = MatrixSource::for_fastqs(&self.fastqs);
        if let MatrixSource::FilePath(path) = &source {
            validate_file_exists(path, "FASTQ TSV")?;
        }
        let matrix = source.resolve().context("Failed to read FASTQ inputs")?;
        let files: Vec<PathBuf> = matrix.iter().flatten().map(PathBuf::from).collect();
        validate_files_exist(&files, "Input FASTQ")?;
        Ok(matrix)
    }

    /// Every input FASTQ in group order, flattened.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs cannot be resolved.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        Ok(self.matrix()?.into_iter().flatten().map(PathBuf::from).collect())
    }
}

/// Size of the worker pool.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Maximum number of files processed at once
    #[arg(short = 't', long = "threads", default_value = "1")]
    pub threads: usize,
}

impl Default for ThreadingOptions {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

impl ThreadingOptions {
    /// Validates the thread count.
    ///
    /// # Errors
    ///
    /// Returns an error if `threads` is zero.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.threads, "threads")?;
        Ok(())
    }
}

/// Options controlling adapter detection.
#[derive(Debug, Clone, Args)]
pub struct DetectionOptions {
    /// Number of reads sampled from the start of each FASTQ when detecting adapters
    #[arg(long = "max-reads", default_value_t = DEFAULT_MAX_READS)]
    pub max_reads: usize,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self { max_reads: DEFAULT_MAX_READS }
    }
}

impl DetectionOptions {
    /// Validates the detection options.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_reads` is zero.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.max_reads, "max-reads")?;
        Ok(())
    }
}
