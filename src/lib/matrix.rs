//! Row/column string matrices read from the command line or from TSV files.
//!
//! Both the FASTQ inputs and the adapters are matrices where each row is a merge unit
//! (replicates merged downstream) and each column is a mate (R1, R2). A [`MatrixSource`]
//! captures where such a matrix comes from and is resolved once, at load time.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use fgoxide::io::Io;

use crate::errors::{Result, TrimError};

/// Extensions recognised as FASTQ, longest first so that stripping picks the full suffix.
pub const FASTQ_EXTENSIONS: [&str; 4] = [".fastq.gz", ".fq.gz", ".fastq", ".fq"];

/// A matrix of strings: rows of columns.
pub type Matrix = Vec<Vec<String>>;

/// Where a matrix of strings comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixSource {
    /// Rows given directly.
    Literal(Matrix),
    /// A tab-separated file with one row per line.
    FilePath(PathBuf),
}

impl MatrixSource {
    /// Builds a literal source where every token becomes its own single-column row.
    #[must_use]
    pub fn singleton_rows<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self::Literal(tokens.iter().map(|t| vec![t.as_ref().to_string()]).collect())
    }

    /// Interprets FASTQ arguments from the command line.
    ///
    /// A list whose first token is gzipped or carries a FASTQ extension is taken literally;
    /// otherwise the first token is the path to a TSV of FASTQs.
    #[must_use]
    pub fn for_fastqs<S: AsRef<str>>(tokens: &[S]) -> Self {
        match tokens.first() {
            Some(first) if !is_literal_fastq(first.as_ref()) => {
                Self::FilePath(PathBuf::from(first.as_ref()))
            }
            _ => Self::singleton_rows(tokens),
        }
    }

    /// Interprets adapter arguments from the command line.
    ///
    /// If the first token names an existing file it is read as a TSV of adapters; otherwise
    /// every token is an adapter sequence on its own row.
    #[must_use]
    pub fn for_adapters<S: AsRef<str>>(tokens: &[S]) -> Self {
        match tokens.first() {
            Some(first) if Path::new(first.as_ref()).is_file() => {
                Self::FilePath(PathBuf::from(first.as_ref()))
            }
            _ => Self::singleton_rows(tokens),
        }
    }

    /// Resolves the source into a concrete matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a TSV source cannot be read.
    pub fn resolve(self) -> Result<Matrix> {
        match self {
            Self::Literal(rows) => Ok(rows),
            Self::FilePath(path) => read_tsv(&path),
        }
    }
}

/// Returns true if `name` ends with one of the [`FASTQ_EXTENSIONS`].
#[must_use]
pub fn has_fastq_extension(name: &str) -> bool {
    FASTQ_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Returns true if a FASTQ argument names a FASTQ file rather than a TSV of FASTQs.
fn is_literal_fastq(name: &str) -> bool {
    name.ends_with(".gz") || has_fastq_extension(name)
}

/// Reads a header-less TSV into rows of trimmed cells.
///
/// Every line is a row, so an empty line in the middle of the file is a row holding one empty
/// cell. Empty lines at the end of the file are dropped.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_tsv(path: &PathBuf) -> Result<Matrix> {
    let reader = Io::default()
        .new_reader(path)
        .map_err(|e| TrimError::io("open TSV", path, std::io::Error::other(e)))?;

    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line.map_err(|e| TrimError::io("read TSV", path, e))?);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    Ok(lines
        .iter()
        .map(|line| line.split('\t').map(|cell| cell.trim().to_string()).collect())
        .collect())
}
