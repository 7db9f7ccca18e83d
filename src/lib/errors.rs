//! Custom error types for fqtrim operations.

use std::path::Path;

use thiserror::Error;

/// Result type alias for fqtrim operations
pub type Result<T> = std::result::Result<T, TrimError>;

/// Error type for fqtrim operations.
///
/// Every variant is fatal to the batch: the orchestrator never retries and never writes a
/// partial manifest.
#[derive(Error, Debug)]
pub enum TrimError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// The FASTQ and adapter matrices do not have the expected shape
    #[error("Input shape mismatch at merge_id={merge_id}: {reason}")]
    ShapeMismatch {
        /// 1-based index of the offending group
        merge_id: usize,
        /// Explanation of the mismatch
        reason: String,
    },

    /// No groups were supplied
    #[error("No input FASTQs were supplied")]
    EmptyBatch,

    /// Two slots would write the same file in the output directory
    #[error("Output path '{path}' is produced by both merge_id={first} and merge_id={second}")]
    OutputCollision {
        /// The colliding output path
        path: String,
        /// The first group producing the path
        first: usize,
        /// The second group producing the path
        second: usize,
    },

    /// Adapter detection could not read or parse a FASTQ
    #[error("Adapter detection failed for '{path}': {reason}")]
    DetectionFailed {
        /// The FASTQ being inspected
        path: String,
        /// Explanation of the failure
        reason: String,
    },

    /// The external trimming command failed
    #[error("Trimming with '{program}' failed for {files}: {reason}")]
    TrimFailed {
        /// The program that was invoked
        program: String,
        /// The input file(s) being trimmed
        files: String,
        /// Exit status and captured stderr
        reason: String,
    },

    /// A filesystem operation failed
    #[error("Failed to {operation} '{path}'")]
    Io {
        /// What was being attempted (e.g. "create directory")
        operation: String,
        /// The path involved
        path: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
}

impl TrimError {
    /// Builds an [`TrimError::Io`] for `path`.
    pub fn io(operation: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io { operation: operation.to_string(), path: path.display().to_string(), source }
    }

    /// Builds a [`TrimError::DetectionFailed`] for `path`.
    pub fn detection(path: &Path, reason: impl Into<String>) -> Self {
        Self::DetectionFailed { path: path.display().to_string(), reason: reason.into() }
    }

    /// Builds a [`TrimError::ShapeMismatch`] for the given 1-based group.
    pub fn shape(merge_id: usize, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch { merge_id, reason: reason.into() }
    }
}
