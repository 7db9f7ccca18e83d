//! Input validation utilities
//!
//! Checks for command-line parameters and input files, returning [`TrimError::InvalidParameter`]
//! with a consistent message so every command reports bad input the same way.

use std::fmt::Display;
use std::path::Path;

use crate::errors::{Result, TrimError};

/// Validate that a file exists
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use fqtrim_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/sample_R1.fastq.gz", "Input FASTQ");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.is_file() {
        return Err(TrimError::InvalidParameter {
            parameter: description.to_string(),
            reason: format!("File does not exist: {}", path_ref.display()),
        });
    }
    Ok(())
}

/// Validate that every file in `paths` exists
///
/// # Errors
/// Returns an error for the first file that doesn't exist
pub fn validate_files_exist<P: AsRef<Path>>(paths: &[P], description: &str) -> Result<()> {
    for path in paths {
        validate_file_exists(path, description)?;
    }
    Ok(())
}

/// Validate that an error rate is in the range [0.0, 1.0)
///
/// A rate of 1.0 or more would let every base mismatch, so it is rejected.
///
/// # Errors
/// Returns an error if the rate is outside [0.0, 1.0) or not a number
///
/// # Example
/// ```
/// use fqtrim_lib::validation::validate_error_rate;
///
/// validate_error_rate(0.1, "err-rate").unwrap();
/// assert!(validate_error_rate(1.0, "err-rate").is_err());
/// ```
pub fn validate_error_rate(rate: f64, name: &str) -> Result<()> {
    if !(0.0..1.0).contains(&rate) {
        return Err(TrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be in [0, 1), got: {rate}"),
        });
    }
    Ok(())
}

/// Validate that an adapter is a single non-empty word
///
/// The adapter is otherwise handed to the trimmer untouched, so cutadapt syntax such as
/// anchors, IUPAC codes and linked adapters is accepted.
///
/// # Errors
/// Returns an error if the adapter is empty or contains whitespace
///
/// # Example
/// ```
/// use fqtrim_lib::validation::validate_adapter_sequence;
///
/// validate_adapter_sequence("AGATCGGAAGAGC$", "adapters").unwrap();
/// assert!(validate_adapter_sequence("AGAT CGG", "adapters").is_err());
/// ```
pub fn validate_adapter_sequence(adapter: &str, name: &str) -> Result<()> {
    if adapter.is_empty() {
        return Err(TrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: "Adapter sequence is empty".to_string(),
        });
    }
    if adapter.chars().any(char::is_whitespace) {
        return Err(TrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Adapter '{adapter}' contains whitespace"),
        });
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Errors
/// Returns an error if the value is not positive
///
/// # Example
/// ```
/// use fqtrim_lib::validation::validate_positive;
///
/// validate_positive(4, "threads").unwrap();
/// assert!(validate_positive(0, "threads").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(TrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}
