//! CLI command implementations for fqtrim.
//!
//! # Commands
//!
//! - [`trim`] - Detect (optionally) and trim adapters for a batch of FASTQs
//! - [`detect`] - Report the most likely adapter in each FASTQ

#![allow(
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod detect;
pub mod trim;
