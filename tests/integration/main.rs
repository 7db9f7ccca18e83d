//! Integration tests for fqtrim.
//!
//! These tests run the library engine and the `fqtrim` binary end to end on small gzipped
//! FASTQ fixtures, using a stand-in script in place of cutadapt.

mod test_batch_pipeline;
mod test_trim_command;
