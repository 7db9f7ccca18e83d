//! Detect which known adapter, if any, each FASTQ carries.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fgoxide::io::DelimFile;
use log::info;

use fqtrim_lib::adapter::{AdapterCounts, KnownAdapterDetector};
use fqtrim_lib::logging::{OperationTimer, format_count, format_percent};
use fqtrim_lib::pool::WorkerPool;

use crate::commands::command::Command;
use crate::commands::common::{DetectionOptions, FastqInputOptions, ThreadingOptions};

/// Reports the most likely adapter for each FASTQ.
#[derive(Debug, Parser)]
#[command(
    name = "detect",
    about = "\x1b[38;5;30m[TRIMMING]\x1b[0m       \x1b[36mDetect known adapters in FASTQs\x1b[0m",
    long_about = r#"
Detects which of the common library adapters each FASTQ contains.

The first --max-reads reads of every FASTQ are scanned for exact matches to the Illumina
(AGATCGGAAGAGC), Nextera (CTGTCTCTTATA) and small RNA (TGGAATTCTCGG) adapters. The adapter
found in the most reads is reported; ties go to the adapter listed first. Files in which no
adapter is found are reported with an empty adapter column.

Results are printed to stdout as "<fastq>\t<adapter sequence>", one line per FASTQ in input
order. With --metrics, the per-adapter read counts are also written to a TSV with a header.

Example usage:
  fqtrim detect a.fastq.gz b.fastq.gz
  fqtrim detect fastqs.tsv --threads 4 --metrics adapter_counts.tsv
"#
)]
pub struct DetectAdapters {
    /// FASTQ inputs
    #[command(flatten)]
    pub inputs: FastqInputOptions,

    /// Adapter detection options
    #[command(flatten)]
    pub detection: DetectionOptions,

    /// Worker pool options
    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Optional output TSV of per-file adapter counts
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,
}

impl DetectAdapters {
    /// Counts adapters in every input, in input order.
    fn count_all(&self, files: Vec<PathBuf>) -> Result<Vec<AdapterCounts>> {
        let detector = KnownAdapterDetector::new(self.detection.max_reads);
        let pool = WorkerPool::new(self.threading.threads.min(files.len()))?;
        let counts = pool.run_all(files, |_, fastq| detector.count_adapters(&fastq))?;
        Ok(counts)
    }
}

/// Writes one `<fastq>\t<adapter>` line per file.
fn write_calls<W: Write>(out: &mut W, counts: &[AdapterCounts]) -> std::io::Result<()> {
    for c in counts {
        let adapter = c.most_likely().map(|a| a.sequence()).unwrap_or_default();
        writeln!(out, "{}\t{adapter}", c.fastq)?;
    }
    out.flush()
}

#[allow(clippy::cast_precision_loss)]
fn log_call(counts: &AdapterCounts) {
    match counts.most_likely() {
        Some(adapter) => info!(
            "{}: {} in {} of {} reads ({})",
            counts.fastq,
            adapter,
            format_count(counts.count(adapter)),
            format_count(counts.reads_examined),
            format_percent(counts.count(adapter) as f64 / counts.reads_examined as f64, 2)
        ),
        None => info!(
            "{}: no known adapter in {} reads",
            counts.fastq,
            format_count(counts.reads_examined)
        ),
    }
}

impl Command for DetectAdapters {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.threading.validate()?;
        self.detection.validate()?;
        let files = self.inputs.files()?;

        let timer = OperationTimer::new("Detecting adapters", "files");
        info!("Files: {}", files.len());
        info!("Reads sampled per file: {}", format_count(self.detection.max_reads as u64));

        let counts = self.count_all(files)?;
        counts.iter().for_each(log_call);

        let mut out = BufWriter::new(std::io::stdout().lock());
        write_calls(&mut out, &counts).context("Failed to write adapter calls")?;

        if let Some(path) = &self.metrics {
            DelimFile::default()
                .write_tsv(path, &counts)
                .with_context(|| format!("Failed to write adapter metrics: {}", path.display()))?;
            info!("Wrote adapter metrics to {}", path.display());
        }

        timer.log_completion(counts.len() as u64);
        Ok(())
    }
}
