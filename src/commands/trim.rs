//! Trim adapters from a batch of FASTQ files with cutadapt.
//!
//! Inputs are grouped into merge units (one FASTQ for single-end, an R1/R2 pair for
//! paired-end). Missing adapters can be detected from the reads before trimming; groups that
//! end up without an adapter are hard linked into the output directory untouched.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use fqtrim_lib::adapter::KnownAdapterDetector;
use fqtrim_lib::batch::{Batch, EndMode, TrimParams};
use fqtrim_lib::logging::OperationTimer;
use fqtrim_lib::matrix::{Matrix, MatrixSource};
use fqtrim_lib::orchestrator::{LogObserver, Orchestrator, detected_adapters};
use fqtrim_lib::trim::Cutadapt;
use fqtrim_lib::validation::{validate_adapter_sequence, validate_error_rate, validate_positive};

use crate::commands::command::Command;
use crate::commands::common::{DetectionOptions, FastqInputOptions, ThreadingOptions};

/// Trims adapters from FASTQ files, detecting them first if requested.
#[derive(Debug, Parser)]
#[command(
    name = "trim",
    about = "\x1b[38;5;30m[TRIMMING]\x1b[0m       \x1b[36mTrim adapters from FASTQs with cutadapt\x1b[0m",
    long_about = r#"
Trims adapter sequences from a batch of FASTQ files using cutadapt.

FASTQs are given either as a list of files, one merge group per file, or as the path to a
TSV with one group per line. The arguments are a list of files when the first one ends in .gz
or a FASTQ extension (.fastq, .fq); otherwise the first argument is read as the TSV. Blank
lines inside an adapter TSV are groups without adapters. Single-end groups hold one FASTQ;
paired-end groups (--paired-end) hold R1 and R2 in that order, so paired-end input must be
given as a TSV.

Adapters are given the same way: a list of sequences (one per group) or a TSV with the same
shape as the FASTQ input. Empty cells mean "no adapter". With --auto-detect-adapter, every
FASTQ without an adapter is scanned for the Illumina, Nextera and small RNA adapters before
trimming starts; explicit adapters are always used as given.

A group is trimmed only when every FASTQ in it has an adapter. Otherwise its FASTQs are hard
linked into the output directory unchanged. Trimmed outputs are named <name>.trim.fastq.gz.

Once every group has finished, a TSV manifest of the output FASTQs (one line per group, in
input order) is written to <out-dir>/<out-tsv>. If any file fails, no manifest is written.

Example usage:
  fqtrim trim a.fastq.gz b.fastq.gz --adapters AGATCGGAAGAGC AGATCGGAAGAGC --out-dir trimmed
  fqtrim trim fastqs.tsv --paired-end --auto-detect-adapter --threads 8 --out-dir trimmed
"#
)]
pub struct TrimAdapters {
    /// FASTQ inputs
    #[command(flatten)]
    pub inputs: FastqInputOptions,

    /// Adapter sequences (one per group), or a TSV shaped like the FASTQ input
    #[arg(short = 'a', long = "adapters", num_args = 1..)]
    pub adapters: Vec<String>,

    /// Detect adapters for FASTQs that have none
    #[arg(long = "auto-detect-adapter", default_value = "false")]
    pub auto_detect_adapter: bool,

    /// Discard reads shorter than this after trimming (0 keeps all reads)
    #[arg(short = 'm', long = "min-trim-len", default_value = "5")]
    pub min_trim_len: usize,

    /// Maximum error rate allowed when matching adapters
    #[arg(short = 'e', long = "err-rate", default_value = "0.1")]
    pub err_rate: f64,

    /// Inputs are paired-end: each group holds R1 and R2
    #[arg(long = "paired-end", default_value = "false")]
    pub paired_end: bool,

    /// Worker pool options
    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Adapter detection options
    #[command(flatten)]
    pub detection: DetectionOptions,

    /// Directory for trimmed and linked FASTQs, and the manifest
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,

    /// File name of the manifest, written inside the output directory
    #[arg(long = "out-tsv", default_value = "out.tsv")]
    pub out_tsv: String,

    /// Path to the cutadapt executable
    #[arg(long = "cutadapt", default_value = "cutadapt")]
    pub cutadapt: PathBuf,

    /// Number of cores given to each cutadapt process
    #[arg(long = "cutadapt-cores", default_value = "1")]
    pub cutadapt_cores: usize,
}

impl TrimAdapters {
    /// The adapter matrix, or `None` when no adapters were given.
    fn adapter_matrix(&self) -> Result<Option<Matrix>> {
        if self.adapters.is_empty() {
            return Ok(None);
        }
        let matrix = MatrixSource::for_adapters(&self.adapters)
            .resolve()
            .context("Failed to read adapters")?;
        for adapter in matrix.iter().flatten().filter(|a| !a.is_empty()) {
            validate_adapter_sequence(adapter, "adapters")?;
        }
        Ok(Some(matrix))
    }

    fn validate(&self) -> Result<()> {
        self.threading.validate()?;
        self.detection.validate()?;
        validate_error_rate(self.err_rate, "err-rate")?;
        validate_positive(self.cutadapt_cores, "cutadapt-cores")?;
        if self.out_tsv.is_empty() {
            bail!("--out-tsv must not be empty");
        }
        Ok(())
    }

    /// Builds the batch described by the command-line arguments.
    fn build_batch(&self) -> Result<Batch> {
        let fastqs = self.inputs.matrix()?;
        let adapters = self.adapter_matrix()?;
        let params = TrimParams {
            min_trim_len: self.min_trim_len,
            err_rate: self.err_rate,
            out_dir: self.out_dir.clone(),
        };
        let mode = EndMode::from_paired(self.paired_end);
        let batch = Batch::from_matrices(mode, fastqs, adapters, params)?
            .with_auto_detect(self.auto_detect_adapter)
            .with_threads(self.threading.threads);
        Ok(batch)
    }

    fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(&self.out_tsv)
    }
}

impl Command for TrimAdapters {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.validate()?;
        let mut batch = self.build_batch()?;

        let timer = OperationTimer::new("Trimming adapters", "groups");
        info!("Mode: {}", batch.mode());
        info!("Groups: {}", batch.groups().len());
        info!("Auto-detect adapters: {}", self.auto_detect_adapter);
        info!("Minimum length: {}, error rate: {}", self.min_trim_len, self.err_rate);
        info!("Workers: {} (requested {})", batch.concurrency(), self.threading.threads);
        info!("Cutadapt: {} ({} core(s) each)", self.cutadapt.display(), self.cutadapt_cores);
        info!("Output directory: {}", self.out_dir.display());

        let detector = KnownAdapterDetector::new(self.detection.max_reads);
        let trimmer = Cutadapt::new(&self.cutadapt).with_cores(self.cutadapt_cores);
        let manifest = Orchestrator::new(&detector, &trimmer, &LogObserver).run(&mut batch)?;

        if self.auto_detect_adapter {
            let found: Vec<&str> = detected_adapters(&batch).iter().map(|a| a.name()).collect();
            if found.is_empty() {
                info!("No known adapters were detected");
            } else {
                info!("Detected adapters: {}", found.join(", "));
            }
        }

        let manifest_path = self.manifest_path();
        manifest.write(&manifest_path)?;
        info!("Wrote manifest of {} group(s) to {}", manifest.len(), manifest_path.display());
        timer.log_completion(manifest.len() as u64);
        Ok(())
    }
}
