//! Adapter values and adapter detection.
//!
//! A slot's adapter is either given on the command line, found by a detector, or absent.
//! [`AdapterSpec`] keeps those cases apart so that logging can tell "never attempted" from
//! "attempted but inconclusive", while trimming only asks for [`AdapterSpec::sequence`].
//!
//! Detection itself sits behind the [`AdapterDetector`] trait. The bundled
//! [`KnownAdapterDetector`] samples the head of a FASTQ and counts reads containing each of
//! the common library adapters.

use std::fmt;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use fgoxide::io::Io;
use log::debug;
use seq_io::fastq::{Reader as FastqReader, Record};
use serde::Serialize;

use crate::errors::{Result, TrimError};

/// Default number of reads sampled per FASTQ (the first million lines).
pub const DEFAULT_MAX_READS: usize = 250_000;

/// Adapter sequences the detector knows how to recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownAdapter {
    /// Illumina TruSeq universal adapter
    Illumina,
    /// Nextera transposase adapter
    Nextera,
    /// Illumina small RNA 3' adapter
    SmallRna,
}

impl KnownAdapter {
    /// All known adapters, in tie-breaking order.
    pub const ALL: [KnownAdapter; 3] =
        [KnownAdapter::Illumina, KnownAdapter::Nextera, KnownAdapter::SmallRna];

    /// The adapter sequence passed to the trimmer.
    #[must_use]
    pub fn sequence(self) -> &'static str {
        match self {
            KnownAdapter::Illumina => "AGATCGGAAGAGC",
            KnownAdapter::Nextera => "CTGTCTCTTATA",
            KnownAdapter::SmallRna => "TGGAATTCTCGG",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            KnownAdapter::Illumina => "Illumina",
            KnownAdapter::Nextera => "Nextera",
            KnownAdapter::SmallRna => "smallRNA",
        }
    }
}

impl fmt::Display for KnownAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.sequence())
    }
}

/// The adapter assigned to one slot of a group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdapterSpec {
    /// No adapter given and no detection attempted.
    #[default]
    Unset,
    /// Adapter given by the user.
    Explicit(String),
    /// Adapter found by the detector.
    Detected(KnownAdapter),
    /// Detection ran but found nothing.
    NotFound,
}

impl AdapterSpec {
    /// Parses a user-supplied cell; an empty (or blank) cell means [`AdapterSpec::Unset`].
    #[must_use]
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() { AdapterSpec::Unset } else { AdapterSpec::Explicit(cell.to_string()) }
    }

    /// Converts a detector outcome.
    #[must_use]
    pub fn from_detection(detected: Option<KnownAdapter>) -> Self {
        detected.map_or(AdapterSpec::NotFound, AdapterSpec::Detected)
    }

    /// The sequence to trim with, if any.
    #[must_use]
    pub fn sequence(&self) -> Option<&str> {
        match self {
            AdapterSpec::Explicit(seq) => Some(seq.as_str()),
            AdapterSpec::Detected(adapter) => Some(adapter.sequence()),
            AdapterSpec::Unset | AdapterSpec::NotFound => None,
        }
    }

    /// True when nothing has been assigned yet and detection may fill the slot.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, AdapterSpec::Unset)
    }
}

impl fmt::Display for AdapterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterSpec::Unset => write!(f, "<none>"),
            AdapterSpec::Explicit(seq) => write!(f, "{seq}"),
            AdapterSpec::Detected(adapter) => write!(f, "{adapter}"),
            AdapterSpec::NotFound => write!(f, "<not found>"),
        }
    }
}

/// Finds the most likely adapter in a FASTQ.
///
/// Implementations must be safe to call concurrently from several worker threads.
pub trait AdapterDetector: Send + Sync {
    /// Returns the adapter detected in `fastq`, or `None` if no adapter was found.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::DetectionFailed`] if the file cannot be read or holds no reads.
    fn detect(&self, fastq: &Path) -> Result<Option<KnownAdapter>>;
}

/// Per-file adapter counts from the head of a FASTQ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdapterCounts {
    /// The FASTQ inspected
    pub fastq: String,
    /// Number of reads examined
    pub reads_examined: u64,
    /// Reads containing the Illumina adapter
    pub illumina: u64,
    /// Reads containing the Nextera adapter
    pub nextera: u64,
    /// Reads containing the small RNA adapter
    pub small_rna: u64,
}

impl AdapterCounts {
    /// Count for a single adapter.
    #[must_use]
    pub fn count(&self, adapter: KnownAdapter) -> u64 {
        match adapter {
            KnownAdapter::Illumina => self.illumina,
            KnownAdapter::Nextera => self.nextera,
            KnownAdapter::SmallRna => self.small_rna,
        }
    }

    fn increment(&mut self, adapter: KnownAdapter) {
        match adapter {
            KnownAdapter::Illumina => self.illumina += 1,
            KnownAdapter::Nextera => self.nextera += 1,
            KnownAdapter::SmallRna => self.small_rna += 1,
        }
    }

    /// The adapter seen in the most reads; earlier entries of [`KnownAdapter::ALL`] win ties.
    #[must_use]
    pub fn most_likely(&self) -> Option<KnownAdapter> {
        let mut best: Option<(KnownAdapter, u64)> = None;
        for adapter in KnownAdapter::ALL {
            let count = self.count(adapter);
            if count > 0 && best.is_none_or(|(_, n)| count > n) {
                best = Some((adapter, count));
            }
        }
        best.map(|(adapter, _)| adapter)
    }
}

/// Detects adapters by counting exact occurrences of the known adapters in sampled reads.
#[derive(Debug, Clone)]
pub struct KnownAdapterDetector {
    max_reads: usize,
}

impl Default for KnownAdapterDetector {
    fn default() -> Self {
        Self { max_reads: DEFAULT_MAX_READS }
    }
}

impl KnownAdapterDetector {
    /// Creates a detector sampling at most `max_reads` reads per file.
    #[must_use]
    pub fn new(max_reads: usize) -> Self {
        Self { max_reads: max_reads.max(1) }
    }

    /// Counts reads containing each known adapter in the head of `fastq`.
    ///
    /// Gzipped input is decompressed transparently based on the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::DetectionFailed`] if the file cannot be opened, is not valid
    /// FASTQ, or contains no reads.
    pub fn count_adapters(&self, fastq: &Path) -> Result<AdapterCounts> {
        let path = PathBuf::from(fastq);
        let input = Io::default()
            .new_reader(&path)
            .map_err(|e| TrimError::detection(fastq, format!("cannot open: {e}")))?;
        let mut reader = FastqReader::new(input);

        let mut counts =
            AdapterCounts { fastq: fastq.display().to_string(), ..AdapterCounts::default() };

        while counts.reads_examined < self.max_reads as u64 {
            let Some(record) = reader.next() else { break };
            let record = record.map_err(|e| TrimError::detection(fastq, e.to_string()))?;
            let seq = record.seq();
            for adapter in KnownAdapter::ALL {
                if seq.contains_str(adapter.sequence()) {
                    counts.increment(adapter);
                }
            }
            counts.reads_examined += 1;
        }

        if counts.reads_examined == 0 {
            return Err(TrimError::detection(fastq, "no reads found"));
        }

        debug!(
            "{}: {} reads, Illumina={} Nextera={} smallRNA={}",
            counts.fastq, counts.reads_examined, counts.illumina, counts.nextera, counts.small_rna
        );
        Ok(counts)
    }
}

impl AdapterDetector for KnownAdapterDetector {
    fn detect(&self, fastq: &Path) -> Result<Option<KnownAdapter>> {
        Ok(self.count_adapters(fastq)?.most_likely())
    }
}
