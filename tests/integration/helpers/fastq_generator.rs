//! Builders for small gzipped FASTQ fixtures.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Illumina TruSeq adapter.
pub const ILLUMINA: &str = "AGATCGGAAGAGC";
/// Nextera adapter.
pub const NEXTERA: &str = "CTGTCTCTTATA";

/// Insert sequence used for reads that carry no adapter.
const INSERT: &str = "ACGTTGCAACGTTGCAACGT";

/// Writes a gzip-compressed FASTQ with one record per sequence.
pub fn create_gzip_fastq(dir: &Path, name: &str, seqs: &[String]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    for (i, seq) in seqs.iter().enumerate() {
        writeln!(encoder, "@read{i}").unwrap();
        writeln!(encoder, "{seq}").unwrap();
        writeln!(encoder, "+").unwrap();
        writeln!(encoder, "{}", "I".repeat(seq.len())).unwrap();
    }
    encoder.finish().unwrap();
    path
}

/// `n` reads, each an insert followed by `adapter` (or just the insert when `None`).
pub fn reads(n: usize, adapter: Option<&str>) -> Vec<String> {
    (0..n).map(|_| format!("{INSERT}{}", adapter.unwrap_or(""))).collect()
}

/// Writes a header-less TSV with one line per row.
pub fn write_tsv(path: &Path, rows: &[Vec<String>]) {
    let text: String = rows.iter().map(|r| format!("{}\n", r.join("\t"))).collect();
    fs::write(path, text).unwrap();
}

/// Reads a manifest TSV into rows of paths.
pub fn read_manifest(path: &Path) -> Vec<Vec<PathBuf>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(PathBuf::from).collect())
        .collect()
}

/// The file name of `path` as a string.
pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
