//! Integration tests for the trim command.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use crate::helpers::{
    ILLUMINA, NEXTERA, create_gzip_fastq, fake_cutadapt, failing_cutadapt, file_name,
    read_manifest, reads, recorded_calls, write_tsv,
};

fn run_trim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fqtrim"))
        .arg("trim")
        .args(args)
        .output()
        .expect("Failed to run trim command")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Trim command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn s(path: &Path) -> String {
    path.display().to_string()
}

/// Single-end, two groups, no adapters: both FASTQs are linked through unchanged.
#[test]
fn test_single_end_without_adapters_links_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fastq.gz", &reads(10, None));
    let b = create_gzip_fastq(temp_dir.path(), "b.fastq.gz", &reads(10, None));
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[&s(&a), &s(&b), "--out-dir", &s(&out_dir)]);
    assert_success(&output);

    let rows = read_manifest(&out_dir.join("out.tsv"));
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.len() == 1));
    assert_eq!(file_name(&rows[0][0]), "a.fastq.gz");
    assert_eq!(file_name(&rows[1][0]), "b.fastq.gz");

    for (row, input) in rows.iter().zip([&a, &b]) {
        assert_eq!(row[0].parent().unwrap(), out_dir);
        assert_eq!(fs::read(&row[0]).unwrap(), fs::read(input).unwrap());
        assert_eq!(fs::metadata(&row[0]).unwrap().ino(), fs::metadata(input).unwrap().ino());
    }
}

/// Paired-end, one group, explicit adapters on both mates: cutadapt trims the pair.
#[test]
fn test_paired_end_explicit_adapters() {
    let temp_dir = TempDir::new().unwrap();
    let r1 = create_gzip_fastq(temp_dir.path(), "s_R1.fastq.gz", &reads(10, Some(ILLUMINA)));
    let r2 = create_gzip_fastq(temp_dir.path(), "s_R2.fastq.gz", &reads(10, Some(ILLUMINA)));
    let fastqs = temp_dir.path().join("fastqs.tsv");
    write_tsv(&fastqs, &[vec![s(&r1), s(&r2)]]);
    let adapters = temp_dir.path().join("adapters.tsv");
    write_tsv(&adapters, &[vec![ILLUMINA.to_string(), ILLUMINA.to_string()]]);
    let cutadapt = fake_cutadapt(&temp_dir.path().join("bin"));
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[
        &s(&fastqs),
        "--adapters",
        &s(&adapters),
        "--paired-end",
        "--out-dir",
        &s(&out_dir),
        "--cutadapt",
        &s(&cutadapt),
    ]);
    assert_success(&output);

    let rows = read_manifest(&out_dir.join("out.tsv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 2);
    assert!(rows[0].iter().all(|p| p.to_string_lossy().ends_with(".trim.fastq.gz")));
    assert_eq!(file_name(&rows[0][0]), "s_R1.trim.fastq.gz");
    assert_eq!(file_name(&rows[0][1]), "s_R2.trim.fastq.gz");
    assert!(rows[0].iter().all(|p| p.exists()));

    let calls = recorded_calls(&cutadapt);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(&format!("-a {ILLUMINA} -A {ILLUMINA}")));
    assert!(calls[0].contains("-m 5"));
    assert!(calls[0].contains("-e 0.1"));
}

/// Auto-detection fills in missing adapters; files without a known adapter pass through.
#[test]
fn test_auto_detect_trims_only_files_with_adapters() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fastq.gz", &reads(50, Some(NEXTERA)));
    let b = create_gzip_fastq(temp_dir.path(), "b.fastq.gz", &reads(50, None));
    let c = create_gzip_fastq(temp_dir.path(), "c.fastq.gz", &reads(50, Some(ILLUMINA)));
    let cutadapt = fake_cutadapt(&temp_dir.path().join("bin"));
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[
        &s(&a),
        &s(&b),
        &s(&c),
        "--auto-detect-adapter",
        "--threads",
        "8",
        "--out-dir",
        &s(&out_dir),
        "--cutadapt",
        &s(&cutadapt),
    ]);
    assert_success(&output);

    let names: Vec<String> =
        read_manifest(&out_dir.join("out.tsv")).iter().map(|r| file_name(&r[0])).collect();
    assert_eq!(names, vec!["a.trim.fastq.gz", "b.fastq.gz", "c.trim.fastq.gz"]);

    let calls = recorded_calls(&cutadapt);
    assert_eq!(calls.len(), 2);
    let trimmed_with = |adapter: &str, input: &str| {
        calls.iter().any(|c| c.contains(&format!("-a {adapter}")) && c.contains(input))
    };
    assert!(trimmed_with(NEXTERA, "/a.fastq.gz"));
    assert!(trimmed_with(ILLUMINA, "/c.fastq.gz"));
}

/// An explicit adapter is never replaced by detection.
#[test]
fn test_explicit_adapter_wins_over_detection() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fastq.gz", &reads(20, Some(ILLUMINA)));
    let cutadapt = fake_cutadapt(&temp_dir.path().join("bin"));
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[
        &s(&a),
        "--adapters",
        NEXTERA,
        "--auto-detect-adapter",
        "--out-dir",
        &s(&out_dir),
        "--cutadapt",
        &s(&cutadapt),
    ]);
    assert_success(&output);

    let calls = recorded_calls(&cutadapt);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(&format!("-a {NEXTERA}")));
    assert!(!calls[0].contains(ILLUMINA));
}

/// A failing trimmer fails the batch and leaves no manifest behind.
#[test]
fn test_trimmer_failure_writes_no_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fastq.gz", &reads(5, None));
    let cutadapt = failing_cutadapt(&temp_dir.path().join("bin"));
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[
        &s(&a),
        "--adapters",
        ILLUMINA,
        "--out-dir",
        &s(&out_dir),
        "--cutadapt",
        &s(&cutadapt),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("a.fastq.gz"), "stderr: {stderr}");
    assert!(stderr.contains("simulated failure"), "stderr: {stderr}");
    assert!(!out_dir.join("out.tsv").exists());
}

/// Paired-end input where the second group has a single FASTQ is rejected up front.
#[test]
fn test_paired_end_shape_mismatch_names_group() {
    let temp_dir = TempDir::new().unwrap();
    let r1 = create_gzip_fastq(temp_dir.path(), "x_R1.fastq.gz", &reads(5, None));
    let r2 = create_gzip_fastq(temp_dir.path(), "x_R2.fastq.gz", &reads(5, None));
    let lone = create_gzip_fastq(temp_dir.path(), "y_R1.fastq.gz", &reads(5, None));
    let fastqs = temp_dir.path().join("fastqs.tsv");
    write_tsv(&fastqs, &[vec![s(&r1), s(&r2)], vec![s(&lone)]]);
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[&s(&fastqs), "--paired-end", "--out-dir", &s(&out_dir)]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("merge_id=2"), "stderr: {stderr}");
    assert!(!out_dir.exists());
}

/// A missing input FASTQ is reported before any work starts.
#[test]
fn test_missing_fastq_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.fastq.gz");
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[&s(&missing), "--out-dir", &s(&out_dir)]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.fastq.gz"));
    assert!(!out_dir.exists());
}

/// The manifest name is configurable and nested output directories are created.
#[test]
fn test_custom_manifest_name_and_nested_out_dir() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fq.gz", &reads(5, None));
    let out_dir: PathBuf = temp_dir.path().join("nested").join("deeper");

    let output =
        run_trim(&[&s(&a), "--out-dir", &s(&out_dir), "--out-tsv", "trimmed_fastqs.tsv"]);
    assert_success(&output);

    let rows = read_manifest(&out_dir.join("trimmed_fastqs.tsv"));
    assert_eq!(rows, vec![vec![out_dir.join("a.fq.gz")]]);
    assert!(!out_dir.join("out.tsv").exists());
}

/// Two inputs that share a basename would overwrite each other and are rejected.
#[test]
fn test_colliding_basenames_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let x = temp_dir.path().join("x");
    let y = temp_dir.path().join("y");
    fs::create_dir_all(&x).unwrap();
    fs::create_dir_all(&y).unwrap();
    let a1 = create_gzip_fastq(&x, "a.fastq.gz", &reads(5, None));
    let a2 = create_gzip_fastq(&y, "a.fastq.gz", &reads(5, None));
    let out_dir = temp_dir.path().join("out");

    let output = run_trim(&[&s(&a1), &s(&a2), "--out-dir", &s(&out_dir)]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("merge_id=1 and merge_id=2"));
}
