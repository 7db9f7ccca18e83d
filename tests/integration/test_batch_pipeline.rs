//! End-to-end tests of the library engine: matrices in, manifest out.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fqtrim_lib::adapter::{AdapterSpec, KnownAdapter, KnownAdapterDetector};
use fqtrim_lib::batch::{Batch, EndMode, Group, TrimParams};
use fqtrim_lib::manifest::Manifest;
use fqtrim_lib::matrix::MatrixSource;
use fqtrim_lib::orchestrator::{BatchObserver, Orchestrator, Phase};
use fqtrim_lib::trim::Cutadapt;
use tempfile::TempDir;

use crate::helpers::{ILLUMINA, create_gzip_fastq, file_name, reads};

/// Collects every event it receives.
#[derive(Default)]
struct RecordingObserver {
    phases: Mutex<Vec<(Phase, usize, usize)>>,
    resolved: Mutex<Vec<(usize, usize, String)>>,
    trimmed: Mutex<Vec<usize>>,
}

impl BatchObserver for RecordingObserver {
    fn phase_started(&self, phase: Phase, tasks: usize, threads: usize) {
        self.phases.lock().unwrap().push((phase, tasks, threads));
    }

    fn adapter_resolved(
        &self,
        merge_id: usize,
        mate: usize,
        _fastq: &Path,
        adapter: &AdapterSpec,
    ) {
        self.resolved.lock().unwrap().push((merge_id, mate, adapter.to_string()));
    }

    fn group_trimmed(&self, group: &Group, _outputs: &[PathBuf]) {
        self.trimmed.lock().unwrap().push(group.merge_id);
    }
}

fn params(dir: &TempDir) -> TrimParams {
    TrimParams { out_dir: dir.path().join("out"), ..TrimParams::default() }
}

/// Detection on real gzipped FASTQs with nothing to trim, so no external tool is needed.
#[test]
fn test_detection_without_adapters_links_everything() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fastq.gz", &reads(20, None));
    let b = create_gzip_fastq(temp_dir.path(), "b.fastq.gz", &reads(20, None));

    let tokens = [a.display().to_string(), b.display().to_string()];
    let fastqs = MatrixSource::for_fastqs(&tokens).resolve().unwrap();
    let mut batch = Batch::from_matrices(EndMode::Single, fastqs, None, params(&temp_dir))
        .unwrap()
        .with_auto_detect(true)
        .with_threads(4);

    let detector = KnownAdapterDetector::default();
    let observer = RecordingObserver::default();
    let trimmer = Cutadapt::new("/nonexistent/cutadapt");
    let manifest = Orchestrator::new(&detector, &trimmer, &observer).run(&mut batch).unwrap();

    let names: Vec<String> = manifest.rows().iter().map(|r| file_name(&r[0])).collect();
    assert_eq!(names, vec!["a.fastq.gz", "b.fastq.gz"]);

    // Both slots: 2 detection tasks on min(4, 2) = 2 workers, then 2 trim tasks.
    let phases = observer.phases.lock().unwrap().clone();
    assert_eq!(phases, vec![(Phase::Detection, 2, 2), (Phase::Trim, 2, 2)]);

    let mut resolved = observer.resolved.lock().unwrap().clone();
    resolved.sort();
    assert_eq!(
        resolved,
        vec![(1, 1, "<not found>".to_string()), (2, 1, "<not found>".to_string())]
    );
    assert!(batch.groups().iter().all(|g| g.slots[0].adapter == AdapterSpec::NotFound));

    let mut trimmed = observer.trimmed.lock().unwrap().clone();
    trimmed.sort_unstable();
    assert_eq!(trimmed, vec![1, 2]);
}

/// Running the real cutadapt path against a missing executable fails the whole batch.
#[test]
fn test_missing_trimmer_executable_fails_batch() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_gzip_fastq(temp_dir.path(), "a.fastq.gz", &reads(20, Some(ILLUMINA)));

    let fastqs = vec![vec![a.display().to_string()]];
    let mut batch = Batch::from_matrices(EndMode::Single, fastqs, None, params(&temp_dir))
        .unwrap()
        .with_auto_detect(true);

    let detector = KnownAdapterDetector::default();
    let observer = RecordingObserver::default();
    let trimmer = Cutadapt::new("/nonexistent/cutadapt");
    let err = Orchestrator::new(&detector, &trimmer, &observer).run(&mut batch).unwrap_err();

    assert!(err.to_string().contains("could not launch"), "{err}");
    let detected = &batch.groups()[0].slots[0].adapter;
    assert_eq!(*detected, AdapterSpec::Detected(KnownAdapter::Illumina));
    assert!(observer.trimmed.lock().unwrap().is_empty());
}

#[cfg(unix)]
mod with_stand_in_cutadapt {
    use super::*;
    use crate::helpers::{fake_cutadapt, recorded_calls};

    /// Paired-end groups: one with both adapters detected, one with none.
    #[test]
    fn test_paired_end_detection_and_trim() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let fastqs = vec![
            vec![
                create_gzip_fastq(dir, "x_R1.fastq.gz", &reads(20, Some(ILLUMINA)))
                    .display()
                    .to_string(),
                create_gzip_fastq(dir, "x_R2.fastq.gz", &reads(20, Some(ILLUMINA)))
                    .display()
                    .to_string(),
            ],
            vec![
                create_gzip_fastq(dir, "y_R1.fastq.gz", &reads(20, None)).display().to_string(),
                create_gzip_fastq(dir, "y_R2.fastq.gz", &reads(20, None)).display().to_string(),
            ],
        ];
        let mut batch = Batch::from_matrices(EndMode::Paired, fastqs, None, params(&temp_dir))
            .unwrap()
            .with_auto_detect(true)
            .with_threads(3);

        let cutadapt = fake_cutadapt(&dir.join("bin"));
        let detector = KnownAdapterDetector::default();
        let observer = RecordingObserver::default();
        let trimmer = Cutadapt::new(&cutadapt);
        let manifest = Orchestrator::new(&detector, &trimmer, &observer).run(&mut batch).unwrap();

        let out = dir.join("out");
        assert_eq!(
            manifest,
            Manifest::new(vec![
                vec![out.join("x_R1.trim.fastq.gz"), out.join("x_R2.trim.fastq.gz")],
                vec![out.join("y_R1.fastq.gz"), out.join("y_R2.fastq.gz")],
            ])
        );
        assert!(manifest.rows().iter().flatten().all(|p| p.exists()));

        let phases = observer.phases.lock().unwrap().clone();
        assert_eq!(phases, vec![(Phase::Detection, 4, 3), (Phase::Trim, 2, 3)]);

        let calls = recorded_calls(&cutadapt);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&format!("-a {ILLUMINA} -A {ILLUMINA}")));

        let manifest_path = out.join("out.tsv");
        manifest.write(&manifest_path).unwrap();
        assert_eq!(Manifest::read(&manifest_path).unwrap(), manifest);
    }
}
