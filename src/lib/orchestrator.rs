//! Two-phase batch execution: detect adapters, then trim.
//!
//! The [`Orchestrator`] owns no state of its own. It borrows a detector, a trimmer and a
//! [`BatchObserver`], and drives a [`Batch`] through:
//!
//! 1. **Detection**: one task per slot that has no adapter, when auto-detection is on.
//! 2. **Trimming**: one task per group, using the adapters resolved in phase 1.
//!
//! Both phases share one worker count, `min(threads, groups * arity)`, and each phase is a
//! barrier: trimming starts only after every detection task returned. Any failure aborts the
//! batch and no manifest is produced.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::info;

use crate::adapter::{AdapterDetector, AdapterSpec, KnownAdapter};
use crate::batch::{Batch, EndMode, Group};
use crate::errors::{Result, TrimError};
use crate::logging::format_duration;
use crate::manifest::Manifest;
use crate::pool::WorkerPool;
use crate::trim::{Trimmer, trim_paired, trim_single};

/// The phases of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Adapter detection
    Detection,
    /// Adapter trimming
    Trim,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Detection => write!(f, "adapter detection"),
            Phase::Trim => write!(f, "adapter trimming"),
        }
    }
}

/// Receives progress events from an [`Orchestrator`].
///
/// `adapter_resolved` and `group_trimmed` are called from worker threads as tasks finish, so
/// their call order is not the group order.
pub trait BatchObserver: Send + Sync {
    /// A phase is about to submit `tasks` tasks to `threads` workers.
    fn phase_started(&self, _phase: Phase, _tasks: usize, _threads: usize) {}

    /// Every task of a phase has returned successfully.
    fn phase_finished(&self, _phase: Phase, _elapsed: Duration) {}

    /// Detection finished for one mate (1-based) of a group.
    fn adapter_resolved(
        &self,
        _merge_id: usize,
        _mate: usize,
        _fastq: &Path,
        _adapter: &AdapterSpec,
    ) {
    }

    /// A group's outputs are in place.
    fn group_trimmed(&self, _group: &Group, _outputs: &[PathBuf]) {}
}

/// Reports batch events through the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn phase_started(&self, phase: Phase, tasks: usize, threads: usize) {
        info!("Starting {phase}: {tasks} task(s) on {threads} thread(s)");
    }

    fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        info!("Finished {phase} in {}", format_duration(elapsed));
    }

    fn adapter_resolved(&self, merge_id: usize, mate: usize, fastq: &Path, adapter: &AdapterSpec) {
        info!("Detected adapter for merge_id={merge_id}, R{mate} ({}): {adapter}", fastq.display());
    }

    fn group_trimmed(&self, group: &Group, outputs: &[PathBuf]) {
        let adapters: Vec<String> = group.slots.iter().map(|s| s.adapter.to_string()).collect();
        let outputs: Vec<String> = outputs.iter().map(|p| p.display().to_string()).collect();
        info!(
            "merge_id={} adapters=[{}] -> {}",
            group.merge_id,
            adapters.join(", "),
            outputs.join(", ")
        );
    }
}

/// Drives a [`Batch`] through detection and trimming.
pub struct Orchestrator<'a> {
    detector: &'a dyn AdapterDetector,
    trimmer: &'a dyn Trimmer,
    observer: &'a dyn BatchObserver,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator from its collaborators.
    pub fn new(
        detector: &'a dyn AdapterDetector,
        trimmer: &'a dyn Trimmer,
        observer: &'a dyn BatchObserver,
    ) -> Self {
        Self { detector, trimmer, observer }
    }

    /// Runs both phases and returns the manifest of outputs in group order.
    ///
    /// The output directory is created (with parents) before any task runs. On return the
    /// batch holds the adapters resolved by detection.
    ///
    /// # Errors
    ///
    /// Returns the first error from validation, detection or trimming. Nothing is returned
    /// for a partially processed batch.
    pub fn run(&self, batch: &mut Batch) -> Result<Manifest> {
        batch.check_output_collisions()?;

        let out_dir = &batch.params.out_dir;
        std::fs::create_dir_all(out_dir)
            .map_err(|e| TrimError::io("create directory", out_dir, e))?;

        let pool = WorkerPool::new(batch.concurrency())?;
        self.detect_adapters(batch, &pool)?;
        let rows = self.trim_groups(batch, &pool)?;
        Ok(Manifest::new(rows))
    }

    /// Phase 1: fills in adapters for unset slots when auto-detection is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::DetectionFailed`] if any detection task fails.
    pub fn detect_adapters(&self, batch: &mut Batch, pool: &WorkerPool) -> Result<()> {
        let targets: Vec<(usize, usize, PathBuf)> = batch
            .slots_to_detect()
            .into_iter()
            .map(|(g, s)| (g, s, batch.groups()[g].slots[s].fastq.clone()))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        self.observer.phase_started(Phase::Detection, targets.len(), pool.threads());

        let detector = self.detector;
        let observer = self.observer;
        let merge_ids: Vec<usize> = batch.groups().iter().map(|g| g.merge_id).collect();
        let resolved = pool.run_all(targets, |_, (g, s, fastq)| {
            let adapter = AdapterSpec::from_detection(detector.detect(&fastq)?);
            observer.adapter_resolved(merge_ids[g], s + 1, &fastq, &adapter);
            Ok((g, s, adapter))
        })?;

        for (g, s, adapter) in resolved {
            batch.set_adapter(g, s, adapter);
        }
        self.observer.phase_finished(Phase::Detection, start.elapsed());
        Ok(())
    }

    /// Phase 2: trims (or links) every group and returns outputs in group order.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::TrimFailed`] or [`TrimError::Io`] if any group fails.
    pub fn trim_groups(&self, batch: &Batch, pool: &WorkerPool) -> Result<Vec<Vec<PathBuf>>> {
        let start = Instant::now();
        self.observer.phase_started(Phase::Trim, batch.groups().len(), pool.threads());

        let trimmer = self.trimmer;
        let observer = self.observer;
        let mode = batch.mode();
        let params = &batch.params;
        let rows = pool.run_all(batch.groups().iter().collect(), |_, group: &Group| {
            let outputs = match mode {
                EndMode::Single => {
                    let slot = &group.slots[0];
                    vec![trim_single(trimmer, &slot.fastq, slot.adapter.sequence(), params)?]
                }
                EndMode::Paired => {
                    let (r1, r2) = (&group.slots[0], &group.slots[1]);
                    trim_paired(
                        trimmer,
                        [r1.fastq.as_path(), r2.fastq.as_path()],
                        [r1.adapter.sequence(), r2.adapter.sequence()],
                        params,
                    )?
                    .to_vec()
                }
            };
            observer.group_trimmed(group, &outputs);
            Ok(outputs)
        })?;

        self.observer.phase_finished(Phase::Trim, start.elapsed());
        Ok(rows)
    }
}

/// Returns which known adapters were detected across a batch, for summaries.
#[must_use]
pub fn detected_adapters(batch: &Batch) -> Vec<KnownAdapter> {
    let mut seen = Vec::new();
    for slot in batch.groups().iter().flat_map(|g| &g.slots) {
        if let AdapterSpec::Detected(adapter) = slot.adapter {
            if !seen.contains(&adapter) {
                seen.push(adapter);
            }
        }
    }
    seen
}
