//! The batch of FASTQ groups to trim.
//!
//! A [`Batch`] is an ordered list of [`Group`]s (merge units), each holding one slot per
//! mate. All groups share the same [`EndMode`]. The batch is built once from the FASTQ and
//! adapter matrices, validated, and then owned by the orchestrator; only slot adapters change
//! afterwards, when detection resolves them.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::adapter::AdapterSpec;
use crate::errors::{Result, TrimError};
use crate::matrix::Matrix;
use crate::trim::{passthrough_output_path, trimmed_output_path};

/// Whether reads are single-end or paired-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndMode {
    /// One FASTQ per group
    Single,
    /// Two FASTQs (R1, R2) per group
    Paired,
}

impl EndMode {
    /// Builds the mode from a `--paired-end` style flag.
    #[must_use]
    pub fn from_paired(paired: bool) -> Self {
        if paired { EndMode::Paired } else { EndMode::Single }
    }

    /// Number of slots per group.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            EndMode::Single => 1,
            EndMode::Paired => 2,
        }
    }
}

impl fmt::Display for EndMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndMode::Single => write!(f, "single-end"),
            EndMode::Paired => write!(f, "paired-end"),
        }
    }
}

/// One mate of a group: an input FASTQ and its adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Input FASTQ
    pub fastq: PathBuf,
    /// Adapter to trim, if known
    pub adapter: AdapterSpec,
}

/// A merge unit: the FASTQs of one replicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// 1-based position of the group in the input
    pub merge_id: usize,
    /// One slot per mate, R1 first
    pub slots: Vec<Slot>,
}

impl Group {
    /// Adapter sequences for each slot, in slot order.
    #[must_use]
    pub fn adapter_sequences(&self) -> Vec<Option<&str>> {
        self.slots.iter().map(|s| s.adapter.sequence()).collect()
    }
}

/// Parameters shared by every trim task.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimParams {
    /// Discard trimmed reads shorter than this; 0 disables the filter
    pub min_trim_len: usize,
    /// Maximum allowed adapter error rate
    pub err_rate: f64,
    /// Directory receiving trimmed or linked FASTQs
    pub out_dir: PathBuf,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self { min_trim_len: 5, err_rate: 0.1, out_dir: PathBuf::from(".") }
    }
}

/// The full set of groups plus batch-wide settings.
#[derive(Debug, Clone)]
pub struct Batch {
    mode: EndMode,
    groups: Vec<Group>,
    /// Trim parameters
    pub params: TrimParams,
    /// Run detection for slots without an adapter
    pub auto_detect: bool,
    /// Requested worker threads
    pub threads: usize,
}

impl Batch {
    /// Builds a batch from a FASTQ matrix and an optional adapter matrix.
    ///
    /// When `adapters` is `None` every slot starts as [`AdapterSpec::Unset`].
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::EmptyBatch`] for an empty FASTQ matrix and
    /// [`TrimError::ShapeMismatch`] when the matrices disagree with each other or with `mode`.
    pub fn from_matrices(
        mode: EndMode,
        fastqs: Matrix,
        adapters: Option<Matrix>,
        params: TrimParams,
    ) -> Result<Self> {
        let adapters = adapters
            .unwrap_or_else(|| fastqs.iter().map(|row| vec![String::new(); row.len()]).collect());
        validate_shape(mode, &fastqs, &adapters)?;

        let groups = fastqs
            .into_iter()
            .zip(adapters)
            .enumerate()
            .map(|(i, (files, adapters))| Group {
                merge_id: i + 1,
                slots: files
                    .into_iter()
                    .zip(adapters)
                    .map(|(fastq, adapter)| Slot {
                        fastq: PathBuf::from(fastq),
                        adapter: AdapterSpec::from_cell(&adapter),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self { mode, groups, params, auto_detect: false, threads: 1 })
    }

    /// Enables or disables adapter auto-detection.
    #[must_use]
    pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
        self.auto_detect = auto_detect;
        self
    }

    /// Sets the requested number of worker threads.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// The end mode of every group.
    #[must_use]
    pub fn mode(&self) -> EndMode {
        self.mode
    }

    /// The groups in input order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Total number of slots across all groups.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.groups.len() * self.mode.arity()
    }

    /// Worker count: the requested threads, capped at the number of slots, never zero.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.threads.min(self.total_slots()).max(1)
    }

    /// Slots that detection should visit, as `(group index, slot index)` pairs.
    ///
    /// Empty when auto-detection is off; otherwise every slot still [`AdapterSpec::Unset`].
    #[must_use]
    pub fn slots_to_detect(&self) -> Vec<(usize, usize)> {
        if !self.auto_detect {
            return Vec::new();
        }
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.adapter.is_unset())
                    .map(move |(s, _)| (g, s))
            })
            .collect()
    }

    /// Records the adapter resolved for one slot.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of range.
    pub fn set_adapter(&mut self, group: usize, slot: usize, adapter: AdapterSpec) {
        self.groups[group].slots[slot].adapter = adapter;
    }

    /// Fails if two slots could write the same file in the output directory.
    ///
    /// Every slot reserves its pass-through name. A group that could still be trimmed (each
    /// mate has an adapter, or may get one from detection) also reserves its trimmed names,
    /// since which name is used is only known after detection.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::OutputCollision`] naming the two groups involved.
    pub fn check_output_collisions(&self) -> Result<()> {
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
        let out_dir = &self.params.out_dir;
        for group in &self.groups {
            let may_trim = self.may_trim(group);
            let mut own: Vec<PathBuf> = Vec::new();
            for slot in &group.slots {
                for path in planned_outputs(&slot.fastq, out_dir, may_trim) {
                    if own.contains(&path) {
                        continue;
                    }
                    if let Some(&first) = claimed.get(&path) {
                        return Err(TrimError::OutputCollision {
                            path: path.display().to_string(),
                            first,
                            second: group.merge_id,
                        });
                    }
                    own.push(path);
                }
            }
            // R1 and R2 sharing a basename is still a collision within the group.
            let per_slot = if may_trim { 2 } else { 1 };
            if own.len() < group.slots.len() * per_slot {
                return Err(TrimError::OutputCollision {
                    path: own.first().map(|p| p.display().to_string()).unwrap_or_default(),
                    first: group.merge_id,
                    second: group.merge_id,
                });
            }
            for path in own {
                claimed.insert(path, group.merge_id);
            }
        }
        Ok(())
    }

    /// Whether every mate of `group` has, or may be given, an adapter.
    fn may_trim(&self, group: &Group) -> bool {
        group.slots.iter().all(|slot| {
            slot.adapter.sequence().is_some() || (self.auto_detect && slot.adapter.is_unset())
        })
    }
}

fn planned_outputs(fastq: &Path, out_dir: &Path, may_trim: bool) -> Vec<PathBuf> {
    let mut paths = vec![passthrough_output_path(fastq, out_dir)];
    if may_trim {
        paths.push(trimmed_output_path(fastq, out_dir));
    }
    paths
}

/// Checks that the FASTQ and adapter matrices have the same shape and match `mode`.
///
/// # Errors
///
/// Returns [`TrimError::EmptyBatch`] if there are no rows, or [`TrimError::ShapeMismatch`]
/// naming the first offending group.
pub fn validate_shape(mode: EndMode, fastqs: &Matrix, adapters: &Matrix) -> Result<()> {
    if fastqs.is_empty() {
        return Err(TrimError::EmptyBatch);
    }
    if fastqs.len() != adapters.len() {
        return Err(TrimError::shape(
            fastqs.len().min(adapters.len()) + 1,
            format!("{} FASTQ rows but {} adapter rows", fastqs.len(), adapters.len()),
        ));
    }

    let arity = mode.arity();
    for (i, (files, adapters)) in fastqs.iter().zip(adapters).enumerate() {
        if files.len() != arity {
            return Err(TrimError::shape(
                i + 1,
                format!("expected {arity} FASTQ(s) for {mode}, found {}", files.len()),
            ));
        }
        if files.len() != adapters.len() {
            return Err(TrimError::shape(
                i + 1,
                format!("{} FASTQ(s) but {} adapter(s)", files.len(), adapters.len()),
            ));
        }
    }
    Ok(())
}
