//! Trim tasks for single-end and paired-end groups.
//!
//! A trim task either runs the external trimmer (when every mate has an adapter) or hard
//! links the inputs into the output directory unchanged. Either way a group always yields
//! one output path per mate inside the output directory.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::batch::TrimParams;
use crate::errors::{Result, TrimError};
use crate::matrix::FASTQ_EXTENSIONS;

/// Suffix given to trimmed outputs.
pub const TRIMMED_SUFFIX: &str = ".trim.fastq.gz";

/// Number of trailing stderr lines kept in a [`TrimError::TrimFailed`] message.
const STDERR_TAIL_LINES: usize = 20;

/// File name of `fastq` with any FASTQ extension removed.
#[must_use]
pub fn strip_fastq_extension(fastq: &Path) -> String {
    let name = file_name(fastq);
    FASTQ_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .map_or_else(|| name.clone(), str::to_string)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Where the trimmed version of `fastq` is written.
#[must_use]
pub fn trimmed_output_path(fastq: &Path, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}{TRIMMED_SUFFIX}", strip_fastq_extension(fastq)))
}

/// Where the untrimmed hard link to `fastq` is created.
#[must_use]
pub fn passthrough_output_path(fastq: &Path, out_dir: &Path) -> PathBuf {
    out_dir.join(file_name(fastq))
}

/// A fully built invocation of the external trimmer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimCommand {
    /// Command-line arguments, excluding the program
    pub args: Vec<OsString>,
    /// Input FASTQs
    pub inputs: Vec<PathBuf>,
    /// Output FASTQs, one per input
    pub outputs: Vec<PathBuf>,
}

impl TrimCommand {
    /// Comma-separated inputs, for messages.
    #[must_use]
    pub fn describe_inputs(&self) -> String {
        self.inputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for TrimCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<_> = self.args.iter().map(|a| a.to_string_lossy()).collect();
        write!(f, "{}", args.join(" "))
    }
}

/// Runs a [`TrimCommand`].
///
/// Implementations must be safe to call from several worker threads at once.
pub trait Trimmer: Send + Sync {
    /// Name of the tool, used in logs and errors.
    fn name(&self) -> String;

    /// Builds the single-end command.
    fn single_end(&self, fastq: &Path, adapter: &str, params: &TrimParams) -> TrimCommand;

    /// Builds the paired-end command.
    fn paired_end(
        &self,
        fastqs: [&Path; 2],
        adapters: [&str; 2],
        params: &TrimParams,
    ) -> TrimCommand;

    /// Executes `command`, returning once all outputs are written.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::TrimFailed`] if the tool cannot be launched or exits unsuccessfully.
    fn run(&self, command: &TrimCommand) -> Result<()>;
}

/// The cutadapt command-line tool.
#[derive(Debug, Clone)]
pub struct Cutadapt {
    program: PathBuf,
    cores: usize,
}

impl Default for Cutadapt {
    fn default() -> Self {
        Self { program: PathBuf::from("cutadapt"), cores: 1 }
    }
}

impl Cutadapt {
    /// Uses `program` as the cutadapt executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), cores: 1 }
    }

    /// Sets cutadapt's own worker count (`-j`); 1 leaves cutadapt's default.
    #[must_use]
    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores.max(1);
        self
    }

    fn common_args(&self, params: &TrimParams) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.cores != 1 {
            args.extend(["-j".into(), self.cores.to_string().into()]);
        }
        if params.min_trim_len > 0 {
            args.extend(["-m".into(), params.min_trim_len.to_string().into()]);
        }
        args.extend(["-e".into(), params.err_rate.to_string().into()]);
        args
    }
}

impl Trimmer for Cutadapt {
    fn name(&self) -> String {
        self.program.display().to_string()
    }

    fn single_end(&self, fastq: &Path, adapter: &str, params: &TrimParams) -> TrimCommand {
        let output = trimmed_output_path(fastq, &params.out_dir);
        let mut args = self.common_args(params);
        args.extend(["-a".into(), adapter.into(), "-o".into(), output.clone().into_os_string()]);
        args.push(fastq.as_os_str().to_owned());
        TrimCommand { args, inputs: vec![fastq.to_path_buf()], outputs: vec![output] }
    }

    fn paired_end(
        &self,
        fastqs: [&Path; 2],
        adapters: [&str; 2],
        params: &TrimParams,
    ) -> TrimCommand {
        let outputs: Vec<PathBuf> =
            fastqs.iter().map(|f| trimmed_output_path(f, &params.out_dir)).collect();
        let mut args = self.common_args(params);
        args.extend([
            "-a".into(),
            adapters[0].into(),
            "-A".into(),
            adapters[1].into(),
            "-o".into(),
            outputs[0].clone().into_os_string(),
            "-p".into(),
            outputs[1].clone().into_os_string(),
        ]);
        args.extend(fastqs.iter().map(|f| f.as_os_str().to_owned()));
        TrimCommand { args, inputs: fastqs.iter().map(|f| f.to_path_buf()).collect(), outputs }
    }

    fn run(&self, command: &TrimCommand) -> Result<()> {
        debug!("Running: {} {command}", self.name());
        let failed = |reason: String| TrimError::TrimFailed {
            program: self.name(),
            files: command.describe_inputs(),
            reason,
        };

        let output = Command::new(&self.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| failed(format!("could not launch: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            Err(failed(format!("{}\n{tail}", output.status)))
        }
    }
}

/// Hard links `fastq` into `out_dir` under its own file name.
///
/// Symbolic links are resolved first so the link points at the file's data rather than at a
/// possibly relative symlink. A FASTQ that already lives in `out_dir` is returned as is.
///
/// # Errors
///
/// Returns [`TrimError::Io`] if the input cannot be resolved or the link cannot be created
/// (e.g. another file exists there).
pub fn link_into(fastq: &Path, out_dir: &Path) -> Result<PathBuf> {
    let linked = passthrough_output_path(fastq, out_dir);
    let source = fastq.canonicalize().map_err(|e| TrimError::io("resolve input", fastq, e))?;
    if linked.canonicalize().is_ok_and(|target| target == source) {
        debug!("{} is already in {}", fastq.display(), out_dir.display());
        return Ok(linked);
    }
    std::fs::hard_link(&source, &linked)
        .map_err(|e| TrimError::io("create hard link", &linked, e))?;
    Ok(linked)
}

/// The output the trimmer planned for mate `mate`.
fn planned_output(trimmer: &dyn Trimmer, command: &TrimCommand, mate: usize) -> Result<PathBuf> {
    command.outputs.get(mate).cloned().ok_or_else(|| TrimError::TrimFailed {
        program: trimmer.name(),
        files: command.describe_inputs(),
        reason: format!("no output planned for mate {}", mate + 1),
    })
}

/// Trims one single-end FASTQ, or links it through when there is no adapter.
///
/// # Errors
///
/// Returns an error if trimming or linking fails.
pub fn trim_single(
    trimmer: &dyn Trimmer,
    fastq: &Path,
    adapter: Option<&str>,
    params: &TrimParams,
) -> Result<PathBuf> {
    match adapter {
        Some(adapter) => {
            let command = trimmer.single_end(fastq, adapter, params);
            let output = planned_output(trimmer, &command, 0)?;
            trimmer.run(&command)?;
            Ok(output)
        }
        None => link_into(fastq, &params.out_dir),
    }
}

/// Trims a read pair, or links both mates through unless both adapters are known.
///
/// # Errors
///
/// Returns an error if trimming or linking fails.
pub fn trim_paired(
    trimmer: &dyn Trimmer,
    fastqs: [&Path; 2],
    adapters: [Option<&str>; 2],
    params: &TrimParams,
) -> Result<[PathBuf; 2]> {
    match adapters {
        [Some(a1), Some(a2)] => {
            let command = trimmer.paired_end(fastqs, [a1, a2], params);
            let outputs =
                [planned_output(trimmer, &command, 0)?, planned_output(trimmer, &command, 1)?];
            trimmer.run(&command)?;
            Ok(outputs)
        }
        _ => Ok([link_into(fastqs[0], &params.out_dir)?, link_into(fastqs[1], &params.out_dir)?]),
    }
}
