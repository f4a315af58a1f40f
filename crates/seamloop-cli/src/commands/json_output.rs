//! JSON output types for machine-readable CLI output.
//!
//! Every command accepts `--json` and then prints exactly one
//! [`CommandOutput`] envelope to stdout.

use std::process::ExitCode;

use anyhow::Result;
use seamloop_engine::{EngineError, FormatSource, LoopCandidate, SampleFormat};
use serde::Serialize;

/// Error codes for CLI-level failures.
///
/// Engine failures pass their own `SEAMLOOP_0xx` codes through unchanged.
pub mod error_codes {
    /// Input file could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// Output file could not be written
    pub const FILE_WRITE: &str = "CLI_002";
    /// Argument out of range for the loaded audio
    pub const INVALID_ARGUMENT: &str = "CLI_003";
    /// Anything else
    pub const INTERNAL: &str = "CLI_009";
}

/// Warning codes.
pub mod warning_codes {
    /// Load used the fallback decoder or inferred the format
    pub const LOAD: &str = "CLI_W001";
    /// Stage A found no match and fell back
    pub const DEGENERATE_SEARCH: &str = "CLI_W002";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "SEAMLOOP_001")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            file: None,
        }
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Maps an error chain to a code: the engine's own code if an
    /// [`EngineError`] is inside, else one of [`error_codes`].
    pub fn from_error(err: &anyhow::Error) -> Self {
        let code = if let Some(engine) = err.downcast_ref::<EngineError>() {
            engine.code()
        } else if let Some(cli) = err.downcast_ref::<CliError>() {
            cli.code()
        } else {
            error_codes::INTERNAL
        };
        Self::new(code, format!("{:#}", err))
    }
}

/// A structured warning in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonWarning {
    /// Stable warning code (e.g., "CLI_W001")
    pub code: String,
    /// Human-readable warning message
    pub message: String,
}

impl JsonWarning {
    /// Creates a new warning with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// CLI-level failures that carry their own code.
#[derive(Debug)]
pub enum CliError {
    /// Reading an input failed.
    FileRead(String),
    /// Writing an output failed.
    FileWrite(String),
    /// A positional argument does not fit the audio.
    InvalidArgument(String),
}

impl CliError {
    /// Stable code for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::FileRead(_) => error_codes::FILE_READ,
            CliError::FileWrite(_) => error_codes::FILE_WRITE,
            CliError::InvalidArgument(_) => error_codes::INVALID_ARGUMENT,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::FileRead(msg) => write!(f, "Failed to read {}", msg),
            CliError::FileWrite(msg) => write!(f, "Failed to write {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

/// Envelope printed by every command in `--json` mode.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput<T> {
    /// Whether the command succeeded
    pub success: bool,
    /// Errors encountered
    pub errors: Vec<JsonError>,
    /// Non-fatal notes
    pub warnings: Vec<JsonWarning>,
    /// Command result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> CommandOutput<T> {
    /// Creates a successful output.
    pub fn success(result: T, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            result: Some(result),
        }
    }

    /// Creates a failed output.
    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            warnings: Vec::new(),
            result: None,
        }
    }
}

/// Prints the envelope for `outcome` and picks the exit code.
pub fn emit<T: Serialize>(
    outcome: Result<(T, Vec<JsonWarning>)>,
    input: &str,
) -> Result<ExitCode> {
    match outcome {
        Ok((result, warnings)) => {
            let output = CommandOutput::success(result, warnings);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let output =
                CommandOutput::<T>::failure(vec![JsonError::from_error(&err).with_file(input)]);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::from(1))
        }
    }
}

/// Result of the `info` command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InfoResult {
    /// Input path
    pub file: String,
    /// Channel count
    pub channels: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per channel
    pub frames: usize,
    /// Duration, formatted to frame resolution
    pub duration: String,
    /// Sample format used for exports
    pub format: SampleFormat,
    /// Whether the format was parsed or inferred
    pub format_source: FormatSource,
    /// Decoder that produced the samples
    pub decoder: String,
    /// BLAKE3 hash of the re-encoded PCM data
    pub pcm_hash: String,
}

/// One end of a loop, in frames and seconds.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoopReport {
    /// Loop begin frame
    pub begin: usize,
    /// Loop end frame (exclusive)
    pub end: usize,
    /// Loop begin as formatted time
    pub begin_time: String,
    /// Loop end as formatted time
    pub end_time: String,
    /// Loop length in frames
    pub length: usize,
}

/// A finished search stage.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageReport {
    /// Chosen loop
    pub candidate: LoopReport,
    /// Score of the chosen loop (`null` when the search was degenerate)
    pub score: Option<f32>,
    /// Number of scored candidates
    pub candidates: usize,
}

/// Result of the `find` command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FindResult {
    /// Input path
    pub file: String,
    /// Loop begin after clamping
    pub begin: usize,
    /// Stage A: best end for the fixed begin
    pub tail: StageReport,
    /// Stage B: best begin for the resulting length
    pub offset: StageReport,
}

/// Result of the `snap` command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SnapResult {
    /// Input path
    pub file: String,
    /// Curve snapped against ("tail" or "offset")
    pub stage: String,
    /// Requested cursor frame
    pub cursor: usize,
    /// Loop after snapping
    pub candidate: LoopReport,
}

/// One file written by `split` or `reencode`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WrittenFile {
    /// Which part of the loop (head, loop, tail, test)
    pub part: String,
    /// Output path
    pub path: String,
    /// Size in bytes
    pub bytes: usize,
    /// BLAKE3 hash of the PCM data
    pub pcm_hash: String,
}

/// Result of the `split` and `reencode` commands.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportResult {
    /// Input path
    pub file: String,
    /// Format written
    pub format: SampleFormat,
    /// Exported loop (split only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<LoopCandidate>,
    /// Files written
    pub outputs: Vec<WrittenFile>,
}
