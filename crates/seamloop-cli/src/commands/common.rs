//! Helpers shared by the subcommands.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;
use seamloop_engine::codec::encode_samples;
use seamloop_engine::{
    AudioBuffer, HoundDecoder, LoadReport, LoopCandidate, LoopSession, SampleFormat,
    SearchConfig, SearchProgress,
};

use super::json_output::{warning_codes, CliError, JsonWarning, LoopReport};

/// Search tuning flags, layered over an optional JSON config file.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigArgs {
    /// JSON file with search settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Comparison window in frames
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Stage A pruning threshold (mean squared error)
    #[arg(long)]
    pub sse_threshold: Option<f64>,

    /// Compare every n-th sample pair inside the window
    #[arg(long)]
    pub stride: Option<usize>,

    /// Half-width of the snap window in frames
    #[arg(long)]
    pub snap_distance: Option<usize>,
}

impl ConfigArgs {
    /// Builds the effective config: file (or defaults), then flag overrides.
    pub fn resolve(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_json_file(Path::new(path))
                .with_context(|| format!("loading config {}", path))?,
            None => SearchConfig::default(),
        };
        if let Some(v) = self.window_size {
            config.window_size = v;
        }
        if let Some(v) = self.sse_threshold {
            config.sse_threshold = v;
        }
        if let Some(v) = self.stride {
            config.comparison_stride = v;
        }
        if let Some(v) = self.snap_distance {
            config.snap_distance = v;
        }
        config.validate()?;
        Ok(config)
    }
}

/// A position given either in frames (`44100`) or seconds (`1.5s`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePosition {
    /// Absolute frame index.
    Frames(usize),
    /// Time in seconds, rounded to the nearest frame.
    Seconds(f64),
}

impl FramePosition {
    /// Converts to a frame index at the buffer's sample rate.
    pub fn resolve(&self, buffer: &AudioBuffer) -> usize {
        match *self {
            FramePosition::Frames(frame) => frame,
            FramePosition::Seconds(seconds) => buffer.seconds_to_frame(seconds),
        }
    }
}

impl FromStr for FramePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(secs) = s.strip_suffix('s') {
            let value: f64 = secs
                .parse()
                .map_err(|_| format!("'{}' is not a time in seconds", s))?;
            if !value.is_finite() || value < 0.0 {
                return Err(format!("'{}' must be a non-negative time", s));
            }
            return Ok(FramePosition::Seconds(value));
        }
        s.parse()
            .map(FramePosition::Frames)
            .map_err(|_| format!("'{}' is neither a frame index nor a time like 1.5s", s))
    }
}

impl fmt::Display for FramePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramePosition::Frames(frame) => write!(f, "{}", frame),
            FramePosition::Seconds(seconds) => write!(f, "{}s", seconds),
        }
    }
}

/// Reads `path` and loads it into a fresh session, using hound as the
/// fallback decoder.
pub fn load_session(path: &str, config: SearchConfig) -> Result<(LoopSession, LoadReport)> {
    let bytes = fs::read(path).map_err(|e| CliError::FileRead(format!("{}: {}", path, e)))?;
    let mut session = LoopSession::new(config)?;
    let report = session
        .load(&bytes, Some(&HoundDecoder))
        .with_context(|| format!("loading {}", path))?;
    Ok((session, report))
}

/// Load notes as JSON warnings.
pub fn load_warnings(report: &LoadReport) -> Vec<JsonWarning> {
    report
        .warnings
        .iter()
        .map(|w| JsonWarning::new(warning_codes::LOAD, w.clone()))
        .collect()
}

/// BLAKE3 hash of the PCM data `buffer` would be written with.
pub fn pcm_hash(buffer: &AudioBuffer, format: SampleFormat) -> Result<String> {
    let pcm = encode_samples(buffer, 0, buffer.frames(), format)?;
    Ok(blake3::hash(&pcm).to_hex().to_string())
}

/// BLAKE3 hash of the data chunk of an encoded WAV blob.
pub fn wav_pcm_hash(wav: &[u8]) -> String {
    let data = wav.get(seamloop_engine::codec::HEADER_LEN..).unwrap_or(&[]);
    blake3::hash(data).to_hex().to_string()
}

/// Frames and formatted times for a candidate.
pub fn loop_report(buffer: &AudioBuffer, candidate: LoopCandidate) -> LoopReport {
    LoopReport {
        begin: candidate.begin,
        end: candidate.end,
        begin_time: buffer.format_time(buffer.frame_to_seconds(candidate.begin)),
        end_time: buffer.format_time(buffer.frame_to_seconds(candidate.end)),
        length: candidate.length(),
    }
}

/// Progress callback that redraws a percentage on stderr.
///
/// Silent in JSON mode so stdout/stderr stay machine-friendly.
pub fn progress_printer(label: &'static str, enabled: bool) -> impl FnMut(SearchProgress) {
    move |progress: SearchProgress| {
        if !enabled {
            return;
        }
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\r  {} {:>5.1}%",
            label,
            progress.fraction() * 100.0
        );
        let _ = stderr.flush();
    }
}

/// Clears the progress line left by [`progress_printer`].
pub fn finish_progress(enabled: bool) {
    if enabled {
        eprint!("\r{:40}\r", "");
    }
}

/// `<dir>/<stem><suffix>.wav`, where `dir` defaults to the input's parent.
pub fn output_path(input: &str, out_dir: Option<&str>, suffix: &str) -> PathBuf {
    let input = Path::new(input);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = match out_dir {
        Some(dir) => PathBuf::from(dir),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    dir.join(format!("{}{}.wav", stem, suffix))
}

/// Writes `bytes` to `path`, creating the parent directory if needed.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                CliError::FileWrite(format!("{}: {}", parent.display(), e))
            })?;
        }
    }
    fs::write(path, bytes).map_err(|e| CliError::FileWrite(format!("{}: {}", path.display(), e)))?;
    log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
