//! Split command implementation
//!
//! Writes the head, loop and tail of a chosen loop as separate WAV files
//! next to the input (or into `--output`).

use anyhow::Result;
use colored::Colorize;
use seamloop_engine::{
    encode_full, split_loop, EngineError, LoopCandidate, SampleFormat, SearchConfig,
};
use std::process::ExitCode;

use super::common::{
    load_session, load_warnings, output_path, wav_pcm_hash, write_output, FramePosition,
};
use super::json_output::{emit, CliError, ExportResult, JsonWarning, WrittenFile};

/// Options for the split command.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Loop begin
    pub begin: FramePosition,
    /// Loop end (exclusive)
    pub end: FramePosition,
    /// Output directory; defaults to the input's directory
    pub out_dir: Option<String>,
    /// Format override; defaults to the source format
    pub format: Option<SampleFormat>,
    /// Also write a full-range re-encode as `<stem>_test.wav`
    pub with_test: bool,
}

/// Run the split command
///
/// # Arguments
/// * `input` - Path to the audio file
/// * `options` - Loop points and output settings
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(input: &str, options: &SplitOptions, json_output: bool) -> Result<ExitCode> {
    if json_output {
        emit(split(input, options), input)
    } else {
        run_human(input, options)
    }
}

fn split(input: &str, options: &SplitOptions) -> Result<(ExportResult, Vec<JsonWarning>)> {
    let (session, report) = load_session(input, SearchConfig::default())?;
    let buffer = session.buffer().ok_or(EngineError::NoAudio)?;
    let frames = buffer.frames();

    let begin = options.begin.resolve(buffer);
    let end = options.end.resolve(buffer);
    let candidate = LoopCandidate::new(begin, end, frames).map_err(|_| {
        CliError::InvalidArgument(format!(
            "loop {}..{} must satisfy begin < end <= {}",
            begin, end, frames
        ))
    })?;
    let format = options.format.unwrap_or(report.format);

    let parts = split_loop(buffer, candidate, format)?;
    let mut outputs = Vec::new();
    for (part, bytes) in parts.parts() {
        let path = output_path(input, options.out_dir.as_deref(), part.suffix());
        write_output(&path, bytes)?;
        outputs.push(WrittenFile {
            part: part.to_string(),
            path: path.display().to_string(),
            bytes: bytes.len(),
            pcm_hash: wav_pcm_hash(bytes),
        });
    }

    if options.with_test {
        let bytes = encode_full(buffer, format)?;
        let path = output_path(input, options.out_dir.as_deref(), "_test");
        write_output(&path, &bytes)?;
        outputs.push(WrittenFile {
            part: "test".to_string(),
            path: path.display().to_string(),
            bytes: bytes.len(),
            pcm_hash: wav_pcm_hash(&bytes),
        });
    }

    let result = ExportResult {
        file: input.to_string(),
        format,
        candidate: Some(candidate),
        outputs,
    };
    Ok((result, load_warnings(&report)))
}

/// Run split with human-readable (colored) output
fn run_human(input: &str, options: &SplitOptions) -> Result<ExitCode> {
    let (result, warnings) = split(input, options)?;

    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.message);
    }
    if let Some(c) = result.candidate {
        println!(
            "{} {} loop {}..{} as {}",
            "Split:".cyan().bold(),
            input,
            c.begin,
            c.end,
            result.format
        );
    }
    for out in &result.outputs {
        println!(
            "  {} {} {}",
            format!("{:>4}", out.part).green(),
            out.path,
            format!("({} bytes, {})", out.bytes, &out.pcm_hash[..16]).dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::test_support::write_sawtooth;
    use pretty_assertions::assert_eq;
    use seamloop_engine::codec::decode;

    fn options(begin: usize, end: usize, out_dir: Option<String>) -> SplitOptions {
        SplitOptions {
            begin: FramePosition::Frames(begin),
            end: FramePosition::Frames(end),
            out_dir,
            format: None,
            with_test: false,
        }
    }

    #[test]
    fn test_split_writes_three_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sawtooth(dir.path(), "pad.wav", 1000);

        let (result, _) = split(&path.to_string_lossy(), &options(120, 170, None)).unwrap();
        let parts: Vec<&str> = result.outputs.iter().map(|o| o.part.as_str()).collect();
        assert_eq!(parts, vec!["head", "loop", "tail"]);

        let frames: Vec<usize> = ["pad_head.wav", "pad_loop.wav", "pad_tail.wav"]
            .iter()
            .map(|name| {
                let bytes = std::fs::read(dir.path().join(name)).unwrap();
                decode(&bytes).unwrap().buffer.frames()
            })
            .collect();
        assert_eq!(frames, vec![120, 50, 830]);
    }

    #[test]
    fn test_split_omits_empty_head_and_writes_test_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sawtooth(dir.path(), "pad.wav", 300);
        let out = dir.path().join("out");

        let mut opts = options(0, 100, Some(out.to_string_lossy().into_owned()));
        opts.with_test = true;
        opts.format = Some(SampleFormat::Int24);
        let (result, _) = split(&path.to_string_lossy(), &opts).unwrap();

        let parts: Vec<&str> = result.outputs.iter().map(|o| o.part.as_str()).collect();
        assert_eq!(parts, vec!["loop", "tail", "test"]);
        assert_eq!(result.format, SampleFormat::Int24);
        assert!(!out.join("pad_head.wav").exists());

        let test = decode(&std::fs::read(out.join("pad_test.wav")).unwrap()).unwrap();
        assert_eq!(test.format, SampleFormat::Int24);
        assert_eq!(test.buffer.frames(), 300);
    }

    #[test]
    fn test_split_rejects_inverted_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sawtooth(dir.path(), "pad.wav", 300);

        let err = split(&path.to_string_lossy(), &options(200, 100, None)).unwrap_err();
        let cli = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli.code(), "CLI_003");
    }
}
