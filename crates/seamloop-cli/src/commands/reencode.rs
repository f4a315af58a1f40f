//! Reencode command implementation
//!
//! Writes the whole input back out, by default in the format it was read
//! (or inferred) as. For parsed 16/24-bit and float input the data chunk
//! comes out byte-identical.

use anyhow::Result;
use colored::Colorize;
use seamloop_engine::{encode_full, EngineError, SampleFormat, SearchConfig};
use std::path::PathBuf;
use std::process::ExitCode;

use super::common::{load_session, load_warnings, output_path, wav_pcm_hash, write_output};
use super::json_output::{emit, ExportResult, JsonWarning, WrittenFile};

/// Run the reencode command
///
/// # Arguments
/// * `input` - Path to the audio file
/// * `output` - Output path; defaults to `<stem>_test.wav` next to the input
/// * `format` - Format override; defaults to the source format
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    input: &str,
    output: Option<&str>,
    format: Option<SampleFormat>,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        emit(reencode(input, output, format), input)
    } else {
        run_human(input, output, format)
    }
}

fn reencode(
    input: &str,
    output: Option<&str>,
    format: Option<SampleFormat>,
) -> Result<(ExportResult, Vec<JsonWarning>)> {
    let (session, report) = load_session(input, SearchConfig::default())?;
    let buffer = session.buffer().ok_or(EngineError::NoAudio)?;
    let format = format.unwrap_or(report.format);

    let bytes = encode_full(buffer, format)?;
    let path = match output {
        Some(path) => PathBuf::from(path),
        None => output_path(input, None, "_test"),
    };
    write_output(&path, &bytes)?;

    let result = ExportResult {
        file: input.to_string(),
        format,
        candidate: None,
        outputs: vec![WrittenFile {
            part: "test".to_string(),
            path: path.display().to_string(),
            bytes: bytes.len(),
            pcm_hash: wav_pcm_hash(&bytes),
        }],
    };
    Ok((result, load_warnings(&report)))
}

/// Run reencode with human-readable (colored) output
fn run_human(input: &str, output: Option<&str>, format: Option<SampleFormat>) -> Result<ExitCode> {
    let (result, warnings) = reencode(input, output, format)?;

    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.message);
    }
    for out in &result.outputs {
        println!(
            "{} {} -> {} as {}",
            "Re-encoded:".cyan().bold(),
            input,
            out.path,
            result.format
        );
        println!("  {} {}", "PCM hash:".dimmed(), &out.pcm_hash[..16]);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::test_support::write_sawtooth;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reencode_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sawtooth(dir.path(), "pad.wav", 500);

        let (result, warnings) = reencode(&path.to_string_lossy(), None, None).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(result.format, SampleFormat::Int16);

        let original = std::fs::read(&path).unwrap();
        let written = std::fs::read(dir.path().join("pad_test.wav")).unwrap();
        assert!(original == written);
        assert_eq!(result.outputs[0].pcm_hash, wav_pcm_hash(&original));
    }

    #[test]
    fn test_reencode_with_format_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sawtooth(dir.path(), "pad.wav", 500);
        let out = dir.path().join("pad_f32.wav");

        let (result, _) = reencode(
            &path.to_string_lossy(),
            Some(&out.to_string_lossy()),
            Some(SampleFormat::Float32),
        )
        .unwrap();
        assert_eq!(result.format, SampleFormat::Float32);
        assert_eq!(result.outputs[0].bytes, 44 + 500 * 2 * 4);
    }
}
