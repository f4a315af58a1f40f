//! Info command implementation
//!
//! Decodes a file (falling back to hound) and prints its layout, the format
//! exports will use, and a fingerprint of the PCM data.

use anyhow::Result;
use colored::Colorize;
use seamloop_engine::{FormatSource, SearchConfig};
use std::process::ExitCode;

use super::common::{load_session, load_warnings, pcm_hash};
use super::json_output::{emit, InfoResult, JsonWarning};

/// Run the info command
///
/// # Arguments
/// * `input` - Path to the audio file
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(input: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        emit(inspect(input), input)
    } else {
        run_human(input)
    }
}

fn inspect(input: &str) -> Result<(InfoResult, Vec<JsonWarning>)> {
    let (session, report) = load_session(input, SearchConfig::default())?;
    let buffer = session
        .buffer()
        .ok_or(seamloop_engine::EngineError::NoAudio)?;

    let result = InfoResult {
        file: input.to_string(),
        channels: report.channels,
        sample_rate: report.sample_rate,
        frames: report.frames,
        duration: buffer.format_time(buffer.duration_seconds()),
        format: report.format,
        format_source: report.source,
        decoder: report.decoder.clone(),
        pcm_hash: pcm_hash(buffer, report.format)?,
    };
    Ok((result, load_warnings(&report)))
}

/// Run info with human-readable (colored) output
fn run_human(input: &str) -> Result<ExitCode> {
    let (info, warnings) = inspect(input)?;

    println!("{} {}", "Audio:".cyan().bold(), info.file);
    println!("  {} {}", "Channels:".dimmed(), info.channels);
    println!("  {} {} Hz", "Sample rate:".dimmed(), info.sample_rate);
    println!(
        "  {} {} frames ({} s)",
        "Length:".dimmed(),
        info.frames,
        info.duration
    );
    let source = match info.format_source {
        FormatSource::Parsed => "parsed".green(),
        FormatSource::Inferred => "inferred".yellow(),
    };
    println!(
        "  {} {} ({}, {})",
        "Format:".dimmed(),
        info.format,
        info.format.description(),
        source
    );
    println!("  {} {}", "Decoder:".dimmed(), info.decoder);
    println!("  {} {}", "PCM hash:".dimmed(), &info.pcm_hash[..16]);

    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.message);
    }

    Ok(ExitCode::SUCCESS)
}
