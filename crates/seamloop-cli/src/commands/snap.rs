//! Snap command implementation
//!
//! Runs the search stage a hand-picked point belongs to, then moves the
//! point to the nearest local minimum of that stage's error curve.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use seamloop_engine::{CancelToken, EngineError, LoopSession};
use std::process::ExitCode;

use super::common::{
    finish_progress, load_session, load_warnings, loop_report, progress_printer, ConfigArgs,
    FramePosition,
};
use super::find::run_stages;
use super::json_output::{emit, JsonWarning, SnapResult};

/// Which error curve the cursor is snapped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapStage {
    /// Cursor is a loop end; snap on the Stage A curve
    Tail,
    /// Cursor is a loop begin; snap on the Stage B curve
    Offset,
}

impl SnapStage {
    fn as_str(self) -> &'static str {
        match self {
            SnapStage::Tail => "tail",
            SnapStage::Offset => "offset",
        }
    }
}

/// Run the snap command
///
/// # Arguments
/// * `input` - Path to the audio file
/// * `begin` - Loop begin the searches start from
/// * `cursor` - Point to refine
/// * `stage` - Curve to snap against
/// * `config` - Search settings
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    input: &str,
    begin: FramePosition,
    cursor: FramePosition,
    stage: SnapStage,
    config: &ConfigArgs,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        emit(snap(input, begin, cursor, stage, config, false), input)
    } else {
        run_human(input, begin, cursor, stage, config)
    }
}

fn snap(
    input: &str,
    begin: FramePosition,
    cursor: FramePosition,
    stage: SnapStage,
    config: &ConfigArgs,
    show_progress: bool,
) -> Result<(SnapResult, Vec<JsonWarning>)> {
    let (mut session, report) = load_session(input, config.resolve()?)?;
    let (cursor, begin_frame) = {
        let buffer = session.buffer().ok_or(EngineError::NoAudio)?;
        (cursor.resolve(buffer), begin.resolve(buffer))
    };

    let mut warnings = load_warnings(&report);
    let candidate = match stage {
        SnapStage::Tail => {
            run_tail(&mut session, begin_frame, show_progress)?;
            session.snap_loop_end(cursor)?
        }
        SnapStage::Offset => {
            let stages = run_stages(&mut session, begin, show_progress)?;
            warnings.extend(stages.warnings);
            session.snap_loop_begin(cursor)?
        }
    };
    log::debug!(
        "snapped {} cursor {} to {}..{}",
        stage.as_str(),
        cursor,
        candidate.begin,
        candidate.end
    );

    let buffer = session.buffer().ok_or(EngineError::NoAudio)?;
    let result = SnapResult {
        file: input.to_string(),
        stage: stage.as_str().to_string(),
        cursor,
        candidate: loop_report(buffer, candidate),
    };
    Ok((result, warnings))
}

fn run_tail(session: &mut LoopSession, begin: usize, show_progress: bool) -> Result<()> {
    let begin = session.clamp_loop_begin(begin)?;
    let tail = session
        .find_loop_end(
            begin,
            &CancelToken::new(),
            progress_printer("loop end  ", show_progress),
        )
        .context("searching for the loop end")?;
    finish_progress(show_progress);
    log::info!("loop end {} for begin {}", tail.candidate.end, begin);
    Ok(())
}

/// Run snap with human-readable (colored) output
fn run_human(
    input: &str,
    begin: FramePosition,
    cursor: FramePosition,
    stage: SnapStage,
    config: &ConfigArgs,
) -> Result<ExitCode> {
    println!(
        "{} {} ({} curve)",
        "Snapping:".cyan().bold(),
        input,
        stage.as_str()
    );
    let (result, warnings) = snap(input, begin, cursor, stage, config, true)?;

    let c = &result.candidate;
    println!("  {} {}", "Cursor:".dimmed(), result.cursor);
    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.message);
    }
    println!(
        "{} {}..{} ({} frames, {} s .. {} s)",
        "Loop:".green().bold(),
        c.begin,
        c.end,
        c.length,
        c.begin_time,
        c.end_time
    );
    Ok(ExitCode::SUCCESS)
}
