//! Find command implementation
//!
//! Runs Stage A from the requested begin, then Stage B for the resulting
//! loop length, and reports both candidates.

use anyhow::{Context, Result};
use colored::Colorize;
use seamloop_engine::{CancelToken, EngineError, ErrorCurve, LoopCandidate, LoopSession};
use std::process::ExitCode;

use super::common::{
    finish_progress, load_session, load_warnings, loop_report, progress_printer, ConfigArgs,
    FramePosition,
};
use super::json_output::{emit, warning_codes, FindResult, JsonWarning, StageReport};

/// Outcome of both search stages on a loaded session.
pub(crate) struct TwoStage {
    pub begin: usize,
    pub tail: StageReport,
    pub offset: StageReport,
    pub warnings: Vec<JsonWarning>,
}

/// Run the find command
///
/// # Arguments
/// * `input` - Path to the audio file
/// * `begin` - Requested loop begin
/// * `config` - Search settings
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    input: &str,
    begin: FramePosition,
    config: &ConfigArgs,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        emit(find(input, begin, config, false), input)
    } else {
        run_human(input, begin, config)
    }
}

fn find(
    input: &str,
    begin: FramePosition,
    config: &ConfigArgs,
    show_progress: bool,
) -> Result<(FindResult, Vec<JsonWarning>)> {
    let (mut session, report) = load_session(input, config.resolve()?)?;
    let stages = run_stages(&mut session, begin, show_progress)?;

    let mut warnings = load_warnings(&report);
    warnings.extend(stages.warnings);
    let result = FindResult {
        file: input.to_string(),
        begin: stages.begin,
        tail: stages.tail,
        offset: stages.offset,
    };
    Ok((result, warnings))
}

/// Clamps `begin`, then runs Stage A and Stage B to completion.
pub(crate) fn run_stages(
    session: &mut LoopSession,
    begin: FramePosition,
    show_progress: bool,
) -> Result<TwoStage> {
    let requested = begin.resolve(session.buffer().ok_or(EngineError::NoAudio)?);
    let begin = session.clamp_loop_begin(requested)?;
    if begin != requested {
        log::info!("loop begin {} clamped to {}", requested, begin);
    }

    let cancel = CancelToken::new();
    let tail = session
        .find_loop_end(begin, &cancel, progress_printer("loop end  ", show_progress))
        .context("searching for the loop end")?;
    finish_progress(show_progress);

    let mut warnings = Vec::new();
    if let Err(err) = tail.check() {
        warnings.push(JsonWarning::new(
            warning_codes::DEGENERATE_SEARCH,
            err.to_string(),
        ));
    }

    let offset = session
        .find_loop_begin(
            tail.candidate,
            &cancel,
            progress_printer("loop begin", show_progress),
        )
        .context("searching for the loop begin")?;
    finish_progress(show_progress);

    let buffer = session.buffer().ok_or(EngineError::NoAudio)?;
    Ok(TwoStage {
        begin,
        tail: stage_report(buffer, tail.candidate, tail.score, &tail.curve),
        offset: stage_report(buffer, offset.candidate, offset.score, &offset.curve),
        warnings,
    })
}

fn stage_report(
    buffer: &seamloop_engine::AudioBuffer,
    candidate: LoopCandidate,
    score: Option<f32>,
    curve: &ErrorCurve,
) -> StageReport {
    StageReport {
        candidate: loop_report(buffer, candidate),
        score,
        candidates: curve.len(),
    }
}

/// Run find with human-readable (colored) output
fn run_human(input: &str, begin: FramePosition, config: &ConfigArgs) -> Result<ExitCode> {
    println!("{} {}", "Searching:".cyan().bold(), input);
    let (result, warnings) = find(input, begin, config, true)?;

    println!("  {} {}", "Begin:".dimmed(), result.begin);
    print_stage("Stage A (loop end):", &result.tail);
    print_stage("Stage B (loop begin):", &result.offset);
    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.message);
    }

    let best = &result.offset.candidate;
    println!(
        "\n{} {}..{} ({} frames)",
        "Loop:".green().bold(),
        best.begin,
        best.end,
        best.length
    );
    Ok(ExitCode::SUCCESS)
}

fn print_stage(title: &str, stage: &StageReport) {
    let c = &stage.candidate;
    println!("\n{}", title.cyan().bold());
    println!(
        "  {} {} .. {} ({} s .. {} s)",
        "Loop:".dimmed(),
        c.begin,
        c.end,
        c.begin_time,
        c.end_time
    );
    println!("  {} {} frames", "Length:".dimmed(), c.length);
    match stage.score {
        Some(score) => println!("  {} {:.6e}", "Score:".dimmed(), score),
        None => println!("  {} {}", "Score:".dimmed(), "none".yellow()),
    }
    println!("  {} {}", "Candidates:".dimmed(), stage.candidates);
}
