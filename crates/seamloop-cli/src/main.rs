//! Seamloop CLI - find seamless loop points in recorded samples
//!
//! This binary inspects WAV files, searches for loop points, snaps
//! hand-picked points to nearby minima, and writes head/loop/tail splits.

use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;

use seamloop_cli::commands::{self, snap::SnapStage, split::SplitOptions};
use seamloop_cli::commands::{ConfigArgs, FramePosition};
use seamloop_engine::SampleFormat;

/// Seamloop - loop point detection for audio samples
#[derive(Parser)]
#[command(name = "seamloop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show channels, rate, length, sample format and PCM hash of a file
    Info {
        /// Path to the input WAV file
        #[arg(short, long)]
        input: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Search for the best loop end from a begin, then the best begin for
    /// that length
    Find {
        /// Path to the input WAV file
        #[arg(short, long)]
        input: String,

        /// Loop begin, in frames or seconds (e.g. 44100 or 1.0s)
        #[arg(short, long)]
        begin: FramePosition,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Refine a hand-picked loop point to the nearest local minimum
    Snap {
        /// Path to the input WAV file
        #[arg(short, long)]
        input: String,

        /// Loop begin the search starts from, in frames or seconds
        #[arg(short, long)]
        begin: FramePosition,

        /// Point to refine, in frames or seconds
        #[arg(short, long)]
        cursor: FramePosition,

        /// Curve to snap against: tail moves the loop end, offset the begin
        #[arg(long, value_enum, default_value = "tail")]
        stage: SnapStage,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Write head, loop and tail of a loop as separate WAV files
    Split {
        /// Path to the input WAV file
        #[arg(short, long)]
        input: String,

        /// Loop begin, in frames or seconds
        #[arg(short, long)]
        begin: FramePosition,

        /// Loop end (exclusive), in frames or seconds
        #[arg(short, long)]
        end: FramePosition,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<String>,

        /// Sample format to write (default: the source format)
        #[arg(long)]
        format: Option<SampleFormat>,

        /// Also write a full-range re-encode as <stem>_test.wav
        #[arg(long)]
        with_test: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Re-encode the whole file, by default in its source format
    Reencode {
        /// Path to the input WAV file
        #[arg(short, long)]
        input: String,

        /// Output file (default: <stem>_test.wav next to the input)
        #[arg(short, long)]
        output: Option<String>,

        /// Sample format to write (default: the source format)
        #[arg(long)]
        format: Option<SampleFormat>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Info { input, json } => commands::info::run(&input, json),
        Commands::Find {
            input,
            begin,
            config,
            json,
        } => commands::find::run(&input, begin, &config, json),
        Commands::Snap {
            input,
            begin,
            cursor,
            stage,
            config,
            json,
        } => commands::snap::run(&input, begin, cursor, stage, &config, json),
        Commands::Split {
            input,
            begin,
            end,
            output,
            format,
            with_test,
            json,
        } => {
            let options = SplitOptions {
                begin,
                end,
                out_dir: output,
                format,
                with_test,
            };
            commands::split::run(&input, &options, json)
        }
        Commands::Reencode {
            input,
            output,
            format,
            json,
        } => commands::reencode::run(&input, output.as_deref(), format, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
