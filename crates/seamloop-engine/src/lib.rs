//! Seamloop Engine
//!
//! Loop point detection for recorded audio samples, with a bit-accurate WAV
//! codec underneath.
//!
//! # Overview
//!
//! Given a sample and a candidate loop begin, the engine finds the frame
//! farther along that best continues from it, then slides a loop of that
//! length to the start offset with the smoothest splice:
//!
//! - **Stage A** ([`search::tail`]) - windowed SSE scan for the loop end, with
//!   threshold pruning
//! - **Stage B** ([`search::offset`]) - weighted tap comparison for the loop
//!   begin at a fixed length
//! - **Snap** ([`search::snap`]) - refines a hand-picked point to the nearest
//!   local minimum of either error curve
//!
//! # Bit accuracy
//!
//! Decoding 16/24-bit PCM and 32-bit float and re-encoding in the same
//! format reproduces the `data` chunk byte for byte. Audio from a generic
//! decoder is tagged with an inferred format so exports land on the same
//! quantization grid as the source.
//!
//! # Example
//!
//! ```ignore
//! use seamloop_engine::{CancelToken, HoundDecoder, LoopSession};
//!
//! let mut session = LoopSession::default();
//! session.load(&std::fs::read("pad.wav")?, Some(&HoundDecoder))?;
//!
//! let cancel = CancelToken::new();
//! let tail = session.find_loop_end(44100, &cancel, |_| {})?;
//! let offset = session.find_loop_begin(tail.candidate, &cancel, |_| {})?;
//!
//! let split = session.export_split(offset.candidate)?;
//! ```
//!
//! # Crate Structure
//!
//! - [`buffer`] - De-interleaved audio buffer
//! - [`codec`] - WAV decode/encode and format inference
//! - [`decoder`] - Load pipeline with a pluggable fallback decoder
//! - [`mixdown`] - Mono mixdown and block decimation
//! - [`search`] - Stage A, Stage B, snapping and scan scheduling
//! - [`session`] - Buffer ownership, single in-flight search, result caching
//! - [`export`] - Head/loop/tail split
//! - [`overview`] - Plot data for renderers

pub mod buffer;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod export;
pub mod mixdown;
pub mod overview;
pub mod search;
pub mod session;

// Re-export main types at crate root
pub use buffer::AudioBuffer;
pub use codec::{FormatSource, SampleFormat};
pub use decoder::{load_audio, FallbackDecoder, HoundDecoder, LoadedAudio, RawAudio};
pub use error::{DecodeError, EngineError, EngineResult};
pub use export::{encode_full, split_loop, LoopSplit, SplitPart};
pub use mixdown::{decimate, mix, Decimation, MonoTrack};
pub use overview::{curve_levels_db, WaveformOverview, DEFAULT_DECIMATION_RATIO};
pub use search::{
    CancelToken, ErrorCurve, LoopCandidate, OffsetSearchResult, SearchConfig, SearchProgress,
    TailSearchResult,
};
pub use session::{LoadReport, LoopSession, SearchOutcome, SearchPoll};
