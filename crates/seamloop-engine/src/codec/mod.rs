//! Sample format codec.
//!
//! Parses RIFF/WAVE containers into [`AudioBuffer`](crate::AudioBuffer)s,
//! serializes buffer sub-ranges back to WAV, and infers the quantization
//! convention of samples produced by a generic decoder.

mod decode;
mod encode;
mod format;
mod infer;


// Re-export public API
pub use decode::{decode, DecodedWav};
pub use encode::{
    encode, encode_named, encode_samples, write_header, write_wav, WavHeader, HEADER_LEN,
};
pub use format::{FormatSource, SampleFormat, FORMAT_TAG_IEEE_FLOAT, FORMAT_TAG_PCM};
pub use infer::{infer_format, max_grid_error, INFERENCE_THRESHOLD};
