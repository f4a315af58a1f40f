//! Load pipeline: direct parse first, generic decoder second.

use std::io::Cursor;

use crate::buffer::AudioBuffer;
use crate::codec::{self, infer_format, FormatSource, SampleFormat};
use crate::error::{EngineError, EngineResult};

/// Per-channel float samples from a generic decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// De-interleaved samples, nominally in `[-1.0, 1.0]`.
    pub channels: Vec<Vec<f32>>,
}

/// A decoder for inputs the built-in RIFF/WAVE parser rejects.
///
/// Its output carries no quantization information; the format is inferred
/// from the samples.
pub trait FallbackDecoder {
    /// Short name used in logs and load reports.
    fn name(&self) -> &str;

    /// Decodes `bytes` into raw float samples.
    fn decode(&self, bytes: &[u8]) -> EngineResult<RawAudio>;
}

/// Fallback backed by the `hound` crate.
///
/// Covers 8/24/32-bit integer PCM, 32-bit float and `WAVE_FORMAT_EXTENSIBLE`
/// headers. Integer samples are scaled by `2^(bits - 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoundDecoder;

impl FallbackDecoder for HoundDecoder {
    fn name(&self) -> &str {
        "hound"
    }

    fn decode(&self, bytes: &[u8]) -> EngineResult<RawAudio> {
        let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(fallback_error)?;
        let spec = reader.spec();
        let channel_count = spec.channels as usize;
        if channel_count == 0 {
            return Err(EngineError::Fallback {
                message: "stream has no channels".to_string(),
            });
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(fallback_error)?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / 2f64.powi(spec.bits_per_sample as i32 - 1);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| (v as f64 * scale) as f32))
                    .collect::<Result<_, _>>()
                    .map_err(fallback_error)?
            }
        };

        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Ok(RawAudio {
            sample_rate: spec.sample_rate,
            channels,
        })
    }
}

fn fallback_error(err: hound::Error) -> EngineError {
    EngineError::Fallback {
        message: err.to_string(),
    }
}

/// A decoded buffer together with how its format was determined.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAudio {
    /// The decoded samples.
    pub buffer: AudioBuffer,
    /// Quantization used for later exports.
    pub format: SampleFormat,
    /// Whether `format` came from the header or from inference.
    pub source: FormatSource,
    /// Name of the decoder that produced `buffer`.
    pub decoder: String,
    /// Human-readable notes about the load.
    pub warnings: Vec<String>,
}

/// Decodes `bytes`, handing them to `fallback` if the direct parser fails.
///
/// Without a fallback, the parser's error is returned as is.
pub fn load_audio(bytes: &[u8], fallback: Option<&dyn FallbackDecoder>) -> EngineResult<LoadedAudio> {
    let parse_error = match codec::decode(bytes) {
        Ok(decoded) => {
            log::info!("parsed WAV header: {}", decoded.format);
            return Ok(LoadedAudio {
                buffer: decoded.buffer,
                format: decoded.format,
                source: FormatSource::Parsed,
                decoder: "riff".to_string(),
                warnings: Vec::new(),
            });
        }
        Err(err) => err,
    };

    let Some(decoder) = fallback else {
        return Err(parse_error.into());
    };

    log::warn!(
        "direct parse failed ({}); trying {} decoder",
        parse_error,
        decoder.name()
    );
    let raw = decoder.decode(bytes).map_err(|err| match err {
        EngineError::Fallback { message } => EngineError::Fallback {
            message: format!("{} (direct parse: {})", message, parse_error),
        },
        other => other,
    })?;
    let buffer = AudioBuffer::new(raw.sample_rate, raw.channels)?;
    let format = infer_format(&buffer);
    log::info!("inferred sample format {} from decoded samples", format);

    let mut warnings = vec![format!("direct parse failed: {}", parse_error)];
    if format == SampleFormat::Float32 {
        warnings.push(
            "samples match no integer grid; treating as float32 (the source may be lossy)"
                .to_string(),
        );
    }

    Ok(LoadedAudio {
        buffer,
        format,
        source: FormatSource::Inferred,
        decoder: decoder.name().to_string(),
        warnings,
    })
}
