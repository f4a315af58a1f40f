//! RIFF/WAVE parsing into an [`AudioBuffer`].

use crate::buffer::AudioBuffer;
use crate::error::DecodeError;

use super::format::{SampleFormat, FORMAT_TAG_IEEE_FLOAT, FORMAT_TAG_PCM};

/// A successfully parsed container.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWav {
    /// De-interleaved, normalized samples.
    pub buffer: AudioBuffer,
    /// Quantization convention read from the header.
    pub format: SampleFormat,
}

/// Stream parameters from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, Default)]
struct FmtChunk {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

impl FmtChunk {
    fn sample_format(&self) -> Option<SampleFormat> {
        match (self.format_tag, self.bits_per_sample) {
            (FORMAT_TAG_PCM, 16) => Some(SampleFormat::Int16),
            (FORMAT_TAG_PCM, 24) => Some(SampleFormat::Int24),
            (FORMAT_TAG_IEEE_FLOAT, 32) => Some(SampleFormat::Float32),
            _ => None,
        }
    }
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn chunk_name(id: &[u8]) -> String {
    id.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}

/// Decodes a RIFF/WAVE byte blob.
///
/// Chunks are walked in order without pad-byte alignment. The first `data`
/// chunk ends the walk; it must be preceded by a valid `fmt ` chunk.
/// Supported encodings are 16-bit PCM, 24-bit PCM and 32-bit IEEE float.
pub fn decode(bytes: &[u8]) -> Result<DecodedWav, DecodeError> {
    if bytes.len() < 4 || &bytes[0..4] != b"RIFF" {
        return Err(DecodeError::MissingRiffTag);
    }
    if bytes.len() < 12 || &bytes[8..12] != b"WAVE" {
        return Err(DecodeError::MissingWaveTag);
    }

    let mut fmt = FmtChunk::default();
    let mut cur = 12;

    loop {
        if cur + 8 > bytes.len() {
            return Err(DecodeError::MissingDataChunk);
        }
        let id = &bytes[cur..cur + 4];
        let size = read_u32(bytes, cur + 4) as usize;
        let payload_start = cur + 8;
        if size > bytes.len() - payload_start {
            return Err(DecodeError::TruncatedChunk {
                id: chunk_name(id),
                offset: cur,
                size,
                len: bytes.len(),
            });
        }

        if id == b"fmt " {
            if size < 16 {
                return Err(DecodeError::ShortFmtChunk { size });
            }
            fmt = FmtChunk {
                format_tag: read_u16(bytes, cur + 8),
                channels: read_u16(bytes, cur + 10),
                sample_rate: read_u32(bytes, cur + 12),
                bits_per_sample: read_u16(bytes, cur + 22),
            };
        }

        if id == b"data" {
            if fmt.channels == 0 || fmt.sample_rate == 0 {
                return Err(DecodeError::InvalidStream {
                    channels: fmt.channels,
                    sample_rate: fmt.sample_rate,
                });
            }
            let format = fmt
                .sample_format()
                .ok_or(DecodeError::UnsupportedEncoding {
                    format_tag: fmt.format_tag,
                    bits_per_sample: fmt.bits_per_sample,
                })?;
            let payload = &bytes[payload_start..payload_start + size];
            let buffer = AudioBuffer::from_validated(
                fmt.sample_rate,
                deinterleave(payload, fmt.channels as usize, format),
            );
            log::debug!(
                "decoded {} ch x {} frames at {} Hz as {}",
                buffer.channel_count(),
                buffer.frames(),
                buffer.sample_rate(),
                format
            );
            return Ok(DecodedWav { buffer, format });
        }

        cur = payload_start + size;
    }
}

/// Splits interleaved frames into per-channel normalized samples.
///
/// A trailing partial frame is ignored.
fn deinterleave(payload: &[u8], channels: usize, format: SampleFormat) -> Vec<Vec<f32>> {
    let bytes_per_sample = format.bytes_per_sample();
    let block = channels * bytes_per_sample;
    let frames = payload.len() / block;
    let mut out = vec![Vec::with_capacity(frames); channels];

    for frame in payload.chunks_exact(block) {
        for (channel, raw) in out.iter_mut().zip(frame.chunks_exact(bytes_per_sample)) {
            channel.push(decode_sample(raw, format));
        }
    }

    out
}

fn decode_sample(raw: &[u8], format: SampleFormat) -> f32 {
    match format {
        SampleFormat::Int16 | SampleFormat::Int16Asymmetric => {
            i16::from_le_bytes([raw[0], raw[1]]) as f32 / 32768.0
        }
        SampleFormat::Int24 => {
            let sign = if raw[2] & 0x80 != 0 { 0xFF } else { 0x00 };
            i32::from_le_bytes([raw[0], raw[1], raw[2], sign]) as f32 / 8_388_608.0
        }
        SampleFormat::Float32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
    }
}
