//! WAV serialization of buffer sub-ranges.

use std::io::{self, Write};

use crate::buffer::AudioBuffer;
use crate::error::{EngineError, EngineResult};

use super::format::SampleFormat;

/// Size of the fixed RIFF/WAVE/`fmt `/`data` header.
pub const HEADER_LEN: usize = 44;

/// Stream parameters for the 44-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// On-disk sample encoding.
    pub format: SampleFormat,
    /// Frames in the `data` chunk.
    pub frames: usize,
}

impl WavHeader {
    /// Bytes per interleaved frame, or `None` if it overflows the field.
    pub fn block_align(&self) -> Option<u16> {
        self.channels.checked_mul(self.format.bytes_per_sample() as u16)
    }

    /// Bytes per second, or `None` if it overflows the field.
    pub fn byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(u32::from(self.block_align()?))
    }

    /// Size of the `data` chunk payload, or `None` if it does not fit a
    /// RIFF container.
    pub fn data_len(&self) -> Option<u32> {
        let len = usize::from(self.block_align()?).checked_mul(self.frames)?;
        u32::try_from(len)
            .ok()
            .filter(|&len| len <= u32::MAX - (HEADER_LEN as u32 - 8))
    }
}

/// Writes the 44-byte header.
///
/// Fails with `InvalidInput` when a size field overflows.
pub fn write_header<W: Write>(writer: &mut W, header: &WavHeader) -> io::Result<()> {
    let overflow = || io::Error::new(io::ErrorKind::InvalidInput, "WAV header field overflows");
    let block_align = header.block_align().ok_or_else(overflow)?;
    let byte_rate = header.byte_rate().ok_or_else(overflow)?;
    let data_size = header.data_len().ok_or_else(overflow)?;
    let riff_size = (HEADER_LEN as u32 - 8) + data_size;

    // RIFF header
    writer.write_all(b"RIFF")?;
    writer.write_all(&riff_size.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&header.format.format_tag().to_le_bytes())?;
    writer.write_all(&header.channels.to_le_bytes())?;
    writer.write_all(&header.sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&header.format.bits_per_sample().to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;

    Ok(())
}

/// Rounds half away from zero onto a signed integer grid, saturating at the
/// grid's limits.
fn quantize(grid_value: f64, min: i32, max: i32) -> i32 {
    let rounded = grid_value.round();
    if rounded.is_nan() {
        0
    } else {
        rounded.clamp(min as f64, max as f64) as i32
    }
}

/// Appends one encoded sample to `out`.
fn encode_sample(out: &mut Vec<u8>, sample: f32, format: SampleFormat) {
    match format.to_grid(sample) {
        Some(grid) if format == SampleFormat::Int24 => {
            let n = quantize(grid, -0x80_0000, 0x7F_FFFF);
            out.extend_from_slice(&n.to_le_bytes()[..3]);
        }
        Some(grid) => {
            let n = quantize(grid, i16::MIN as i32, i16::MAX as i32) as i16;
            out.extend_from_slice(&n.to_le_bytes());
        }
        None => out.extend_from_slice(&sample.to_le_bytes()),
    }
}

/// Interleaves and encodes `frame_count` frames starting at `frame_offset`.
pub fn encode_samples(
    buffer: &AudioBuffer,
    frame_offset: usize,
    frame_count: usize,
    format: SampleFormat,
) -> EngineResult<Vec<u8>> {
    let end = check_range(buffer, frame_offset, frame_count)?;
    let mut out =
        Vec::with_capacity(frame_count * buffer.channel_count() * format.bytes_per_sample());
    for frame in frame_offset..end {
        for channel in buffer.channels() {
            encode_sample(&mut out, channel[frame], format);
        }
    }
    Ok(out)
}

/// Streams a complete WAV file for a sub-range of `buffer` to `writer`.
pub fn write_wav<W: Write>(
    writer: &mut W,
    buffer: &AudioBuffer,
    frame_offset: usize,
    frame_count: usize,
    format: SampleFormat,
) -> EngineResult<()> {
    let header = header_for(buffer, frame_count, format)?;
    let pcm = encode_samples(buffer, frame_offset, frame_count, format)?;
    write_header(writer, &header)?;
    writer.write_all(&pcm)?;
    Ok(())
}

/// Encodes a sub-range of `buffer` as a complete WAV byte blob.
///
/// The header is the minimal 44-byte layout; the format tag is 3 for
/// `Float32` and 1 otherwise. Integer formats round half away from zero.
pub fn encode(
    buffer: &AudioBuffer,
    frame_offset: usize,
    frame_count: usize,
    format: SampleFormat,
) -> EngineResult<Vec<u8>> {
    let header = header_for(buffer, frame_count, format)?;
    let pcm = encode_samples(buffer, frame_offset, frame_count, format)?;
    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    write_header(&mut out, &header)?;
    out.extend_from_slice(&pcm);
    Ok(out)
}

/// Like [`encode`], with the format given by name.
///
/// An unrecognized name is an encode failure.
pub fn encode_named(
    buffer: &AudioBuffer,
    frame_offset: usize,
    frame_count: usize,
    format_name: &str,
) -> EngineResult<Vec<u8>> {
    let format: SampleFormat = format_name.parse()?;
    encode(buffer, frame_offset, frame_count, format)
}

fn header_for(
    buffer: &AudioBuffer,
    frame_count: usize,
    format: SampleFormat,
) -> EngineResult<WavHeader> {
    let channels = u16::try_from(buffer.channel_count()).map_err(|_| EngineError::InvalidBuffer {
        message: format!("{} channels do not fit a WAV header", buffer.channel_count()),
    })?;
    let header = WavHeader {
        channels,
        sample_rate: buffer.sample_rate(),
        format,
        frames: frame_count,
    };
    let too_large = |what: String| EngineError::InvalidBuffer {
        message: format!("{} do not fit a WAV header", what),
    };
    if header.block_align().is_none() {
        return Err(too_large(format!("{} channels of {}", channels, format)));
    }
    if header.byte_rate().is_none() {
        return Err(too_large(format!(
            "{} Hz with {} channels of {}",
            header.sample_rate, channels, format
        )));
    }
    if header.data_len().is_none() {
        return Err(too_large(format!(
            "{} frames of {} channels of {}",
            frame_count, channels, format
        )));
    }
    Ok(header)
}

fn check_range(buffer: &AudioBuffer, frame_offset: usize, frame_count: usize) -> EngineResult<usize> {
    match frame_offset.checked_add(frame_count) {
        Some(end) if end <= buffer.frames() => Ok(end),
        _ => Err(EngineError::InvalidRange {
            offset: frame_offset,
            end: frame_offset.saturating_add(frame_count),
            frames: buffer.frames(),
        }),
    }
}
