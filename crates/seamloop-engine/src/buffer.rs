//! Decoded multi-channel audio.

use crate::error::{EngineError, EngineResult};

/// A fully materialized, de-interleaved audio buffer.
///
/// Samples are IEEE single precision, nominally in `[-1.0, 1.0]`. The buffer is
/// immutable once built; a session replaces it wholesale rather than editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    frames: usize,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Builds a buffer from per-channel sample vectors.
    ///
    /// Fails if there are no channels, the sample rate is zero, or the channels
    /// differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> EngineResult<Self> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidBuffer {
                message: "sample rate must be non-zero".to_string(),
            });
        }
        let frames = match channels.first() {
            Some(first) => first.len(),
            None => {
                return Err(EngineError::InvalidBuffer {
                    message: "at least one channel is required".to_string(),
                })
            }
        };
        if let Some((index, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frames)
        {
            return Err(EngineError::InvalidBuffer {
                message: format!(
                    "channel {} has {} frames, expected {}",
                    index,
                    ch.len(),
                    frames
                ),
            });
        }

        Ok(Self {
            sample_rate,
            frames,
            channels,
        })
    }

    /// Builds a buffer whose invariants the caller has already checked.
    pub(crate) fn from_validated(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        debug_assert!(sample_rate > 0 && !channels.is_empty());
        let frames = channels.first().map_or(0, Vec::len);
        Self {
            sample_rate,
            frames,
            channels,
        }
    }

    /// Builds a silent buffer.
    pub fn silent(channel_count: usize, frames: usize, sample_rate: u32) -> EngineResult<Self> {
        Self::new(sample_rate, vec![vec![0.0; frames]; channel_count])
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples of one channel. Panics if `index` is out of range.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Iterates over all channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Whether the buffer holds zero frames.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Converts a time in seconds to the nearest frame index.
    pub fn seconds_to_frame(&self, seconds: f64) -> usize {
        let frame = (seconds * self.sample_rate as f64).round();
        if frame <= 0.0 {
            0
        } else {
            frame as usize
        }
    }

    /// Converts a frame index to seconds.
    pub fn frame_to_seconds(&self, frame: usize) -> f64 {
        frame as f64 / self.sample_rate as f64
    }

    /// Formats a time with enough decimals to address single frames.
    pub fn format_time(&self, seconds: f64) -> String {
        let decimals = (self.sample_rate as f64).log10().floor() as usize + 2;
        format!("{:.*}", decimals, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_channel_list() {
        let err = AudioBuffer::new(44100, vec![]).unwrap_err();
        assert!(err.to_string().contains("at least one channel"));
    }

    #[test]
    fn test_new_rejects_zero_rate() {
        assert!(AudioBuffer::new(0, vec![vec![0.0; 4]]).is_err());
    }

    #[test]
    fn test_new_rejects_ragged_channels() {
        let err = AudioBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(err.to_string().contains("channel 1"));
    }

    #[test]
    fn test_accessors() {
        let buffer = AudioBuffer::new(48000, vec![vec![0.25; 480], vec![-0.25; 480]]).unwrap();
        assert_eq!(buffer.sample_rate(), 48000);
        assert_eq!(buffer.frames(), 480);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.channel(1)[0], -0.25);
        assert!((buffer.duration_seconds() - 0.01).abs() < 1e-12);
        assert_eq!(buffer.channels().count(), 2);
    }

    #[test]
    fn test_zero_frames_is_allowed() {
        let buffer = AudioBuffer::silent(1, 0, 8000).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_time_conversion_rounds_to_nearest_frame() {
        let buffer = AudioBuffer::silent(1, 10, 44100).unwrap();
        assert_eq!(buffer.seconds_to_frame(1.0), 44100);
        assert_eq!(buffer.seconds_to_frame(0.5 / 44100.0 + 1e-9), 1);
        assert_eq!(buffer.seconds_to_frame(-3.0), 0);
        assert_eq!(buffer.format_time(1.5), "1.500000");
    }
}
