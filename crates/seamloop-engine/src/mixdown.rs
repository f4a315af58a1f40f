//! Channel mixdown and block decimation.
//!
//! The mono track is the analysis input of every search stage. Decimation
//! reduces long sequences (waveforms, error curves) to plot resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::AudioBuffer;
use crate::error::EngineError;

/// Single analysis channel derived from an [`AudioBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonoTrack {
    samples: Vec<f32>,
}

impl MonoTrack {
    /// Wraps already-mixed samples.
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// The mixed samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the track is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Averages all channels of `buffer` into one.
///
/// Channels are summed per frame first and scaled by `1 / channels` once at
/// the end.
pub fn mix(buffer: &AudioBuffer) -> MonoTrack {
    let mut mixed = vec![0.0f32; buffer.frames()];
    for channel in buffer.channels() {
        for (acc, &sample) in mixed.iter_mut().zip(channel) {
            *acc += sample;
        }
    }

    let k = 1.0 / buffer.channel_count() as f32;
    for sample in &mut mixed {
        *sample *= k;
    }

    MonoTrack::from_samples(mixed)
}

/// Block reduction applied by [`decimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decimation {
    /// Largest value in each block.
    Max,
    /// Smallest value in each block.
    Min,
    /// Arithmetic mean of each block.
    Average,
}

impl fmt::Display for Decimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decimation::Max => "max",
            Decimation::Min => "min",
            Decimation::Average => "average",
        })
    }
}

impl FromStr for Decimation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Decimation::Max),
            "min" => Ok(Decimation::Min),
            "average" | "avg" => Ok(Decimation::Average),
            other => Err(EngineError::invalid_config(
                "decimation",
                format!("unknown method '{}'", other),
            )),
        }
    }
}

/// Reduces `data` by `ratio`, one output value per complete block.
///
/// The output has `data.len() / ratio` elements; a trailing partial block is
/// dropped. A ratio of 0 is treated as 1.
pub fn decimate(method: Decimation, ratio: usize, data: &[f32]) -> Vec<f32> {
    let ratio = ratio.max(1);
    data.chunks_exact(ratio)
        .map(|block| match method {
            Decimation::Average => {
                let sum: f64 = block.iter().map(|&v| v as f64).sum();
                (sum / ratio as f64) as f32
            }
            Decimation::Max => block.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Decimation::Min => block.iter().copied().fold(f32::INFINITY, f32::min),
        })
        .collect()
}
