//! Sample quantization conventions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// WAVE format tag for integer PCM.
pub const FORMAT_TAG_PCM: u16 = 1;

/// WAVE format tag for IEEE float.
pub const FORMAT_TAG_IEEE_FLOAT: u16 = 3;

/// Quantization convention of a buffer's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// 16-bit, full scale 0x8000 in both directions.
    Int16,
    /// 16-bit, positive full scale 0x7fff, negative 0x8000.
    Int16Asymmetric,
    /// 24-bit, full scale 0x800000.
    Int24,
    /// 32-bit IEEE float, stored unchanged.
    Float32,
}

impl SampleFormat {
    /// All formats, in inference precedence order.
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::Int16,
        SampleFormat::Int16Asymmetric,
        SampleFormat::Int24,
        SampleFormat::Float32,
    ];

    /// Bytes occupied by one sample on disk.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Int16 | SampleFormat::Int16Asymmetric => 2,
            SampleFormat::Int24 => 3,
            SampleFormat::Float32 => 4,
        }
    }

    /// Bits per sample as written in the `fmt ` chunk.
    pub fn bits_per_sample(self) -> u16 {
        (self.bytes_per_sample() * 8) as u16
    }

    /// WAVE format tag as written in the `fmt ` chunk.
    pub fn format_tag(self) -> u16 {
        match self {
            SampleFormat::Float32 => FORMAT_TAG_IEEE_FLOAT,
            _ => FORMAT_TAG_PCM,
        }
    }

    /// Scales a normalized sample onto this format's integer grid, unrounded.
    ///
    /// Returns `None` for `Float32`, which has no integer grid.
    pub fn to_grid(self, sample: f32) -> Option<f64> {
        let s = sample as f64;
        match self {
            SampleFormat::Int16 => Some(s * 32768.0),
            SampleFormat::Int16Asymmetric => {
                if s > 0.0 {
                    Some(s * 32767.0)
                } else {
                    Some(s * 32768.0)
                }
            }
            SampleFormat::Int24 => Some(s * 8_388_608.0),
            SampleFormat::Float32 => None,
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SampleFormat::Int16 => "int16",
            SampleFormat::Int16Asymmetric => "int16_asymmetric",
            SampleFormat::Int24 => "int24",
            SampleFormat::Float32 => "float32",
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            SampleFormat::Int16 | SampleFormat::Int16Asymmetric => "16bit Linear PCM",
            SampleFormat::Int24 => "24bit Linear PCM",
            SampleFormat::Float32 => "32bit IEEE 754 Float PCM",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "int16" | "pcm16" => Ok(SampleFormat::Int16),
            "int16_asymmetric" | "int16asymmetric" => Ok(SampleFormat::Int16Asymmetric),
            "int24" | "pcm24" => Ok(SampleFormat::Int24),
            "float32" | "f32" => Ok(SampleFormat::Float32),
            _ => Err(EngineError::Encode {
                name: s.to_string(),
            }),
        }
    }
}

/// Where a buffer's format came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSource {
    /// Read from the container header.
    Parsed,
    /// Guessed from sample values after generic decoding.
    Inferred,
}
