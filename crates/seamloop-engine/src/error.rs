//! Error types for the loop engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Reasons a byte blob could not be decoded as a supported WAV container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Missing `RIFF` tag at offset 0.
    #[error("missing RIFF tag")]
    MissingRiffTag,

    /// Missing `WAVE` tag at offset 8.
    #[error("missing WAVE tag")]
    MissingWaveTag,

    /// Ran out of chunks before a `data` chunk was found.
    #[error("no data chunk found")]
    MissingDataChunk,

    /// A chunk header or payload runs past the end of the input.
    #[error("chunk '{id}' at offset {offset} declares {size} bytes, past end of input ({len} bytes)")]
    TruncatedChunk {
        /// Printable chunk id.
        id: String,
        /// Offset of the chunk header.
        offset: usize,
        /// Declared payload size.
        size: usize,
        /// Total input length.
        len: usize,
    },

    /// `fmt ` chunk shorter than 16 bytes.
    #[error("fmt chunk too short: {size} bytes")]
    ShortFmtChunk {
        /// Declared chunk size.
        size: usize,
    },

    /// Channel count or sample rate is zero (or `data` came before `fmt `).
    #[error("invalid stream parameters: {channels} channels at {sample_rate} Hz")]
    InvalidStream {
        /// Channel count from the `fmt ` chunk.
        channels: u16,
        /// Sample rate from the `fmt ` chunk.
        sample_rate: u32,
    },

    /// Format tag / bit depth combination not handled by the direct parser.
    #[error("unsupported encoding: format tag {format_tag}, {bits_per_sample} bits per sample")]
    UnsupportedEncoding {
        /// WAVE format tag.
        format_tag: u16,
        /// Bits per sample.
        bits_per_sample: u16,
    },
}

/// Errors that can occur in the loop engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or unsupported container.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Unrecognized sample format name passed to the encoder.
    #[error("cannot encode: unrecognized sample format '{name}'")]
    Encode {
        /// The format name as supplied.
        name: String,
    },

    /// The external decoder could not produce samples either.
    #[error("fallback decoder failed: {message}")]
    Fallback {
        /// Error message.
        message: String,
    },

    /// No candidate produced a finite score.
    #[error("no suitable loop point after frame {begin}: {reason}")]
    SearchDegenerate {
        /// The fixed loop begin (Stage A) or offset origin (Stage B).
        begin: usize,
        /// Why the search could not discriminate.
        reason: String,
    },

    /// Cooperative abort. Not a failure, just no result.
    #[error("search cancelled")]
    Cancelled,

    /// A configuration value is out of range.
    #[error("invalid config '{name}': {message}")]
    InvalidConfig {
        /// Field name.
        name: String,
        /// Error message.
        message: String,
    },

    /// A frame range does not fit the buffer.
    #[error("frame range {offset}..{end} is outside the buffer ({frames} frames)")]
    InvalidRange {
        /// First frame.
        offset: usize,
        /// One past the last frame.
        end: usize,
        /// Buffer length in frames.
        frames: usize,
    },

    /// Channel data does not form a valid buffer.
    #[error("invalid buffer: {message}")]
    InvalidBuffer {
        /// Error message.
        message: String,
    },

    /// No search is running, or no result exists for the current inputs.
    #[error("no search result for the current audio and config")]
    NoSearch,

    /// The session has no audio loaded.
    #[error("no audio loaded")]
    NoAudio,

    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates an invalid config error.
    pub fn invalid_config(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a degenerate search error.
    pub fn degenerate(begin: usize, reason: impl Into<String>) -> Self {
        Self::SearchDegenerate {
            begin,
            reason: reason.into(),
        }
    }

    /// Whether this is a cooperative cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Decode(_) => "SEAMLOOP_001",
            EngineError::Encode { .. } => "SEAMLOOP_002",
            EngineError::Fallback { .. } => "SEAMLOOP_003",
            EngineError::SearchDegenerate { .. } => "SEAMLOOP_004",
            EngineError::Cancelled => "SEAMLOOP_005",
            EngineError::InvalidConfig { .. } => "SEAMLOOP_006",
            EngineError::InvalidRange { .. } => "SEAMLOOP_007",
            EngineError::NoAudio => "SEAMLOOP_008",
            EngineError::InvalidBuffer { .. } => "SEAMLOOP_011",
            EngineError::NoSearch => "SEAMLOOP_012",
            EngineError::ConfigParse(_) => "SEAMLOOP_009",
            EngineError::Io(_) => "SEAMLOOP_010",
        }
    }

    /// Coarse grouping used in reports.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::Decode(_) | EngineError::Fallback { .. } => "decode",
            EngineError::Encode { .. } => "encode",
            EngineError::SearchDegenerate { .. } | EngineError::Cancelled => "search",
            EngineError::InvalidConfig { .. } | EngineError::ConfigParse(_) => "config",
            EngineError::InvalidRange { .. }
            | EngineError::NoAudio
            | EngineError::InvalidBuffer { .. }
            | EngineError::NoSearch => "session",
            EngineError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_helper() {
        let err = EngineError::invalid_config("window_size", "must be at least 1");
        assert!(err.to_string().contains("window_size"));
        assert!(err.to_string().contains("at least 1"));
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_decode_error_converts() {
        let err: EngineError = DecodeError::MissingRiffTag.into();
        assert_eq!(err.code(), "SEAMLOOP_001");
        assert!(err.to_string().contains("RIFF"));
    }

    #[test]
    fn test_cancelled_is_not_a_failure_category() {
        let err = EngineError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!EngineError::NoAudio.is_cancelled());
    }
}
