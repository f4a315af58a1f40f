//! Search configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Default comparison window, in frames.
pub const DEFAULT_WINDOW_SIZE: usize = 32;

/// Default per-frame SSE threshold for Stage A pruning.
pub const DEFAULT_SSE_THRESHOLD: f64 = 0.0001;

/// Default snap radius, in frames.
pub const DEFAULT_SNAP_DISTANCE: usize = 32;

/// Default iteration count between suspension points.
pub const DEFAULT_YIELD_INTERVAL: usize = 262_144;

/// Tunable parameters shared by every search stage.
///
/// Changing any field invalidates error curves computed under the previous
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Frames compared per Stage A candidate.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Normalized SSE above which a Stage A window is abandoned.
    #[serde(default = "default_sse_threshold")]
    pub sse_threshold: f64,
    /// Step between compared sample pairs inside a window.
    #[serde(default = "default_comparison_stride")]
    pub comparison_stride: usize,
    /// Half-width of the snap window, in frames.
    #[serde(default = "default_snap_distance")]
    pub snap_distance: usize,
    /// Stage B tap weights, applied from the splice point forward.
    #[serde(default = "default_tail_weights")]
    pub tail_weights: Vec<f64>,
    /// Candidates scored between suspension points.
    #[serde(default = "default_yield_interval")]
    pub yield_interval: usize,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_sse_threshold() -> f64 {
    DEFAULT_SSE_THRESHOLD
}

fn default_comparison_stride() -> usize {
    1
}

fn default_snap_distance() -> usize {
    DEFAULT_SNAP_DISTANCE
}

fn default_tail_weights() -> Vec<f64> {
    vec![0.4, 0.2, 0.2, 0.2]
}

fn default_yield_interval() -> usize {
    DEFAULT_YIELD_INTERVAL
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            sse_threshold: default_sse_threshold(),
            comparison_stride: default_comparison_stride(),
            snap_distance: default_snap_distance(),
            tail_weights: default_tail_weights(),
            yield_interval: default_yield_interval(),
        }
    }
}

impl SearchConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> EngineResult<()> {
        if self.window_size == 0 {
            return Err(EngineError::invalid_config("window_size", "must be at least 1"));
        }
        if !self.sse_threshold.is_finite() || self.sse_threshold < 0.0 {
            return Err(EngineError::invalid_config(
                "sse_threshold",
                format!("must be finite and non-negative, got {}", self.sse_threshold),
            ));
        }
        if self.comparison_stride == 0 {
            return Err(EngineError::invalid_config(
                "comparison_stride",
                "must be at least 1",
            ));
        }
        if self.snap_distance == 0 {
            return Err(EngineError::invalid_config("snap_distance", "must be at least 1"));
        }
        if self.yield_interval == 0 {
            return Err(EngineError::invalid_config("yield_interval", "must be at least 1"));
        }
        if self.tail_weights.is_empty() {
            return Err(EngineError::invalid_config(
                "tail_weights",
                "at least one tap is required",
            ));
        }
        if let Some((i, w)) = self
            .tail_weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(EngineError::invalid_config(
                "tail_weights",
                format!("tap {} must be finite and non-negative, got {}", i, w),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.window_size, 32);
        assert_eq!(config.sse_threshold, 0.0001);
        assert_eq!(config.comparison_stride, 1);
        assert_eq!(config.snap_distance, 32);
        assert_eq!(config.tail_weights, vec![0.4, 0.2, 0.2, 0.2]);
        assert_eq!(config.yield_interval, 262_144);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SearchConfig::from_json_str(r#"{"window_size": 64, "comparison_stride": 2}"#)
            .unwrap();
        assert_eq!(
            config,
            SearchConfig {
                window_size: 64,
                comparison_stride: 2,
                ..SearchConfig::default()
            }
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SearchConfig::from_json_str(r#"{"window": 64}"#).unwrap_err();
        assert_eq!(err.code(), "SEAMLOOP_009");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases = [
            (
                SearchConfig {
                    window_size: 0,
                    ..SearchConfig::default()
                },
                "window_size",
            ),
            (
                SearchConfig {
                    sse_threshold: -1.0,
                    ..SearchConfig::default()
                },
                "sse_threshold",
            ),
            (
                SearchConfig {
                    sse_threshold: f64::NAN,
                    ..SearchConfig::default()
                },
                "sse_threshold",
            ),
            (
                SearchConfig {
                    comparison_stride: 0,
                    ..SearchConfig::default()
                },
                "comparison_stride",
            ),
            (
                SearchConfig {
                    snap_distance: 0,
                    ..SearchConfig::default()
                },
                "snap_distance",
            ),
            (
                SearchConfig {
                    yield_interval: 0,
                    ..SearchConfig::default()
                },
                "yield_interval",
            ),
            (
                SearchConfig {
                    tail_weights: vec![],
                    ..SearchConfig::default()
                },
                "tail_weights",
            ),
            (
                SearchConfig {
                    tail_weights: vec![0.5, -0.1],
                    ..SearchConfig::default()
                },
                "tail_weights",
            ),
        ];
        for (config, field) in cases {
            match config.validate() {
                Err(EngineError::InvalidConfig { name, .. }) => assert_eq!(name, field),
                other => panic!("expected InvalidConfig for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_zero_threshold_is_valid() {
        let config = SearchConfig {
            sse_threshold: 0.0,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
