//! Plot-resolution summaries for renderers.

use serde::Serialize;

use crate::mixdown::{decimate, Decimation, MonoTrack};
use crate::search::ErrorCurve;

/// Frames per plotted column.
pub const DEFAULT_DECIMATION_RATIO: usize = 4096;

/// Peak envelope of a mono track, one column per `ratio` frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveformOverview {
    /// Frames per column.
    pub ratio: usize,
    /// Largest sample per column.
    pub max: Vec<f32>,
    /// Smallest sample per column.
    pub min: Vec<f32>,
}

impl WaveformOverview {
    /// Decimates `mono` into max/min columns of `ratio` frames each.
    ///
    /// A `ratio` of zero is treated as one. A trailing partial column is dropped.
    pub fn new(mono: &MonoTrack, ratio: usize) -> Self {
        let ratio = ratio.max(1);
        Self {
            ratio,
            max: decimate(Decimation::Max, ratio, mono.samples()),
            min: decimate(Decimation::Min, ratio, mono.samples()),
        }
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.max.len()
    }

    /// Column containing `frame`.
    pub fn column_of(&self, frame: usize) -> usize {
        frame / self.ratio
    }
}

/// Per-column best score of `curve` in decibels (`10 * log10`).
///
/// A zero score maps to negative infinity.
pub fn curve_levels_db(curve: &ErrorCurve, ratio: usize) -> Vec<f32> {
    decimate(Decimation::Min, ratio, curve.scores())
        .into_iter()
        .map(|v| 10.0 * v.log10())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overview_envelope() {
        let mono = MonoTrack::from_samples(vec![0.1, -0.4, 0.9, 0.2, -0.3, 0.0, 0.5]);
        let overview = WaveformOverview::new(&mono, 3);
        assert_eq!(overview.columns(), 2);
        assert_eq!(overview.max, vec![0.9, 0.2]);
        assert_eq!(overview.min, vec![-0.4, -0.3]);
        assert_eq!(overview.column_of(5), 1);
    }

    #[test]
    fn test_curve_levels() {
        let curve = ErrorCurve::from_scores(vec![1.0, 0.01, 0.1, 0.001, 0.0, 1.0]);
        let levels = curve_levels_db(&curve, 2);
        assert_eq!(levels.len(), 3);
        assert!((levels[0] + 20.0).abs() < 1e-4);
        assert!((levels[1] + 30.0).abs() < 1e-4);
        assert_eq!(levels[2], f32::NEG_INFINITY);
    }
}
