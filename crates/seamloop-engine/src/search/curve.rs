//! Error curves and loop candidates.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A loop region `[begin, end)` in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopCandidate {
    /// First frame of the loop.
    pub begin: usize,
    /// One past the last frame of the loop.
    pub end: usize,
}

impl LoopCandidate {
    /// Builds a candidate inside a buffer of `frames` frames.
    ///
    /// Requires `begin < end <= frames`.
    pub fn new(begin: usize, end: usize, frames: usize) -> EngineResult<Self> {
        if begin >= end || end > frames {
            return Err(EngineError::InvalidRange {
                offset: begin,
                end,
                frames,
            });
        }
        Ok(Self { begin, end })
    }

    /// Loop length in frames.
    pub fn length(&self) -> usize {
        self.end - self.begin
    }
}

/// One dissimilarity score per candidate offset.
///
/// Produced only by a completed scan; lower is better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorCurve {
    scores: Vec<f32>,
}

impl ErrorCurve {
    pub(crate) fn from_scores(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    /// The scores, indexed by candidate offset.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Number of scored offsets.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the curve has no entries.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score at `offset`.
    pub fn get(&self, offset: usize) -> Option<f32> {
        self.scores.get(offset).copied()
    }

    /// Offset of the smallest score; the leftmost wins ties.
    pub fn argmin(&self) -> Option<usize> {
        argmin(&self.scores)
    }
}

/// Index of the smallest value, compared with strict `<` so the leftmost of
/// equal values wins. `None` for an empty slice.
pub fn argmin(values: &[f32]) -> Option<usize> {
    let (&first, rest) = values.split_first()?;
    let mut min = first;
    let mut index = 0;
    for (i, &v) in rest.iter().enumerate() {
        if v < min {
            min = v;
            index = i + 1;
        }
    }
    Some(index)
}
