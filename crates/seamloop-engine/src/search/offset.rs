//! Stage B: find the best loop begin for a fixed loop length.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::mixdown::MonoTrack;

use super::config::SearchConfig;
use super::curve::{argmin, ErrorCurve, LoopCandidate};
use super::task::{run_to_completion, CancelToken, Scan, ScanStep, SearchProgress};

/// Completed Stage B scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetSearchResult {
    /// The loop whose length was searched.
    pub origin: LoopCandidate,
    /// Loop of the same length starting at the lowest-scoring offset, or
    /// `origin` when the buffer leaves no room to slide it.
    pub candidate: LoopCandidate,
    /// Weighted splice error of `candidate`; `None` when no offset scored a
    /// finite value.
    pub score: Option<f32>,
    /// Score per start offset, `N - length` entries.
    pub curve: ErrorCurve,
}

impl OffsetSearchResult {
    /// The fixed loop length.
    pub fn length(&self) -> usize {
        self.origin.length()
    }

    /// Whether no offset had all its taps inside the track.
    pub fn is_degenerate(&self) -> bool {
        self.score.is_none()
    }
}

/// Resumable Stage B scan over every start offset `O ∈ [0, N - L)`.
///
/// `Score(O) = Σ_t w[t] · (x[O + t] - x[O + L + t])²`. An offset whose taps
/// run past the end of the track scores `f32::INFINITY` and never wins.
#[derive(Debug)]
pub struct OffsetScan {
    mono: Arc<MonoTrack>,
    origin: LoopCandidate,
    weights: Vec<f64>,
    chunk: usize,
    scores: Vec<f32>,
    next: usize,
    done: Option<Arc<OffsetSearchResult>>,
}

impl OffsetScan {
    /// Prepares a scan for the length of `origin`.
    pub fn new(
        mono: Arc<MonoTrack>,
        origin: LoopCandidate,
        config: &SearchConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        let frames = mono.len();
        if origin.begin >= origin.end || origin.end > frames {
            return Err(EngineError::InvalidRange {
                offset: origin.begin,
                end: origin.end,
                frames,
            });
        }

        let length = origin.length();
        log::debug!(
            "offset search: length {}, {} taps, {} candidates",
            length,
            config.tail_weights.len(),
            frames - length
        );

        Ok(Self {
            mono,
            origin,
            weights: config.tail_weights.clone(),
            chunk: config.yield_interval,
            scores: vec![0.0; frames - length],
            next: 0,
            done: None,
        })
    }

    fn score(&self, offset: usize) -> f32 {
        let samples = self.mono.samples();
        let length = self.origin.length();
        let Some(tail) = samples.get(offset + length..offset + length + self.weights.len())
        else {
            return f32::INFINITY;
        };
        let head = &samples[offset..offset + self.weights.len()];
        let mut sum = 0.0f64;
        for ((&w, &a), &b) in self.weights.iter().zip(head).zip(tail) {
            let d = a as f64 - b as f64;
            sum += d * d * w;
        }
        sum as f32
    }

    fn finish(&mut self) -> OffsetSearchResult {
        let curve = ErrorCurve::from_scores(std::mem::take(&mut self.scores));
        let length = self.origin.length();
        let best = argmin(curve.scores()).filter(|&o| curve.get(o).is_some_and(f32::is_finite));
        let result = match best {
            Some(begin) => OffsetSearchResult {
                origin: self.origin,
                candidate: LoopCandidate {
                    begin,
                    end: begin + length,
                },
                score: curve.get(begin),
                curve,
            },
            None => OffsetSearchResult {
                origin: self.origin,
                candidate: self.origin,
                score: None,
                curve,
            },
        };
        if result.is_degenerate() {
            log::warn!(
                "offset search: no room to slide a loop of {} frames; keeping begin {}",
                length,
                self.origin.begin
            );
        } else {
            log::debug!(
                "offset search done: begin {} (score {:e})",
                result.candidate.begin,
                result.score.unwrap_or_default()
            );
        }
        result
    }
}

impl Scan for OffsetScan {
    type Output = Arc<OffsetSearchResult>;

    fn step(&mut self) -> ScanStep<Self::Output> {
        if let Some(done) = &self.done {
            return ScanStep::Finished(Arc::clone(done));
        }

        let stop = self.next.saturating_add(self.chunk).min(self.scores.len());
        while self.next < stop {
            self.scores[self.next] = self.score(self.next);
            self.next += 1;
        }

        if self.next < self.scores.len() {
            let progress = self.progress();
            log::debug!(
                "offset search suspended at {}/{}",
                progress.processed,
                progress.total
            );
            return ScanStep::Suspended(progress);
        }

        let result = Arc::new(self.finish());
        self.done = Some(Arc::clone(&result));
        ScanStep::Finished(result)
    }

    fn progress(&self) -> SearchProgress {
        let total = match &self.done {
            Some(done) => done.curve.len(),
            None => self.scores.len(),
        };
        SearchProgress {
            processed: self.next.min(total),
            total,
        }
    }
}

/// Runs a complete Stage B scan without suspension handling.
pub fn offset_search(
    mono: Arc<MonoTrack>,
    origin: LoopCandidate,
    config: &SearchConfig,
) -> EngineResult<Arc<OffsetSearchResult>> {
    let mut scan = OffsetScan::new(mono, origin, config)?;
    run_to_completion(&mut scan, &CancelToken::new(), |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(samples: Vec<f32>) -> Arc<MonoTrack> {
        Arc::new(MonoTrack::from_samples(samples))
    }

    #[test]
    fn test_weighted_score() {
        let samples = vec![0.0, 0.0, 0.0, 1.0, 0.5, 0.0, 0.0, 0.0];
        let cfg = SearchConfig {
            tail_weights: vec![0.5, 0.25],
            ..SearchConfig::default()
        };
        let origin = LoopCandidate { begin: 0, end: 3 };
        let result = offset_search(track(samples), origin, &cfg).unwrap();
        assert_eq!(result.curve.len(), 5);
        // O = 0: 0.5 * (0 - 1)^2 + 0.25 * (0 - 0.5)^2
        assert_eq!(result.curve.get(0), Some(0.5625));
        // O = 1: 0.5 * (0 - 0.5)^2 + 0.25 * (0 - 0)^2
        assert_eq!(result.curve.get(1), Some(0.125));
        assert_eq!(result.curve.get(2), Some(0.25));
        // O = 4 would compare its second tap against frame 8.
        assert_eq!(result.curve.get(4), Some(f32::INFINITY));
        assert_eq!(result.candidate, LoopCandidate { begin: 1, end: 4 });
        assert_eq!(result.score, Some(0.125));
        assert_eq!(result.length(), 3);
    }

    #[test]
    fn test_offsets_with_taps_past_end_never_win() {
        // Reading the missing frame 6 as zero would make O = 2 a perfect splice.
        let samples = vec![0.4, 0.3, 0.0, 0.0, 0.2, 0.0];
        let cfg = SearchConfig {
            tail_weights: vec![1.0, 1.0],
            ..SearchConfig::default()
        };
        let origin = LoopCandidate { begin: 0, end: 3 };
        let result = offset_search(track(samples), origin, &cfg).unwrap();
        assert_eq!(result.curve.len(), 3);
        assert_eq!(result.curve.get(2), Some(f32::INFINITY));
        assert!(result.curve.get(1).unwrap().is_finite());
        assert_eq!(result.candidate.begin, 1);
    }

    #[test]
    fn test_all_offsets_past_end_keep_origin() {
        let cfg = SearchConfig {
            tail_weights: vec![1.0, 1.0, 1.0],
            ..SearchConfig::default()
        };
        let origin = LoopCandidate { begin: 1, end: 4 };
        let result = offset_search(track(vec![0.2, 0.0, 0.0, 0.0]), origin, &cfg).unwrap();
        assert_eq!(result.curve.scores(), &[f32::INFINITY]);
        assert!(result.is_degenerate());
        assert_eq!(result.candidate, origin);
    }

    #[test]
    fn test_full_length_loop_keeps_origin() {
        let origin = LoopCandidate { begin: 0, end: 16 };
        let result =
            offset_search(track(vec![0.1; 16]), origin, &SearchConfig::default()).unwrap();
        assert!(result.is_degenerate());
        assert!(result.curve.is_empty());
        assert_eq!(result.candidate, origin);
    }

    #[test]
    fn test_origin_outside_buffer() {
        let origin = LoopCandidate { begin: 4, end: 20 };
        let err = OffsetScan::new(track(vec![0.0; 16]), origin, &SearchConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { end: 20, .. }));
    }

    #[test]
    fn test_suspension_progress() {
        let cfg = SearchConfig {
            yield_interval: 4,
            ..SearchConfig::default()
        };
        let origin = LoopCandidate { begin: 0, end: 2 };
        let mut scan = OffsetScan::new(track(vec![0.0; 12]), origin, &cfg).unwrap();
        let mut seen = Vec::new();
        while let ScanStep::Suspended(p) = scan.step() {
            seen.push(p.processed);
        }
        assert_eq!(seen, vec![4, 8]);
        assert_eq!(scan.progress().processed, 10);
    }
}
