//! Stage A: find the loop end that best continues a fixed loop begin.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::mixdown::MonoTrack;

use super::config::SearchConfig;
use super::curve::{ErrorCurve, LoopCandidate};
use super::task::{run_to_completion, CancelToken, Scan, ScanStep, SearchProgress};

/// Score recorded for a pruned window, and the initial minimum.
///
/// No candidate scoring at or above this value is ever selected.
pub const SATURATED_SCORE: f32 = 1.0;

/// Completed Stage A scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailSearchResult {
    /// Best loop found, or `begin..begin + 1` when nothing matched.
    pub candidate: LoopCandidate,
    /// Normalized SSE of the best end; `None` for a degenerate search.
    pub score: Option<f32>,
    /// Score per candidate end. Offsets up to and including `begin`, and
    /// pruned windows, hold [`SATURATED_SCORE`].
    pub curve: ErrorCurve,
}

impl TailSearchResult {
    /// Whether no candidate improved on the saturated score.
    pub fn is_degenerate(&self) -> bool {
        self.score.is_none()
    }

    /// The best candidate, or a [`EngineError::SearchDegenerate`] describing
    /// why none was found. The fallback candidate stays in `self.candidate`.
    pub fn check(&self) -> EngineResult<LoopCandidate> {
        if self.score.is_some() {
            return Ok(self.candidate);
        }
        let reason = if self.curve.len() <= self.candidate.begin + 1 {
            "buffer too short for the comparison window".to_string()
        } else {
            format!(
                "no window scored below the threshold across {} candidates",
                self.curve.len() - self.candidate.begin - 1
            )
        };
        Err(EngineError::degenerate(self.candidate.begin, reason))
    }
}

/// Resumable Stage A scan over `end ∈ (begin, N - window_size]`.
///
/// Each candidate's window is compared against the window at `begin`, using
/// every `comparison_stride`-th pair. The running SSE is abandoned once it
/// exceeds `sse_threshold * window_size` and its normalized `f32` score is
/// above `sse_threshold`; the candidate is then scored as [`SATURATED_SCORE`].
/// A window whose published score equals the threshold is never pruned.
#[derive(Debug)]
pub struct TailScan {
    mono: Arc<MonoTrack>,
    begin: usize,
    window: usize,
    stride: usize,
    limit: f64,
    threshold: f64,
    chunk: usize,
    scores: Vec<f32>,
    next: usize,
    min: f32,
    best: Option<usize>,
    done: Option<Arc<TailSearchResult>>,
}

impl TailScan {
    /// Prepares a scan from `begin`. Nothing is scored until the first step.
    pub fn new(mono: Arc<MonoTrack>, begin: usize, config: &SearchConfig) -> EngineResult<Self> {
        config.validate()?;
        let frames = mono.len();
        if begin >= frames {
            return Err(EngineError::InvalidRange {
                offset: begin,
                end: begin.saturating_add(1),
                frames,
            });
        }

        let window = config.window_size;
        let curve_len = (frames + 1).saturating_sub(window);
        let mut scores = vec![0.0; curve_len];
        let prefix = (begin + 1).min(curve_len);
        scores[..prefix].fill(SATURATED_SCORE);

        log::debug!(
            "tail search: begin {}, window {}, stride {}, {} candidates",
            begin,
            window,
            config.comparison_stride,
            curve_len.saturating_sub(begin + 1)
        );

        Ok(Self {
            mono,
            begin,
            window,
            stride: config.comparison_stride,
            limit: config.sse_threshold * window as f64,
            threshold: config.sse_threshold,
            chunk: config.yield_interval,
            scores,
            next: begin + 1,
            min: SATURATED_SCORE,
            best: None,
            done: None,
        })
    }

    /// The fixed loop begin.
    pub fn begin(&self) -> usize {
        self.begin
    }

    fn score(&self, end: usize) -> f32 {
        let samples = self.mono.samples();
        let reference = &samples[self.begin..self.begin + self.window];
        let candidate = &samples[end..end + self.window];
        let mut sse = 0.0f64;
        for j in (0..self.window).step_by(self.stride) {
            let d = reference[j] as f64 - candidate[j] as f64;
            sse += d * d;
            // Prune only once the score as published (f32) exceeds the threshold.
            if sse > self.limit && self.publish(sse) as f64 > self.threshold {
                return SATURATED_SCORE;
            }
        }
        self.publish(sse)
    }

    fn publish(&self, sse: f64) -> f32 {
        (sse / self.window as f64) as f32
    }

    fn finish(&mut self) -> TailSearchResult {
        let curve = ErrorCurve::from_scores(std::mem::take(&mut self.scores));
        let result = match self.best {
            Some(end) => TailSearchResult {
                candidate: LoopCandidate {
                    begin: self.begin,
                    end,
                },
                score: Some(self.min),
                curve,
            },
            None => TailSearchResult {
                candidate: LoopCandidate {
                    begin: self.begin,
                    end: self.begin + 1,
                },
                score: None,
                curve,
            },
        };
        match result.score {
            Some(score) => log::debug!(
                "tail search done: end {} (score {:e})",
                result.candidate.end,
                score
            ),
            None => log::warn!(
                "tail search found no loop point after frame {}; falling back to {}",
                self.begin,
                result.candidate.end
            ),
        }
        result
    }
}

impl Scan for TailScan {
    type Output = Arc<TailSearchResult>;

    fn step(&mut self) -> ScanStep<Self::Output> {
        if let Some(done) = &self.done {
            return ScanStep::Finished(Arc::clone(done));
        }

        let stop = self.next.saturating_add(self.chunk).min(self.scores.len());
        while self.next < stop {
            let end = self.next;
            let score = self.score(end);
            self.scores[end] = score;
            if score < self.min {
                self.min = score;
                self.best = Some(end);
            }
            self.next += 1;
        }

        if self.next < self.scores.len() {
            let progress = self.progress();
            log::debug!(
                "tail search suspended at {}/{}",
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
        let first = self.begin + 1;
        let total = match &self.done {
            Some(done) => done.curve.len().saturating_sub(first),
            None => self.scores.len().saturating_sub(first),
        };
        SearchProgress {
            processed: self.next.saturating_sub(first).min(total),
            total,
        }
    }
}

/// Runs a complete Stage A scan without suspension handling.
pub fn tail_search(
    mono: Arc<MonoTrack>,
    begin: usize,
    config: &SearchConfig,
) -> EngineResult<Arc<TailSearchResult>> {
    let mut scan = TailScan::new(mono, begin, config)?;
    run_to_completion(&mut scan, &CancelToken::new(), |_| {})
}
