//! Stage A / Stage B / snap behaviour on synthetic material.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use seamloop_engine::search::{
    offset_search, snap_to_local_minimum, tail_search, LoopCandidate, SearchConfig,
    SATURATED_SCORE,
};
use seamloop_engine::{
    AudioBuffer, CancelToken, FormatSource, LoopSession, MonoTrack, SampleFormat, SearchPoll,
};

/// Noise that starts repeating with period `period` from frame `from`.
fn looping_noise(frames: usize, from: usize, period: usize, seed: u64) -> Vec<f32> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut out: Vec<f32> = Vec::with_capacity(frames);
    for i in 0..frames {
        let v = if i >= from + period {
            out[i - period]
        } else {
            rng.gen_range(-0.5f32..0.5)
        };
        out.push(v);
    }
    out
}

/// Exhaustive Stage A without pruning: normalized SSE per candidate end.
fn unpruned_scores(x: &[f32], begin: usize, window: usize, stride: usize) -> Vec<(usize, f32)> {
    (begin + 1..=x.len() - window)
        .map(|end| {
            let mut sse = 0.0f64;
            for j in (0..window).step_by(stride) {
                let d = x[begin + j] as f64 - x[end + j] as f64;
                sse += d * d;
            }
            (end, (sse / window as f64) as f32)
        })
        .collect()
}

fn leftmost_min(scores: &[(usize, f32)]) -> (usize, f32) {
    let mut best = (0, SATURATED_SCORE);
    for &(end, score) in scores {
        if score < best.1 {
            best = (end, score);
        }
    }
    best
}

#[test]
fn test_silent_buffer_takes_next_frame() {
    let mono = Arc::new(MonoTrack::from_samples(vec![0.0; 5000]));
    for begin in [0, 17, 4000] {
        let result = tail_search(Arc::clone(&mono), begin, &SearchConfig::default()).unwrap();
        assert_eq!(result.candidate.end, begin + 1);
        assert_eq!(result.score, Some(0.0));
    }
}

#[test]
fn test_flat_curve_snap_keeps_cursor() {
    let mono = Arc::new(MonoTrack::from_samples(vec![0.0; 2000]));
    let result = tail_search(mono, 100, &SearchConfig::default()).unwrap();
    for cursor in [500, 900, 1500] {
        assert_eq!(snap_to_local_minimum(&result.curve, cursor, 32), cursor);
    }
}

#[test]
fn test_two_stage_refinement_on_looping_noise() {
    let samples = looping_noise(6000, 500, 700, 42);
    let buffer = AudioBuffer::new(44100, vec![samples.clone(), samples]).unwrap();
    let mut session = LoopSession::default();
    session.set_audio(buffer, SampleFormat::Float32, FormatSource::Parsed);

    let cancel = CancelToken::new();
    let tail = session.find_loop_end(600, &cancel, |_| {}).unwrap();
    assert_eq!(tail.candidate, LoopCandidate { begin: 600, end: 1300 });
    assert_eq!(tail.score, Some(0.0));

    let offset = session
        .find_loop_begin(tail.candidate, &cancel, |_| {})
        .unwrap();
    assert_eq!(offset.candidate, LoopCandidate { begin: 500, end: 1200 });
    assert_eq!(offset.curve.len(), 6000 - 700);
    assert_eq!(offset.score, Some(0.0));
}

#[test]
fn test_restart_after_cancel_matches_fresh_scan() {
    let samples = looping_noise(8000, 1000, 1500, 9);
    let first_config = SearchConfig {
        yield_interval: 500,
        ..SearchConfig::default()
    };
    let second_config = SearchConfig {
        window_size: 24,
        comparison_stride: 2,
        yield_interval: 700,
        ..SearchConfig::default()
    };

    let mut session = LoopSession::new(first_config).unwrap();
    let buffer = AudioBuffer::new(22050, vec![samples.clone()]).unwrap();
    session.set_audio(buffer, SampleFormat::Float32, FormatSource::Parsed);

    let token = session.start_tail_search(1200).unwrap();
    assert!(matches!(session.poll_search(), SearchPoll::Running(_)));
    assert!(matches!(session.poll_search(), SearchPoll::Running(_)));
    token.cancel();
    assert_eq!(session.poll_search(), SearchPoll::Cancelled);

    session.set_config(second_config.clone()).unwrap();
    let restarted = session
        .find_loop_end(1100, &CancelToken::new(), |_| {})
        .unwrap();

    let mono = Arc::new(MonoTrack::from_samples(samples));
    let fresh = tail_search(mono, 1100, &second_config).unwrap();
    assert!(*restarted == *fresh);
    assert_eq!(restarted.candidate, LoopCandidate { begin: 1100, end: 2600 });
}

#[test]
fn test_progress_is_monotonic_and_complete() {
    let samples = looping_noise(5000, 0, 1000, 3);
    let buffer = AudioBuffer::new(8000, vec![samples]).unwrap();
    let config = SearchConfig {
        yield_interval: 256,
        ..SearchConfig::default()
    };
    let mut session = LoopSession::new(config).unwrap();
    session.set_audio(buffer, SampleFormat::Float32, FormatSource::Parsed);

    let mut seen = Vec::new();
    session
        .find_loop_end(10, &CancelToken::new(), |p| seen.push(p))
        .unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].processed < w[1].processed));
    let total = 5000 - 32 + 1 - 11;
    assert!(seen.iter().all(|p| p.total == total && p.processed < total));
}

#[test]
fn test_stage_b_weights_follow_config() {
    // A single spike and a zero-weight second tap: only the first tap sees it.
    let mut samples = vec![0.0f32; 64];
    samples[40] = 1.0;
    let mono = Arc::new(MonoTrack::from_samples(samples));
    let config = SearchConfig {
        tail_weights: vec![1.0, 0.0],
        ..SearchConfig::default()
    };
    let result = offset_search(mono, LoopCandidate { begin: 0, end: 10 }, &config).unwrap();
    assert_eq!(result.curve.get(30), Some(1.0));
    assert_eq!(result.curve.get(29), Some(0.0));
    assert_eq!(result.curve.get(40), Some(1.0));
    assert_eq!(result.curve.get(39), Some(0.0));
    assert_eq!(result.candidate.begin, 0);
}

#[test]
fn test_threshold_at_best_score_keeps_argmin() {
    for seed in 0..400u64 {
        let mut rng = Pcg32::seed_from_u64(seed);
        let x: Vec<f32> = (0..200).map(|_| rng.gen_range(-0.5f32..0.5)).collect();
        let (best_end, best_score) = leftmost_min(&unpruned_scores(&x, 3, 7, 1));
        if best_end == 0 {
            continue;
        }

        let config = SearchConfig {
            window_size: 7,
            sse_threshold: best_score as f64,
            ..SearchConfig::default()
        };
        let mono = Arc::new(MonoTrack::from_samples(x));
        let result = tail_search(mono, 3, &config).unwrap();
        assert_eq!(result.candidate.end, best_end, "seed {}", seed);
        assert_eq!(result.score, Some(best_score), "seed {}", seed);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_pruning_keeps_argmin(
        x in prop::collection::vec(-0.1f32..0.1, 120..320),
        begin in 0usize..40,
        window in 2usize..24,
        stride in 1usize..4,
        slack in prop_oneof![Just(1.0f64), 1.0f64..50.0],
    ) {
        let reference = unpruned_scores(&x, begin, window, stride);
        let (best_end, best_score) = leftmost_min(&reference);

        let config = SearchConfig {
            window_size: window,
            comparison_stride: stride,
            sse_threshold: best_score as f64 * slack,
            ..SearchConfig::default()
        };
        let mono = Arc::new(MonoTrack::from_samples(x));
        let result = tail_search(mono, begin, &config).unwrap();

        prop_assert_eq!(result.candidate.end, best_end);
        prop_assert_eq!(result.score, Some(best_score));
        for &(end, score) in &reference {
            let pruned = result.curve.get(end).unwrap();
            prop_assert!(pruned == score || pruned == SATURATED_SCORE);
        }
    }
}
