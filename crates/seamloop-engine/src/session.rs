//! Loop editing session.
//!
//! A [`LoopSession`] owns the decoded buffer, its mono mixdown, the search
//! configuration and at most one in-flight scan. Finished scans are kept as
//! immutable snapshots tagged with the buffer and config versions they were
//! computed from; replacing either input drops them.

use std::sync::Arc;

use serde::Serialize;

use crate::buffer::AudioBuffer;
use crate::codec::{FormatSource, SampleFormat};
use crate::decoder::{load_audio, FallbackDecoder, LoadedAudio};
use crate::error::{EngineError, EngineResult};
use crate::export::{encode_full, split_loop, LoopSplit};
use crate::mixdown::{mix, MonoTrack};
use crate::overview::WaveformOverview;
use crate::search::{
    snap_to_local_minimum, CancelToken, LoopCandidate, OffsetScan, OffsetSearchResult, Scan,
    ScanStep, SearchConfig, SearchProgress, TailScan, TailSearchResult,
};

/// Summary of a successful [`LoopSession::load`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// Channel count.
    pub channels: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per channel.
    pub frames: usize,
    /// Format used for exports.
    pub format: SampleFormat,
    /// Whether `format` was read or guessed.
    pub source: FormatSource,
    /// Decoder that produced the samples.
    pub decoder: String,
    /// Notes worth showing to the user.
    pub warnings: Vec<String>,
}

/// Inputs a cached result was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    buffer_version: u64,
    config_version: u64,
}

#[derive(Debug)]
struct Audio {
    buffer: Arc<AudioBuffer>,
    mono: Arc<MonoTrack>,
    format: SampleFormat,
    source: FormatSource,
}

#[derive(Debug)]
enum ActiveScan {
    Tail(TailScan),
    Offset(OffsetScan),
}

#[derive(Debug)]
struct ActiveSearch {
    key: CacheKey,
    scan: ActiveScan,
    cancel: CancelToken,
}

/// Result of a completed scan.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Stage A finished.
    Tail(Arc<TailSearchResult>),
    /// Stage B finished.
    Offset(Arc<OffsetSearchResult>),
}

impl SearchOutcome {
    /// The Stage A result, if this is one.
    pub fn into_tail(self) -> Option<Arc<TailSearchResult>> {
        match self {
            SearchOutcome::Tail(result) => Some(result),
            SearchOutcome::Offset(_) => None,
        }
    }

    /// The Stage B result, if this is one.
    pub fn into_offset(self) -> Option<Arc<OffsetSearchResult>> {
        match self {
            SearchOutcome::Offset(result) => Some(result),
            SearchOutcome::Tail(_) => None,
        }
    }
}

/// State reported by [`LoopSession::poll_search`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPoll {
    /// Nothing is running.
    Idle,
    /// A chunk was scored; poll again to continue.
    Running(SearchProgress),
    /// The scan completed and its result is now cached.
    Finished(SearchOutcome),
    /// The scan was cancelled and discarded.
    Cancelled,
}

/// Owner of one buffer and its search state.
#[derive(Debug)]
pub struct LoopSession {
    audio: Option<Audio>,
    config: SearchConfig,
    buffer_version: u64,
    config_version: u64,
    tail: Option<(CacheKey, Arc<TailSearchResult>)>,
    offset: Option<(CacheKey, Arc<OffsetSearchResult>)>,
    active: Option<ActiveSearch>,
}

impl Default for LoopSession {
    fn default() -> Self {
        Self {
            audio: None,
            config: SearchConfig::default(),
            buffer_version: 0,
            config_version: 0,
            tail: None,
            offset: None,
            active: None,
        }
    }
}

impl LoopSession {
    /// Creates an empty session with a validated config.
    pub fn new(config: SearchConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Decodes `bytes` (via `fallback` if the direct parser rejects them)
    /// and makes the result the session's buffer.
    pub fn load(
        &mut self,
        bytes: &[u8],
        fallback: Option<&dyn FallbackDecoder>,
    ) -> EngineResult<LoadReport> {
        let LoadedAudio {
            buffer,
            format,
            source,
            decoder,
            warnings,
        } = load_audio(bytes, fallback)?;
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        let report = LoadReport {
            channels: buffer.channel_count(),
            sample_rate: buffer.sample_rate(),
            frames: buffer.frames(),
            format,
            source,
            decoder,
            warnings,
        };
        self.set_audio(buffer, format, source);
        Ok(report)
    }

    /// Replaces the buffer, dropping every cached result and any running scan.
    pub fn set_audio(&mut self, buffer: AudioBuffer, format: SampleFormat, source: FormatSource) {
        self.cancel_search();
        let mono = mix(&buffer);
        self.buffer_version += 1;
        log::info!(
            "session buffer v{}: {} ch, {} frames at {} Hz, {} ({:?})",
            self.buffer_version,
            buffer.channel_count(),
            buffer.frames(),
            buffer.sample_rate(),
            format,
            source
        );
        self.audio = Some(Audio {
            buffer: Arc::new(buffer),
            mono: Arc::new(mono),
            format,
            source,
        });
        self.tail = None;
        self.offset = None;
    }

    /// Current search configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Replaces the configuration. A changed config drops cached results and
    /// cancels any running scan.
    pub fn set_config(&mut self, config: SearchConfig) -> EngineResult<()> {
        config.validate()?;
        if config == self.config {
            return Ok(());
        }
        self.cancel_search();
        self.config = config;
        self.config_version += 1;
        self.tail = None;
        self.offset = None;
        log::debug!("session config v{}", self.config_version);
        Ok(())
    }

    /// Incremented every time the buffer is replaced.
    pub fn buffer_version(&self) -> u64 {
        self.buffer_version
    }

    /// Incremented every time the config changes.
    pub fn config_version(&self) -> u64 {
        self.config_version
    }

    /// The loaded buffer.
    pub fn buffer(&self) -> Option<&AudioBuffer> {
        self.audio.as_ref().map(|a| a.buffer.as_ref())
    }

    /// Mono mixdown of the loaded buffer.
    pub fn mono(&self) -> Option<&MonoTrack> {
        self.audio.as_ref().map(|a| a.mono.as_ref())
    }

    /// Format attached to the loaded buffer.
    pub fn format(&self) -> Option<SampleFormat> {
        self.audio.as_ref().map(|a| a.format)
    }

    /// Where the attached format came from.
    pub fn format_source(&self) -> Option<FormatSource> {
        self.audio.as_ref().map(|a| a.source)
    }

    fn audio(&self) -> EngineResult<&Audio> {
        self.audio.as_ref().ok_or(EngineError::NoAudio)
    }

    fn key(&self) -> CacheKey {
        CacheKey {
            buffer_version: self.buffer_version,
            config_version: self.config_version,
        }
    }

    /// Clamps a requested loop begin to `[0, N - window_size - 1]`, the range
    /// in which Stage A has at least one candidate.
    pub fn clamp_loop_begin(&self, frame: usize) -> EngineResult<usize> {
        let frames = self.audio()?.buffer.frames();
        let upper = frames.saturating_sub(self.config.window_size + 1);
        Ok(frame.min(upper))
    }

    /// Starts Stage A from `begin`, cancelling any running scan first.
    ///
    /// Returns a token that cancels this scan.
    pub fn start_tail_search(&mut self, begin: usize) -> EngineResult<CancelToken> {
        self.cancel_search();
        let scan = TailScan::new(Arc::clone(&self.audio()?.mono), begin, &self.config)?;
        Ok(self.activate(ActiveScan::Tail(scan)))
    }

    /// Starts Stage B for the length of `origin`, cancelling any running scan
    /// first.
    pub fn start_offset_search(&mut self, origin: LoopCandidate) -> EngineResult<CancelToken> {
        self.cancel_search();
        let scan = OffsetScan::new(Arc::clone(&self.audio()?.mono), origin, &self.config)?;
        Ok(self.activate(ActiveScan::Offset(scan)))
    }

    fn activate(&mut self, scan: ActiveScan) -> CancelToken {
        let cancel = CancelToken::new();
        self.active = Some(ActiveSearch {
            key: self.key(),
            scan,
            cancel: cancel.clone(),
        });
        cancel
    }

    /// Whether a scan is in flight.
    pub fn is_searching(&self) -> bool {
        self.active.is_some()
    }

    /// Cancels and discards the running scan. Returns whether there was one.
    pub fn cancel_search(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.cancel.cancel();
                log::debug!("search cancelled by session");
                true
            }
            None => false,
        }
    }

    /// Advances the running scan by one chunk.
    pub fn poll_search(&mut self) -> SearchPoll {
        let Some(active) = self.active.as_mut() else {
            return SearchPoll::Idle;
        };
        if active.cancel.is_cancelled() {
            self.active = None;
            return SearchPoll::Cancelled;
        }

        let step = match &mut active.scan {
            ActiveScan::Tail(scan) => match scan.step() {
                ScanStep::Suspended(progress) => Err(progress),
                ScanStep::Finished(result) => Ok(SearchOutcome::Tail(result)),
            },
            ActiveScan::Offset(scan) => match scan.step() {
                ScanStep::Suspended(progress) => Err(progress),
                ScanStep::Finished(result) => Ok(SearchOutcome::Offset(result)),
            },
        };
        let key = active.key;
        let cancelled = active.cancel.is_cancelled();

        match step {
            Err(_) if cancelled => {
                self.active = None;
                SearchPoll::Cancelled
            }
            Err(progress) => SearchPoll::Running(progress),
            Ok(outcome) => {
                self.active = None;
                self.publish(key, &outcome);
                SearchPoll::Finished(outcome)
            }
        }
    }

    fn publish(&mut self, key: CacheKey, outcome: &SearchOutcome) {
        if key != self.key() {
            return;
        }
        match outcome {
            SearchOutcome::Tail(result) => {
                self.tail = Some((key, Arc::clone(result)));
                // Stage B depends on the Stage A candidate.
                self.offset = None;
            }
            SearchOutcome::Offset(result) => {
                self.offset = Some((key, Arc::clone(result)));
            }
        }
    }

    /// Drives the running scan to completion.
    ///
    /// `cancel` is checked after every chunk in addition to the scan's own
    /// token. Cancellation yields [`EngineError::Cancelled`].
    pub fn wait_search(
        &mut self,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(SearchProgress),
    ) -> EngineResult<SearchOutcome> {
        loop {
            match self.poll_search() {
                SearchPoll::Idle => return Err(EngineError::NoSearch),
                SearchPoll::Running(progress) => {
                    on_progress(progress);
                    if cancel.is_cancelled() {
                        self.cancel_search();
                        return Err(EngineError::Cancelled);
                    }
                }
                SearchPoll::Finished(outcome) => return Ok(outcome),
                SearchPoll::Cancelled => return Err(EngineError::Cancelled),
            }
        }
    }

    /// Runs Stage A from `begin` to completion.
    pub fn find_loop_end(
        &mut self,
        begin: usize,
        cancel: &CancelToken,
        on_progress: impl FnMut(SearchProgress),
    ) -> EngineResult<Arc<TailSearchResult>> {
        self.start_tail_search(begin)?;
        self.wait_search(cancel, on_progress)?
            .into_tail()
            .ok_or(EngineError::NoSearch)
    }

    /// Runs Stage B for the length of `origin` to completion.
    pub fn find_loop_begin(
        &mut self,
        origin: LoopCandidate,
        cancel: &CancelToken,
        on_progress: impl FnMut(SearchProgress),
    ) -> EngineResult<Arc<OffsetSearchResult>> {
        self.start_offset_search(origin)?;
        self.wait_search(cancel, on_progress)?
            .into_offset()
            .ok_or(EngineError::NoSearch)
    }

    /// The Stage A result for the current buffer and config.
    pub fn tail_result(&self) -> Option<Arc<TailSearchResult>> {
        match &self.tail {
            Some((key, result)) if *key == self.key() => Some(Arc::clone(result)),
            _ => None,
        }
    }

    /// The Stage B result for the current buffer and config.
    pub fn offset_result(&self) -> Option<Arc<OffsetSearchResult>> {
        match &self.offset {
            Some((key, result)) if *key == self.key() => Some(Arc::clone(result)),
            _ => None,
        }
    }

    /// Snaps a picked loop end against the Stage A curve.
    ///
    /// When no local minimum is nearby the cursor is kept, but never at or
    /// before the loop begin.
    pub fn snap_loop_end(&self, cursor: usize) -> EngineResult<LoopCandidate> {
        let frames = self.audio()?.buffer.frames();
        let result = self.tail_result().ok_or(EngineError::NoSearch)?;
        let begin = result.candidate.begin;
        let snapped = snap_to_local_minimum(&result.curve, cursor, self.config.snap_distance);
        let end = if snapped == cursor {
            cursor.max(begin + 1)
        } else {
            snapped
        };
        LoopCandidate::new(begin, end.min(frames), frames)
    }

    /// Snaps a picked loop begin against the Stage B curve, keeping the loop
    /// length and the loop inside the buffer.
    pub fn snap_loop_begin(&self, cursor: usize) -> EngineResult<LoopCandidate> {
        let frames = self.audio()?.buffer.frames();
        let result = self.offset_result().ok_or(EngineError::NoSearch)?;
        let length = result.length();
        let snapped = snap_to_local_minimum(&result.curve, cursor, self.config.snap_distance);
        let begin = snapped.min(frames - length);
        LoopCandidate::new(begin, begin + length, frames)
    }

    /// Encodes head, loop and tail of `candidate` in the attached format.
    pub fn export_split(&self, candidate: LoopCandidate) -> EngineResult<LoopSplit> {
        let audio = self.audio()?;
        split_loop(&audio.buffer, candidate, audio.format)
    }

    /// Re-encodes the whole buffer in the attached format.
    pub fn export_full(&self) -> EngineResult<Vec<u8>> {
        let audio = self.audio()?;
        encode_full(&audio.buffer, audio.format)
    }

    /// Waveform envelope of the mono track.
    pub fn overview(&self, ratio: usize) -> EngineResult<WaveformOverview> {
        Ok(WaveformOverview::new(&self.audio()?.mono, ratio))
    }
}
