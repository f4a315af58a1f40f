//! Head / loop / tail export of a loop candidate.

use std::fmt;

use serde::Serialize;

use crate::buffer::AudioBuffer;
use crate::codec::{encode, SampleFormat};
use crate::error::EngineResult;
use crate::search::LoopCandidate;

/// One of the three regions a loop splits a buffer into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPart {
    /// `[0, begin)`
    Head,
    /// `[begin, end)`
    Loop,
    /// `[end, N)`
    Tail,
}

impl SplitPart {
    /// All parts in playback order.
    pub const ALL: [SplitPart; 3] = [SplitPart::Head, SplitPart::Loop, SplitPart::Tail];

    /// File name suffix, appended to the source stem.
    pub fn suffix(&self) -> &'static str {
        match self {
            SplitPart::Head => "_head",
            SplitPart::Loop => "_loop",
            SplitPart::Tail => "_tail",
        }
    }

    /// Frame range of this part.
    pub fn range(&self, candidate: &LoopCandidate, frames: usize) -> (usize, usize) {
        match self {
            SplitPart::Head => (0, candidate.begin),
            SplitPart::Loop => (candidate.begin, candidate.end),
            SplitPart::Tail => (candidate.end, frames),
        }
    }
}

impl fmt::Display for SplitPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SplitPart::Head => "head",
            SplitPart::Loop => "loop",
            SplitPart::Tail => "tail",
        })
    }
}

/// Encoded WAV blobs for each non-empty part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopSplit {
    /// Intro before the loop.
    pub head: Option<Vec<u8>>,
    /// The repeating region.
    pub body: Option<Vec<u8>>,
    /// Release after the loop.
    pub tail: Option<Vec<u8>>,
}

impl LoopSplit {
    /// The blob for `part`, if that part is non-empty.
    pub fn get(&self, part: SplitPart) -> Option<&[u8]> {
        match part {
            SplitPart::Head => self.head.as_deref(),
            SplitPart::Loop => self.body.as_deref(),
            SplitPart::Tail => self.tail.as_deref(),
        }
    }

    /// Present parts in playback order.
    pub fn parts(&self) -> impl Iterator<Item = (SplitPart, &[u8])> {
        SplitPart::ALL
            .into_iter()
            .filter_map(move |part| self.get(part).map(|bytes| (part, bytes)))
    }
}

/// Encodes the three regions of `candidate` in `format`.
///
/// Parts with no frames are left as `None`.
pub fn split_loop(
    buffer: &AudioBuffer,
    candidate: LoopCandidate,
    format: SampleFormat,
) -> EngineResult<LoopSplit> {
    let candidate = LoopCandidate::new(candidate.begin, candidate.end, buffer.frames())?;
    let render = |part: SplitPart| -> EngineResult<Option<Vec<u8>>> {
        let (start, stop) = part.range(&candidate, buffer.frames());
        if stop == start {
            return Ok(None);
        }
        encode(buffer, start, stop - start, format).map(Some)
    };

    let split = LoopSplit {
        head: render(SplitPart::Head)?,
        body: render(SplitPart::Loop)?,
        tail: render(SplitPart::Tail)?,
    };
    log::debug!(
        "split {}..{} of {} frames as {}",
        candidate.begin,
        candidate.end,
        buffer.frames(),
        format
    );
    Ok(split)
}

/// Re-encodes the whole buffer, for comparing against the source file.
pub fn encode_full(buffer: &AudioBuffer, format: SampleFormat) -> EngineResult<Vec<u8>> {
    encode(buffer, 0, buffer.frames(), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, HEADER_LEN};
    use pretty_assertions::assert_eq;

    fn ramp(frames: usize) -> AudioBuffer {
        let left = (0..frames).map(|i| i as f32 / 32768.0).collect();
        let right = (0..frames).map(|i| -(i as f32) / 32768.0).collect();
        AudioBuffer::new(44100, vec![left, right]).unwrap()
    }

    #[test]
    fn test_three_parts() {
        let buffer = ramp(100);
        let candidate = LoopCandidate { begin: 10, end: 70 };
        let split = split_loop(&buffer, candidate, SampleFormat::Int16).unwrap();

        let parts: Vec<_> = split.parts().map(|(p, b)| (p, b.len())).collect();
        assert_eq!(
            parts,
            vec![
                (SplitPart::Head, HEADER_LEN + 10 * 4),
                (SplitPart::Loop, HEADER_LEN + 60 * 4),
                (SplitPart::Tail, HEADER_LEN + 30 * 4),
            ]
        );

        let body = decode(split.get(SplitPart::Loop).unwrap()).unwrap();
        assert_eq!(body.buffer.channel(0)[0], 10.0 / 32768.0);
        assert_eq!(body.buffer.channel(1)[59], -69.0 / 32768.0);
    }

    #[test]
    fn test_empty_parts_omitted() {
        let buffer = ramp(50);
        let split = split_loop(&buffer, LoopCandidate { begin: 0, end: 50 }, SampleFormat::Int24)
            .unwrap();
        assert!(split.head.is_none());
        assert!(split.tail.is_none());
        assert_eq!(split.parts().count(), 1);
    }

    #[test]
    fn test_invalid_candidate() {
        let buffer = ramp(50);
        assert!(split_loop(&buffer, LoopCandidate { begin: 20, end: 60 }, SampleFormat::Int16)
            .is_err());
        assert!(split_loop(&buffer, LoopCandidate { begin: 20, end: 20 }, SampleFormat::Int16)
            .is_err());
    }

    #[test]
    fn test_full_reencode() {
        let buffer = ramp(32);
        let bytes = encode_full(&buffer, SampleFormat::Float32).unwrap();
        assert_eq!(decode(&bytes).unwrap().buffer, buffer);
    }

    #[test]
    fn test_suffixes() {
        let names: Vec<_> = SplitPart::ALL.iter().map(|p| format!("clip{}.wav", p.suffix())).collect();
        assert_eq!(names, vec!["clip_head.wav", "clip_loop.wav", "clip_tail.wav"]);
    }
}
