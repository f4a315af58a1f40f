//! Loading through the session, including the hound fallback path.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use seamloop_engine::codec::decode;
use seamloop_engine::{
    CancelToken, FormatSource, HoundDecoder, LoopCandidate, LoopSession, SampleFormat, SplitPart,
};

fn hound_wav(bits_per_sample: u16, samples: &[i32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 32000,
        bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn test_int32_on_16bit_grid_infers_int16() {
    let mut rng = Pcg32::seed_from_u64(1);
    let samples: Vec<i32> = (0..2000)
        .map(|_| (rng.gen_range(-32768i32..32768)) << 16)
        .collect();
    let bytes = hound_wav(32, &samples);

    let mut session = LoopSession::default();
    let report = session.load(&bytes, Some(&HoundDecoder)).unwrap();
    assert_eq!(report.channels, 2);
    assert_eq!(report.frames, 1000);
    assert_eq!(report.sample_rate, 32000);
    assert_eq!(report.source, FormatSource::Inferred);
    assert_eq!(report.format, SampleFormat::Int16);
    assert_eq!(report.decoder, "hound");
    assert_eq!(session.format_source(), Some(FormatSource::Inferred));

    // Exports land on the inferred 16-bit grid.
    let exported = decode(&session.export_full().unwrap()).unwrap();
    assert_eq!(exported.format, SampleFormat::Int16);
    assert!(&exported.buffer == session.buffer().unwrap());
}

#[test]
fn test_int32_full_resolution_infers_float() {
    let mut rng = Pcg32::seed_from_u64(2);
    let samples: Vec<i32> = (0..2000).map(|_| rng.gen()).collect();
    let bytes = hound_wav(32, &samples);

    let mut session = LoopSession::default();
    let report = session.load(&bytes, Some(&HoundDecoder)).unwrap();
    assert_eq!(report.format, SampleFormat::Float32);
    assert!(report.warnings.iter().any(|w| w.contains("lossy")));
}

#[test]
fn test_without_fallback_int32_is_rejected() {
    let bytes = hound_wav(32, &[0, 0]);
    let mut session = LoopSession::default();
    let err = session.load(&bytes, None).unwrap_err();
    assert_eq!(err.category(), "decode");
    assert!(session.buffer().is_none());
}

#[test]
fn test_load_find_and_split() {
    // Two channels of a 50-frame sawtooth on the 16-bit grid.
    let mut samples = Vec::new();
    for i in 0..1000i32 {
        let v = ((i % 50) - 25) * 1000;
        samples.push(v << 16);
        samples.push(v << 16);
    }
    let bytes = hound_wav(32, &samples);

    let mut session = LoopSession::default();
    session.load(&bytes, Some(&HoundDecoder)).unwrap();
    let begin = session.clamp_loop_begin(120).unwrap();
    let tail = session
        .find_loop_end(begin, &CancelToken::new(), |_| {})
        .unwrap();
    assert_eq!(tail.candidate, LoopCandidate { begin: 120, end: 170 });

    let split = session.export_split(tail.candidate).unwrap();
    let lengths: Vec<(SplitPart, usize)> = split
        .parts()
        .map(|(part, bytes)| (part, decode(bytes).unwrap().buffer.frames()))
        .collect();
    assert_eq!(
        lengths,
        vec![
            (SplitPart::Head, 120),
            (SplitPart::Loop, 50),
            (SplitPart::Tail, 830),
        ]
    );
}
