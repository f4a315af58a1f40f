//! Quantization format inference for generically decoded audio.

use crate::buffer::AudioBuffer;

use super::format::SampleFormat;

/// Largest rounding error, in grid steps, still accepted as quantization noise.
pub const INFERENCE_THRESHOLD: f64 = 1.0 / 512.0;

/// Integer hypotheses tried before falling back to `Float32`.
const HYPOTHESES: [SampleFormat; 3] = [
    SampleFormat::Int16,
    SampleFormat::Int16Asymmetric,
    SampleFormat::Int24,
];

/// Worst distance between a sample and the nearest point of `format`'s grid.
///
/// Each channel stops scanning once its own error reaches the threshold, since
/// further samples cannot lower the worst case. Every channel is still visited.
/// `Float32` has no grid and always yields zero.
pub fn max_grid_error(buffer: &AudioBuffer, format: SampleFormat) -> f64 {
    let mut worst = 0.0f64;
    for channel in buffer.channels() {
        let mut local = 0.0f64;
        for &sample in channel {
            let Some(v) = format.to_grid(sample) else {
                return 0.0;
            };
            let err = (v.round() - v).abs();
            local = if err.is_nan() { f64::INFINITY } else { local.max(err) };
            if local >= INFERENCE_THRESHOLD {
                break;
            }
        }
        worst = worst.max(local);
    }
    worst
}

/// Guesses which quantization produced `buffer`.
///
/// Hypotheses are tried in the order `Int16`, `Int16Asymmetric`, `Int24`; the
/// first whose worst rounding error stays below [`INFERENCE_THRESHOLD`] wins.
/// Anything else is reported as `Float32`.
pub fn infer_format(buffer: &AudioBuffer) -> SampleFormat {
    for format in HYPOTHESES {
        let err = max_grid_error(buffer, format);
        log::trace!("format hypothesis {}: worst grid error {:.6}", format, err);
        if err < INFERENCE_THRESHOLD {
            return format;
        }
    }
    SampleFormat::Float32
}
