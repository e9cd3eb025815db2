use crate::{decode_wav, resample, AudioError};

/// Sample rate the embedding model was trained on.
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of samples in one segment of `segment_seconds` at 16 kHz.
pub fn segment_samples(segment_seconds: f32) -> usize {
    (segment_seconds * SAMPLE_RATE as f32) as usize
}

/// Decodes an encoded audio buffer into mono f32 samples at 16 kHz.
pub fn load_mono_16k(bytes: &[u8]) -> Result<Vec<f32>, AudioError> {
    let (samples, rate) = decode_wav(bytes)?;
    tracing::debug!(native_hz = rate, samples = samples.len(), "decoded audio");
    resample(&samples, rate, SAMPLE_RATE)
}

/// Splits a 16 kHz signal into consecutive non-overlapping segments of
/// exactly `segment_seconds` each.
///
/// The trailing remainder shorter than one segment is discarded, never
/// padded. A signal shorter than one segment yields an empty vec;
/// callers must treat that as insufficient audio rather than proceed.
pub fn split_segments(samples: &[f32], segment_seconds: f32) -> Vec<&[f32]> {
    let step = segment_samples(segment_seconds);
    if step == 0 {
        return Vec::new();
    }
    samples.chunks_exact(step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_samples_one_second() {
        assert_eq!(segment_samples(1.0), 16_000);
        assert_eq!(segment_samples(0.5), 8_000);
    }

    #[test]
    fn split_exact_multiple() {
        let samples = vec![0.0f32; 32_000];
        let segments = split_segments(&samples, 1.0);
        assert_eq!(segments.len(), 2);
        for seg in segments {
            assert_eq!(seg.len(), 16_000);
        }
    }

    #[test]
    fn split_drops_remainder() {
        // 2.75 seconds -> two full one-second segments, tail dropped.
        let samples = vec![0.0f32; 44_000];
        let segments = split_segments(&samples, 1.0);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn split_too_short_is_empty() {
        let samples = vec![0.0f32; 15_999];
        assert!(split_segments(&samples, 1.0).is_empty());
    }

    #[test]
    fn split_empty_signal() {
        assert!(split_segments(&[], 1.0).is_empty());
    }

    #[test]
    fn split_zero_duration() {
        let samples = vec![0.0f32; 16_000];
        assert!(split_segments(&samples, 0.0).is_empty());
    }

    #[test]
    fn segments_are_consecutive() {
        let samples: Vec<f32> = (0..32_000).map(|i| i as f32).collect();
        let segments = split_segments(&samples, 1.0);
        assert_eq!(segments[0][0], 0.0);
        assert_eq!(segments[1][0], 16_000.0);
        assert_eq!(segments[1][15_999], 31_999.0);
    }
}
