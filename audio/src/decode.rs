use std::io::Cursor;

use crate::AudioError;

/// Decodes an in-memory WAV buffer into mono f32 samples in [-1, 1].
///
/// Integer and float PCM encodings are both accepted; multi-channel
/// audio is averaged down to mono. Returns the samples together with
/// the file's native sample rate.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), AudioError> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::Decode("zero channels".into()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    Ok((downmix(samples, spec.channels as usize), spec.sample_rate))
}

/// Averages interleaved channels into a mono signal.
fn downmix(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels == 1 {
        return samples;
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes_i16(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
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
    fn decode_mono_i16() {
        let bytes = wav_bytes_i16(&[0, 16384, -16384, 32767], 1, 16000);
        let (samples, rate) = decode_wav(&bytes).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(samples.len(), 4);
        assert!((samples[1] - 0.5).abs() < 1e-4);
        assert!((samples[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn decode_stereo_downmix() {
        // L=0.5, R=-0.5 per frame averages to 0.
        let bytes = wav_bytes_i16(&[16384, -16384, 16384, -16384], 2, 44100);
        let (samples, rate) = decode_wav(&bytes).unwrap();
        assert_eq!(rate, 44100);
        assert_eq!(samples.len(), 2);
        for s in samples {
            assert!(s.abs() < 1e-4);
        }
    }

    #[test]
    fn decode_float_format() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in [0.25f32, -0.75, 1.0] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        let (samples, _) = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(samples, vec![0.25, -0.75, 1.0]);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }

    #[test]
    fn decode_empty_fails() {
        assert!(decode_wav(&[]).is_err());
    }
}
