use std::sync::Arc;

use serde::{Deserialize, Serialize};
use voxauth_audio::{load_mono_16k, segment_samples, split_segments};

use crate::mfcc::{compute_mfcc, MfccConfig};
use crate::model::BottleneckModel;
use crate::transform::{AffineTransform, LinearProjection};
use crate::EmbeddingError;

/// Optional post-processing applied to each raw bottleneck output.
///
/// Both steps default to absent, i.e. identity. When both are present
/// the order is fixed: scale first, then project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostProcess {
    pub scaler: Option<AffineTransform>,
    pub projection: Option<LinearProjection>,
}

impl PostProcess {
    pub fn apply(&self, mut embedding: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(scaler) = &self.scaler {
            scaler.apply_vec(&mut embedding)?;
        }
        if let Some(projection) = &self.projection {
            embedding = projection.project(&embedding)?;
        }
        Ok(embedding)
    }
}

/// Configuration for [`EmbeddingExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Name of the model layer whose activation is the embedding.
    pub bottleneck: String,
    /// Segment duration in seconds (default: 1.0).
    pub segment_seconds: f32,
    /// Cepstral feature configuration.
    pub mfcc: MfccConfig,
    /// Optional embedding post-processing.
    pub post: PostProcess,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            bottleneck: "bottleneck".to_string(),
            segment_seconds: 1.0,
            mfcc: MfccConfig::default(),
            post: PostProcess::default(),
        }
    }
}

/// The constructed-once pipeline context.
///
/// Holds the shared model and the fitted transform parameters; build it
/// at process startup and share it read-only across requests. Nothing
/// here is mutated during extraction.
pub struct EmbeddingExtractor {
    model: Arc<dyn BottleneckModel>,
    feature_scaler: AffineTransform,
    cfg: ExtractorConfig,
}

impl EmbeddingExtractor {
    /// Creates an extractor from a loaded model, the offline-fitted
    /// feature scaler, and the pipeline configuration.
    pub fn new(
        model: Arc<dyn BottleneckModel>,
        feature_scaler: AffineTransform,
        cfg: ExtractorConfig,
    ) -> Self {
        Self {
            model,
            feature_scaler,
            cfg,
        }
    }

    /// Width of the final embedding after optional projection.
    pub fn dimension(&self) -> usize {
        match &self.cfg.post.projection {
            Some(p) => p.output_dim(),
            None => self.model.dimension(),
        }
    }

    /// Embeds one 16 kHz segment: features -> scale -> infer -> postprocess.
    pub fn embed_segment(&self, samples: &[f32]) -> Result<Vec<f32>, EmbeddingError> {
        let mut features = compute_mfcc(samples, &self.cfg.mfcc)?;
        self.feature_scaler.apply_rows(&mut features)?;
        let raw = self
            .model
            .infer_at_layer(features.view(), &self.cfg.bottleneck)?;
        self.cfg.post.apply(raw)
    }

    /// Embeds a whole recording from encoded audio bytes.
    ///
    /// Decodes and resamples, splits into fixed segments, embeds each
    /// segment, and averages. Fails with
    /// [`EmbeddingError::InsufficientAudio`] when the signal is shorter
    /// than one segment; never returns a partial aggregate.
    pub fn embed_recording(&self, audio: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
        let samples = load_mono_16k(audio)?;
        let segments = split_segments(&samples, self.cfg.segment_seconds);
        if segments.is_empty() {
            return Err(EmbeddingError::InsufficientAudio {
                need: segment_samples(self.cfg.segment_seconds),
                got: samples.len(),
            });
        }
        tracing::debug!(segments = segments.len(), "segmented recording");

        let mut embeddings = Vec::with_capacity(segments.len());
        for segment in &segments {
            embeddings.push(self.embed_segment(segment)?);
        }
        aggregate(&embeddings)
    }
}

/// Element-wise arithmetic mean over per-segment embeddings.
///
/// Fails with [`EmbeddingError::EmptyInput`] for an empty set; callers
/// reaching aggregation are expected to have guaranteed at least one
/// segment already.
pub fn aggregate(embeddings: &[Vec<f32>]) -> Result<Vec<f32>, EmbeddingError> {
    let Some(first) = embeddings.first() else {
        return Err(EmbeddingError::EmptyInput);
    };
    let dim = first.len();

    let mut sum = vec![0.0f64; dim];
    for emb in embeddings {
        if emb.len() != dim {
            return Err(EmbeddingError::Inference(format!(
                "embedding dimension changed during aggregation: {} vs {}",
                dim,
                emb.len()
            )));
        }
        for (acc, &v) in sum.iter_mut().zip(emb) {
            *acc += v as f64;
        }
    }
    let n = embeddings.len() as f64;
    Ok(sum.into_iter().map(|v| (v / n) as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView2;
    use std::io::Cursor;

    /// Deterministic stand-in for a trained network: each output
    /// coordinate is a fixed linear functional of the feature matrix.
    struct StubModel {
        dim: usize,
    }

    impl BottleneckModel for StubModel {
        fn infer_at_layer(
            &self,
            features: ArrayView2<'_, f32>,
            layer: &str,
        ) -> Result<Vec<f32>, EmbeddingError> {
            if layer != "bottleneck" {
                return Err(EmbeddingError::Inference(format!(
                    "bottleneck layer {layer:?} not found among model outputs"
                )));
            }
            let (frames, width) = features.dim();
            let mut out = vec![0.0f32; self.dim];
            for (k, v) in out.iter_mut().enumerate() {
                let col = k % width;
                let mean: f32 =
                    (0..frames).map(|t| features[[t, col]]).sum::<f32>() / frames as f32;
                *v = mean * (k + 1) as f32 / self.dim as f32;
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            self.dim
        }
    }

    fn extractor(cfg: ExtractorConfig) -> EmbeddingExtractor {
        let width = cfg.mfcc.feature_width();
        EmbeddingExtractor::new(
            Arc::new(StubModel { dim: 128 }),
            AffineTransform::identity(width),
            cfg,
        )
    }

    fn wav_sine(seconds: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let n = (seconds * 16000.0) as usize;
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..n {
                let t = i as f32 / 16000.0;
                let s = ((440.0 * 2.0 * std::f32::consts::PI * t).sin() * 16000.0) as i16;
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn aggregate_is_elementwise_mean() {
        let avg = aggregate(&[vec![1.0, 3.0], vec![3.0, 5.0]]).unwrap();
        assert_eq!(avg, vec![2.0, 4.0]);
    }

    #[test]
    fn aggregate_single_is_identity() {
        let avg = aggregate(&[vec![0.5, -0.5]]).unwrap();
        assert_eq!(avg, vec![0.5, -0.5]);
    }

    #[test]
    fn aggregate_empty_fails() {
        assert!(matches!(aggregate(&[]), Err(EmbeddingError::EmptyInput)));
    }

    #[test]
    fn aggregate_order_independent() {
        let a = vec![0.1f32, 0.9, -0.4];
        let b = vec![0.7f32, -0.2, 0.3];
        let c = vec![-0.5f32, 0.6, 0.8];
        let fwd = aggregate(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let rev = aggregate(&[c, b, a]).unwrap();
        for (x, y) in fwd.iter().zip(&rev) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn aggregate_rejects_mixed_dimensions() {
        let err = aggregate(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, EmbeddingError::Inference(_)));
    }

    #[test]
    fn embed_segment_has_model_dimension() {
        let ex = extractor(ExtractorConfig::default());
        let samples: Vec<f32> = (0..16000)
            .map(|i| (330.0 * 2.0 * std::f32::consts::PI * i as f32 / 16000.0).sin())
            .collect();
        let emb = ex.embed_segment(&samples).unwrap();
        assert_eq!(emb.len(), 128);
        assert_eq!(ex.dimension(), 128);
    }

    #[test]
    fn embed_recording_deterministic() {
        let ex = extractor(ExtractorConfig::default());
        let wav = wav_sine(2.5);
        let a = ex.embed_recording(&wav).unwrap();
        let b = ex.embed_recording(&wav).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn embed_recording_too_short() {
        let ex = extractor(ExtractorConfig::default());
        let err = ex.embed_recording(&wav_sine(0.5)).unwrap_err();
        assert!(matches!(err, EmbeddingError::InsufficientAudio { .. }));
    }

    #[test]
    fn embed_recording_undecodable() {
        let ex = extractor(ExtractorConfig::default());
        let err = ex.embed_recording(b"not audio at all").unwrap_err();
        assert!(matches!(err, EmbeddingError::Decode(_)));
    }

    #[test]
    fn missing_bottleneck_layer_surfaces() {
        let cfg = ExtractorConfig {
            bottleneck: "no_such_layer".to_string(),
            ..ExtractorConfig::default()
        };
        let ex = extractor(cfg);
        let err = ex.embed_recording(&wav_sine(1.5)).unwrap_err();
        assert!(matches!(err, EmbeddingError::Inference(_)));
    }

    #[test]
    fn feature_scaler_width_mismatch_surfaces() {
        let ex = EmbeddingExtractor::new(
            Arc::new(StubModel { dim: 128 }),
            AffineTransform::identity(64),
            ExtractorConfig::default(),
        );
        let err = ex.embed_recording(&wav_sine(1.5)).unwrap_err();
        assert!(matches!(err, EmbeddingError::FeatureExtraction(_)));
    }

    #[test]
    fn postprocess_identity_by_default() {
        let post = PostProcess::default();
        let emb = post.apply(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(emb, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn postprocess_scales_then_projects() {
        // Scaler halves both coordinates, projection sums them.
        let post = PostProcess {
            scaler: Some(AffineTransform {
                offset: vec![0.0, 0.0],
                scale: vec![2.0, 2.0],
            }),
            projection: Some(LinearProjection {
                offset: vec![0.0, 0.0],
                weights: vec![vec![1.0], vec![1.0]],
            }),
        };
        let emb = post.apply(vec![4.0, 6.0]).unwrap();
        assert_eq!(emb, vec![5.0]);
    }

    #[test]
    fn projection_changes_extractor_dimension() {
        let mut cfg = ExtractorConfig::default();
        cfg.post.projection = Some(LinearProjection {
            offset: vec![0.0; 128],
            weights: vec![vec![0.0; 32]; 128],
        });
        let ex = extractor(cfg);
        assert_eq!(ex.dimension(), 32);
        let emb = ex.embed_recording(&wav_sine(1.5)).unwrap();
        assert_eq!(emb.len(), 32);
    }
}
