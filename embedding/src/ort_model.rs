use std::sync::Mutex;

use ndarray::ArrayView2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;

use crate::model::BottleneckModel;
use crate::EmbeddingError;

/// Configuration for [`OrtModel`].
#[derive(Debug, Clone)]
pub struct OrtModelConfig {
    /// Graph input name (default: "features").
    pub input_name: String,
    /// Expected bottleneck width (default: 128).
    pub dim: usize,
    /// Intra-op thread count (default: 1).
    pub intra_threads: usize,
}

impl Default for OrtModelConfig {
    fn default() -> Self {
        Self {
            input_name: "features".to_string(),
            dim: 128,
            intra_threads: 1,
        }
    }
}

/// [`BottleneckModel`] implementation backed by ONNX Runtime.
///
/// The exported model must declare the bottleneck activation as a named
/// graph output; `infer_at_layer` selects it from the session outputs
/// and fails with [`EmbeddingError::Inference`] when the name is
/// missing.
///
/// The session is loaded once and shared for the process lifetime.
/// `Session::run` needs exclusive access, so calls are serialized
/// through an internal mutex; this is the only synchronization point
/// in the pipeline.
pub struct OrtModel {
    session: Mutex<Session>,
    input_name: String,
    dim: usize,
}

impl OrtModel {
    /// Creates a model from in-memory ONNX bytes.
    pub fn from_memory(model_bytes: &[u8], cfg: OrtModelConfig) -> Result<Self, EmbeddingError> {
        let session = Session::builder()
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?
            .with_intra_threads(cfg.intra_threads)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?
            .commit_from_memory(model_bytes)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
        Ok(Self::from_session(session, cfg))
    }

    /// Wraps a session the host has already loaded.
    pub fn from_session(session: Session, cfg: OrtModelConfig) -> Self {
        Self {
            session: Mutex::new(session),
            input_name: cfg.input_name,
            dim: cfg.dim,
        }
    }
}

impl BottleneckModel for OrtModel {
    fn infer_at_layer(
        &self,
        features: ArrayView2<'_, f32>,
        layer: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let (frames, width) = features.dim();

        // Batch as a single example: [1, frames, width].
        let data: Vec<f32> = features.iter().copied().collect();
        let input = Value::from_array(([1usize, frames, width], data))
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        let value = outputs.get(layer).ok_or_else(|| {
            EmbeddingError::Inference(format!(
                "bottleneck layer {layer:?} not found among model outputs"
            ))
        })?;
        let (_, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        if data.len() != self.dim {
            return Err(EmbeddingError::Inference(format!(
                "bottleneck width mismatch: expected {}, model produced {}",
                self.dim,
                data.len()
            )));
        }
        Ok(data.to_vec())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
