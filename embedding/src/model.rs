use ndarray::ArrayView2;

use crate::EmbeddingError;

/// Inference backend that can be tapped at a named internal layer.
///
/// Ordinary inference APIs only return final-layer output; the whole
/// point of this trait is addressing the bottleneck activation by name
/// so the rest of the pipeline stays independent of the runtime.
///
/// # Contract
///
/// - `features` is one segment's normalized feature matrix
///   (`frames x feature_width`); implementations batch it as a single
///   example before running the graph.
/// - The returned vector is the named layer's activation, flattened;
///   its length must equal [`BottleneckModel::dimension`].
/// - Implementations hold no per-call mutable state visible to callers
///   and must be safe to share across threads; if the underlying
///   runtime needs exclusive access, serialize inside the
///   implementation.
pub trait BottleneckModel: Send + Sync {
    /// Runs inference and returns the named layer's activation.
    fn infer_at_layer(
        &self,
        features: ArrayView2<'_, f32>,
        layer: &str,
    ) -> Result<Vec<f32>, EmbeddingError>;

    /// Width of the bottleneck layer (128 in this deployment).
    fn dimension(&self) -> usize;
}
