use thiserror::Error;
use voxauth_audio::AudioError;

/// Errors returned by the embedding pipeline.
///
/// All failures surface synchronously to the caller; nothing is
/// retried and no partial result is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("audio decode failed: {0}")]
    Decode(#[from] AudioError),

    #[error("insufficient audio: need at least {need} samples at 16 kHz, got {got}")]
    InsufficientAudio { need: usize, got: usize },

    #[error("feature extraction failed: {0}")]
    FeatureExtraction(String),

    #[error("cannot aggregate an empty set of embeddings")]
    EmptyInput,

    #[error("inference failed: {0}")]
    Inference(String),
}
