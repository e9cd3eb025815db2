use thiserror::Error;

/// Errors returned by audio decoding and resampling.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("resample failed: {0}")]
    Resample(String),
}
