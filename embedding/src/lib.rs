//! Speaker voice-biometric embedding extraction and verification.
//!
//! # Architecture
//!
//! A recording flows through five stages:
//!
//! 1. `voxauth_audio`: decode + resample to 16 kHz, split into
//!    fixed-duration segments (trailing remainder dropped)
//! 2. [`compute_mfcc`]: per segment, 40 cepstral coefficients over a
//!    60-band mel filterbank plus first- and second-order deltas,
//!    then the offline-fitted feature [`AffineTransform`]
//! 3. [`BottleneckModel::infer_at_layer`]: neural inference tapped at
//!    the named bottleneck layer (128-dim in this deployment)
//! 4. [`PostProcess`]: optional embedding scaler and linear projection,
//!    both identity unless configured
//! 5. [`aggregate`]: arithmetic mean over the per-segment embeddings
//!
//! [`EmbeddingExtractor`] is the constructed-once context that ties the
//! stages together; build it at process startup and share it across
//! requests. [`verify`] compares two aggregated embeddings by cosine
//! similarity against a fixed accept threshold.
//!
//! The fitted transform parameters must be the ones used at model
//! training time, applied identically at enrollment and verification,
//! or the similarity space is meaningless.

mod error;
mod extractor;
mod mfcc;
mod model;
mod ort_model;
mod transform;
mod verify;

pub use error::EmbeddingError;
pub use extractor::{aggregate, EmbeddingExtractor, ExtractorConfig, PostProcess};
pub use mfcc::{compute_mfcc, MfccConfig};
pub use model::BottleneckModel;
pub use ort_model::{OrtModel, OrtModelConfig};
pub use transform::{AffineTransform, LinearProjection};
pub use verify::{cosine_similarity, verify, Verification, MATCH_THRESHOLD};
