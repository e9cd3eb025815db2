//! Audio front-end for the voice-biometric pipeline.
//!
//! Takes an in-memory encoded audio buffer and turns it into the
//! fixed-rate segments the embedding stages consume:
//!
//! 1. [`decode_wav`]: WAV bytes -> mono f32 samples at the native rate
//! 2. [`resample`]: native rate -> [`SAMPLE_RATE`] (16 kHz)
//! 3. [`split_segments`]: signal -> non-overlapping fixed-length segments
//!
//! [`load_mono_16k`] composes the first two steps. Everything here is a
//! pure function of its input; nothing is cached between calls.

mod decode;
mod error;
mod resample;
mod segment;

pub use decode::decode_wav;
pub use error::AudioError;
pub use resample::resample;
pub use segment::{load_mono_16k, segment_samples, split_segments, SAMPLE_RATE};
