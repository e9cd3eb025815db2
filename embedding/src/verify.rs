use serde::{Deserialize, Serialize};

/// Minimum cosine similarity for an accept decision (strict `>`).
///
/// Tuned against the deployed model artifact; retune when the model or
/// post-processing changes.
pub const MATCH_THRESHOLD: f32 = 0.6;

/// Outcome of comparing a test embedding against an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the score cleared [`MATCH_THRESHOLD`].
    pub is_match: bool,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// Accumulates in f64 for precision. Returns 0 when either vector has
/// zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for i in 0..n {
        let (x, y) = (a[i] as f64, b[i] as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Compares an enrollment embedding against a test embedding.
///
/// The similarity itself is symmetric; the argument order is call-site
/// semantics only.
pub fn verify(enrollment: &[f32], test: &[f32]) -> Verification {
    let score = cosine_similarity(enrollment, test);
    Verification {
        is_match: score > MATCH_THRESHOLD,
        score,
    }
}
