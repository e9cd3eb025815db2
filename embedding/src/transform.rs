use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::EmbeddingError;

/// Per-column affine normalization `(x - offset) / scale`.
///
/// This is the shape of a standard scaler fitted offline on the model's
/// training data; the host loads the exported parameters and passes
/// them in. The same instance must be applied to every segment of every
/// recording, at enrollment and at verification alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffineTransform {
    pub offset: Vec<f32>,
    pub scale: Vec<f32>,
}

impl AffineTransform {
    /// Identity transform over `width` columns.
    pub fn identity(width: usize) -> Self {
        Self {
            offset: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }

    pub fn width(&self) -> usize {
        self.offset.len()
    }

    fn check_width(&self, got: usize) -> Result<(), EmbeddingError> {
        if self.offset.len() != self.scale.len() {
            return Err(EmbeddingError::FeatureExtraction(format!(
                "malformed affine transform: {} offsets vs {} scales",
                self.offset.len(),
                self.scale.len()
            )));
        }
        if got != self.width() {
            return Err(EmbeddingError::FeatureExtraction(format!(
                "transform width mismatch: fitted on {} columns, input has {}",
                self.width(),
                got
            )));
        }
        Ok(())
    }

    /// Applies the transform to every row of a feature matrix in place.
    pub fn apply_rows(&self, features: &mut Array2<f32>) -> Result<(), EmbeddingError> {
        self.check_width(features.ncols())?;
        for mut row in features.rows_mut() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = (*v - self.offset[c]) / self.scale[c];
            }
        }
        Ok(())
    }

    /// Applies the transform to a single vector in place.
    pub fn apply_vec(&self, v: &mut [f32]) -> Result<(), EmbeddingError> {
        self.check_width(v.len())?;
        for (c, x) in v.iter_mut().enumerate() {
            *x = (*x - self.offset[c]) / self.scale[c];
        }
        Ok(())
    }
}

/// Fixed linear dimensionality reduction `(x - offset) . W`.
///
/// This is the shape of a discriminant projection fitted offline;
/// `weights` is laid out input-dim x output-dim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearProjection {
    pub offset: Vec<f32>,
    pub weights: Vec<Vec<f32>>,
}

impl LinearProjection {
    pub fn input_dim(&self) -> usize {
        self.weights.len()
    }

    pub fn output_dim(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    /// Projects a vector into the reduced space.
    pub fn project(&self, v: &[f32]) -> Result<Vec<f32>, EmbeddingError> {
        if v.len() != self.input_dim() || self.offset.len() != self.input_dim() {
            return Err(EmbeddingError::FeatureExtraction(format!(
                "projection dimension mismatch: fitted on {} inputs, got {} (offset {})",
                self.input_dim(),
                v.len(),
                self.offset.len()
            )));
        }
        let out_dim = self.output_dim();
        let mut out = vec![0.0f32; out_dim];
        for (i, row) in self.weights.iter().enumerate() {
            let centered = v[i] - self.offset[i];
            for (j, &w) in row.iter().enumerate() {
                out[j] += centered * w;
            }
        }
        Ok(out)
    }
}
