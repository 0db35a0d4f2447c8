//! Dense vector representation and the native-column codec.
//!
//! [`Vector`] is the in-memory embedding type. [`NativeVector`] is the text
//! literal the backing store's vector column accepts (`[v1,v2,...]`); the
//! codec between the two is lossless because components are written with
//! Rust's shortest round-trip float formatting.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FalaricaError, Result};

/// A dense embedding vector for similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector components as floating point values.
    pub data: Vec<f64>,
}

impl Vector {
    /// Create a new vector with the given components.
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Calculate the L2 norm (magnitude) of this vector.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Normalize this vector to unit length.
    ///
    /// A zero vector is left unchanged; normalization never divides by zero.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Get a normalized copy of this vector.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }

    /// Check if this vector contains any NaN or infinite values.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Validate that this vector has the expected dimension.
    pub fn validate_dimension(&self, expected: Option<usize>) -> Result<()> {
        if let Some(expected) = expected
            && self.data.len() != expected
        {
            return Err(FalaricaError::dimension_mismatch(expected, self.data.len()));
        }
        Ok(())
    }

    /// Normalize multiple vectors, in parallel for large batches.
    pub fn normalize_batch(vectors: &mut [Vector]) {
        if vectors.len() > 64 {
            vectors.par_iter_mut().for_each(|vector| vector.normalize());
        } else {
            for vector in vectors {
                vector.normalize();
            }
        }
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Vector::new(data)
    }
}

/// The backing store's native vector literal: `[v1,v2,...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeVector(String);

impl NativeVector {
    /// Encode a vector into the native literal form.
    ///
    /// When `normalize` is set the encoded components are L2-normalized; the
    /// input is never mutated. Fails with `DimensionMismatch` when the vector
    /// length disagrees with a fixed collection dimensionality.
    pub fn encode(vector: &Vector, dimension: Option<usize>, normalize: bool) -> Result<Self> {
        vector.validate_dimension(dimension)?;
        if !vector.is_valid() {
            return Err(FalaricaError::configuration(
                "embedding contains non-finite values",
            ));
        }

        let normalized;
        let data = if normalize {
            normalized = vector.normalized();
            &normalized.data
        } else {
            &vector.data
        };

        let mut literal = String::with_capacity(2 + data.len() * 8);
        literal.push('[');
        for (i, value) in data.iter().enumerate() {
            if i > 0 {
                literal.push(',');
            }
            // `{}` on f64 is the shortest representation that parses back
            // to the same value, so the round trip is exact.
            literal.push_str(&value.to_string());
        }
        literal.push(']');
        Ok(NativeVector(literal))
    }

    /// Decode the native literal back into a vector.
    pub fn decode(&self) -> Result<Vector> {
        let inner = self
            .0
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| {
                FalaricaError::query_execution(anyhow::anyhow!(
                    "malformed vector literal: {}",
                    self.0
                ))
            })?;

        if inner.is_empty() {
            return Ok(Vector::new(Vec::new()));
        }

        let data = inner
            .split(',')
            .map(|component| {
                component.trim().parse::<f64>().map_err(|e| {
                    FalaricaError::query_execution(anyhow::anyhow!(
                        "malformed vector component {component:?}: {e}"
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Vector::new(data))
    }

    /// The literal text handed to the backing store.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a literal read back from the backing store.
    pub fn from_literal<S: Into<String>>(literal: S) -> Self {
        NativeVector(literal.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let vector = Vector::new(vec![0.1, -2.5, 3.0000001, 0.0, 1e-12]);
        let native = NativeVector::encode(&vector, Some(5), false).unwrap();
        let decoded = native.decode().unwrap();
        assert_eq!(decoded, vector);
    }

    #[test]
    fn test_encode_normalizes() {
        let vector = Vector::new(vec![3.0, 4.0]);
        let native = NativeVector::encode(&vector, None, true).unwrap();
        let decoded = native.decode().unwrap();
        assert!((decoded.norm() - 1.0).abs() < 1e-12);
        assert!((decoded.data[0] - 0.6).abs() < 1e-12);
        assert!((decoded.data[1] - 0.8).abs() < 1e-12);
        // The input is untouched.
        assert_eq!(vector.data, vec![3.0, 4.0]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut vector = Vector::new(vec![1.0, 2.0, 2.0]);
        vector.normalize();
        let once = vector.clone();
        vector.normalize();
        for (a, b) in once.data.iter().zip(vector.data.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalize_zero_vector_is_noop() {
        let mut vector = Vector::new(vec![0.0, 0.0, 0.0]);
        vector.normalize();
        assert_eq!(vector.data, vec![0.0, 0.0, 0.0]);

        let native = NativeVector::encode(&vector, Some(3), true).unwrap();
        assert_eq!(native.decode().unwrap().data, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_encode_dimension_mismatch() {
        let vector = Vector::new(vec![1.0, 2.0]);
        let err = NativeVector::encode(&vector, Some(3), false).unwrap_err();
        match err {
            FalaricaError::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let vector = Vector::new(vec![1.0, f64::NAN]);
        assert!(NativeVector::encode(&vector, None, false).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_literal() {
        assert!(NativeVector::from_literal("1,2,3").decode().is_err());
        assert!(NativeVector::from_literal("[1,x]").decode().is_err());
        assert!(NativeVector::from_literal("[]").decode().unwrap().data.is_empty());
    }

    #[test]
    fn test_normalize_batch() {
        let mut vectors: Vec<Vector> = (0..200)
            .map(|i| Vector::new(vec![i as f64 + 1.0, 0.0]))
            .collect();
        Vector::normalize_batch(&mut vectors);
        for vector in &vectors {
            assert!((vector.norm() - 1.0).abs() < 1e-12);
        }
    }
}
