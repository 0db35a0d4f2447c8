//! Query planning: threshold policy, query shape selection, and cutoff
//! arithmetic.
//!
//! A [`SearchPlan`] is pure data built by [`SearchPlan::build`]; the SQL
//! renderer and the in-process reference backend both execute the same plan.
//! The six-way branching ({accept-all, exact-match, threshold-filtered} ×
//! {exact, approximate}) lives here and nowhere else.

use serde::{Deserialize, Serialize};

use crate::config::{CollectionConfig, DistanceMetric};
use crate::error::{FalaricaError, Result};
use crate::filter::FilterExpression;
use crate::vector::{NativeVector, Vector};

/// Similarity-threshold policy for a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum SimilarityThreshold {
    /// Return the top-k nearest neighbors with no threshold filtering.
    #[default]
    AcceptAll,
    /// Only identical or near-identical vectors; always scans exactly.
    ExactMatch,
    /// Restrict results to at least this similarity, exclusive in (0, 1).
    Similarity(f64),
}

impl SimilarityThreshold {
    /// Map a plain score to a threshold policy: `0.0` accepts everything,
    /// `1.0` (or more) means exact match, interior values filter.
    pub fn from_score(score: f64) -> Self {
        if score <= 0.0 {
            SimilarityThreshold::AcceptAll
        } else if score >= 1.0 {
            SimilarityThreshold::ExactMatch
        } else {
            SimilarityThreshold::Similarity(score)
        }
    }
}

/// A similarity search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The query embedding.
    pub embedding: Vector,
    /// Maximum number of results.
    pub top_k: usize,
    /// Threshold policy.
    pub threshold: SimilarityThreshold,
    /// Optional metadata filter, ANDed with any threshold predicate.
    pub filter: Option<FilterExpression>,
}

impl SearchRequest {
    /// Create an accept-all request for the top `top_k` neighbors.
    pub fn new(embedding: Vector, top_k: usize) -> Self {
        Self {
            embedding,
            top_k,
            threshold: SimilarityThreshold::default(),
            filter: None,
        }
    }

    /// Set the threshold policy.
    pub fn with_threshold(mut self, threshold: SimilarityThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the metadata filter.
    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// The shape of the query to issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryShape {
    /// Top-k by raw distance, no distance predicate.
    AcceptAll,
    /// Top-k by raw distance under a forced exact scan.
    ExactMatch,
    /// Restrict to `raw distance <= cutoff` before ordering and limiting.
    Threshold { cutoff: f64 },
}

/// Exact versus approximate scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Exact nearest-neighbor scan.
    Exact,
    /// Approximate scan targeting the given accuracy percentage.
    Approximate { accuracy: u8 },
}

/// A fully-resolved similarity query: encoded query vector, shape, scan mode,
/// metric, optional filter, and limit.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    /// The encoded (and, if configured, normalized) query vector.
    pub embedding: NativeVector,
    /// Distance metric the query ranks by.
    pub metric: DistanceMetric,
    /// Query shape.
    pub shape: QueryShape,
    /// Scan mode.
    pub scan: ScanMode,
    /// Translated metadata filter, if any.
    pub filter: Option<FilterExpression>,
    /// Result limit.
    pub top_k: usize,
}

impl SearchPlan {
    /// Select a query shape for `request` under `config`.
    ///
    /// Unsupported threshold/metric/normalization combinations fail here,
    /// before any statement is rendered or issued.
    pub fn build(config: &CollectionConfig, request: &SearchRequest) -> Result<SearchPlan> {
        if request.top_k == 0 {
            return Err(FalaricaError::configuration("top_k must be positive"));
        }
        if let Some(filter) = &request.filter {
            filter.validate()?;
        }

        let configured_scan = match config.search_accuracy {
            Some(accuracy) => ScanMode::Approximate { accuracy },
            None => ScanMode::Exact,
        };

        let (shape, scan) = match request.threshold {
            SimilarityThreshold::AcceptAll => (QueryShape::AcceptAll, configured_scan),
            // Approximate indexes can reorder or omit boundary matches, so
            // exact-match mode always scans exactly regardless of the
            // configured accuracy.
            SimilarityThreshold::ExactMatch => (QueryShape::ExactMatch, ScanMode::Exact),
            SimilarityThreshold::Similarity(threshold) => {
                if !(threshold > 0.0 && threshold < 1.0) {
                    return Err(FalaricaError::configuration(format!(
                        "similarity threshold must be in (0, 1), got {threshold}"
                    )));
                }
                let cutoff = threshold_cutoff(config, threshold)?;
                (QueryShape::Threshold { cutoff }, configured_scan)
            }
        };

        let embedding =
            NativeVector::encode(&request.embedding, config.dimension, config.normalize)?;

        Ok(SearchPlan {
            embedding,
            metric: config.metric,
            shape,
            scan,
            filter: request.filter.clone(),
            top_k: request.top_k,
        })
    }
}

/// Convert a similarity threshold into a raw-distance cutoff.
///
/// Threshold arithmetic on raw distance is only meaningful for normalized
/// vectors under COSINE or DOT; every other combination is rejected.
fn threshold_cutoff(config: &CollectionConfig, threshold: f64) -> Result<f64> {
    if !config.normalize {
        return Err(FalaricaError::configuration(
            "similarity thresholds require forced normalization; \
             disable threshold filtering or enable normalization",
        ));
    }
    match config.metric {
        // Dot-product distance on normalized vectors is remapped to the
        // cosine-like range [-1, 1] before thresholding.
        DistanceMetric::Dot => Ok((1.0 - threshold) * 2.0 - 1.0),
        DistanceMetric::Cosine => Ok(1.0 - threshold),
        other => Err(FalaricaError::configuration(format!(
            "similarity thresholds are not supported for the {} metric; \
             use COSINE or DOT, or disable threshold filtering",
            other.sql_name()
        ))),
    }
}
