//! Collection configuration: distance metric, index strategy, dimensionality,
//! normalization, and schema-management flags.
//!
//! The configuration is a plain immutable struct, validated once when the
//! engine is constructed. There is no runtime mutation of an already-built
//! collection's metric, index, or dimension.

use serde::{Deserialize, Serialize};

use crate::error::{FalaricaError, Result};

/// Distance metrics understood by the backing store's `vector_distance`
/// primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceMetric {
    /// Cosine distance (1 - cosine similarity).
    #[default]
    Cosine,
    /// Negated inner product (smaller is more similar).
    Dot,
    /// Euclidean (L2) distance.
    Euclidean,
    /// Squared Euclidean distance.
    EuclideanSquared,
    /// Manhattan (L1) distance.
    Manhattan,
}

impl DistanceMetric {
    /// The metric name as the backing store spells it.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "COSINE",
            DistanceMetric::Dot => "DOT",
            DistanceMetric::Euclidean => "EUCLIDEAN",
            DistanceMetric::EuclideanSquared => "EUCLIDEAN_SQUARED",
            DistanceMetric::Manhattan => "MANHATTAN",
        }
    }

    /// Parse a distance metric from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot" | "dot_product" => Ok(DistanceMetric::Dot),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "euclidean_squared" | "l2_squared" => Ok(DistanceMetric::EuclideanSquared),
            "manhattan" | "l1" => Ok(DistanceMetric::Manhattan),
            _ => Err(FalaricaError::configuration(format!(
                "unknown distance metric: {s}"
            ))),
        }
    }

    /// Raw distance between two vectors, with the same conventions as the
    /// backing store's `vector_distance` primitive.
    ///
    /// Used by the in-process reference backend; lengths must already agree.
    pub fn raw_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            DistanceMetric::Cosine => {
                let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
                let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
                let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0 // maximum distance for zero vectors
                } else {
                    1.0 - (dot / (norm_a * norm_b))
                }
            }
            DistanceMetric::Dot => -a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f64>(),
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::EuclideanSquared => {
                a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
            }
            DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
        }
    }

    /// Remap a raw distance for presentation.
    ///
    /// DOT distances on normalized vectors live in [-1, 1]; they are remapped
    /// to `(1 + raw) / 2` so that the smaller-is-better convention holds for
    /// every metric. All other metrics report the raw distance directly.
    pub fn display_distance(&self, raw: f64) -> f64 {
        match self {
            DistanceMetric::Dot => (1.0 + raw) / 2.0,
            _ => raw,
        }
    }

    /// Caller-facing similarity score: `1 - display_distance`.
    pub fn score(&self, raw: f64) -> f64 {
        1.0 - self.display_distance(raw)
    }
}

/// Vector index strategy for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndexType {
    /// No index; every query performs an exact linear scan.
    #[default]
    None,
    /// Inverted-file (cluster-partition) index.
    Ivf,
    /// In-memory navigable graph index.
    Hnsw,
}

impl IndexType {
    /// The index type name as the backing store spells it.
    pub fn sql_name(&self) -> &'static str {
        match self {
            IndexType::None => "NONE",
            IndexType::Ivf => "IVF",
            IndexType::Hnsw => "HNSW",
        }
    }
}

/// Build parameters for an IVF index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfOptions {
    /// Target accuracy percentage for index builds.
    pub target_accuracy: u8,
    /// Number of cluster partitions.
    pub neighbor_partitions: u32,
}

impl Default for IvfOptions {
    fn default() -> Self {
        Self {
            target_accuracy: 95,
            neighbor_partitions: 100,
        }
    }
}

/// Build parameters for an HNSW index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswOptions {
    /// Per-node neighbor count (graph degree).
    pub neighbors: u32,
    /// Construction-time candidate list size.
    pub ef_construction: u32,
}

impl Default for HnswOptions {
    fn default() -> Self {
        Self {
            neighbors: 16,
            ef_construction: 64,
        }
    }
}

/// Immutable configuration of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection (table) name; must be a plain SQL identifier.
    pub collection: String,
    /// Fixed dimensionality, or `None` to leave the column width
    /// unconstrained.
    pub dimension: Option<usize>,
    /// Distance metric used for ranking and threshold cutoffs.
    pub metric: DistanceMetric,
    /// Vector index strategy.
    pub index: IndexType,
    /// IVF build parameters (ignored unless `index` is [`IndexType::Ivf`]).
    pub ivf: IvfOptions,
    /// HNSW build parameters (ignored unless `index` is [`IndexType::Hnsw`]).
    pub hnsw: HnswOptions,
    /// Approximate-scan target accuracy percentage; `None` means the store's
    /// own default, which makes every scan exact.
    pub search_accuracy: Option<u8>,
    /// L2-normalize every ingested and query vector.
    pub normalize: bool,
    /// Run schema management at engine construction.
    pub initialize_schema: bool,
    /// Destroy any pre-existing collection before creating the schema.
    pub drop_schema_first: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            collection: "vector_store".to_string(),
            dimension: None,
            metric: DistanceMetric::default(),
            index: IndexType::default(),
            ivf: IvfOptions::default(),
            hnsw: HnswOptions::default(),
            search_accuracy: None,
            normalize: false,
            initialize_schema: false,
            drop_schema_first: false,
        }
    }
}

impl CollectionConfig {
    /// Create a configuration for the named collection with defaults for
    /// everything else.
    pub fn new<S: Into<String>>(collection: S) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration shape.
    ///
    /// Called once at engine construction; nothing is re-validated per query.
    pub fn validate(&self) -> Result<()> {
        if !is_sql_identifier(&self.collection) {
            return Err(FalaricaError::configuration(format!(
                "collection name {:?} is not a plain SQL identifier",
                self.collection
            )));
        }
        if self.dimension == Some(0) {
            return Err(FalaricaError::configuration(
                "dimension must be nonzero when fixed",
            ));
        }
        if let Some(accuracy) = self.search_accuracy
            && !(1..=100).contains(&accuracy)
        {
            return Err(FalaricaError::configuration(format!(
                "search accuracy must be in [1, 100], got {accuracy}"
            )));
        }
        if !(1..=100).contains(&self.ivf.target_accuracy) {
            return Err(FalaricaError::configuration(format!(
                "IVF target accuracy must be in [1, 100], got {}",
                self.ivf.target_accuracy
            )));
        }
        if self.ivf.neighbor_partitions == 0 {
            return Err(FalaricaError::configuration(
                "IVF neighbor partitions must be nonzero",
            ));
        }
        if self.hnsw.neighbors == 0 || self.hnsw.ef_construction == 0 {
            return Err(FalaricaError::configuration(
                "HNSW neighbors and ef_construction must be nonzero",
            ));
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*` — the only collection names ever spliced into
/// statement text.
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
