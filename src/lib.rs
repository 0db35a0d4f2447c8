//! # Falarica
//!
//! Vector similarity search over relational stores with native vector
//! columns.
//!
//! ## Features
//!
//! - Idempotent, configuration-driven schema management (table + vector index)
//! - Lossless vector codec with optional forced L2 normalization
//! - Transactional batch upsert keyed on document id
//! - Query planning across threshold policies, exact/approximate scans, and
//!   five distance metrics
//! - Portable metadata filter expressions translated to native predicates
//! - Pluggable backends: a SQL renderer over an injectable transport, and an
//!   in-memory reference store

pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod filter;
pub mod plan;
pub mod sql;
pub mod store;
pub mod vector;

pub use config::{CollectionConfig, DistanceMetric, HnswOptions, IndexType, IvfOptions};
pub use document::{Document, MetadataValue, SearchResult};
pub use embedding::{Embedder, PrecomputedEmbedder};
pub use engine::SearchEngine;
pub use error::{FalaricaError, Result};
pub use filter::{CompareOp, FilterExpression};
pub use plan::{QueryShape, ScanMode, SearchPlan, SearchRequest, SimilarityThreshold};
pub use store::{MemoryStoreClient, StoreClient};
pub use vector::{NativeVector, Vector};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
