//! Pluggable backing-store clients.
//!
//! The engine talks to the backing store through the [`StoreClient`] trait —
//! the typed primitive surface it needs (schema DDL, merge-batch upsert,
//! deletion, similarity query). Backends can be swapped without touching
//! higher-level code: [`sql`](crate::sql) renders the relational dialect,
//! [`MemoryStoreClient`] executes the same plans in process.

pub mod memory;

pub use memory::MemoryStoreClient;

use crate::config::CollectionConfig;
use crate::error::Result;
use crate::filter::FilterExpression;
use crate::plan::SearchPlan;
use crate::vector::NativeVector;

/// One encoded `(id, content, metadata, embedding)` tuple headed for the
/// store.
#[derive(Debug, Clone)]
pub struct RecordRow {
    /// Unique document identifier.
    pub id: String,
    /// Free-text content.
    pub content: String,
    /// Metadata encoded as a JSON object of plain scalars.
    pub metadata: String,
    /// Embedding in the store's native literal form.
    pub embedding: NativeVector,
}

/// One row coming back from a similarity query.
#[derive(Debug, Clone)]
pub struct RecordHit {
    /// Unique document identifier.
    pub id: String,
    /// Free-text content.
    pub content: String,
    /// Metadata as stored (JSON object of plain scalars).
    pub metadata: String,
    /// Embedding in the store's native literal form.
    pub embedding: NativeVector,
    /// Raw metric distance reported by the store.
    pub distance: f64,
}

/// The backing-store primitive surface consumed by the engine.
///
/// All methods are synchronous, blocking calls that may suspend on I/O.
/// Implementations never retry; failures surface to the caller untouched.
pub trait StoreClient: Send + Sync {
    /// Idempotently create the collection's table and vector index.
    ///
    /// With `drop_first`, any pre-existing collection of the same name is
    /// destroyed first ("does not exist" is not an error).
    fn ensure_schema(&self, config: &CollectionConfig, drop_first: bool) -> Result<()>;

    /// Merge a batch of rows into the collection using id equality as the
    /// conflict key: update all columns on conflict, insert otherwise.
    ///
    /// The batch is submitted as one operation; failure of any row fails the
    /// whole call, and the caller must assume an indeterminate subset may
    /// have applied, per the store's own batch contract.
    fn merge_batch(&self, collection: &str, rows: Vec<RecordRow>) -> Result<()>;

    /// Delete rows by identifier; returns the number of rows removed.
    fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<u64>;

    /// Delete every row matching the filter in one statement; returns the
    /// number of rows removed.
    fn delete_by_filter(&self, collection: &str, filter: &FilterExpression) -> Result<u64>;

    /// Execute a similarity query plan.
    fn search(&self, collection: &str, plan: &SearchPlan) -> Result<Vec<RecordHit>>;
}

impl<C: StoreClient + ?Sized> StoreClient for std::sync::Arc<C> {
    fn ensure_schema(&self, config: &CollectionConfig, drop_first: bool) -> Result<()> {
        (**self).ensure_schema(config, drop_first)
    }

    fn merge_batch(&self, collection: &str, rows: Vec<RecordRow>) -> Result<()> {
        (**self).merge_batch(collection, rows)
    }

    fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<u64> {
        (**self).delete_by_ids(collection, ids)
    }

    fn delete_by_filter(&self, collection: &str, filter: &FilterExpression) -> Result<u64> {
        (**self).delete_by_filter(collection, filter)
    }

    fn search(&self, collection: &str, plan: &SearchPlan) -> Result<Vec<RecordHit>> {
        (**self).search(collection, plan)
    }
}
