//! The search engine facade: ingestion, deletion, and similarity search over
//! one collection.
//!
//! The engine is stateless across calls beyond its immutable configuration;
//! the single piece of shared mutable state is a reusable scratch buffer for
//! metadata encoding, guarded by a lock so concurrent ingestion calls cannot
//! corrupt each other's encoded payloads. Nothing here retries: transport
//! failures surface to the caller wrapped, never swallowed.

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::CollectionConfig;
use crate::document::{Document, SearchResult};
use crate::embedding::Embedder;
use crate::error::{FalaricaError, Result};
use crate::filter::FilterExpression;
use crate::plan::{SearchPlan, SearchRequest};
use crate::store::{RecordHit, RecordRow, StoreClient};
use crate::vector::{NativeVector, Vector};

/// A vector similarity search engine over one collection.
pub struct SearchEngine<C: StoreClient> {
    config: CollectionConfig,
    client: C,
    metadata_buf: Mutex<Vec<u8>>,
}

impl<C: StoreClient> SearchEngine<C> {
    /// Construct an engine, validating the configuration eagerly.
    ///
    /// When `initialize_schema` is configured, schema management runs here
    /// (honoring `drop_schema_first`); construction fails on DDL errors.
    pub fn new(config: CollectionConfig, client: C) -> Result<Self> {
        config.validate()?;
        let engine = Self {
            config,
            client,
            metadata_buf: Mutex::new(Vec::new()),
        };
        if engine.config.initialize_schema {
            engine.ensure_schema()?;
        }
        Ok(engine)
    }

    /// The collection configuration.
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// The backing-store client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Idempotently create the collection's table and vector index,
    /// destroying any pre-existing collection first when configured.
    pub fn ensure_schema(&self) -> Result<()> {
        self.client
            .ensure_schema(&self.config, self.config.drop_schema_first)
    }

    /// Transactionally upsert `(document, embedding)` pairs.
    ///
    /// Documents and embeddings correspond by position. The whole batch is
    /// validated against the collection's dimensionality before anything is
    /// written, then submitted as a single batched merge: update all columns
    /// on id conflict, insert otherwise.
    ///
    /// Batch size is bounded only by the backing transport's own limits;
    /// oversized batches are not chunked here, so callers ingesting very
    /// large corpora should split them.
    pub fn upsert(&self, documents: &[Document], embeddings: &[Vector]) -> Result<()> {
        if documents.len() != embeddings.len() {
            return Err(FalaricaError::configuration(format!(
                "document/embedding count mismatch: {} documents, {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }
        for embedding in embeddings {
            embedding.validate_dimension(self.config.dimension)?;
        }

        let natives = self.encode_embeddings(embeddings)?;
        let rows = {
            let mut buf = self.metadata_buf.lock();
            documents
                .iter()
                .zip(natives)
                .map(|(document, embedding)| {
                    buf.clear();
                    serde_json::to_writer(&mut *buf, &document.metadata)?;
                    let metadata = std::str::from_utf8(buf.as_slice())
                        .map_err(|e| {
                            FalaricaError::configuration(format!(
                                "metadata encoding produced invalid UTF-8: {e}"
                            ))
                        })?
                        .to_owned();
                    Ok(RecordRow {
                        id: document.id.clone(),
                        content: document.content.clone(),
                        metadata,
                        embedding,
                    })
                })
                .collect::<Result<Vec<RecordRow>>>()?
        };

        self.client.merge_batch(&self.config.collection, rows)?;
        info!(
            collection = %self.config.collection,
            documents = documents.len(),
            "upserted batch"
        );
        Ok(())
    }

    /// Embed each document's content, then upsert.
    pub fn upsert_with_embedder(
        &self,
        documents: &[Document],
        embedder: &dyn Embedder,
    ) -> Result<()> {
        let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let embeddings = embedder.embed_batch(&contents)?;
        self.upsert(documents, &embeddings)
    }

    /// Batch delete by identifier.
    ///
    /// Returns whether every requested id was actually removed. Deleting a
    /// non-existent id is not an error; it simply does not count.
    pub fn delete(&self, ids: &[String]) -> Result<bool> {
        if ids.is_empty() {
            return Ok(true);
        }
        let removed = self.client.delete_by_ids(&self.config.collection, ids)?;
        debug!(
            collection = %self.config.collection,
            requested = ids.len(),
            removed,
            "deleted by id"
        );
        Ok(removed == ids.len() as u64)
    }

    /// Delete every document matching the filter; returns the number of rows
    /// removed.
    pub fn delete_by_filter(&self, filter: &FilterExpression) -> Result<u64> {
        filter.validate()?;
        self.client.delete_by_filter(&self.config.collection, filter)
    }

    /// Run a similarity search.
    ///
    /// Unsupported threshold/metric/normalization combinations fail before
    /// any query is issued.
    pub fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let plan = SearchPlan::build(&self.config, request)?;
        let hits = self.client.search(&self.config.collection, &plan)?;
        debug!(
            collection = %self.config.collection,
            top_k = request.top_k,
            hits = hits.len(),
            "similarity search"
        );
        hits.into_iter().map(|hit| self.map_hit(hit)).collect()
    }

    /// Embed the query text, then run an accept-all similarity search.
    pub fn similarity_search_text(
        &self,
        embedder: &dyn Embedder,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedding = embedder.embed(text)?;
        self.similarity_search(&SearchRequest::new(embedding, top_k))
    }

    fn encode_embeddings(&self, embeddings: &[Vector]) -> Result<Vec<NativeVector>> {
        let dimension = self.config.dimension;
        let normalize = self.config.normalize;
        if embeddings.len() > 64 {
            embeddings
                .par_iter()
                .map(|e| NativeVector::encode(e, dimension, normalize))
                .collect()
        } else {
            embeddings
                .iter()
                .map(|e| NativeVector::encode(e, dimension, normalize))
                .collect()
        }
    }

    fn map_hit(&self, hit: RecordHit) -> Result<SearchResult> {
        let metadata = serde_json::from_str(&hit.metadata)?;
        let embedding = hit.embedding.decode()?;
        let distance = self.config.metric.display_distance(hit.distance);
        Ok(SearchResult {
            document: Document {
                id: hit.id,
                content: hit.content,
                metadata,
            },
            embedding: Some(embedding),
            distance,
            score: 1.0 - distance,
        })
    }
}
