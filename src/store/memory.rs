//! In-memory reference backend.
//!
//! Executes the same typed plans as the SQL client against a linear scan,
//! with real metric math and in-process filter evaluation. Useful for tests
//! and prototyping; approximate scans degrade to exact scans here since
//! there is no index to trade recall for speed.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::config::CollectionConfig;
use crate::document::MetadataValue;
use crate::error::{FalaricaError, Result};
use crate::filter::FilterExpression;
use crate::plan::{QueryShape, SearchPlan};
use crate::store::{RecordHit, RecordRow, StoreClient};

/// An in-memory [`StoreClient`].
#[derive(Debug, Default)]
pub struct MemoryStoreClient {
    tables: RwLock<HashMap<String, HashMap<String, RecordRow>>>,
}

impl MemoryStoreClient {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held by a collection.
    pub fn row_count(&self, collection: &str) -> usize {
        self.tables
            .read()
            .get(collection)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    fn decode_metadata(metadata: &str) -> Result<HashMap<String, MetadataValue>> {
        Ok(serde_json::from_str(metadata)?)
    }
}

impl StoreClient for MemoryStoreClient {
    fn ensure_schema(&self, config: &CollectionConfig, drop_first: bool) -> Result<()> {
        let mut tables = self.tables.write();
        if drop_first {
            tables.remove(&config.collection);
        }
        tables.entry(config.collection.clone()).or_default();
        Ok(())
    }

    fn merge_batch(&self, collection: &str, rows: Vec<RecordRow>) -> Result<()> {
        let mut tables = self.tables.write();
        let table = tables.entry(collection.to_string()).or_default();
        for row in rows {
            table.insert(row.id.clone(), row);
        }
        Ok(())
    }

    fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<u64> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(collection) else {
            return Ok(0);
        };
        let mut removed = 0;
        for id in ids {
            if table.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn delete_by_filter(&self, collection: &str, filter: &FilterExpression) -> Result<u64> {
        filter.validate()?;
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(collection) else {
            return Ok(0);
        };

        let mut doomed = Vec::new();
        for (id, row) in table.iter() {
            let metadata = Self::decode_metadata(&row.metadata)?;
            if filter.matches(&metadata) {
                doomed.push(id.clone());
            }
        }
        for id in &doomed {
            table.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    fn search(&self, collection: &str, plan: &SearchPlan) -> Result<Vec<RecordHit>> {
        let tables = self.tables.read();
        let Some(table) = tables.get(collection) else {
            return Err(FalaricaError::query_execution(anyhow::anyhow!(
                "collection {collection:?} does not exist"
            )));
        };

        let query = plan.embedding.decode()?;
        let mut hits = Vec::new();
        for row in table.values() {
            if let Some(filter) = &plan.filter {
                let metadata = Self::decode_metadata(&row.metadata)?;
                if !filter.matches(&metadata) {
                    continue;
                }
            }

            let stored = row.embedding.decode()?;
            if stored.dimension() != query.dimension() {
                return Err(FalaricaError::dimension_mismatch(
                    query.dimension(),
                    stored.dimension(),
                ));
            }
            let distance = plan.metric.raw_distance(&query.data, &stored.data);

            if let QueryShape::Threshold { cutoff } = plan.shape
                && distance > cutoff
            {
                continue;
            }

            hits.push(RecordHit {
                id: row.id.clone(),
                content: row.content.clone(),
                metadata: row.metadata.clone(),
                embedding: row.embedding.clone(),
                distance,
            });
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(plan.top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{SearchRequest, SimilarityThreshold};
    use crate::vector::{NativeVector, Vector};

    fn config() -> CollectionConfig {
        let mut config = CollectionConfig::new("docs");
        config.dimension = Some(2);
        config
    }

    fn row(id: &str, embedding: &[f64], metadata: &str) -> RecordRow {
        RecordRow {
            id: id.to_string(),
            content: format!("content of {id}"),
            metadata: metadata.to_string(),
            embedding: NativeVector::encode(&Vector::new(embedding.to_vec()), None, false)
                .unwrap(),
        }
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = MemoryStoreClient::new();
        let cfg = config();
        store.ensure_schema(&cfg, false).unwrap();
        store
            .merge_batch("docs", vec![row("a", &[1.0, 0.0], "{}")])
            .unwrap();
        // A second ensure without drop keeps the data.
        store.ensure_schema(&cfg, false).unwrap();
        assert_eq!(store.row_count("docs"), 1);
        // Drop-first starts over.
        store.ensure_schema(&cfg, true).unwrap();
        assert_eq!(store.row_count("docs"), 0);
    }

    #[test]
    fn test_merge_overwrites_on_id_conflict() {
        let store = MemoryStoreClient::new();
        store.ensure_schema(&config(), false).unwrap();
        store
            .merge_batch("docs", vec![row("a", &[1.0, 0.0], "{}")])
            .unwrap();
        store
            .merge_batch("docs", vec![row("a", &[0.0, 1.0], r#"{"v":2}"#)])
            .unwrap();
        assert_eq!(store.row_count("docs"), 1);
    }

    #[test]
    fn test_delete_counts_only_existing_rows() {
        let store = MemoryStoreClient::new();
        store.ensure_schema(&config(), false).unwrap();
        store
            .merge_batch(
                "docs",
                vec![row("a", &[1.0, 0.0], "{}"), row("b", &[0.0, 1.0], "{}")],
            )
            .unwrap();
        let removed = store
            .delete_by_ids("docs", &["a".to_string(), "ghost".to_string()])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.row_count("docs"), 1);
    }

    #[test]
    fn test_search_orders_by_distance_and_truncates() {
        let store = MemoryStoreClient::new();
        let cfg = config();
        store.ensure_schema(&cfg, false).unwrap();
        store
            .merge_batch(
                "docs",
                vec![
                    row("far", &[0.0, 1.0], "{}"),
                    row("near", &[1.0, 0.0], "{}"),
                    row("mid", &[1.0, 1.0], "{}"),
                ],
            )
            .unwrap();

        let request = SearchRequest::new(Vector::new(vec![1.0, 0.0]), 2);
        let plan = SearchPlan::build(&cfg, &request).unwrap();
        let hits = store.search("docs", &plan).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["near", "mid"]);
    }

    #[test]
    fn test_threshold_shape_prunes() {
        let store = MemoryStoreClient::new();
        let mut cfg = config();
        cfg.normalize = true;
        store.ensure_schema(&cfg, false).unwrap();
        store
            .merge_batch(
                "docs",
                vec![row("a", &[1.0, 0.0], "{}"), row("b", &[0.0, 1.0], "{}")],
            )
            .unwrap();

        let request = SearchRequest::new(Vector::new(vec![1.0, 0.0]), 10)
            .with_threshold(SimilarityThreshold::Similarity(0.99));
        let plan = SearchPlan::build(&cfg, &request).unwrap();
        let hits = store.search("docs", &plan).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_search_missing_collection_is_an_error() {
        let store = MemoryStoreClient::new();
        let request = SearchRequest::new(Vector::new(vec![1.0, 0.0]), 1);
        let plan = SearchPlan::build(&config(), &request).unwrap();
        assert!(store.search("docs", &plan).is_err());
    }
}
