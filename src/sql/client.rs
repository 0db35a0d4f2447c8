//! [`StoreClient`] implementation that renders the relational dialect and
//! dispatches through a [`Transport`].

use tracing::{debug, info};

use crate::config::CollectionConfig;
use crate::error::{FalaricaError, Result};
use crate::filter::FilterExpression;
use crate::plan::SearchPlan;
use crate::sql::{Transport, ddl, dml, select};
use crate::store::{RecordHit, RecordRow, StoreClient};

/// A backing-store client over a SQL transport.
#[derive(Debug)]
pub struct SqlStoreClient<T: Transport> {
    transport: T,
}

impl<T: Transport> SqlStoreClient<T> {
    /// Create a client over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> StoreClient for SqlStoreClient<T> {
    fn ensure_schema(&self, config: &CollectionConfig, drop_first: bool) -> Result<()> {
        if drop_first {
            let drop = ddl::drop_table(config);
            self.transport
                .execute(&drop)
                .map_err(|e| FalaricaError::schema(format!("dropping collection: {e}")))?;
        }

        let create = ddl::create_table(config);
        self.transport
            .execute(&create)
            .map_err(|e| FalaricaError::schema(format!("creating collection: {e}")))?;

        if let Some(index) = ddl::create_vector_index(config) {
            self.transport
                .execute(&index)
                .map_err(|e| FalaricaError::schema(format!("creating vector index: {e}")))?;
        }

        info!(
            collection = %config.collection,
            index = config.index.sql_name(),
            drop_first,
            "ensured schema"
        );
        Ok(())
    }

    fn merge_batch(&self, collection: &str, rows: Vec<RecordRow>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len();
        let statement = dml::merge_upsert(collection);
        let bind_rows: Vec<_> = rows.into_iter().map(dml::bind_row).collect();
        self.transport
            .execute_batch(&statement, &bind_rows)
            .map_err(FalaricaError::query_execution)?;
        debug!(collection, rows = count, "merged batch");
        Ok(())
    }

    fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let statement = dml::delete_by_ids(collection, ids);
        let removed = self
            .transport
            .execute(&statement)
            .map_err(FalaricaError::query_execution)?;
        debug!(collection, requested = ids.len(), removed, "deleted by id");
        Ok(removed)
    }

    fn delete_by_filter(&self, collection: &str, filter: &FilterExpression) -> Result<u64> {
        let statement = dml::delete_by_filter(collection, filter)?;
        let removed = self
            .transport
            .execute(&statement)
            .map_err(FalaricaError::query_execution)?;
        debug!(collection, removed, "deleted by filter");
        Ok(removed)
    }

    fn search(&self, collection: &str, plan: &SearchPlan) -> Result<Vec<RecordHit>> {
        let statement = select::similarity_select(collection, plan)?;
        let rows = self
            .transport
            .query(&statement)
            .map_err(FalaricaError::query_execution)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let hit = (|| -> anyhow::Result<RecordHit> {
                Ok(RecordHit {
                    id: row.text("id")?.to_string(),
                    content: row.text("content")?.to_string(),
                    metadata: row.text("metadata")?.to_string(),
                    embedding: row.vector("embedding")?,
                    distance: row.float("distance")?,
                })
            })()
            .map_err(FalaricaError::query_execution)?;
            hits.push(hit);
        }
        debug!(collection, hits = hits.len(), top_k = plan.top_k, "similarity query");
        Ok(hits)
    }
}
