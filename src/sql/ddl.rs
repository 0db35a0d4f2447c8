//! Schema DDL rendering: collection table and vector index.

use crate::config::{CollectionConfig, IndexType};
use crate::sql::Statement;

/// Render the `CREATE TABLE IF NOT EXISTS` statement for a collection.
///
/// The vector column is annotated with the configured metric and index type
/// so the store can pick matching defaults; an unconstrained dimensionality
/// renders as `VECTOR(*, FLOAT64)`.
pub fn create_table(config: &CollectionConfig) -> Statement {
    let width = match config.dimension {
        Some(d) => d.to_string(),
        None => "*".to_string(),
    };
    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         id VARCHAR2(36) DEFAULT SYS_GUID() PRIMARY KEY, \
         content CLOB, \
         metadata JSON, \
         embedding VECTOR({width}, FLOAT64) \
         ANNOTATIONS (DISTANCE '{metric}', INDEX_TYPE '{index}'))",
        table = config.collection,
        metric = config.metric.sql_name(),
        index = config.index.sql_name(),
    ))
}

/// Render the vector-index statement for a collection, or `None` when no
/// index is configured (every query then performs an exact linear scan).
pub fn create_vector_index(config: &CollectionConfig) -> Option<Statement> {
    let table = &config.collection;
    let metric = config.metric.sql_name();
    match config.index {
        IndexType::None => None,
        IndexType::Ivf => Some(Statement::new(format!(
            "CREATE VECTOR INDEX IF NOT EXISTS {table}_vector_index ON {table} (embedding) \
             ORGANIZATION NEIGHBOR PARTITIONS \
             DISTANCE {metric} \
             WITH TARGET ACCURACY {accuracy} \
             PARAMETERS (TYPE IVF, NEIGHBOR PARTITIONS {partitions})",
            accuracy = config.ivf.target_accuracy,
            partitions = config.ivf.neighbor_partitions,
        ))),
        IndexType::Hnsw => Some(Statement::new(format!(
            "CREATE VECTOR INDEX IF NOT EXISTS {table}_vector_index ON {table} (embedding) \
             ORGANIZATION INMEMORY NEIGHBOR GRAPH \
             DISTANCE {metric} \
             PARAMETERS (TYPE HNSW, NEIGHBORS {neighbors}, EFCONSTRUCTION {efc})",
            neighbors = config.hnsw.neighbors,
            efc = config.hnsw.ef_construction,
        ))),
    }
}

/// Render the drop statement used by drop-first schema initialization.
///
/// `IF EXISTS` absorbs the "does not exist" case.
pub fn drop_table(config: &CollectionConfig) -> Statement {
    Statement::new(format!(
        "DROP TABLE IF EXISTS {} PURGE",
        config.collection
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;

    #[test]
    fn test_create_table_fixed_dimension() {
        let mut config = CollectionConfig::new("docs");
        config.dimension = Some(768);
        config.metric = DistanceMetric::Cosine;
        config.index = IndexType::Ivf;
        let stmt = create_table(&config);
        assert_eq!(
            stmt.sql,
            "CREATE TABLE IF NOT EXISTS docs (\
             id VARCHAR2(36) DEFAULT SYS_GUID() PRIMARY KEY, \
             content CLOB, \
             metadata JSON, \
             embedding VECTOR(768, FLOAT64) \
             ANNOTATIONS (DISTANCE 'COSINE', INDEX_TYPE 'IVF'))"
        );
        assert!(stmt.binds.is_empty());
    }

    #[test]
    fn test_create_table_unconstrained_dimension() {
        let config = CollectionConfig::new("docs");
        let stmt = create_table(&config);
        assert!(stmt.sql.contains("VECTOR(*, FLOAT64)"));
        assert!(stmt.sql.contains("INDEX_TYPE 'NONE'"));
    }

    #[test]
    fn test_no_index_for_index_type_none() {
        let config = CollectionConfig::new("docs");
        assert!(create_vector_index(&config).is_none());
    }

    #[test]
    fn test_ivf_index_defaults() {
        let mut config = CollectionConfig::new("docs");
        config.index = IndexType::Ivf;
        let stmt = create_vector_index(&config).unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE VECTOR INDEX IF NOT EXISTS docs_vector_index ON docs (embedding) \
             ORGANIZATION NEIGHBOR PARTITIONS \
             DISTANCE COSINE \
             WITH TARGET ACCURACY 95 \
             PARAMETERS (TYPE IVF, NEIGHBOR PARTITIONS 100)"
        );
    }

    #[test]
    fn test_hnsw_index_parameters() {
        let mut config = CollectionConfig::new("docs");
        config.index = IndexType::Hnsw;
        config.metric = DistanceMetric::Dot;
        config.hnsw.neighbors = 32;
        config.hnsw.ef_construction = 200;
        let stmt = create_vector_index(&config).unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE VECTOR INDEX IF NOT EXISTS docs_vector_index ON docs (embedding) \
             ORGANIZATION INMEMORY NEIGHBOR GRAPH \
             DISTANCE DOT \
             PARAMETERS (TYPE HNSW, NEIGHBORS 32, EFCONSTRUCTION 200)"
        );
    }

    #[test]
    fn test_drop_table() {
        let config = CollectionConfig::new("docs");
        assert_eq!(drop_table(&config).sql, "DROP TABLE IF EXISTS docs PURGE");
    }
}
