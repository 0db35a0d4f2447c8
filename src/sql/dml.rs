//! DML rendering: merge-based upsert and deletion.

use crate::error::Result;
use crate::filter::FilterExpression;
use crate::sql::filter::render;
use crate::sql::{SqlValue, Statement};
use crate::store::RecordRow;

/// Render the merge statement used for batch upsert.
///
/// Id equality is the conflict key: all columns update on conflict, a new
/// row is inserted otherwise. The statement carries no binds of its own;
/// every document contributes one bind row (see [`bind_row`]).
pub fn merge_upsert(collection: &str) -> Statement {
    Statement::new(format!(
        "MERGE INTO {collection} t \
         USING (SELECT ? id, ? content, ? metadata, ? embedding FROM sys.dual) s \
         ON (t.id = s.id) \
         WHEN MATCHED THEN UPDATE SET \
         t.content = s.content, t.metadata = s.metadata, t.embedding = s.embedding \
         WHEN NOT MATCHED THEN INSERT (t.id, t.content, t.metadata, t.embedding) \
         VALUES (s.id, s.content, s.metadata, s.embedding)"
    ))
}

/// Bind values for one row of the merge statement, in placeholder order.
pub fn bind_row(row: RecordRow) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(row.id),
        SqlValue::Text(row.content),
        SqlValue::Json(row.metadata),
        SqlValue::Vector(row.embedding),
    ]
}

/// Render a batch delete by identifier.
pub fn delete_by_ids(collection: &str, ids: &[String]) -> Statement {
    let placeholders = vec!["?"; ids.len()].join(", ");
    Statement::with_binds(
        format!("DELETE FROM {collection} WHERE id IN ({placeholders})"),
        ids.iter().map(|id| SqlValue::Text(id.clone())).collect(),
    )
}

/// Render a single-statement delete of every row matching the filter.
pub fn delete_by_filter(collection: &str, filter: &FilterExpression) -> Result<Statement> {
    let rendered = render(filter)?;
    Ok(Statement::with_binds(
        format!("DELETE FROM {collection} WHERE {}", rendered.clause),
        rendered.binds,
    ))
}
