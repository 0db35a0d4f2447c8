//! Similarity-query rendering.
//!
//! One pure function maps a [`SearchPlan`] to its parameterized statement,
//! so every {shape} × {scan mode} combination is exhaustively testable
//! instead of being buried in nested string formatting.

use crate::error::Result;
use crate::plan::{QueryShape, ScanMode, SearchPlan};
use crate::sql::filter::render;
use crate::sql::{SqlValue, Statement};

/// Render the similarity SELECT for a plan.
///
/// The metadata filter (when present) is ANDed with the threshold predicate;
/// the two never interact arithmetically. Results order by distance
/// ascending and limit to the plan's top-k; the scan-mode modifier is
/// rendered explicitly (`EXACT` or `APPROX ... WITH TARGET ACCURACY`).
pub fn similarity_select(collection: &str, plan: &SearchPlan) -> Result<Statement> {
    let metric = plan.metric.sql_name();
    let mut sql = format!(
        "SELECT id, content, metadata, embedding, \
         vector_distance(embedding, ?, {metric}) AS distance \
         FROM {collection}"
    );
    let mut binds = vec![SqlValue::Vector(plan.embedding.clone())];

    let mut predicates: Vec<String> = Vec::new();
    if let Some(filter) = &plan.filter {
        let rendered = render(filter)?;
        predicates.push(rendered.clause);
        binds.extend(rendered.binds);
    }
    if let QueryShape::Threshold { cutoff } = plan.shape {
        predicates.push(format!("vector_distance(embedding, ?, {metric}) <= ?"));
        binds.push(SqlValue::Vector(plan.embedding.clone()));
        binds.push(SqlValue::Float(cutoff));
    }
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }

    sql.push_str(" ORDER BY distance");
    match plan.scan {
        ScanMode::Exact => sql.push_str(" FETCH EXACT FIRST ? ROWS ONLY"),
        ScanMode::Approximate { accuracy } => {
            sql.push_str(&format!(
                " FETCH APPROX FIRST ? ROWS ONLY WITH TARGET ACCURACY {accuracy}"
            ));
        }
    }
    binds.push(SqlValue::Int(plan.top_k as i64));

    Ok(Statement::with_binds(sql, binds))
}
