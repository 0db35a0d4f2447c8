//! Filter translation: a [`FilterExpression`] rendered into the store's
//! JSON-path predicate syntax over the metadata column.
//!
//! Literal operands are always bound as parameters; metadata keys pass
//! through an escaping-safe path renderer. Composites are parenthesized
//! explicitly so operator precedence never depends on the store's parser.

use crate::document::MetadataValue;
use crate::error::{FalaricaError, Result};
use crate::filter::{CompareOp, FilterExpression};
use crate::sql::SqlValue;

/// A rendered predicate: clause text with `?` placeholders plus its binds.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFilter {
    /// WHERE-clause fragment.
    pub clause: String,
    /// Bind values in placeholder order.
    pub binds: Vec<SqlValue>,
}

/// Render a filter expression into a native predicate.
pub fn render(filter: &FilterExpression) -> Result<RenderedFilter> {
    filter.validate()?;
    let mut binds = Vec::new();
    let clause = render_node(filter, &mut binds)?;
    Ok(RenderedFilter { clause, binds })
}

fn render_node(filter: &FilterExpression, binds: &mut Vec<SqlValue>) -> Result<String> {
    match filter {
        FilterExpression::Compare { op, key, value } => {
            let accessor = accessor_for(key, value)?;
            binds.push(bind_for(value));
            Ok(format!("({accessor} {} ?)", sql_operator(*op)))
        }
        FilterExpression::AnyOf { key, values } => {
            render_membership(key, values, false, binds)
        }
        FilterExpression::NoneOf { key, values } => {
            render_membership(key, values, true, binds)
        }
        FilterExpression::And(parts) => render_composite(parts, " AND ", binds),
        FilterExpression::Or(parts) => render_composite(parts, " OR ", binds),
        FilterExpression::Not(inner) => {
            let inner = render_node(inner, binds)?;
            Ok(format!("NOT {inner}"))
        }
    }
}

fn render_composite(
    parts: &[FilterExpression],
    joiner: &str,
    binds: &mut Vec<SqlValue>,
) -> Result<String> {
    let clauses = parts
        .iter()
        .map(|part| render_node(part, binds))
        .collect::<Result<Vec<String>>>()?;
    Ok(format!("({})", clauses.join(joiner)))
}

fn render_membership(
    key: &str,
    values: &[MetadataValue],
    negated: bool,
    binds: &mut Vec<SqlValue>,
) -> Result<String> {
    // validate() has already rejected empty candidate lists.
    let accessor = accessor_for(key, &values[0])?;
    let placeholders = vec!["?"; values.len()].join(", ");
    for value in values {
        binds.push(bind_for(value));
    }
    let keyword = if negated { "NOT IN" } else { "IN" };
    Ok(format!("({accessor} {keyword} ({placeholders}))"))
}

/// The JSON-path accessor for a metadata key, typed by the operand.
///
/// Numeric operands compare through `RETURNING NUMBER` so the store compares
/// numbers, not their string forms.
fn accessor_for(key: &str, value: &MetadataValue) -> Result<String> {
    let path = json_path(key)?;
    match value {
        MetadataValue::Int(_) | MetadataValue::Float(_) => {
            Ok(format!("JSON_VALUE(metadata, '{path}' RETURNING NUMBER)"))
        }
        MetadataValue::Str(_) | MetadataValue::Bool(_) => {
            Ok(format!("JSON_VALUE(metadata, '{path}')"))
        }
    }
}

/// Escape a metadata key into a quoted JSON-path step.
///
/// The key lands between double quotes inside a single-quoted SQL string, so
/// backslashes and double quotes are escaped, and characters that could
/// terminate the SQL literal or smuggle syntax (single quotes, control
/// characters) are rejected outright.
fn json_path(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(FalaricaError::configuration("metadata key must not be empty"));
    }
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '\'' | '\u{0}'..='\u{1f}' => {
                return Err(FalaricaError::configuration(format!(
                    "metadata key {key:?} contains characters that cannot be \
                     rendered into a filter path"
                )));
            }
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c => escaped.push(c),
        }
    }
    Ok(format!("$.\"{escaped}\""))
}

fn sql_operator(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Gte => ">=",
        CompareOp::Lt => "<",
        CompareOp::Lte => "<=",
    }
}

fn bind_for(value: &MetadataValue) -> SqlValue {
    match value {
        MetadataValue::Str(s) => SqlValue::Text(s.clone()),
        MetadataValue::Int(v) => SqlValue::Int(*v),
        MetadataValue::Float(v) => SqlValue::Float(*v),
        // JSON_VALUE reports booleans as their text form.
        MetadataValue::Bool(v) => SqlValue::Text(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_equality() {
        let rendered = render(&FilterExpression::eq("category", "news")).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."category"') = ?)"#
        );
        assert_eq!(rendered.binds, vec![SqlValue::Text("news".into())]);
    }

    #[test]
    fn test_numeric_comparison_returns_number() {
        let rendered = render(&FilterExpression::gte("year", 2020)).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."year"' RETURNING NUMBER) >= ?)"#
        );
        assert_eq!(rendered.binds, vec![SqlValue::Int(2020)]);

        let rendered = render(&FilterExpression::lt("rating", 4.5)).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."rating"' RETURNING NUMBER) < ?)"#
        );
        assert_eq!(rendered.binds, vec![SqlValue::Float(4.5)]);
    }

    #[test]
    fn test_boolean_binds_as_text() {
        let rendered = render(&FilterExpression::eq("published", true)).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."published"') = ?)"#
        );
        assert_eq!(rendered.binds, vec![SqlValue::Text("true".into())]);
    }

    #[test]
    fn test_membership_lists() {
        let rendered =
            render(&FilterExpression::any_of("category", ["news", "sports"])).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."category"') IN (?, ?))"#
        );
        assert_eq!(
            rendered.binds,
            vec![SqlValue::Text("news".into()), SqlValue::Text("sports".into())]
        );

        let rendered = render(&FilterExpression::none_of("year", [2020, 2021])).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."year"' RETURNING NUMBER) NOT IN (?, ?))"#
        );
    }

    #[test]
    fn test_composites_parenthesize() {
        let expr = FilterExpression::eq("a", 1)
            .and(FilterExpression::eq("b", 2))
            .or(FilterExpression::eq("c", 3).negate());
        let rendered = render(&expr).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(((JSON_VALUE(metadata, '$."a"' RETURNING NUMBER) = ?) AND (JSON_VALUE(metadata, '$."b"' RETURNING NUMBER) = ?)) OR NOT (JSON_VALUE(metadata, '$."c"' RETURNING NUMBER) = ?))"#
        );
        assert_eq!(
            rendered.binds,
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_key_escaping() {
        let rendered = render(&FilterExpression::eq(r#"we"ird\key"#, "x")).unwrap();
        assert_eq!(
            rendered.clause,
            r#"(JSON_VALUE(metadata, '$."we\"ird\\key"') = ?)"#
        );
    }

    #[test]
    fn test_hostile_keys_rejected() {
        assert!(render(&FilterExpression::eq("bad'key", "x")).is_err());
        assert!(render(&FilterExpression::eq("bad\nkey", "x")).is_err());
        assert!(render(&FilterExpression::eq("", "x")).is_err());
    }

    #[test]
    fn test_unsupported_operators_surface() {
        let err = render(&FilterExpression::lte("flag", false)).unwrap_err();
        assert!(matches!(err, FalaricaError::UnsupportedFilterOperator(_)));

        let err = render(&FilterExpression::any_of("k", Vec::<MetadataValue>::new()))
            .unwrap_err();
        assert!(matches!(err, FalaricaError::UnsupportedFilterOperator(_)));
    }
}
