//! Portable boolean filter expressions over document metadata.
//!
//! A [`FilterExpression`] is an immutable AST produced by callers and
//! consumed by the filter translator (SQL backends) or evaluated in process
//! (memory backend). It is never stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::MetadataValue;
use crate::error::{FalaricaError, Result};

/// Comparison operator for a single metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Uppercase operator name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "EQ",
            CompareOp::Ne => "NE",
            CompareOp::Gt => "GT",
            CompareOp::Gte => "GTE",
            CompareOp::Lt => "LT",
            CompareOp::Lte => "LTE",
        }
    }

    /// Whether this operator orders its operands (as opposed to equality).
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte
        )
    }
}

/// A boolean expression tree over metadata keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpression {
    /// A single comparison against one metadata key.
    Compare {
        op: CompareOp,
        key: String,
        value: MetadataValue,
    },
    /// Membership: the key's value equals any of the candidates (IN).
    AnyOf {
        key: String,
        values: Vec<MetadataValue>,
    },
    /// Exclusion: the key's value equals none of the candidates (NOT IN).
    NoneOf {
        key: String,
        values: Vec<MetadataValue>,
    },
    /// Conjunction of sub-expressions.
    And(Vec<FilterExpression>),
    /// Disjunction of sub-expressions.
    Or(Vec<FilterExpression>),
    /// Negation of a sub-expression.
    Not(Box<FilterExpression>),
}

impl FilterExpression {
    /// `key == value`
    pub fn eq<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        Self::compare(CompareOp::Eq, key, value)
    }

    /// `key != value`
    pub fn ne<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        Self::compare(CompareOp::Ne, key, value)
    }

    /// `key > value`
    pub fn gt<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        Self::compare(CompareOp::Gt, key, value)
    }

    /// `key >= value`
    pub fn gte<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        Self::compare(CompareOp::Gte, key, value)
    }

    /// `key < value`
    pub fn lt<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        Self::compare(CompareOp::Lt, key, value)
    }

    /// `key <= value`
    pub fn lte<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        Self::compare(CompareOp::Lte, key, value)
    }

    /// `key IN (values...)`
    pub fn any_of<K, V, I>(key: K, values: I) -> Self
    where
        K: Into<String>,
        V: Into<MetadataValue>,
        I: IntoIterator<Item = V>,
    {
        FilterExpression::AnyOf {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `key NOT IN (values...)`
    pub fn none_of<K, V, I>(key: K, values: I) -> Self
    where
        K: Into<String>,
        V: Into<MetadataValue>,
        I: IntoIterator<Item = V>,
    {
        FilterExpression::NoneOf {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of this expression and another.
    pub fn and(self, other: FilterExpression) -> Self {
        match self {
            FilterExpression::And(mut parts) => {
                parts.push(other);
                FilterExpression::And(parts)
            }
            first => FilterExpression::And(vec![first, other]),
        }
    }

    /// Disjunction of this expression and another.
    pub fn or(self, other: FilterExpression) -> Self {
        match self {
            FilterExpression::Or(mut parts) => {
                parts.push(other);
                FilterExpression::Or(parts)
            }
            first => FilterExpression::Or(vec![first, other]),
        }
    }

    /// Negation of this expression.
    pub fn negate(self) -> Self {
        FilterExpression::Not(Box::new(self))
    }

    fn compare<K: Into<String>, V: Into<MetadataValue>>(op: CompareOp, key: K, value: V) -> Self {
        FilterExpression::Compare {
            op,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Check that every operator in the tree is renderable.
    ///
    /// Ordering comparisons against boolean operands and empty `IN`/`NOT IN`
    /// candidate lists have no sensible rendering and are rejected up front,
    /// before any statement is built.
    pub fn validate(&self) -> Result<()> {
        match self {
            FilterExpression::Compare { op, value, .. } => {
                if op.is_ordering() && matches!(value, MetadataValue::Bool(_)) {
                    return Err(FalaricaError::unsupported_filter(format!(
                        "{} on boolean operand",
                        op.name()
                    )));
                }
                Ok(())
            }
            FilterExpression::AnyOf { values, .. } => {
                if values.is_empty() {
                    return Err(FalaricaError::unsupported_filter("IN with empty candidate list"));
                }
                Ok(())
            }
            FilterExpression::NoneOf { values, .. } => {
                if values.is_empty() {
                    return Err(FalaricaError::unsupported_filter(
                        "NOT_IN with empty candidate list",
                    ));
                }
                Ok(())
            }
            FilterExpression::And(parts) | FilterExpression::Or(parts) => {
                parts.iter().try_for_each(FilterExpression::validate)
            }
            FilterExpression::Not(inner) => inner.validate(),
        }
    }

    /// Evaluate this expression against a metadata bag.
    ///
    /// Mirrors the backing store's predicate semantics over a semi-structured
    /// column: a comparison against a missing key is false (even `NE`), and
    /// `NOT` negates whatever its operand evaluated to.
    pub fn matches(&self, metadata: &HashMap<String, MetadataValue>) -> bool {
        match self {
            FilterExpression::Compare { op, key, value } => metadata
                .get(key)
                .is_some_and(|actual| compare(*op, actual, value)),
            FilterExpression::AnyOf { key, values } => metadata
                .get(key)
                .is_some_and(|actual| values.iter().any(|v| compare(CompareOp::Eq, actual, v))),
            FilterExpression::NoneOf { key, values } => metadata
                .get(key)
                .is_some_and(|actual| values.iter().all(|v| !compare(CompareOp::Eq, actual, v))),
            FilterExpression::And(parts) => parts.iter().all(|p| p.matches(metadata)),
            FilterExpression::Or(parts) => parts.iter().any(|p| p.matches(metadata)),
            FilterExpression::Not(inner) => !inner.matches(metadata),
        }
    }
}

fn compare(op: CompareOp, actual: &MetadataValue, expected: &MetadataValue) -> bool {
    use std::cmp::Ordering;

    // Integers and floats compare numerically across variants; any other
    // cross-type comparison is simply false, like a type-mismatched
    // comparison in the backing store.
    let ordering = match (actual, expected) {
        (MetadataValue::Str(a), MetadataValue::Str(b)) => a.partial_cmp(b),
        (MetadataValue::Bool(a), MetadataValue::Bool(b)) => {
            if op.is_ordering() {
                None
            } else {
                a.partial_cmp(b)
            }
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };

    let Some(ordering) = ordering else {
        return false;
    };

    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> HashMap<String, MetadataValue> {
        let mut map = HashMap::new();
        map.insert("category".to_string(), MetadataValue::from("news"));
        map.insert("year".to_string(), MetadataValue::from(2024));
        map.insert("rating".to_string(), MetadataValue::from(4.5));
        map.insert("published".to_string(), MetadataValue::from(true));
        map
    }

    #[test]
    fn test_comparisons() {
        let m = metadata();
        assert!(FilterExpression::eq("category", "news").matches(&m));
        assert!(!FilterExpression::eq("category", "sports").matches(&m));
        assert!(FilterExpression::ne("category", "sports").matches(&m));
        assert!(FilterExpression::gt("year", 2020).matches(&m));
        assert!(FilterExpression::lte("rating", 4.5).matches(&m));
        assert!(FilterExpression::eq("published", true).matches(&m));
    }

    #[test]
    fn test_numeric_cross_type_comparison() {
        let m = metadata();
        // Integer-stored year compared against a float operand.
        assert!(FilterExpression::gte("year", 2024.0).matches(&m));
        // Float-stored rating compared against an integer operand.
        assert!(FilterExpression::gt("rating", 4).matches(&m));
    }

    #[test]
    fn test_missing_key_is_false_even_for_ne() {
        let m = metadata();
        assert!(!FilterExpression::eq("missing", "x").matches(&m));
        assert!(!FilterExpression::ne("missing", "x").matches(&m));
        // NOT flips the missing-key false.
        assert!(FilterExpression::eq("missing", "x").negate().matches(&m));
    }

    #[test]
    fn test_membership() {
        let m = metadata();
        assert!(FilterExpression::any_of("category", ["news", "sports"]).matches(&m));
        assert!(!FilterExpression::any_of("category", ["sports", "tech"]).matches(&m));
        assert!(FilterExpression::none_of("category", ["sports", "tech"]).matches(&m));
        assert!(!FilterExpression::none_of("category", ["news"]).matches(&m));
    }

    #[test]
    fn test_combinators() {
        let m = metadata();
        let expr = FilterExpression::eq("category", "news")
            .and(FilterExpression::gt("year", 2020))
            .or(FilterExpression::eq("category", "archive"));
        assert!(expr.matches(&m));

        let expr = FilterExpression::eq("category", "news")
            .and(FilterExpression::lt("year", 2000));
        assert!(!expr.matches(&m));
    }

    #[test]
    fn test_validate_rejects_ordering_on_boolean() {
        let err = FilterExpression::gt("published", true).validate().unwrap_err();
        match err {
            FalaricaError::UnsupportedFilterOperator(msg) => {
                assert!(msg.contains("GT"));
            }
            other => panic!("Expected UnsupportedFilterOperator, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_candidate_lists() {
        let empty: Vec<MetadataValue> = Vec::new();
        assert!(FilterExpression::any_of("k", empty.clone()).validate().is_err());
        assert!(FilterExpression::none_of("k", empty).validate().is_err());

        // Nested occurrences are found too.
        let nested = FilterExpression::eq("a", 1)
            .and(FilterExpression::any_of("k", Vec::<MetadataValue>::new()).negate());
        assert!(nested.validate().is_err());
    }
}
