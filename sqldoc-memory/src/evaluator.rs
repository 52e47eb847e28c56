//! Query evaluation for in-memory document filtering.
//!
//! Comparisons follow the rules a SQL engine applies to extracted JSON scalars:
//! booleans compare as the integers 1 and 0, values of different kinds order
//! null < number < text, and any comparison involving a missing field or `null`
//! does not match.

use std::{borrow::Cow, cmp::Ordering};
use serde_json::Value;

use sqldoc_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    name::FieldPath,
    query::{Filter, FilterOp, FilterValue, QueryVisitor},
};

/// A JSON value reduced to the scalar a SQL engine would extract from it.
///
/// # Note
///
/// Arrays and objects are compared by their JSON text, like an engine that
/// extracts them as text. Two integers compare exactly; an integer and a real
/// compare as reals.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Comparable<'a> {
    Null,
    Integer(i64),
    Real(f64),
    Text(Cow<'a, str>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Integer(i64::from(*value)),
            Value::Number(value) => match value.as_i64() {
                Some(value) => Comparable::Integer(value),
                None => value.as_f64().map(Comparable::Real).unwrap_or(Comparable::Null),
            },
            Value::String(value) => Comparable::Text(Cow::Borrowed(value)),
            other => Comparable::Text(Cow::Owned(other.to_string())),
        }
    }
}

impl<'a> From<&'a FilterValue> for Comparable<'a> {
    fn from(value: &'a FilterValue) -> Self {
        match value {
            FilterValue::Bool(value) => Comparable::Integer(i64::from(*value)),
            FilterValue::Integer(value) => Comparable::Integer(*value),
            FilterValue::Float(value) => Comparable::Real(*value),
            FilterValue::Text(value) => Comparable::Text(Cow::Borrowed(value)),
        }
    }
}

impl<'a> Comparable<'a> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Integer(_) | Comparable::Real(_) => 1,
            Comparable::Text(_) => 2,
        }
    }

    fn as_real(&self) -> f64 {
        match self {
            Comparable::Integer(value) => *value as f64,
            Comparable::Real(value) => *value,
            _ => f64::NAN,
        }
    }

    /// Total order used for sorting: nulls first, then numbers, then text.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Integer(a), Comparable::Integer(b)) => a.cmp(b),
            (Comparable::Integer(_) | Comparable::Real(_), Comparable::Integer(_) | Comparable::Real(_)) => {
                self.as_real().partial_cmp(&other.as_real()).unwrap_or(Ordering::Equal)
            }
            (Comparable::Text(a), Comparable::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Resolves a field path inside a document, descending through nested objects.
pub(crate) fn lookup<'a>(document: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(document, |value, segment| value.as_object()?.get(segment))
}

/// Extracts the sort key of a document for a field path. Missing fields sort as null.
pub(crate) fn sort_key<'a>(document: &'a Value, path: &FieldPath) -> Comparable<'a> {
    lookup(document, path)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Value,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every supported filter.
    pub fn evaluate(&mut self, filters: &[Filter]) -> DocumentStoreResult<bool> {
        Ok(self
            .visit_filters(filters)?
            .into_iter()
            .all(|matched| matched))
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_field(&mut self, field: &FieldPath, op: FilterOp, value: &FilterValue) -> Result<Self::Output, Self::Error> {
        let left = sort_key(self.document, field);
        let right = Comparable::from(value);

        if matches!(left, Comparable::Null) {
            return Ok(false);
        }

        let ordering = left.sort_cmp(&right);

        Ok(match op {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn matches(document: &Value, filters: &[Filter]) -> bool {
        DocumentEvaluator::new(document).evaluate(filters).unwrap()
    }

    #[test]
    fn compares_numbers_and_text() {
        let doc = json!({ "name": "Ana", "age": 30, "score": 4.5 });

        assert!(matches(&doc, &[Filter::gt("age", 20)]));
        assert!(matches(&doc, &[Filter::eq("age", 30.0)]));
        assert!(matches(&doc, &[Filter::new("name", "=", "Ana")]));
        assert!(matches(&doc, &[Filter::lte("score", 4.5), Filter::ne("name", "Bob")]));
        assert!(!matches(&doc, &[Filter::gt("age", 20), Filter::eq("name", "Bob")]));
    }

    #[test]
    fn numbers_never_equal_text() {
        let doc = json!({ "age": 30 });

        assert!(!matches(&doc, &[Filter::eq("age", "30")]));
        assert!(matches(&doc, &[Filter::lt("age", "30")]));
    }

    #[test]
    fn booleans_compare_as_integers() {
        let doc = json!({ "active": true });

        assert!(matches(&doc, &[Filter::eq("active", true)]));
        assert!(matches(&doc, &[Filter::eq("active", 1)]));
        assert!(!matches(&doc, &[Filter::eq("active", false)]));
    }

    #[test]
    fn missing_and_null_fields_never_match() {
        let doc = json!({ "nickname": null });

        assert!(!matches(&doc, &[Filter::eq("nickname", "x")]));
        assert!(!matches(&doc, &[Filter::ne("nickname", "x")]));
        assert!(!matches(&doc, &[Filter::ne("missing", "x")]));
    }

    #[test]
    fn resolves_nested_paths() {
        let doc = json!({ "address": { "city": "Lima" } });

        assert!(matches(&doc, &[Filter::eq("address.city", "Lima")]));
        assert!(!matches(&doc, &[Filter::eq("address.city.name", "Lima")]));
    }

    #[test]
    fn unsupported_operators_are_ignored() {
        let doc = json!({ "age": 30 });

        assert!(matches(&doc, &[Filter::new("age", "LIKE", "%3%"), Filter::gt("age", 1)]));
        assert!(matches(&doc, &[Filter::new("age", "<>", 30)]));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let doc = json!({ "n": 9_007_199_254_740_993_i64 });

        assert!(matches(&doc, &[Filter::eq("n", 9_007_199_254_740_993_i64)]));
        assert!(!matches(&doc, &[Filter::eq("n", 9_007_199_254_740_992_i64)]));
        assert!(matches(&doc, &[Filter::gt("n", 9_007_199_254_740_992_i64)]));
    }

    #[test]
    fn integers_and_reals_compare_by_value() {
        let doc = json!({ "age": 30, "score": 4.5 });

        assert!(matches(&doc, &[Filter::lt("age", 30.5)]));
        assert!(matches(&doc, &[Filter::gt("score", 4)]));
    }

    #[test]
    fn sort_order_puts_nulls_first() {
        let values = [json!(null), json!(2), json!("a"), json!(1.5)];
        let mut keys = values.iter().map(Comparable::from).collect::<Vec<_>>();

        keys.sort_by(|a, b| a.sort_cmp(b));

        assert_eq!(
            keys,
            vec![
                Comparable::Null,
                Comparable::Real(1.5),
                Comparable::Integer(2),
                Comparable::Text(Cow::Borrowed("a")),
            ]
        );
    }
}
