//! Query requests for filtering, sorting and limiting documents in a collection.
//!
//! A [`QueryRequest`] is a flat list of [`Filter`]s that are all ANDed together,
//! an optional single sort field and a result limit. Requests deserialize
//! directly from the wire form:
//!
//! ```json
//! { "filters": [{ "field": "age", "operator": ">", "value": 20 }],
//!   "sort_field": "age", "sort_direction": "DESC", "limit": 10 }
//! ```
//!
//! # Query Building
//!
//! ```ignore
//! use sqldoc::query::{QueryRequest, Filter, SortDirection};
//!
//! let query = QueryRequest::builder()
//!     .filter(Filter::eq("status", "active"))
//!     .filter(Filter::gt("age", 18))
//!     .sort("age", SortDirection::Desc)
//!     .limit(10)
//!     .build();
//! ```
//!
//! Backends consume requests through the [`QueryVisitor`] trait, which owns the
//! operator whitelist: filters with an operator outside the whitelist are dropped
//! rather than rejected, and the remaining filters are still applied.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use tracing::warn;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    name::FieldPath,
};

/// Result limit applied when a request does not specify one.
pub const DEFAULT_LIMIT: u64 = 100;

/// Comparison operators accepted by the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `==` or `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl FilterOp {
    /// Maps a wire operator through the whitelist. Returns `None` for anything else.
    pub fn parse(operator: &str) -> Option<Self> {
        match operator {
            "==" | "=" => Some(FilterOp::Eq),
            "!=" => Some(FilterOp::Ne),
            ">" => Some(FilterOp::Gt),
            ">=" => Some(FilterOp::Gte),
            "<" => Some(FilterOp::Lt),
            "<=" => Some(FilterOp::Lte),
            _ => None,
        }
    }

    /// The SQL comparison token for this operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// A scalar value a field is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    /// Converts the value into its JSON representation. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Bool(value) => Value::Bool(*value),
            FilterValue::Integer(value) => Value::Number((*value).into()),
            FilterValue::Float(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FilterValue::Text(value) => Value::String(value.clone()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

/// A single `(field, operator, value)` predicate.
///
/// The operator is kept as received so that unsupported operators can be
/// dropped at translation time instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: String,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, "==", value)
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, "!=", value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, ">", value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, ">=", value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, "<", value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, "<=", value)
    }

    /// The whitelisted operator, or `None` if this filter will be dropped.
    pub fn op(&self) -> Option<FilterOp> {
        FilterOp::parse(&self.operator)
    }
}

/// Sort direction for query results.
///
/// Deserialization is lenient: `DESC` in any case selects [`SortDirection::Desc`],
/// every other string selects [`SortDirection::Asc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(direction: &str) -> Self {
        if direction.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SortDirection::parse(&String::deserialize(deserializer)?))
    }
}

/// A filter/sort/limit request against one collection.
///
/// Absent fields take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    /// Filters, all of which must match. Order only affects the generated statement text.
    pub filters: Vec<Filter>,
    /// Optional field to order results by.
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    /// Maximum number of documents to return.
    pub limit: u64,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort_field: None,
            sort_direction: SortDirection::Asc,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Checks every filter field and the sort field against the field path grammar.
    ///
    /// Filters whose operator will be dropped are checked too.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidField`] for the first invalid field.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        for filter in &self.filters {
            FieldPath::parse(&filter.field)?;
        }
        self.sort_path()?;

        Ok(())
    }

    /// The parsed sort field, if any.
    pub fn sort_path(&self) -> DocumentStoreResult<Option<FieldPath>> {
        self.sort_field
            .as_deref()
            .map(FieldPath::parse)
            .transpose()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: QueryRequest,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: QueryRequest::default() }
    }

    /// Appends a filter. All filters are ANDed.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filters.push(filter);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort_field = Some(field.into());
        self.query.sort_direction = direction;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = limit;
        self
    }

    pub fn build(self) -> QueryRequest {
        self.query
    }
}

/// Walks the filters of a request on behalf of a backend.
///
/// Implementors only handle whitelisted comparisons in [`visit_field`](Self::visit_field);
/// [`visit_filters`](Self::visit_filters) drops unsupported operators and parses field paths.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError> + From<DocumentStoreError>;

    fn visit_field(
        &mut self,
        field: &FieldPath,
        op: FilterOp,
        value: &FilterValue,
    ) -> Result<Self::Output, Self::Error>;

    /// Visits each filter in order, returning one output per surviving filter.
    fn visit_filters(&mut self, filters: &[Filter]) -> Result<Vec<Self::Output>, Self::Error> {
        let mut outputs = Vec::with_capacity(filters.len());

        for filter in filters {
            let Some(op) = filter.op() else {
                warn!(
                    field = %filter.field,
                    operator = %filter.operator,
                    "dropping filter with unsupported operator"
                );
                continue;
            };
            let path = FieldPath::parse(&filter.field)?;

            outputs.push(self.visit_field(&path, op, &filter.value)?);
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn operator_whitelist() {
        assert_eq!(FilterOp::parse("=="), Some(FilterOp::Eq));
        assert_eq!(FilterOp::parse("="), Some(FilterOp::Eq));
        assert_eq!(FilterOp::parse("!="), Some(FilterOp::Ne));
        assert_eq!(FilterOp::parse(">="), Some(FilterOp::Gte));
        assert_eq!(FilterOp::Eq.as_sql(), "=");
        for op in ["<>", "LIKE", "; DROP", "", "=>", "in"] {
            assert_eq!(FilterOp::parse(op), None);
        }
    }

    #[test]
    fn deserializes_wire_request_with_defaults() {
        let query: QueryRequest = serde_json::from_value(json!({
            "filters": [
                { "field": "age", "operator": ">", "value": 20 },
                { "field": "name", "operator": "==", "value": "Ana" },
                { "field": "score", "operator": "<", "value": 4.5 },
                { "field": "active", "operator": "=", "value": true }
            ]
        }))
        .unwrap();

        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.sort_field, None);
        assert_eq!(query.sort_direction, SortDirection::Asc);
        assert_eq!(
            query.filters.iter().map(|f| f.value.clone()).collect::<Vec<_>>(),
            vec![
                FilterValue::Integer(20),
                FilterValue::Text("Ana".into()),
                FilterValue::Float(4.5),
                FilterValue::Bool(true),
            ]
        );
    }

    #[test]
    fn sort_direction_is_lenient() {
        for (raw, expected) in [
            ("DESC", SortDirection::Desc),
            ("desc", SortDirection::Desc),
            ("Desc", SortDirection::Desc),
            ("ASC", SortDirection::Asc),
            ("sideways", SortDirection::Asc),
        ] {
            let query: QueryRequest =
                serde_json::from_value(json!({ "sort_field": "age", "sort_direction": raw })).unwrap();
            assert_eq!(query.sort_direction, expected);
        }
    }

    #[test]
    fn validate_rejects_bad_sort_and_filter_fields() {
        let bad_sort = QueryRequest::builder()
            .sort("age DESC; --", SortDirection::Asc)
            .build();
        let bad_filter = QueryRequest::builder()
            .filter(Filter::new("x')", "~~", 1))
            .build();

        assert!(matches!(bad_sort.validate(), Err(DocumentStoreError::InvalidField(_))));
        assert!(matches!(bad_filter.validate(), Err(DocumentStoreError::InvalidField(_))));
        assert!(QueryRequest::builder().filter(Filter::eq("a.b", 1)).build().validate().is_ok());
    }

    struct Collect;

    impl QueryVisitor for Collect {
        type Output = (String, FilterOp);
        type Error = DocumentStoreError;

        fn visit_field(
            &mut self,
            field: &FieldPath,
            op: FilterOp,
            _value: &FilterValue,
        ) -> Result<Self::Output, Self::Error> {
            Ok((field.to_string(), op))
        }
    }

    #[test]
    fn visitor_drops_unknown_operators_and_keeps_the_rest() {
        let filters = vec![
            Filter::new("a", "LIKE", "x"),
            Filter::gt("b", 1),
            Filter::new("c", "<>", 2),
            Filter::lte("d", 3),
        ];

        let visited = Collect.visit_filters(&filters).unwrap();

        assert_eq!(
            visited,
            vec![("b".to_string(), FilterOp::Gt), ("d".to_string(), FilterOp::Lte)]
        );
    }
}
