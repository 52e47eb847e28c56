//! Query translation from sqldoc query requests to parameterized SQLite statements.
//!
//! Filters become `json_extract` predicates over the `doc` column. Only validated
//! table names, validated JSON paths and whitelisted operators are written into
//! the statement text; every value travels as a bound parameter.

use sqldoc_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    name::{FieldPath, validate_name},
    query::{FilterOp, FilterValue, QueryRequest, QueryVisitor},
};

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl From<&FilterValue> for BindValue {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Bool(value) => BindValue::Bool(*value),
            FilterValue::Integer(value) => BindValue::Integer(*value),
            FilterValue::Float(value) => BindValue::Real(*value),
            FilterValue::Text(value) => BindValue::Text(value.clone()),
        }
    }
}

/// Statement text plus its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub text: String,
    pub params: Vec<BindValue>,
}

fn extract(path: &FieldPath) -> String {
    format!("json_extract(doc, '{}')", path.json_path())
}

/// Translates filters into SQL predicates, collecting their values as parameters.
///
/// This struct implements the [`QueryVisitor`] trait; each visited filter yields
/// one predicate string and pushes exactly one parameter.
#[derive(Debug, Default)]
pub(crate) struct SqlQueryTranslator {
    params: Vec<BindValue>,
}

impl QueryVisitor for SqlQueryTranslator {
    type Output = String;
    type Error = DocumentStoreError;

    fn visit_field(&mut self, field: &FieldPath, op: FilterOp, value: &FilterValue) -> Result<Self::Output, Self::Error> {
        self.params.push(BindValue::from(value));

        Ok(format!("{} {} ?", extract(field), op.as_sql()))
    }
}

/// Builds the `SELECT` statement for a query request against `table`.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidName`] or [`DocumentStoreError::InvalidField`]
/// if the table name or any field path fails validation.
pub fn translate(table: &str, query: &QueryRequest) -> DocumentStoreResult<SqlStatement> {
    let table = validate_name(table)?;
    let mut translator = SqlQueryTranslator::default();
    let predicates = translator.visit_filters(&query.filters)?;

    let mut text = format!("SELECT id, doc FROM \"{table}\"");

    if !predicates.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&predicates.join(" AND "));
    }
    if let Some(path) = query.sort_path()? {
        text.push_str(&format!(
            " ORDER BY {} {}",
            extract(&path),
            query.sort_direction.as_sql()
        ));
    }
    text.push_str(" LIMIT ?");

    let mut params = translator.params;
    params.push(BindValue::Integer(i64::try_from(query.limit).unwrap_or(i64::MAX)));

    Ok(SqlStatement { text, params })
}
