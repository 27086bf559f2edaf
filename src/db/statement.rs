//! INSERT statement construction.
//!
//! Table and column names are interpolated into the statement text, so they
//! are checked against a conservative identifier pattern first. Values never
//! reach the text; they travel as bound parameters.

use std::collections::HashSet;
use std::fmt;

use super::error::StatementError;
use super::value::Value;

/// How parameter markers are written into statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `%s` markers, the DB-API format style.
    Format,
    /// `$1`, `$2`, ... markers, as sent over the PostgreSQL wire protocol.
    #[default]
    Numbered,
}

impl PlaceholderStyle {
    fn marker(self, position: usize) -> String {
        match self {
            PlaceholderStyle::Format => "%s".to_string(),
            PlaceholderStyle::Numbered => format!("${}", position),
        }
    }
}

/// A validated INSERT: identifiers checked, one parameter per column.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    table: String,
    columns: Vec<String>,
    params: Vec<Value>,
}

impl InsertStatement {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Renders the statement text with the given placeholder style.
    pub fn sql(&self, style: PlaceholderStyle) -> String {
        let markers: Vec<String> = (1..=self.params.len()).map(|i| style.marker(i)).collect();

        let columns: Vec<String> = self.columns.iter().map(|c| render_identifier(c)).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            render_parts(&self.table),
            columns.join(","),
            markers.join(",")
        )
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql(PlaceholderStyle::Numbered))
    }
}

/// Builds an INSERT for one row. Columns and values are positionally aligned
/// and must have the same length.
pub fn build_insert<S, V>(
    table: &str,
    columns: &[S],
    values: V,
) -> Result<InsertStatement, StatementError>
where
    S: AsRef<str>,
    V: IntoIterator,
    V::Item: Into<Value>,
{
    let table = validate_table(table)?;

    if columns.is_empty() {
        return Err(StatementError::NoColumns(table.to_string()));
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        let column = validate_identifier(column.as_ref())?;
        // Unquoted identifiers fold to lower case on the server.
        if !seen.insert(column.to_lowercase()) {
            return Err(StatementError::DuplicateColumn(column.to_string()));
        }
    }

    let params: Vec<Value> = values.into_iter().map(Into::into).collect();
    if params.len() != columns.len() {
        return Err(StatementError::ArityMismatch {
            columns: columns.len(),
            values: params.len(),
        });
    }

    Ok(InsertStatement {
        table: table.to_string(),
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        params,
    })
}

/// Accepts `name` or `schema.name`, each part a plain identifier.
pub fn validate_table(table: &str) -> Result<&str, StatementError> {
    if table.is_empty() {
        return Err(StatementError::EmptyTable);
    }

    let mut parts = table.split('.');
    let first = parts.next().unwrap_or_default();
    let second = parts.next();
    if parts.next().is_some() {
        return Err(StatementError::InvalidIdentifier(table.to_string()));
    }

    for part in std::iter::once(first).chain(second) {
        if !is_plain_identifier(part) {
            return Err(StatementError::InvalidIdentifier(table.to_string()));
        }
    }

    Ok(table)
}

/// Validates a table name and renders it for statement text.
pub fn render_table(table: &str) -> Result<String, StatementError> {
    validate_table(table).map(render_parts)
}

fn render_parts(table: &str) -> String {
    table.split('.').map(render_identifier).collect::<Vec<_>>().join(".")
}

/// Reserved words are written as quoted lower-case identifiers, which is
/// what the server would fold them to unquoted; everything else is left bare.
fn render_identifier(name: &str) -> String {
    let folded = name.to_ascii_lowercase();
    if RESERVED_WORDS.binary_search(&folded.as_str()).is_ok() {
        format!("\"{}\"", folded)
    } else {
        name.to_string()
    }
}

// Keywords PostgreSQL does not accept as a bare table or column name
// (reserved, and reserved-but-usable-as-function-or-type). Sorted.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant", "group",
    "having", "ilike", "in", "initially", "inner", "intersect", "into", "is", "isnull",
    "join", "lateral", "leading", "left", "like", "limit", "localtime", "localtimestamp",
    "natural", "not", "notnull", "null", "offset", "on", "only", "or", "order", "outer",
    "overlaps", "placing", "primary", "references", "returning", "right", "select",
    "session_user", "similar", "some", "symmetric", "system_user", "table", "tablesample",
    "then", "to", "trailing", "true", "union", "unique", "user", "using", "variadic",
    "verbose", "when", "where", "window", "with",
];

pub fn validate_identifier(name: &str) -> Result<&str, StatementError> {
    if is_plain_identifier(name) {
        Ok(name)
    } else {
        Err(StatementError::InvalidIdentifier(name.to_string()))
    }
}

// [A-Za-z_][A-Za-z0-9_$]*, within the server's 63-byte identifier limit.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
