//! Comparison queries over table rows.
//!
//! A [`Query`] is an operator plus a comparison value. Queries are usually
//! written as plain strings with an optional operator prefix and resolved
//! with [`Query::parse`]:
//!
//! | Prefix | Query |
//! |--------|-------------------------|
//! | `=`    | equal (also the default for a bare value) |
//! | `!=`   | not equal               |
//! | `>`    | greater than            |
//! | `>=`   | greater than or equal   |
//! | `<`    | less than               |
//! | `<=`   | less than or equal      |
//!
//! Prefix matching is longest-first, so `>= 5` parses as *greater or equal*
//! rather than *greater* against `"= 5"`.
//!
//! Evaluation is numeric-first with a lexical fallback: both operands are
//! run through a canonical numeric parse, and only if either side fails to
//! parse does the comparison fall back to ordered text. There is no other
//! implicit coercion — `"5.0"` equals `"5"` numerically, while
//! `"value100"` is less than `"value700"` lexically.
//!
//! ## Examples
//!
//! ```rust
//! use tabcase::Query;
//!
//! assert!(Query::parse("> 500").matches("501"));
//! assert!(Query::parse("<= value700").matches("value100"));
//! assert!(Query::parse("5").matches("5.0"));
//! ```

use std::cmp::Ordering;

use crate::table::Row;

/// A single-column comparison query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Equal(String),
    NotEqual(String),
    GreaterThan(String),
    GreaterThanOrEqual(String),
    LessThan(String),
    LessThanOrEqual(String),
}

impl Query {
    /// Parses a query string into a [`Query`].
    ///
    /// The operator prefix is optional; a bare value implies equality.
    /// Whitespace between the operator and the value is ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::Query;
    ///
    /// assert_eq!(Query::parse("!= 6"), Query::NotEqual("6".to_string()));
    /// assert_eq!(Query::parse("11"), Query::Equal("11".to_string()));
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Query {
        let trimmed = input.trim_start();
        // Two-character operators first so ">=" never parses as ">".
        for (prefix, build) in [
            (">=", Query::GreaterThanOrEqual as fn(String) -> Query),
            ("<=", Query::LessThanOrEqual),
            ("!=", Query::NotEqual),
            ("=", Query::Equal),
            (">", Query::GreaterThan),
            ("<", Query::LessThan),
        ] {
            if let Some(rest) = trimmed.strip_prefix(prefix) {
                return build(rest.trim_start().to_string());
            }
        }
        Query::Equal(trimmed.to_string())
    }

    /// The comparison value the query was built with.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Query::Equal(v)
            | Query::NotEqual(v)
            | Query::GreaterThan(v)
            | Query::GreaterThanOrEqual(v)
            | Query::LessThan(v)
            | Query::LessThanOrEqual(v) => v,
        }
    }

    /// Evaluates the query against a single cell value.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        let ord = compare_values(value, self.value());
        match self {
            Query::Equal(_) => ord == Ordering::Equal,
            Query::NotEqual(_) => ord != Ordering::Equal,
            Query::GreaterThan(_) => ord == Ordering::Greater,
            Query::GreaterThanOrEqual(_) => ord != Ordering::Less,
            Query::LessThan(_) => ord == Ordering::Less,
            Query::LessThanOrEqual(_) => ord != Ordering::Greater,
        }
    }
}

/// Compares two cell values, numeric-first with a lexical fallback.
fn compare_values(left: &str, right: &str) -> Ordering {
    if let (Ok(l), Ok(r)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        if let Some(ord) = l.partial_cmp(&r) {
            return ord;
        }
    }
    left.cmp(right)
}

/// A partial-row query: column names mapped to per-column queries.
///
/// A row matches when every named column is present in the row and its
/// value satisfies the column's query. Columns absent from the pattern are
/// not constrained.
///
/// # Examples
///
/// ```rust
/// use tabcase::{row, FlexTable, RowQuery};
///
/// let table = FlexTable::from(vec![
///     row! {"Action" => "Quote", "Price" => "100"},
///     row! {"Action" => "Trade", "Price" => "250"},
/// ]);
/// let query = RowQuery::from_pattern(&row! {"Price" => "> 150"});
/// assert_eq!(table.count_where(&query), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowQuery(Vec<(String, Query)>);

impl RowQuery {
    /// Creates an empty query matching every row.
    #[must_use]
    pub fn new() -> Self {
        RowQuery::default()
    }

    /// Adds a column constraint.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, query: Query) -> Self {
        self.0.push((column.into(), query));
        self
    }

    /// Builds a query from a partial row, parsing each value as a query
    /// string.
    #[must_use]
    pub fn from_pattern(pattern: &Row) -> Self {
        RowQuery(
            pattern
                .iter()
                .map(|(column, value)| (column.clone(), Query::parse(value)))
                .collect(),
        )
    }

    /// Evaluates the query against a full row.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.0.iter().all(|(column, query)| {
            row.get(column)
                .is_some_and(|value| query.matches(value))
        })
    }
}

impl From<&Row> for RowQuery {
    fn from(pattern: &Row) -> Self {
        RowQuery::from_pattern(pattern)
    }
}
