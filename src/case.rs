//! The test-case entity.
//!
//! A [`TestCase`] is a named sequence of steps: a non-empty name, an
//! optional free-form description, a lazily resolved identifier, and a
//! [`FlexTable`] of step rows. Readers construct cases from files; callers
//! construct them directly and mutate them freely.
//!
//! ## Examples
//!
//! ```rust
//! use tabcase::{row, FlexTable, TestCase};
//!
//! let case = TestCase::new("Order book check")
//!     .with_description("fills the book, then queries it")
//!     .with_steps(FlexTable::from(vec![
//!         row! {"Action" => "Quote", "Price" => "100"},
//!     ]));
//! assert_eq!(case.name, "Order book check");
//! assert!(case.id.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::table::{FlexTable, Row};

/// One test case: name, description, identifier, and step rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Case name; dialect readers reject blocks without one.
    pub name: String,
    /// Free-form description, empty by default.
    pub description: String,
    /// Identifier, if one has been assigned or read. Resolved lazily: see
    /// [`id_from_steps`](crate::ident::id_from_steps) and the dialect
    /// writers' replacement rules.
    pub id: Option<String>,
    /// The step rows.
    pub steps: FlexTable,
}

impl TestCase {
    /// Creates a case with the given name, no description, no id, and no
    /// steps.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        TestCase {
            name: name.into(),
            description: String::new(),
            id: None,
            steps: FlexTable::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the steps.
    #[must_use]
    pub fn with_steps(mut self, steps: FlexTable) -> Self {
        self.steps = steps;
        self
    }

    /// Replaces the steps with the given rows.
    pub fn set_steps(&mut self, rows: Vec<Row>) {
        self.steps = FlexTable::from(rows);
    }
}

/// The ordered union of step columns across a set of cases, first-seen
/// order.
///
/// This is the flat counterpart of the matrix dialect's global header: the
/// writer derives its header from it when no explicit column list is
/// supplied, and a reader of the written file reports the same list back.
///
/// # Examples
///
/// ```rust
/// use tabcase::{global_columns, row, FlexTable, TestCase};
///
/// let cases = vec![
///     TestCase::new("a").with_steps(FlexTable::from(vec![row! {"A" => "1", "B" => "2"}])),
///     TestCase::new("b").with_steps(FlexTable::from(vec![row! {"B" => "3", "C" => "4"}])),
/// ];
/// assert_eq!(global_columns(&cases), vec!["A", "B", "C"]);
/// ```
#[must_use]
pub fn global_columns<'a>(cases: impl IntoIterator<Item = &'a TestCase>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for case in cases {
        for column in case.steps.columns() {
            if !columns.iter().any(|c| *c == column) {
                columns.push(column);
            }
        }
    }
    columns
}
