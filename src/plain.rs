//! Flattening a case stream into a plain step-row stream.
//!
//! [`PlainStepsReader`] adapts any [`ReadCases`] source into an iterator of
//! bare step rows, concatenating the steps of every case in file order.
//! Useful when the per-case grouping is irrelevant and only the traffic
//! matters.
//!
//! ## Examples
//!
//! ```rust
//! use tabcase::{CaseCsvReader, FlexTable, PlainStepsReader};
//!
//! let text = "TEST_CASE_START\nname\n\n\nA,B\n1,2\n3,4\nTEST_CASE_END\n";
//! let reader = PlainStepsReader::new(CaseCsvReader::from_str(text).unwrap());
//! let traffic: FlexTable = reader.collect::<Result<_, _>>().unwrap();
//! assert_eq!(traffic.len(), 2);
//! ```

use crate::dialect::ReadCases;
use crate::error::Result;
use crate::matrix_csv::{GlobalColumns, MatrixCsvReader};
use crate::table::Row;

/// Iterates the step rows of every case a reader produces, in order.
#[derive(Debug)]
pub struct PlainStepsReader<R: ReadCases> {
    inner: R,
    current: std::vec::IntoIter<Row>,
}

impl<R: ReadCases> PlainStepsReader<R> {
    /// Wraps a case reader.
    pub fn new(inner: R) -> Self {
        PlainStepsReader {
            inner,
            current: Vec::new().into_iter(),
        }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl PlainStepsReader<MatrixCsvReader> {
    /// The global column layout of the underlying matrix file. Only the
    /// matrix dialect declares one; the legacy dialect has no headers to
    /// report.
    pub fn headers(&mut self) -> Result<GlobalColumns> {
        self.inner.global_columns()
    }
}

impl<R: ReadCases> Iterator for PlainStepsReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current.next() {
                return Some(Ok(row));
            }
            match self.inner.read_one() {
                Ok(Some(case)) => {
                    self.current = case.steps.into_iter();
                }
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
