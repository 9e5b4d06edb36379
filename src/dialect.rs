//! Shared dialect plumbing: marker tokens, reader/writer traits, row
//! rendering, and header/value reconciliation.
//!
//! Both dialects delimit cases with the same literal marker tokens and
//! write carriage-return+newline line endings for compatibility with the
//! formats' original consumers. They differ in how a value row is
//! reconciled against its header row; the two policies are kept as
//! explicit named variants (see [`AnonymousColumns`] and the strictness
//! rules in `reconcile_row`) rather than unified.

use std::io::Write;

use crate::blocks::InputRow;
use crate::case::TestCase;
use crate::error::{Error, Result};
use crate::table::Row;

/// Marker row opening a test case.
pub const START_MARKER: &str = "TEST_CASE_START";

/// Marker row closing a test case.
pub const END_MARKER: &str = "TEST_CASE_END";

/// A forward-only, single-pass source of test cases.
///
/// `read_one` and iterator-style consumption draw from the same cursor and
/// are interchangeable; [`check_validity`](ReadCases::check_validity)
/// replays the remaining input without touching that cursor.
pub trait ReadCases: Iterator<Item = Result<TestCase>> {
    /// Reads the next case, or `None` at end of input.
    fn read_one(&mut self) -> Result<Option<TestCase>>;

    /// Reads every remaining case.
    fn read_all(&mut self) -> Result<Vec<TestCase>> {
        let mut cases = Vec::new();
        while let Some(case) = self.read_one()? {
            cases.push(case);
        }
        Ok(cases)
    }

    /// Runs the full parse over a replay of the remaining input, discarding
    /// output. Returns `false` on any error. The cursor used by subsequent
    /// real reads does not move.
    fn check_validity(&self) -> bool;
}

/// A sink for test cases.
pub trait WriteCases {
    /// Writes one case.
    fn write(&mut self, case: &TestCase) -> Result<()>;

    /// Writes every case of an iterator.
    fn write_many<'a, I>(&mut self, cases: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TestCase>,
    {
        for case in cases {
            self.write(case)?;
        }
        Ok(())
    }
}

/// Writes one comma-joined row with a CRLF terminator.
pub(crate) fn write_row<W: Write>(out: &mut W, cells: &[String]) -> Result<()> {
    out.write_all(cells.join(",").as_bytes())?;
    out.write_all(b"\r\n")?;
    Ok(())
}

/// Pads a cell list with empty cells up to `width`.
pub(crate) fn pad_row(mut cells: Vec<String>, width: usize) -> Vec<String> {
    while cells.len() < width {
        cells.push(String::new());
    }
    cells
}

/// How an empty header cell is treated during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnonymousColumns {
    /// The legacy dialect: an empty header cell names a real anonymous
    /// column, distinguishable from an omitted one.
    Keep,
    /// The matrix dialect: an empty header cell means "column absent
    /// here"; values beneath it are discarded.
    Drop,
}

/// Reconciles a value row against a header row.
///
/// - Missing trailing values become empty strings.
/// - Trailing empty values beyond the header are discarded silently.
/// - Trailing non-empty values beyond the header are fatal.
pub(crate) fn reconcile_row(
    headers: &[String],
    row: &InputRow,
    anonymous: AnonymousColumns,
) -> Result<Row> {
    for (index, cell) in row.cells.iter().enumerate() {
        if index >= headers.len() && !cell.is_empty() {
            return Err(Error::schema(
                row.line,
                format!(
                    "row has more values than the {} declared columns",
                    headers.len()
                ),
            ));
        }
    }
    let mut result = Row::new();
    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() && anonymous == AnonymousColumns::Drop {
            continue;
        }
        let value = row.cells.get(index).cloned().unwrap_or_default();
        result.insert(header.clone(), value);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn input(cells: &[&str]) -> InputRow {
        InputRow {
            line: 1,
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_reconcile_exact() {
        let row = reconcile_row(
            &headers(&["A", "B", "C"]),
            &input(&["1", "2", "3"]),
            AnonymousColumns::Keep,
        )
        .unwrap();
        assert_eq!(row, row! {"A" => "1", "B" => "2", "C" => "3"});
    }

    #[test]
    fn test_reconcile_pads_missing_values() {
        let row = reconcile_row(
            &headers(&["A", "B", "C"]),
            &input(&["1", "2"]),
            AnonymousColumns::Keep,
        )
        .unwrap();
        assert_eq!(row, row! {"A" => "1", "B" => "2", "C" => ""});
    }

    #[test]
    fn test_reconcile_discards_trailing_empty() {
        let row = reconcile_row(
            &headers(&["A"]),
            &input(&["1", "", ""]),
            AnonymousColumns::Keep,
        )
        .unwrap();
        assert_eq!(row, row! {"A" => "1"});
    }

    #[test]
    fn test_reconcile_rejects_trailing_non_empty() {
        let err = reconcile_row(
            &headers(&["A", "B", "C"]),
            &input(&["1", "2", "3", "extra"]),
            AnonymousColumns::Keep,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema { line: 1, .. }));
    }

    #[test]
    fn test_anonymous_column_kept_or_dropped() {
        let kept = reconcile_row(
            &headers(&["A", "B", ""]),
            &input(&["1", "2", "3"]),
            AnonymousColumns::Keep,
        )
        .unwrap();
        assert_eq!(kept, row! {"A" => "1", "B" => "2", "" => "3"});

        let dropped = reconcile_row(
            &headers(&["A", "B", ""]),
            &input(&["1", "2", "3"]),
            AnonymousColumns::Drop,
        )
        .unwrap();
        assert_eq!(dropped, row! {"A" => "1", "B" => "2"});
    }

    #[test]
    fn test_pad_row() {
        assert_eq!(
            pad_row(vec!["a".into()], 3),
            vec!["a".to_string(), String::new(), String::new()]
        );
    }
}
