//! The legacy one-case-per-block CSV dialect.
//!
//! Each case is a block between `TEST_CASE_START` and `TEST_CASE_END`
//! markers, with three fixed metadata lines followed by an optional table:
//!
//! ```text
//! TEST_CASE_START
//! name
//! 2e9b7b8c-2d9f-4f65-858a-1bb339885e23
//! description
//! A,B,C
//! 1,2,3
//! 4,5,6
//! TEST_CASE_END
//! ```
//!
//! The second metadata line is either a structurally valid identifier
//! (adopted verbatim as the case id) or legacy free-form data: a non-empty
//! legacy value is merged into every step row under the reserved
//! [`LEGACY_TAG_COLUMN`], and the id is instead derived deterministically
//! from the step content. Under the deprecated [`LegacyTagRule::Mandatory`]
//! rule an empty second line is fatal; the default
//! [`LegacyTagRule::Optional`] accepts it.
//!
//! Table parsing is strict about excess: a value row may carry trailing
//! *empty* cells beyond the header, but a trailing non-empty cell is
//! fatal. Missing trailing cells pad as empty strings, and an empty header
//! cell names a real anonymous column.
//!
//! On write, a valid in-memory id is emitted verbatim; an invalid or
//! missing id is replaced with a fresh random id — never the
//! content-derived one, so unrelated cases cannot collide. Output uses
//! CRLF line endings.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::blocks::{next_block, Block, RowCursor};
use crate::case::TestCase;
use crate::dialect::{
    pad_row, reconcile_row, write_row, AnonymousColumns, ReadCases, WriteCases, END_MARKER,
    START_MARKER,
};
use crate::error::{Error, Result};
use crate::ident::{id_from_steps, is_valid_id, new_id};
use crate::table::FlexTable;

/// Reserved column receiving the legacy free-form value of the second
/// metadata line.
pub const LEGACY_TAG_COLUMN: &str = "Symbol";

/// How the reader treats the second metadata line when it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyTagRule {
    /// Current behavior: an empty line is fine; the id is derived from the
    /// step content.
    #[default]
    Optional,
    /// Deprecated rule: the legacy tag line must not be empty.
    Mandatory,
}

/// Reads legacy-dialect files.
#[derive(Debug, Clone)]
pub struct CaseCsvReader {
    cursor: RowCursor,
    tag_rule: LegacyTagRule,
}

impl CaseCsvReader {
    /// Creates a reader over string input.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        Ok(CaseCsvReader {
            cursor: RowCursor::from_str(text),
            tag_rule: LegacyTagRule::default(),
        })
    }

    /// Creates a reader over any input stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(CaseCsvReader {
            cursor: RowCursor::from_reader(reader)?,
            tag_rule: LegacyTagRule::default(),
        })
    }

    /// Opens a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(CaseCsvReader {
            cursor: RowCursor::from_path(path)?,
            tag_rule: LegacyTagRule::default(),
        })
    }

    /// Selects the legacy-tag rule variant.
    #[must_use]
    pub fn with_legacy_tag_rule(mut self, rule: LegacyTagRule) -> Self {
        self.tag_rule = rule;
        self
    }

    fn parse_block(&self, block: &Block) -> Result<TestCase> {
        let name = match block.body.first() {
            Some(row) if !row.is_blank() => row.leading().to_string(),
            Some(row) => return Err(Error::schema(row.line, "case name is missing")),
            None => return Err(Error::schema(block.start_line, "case name is missing")),
        };

        let tag = block
            .body
            .get(1)
            .map(|row| row.leading().to_string())
            .unwrap_or_default();
        if self.tag_rule == LegacyTagRule::Mandatory && tag.is_empty() {
            let line = block.body.get(1).map_or(block.start_line, |row| row.line);
            return Err(Error::schema(line, "legacy tag line must not be empty"));
        }

        let description = block
            .body
            .get(2)
            .map(|row| row.leading().to_string())
            .unwrap_or_default();

        let mut steps = FlexTable::new();
        if let Some((header_row, value_rows)) = block.body.get(3..).and_then(|t| t.split_first()) {
            let headers = header_row.cells.clone();
            for row in value_rows {
                if row.cells.is_empty() {
                    continue;
                }
                steps.append(reconcile_row(&headers, row, AnonymousColumns::Keep)?);
            }
        }

        let id = if is_valid_id(&tag) {
            tag
        } else {
            if !tag.is_empty() {
                for row in 0..steps.len() {
                    if let Some(step) = steps.row_mut(row) {
                        step.entry(LEGACY_TAG_COLUMN.to_string())
                            .or_insert_with(|| tag.clone());
                    }
                }
            }
            let case = TestCase::new(name.as_str()).with_steps(steps.clone());
            id_from_steps(&case)
        };

        Ok(TestCase {
            name,
            description,
            id: Some(id),
            steps,
        })
    }
}

impl ReadCases for CaseCsvReader {
    fn read_one(&mut self) -> Result<Option<TestCase>> {
        match next_block(&mut self.cursor, START_MARKER, END_MARKER)? {
            Some(block) => Ok(Some(self.parse_block(&block)?)),
            None => Ok(None),
        }
    }

    fn check_validity(&self) -> bool {
        let mut probe = self.clone();
        loop {
            match probe.read_one() {
                Ok(Some(_)) => continue,
                Ok(None) => return true,
                Err(_) => return false,
            }
        }
    }
}

impl Iterator for CaseCsvReader {
    type Item = Result<TestCase>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_one().transpose()
    }
}

/// Writes legacy-dialect files.
///
/// Column order is (first-priority columns present, in given order) +
/// (remaining columns, first-seen order) + (last-priority columns present,
/// in given order).
#[derive(Debug)]
pub struct CaseCsvWriter<W: Write> {
    out: W,
    first_priority: Vec<String>,
    last_priority: Vec<String>,
}

impl CaseCsvWriter<BufWriter<File>> {
    /// Creates a file-backed writer.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(CaseCsvWriter::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> CaseCsvWriter<W> {
    /// Creates a writer over any output stream.
    pub fn new(out: W) -> Self {
        CaseCsvWriter {
            out,
            first_priority: Vec::new(),
            last_priority: Vec::new(),
        }
    }

    /// Columns to place first, in the given order, when present.
    #[must_use]
    pub fn with_first_priority<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.first_priority = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns to place last, in the given order, when present.
    #[must_use]
    pub fn with_last_priority<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.last_priority = columns.into_iter().map(Into::into).collect();
        self
    }

    fn ordered_columns(&self, observed: Vec<String>) -> Vec<String> {
        let mut columns: Vec<String> = self
            .first_priority
            .iter()
            .filter(|c| observed.contains(c))
            .cloned()
            .collect();
        for column in &observed {
            if !columns.contains(column) && !self.last_priority.contains(column) {
                columns.push(column.clone());
            }
        }
        for column in &self.last_priority {
            if observed.contains(column) && !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }

    /// Flushes and releases the output stream.
    pub fn close(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> WriteCases for CaseCsvWriter<W> {
    fn write(&mut self, case: &TestCase) -> Result<()> {
        if case.name.is_empty() {
            return Err(Error::invalid_case("case name must not be empty"));
        }
        let id = match case.id.as_deref() {
            Some(id) if is_valid_id(id) => id.to_string(),
            // A fresh random id, never the content-derived one: deriving
            // here would make unrelated cases with equal steps collide.
            _ => new_id(),
        };

        write_row(&mut self.out, &[START_MARKER.to_string()])?;
        write_row(&mut self.out, &[case.name.clone()])?;
        write_row(&mut self.out, &[id])?;
        write_row(&mut self.out, &[case.description.clone()])?;
        if !case.steps.is_empty() {
            let columns = self.ordered_columns(case.steps.columns());
            write_row(&mut self.out, &columns)?;
            for row in &case.steps {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or_default())
                    .collect();
                write_row(&mut self.out, &pad_row(cells, columns.len()))?;
            }
        }
        write_row(&mut self.out, &[END_MARKER.to_string()])?;
        Ok(())
    }
}

impl<W: Write> Drop for CaseCsvWriter<W> {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    const VALID_WITH_ID: &str = "\nTEST_CASE_START\nname\n2e9b7b8c-2d9f-4f65-858a-1bb339885e23\ndescription\nA,B,C\n1,2,3\n4,5,6\nTEST_CASE_END\n";

    #[test]
    fn test_reading_with_valid_id() {
        let mut reader = CaseCsvReader::from_str(VALID_WITH_ID).unwrap();
        let case = reader.read_one().unwrap().unwrap();
        assert_eq!(case.name, "name");
        assert_eq!(case.description, "description");
        assert_eq!(case.id.as_deref(), Some("2e9b7b8c-2d9f-4f65-858a-1bb339885e23"));
        assert_eq!(
            case.steps,
            FlexTable::from(vec![
                row! {"A" => "1", "B" => "2", "C" => "3"},
                row! {"A" => "4", "B" => "5", "C" => "6"},
            ])
        );
        assert!(reader.read_one().unwrap().is_none());
    }

    #[test]
    fn test_legacy_tag_merges_and_derives_id() {
        let text = "TEST_CASE_START\nname\ninstrument\ndescription\nA,B\n1,2\nTEST_CASE_END\n";
        let case = CaseCsvReader::from_str(text)
            .unwrap()
            .read_one()
            .unwrap()
            .unwrap();
        assert_eq!(
            case.steps,
            FlexTable::from(vec![row! {"A" => "1", "B" => "2", "Symbol" => "instrument"}])
        );
        let expected = id_from_steps(&TestCase::new("name").with_steps(case.steps.clone()));
        assert_eq!(case.id.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_legacy_tag_does_not_overwrite_existing_symbol() {
        let text =
            "TEST_CASE_START\nname\ninstrument\ndesc\nA,Symbol\n1,kept\nTEST_CASE_END\n";
        let case = CaseCsvReader::from_str(text)
            .unwrap()
            .read_one()
            .unwrap()
            .unwrap();
        assert_eq!(case.steps.row(0).unwrap()["Symbol"], "kept");
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let text = "TEST_CASE_START\n\ninstrument\ndescription\nTEST_CASE_END\n";
        let err = CaseCsvReader::from_str(text).unwrap().read_all().unwrap_err();
        assert!(matches!(err, Error::Schema { line: 2, .. }));
    }

    #[test]
    fn test_mandatory_tag_rule() {
        let text = "TEST_CASE_START\nname\n\ndescription\nTEST_CASE_END\n";
        let mut lenient = CaseCsvReader::from_str(text).unwrap();
        assert!(lenient.read_all().is_ok());

        let mut strict = CaseCsvReader::from_str(text)
            .unwrap()
            .with_legacy_tag_rule(LegacyTagRule::Mandatory);
        let err = strict.read_all().unwrap_err();
        assert!(matches!(err, Error::Schema { line: 3, .. }));
    }

    #[test]
    fn test_metadata_defaults() {
        let text = "TEST_CASE_START\nname\nTEST_CASE_END\n";
        let case = CaseCsvReader::from_str(text)
            .unwrap()
            .read_one()
            .unwrap()
            .unwrap();
        assert_eq!(case.description, "");
        assert!(case.steps.is_empty());
    }

    #[test]
    fn test_writer_emits_crlf_template() {
        let case = TestCase::new("name")
            .with_description("description")
            .with_id("2e9b7b8c-2d9f-4f65-858a-1bb339885e23")
            .with_steps(FlexTable::from(vec![
                row! {"A" => "1", "B" => "2", "C" => "3"},
                row! {"A" => "4", "B" => "5", "C" => "6"},
            ]));
        let mut buffer = Vec::new();
        let mut writer = CaseCsvWriter::new(&mut buffer);
        writer.write(&case).unwrap();
        writer.close().unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "TEST_CASE_START\r\nname\r\n2e9b7b8c-2d9f-4f65-858a-1bb339885e23\r\ndescription\r\nA,B,C\r\n1,2,3\r\n4,5,6\r\nTEST_CASE_END\r\n"
        );
    }

    #[test]
    fn test_writer_priority_column_order() {
        let case = TestCase::new("name")
            .with_id("2e9b7b8c-2d9f-4f65-858a-1bb339885e23")
            .with_steps(FlexTable::from(vec![
                row! {"A" => "1", "B" => "2", "C" => "3"},
            ]));
        let mut buffer = Vec::new();
        let mut writer = CaseCsvWriter::new(&mut buffer)
            .with_first_priority(["B", "A"])
            .with_last_priority(["C"]);
        writer.write(&case).unwrap();
        writer.close().unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("B,A,C\r\n2,1,3\r\n"));
    }

    #[test]
    fn test_writer_replaces_invalid_id_with_random() {
        let case = TestCase::new("name")
            .with_id("invalid")
            .with_steps(FlexTable::from(vec![row! {"A" => "1"}]));
        let derived = id_from_steps(&case);

        let mut buffer = Vec::new();
        let mut writer = CaseCsvWriter::new(&mut buffer);
        writer.write(&case).unwrap();
        writer.close().unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let written = CaseCsvReader::from_str(&text)
            .unwrap()
            .read_one()
            .unwrap()
            .unwrap();
        let written_id = written.id.unwrap();
        assert!(is_valid_id(&written_id));
        assert_ne!(written_id, derived, "writer must not use the derived id");
    }

    #[test]
    fn test_writer_rejects_empty_name() {
        let case = TestCase::new("");
        let mut buffer = Vec::new();
        let mut writer = CaseCsvWriter::new(&mut buffer);
        assert!(matches!(writer.write(&case), Err(Error::InvalidCase(_))));
    }
}
