//! The multi-case CSV dialect with a shared global header.
//!
//! A file carries one global header row, then zero or more blocks, each
//! opened by a `TEST_CASE_START,<name>` row and closed by a
//! `TEST_CASE_END` row:
//!
//! ```text
//! A,B,C,D,E
//! TEST_CASE_START,name1
//! A,B,,D,
//! 1,2,,3,
//! 4,5,,6,
//! TEST_CASE_END
//! ```
//!
//! The first body row of a block is the *per-case header*: its cells align
//! positionally with the global header, an empty cell marks a column
//! absent from this case, and a non-empty cell beyond the global width is
//! fatal. Data rows align to the per-case header; missing trailing values
//! pad as empty strings (unlike the legacy dialect, a short row is never
//! an error), trailing empty cells are discarded, and trailing non-empty
//! cells are fatal.
//!
//! When the header section instead carries category declarations (see
//! [`crate::multiheader`]), the reader switches to multiheader mode:
//! blocks hold discriminator-marked data rows and no per-case header. The
//! multiheader config is captured at construction — explicitly via
//! [`MatrixCsvReader::with_multiheader_config`], or from the process-wide
//! default.
//!
//! [`MatrixCsvReader::global_columns`] reads the header section without
//! consuming any case. The writer mirrors it:
//! [`MatrixCsvWriter`] takes an explicit column list/mapping, or derives
//! one from the cases handed to
//! [`write_many`](crate::WriteCases::write_many).

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::blocks::{next_block, Block, InputRow, RowCursor};
use crate::case::{global_columns, TestCase};
use crate::dialect::{
    pad_row, reconcile_row, write_row, AnonymousColumns, ReadCases, WriteCases, END_MARKER,
    START_MARKER,
};
use crate::error::{Error, Result};
use crate::multiheader::{
    decode_data_row, decode_header_row, encode_data_row, encode_header_row,
    global_columns_by_category, is_header_row, resolve_config, CategoryColumns, MultiheaderConfig,
};
use crate::table::FlexTable;

/// The column layout declared by a file's header section, or supplied to a
/// writer: a flat list in single-header mode, a category mapping in
/// multiheader mode.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalColumns {
    Flat(Vec<String>),
    ByCategory(CategoryColumns),
}

impl GlobalColumns {
    /// The flat column list, if this is single-header layout.
    #[must_use]
    pub fn as_flat(&self) -> Option<&[String]> {
        match self {
            GlobalColumns::Flat(columns) => Some(columns),
            GlobalColumns::ByCategory(_) => None,
        }
    }

    /// The category mapping, if this is multiheader layout.
    #[must_use]
    pub fn as_by_category(&self) -> Option<&CategoryColumns> {
        match self {
            GlobalColumns::ByCategory(categories) => Some(categories),
            GlobalColumns::Flat(_) => None,
        }
    }
}

impl From<Vec<String>> for GlobalColumns {
    fn from(columns: Vec<String>) -> Self {
        GlobalColumns::Flat(columns)
    }
}

impl From<Vec<&str>> for GlobalColumns {
    fn from(columns: Vec<&str>) -> Self {
        GlobalColumns::Flat(columns.into_iter().map(str::to_string).collect())
    }
}

impl From<CategoryColumns> for GlobalColumns {
    fn from(categories: CategoryColumns) -> Self {
        GlobalColumns::ByCategory(categories)
    }
}

/// Reads matrix-dialect files, single-header or multiheader.
#[derive(Debug, Clone)]
pub struct MatrixCsvReader {
    cursor: RowCursor,
    config: Option<MultiheaderConfig>,
    header: Option<GlobalColumns>,
}

impl MatrixCsvReader {
    /// Creates a reader over string input. The process-wide default
    /// multiheader config, if any, is captured now.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        Ok(Self::with_cursor(RowCursor::from_str(text)))
    }

    /// Creates a reader over any input stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::with_cursor(RowCursor::from_reader(reader)?))
    }

    /// Opens a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_cursor(RowCursor::from_path(path)?))
    }

    fn with_cursor(cursor: RowCursor) -> Self {
        MatrixCsvReader {
            cursor,
            config: resolve_config(None),
            header: None,
        }
    }

    /// Overrides the captured multiheader config.
    #[must_use]
    pub fn with_multiheader_config(mut self, config: MultiheaderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The column layout of the file's header section. Does not consume
    /// any case: reading may still start from the first block afterwards.
    pub fn global_columns(&mut self) -> Result<GlobalColumns> {
        self.ensure_header()?;
        Ok(self
            .header
            .clone()
            .unwrap_or(GlobalColumns::Flat(Vec::new())))
    }

    fn ensure_header(&mut self) -> Result<()> {
        if self.header.is_some() {
            return Ok(());
        }

        let mut declarations: Vec<InputRow> = Vec::new();
        while let Some(row) = self.cursor.peek() {
            if row.cells.is_empty() {
                self.cursor.advance();
                continue;
            }
            if row.leading() == START_MARKER || row.leading() == END_MARKER {
                break;
            }
            declarations.push(row.clone());
            self.cursor.advance();
        }

        let multiheader = match (&self.config, declarations.first()) {
            (Some(config), Some(first)) => is_header_row(config, first),
            _ => false,
        };

        let header = if multiheader {
            let config = self.config.as_ref().expect("checked above");
            let mut categories = CategoryColumns::new();
            for row in &declarations {
                let (tag, owned) = decode_header_row(config, row)?;
                if categories.insert(tag.clone(), owned).is_some() {
                    return Err(Error::schema(row.line, format!("duplicate category '{tag}'")));
                }
            }
            GlobalColumns::ByCategory(categories)
        } else {
            match declarations.as_slice() {
                [] => {
                    if let Some(row) = self.cursor.peek() {
                        if row.leading() == START_MARKER {
                            return Err(Error::schema(row.line, "no header"));
                        }
                    }
                    GlobalColumns::Flat(Vec::new())
                }
                [only] => GlobalColumns::Flat(only.cells.clone()),
                [_, second, ..] => {
                    return Err(Error::schema(
                        second.line,
                        "unexpected row before the first test case",
                    ));
                }
            }
        };
        self.header = Some(header);
        Ok(())
    }

    fn parse_block(&self, block: &Block) -> Result<TestCase> {
        let name = block
            .marker
            .get(1)
            .filter(|name| !name.is_empty())
            .cloned()
            .ok_or_else(|| {
                Error::schema(
                    block.start_line,
                    "test case start marker must carry a case name",
                )
            })?;

        // An empty line inside a block is noise; a row of empty cells
        // (",,") is real data.
        let body: Vec<&InputRow> = block
            .body
            .iter()
            .filter(|row| !row.cells.is_empty())
            .collect();
        let mut steps = FlexTable::new();
        match self.header.as_ref().expect("header parsed before blocks") {
            GlobalColumns::Flat(global) => {
                if let Some((case_header, value_rows)) = body.split_first() {
                    for (index, cell) in case_header.cells.iter().enumerate() {
                        if !cell.is_empty() && index >= global.len() {
                            return Err(Error::schema(
                                case_header.line,
                                "case header is wider than the global header",
                            ));
                        }
                    }
                    for row in value_rows {
                        steps.append(reconcile_row(
                            &case_header.cells,
                            row,
                            AnonymousColumns::Drop,
                        )?);
                    }
                }
            }
            GlobalColumns::ByCategory(categories) => {
                let config = self
                    .config
                    .as_ref()
                    .ok_or_else(|| Error::config("multiheader file without a config"))?;
                for row in body {
                    steps.append(decode_data_row(config, categories, row)?);
                }
            }
        }

        Ok(TestCase {
            name,
            description: String::new(),
            id: None,
            steps,
        })
    }
}

impl ReadCases for MatrixCsvReader {
    fn read_one(&mut self) -> Result<Option<TestCase>> {
        self.ensure_header()?;
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

impl Iterator for MatrixCsvReader {
    type Item = Result<TestCase>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_one().transpose()
    }
}

/// Writes matrix-dialect files.
///
/// With explicit columns the header is emitted before the first case; with
/// none, [`write`](WriteCases::write) derives the layout from its first
/// case, while [`write_many`](WriteCases::write_many) derives it from the
/// whole set — the derivation `global_columns` readers report back.
#[derive(Debug)]
pub struct MatrixCsvWriter<W: Write> {
    out: W,
    config: Option<MultiheaderConfig>,
    multiheader: bool,
    columns: Option<GlobalColumns>,
    header_written: bool,
    width: usize,
}

impl MatrixCsvWriter<BufWriter<File>> {
    /// Creates a file-backed writer.
    pub fn from_path(
        path: impl AsRef<Path>,
        columns: impl Into<Option<GlobalColumns>>,
    ) -> Result<Self> {
        Ok(MatrixCsvWriter::new(
            BufWriter::new(File::create(path)?),
            columns,
        ))
    }
}

impl<W: Write> MatrixCsvWriter<W> {
    /// Creates a writer over any output stream. The process-wide default
    /// multiheader config, if any, is captured now.
    pub fn new(out: W, columns: impl Into<Option<GlobalColumns>>) -> Self {
        let columns = columns.into();
        let multiheader = matches!(columns, Some(GlobalColumns::ByCategory(_)));
        MatrixCsvWriter {
            out,
            config: resolve_config(None),
            multiheader,
            columns,
            header_written: false,
            width: 0,
        }
    }

    /// Derive a category mapping instead of a flat list when no explicit
    /// columns were given.
    #[must_use]
    pub fn with_multiheader(mut self, multiheader: bool) -> Self {
        self.multiheader = multiheader;
        self
    }

    /// Overrides the captured multiheader config.
    #[must_use]
    pub fn with_multiheader_config(mut self, config: MultiheaderConfig) -> Self {
        self.config = Some(config);
        self
    }

    fn derive_columns<'a, I>(&self, cases: I) -> Result<GlobalColumns>
    where
        I: IntoIterator<Item = &'a TestCase>,
    {
        if self.multiheader {
            let config = self
                .config
                .as_ref()
                .ok_or_else(|| Error::config("multiheader writing requires a config"))?;
            Ok(GlobalColumns::ByCategory(global_columns_by_category(
                cases, config,
            )))
        } else {
            Ok(GlobalColumns::Flat(global_columns(cases)))
        }
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        let columns = self
            .columns
            .as_ref()
            .ok_or_else(|| Error::config("no columns to write a header from"))?;
        match columns {
            GlobalColumns::Flat(global) => {
                self.width = global.len();
                write_row(&mut self.out, global)?;
            }
            GlobalColumns::ByCategory(categories) => {
                let config = self
                    .config
                    .as_ref()
                    .ok_or_else(|| Error::config("multiheader writing requires a config"))?;
                self.width = categories
                    .values()
                    .map(|owned| owned.len() + 1)
                    .max()
                    .unwrap_or(2);
                for (tag, owned) in categories {
                    let cells = encode_header_row(config, tag, owned);
                    write_row(&mut self.out, &cells)?;
                }
            }
        }
        self.header_written = true;
        Ok(())
    }

    /// Flushes and releases the output stream. A writer that saw no cases
    /// still emits its header, if it has one.
    pub fn close(mut self) -> Result<()> {
        if self.columns.is_some() {
            self.write_header()?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> WriteCases for MatrixCsvWriter<W> {
    fn write(&mut self, case: &TestCase) -> Result<()> {
        if case.name.is_empty() {
            return Err(Error::invalid_case("case name must not be empty"));
        }
        if self.columns.is_none() {
            self.columns = Some(self.derive_columns([case])?);
            self.multiheader = matches!(self.columns, Some(GlobalColumns::ByCategory(_)));
        }
        self.write_header()?;

        let start = pad_row(vec![START_MARKER.to_string(), case.name.clone()], self.width);
        write_row(&mut self.out, &start)?;

        match self.columns.as_ref().expect("columns resolved above") {
            GlobalColumns::Flat(global) => {
                if !case.steps.is_empty() {
                    let present = case.steps.columns();
                    let case_header: Vec<String> = global
                        .iter()
                        .map(|column| {
                            if present.contains(column) {
                                column.clone()
                            } else {
                                String::new()
                            }
                        })
                        .collect();
                    write_row(&mut self.out, &case_header)?;
                    for row in &case.steps {
                        let cells: Vec<String> = global
                            .iter()
                            .map(|column| row.get(column).cloned().unwrap_or_default())
                            .collect();
                        write_row(&mut self.out, &cells)?;
                    }
                }
            }
            GlobalColumns::ByCategory(categories) => {
                let config = self
                    .config
                    .as_ref()
                    .ok_or_else(|| Error::config("multiheader writing requires a config"))?;
                for row in &case.steps {
                    let cells = encode_data_row(config, categories, row)?;
                    write_row(&mut self.out, &pad_row(cells, self.width))?;
                }
            }
        }

        let end = pad_row(vec![END_MARKER.to_string()], self.width);
        write_row(&mut self.out, &end)?;
        Ok(())
    }

    fn write_many<'a, I>(&mut self, cases: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TestCase>,
    {
        let cases: Vec<&TestCase> = cases.into_iter().collect();
        if self.columns.is_none() {
            self.columns = Some(self.derive_columns(cases.iter().copied())?);
        }
        for case in cases {
            self.write(case)?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for MatrixCsvWriter<W> {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    const VALID: &str = "\nA,B,C,D,E\nTEST_CASE_START,name1\nA,B,,D,\n1,2,,3,\n4,5,,6,\nTEST_CASE_END\nTEST_CASE_START,name2\n,B,C,,E\n,1,2,,3\n,4,5,,6\nTEST_CASE_END\n";

    fn valid_cases() -> Vec<TestCase> {
        vec![
            TestCase::new("name1").with_steps(FlexTable::from(vec![
                row! {"A" => "1", "B" => "2", "D" => "3"},
                row! {"A" => "4", "B" => "5", "D" => "6"},
            ])),
            TestCase::new("name2").with_steps(FlexTable::from(vec![
                row! {"B" => "1", "C" => "2", "E" => "3"},
                row! {"B" => "4", "C" => "5", "E" => "6"},
            ])),
        ]
    }

    #[test]
    fn test_reading() {
        let mut reader = MatrixCsvReader::from_str(VALID).unwrap();
        let cases = reader.read_all().unwrap();
        assert_eq!(cases.len(), 2);
        for (expected, actual) in valid_cases().iter().zip(&cases) {
            assert_eq!(expected.name, actual.name);
            assert_eq!(expected.steps, actual.steps);
        }
    }

    #[test]
    fn test_global_columns_then_reading() {
        let mut reader = MatrixCsvReader::from_str(VALID).unwrap();
        assert_eq!(
            reader.global_columns().unwrap(),
            GlobalColumns::from(vec!["A", "B", "C", "D", "E"])
        );
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_writer_emits_padded_template() {
        let mut buffer = Vec::new();
        let mut writer =
            MatrixCsvWriter::new(&mut buffer, GlobalColumns::from(vec!["A", "B", "C", "D", "E"]));
        writer.write_many(&valid_cases()).unwrap();
        writer.close().unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "A,B,C,D,E\r\nTEST_CASE_START,name1,,,\r\nA,B,,D,\r\n1,2,,3,\r\n4,5,,6,\r\nTEST_CASE_END,,,,\r\nTEST_CASE_START,name2,,,\r\n,B,C,,E\r\n,1,2,,3\r\n,4,5,,6\r\nTEST_CASE_END,,,,\r\n"
        );
    }

    #[test]
    fn test_writer_derives_columns_from_batch() {
        let mut buffer = Vec::new();
        let mut writer = MatrixCsvWriter::new(&mut buffer, None);
        writer.write_many(&valid_cases()).unwrap();
        writer.close().unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("A,B,D,C,E\r\n"));

        let mut reader = MatrixCsvReader::from_str(&text).unwrap();
        assert_eq!(
            reader.global_columns().unwrap(),
            GlobalColumns::from(vec!["A", "B", "D", "C", "E"])
        );
    }

    #[test]
    fn test_header_only_output_for_zero_cases() {
        let mut buffer = Vec::new();
        let writer = MatrixCsvWriter::new(&mut buffer, GlobalColumns::from(vec!["A", "B"]));
        writer.close().unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "A,B\r\n");
    }

    #[test]
    fn test_no_header_is_fatal() {
        let text = "TEST_CASE_START,name1\nA,B\n1,2\nTEST_CASE_END\n";
        let mut reader = MatrixCsvReader::from_str(text).unwrap();
        assert!(!reader.check_validity());
        let err = reader.read_all().unwrap_err();
        assert!(matches!(err, Error::Schema { line: 1, .. }));
    }

    #[test]
    fn test_start_marker_needs_a_name() {
        for text in [
            "A,B\nTEST_CASE_START\n1,2\nTEST_CASE_END\n",
            "A,B\nTEST_CASE_START,\n1,2\nTEST_CASE_END\n",
        ] {
            let err = MatrixCsvReader::from_str(text)
                .unwrap()
                .read_all()
                .unwrap_err();
            assert!(matches!(err, Error::Schema { line: 2, .. }), "{text}");
        }
    }

    #[test]
    fn test_case_header_width_check() {
        let fatal = "A,B,C,D,E\nTEST_CASE_START,name1\nA,B,,D,,EXTRA\n1,2,,3,\nTEST_CASE_END\n";
        let err = MatrixCsvReader::from_str(fatal)
            .unwrap()
            .read_all()
            .unwrap_err();
        assert!(matches!(err, Error::Schema { line: 3, .. }));

        let padded =
            "A,B,C,D,E\nTEST_CASE_START,name1\nA,B,,D,,,,,\n1,2,,3,\nTEST_CASE_END\n";
        let cases = MatrixCsvReader::from_str(padded)
            .unwrap()
            .read_all()
            .unwrap();
        assert_eq!(cases[0].steps, valid_cases()[0].steps.slice(0..1));
    }
}
