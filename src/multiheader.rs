//! The category-keyed multiheader CSV layer.
//!
//! In multiheader data, every row belongs to a *category*, and each
//! category owns its own ordered column list. The header section declares
//! one line per category; each data row carries a discriminator marker
//! selecting which declared list applies to its cells:
//!
//! ```text
//! Category,#category:a,A,B,D,HeaderDefinition,HeaderDefinitionCategories:a
//! Category,#category:b,B,C,E,HeaderDefinition,HeaderDefinitionCategories:b
//! a,#category:a,1,2,3
//! b,#category:b,4,5,6
//! ```
//!
//! [`MultiheaderConfig`] carries the configurable tokens (the marker
//! prefix, the discriminator column name, the header postfix) and the
//! *categorizer*: a function recomputing a row's category tag from its own
//! fields. A data row whose marker disagrees with the recomputed tag is
//! rejected as *misleading*; a marker naming an undeclared category is
//! *undefined*; an empty marker is fatal too.
//!
//! [`MultiheaderReader`] and [`MultiheaderWriter`] handle bare
//! headers-then-rows streams. The matrix dialect
//! ([`MatrixCsvReader`](crate::MatrixCsvReader)) composes the same codec
//! with block markers.
//!
//! A process-wide default config can be installed once with
//! [`set_default_multiheader_config`]; readers and writers capture it at
//! construction time when no explicit config is given.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::blocks::{InputRow, RowCursor};
use crate::case::TestCase;
use crate::dialect::write_row;
use crate::error::{Error, Result};
use crate::table::Row;

/// Structural token introducing the column list terminator in a header
/// declaration line.
pub(crate) const HEADER_DEFINITION_MARKER: &str = "HeaderDefinition";

/// Category tag → ordered owned column list (discriminator column first).
pub type CategoryColumns = IndexMap<String, Vec<String>>;

type Categorizer = Arc<dyn Fn(&Row) -> String + Send + Sync>;

/// Configuration of the multiheader tokens and categorization rule.
///
/// # Examples
///
/// ```rust
/// use tabcase::MultiheaderConfig;
///
/// let config = MultiheaderConfig::new("#category", "Category", "Categories");
/// assert_eq!(config.discriminator_column(), "Category");
///
/// // A custom categorizer deriving the tag from other row fields:
/// let config = MultiheaderConfig::new("#category", "Category", "Categories")
///     .with_categorizer(|row| {
///         row.get("Category").cloned().unwrap_or_else(|| "UNDEFINED".to_string())
///     });
/// ```
#[derive(Clone)]
pub struct MultiheaderConfig {
    marker_prefix: String,
    discriminator_column: String,
    header_postfix: String,
    categorizer: Categorizer,
}

impl MultiheaderConfig {
    /// Creates a config with the given marker prefix, discriminator column
    /// name, and header postfix. The default categorizer reads the
    /// discriminator column from the row itself.
    #[must_use]
    pub fn new(
        marker_prefix: impl Into<String>,
        discriminator_column: impl Into<String>,
        header_postfix: impl Into<String>,
    ) -> Self {
        let discriminator_column = discriminator_column.into();
        let column = discriminator_column.clone();
        MultiheaderConfig {
            marker_prefix: marker_prefix.into(),
            discriminator_column,
            header_postfix: header_postfix.into(),
            categorizer: Arc::new(move |row: &Row| {
                row.get(&column).cloned().unwrap_or_default()
            }),
        }
    }

    /// Replaces the categorizer.
    #[must_use]
    pub fn with_categorizer<F>(mut self, categorizer: F) -> Self
    where
        F: Fn(&Row) -> String + Send + Sync + 'static,
    {
        self.categorizer = Arc::new(categorizer);
        self
    }

    /// The discriminator column name.
    #[must_use]
    pub fn discriminator_column(&self) -> &str {
        &self.discriminator_column
    }

    /// Recomputes a row's category tag from its own fields.
    #[must_use]
    pub fn categorize(&self, row: &Row) -> String {
        (self.categorizer)(row)
    }

    fn marker_for(&self, tag: &str) -> String {
        format!("{}:{}", self.marker_prefix, tag)
    }

    fn header_closing_for(&self, tag: &str) -> String {
        format!("{}{}:{}", HEADER_DEFINITION_MARKER, self.header_postfix, tag)
    }

    fn tag_of_marker(&self, cell: &str) -> Option<String> {
        cell.strip_prefix(&self.marker_prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::to_string)
    }
}

impl fmt::Debug for MultiheaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiheaderConfig")
            .field("marker_prefix", &self.marker_prefix)
            .field("discriminator_column", &self.discriminator_column)
            .field("header_postfix", &self.header_postfix)
            .finish_non_exhaustive()
    }
}

static DEFAULT_CONFIG: RwLock<Option<MultiheaderConfig>> = RwLock::new(None);

/// Installs the process-wide default multiheader config.
///
/// Readers and writers constructed without an explicit config capture the
/// default once, at construction time. Install it before constructing
/// them; it is never consulted again afterwards.
pub fn set_default_multiheader_config(config: MultiheaderConfig) {
    *DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(config);
}

/// The current process-wide default multiheader config, if any.
#[must_use]
pub fn default_multiheader_config() -> Option<MultiheaderConfig> {
    DEFAULT_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Resolves an explicit config against the process default.
pub(crate) fn resolve_config(explicit: Option<MultiheaderConfig>) -> Option<MultiheaderConfig> {
    explicit.or_else(default_multiheader_config)
}

/// Whether a row looks like a category header declaration under the given
/// config.
pub(crate) fn is_header_row(config: &MultiheaderConfig, row: &InputRow) -> bool {
    row.cells.len() >= 2
        && row.cells[0] == config.discriminator_column
        && config.tag_of_marker(&row.cells[1]).is_some()
        && row.cells.iter().any(|c| c == HEADER_DEFINITION_MARKER)
}

/// Decodes a category header declaration into `(tag, owned columns)`.
pub(crate) fn decode_header_row(
    config: &MultiheaderConfig,
    row: &InputRow,
) -> Result<(String, Vec<String>)> {
    if row.cells.first().map(String::as_str) != Some(config.discriminator_column.as_str()) {
        return Err(Error::schema(
            row.line,
            format!(
                "header declaration must start with the '{}' column",
                config.discriminator_column
            ),
        ));
    }
    let tag = row
        .cells
        .get(1)
        .and_then(|cell| config.tag_of_marker(cell))
        .ok_or_else(|| Error::schema(row.line, "header declaration has no category marker"))?;
    let marker_index = row
        .cells
        .iter()
        .position(|c| c == HEADER_DEFINITION_MARKER)
        .ok_or_else(|| {
            Error::schema(
                row.line,
                format!("header declaration has no '{HEADER_DEFINITION_MARKER}' cell"),
            )
        })?;
    let closing = config.header_closing_for(&tag);
    if row.cells.get(marker_index + 1).map(String::as_str) != Some(closing.as_str()) {
        return Err(Error::schema(
            row.line,
            format!("header declaration must close with '{closing}'"),
        ));
    }
    let mut owned = vec![config.discriminator_column.clone()];
    owned.extend(row.cells[2..marker_index].iter().cloned());
    Ok((tag, owned))
}

/// Encodes one category header declaration.
pub(crate) fn encode_header_row(
    config: &MultiheaderConfig,
    tag: &str,
    owned: &[String],
) -> Vec<String> {
    let mut cells = vec![config.discriminator_column.clone(), config.marker_for(tag)];
    cells.extend(
        owned
            .iter()
            .filter(|c| **c != config.discriminator_column)
            .cloned(),
    );
    cells.push(HEADER_DEFINITION_MARKER.to_string());
    cells.push(config.header_closing_for(tag));
    cells
}

/// Decodes one data row against the declared category columns.
///
/// Excess values are discarded; missing values pad as empty strings.
/// Fatal: an empty discriminator marker, an undeclared category, or a
/// marker disagreeing with the recomputed category.
pub(crate) fn decode_data_row(
    config: &MultiheaderConfig,
    headers: &CategoryColumns,
    row: &InputRow,
) -> Result<Row> {
    let marker = row.cells.get(1).map(String::as_str).unwrap_or("");
    if marker.is_empty() {
        return Err(Error::schema(
            row.line,
            "row has an empty category discriminator value",
        ));
    }
    let tag = config
        .tag_of_marker(marker)
        .ok_or_else(|| Error::schema(row.line, format!("malformed category marker '{marker}'")))?;
    let owned = headers
        .get(&tag)
        .ok_or_else(|| Error::schema(row.line, format!("undefined category '{tag}'")))?;

    let mut result = Row::new();
    result.insert(
        config.discriminator_column.clone(),
        row.cells.first().cloned().unwrap_or_default(),
    );
    for (index, column) in owned.iter().enumerate().skip(1) {
        result.insert(
            column.clone(),
            row.cells.get(index + 1).cloned().unwrap_or_default(),
        );
    }

    let recomputed = config.categorize(&result);
    if recomputed != tag {
        return Err(Error::schema(
            row.line,
            format!("misleading category: marker says '{tag}', row fields say '{recomputed}'"),
        ));
    }
    Ok(result)
}

/// Encodes one data row under its category's declared columns.
pub(crate) fn encode_data_row(
    config: &MultiheaderConfig,
    headers: &CategoryColumns,
    row: &Row,
) -> Result<Vec<String>> {
    let tag = config.categorize(row);
    let owned = headers.get(&tag).ok_or_else(|| {
        Error::invalid_case(format!("row category '{tag}' is not declared in the header"))
    })?;
    let mut cells = vec![
        row.get(&config.discriminator_column).cloned().unwrap_or_default(),
        config.marker_for(&tag),
    ];
    for column in owned.iter().skip(1) {
        cells.push(row.get(column).cloned().unwrap_or_default());
    }
    Ok(cells)
}

/// The per-category union of step columns across a set of cases.
///
/// Each category's list starts with the discriminator column, followed by
/// the other columns in first-seen order. This is the multiheader
/// counterpart of [`global_columns`](crate::case::global_columns).
#[must_use]
pub fn global_columns_by_category<'a>(
    cases: impl IntoIterator<Item = &'a TestCase>,
    config: &MultiheaderConfig,
) -> CategoryColumns {
    let mut result = CategoryColumns::new();
    for case in cases {
        for row in &case.steps {
            let tag = config.categorize(row);
            let owned = result
                .entry(tag)
                .or_insert_with(|| vec![config.discriminator_column.clone()]);
            for column in row.keys() {
                if *column != config.discriminator_column && !owned.iter().any(|c| c == column) {
                    owned.push(column.clone());
                }
            }
        }
    }
    result
}

/// Reads a bare multiheader stream: category declarations first, then data
/// rows. Iterates rows lazily; the parsed headers are available up front.
#[derive(Debug, Clone)]
pub struct MultiheaderReader {
    cursor: RowCursor,
    config: MultiheaderConfig,
    headers: CategoryColumns,
}

impl MultiheaderReader {
    /// Parses the header section of a string input. Pass `None` to use the
    /// process-wide default config.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str, config: Option<MultiheaderConfig>) -> Result<Self> {
        Self::from_cursor(RowCursor::from_str(text), config)
    }

    /// Parses the header section of a stream.
    pub fn from_reader<R: Read>(reader: R, config: Option<MultiheaderConfig>) -> Result<Self> {
        Self::from_cursor(RowCursor::from_reader(reader)?, config)
    }

    /// Opens and parses a file.
    pub fn from_path(path: impl AsRef<Path>, config: Option<MultiheaderConfig>) -> Result<Self> {
        Self::from_cursor(RowCursor::from_path(path)?, config)
    }

    fn from_cursor(mut cursor: RowCursor, config: Option<MultiheaderConfig>) -> Result<Self> {
        let config = resolve_config(config)
            .ok_or_else(|| Error::config("no multiheader config given and no default installed"))?;
        let mut headers = CategoryColumns::new();
        while let Some(row) = cursor.peek() {
            if row.cells.is_empty() {
                cursor.advance();
                continue;
            }
            if !is_header_row(&config, row) {
                break;
            }
            let (tag, owned) = decode_header_row(&config, row)?;
            if headers.insert(tag.clone(), owned).is_some() {
                return Err(Error::schema(row.line, format!("duplicate category '{tag}'")));
            }
            cursor.advance();
        }
        Ok(MultiheaderReader {
            cursor,
            config,
            headers,
        })
    }

    /// The declared category → columns mapping.
    #[must_use]
    pub fn headers(&self) -> &CategoryColumns {
        &self.headers
    }

    /// Reads every remaining data row.
    pub fn read_rows(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for row in self.by_ref() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

impl Iterator for MultiheaderReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.cursor.peek()?.clone();
            self.cursor.advance();
            if row.cells.is_empty() {
                continue;
            }
            return Some(decode_data_row(&self.config, &self.headers, &row));
        }
    }
}

/// Writes a bare multiheader stream.
///
/// The stream is released when the writer is dropped; call
/// [`close`](MultiheaderWriter::close) to observe flush errors instead.
#[derive(Debug)]
pub struct MultiheaderWriter<W: Write> {
    out: W,
    config: MultiheaderConfig,
    headers: CategoryColumns,
}

impl MultiheaderWriter<BufWriter<File>> {
    /// Creates a file-backed writer.
    pub fn from_path(
        path: impl AsRef<Path>,
        headers: CategoryColumns,
        config: Option<MultiheaderConfig>,
    ) -> Result<Self> {
        Self::new(BufWriter::new(File::create(path)?), headers, config)
    }
}

impl<W: Write> MultiheaderWriter<W> {
    /// Creates a writer over any output stream. Pass `None` to use the
    /// process-wide default config.
    pub fn new(
        out: W,
        headers: CategoryColumns,
        config: Option<MultiheaderConfig>,
    ) -> Result<Self> {
        let config = resolve_config(config)
            .ok_or_else(|| Error::config("no multiheader config given and no default installed"))?;
        Ok(MultiheaderWriter {
            out,
            config,
            headers,
        })
    }

    /// Writes the category declaration lines.
    pub fn write_headers(&mut self) -> Result<()> {
        for (tag, owned) in &self.headers {
            let cells = encode_header_row(&self.config, tag, owned);
            write_row(&mut self.out, &cells)?;
        }
        Ok(())
    }

    /// Writes one data row.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let cells = encode_data_row(&self.config, &self.headers, row)?;
        write_row(&mut self.out, &cells)
    }

    /// Writes every row of an iterator.
    pub fn write_rows<'a, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flushes and releases the output stream.
    pub fn close(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for MultiheaderWriter<W> {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}
