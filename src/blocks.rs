//! Row cursor and record-boundary block extraction.
//!
//! Every dialect reader is built on the same two pieces:
//!
//! - [`RowCursor`]: comma-splits an input stream into rows, each tagged
//!   with its 1-based line number, and exposes them through an index
//!   cursor. Cloning a cursor clones its position, which is what makes the
//!   dialects' non-consuming validity checks possible.
//! - [`next_block`]: the OUTSIDE/INSIDE state machine. Rows between a
//!   start-marker row and its matching end-marker row form one block; the
//!   machine starts and must finish OUTSIDE.
//!
//! Fatal conditions, each tagged with the offending line:
//!
//! - a start marker while a block is open ("double start");
//! - an end marker with no block open ("double end", including an end
//!   before any start);
//! - end of input while a block is open ("block not closed").
//!
//! A row whose leading cell is empty or blank is never a marker; it passes
//! through as ordinary body content. Blank rows outside any block are
//! skipped; non-blank non-marker rows outside a block are ignored (dialect
//! readers consume their header sections before running the machine).

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// A parsed input row: 1-based line number plus comma-split cells. A blank
/// line yields an empty cell list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InputRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl InputRow {
    /// A row is blank when it has no cells or only empty ones.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }

    /// The leading cell, or the empty string for a blank row.
    pub fn leading(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or("")
    }
}

/// An index cursor over the fully buffered rows of one input.
///
/// Buffering the split rows up front gives a replayable sequence: cloning
/// the cursor replays from the current position without disturbing the
/// original, and all I/O errors surface at construction.
#[derive(Debug, Clone)]
pub(crate) struct RowCursor {
    rows: Vec<InputRow>,
    pos: usize,
}

impl RowCursor {
    /// Splits a string into rows. Lines are terminated by `\n` with an
    /// optional preceding `\r`; cells are literal comma-separated text
    /// (no quoting).
    pub fn from_str(text: &str) -> Self {
        let rows = text
            .lines()
            .enumerate()
            .map(|(index, raw)| {
                let line = raw.strip_suffix('\r').unwrap_or(raw);
                InputRow {
                    line: index + 1,
                    cells: if line.is_empty() {
                        Vec::new()
                    } else {
                        line.split(',').map(str::to_string).collect()
                    },
                }
            })
            .collect();
        RowCursor { rows, pos: 0 }
    }

    /// Reads a stream to the end and splits it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(RowCursor::from_str(&text))
    }

    /// Opens and splits a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(RowCursor::from_str(&fs::read_to_string(path)?))
    }

    /// The next row, advancing the cursor.
    pub fn next(&mut self) -> Option<&InputRow> {
        let row = self.rows.get(self.pos)?;
        self.pos += 1;
        Some(row)
    }

    /// The next row without advancing.
    pub fn peek(&self) -> Option<&InputRow> {
        self.rows.get(self.pos)
    }

    /// Advances past the current row.
    pub fn advance(&mut self) {
        if self.pos < self.rows.len() {
            self.pos += 1;
        }
    }
}

/// One extracted block: the start-marker row and the body rows between the
/// markers.
#[derive(Debug, Clone)]
pub(crate) struct Block {
    /// Line number of the start-marker row.
    pub start_line: usize,
    /// Cells of the start-marker row (marker itself included).
    pub marker: Vec<String>,
    /// Body rows in order, blank rows included.
    pub body: Vec<InputRow>,
}

/// Extracts the next block from the cursor, or `None` at end of input.
pub(crate) fn next_block(
    cursor: &mut RowCursor,
    start_marker: &str,
    end_marker: &str,
) -> Result<Option<Block>> {
    let mut open: Option<Block> = None;
    while let Some(row) = cursor.next() {
        match open.as_mut() {
            None => {
                if row.leading() == start_marker {
                    open = Some(Block {
                        start_line: row.line,
                        marker: row.cells.clone(),
                        body: Vec::new(),
                    });
                } else if row.leading() == end_marker {
                    return Err(Error::structural(
                        row.line,
                        "end marker without an open test case (double end)",
                    ));
                }
                // Anything else outside a block is not ours to interpret.
            }
            Some(block) => {
                if row.leading() == start_marker {
                    return Err(Error::structural(
                        row.line,
                        "start marker inside an open test case (double start)",
                    ));
                } else if row.leading() == end_marker {
                    return Ok(open.take());
                } else {
                    block.body.push(row.clone());
                }
            }
        }
    }
    match open {
        Some(block) => Err(Error::structural(
            block.start_line,
            "test case opened but never closed",
        )),
        None => Ok(None),
    }
}
