//! # tabcase
//!
//! A format engine for round-trip serialization of *test case* records —
//! named sequences of flexible key/value rows — across the CSV dialects of
//! a test-data tooling ecosystem.
//!
//! ## What's inside
//!
//! - **[`FlexTable`]**: the sparse table model — ordered rows of
//!   heterogeneous string-keyed data, with a tracked column union,
//!   structural equality, order-insensitive hashing, and query-based
//!   lookup.
//! - **[`Query`]**: comparison expressions (`=`, `!=`, `>`, `>=`, `<`,
//!   `<=`) with numeric-first, string-fallback coercion.
//! - **[`CaseCsvReader`]/[`CaseCsvWriter`]**: the legacy one-case-per-block
//!   dialect with three fixed metadata lines per case.
//! - **[`MatrixCsvReader`]/[`MatrixCsvWriter`]**: the multi-case dialect
//!   with one shared global header, including its category-keyed
//!   *multiheader* extension.
//! - **[`MultiheaderReader`]/[`MultiheaderWriter`]**: the standalone
//!   row-level multiheader codec the matrix dialect is built on.
//! - **[`new_id`]/[`is_valid_id`]/[`id_from_steps`]**: identifier
//!   generation, structural validation, and deterministic content-derived
//!   identity.
//!
//! ## Quick start
//!
//! ```rust
//! use tabcase::{row, CaseCsvReader, CaseCsvWriter, FlexTable, ReadCases, TestCase, WriteCases};
//!
//! let case = TestCase::new("book check")
//!     .with_id("2e9b7b8c-2d9f-4f65-858a-1bb339885e23")
//!     .with_steps(FlexTable::from(vec![
//!         row! {"Action" => "Quote", "Price" => "100"},
//!         row! {"Action" => "Trade", "Price" => "101"},
//!     ]));
//!
//! // Write to any `io::Write` sink...
//! let mut buffer = Vec::new();
//! let mut writer = CaseCsvWriter::new(&mut buffer);
//! writer.write(&case).unwrap();
//! writer.close().unwrap();
//!
//! // ...and read it back, structurally unchanged.
//! let text = String::from_utf8(buffer).unwrap();
//! let back = CaseCsvReader::from_str(&text).unwrap().read_one().unwrap().unwrap();
//! assert_eq!(back.steps, case.steps);
//! assert_eq!(back.id, case.id);
//! ```
//!
//! ## Reading lazily
//!
//! Readers are forward-only, single-pass block iterators:
//! [`ReadCases::read_one`] and `Iterator` consumption draw from the same
//! cursor, and [`ReadCases::check_validity`] replays the input without
//! disturbing it.
//!
//! ```rust
//! use tabcase::{MatrixCsvReader, ReadCases};
//!
//! let text = "A,B\nTEST_CASE_START,name\nA,B\n1,2\nTEST_CASE_END\n";
//! let mut reader = MatrixCsvReader::from_str(text).unwrap();
//! assert!(reader.check_validity());
//! let cases = reader.read_all().unwrap(); // the check consumed nothing
//! assert_eq!(cases.len(), 1);
//! ```
//!
//! ## Scope
//!
//! Fields are literal comma-separated text: no quoting, no escaping.
//! Inputs are buffered whole; the design targets forward-only streaming of
//! ordinary-sized files, not indexed access to multi-gigabyte ones. See
//! the [`format`] module for the byte-level format reference.

mod blocks;
pub mod case;
pub mod case_csv;
pub mod dialect;
pub mod error;
pub mod format;
pub mod ident;
pub mod macros;
pub mod matrix_csv;
pub mod multiheader;
pub mod plain;
pub mod query;
pub mod table;

pub use case::{global_columns, TestCase};
pub use case_csv::{CaseCsvReader, CaseCsvWriter, LegacyTagRule, LEGACY_TAG_COLUMN};
pub use dialect::{ReadCases, WriteCases, END_MARKER, START_MARKER};
pub use error::{Error, Result};
pub use ident::{id_from_steps, is_valid_id, new_id};
pub use matrix_csv::{GlobalColumns, MatrixCsvReader, MatrixCsvWriter};
pub use multiheader::{
    default_multiheader_config, global_columns_by_category, set_default_multiheader_config,
    CategoryColumns, MultiheaderConfig, MultiheaderReader, MultiheaderWriter,
};
pub use plain::PlainStepsReader;
pub use query::{Query, RowQuery};
pub use table::{FlexTable, Row};
