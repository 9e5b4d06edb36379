//! Wire format reference.
//!
//! All formats are textual, comma-separated, and unquoted: a comma is
//! always a cell separator and no escaping exists. Lines end with `\n`,
//! optionally preceded by `\r`; writers always emit `\r\n` for
//! compatibility with the formats' original consumers.
//!
//! # Blocks
//!
//! Every dialect delimits cases the same way. A row whose first cell is
//! `TEST_CASE_START` opens a block; a row whose first cell is
//! `TEST_CASE_END` closes it. Blocks never nest and never reopen:
//!
//! - a start marker while a block is open is fatal ("double start");
//! - an end marker while no block is open is fatal ("double end");
//! - end of input inside a block is fatal ("block not closed").
//!
//! A row with an empty leading cell is body content, never a marker.
//! Blank rows between blocks are ignored.
//!
//! # Legacy dialect (one case per block)
//!
//! ```text
//! TEST_CASE_START
//! <name>                     required, non-empty
//! <id or legacy tag>         a dash-grouped UUID, or free-form legacy data
//! <description>              optional
//! <col>,<col>,...            optional table: header row
//! <val>,<val>,...            ...then one row per step
//! TEST_CASE_END
//! ```
//!
//! A non-UUID second line is legacy data: it merges into every step row
//! under the reserved `Symbol` column and the case id derives from the
//! step content instead. Value rows strictly match the header: trailing
//! empty cells are discarded, a trailing non-empty cell is fatal, and
//! missing trailing cells read as empty strings. An empty header cell
//! names a real anonymous column.
//!
//! # Matrix dialect (shared global header)
//!
//! ```text
//! A,B,C,D,E                  global header, once per file
//! TEST_CASE_START,name1
//! A,B,,D,                    per-case header, aligned to the global one
//! 1,2,,3,
//! 4,5,,6,
//! TEST_CASE_END
//! ```
//!
//! An empty per-case header cell marks a column absent from this case; a
//! non-empty cell beyond the global width is fatal. Data rows shorter than
//! the per-case header pad as empty. Data rows with zero header lines in
//! the file are fatal ("no header").
//!
//! # Multiheader variant
//!
//! The header section declares one line per category; data rows carry a
//! discriminator marker instead of relying on a per-case header:
//!
//! ```text
//! Category,#category:a,A,B,D,HeaderDefinition,HeaderDefinitionCategories:a
//! Category,#category:b,B,C,E,HeaderDefinition,HeaderDefinitionCategories:b
//! TEST_CASE_START,name1
//! a,#category:a,1,2,3
//! b,#category:b,4,5,6
//! TEST_CASE_END
//! ```
//!
//! Header line layout, with `#category` the configurable marker prefix and
//! `Categories` the configurable postfix:
//!
//! ```text
//! <discriminator column>,<prefix>:<tag>,<owned columns...>,HeaderDefinition,HeaderDefinition<postfix>:<tag>
//! ```
//!
//! Data row layout:
//!
//! ```text
//! <discriminator value>,<prefix>:<tag>,<owned values...>
//! ```
//!
//! Rows must name a declared category, must not leave the marker empty,
//! and must agree with the category the configured categorizer recomputes
//! from the row's own fields; each violation is fatal.
