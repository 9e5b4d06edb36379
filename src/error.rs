//! Error types for test-case file parsing and writing.
//!
//! Parsing errors come in two families, both unrecoverable at the point of
//! detection:
//!
//! - **Structural**: malformed block nesting — a start marker inside an open
//!   block, an end marker with no block open, a block never closed.
//! - **Schema**: a dialect's structural rules violated inside a well-nested
//!   block — missing required metadata, a missing global header, declared
//!   header/value mismatches, undeclared or misleading multiheader
//!   categories.
//!
//! Every parsing error carries the 1-based line number of the offending row
//! and a human-readable reason. There is no partial-result recovery and no
//! silent block skipping: the first error aborts the read.
//!
//! ## Examples
//!
//! ```rust
//! use tabcase::{CaseCsvReader, Error, ReadCases};
//!
//! let text = "TEST_CASE_END\n";
//! let mut reader = CaseCsvReader::from_str(text).unwrap();
//! match reader.read_all() {
//!     Err(Error::Structural { line, .. }) => assert_eq!(line, 1),
//!     other => panic!("expected structural error, got {:?}", other),
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

/// All errors produced by readers and writers in this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing.
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed block nesting: double start, double end, or an
    /// unterminated block.
    #[error("structural error at line {line}: {msg}")]
    Structural { line: usize, msg: String },

    /// A dialect's structural rules violated inside a well-nested block.
    #[error("schema error at line {line}: {msg}")]
    Schema { line: usize, msg: String },

    /// A test case handed to a writer cannot be rendered in the target
    /// dialect (empty name, undeclared category, ...).
    #[error("invalid test case: {0}")]
    InvalidCase(String),

    /// A reader or writer was constructed without required configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a structural (block nesting) error at the given 1-based line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::Error;
    ///
    /// let err = Error::structural(3, "double start");
    /// assert!(err.to_string().contains("line 3"));
    /// ```
    pub fn structural(line: usize, msg: impl fmt::Display) -> Self {
        Error::Structural {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates a schema error at the given 1-based line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::Error;
    ///
    /// let err = Error::schema(7, "case name is missing");
    /// assert!(err.to_string().contains("line 7"));
    /// ```
    pub fn schema(line: usize, msg: impl fmt::Display) -> Self {
        Error::Schema {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates a writer-side error for a case that cannot be rendered.
    pub fn invalid_case(msg: impl fmt::Display) -> Self {
        Error::InvalidCase(msg.to_string())
    }

    /// Creates a configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Creates an I/O error from a display message.
    pub fn io(msg: impl fmt::Display) -> Self {
        Error::Io(msg.to_string())
    }

    /// The 1-based line number the error is anchored to, if it has one.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Structural { line, .. } | Error::Schema { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_accessor() {
        assert_eq!(Error::structural(4, "x").line(), Some(4));
        assert_eq!(Error::schema(9, "x").line(), Some(9));
        assert_eq!(Error::io("x").line(), None);
        assert_eq!(Error::invalid_case("x").line(), None);
    }

    #[test]
    fn test_display_includes_reason() {
        let err = Error::schema(2, "no header");
        let text = err.to_string();
        assert!(text.contains("no header"));
        assert!(text.contains("line 2"));
    }
}
