//! Error types for Sled parsing and serialization.
//!
//! Every failure is terminal: the parser and serializer stop at the first
//! problem and return it with full location context.
//!
//! ## Error Categories
//!
//! - **Syntax**: the input does not follow the grammar
//! - **Map key type**: a key disagrees with the kind established by the first
//!   key of its map, or is neither a string nor an integer
//! - **Duplicate map key**: one or more keys repeat within a map; every
//!   occurrence is listed in a single error
//! - **Number range**: an integer outside the signed 64-bit range, or a float
//!   literal that evaluates to infinity
//!
//! ## Error Messages
//!
//! Parse errors render the offending line with a pointer under the span:
//!
//! ```text
//! Invalid entity. No entity starts with '('.
//! Line 2, column 5:
//! b = (oops)
//!     ^
//! ```
//!
//! ```rust
//! use serde_sled::{parse, ErrorCategory};
//!
//! let err = parse("a = 1\na = 2\n").unwrap_err();
//! assert_eq!(err.category(), Some(ErrorCategory::DuplicateMapKey));
//! assert_eq!(err.line(), Some(1));
//! ```

use crate::snapshot::ParseSnapshot;
use crate::spec::{is_horizontal_space, ERROR_CONTEXT_ELLIPSIS, MAX_ERROR_CONTEXT_LEN};
use crate::value::MapKey;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

const ERROR_POINTER_CHAR: char = '^';

/// The kind of format violation behind an [`Error::Sled`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    MapKeyTypeMismatch,
    DuplicateMapKey,
    NumberRangeOverflow,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::MapKeyTypeMismatch => "map key type",
            ErrorCategory::DuplicateMapKey => "duplicate map key",
            ErrorCategory::NumberRangeOverflow => "number range",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents all possible errors that can occur while parsing or serializing Sled.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A violation of the Sled format.
    ///
    /// `message` is the fully rendered text; `reason` is its first sentence.
    /// `line` is 1-based and is `None` for serializer errors.
    #[error("{message}")]
    Sled {
        category: ErrorCategory,
        reason: String,
        line: Option<usize>,
        message: String,
    },

    /// Serializer options that cannot be satisfied.
    #[error("Invalid serializer configuration: {0}")]
    InvalidConfig(String),

    /// A value that cannot be the root of a document.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an error for an invalid span within one line of the input.
    ///
    /// `line_text` is the full line without its separator. `start` and `end`
    /// are character offsets within that line; `end` is exclusive and may be
    /// one past the end of the line to point at the line's end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_sled::{Error, ErrorCategory};
    ///
    /// let err = Error::parse(ErrorCategory::Syntax, "Bad value.", "  a = ?", 3, 6, 7);
    /// assert_eq!(err.to_string(), "Bad value.\nLine 3, column 7:\na = ?\n    ^");
    /// ```
    pub fn parse(
        category: ErrorCategory,
        reason: impl Into<String>,
        line_text: &str,
        line_num: usize,
        start: usize,
        end: usize,
    ) -> Self {
        let reason = reason.into();
        let end = end.max(start + 1);
        let chars: Vec<char> = line_text.chars().collect();

        let mut shown: Vec<char> = chars.clone();
        let mut trailing = "";
        if chars.len() > end + MAX_ERROR_CONTEXT_LEN {
            shown.truncate(end + MAX_ERROR_CONTEXT_LEN);
            trailing = ERROR_CONTEXT_ELLIPSIS;
        }

        let strip = shown
            .iter()
            .take(start)
            .take_while(|&&c| is_horizontal_space(c))
            .count();
        let mut before = start - strip;
        let mut rendered: String = shown[strip..].iter().collect();
        if before > MAX_ERROR_CONTEXT_LEN {
            rendered = format!(
                "{}{}",
                ERROR_CONTEXT_ELLIPSIS,
                shown[strip + before - MAX_ERROR_CONTEXT_LEN..]
                    .iter()
                    .collect::<String>()
            );
            before = MAX_ERROR_CONTEXT_LEN + ERROR_CONTEXT_ELLIPSIS.len();
        }
        rendered.push_str(trailing);

        let pointer: String = std::iter::repeat(' ')
            .take(before)
            .chain(std::iter::repeat(ERROR_POINTER_CHAR).take(end - start))
            .collect();

        let message = format!(
            "{}\nLine {}, column {}:\n{}\n{}",
            reason,
            line_num,
            start + 1,
            rendered,
            pointer
        );

        Error::Sled {
            category,
            reason,
            line: Some(line_num),
            message,
        }
    }

    /// Creates a single error listing every repeated key of one map.
    ///
    /// `entries` holds each key in source order together with the snapshot of
    /// where it was parsed. The map itself starts at `map_line_num`,
    /// `map_column` (both 1-based).
    pub fn duplicate_map_key(
        entries: &[(MapKey, ParseSnapshot)],
        map_line_num: usize,
        map_column: usize,
    ) -> Self {
        let mut groups: IndexMap<&MapKey, Vec<&ParseSnapshot>> = IndexMap::new();
        for (key, snapshot) in entries {
            groups.entry(key).or_default().push(snapshot);
        }

        let listing: Vec<String> = groups
            .iter()
            .filter(|(_, snapshots)| snapshots.len() > 1)
            .map(|(key, snapshots)| {
                let locations: Vec<String> = snapshots
                    .iter()
                    .map(|s| format!("line {} column {}", s.line_num, s.column()))
                    .collect();
                format!("{}: {}", key, locations.join(", "))
            })
            .collect();

        let reason = format!(
            "Sled map starting on line {} at column {} contains duplicate keys.",
            map_line_num, map_column
        );
        let message = format!("{}\n{}", reason, listing.join("\n"));

        Error::Sled {
            category: ErrorCategory::DuplicateMapKey,
            reason,
            line: Some(map_line_num),
            message,
        }
    }

    /// Creates a format error raised while serializing. It has no source line.
    pub fn serialize(category: ErrorCategory, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Error::Sled {
            category,
            message: reason.clone(),
            reason,
            line: None,
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Creates an unsupported type error for values that cannot be serialized to Sled.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// The format violation category, or `None` for errors outside the format.
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::Sled { category, .. } => Some(*category),
            _ => None,
        }
    }

    /// The one-sentence reason for a format violation.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::Sled { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// The 1-based line on which the invalid input starts.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Sled { line, .. } => *line,
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
