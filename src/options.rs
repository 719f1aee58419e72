//! Configuration options for Sled serialization.
//!
//! This module provides [`SerializeOptions`] and the small enums that make up
//! its fields. Options are plain data; they are checked once when a
//! [`Serializer`](crate::Serializer) is built from them.
//!
//! ## Examples
//!
//! ```rust
//! use serde_sled::{sled, Serializer, SerializeOptions, QuoteMark, HexSeparator};
//!
//! let options = SerializeOptions::canonical()
//!     .with_indent("\t")
//!     .with_quote_mark(QuoteMark::Single)
//!     .with_hex_grouping(HexSeparator::Space, -4);
//! let serializer = Serializer::new(options).unwrap();
//!
//! let value = sled!({ "greeting": "hello world" });
//! let text = serializer.to_sled(&value).unwrap();
//! assert_eq!(text, "greeting = 'hello world'\n");
//! ```

use crate::spec::{DEFAULT_HEX_BYTES_PER_SEPARATOR, DEFAULT_HEX_LINE_LENGTH, DEFAULT_INDENT};

/// Overall output shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Layout {
    /// One pair or element per line, indented.
    #[default]
    Canonical,
    /// A single line with `;` between pairs and elements.
    Minified,
}

/// Line separator written between lines of canonical output.
///
/// # Examples
///
/// ```rust
/// use serde_sled::LineSeparator;
///
/// assert_eq!(LineSeparator::CrLf.as_str(), "\r\n");
/// assert_eq!(LineSeparator::Lf.escaped(), "\\n");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineSeparator {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl LineSeparator {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::Cr => "\r",
            LineSeparator::CrLf => "\r\n",
        }
    }

    /// The separator as it is written inside a quote.
    #[must_use]
    pub const fn escaped(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "\\n",
            LineSeparator::Cr => "\\r",
            LineSeparator::CrLf => "\\r\\n",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QuoteMark {
    #[default]
    Double,
    Single,
}

impl QuoteMark {
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            QuoteMark::Double => '"',
            QuoteMark::Single => '\'',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DecimalMark {
    #[default]
    Period,
    Comma,
}

impl DecimalMark {
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            DecimalMark::Period => '.',
            DecimalMark::Comma => ',',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExponentPrefix {
    #[default]
    Lower,
    Upper,
}

impl ExponentPrefix {
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            ExponentPrefix::Lower => 'e',
            ExponentPrefix::Upper => 'E',
        }
    }
}

/// Separator written between groups of hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HexSeparator {
    None,
    Space,
    Tab,
    #[default]
    Underscore,
}

impl HexSeparator {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HexSeparator::None => "",
            HexSeparator::Space => " ",
            HexSeparator::Tab => "\t",
            HexSeparator::Underscore => "_",
        }
    }
}

/// Configuration options for Sled serialization.
///
/// Build one from a preset and adjust it with the `with_*` methods.
/// [`SerializeOptions::canonical`] is the default.
///
/// Grouping of hex digits is controlled by `hex_bytes_per_separator`: a
/// positive count groups from the left, a negative count groups from the
/// right, and zero disables grouping. A `hex_line_length` of zero disables
/// folding of long hex content across lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializeOptions {
    pub layout: Layout,
    pub indent: String,
    pub use_top_level_braces: bool,
    pub line_separator: LineSeparator,
    pub always_quote: bool,
    pub break_on_line_separator: bool,
    pub ascii_only: bool,
    pub quote_mark: QuoteMark,
    pub hex_upper_case: bool,
    pub hex_separator: HexSeparator,
    pub hex_bytes_per_separator: i32,
    pub hex_line_length: usize,
    pub decimal_mark: DecimalMark,
    pub exponent_prefix: ExponentPrefix,
    pub use_thousands_separator: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            layout: Layout::Canonical,
            indent: DEFAULT_INDENT.to_string(),
            use_top_level_braces: false,
            line_separator: LineSeparator::default(),
            always_quote: false,
            break_on_line_separator: true,
            ascii_only: false,
            quote_mark: QuoteMark::default(),
            hex_upper_case: false,
            hex_separator: HexSeparator::default(),
            hex_bytes_per_separator: DEFAULT_HEX_BYTES_PER_SEPARATOR,
            hex_line_length: DEFAULT_HEX_LINE_LENGTH,
            decimal_mark: DecimalMark::default(),
            exponent_prefix: ExponentPrefix::default(),
            use_thousands_separator: true,
        }
    }
}

impl SerializeOptions {
    /// Creates default options, the same as [`SerializeOptions::canonical`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-line, indented output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_sled::{Layout, SerializeOptions};
    ///
    /// let options = SerializeOptions::canonical();
    /// assert_eq!(options.layout, Layout::Canonical);
    /// assert_eq!(options.indent, "  ");
    /// assert!(options.use_thousands_separator);
    /// ```
    #[must_use]
    pub fn canonical() -> Self {
        Self::default()
    }

    /// Single-line output with no grouping, folding or line breaking.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_sled::{Layout, SerializeOptions};
    ///
    /// let options = SerializeOptions::minified();
    /// assert_eq!(options.layout, Layout::Minified);
    /// assert_eq!(options.hex_bytes_per_separator, 0);
    /// assert!(!options.break_on_line_separator);
    /// ```
    #[must_use]
    pub fn minified() -> Self {
        SerializeOptions {
            layout: Layout::Minified,
            break_on_line_separator: false,
            hex_separator: HexSeparator::None,
            hex_bytes_per_separator: 0,
            hex_line_length: 0,
            use_thousands_separator: false,
            ..Default::default()
        }
    }

    /// Sets the indent added per nesting level. Only spaces and tabs are valid.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Wraps the top-level pairs in `{` and `}`.
    #[must_use]
    pub fn with_top_level_braces(mut self, use_top_level_braces: bool) -> Self {
        self.use_top_level_braces = use_top_level_braces;
        self
    }

    #[must_use]
    pub fn with_line_separator(mut self, line_separator: LineSeparator) -> Self {
        self.line_separator = line_separator;
        self
    }

    /// Writes every string as a quote, never as an identity.
    #[must_use]
    pub fn with_always_quote(mut self, always_quote: bool) -> Self {
        self.always_quote = always_quote;
        self
    }

    /// Writes strings that contain the line separator as an `@concat` with
    /// one segment per line.
    #[must_use]
    pub fn with_break_on_line_separator(mut self, break_on_line_separator: bool) -> Self {
        self.break_on_line_separator = break_on_line_separator;
        self
    }

    /// Escapes every non-ASCII character so the output is pure ASCII.
    #[must_use]
    pub fn with_ascii_only(mut self, ascii_only: bool) -> Self {
        self.ascii_only = ascii_only;
        self
    }

    #[must_use]
    pub fn with_quote_mark(mut self, quote_mark: QuoteMark) -> Self {
        self.quote_mark = quote_mark;
        self
    }

    #[must_use]
    pub fn with_hex_upper_case(mut self, hex_upper_case: bool) -> Self {
        self.hex_upper_case = hex_upper_case;
        self
    }

    /// Sets the hex group separator and the number of bytes per group.
    /// Only the canonical layout groups hex digits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_sled::{HexSeparator, SerializeOptions};
    ///
    /// // Groups of four bytes, counted from the right
    /// let options = SerializeOptions::new().with_hex_grouping(HexSeparator::Space, -4);
    /// assert_eq!(options.hex_bytes_per_separator, -4);
    /// ```
    #[must_use]
    pub fn with_hex_grouping(mut self, separator: HexSeparator, bytes_per_separator: i32) -> Self {
        self.hex_separator = separator;
        self.hex_bytes_per_separator = bytes_per_separator;
        self
    }

    /// Sets the maximum hex line length before folding. Zero disables folding.
    #[must_use]
    pub fn with_hex_line_length(mut self, hex_line_length: usize) -> Self {
        self.hex_line_length = hex_line_length;
        self
    }

    #[must_use]
    pub fn with_decimal_mark(mut self, decimal_mark: DecimalMark) -> Self {
        self.decimal_mark = decimal_mark;
        self
    }

    #[must_use]
    pub fn with_exponent_prefix(mut self, exponent_prefix: ExponentPrefix) -> Self {
        self.exponent_prefix = exponent_prefix;
        self
    }

    /// Groups integer digits in threes with `_`. Canonical layout only.
    #[must_use]
    pub fn with_thousands_separator(mut self, use_thousands_separator: bool) -> Self {
        self.use_thousands_separator = use_thousands_separator;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_in_layout_only_where_expected() {
        let canonical = SerializeOptions::canonical();
        let minified = SerializeOptions::minified();
        assert_eq!(canonical, SerializeOptions::new());
        assert_eq!(minified.indent, canonical.indent);
        assert_eq!(minified.quote_mark, canonical.quote_mark);
        assert_ne!(minified.layout, canonical.layout);
    }

    #[test]
    fn test_builder_chain() {
        let options = SerializeOptions::new()
            .with_indent("\t")
            .with_top_level_braces(true)
            .with_line_separator(LineSeparator::CrLf)
            .with_always_quote(true)
            .with_ascii_only(true)
            .with_hex_upper_case(true)
            .with_hex_line_length(16)
            .with_decimal_mark(DecimalMark::Comma)
            .with_exponent_prefix(ExponentPrefix::Upper)
            .with_thousands_separator(false);
        assert_eq!(options.indent, "\t");
        assert!(options.use_top_level_braces);
        assert_eq!(options.line_separator.as_str(), "\r\n");
        assert!(options.always_quote && options.ascii_only && options.hex_upper_case);
        assert_eq!(options.hex_line_length, 16);
        assert_eq!(options.decimal_mark.as_char(), ',');
        assert_eq!(options.exponent_prefix.as_char(), 'E');
        assert!(!options.use_thousands_separator);
    }

    #[test]
    fn test_separator_strings() {
        assert_eq!(HexSeparator::None.as_str(), "");
        assert_eq!(HexSeparator::Tab.as_str(), "\t");
        assert_eq!(LineSeparator::Cr.escaped(), "\\r");
        assert_eq!(QuoteMark::Single.as_char(), '\'');
    }
}
