//! Sled Format Specification
//!
//! This module documents the Sled format as implemented by this library and
//! holds the grammar constants that both the parser and the serializer consult.
//! No other module classifies characters on its own.
//!
//! # Overview
//!
//! Sled is a human-friendly, text-based serialization format. A document is a
//! string-keyed map whose pairs are written as `key = value`, separated by `;`
//! or line separators:
//!
//! ```text
//! # A comment runs to the end of the line
//! name = "John Doe"
//! age = 50
//! children = [Jane; Jimmy]
//! ```
//!
//! The whole document may optionally be wrapped in a pair of braces; if the
//! opening brace is present, the closing brace is mandatory.
//!
//! # Entities
//!
//! | Type | Syntax | Example |
//! |------|--------|---------|
//! | Nil | `@nil` | `parent = @nil` |
//! | Boolean | `@true` / `@false` | `active = @true` |
//! | Integer | Digits with optional sign and `_` separators | `big = -1_000_000` |
//! | Float | Decimal mark `.` or `,` and/or exponent `e`/`E` | `ratio = 1,5e-3` |
//! | Special floats | `@nan`, `@inf`, `@ninf` | `limit = @inf` |
//! | Bytes | `@hex(...)` | `digest = @hex(dead_beef)` |
//! | Identity | Bare token | `colour = red` |
//! | Quote | `"..."` or `'...'` with escapes | `path = "C:\\temp"` |
//! | Concat | `@concat(...)` of quotes | `text = @concat("a" "b")` |
//! | Map | `{ key = value; ... }` | `point = {x = 1; y = 2}` |
//! | List | `[ value; ... ]` | `tags = [a; b; c]` |
//!
//! ## Maps
//!
//! Every key in one map is either a string (identity, quote or concat) or an
//! integer. The first key fixes the kind for the rest of the map. Keys must be
//! unique once evaluated, so `a = 1` and `"a" = 2` collide.
//!
//! ## Numbers
//!
//! A number has an optional sign, a digit run that may contain `_`, an optional
//! fractional part introduced by `.` or `,`, and an optional exponent. Without a
//! decimal mark or exponent the number is an integer in the signed 64-bit range.
//! Literal syntax that evaluates to an infinite float is rejected; use the
//! keyword literals instead.
//!
//! ## Strings
//!
//! An identity may not start with anything that could begin a number, keyword,
//! quote, comment or structural mark, and may not contain whitespace, quote
//! marks, backslashes, parentheses, `#`, or structural marks.
//!
//! Quotes support these escapes:
//!
//! | Escape | Meaning |
//! |--------|---------|
//! | `\\` | backslash |
//! | `\"` | double quote |
//! | `\'` | single quote |
//! | `\n` | line feed |
//! | `\r` | carriage return |
//! | `\t` | tab |
//! | `\u{1F600}` | any Unicode scalar value, `_` allowed between digits |
//!
//! ## Comments
//!
//! `#` starts a comment that runs to the end of the line. Tabs are allowed in
//! comments; other control characters are not.
//!
//! # Line Separators
//!
//! LF, CR and CRLF are all accepted on input and are normalized to LF before
//! parsing. Output uses one configured form.

/// Comment mark.
pub const COMMENT_MARK: char = '#';
/// Keyword mark.
pub const KEYWORD_MARK: char = '@';
/// Opens a map.
pub const MAP_OPEN_MARK: char = '{';
/// Closes a map.
pub const MAP_CLOSE_MARK: char = '}';
/// Opens a list.
pub const LIST_OPEN_MARK: char = '[';
/// Closes a list.
pub const LIST_CLOSE_MARK: char = ']';
/// Separates pairs and list elements.
pub const DELIMITER_MARK: char = ';';
/// Separates a key from its value.
pub const KEY_VALUE_SEPARATOR: char = '=';
/// Opens keyword content.
pub const KEYWORD_OPEN_MARK: char = '(';
/// Closes keyword content.
pub const KEYWORD_CLOSE_MARK: char = ')';
pub const DOUBLE_QUOTE_MARK: char = '"';
pub const SINGLE_QUOTE_MARK: char = '\'';
pub const ESCAPE_CHARACTER: char = '\\';
/// Starts a Unicode escape after [`ESCAPE_CHARACTER`].
pub const UNICODE_ESCAPE_MARK: char = 'u';
pub const UNICODE_ESCAPE_OPEN_MARK: char = '{';
pub const UNICODE_ESCAPE_CLOSE_MARK: char = '}';
/// Separator allowed inside number, hex and Unicode escape digit runs.
pub const DIGIT_SEPARATOR: char = '_';
pub const PLUS_SIGN: char = '+';
pub const MINUS_SIGN: char = '-';
/// Line feed, the only line separator left after normalization.
pub const LINE_FEED: char = '\n';
pub const CARRIAGE_RETURN: char = '\r';
/// Reserved structural symbols that are not yet used by the grammar.
pub const RESERVED_OPEN_MARK: char = '<';
pub const RESERVED_CLOSE_MARK: char = '>';

pub const HEX_KEYWORD_NAME: &str = "hex";
pub const CONCAT_KEYWORD_NAME: &str = "concat";

pub const HEX_DIGITS_PER_BYTE: usize = 2;

/// Smallest value a Sled integer can hold.
pub const SLED_INTEGER_MIN: i64 = i64::MIN;
/// Largest value a Sled integer can hold.
pub const SLED_INTEGER_MAX: i64 = i64::MAX;

/// Deepest nesting of maps and lists below the document map.
pub const MAX_NESTING_DEPTH: usize = 128;

pub const DEFAULT_INDENT: &str = "  ";
pub const DEFAULT_HEX_LINE_LENGTH: usize = 80;
pub const DEFAULT_HEX_BYTES_PER_SEPARATOR: i32 = 2;

/// Maximum number of characters shown on either side of an error span.
pub const MAX_ERROR_CONTEXT_LEN: usize = 80;
pub const ERROR_CONTEXT_ELLIPSIS: &str = "...";

/// The 33 C0 control characters: U+0000 through U+001F and DEL.
#[inline]
#[must_use]
pub const fn is_c0_control(c: char) -> bool {
    (c as u32) < 0x20 || c as u32 == 0x7F
}

#[inline]
#[must_use]
pub const fn is_horizontal_space(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

#[inline]
#[must_use]
pub const fn is_line_separator(c: char) -> bool {
    matches!(c, LINE_FEED | CARRIAGE_RETURN)
}

/// `;` or a line feed.
#[inline]
#[must_use]
pub const fn is_delimiter(c: char) -> bool {
    c == DELIMITER_MARK || c == LINE_FEED
}

#[inline]
#[must_use]
pub const fn is_container_symbol(c: char) -> bool {
    matches!(
        c,
        DELIMITER_MARK
            | KEY_VALUE_SEPARATOR
            | MAP_OPEN_MARK
            | MAP_CLOSE_MARK
            | LIST_OPEN_MARK
            | LIST_CLOSE_MARK
            | RESERVED_OPEN_MARK
            | RESERVED_CLOSE_MARK
    )
}

/// Characters allowed in a keyword name after `@`.
#[inline]
#[must_use]
pub const fn is_keyword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[inline]
#[must_use]
pub const fn is_sign(c: char) -> bool {
    c == PLUS_SIGN || c == MINUS_SIGN
}

#[inline]
#[must_use]
pub const fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// A digit or the digit separator.
#[inline]
#[must_use]
pub const fn is_optional_digit(c: char) -> bool {
    c.is_ascii_digit() || c == DIGIT_SEPARATOR
}

#[inline]
#[must_use]
pub const fn is_decimal_mark(c: char) -> bool {
    matches!(c, '.' | ',')
}

#[inline]
#[must_use]
pub const fn is_exponent_prefix(c: char) -> bool {
    matches!(c, 'e' | 'E')
}

/// Characters that may begin a number.
#[inline]
#[must_use]
pub const fn is_number_start(c: char) -> bool {
    is_optional_digit(c) || is_sign(c) || is_decimal_mark(c)
}

/// A hexadecimal digit or the digit separator.
#[inline]
#[must_use]
pub const fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit() || c == DIGIT_SEPARATOR
}

/// Characters allowed between the parentheses of `@hex(...)`.
#[inline]
#[must_use]
pub const fn is_hex_content_char(c: char) -> bool {
    is_hex_digit(c) || is_horizontal_space(c) || c == LINE_FEED
}

#[inline]
#[must_use]
pub const fn is_comment_disallowed(c: char) -> bool {
    is_c0_control(c) && c != '\t'
}

#[inline]
#[must_use]
pub const fn is_quote_mark(c: char) -> bool {
    c == DOUBLE_QUOTE_MARK || c == SINGLE_QUOTE_MARK
}

/// Characters that may not appear unescaped inside any quote, regardless of
/// the quote mark in use.
#[inline]
#[must_use]
pub const fn is_quote_restricted(c: char) -> bool {
    (is_c0_control(c) && c != '\t') || c == ESCAPE_CHARACTER
}

#[inline]
#[must_use]
pub const fn is_identity_disallowed(c: char) -> bool {
    is_quote_restricted(c)
        || is_horizontal_space(c)
        || is_quote_mark(c)
        || is_container_symbol(c)
        || c == KEYWORD_OPEN_MARK
        || c == KEYWORD_CLOSE_MARK
        || c == COMMENT_MARK
}

#[inline]
#[must_use]
pub const fn is_identity_disallowed_start(c: char) -> bool {
    is_identity_disallowed(c) || is_number_start(c) || c == KEYWORD_MARK
}

/// Maps the character after `\` in a simple escape to its evaluation.
#[must_use]
pub const fn simple_escape_evaluation(c: char) -> Option<char> {
    match c {
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

/// Maps a character to its simple escape sequence, if it has one.
#[must_use]
pub const fn simple_escape_sequence(c: char) -> Option<&'static str> {
    match c {
        '\\' => Some("\\\\"),
        '"' => Some("\\\""),
        '\'' => Some("\\'"),
        '\n' => Some("\\n"),
        '\r' => Some("\\r"),
        '\t' => Some("\\t"),
        _ => None,
    }
}

/// The named keywords that stand for a fixed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeywordLiteral {
    Nan,
    Inf,
    Ninf,
    True,
    False,
    Nil,
}

impl KeywordLiteral {
    pub const ALL: [KeywordLiteral; 6] = [
        KeywordLiteral::Nan,
        KeywordLiteral::Inf,
        KeywordLiteral::Ninf,
        KeywordLiteral::True,
        KeywordLiteral::False,
        KeywordLiteral::Nil,
    ];

    /// The keyword name without the leading `@`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            KeywordLiteral::Nan => "nan",
            KeywordLiteral::Inf => "inf",
            KeywordLiteral::Ninf => "ninf",
            KeywordLiteral::True => "true",
            KeywordLiteral::False => "false",
            KeywordLiteral::Nil => "nil",
        }
    }

    /// The keyword as written in a document, e.g. `@nil`.
    #[must_use]
    pub const fn lexeme(self) -> &'static str {
        match self {
            KeywordLiteral::Nan => "@nan",
            KeywordLiteral::Inf => "@inf",
            KeywordLiteral::Ninf => "@ninf",
            KeywordLiteral::True => "@true",
            KeywordLiteral::False => "@false",
            KeywordLiteral::Nil => "@nil",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|keyword| keyword.name() == name)
    }

    /// The value this keyword evaluates to.
    #[must_use]
    pub fn evaluation(self) -> crate::value::Concrete {
        use crate::value::Concrete;
        match self {
            KeywordLiteral::Nan => Concrete::Float(f64::NAN),
            KeywordLiteral::Inf => Concrete::Float(f64::INFINITY),
            KeywordLiteral::Ninf => Concrete::Float(f64::NEG_INFINITY),
            KeywordLiteral::True => Concrete::Boolean(true),
            KeywordLiteral::False => Concrete::Boolean(false),
            KeywordLiteral::Nil => Concrete::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c0_controls() {
        let count = (0u32..0x110000)
            .filter_map(char::from_u32)
            .filter(|&c| is_c0_control(c))
            .count();
        assert_eq!(count, 33);
        assert!(is_c0_control('\u{7f}'));
        assert!(!is_c0_control(' '));
    }

    #[test]
    fn test_identity_sets() {
        for c in ['0', '_', '+', '-', '.', ',', '@'] {
            assert!(is_identity_disallowed_start(c), "{c:?}");
            assert!(!is_identity_disallowed(c), "{c:?}");
        }
        for c in [' ', '\t', '"', '\'', '\\', '(', ')', '#', ';', '=', '<', '>'] {
            assert!(is_identity_disallowed(c), "{c:?}");
        }
        assert!(!is_identity_disallowed_start('a'));
        assert!(!is_identity_disallowed_start('é'));
    }

    #[test]
    fn test_escape_tables_agree() {
        for c in ['\\', '"', '\'', '\n', '\r', '\t'] {
            let sequence = simple_escape_sequence(c).unwrap();
            let escaped = sequence.chars().nth(1).unwrap();
            assert_eq!(simple_escape_evaluation(escaped), Some(c));
        }
        assert_eq!(simple_escape_evaluation('x'), None);
    }

    #[test]
    fn test_keyword_literals() {
        for keyword in KeywordLiteral::ALL {
            assert_eq!(KeywordLiteral::from_name(keyword.name()), Some(keyword));
            assert_eq!(&keyword.lexeme()[1..], keyword.name());
        }
        assert_eq!(KeywordLiteral::from_name("hex"), None);
    }
}
