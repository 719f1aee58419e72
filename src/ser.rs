//! Sled serialization.
//!
//! This module provides the [`Serializer`] that writes a
//! [`SerializableValue`] tree as Sled text.
//!
//! ## Overview
//!
//! - **Canonical layout**: one pair or element per line, indented, with
//!   thousands grouping, hex folding and multi-line strings as `@concat`
//! - **Minified layout**: a single line with `;` between pairs and elements
//! - **Identity when possible**: strings that can be bare are not quoted
//! - **Checked output**: out-of-range integers, mixed key kinds and repeated
//!   keys are errors rather than silently corrected
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde::Serialize;
//! use serde_sled::{to_string, to_string_minified};
//!
//! #[derive(Serialize)]
//! struct Person { name: String, age: u32, children: Vec<String> }
//!
//! let person = Person {
//!     name: "John Doe".to_string(),
//!     age: 50,
//!     children: vec!["Jane".to_string(), "Jimmy".to_string()],
//! };
//!
//! assert_eq!(
//!     to_string(&person).unwrap(),
//!     "name = \"John Doe\"\nage = 50\nchildren = [\n  Jane\n  Jimmy\n]\n"
//! );
//! assert_eq!(
//!     to_string_minified(&person).unwrap(),
//!     "name=\"John Doe\";age=50;children=[Jane;Jimmy]"
//! );
//! ```
//!
//! ## Direct Serializer Usage
//!
//! A [`Serializer`] validates its options once and can then be reused,
//! including from several threads at a time:
//!
//! ```rust
//! use serde_sled::{sled, Serializer, SerializeOptions, Value};
//!
//! let serializer = Serializer::new(SerializeOptions::canonical().with_top_level_braces(true)).unwrap();
//! let text = serializer.to_sled(&sled!({ "digest": (Value::bytes(vec![0xde, 0xad, 0xbe, 0xef])) })).unwrap();
//! assert_eq!(text, "{\n  digest = @hex(dead_beef)\n}\n");
//! ```

use crate::error::ErrorCategory;
use crate::options::{HexSeparator, Layout, SerializeOptions};
use crate::serializable::{map_keys, sled_integer, to_serializable};
use crate::spec::*;
use crate::value::{MapKey, SledType};
use crate::{Error, Result, SerializableValue};
use num_bigint::BigInt;
use serde::Serialize;
use std::cell::Cell;
use tracing::{debug, trace};

/// The Sled serializer.
///
/// Holds validated [`SerializeOptions`]. Each call to [`Serializer::to_sled`]
/// builds its output in fresh local state, so one serializer can be shared
/// freely.
#[derive(Clone, Debug)]
pub struct Serializer {
    options: SerializeOptions,
}

impl Serializer {
    /// Creates a serializer, validating `options`.
    ///
    /// A hex group size of zero and an empty hex separator each imply the
    /// other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the indent contains anything other
    /// than spaces and tabs, or if a non-zero hex line length is shorter
    /// than one group of hex digits.
    pub fn new(mut options: SerializeOptions) -> Result<Self> {
        if let Some(c) = options.indent.chars().find(|&c| !is_horizontal_space(c)) {
            return Err(Error::invalid_config(format!(
                "indent can only contain spaces and tabs, but contains {:?}",
                c
            )));
        }

        if options.hex_bytes_per_separator == 0 {
            options.hex_separator = HexSeparator::None;
        }
        if options.hex_separator == HexSeparator::None {
            options.hex_bytes_per_separator = 0;
        }

        let group_len = options.hex_bytes_per_separator.unsigned_abs() as usize * HEX_DIGITS_PER_BYTE;
        if options.hex_line_length > 0 && options.hex_line_length < group_len {
            return Err(Error::invalid_config(format!(
                "hex_line_length must be at least {}x the absolute value of \
                 hex_bytes_per_separator, but it is only {}, which is less than {}",
                HEX_DIGITS_PER_BYTE, options.hex_line_length, group_len
            )));
        }

        Ok(Serializer { options })
    }

    /// A serializer with the default canonical options.
    #[must_use]
    pub fn canonical() -> Self {
        Serializer {
            options: SerializeOptions::canonical(),
        }
    }

    /// A serializer with the default minified options.
    #[must_use]
    pub fn minified() -> Self {
        Serializer {
            options: SerializeOptions::minified(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Serializes `value` as a Sled document.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not resolve to a map with string
    /// keys, or if anything inside it cannot be written as Sled.
    pub fn to_sled(&self, value: impl Into<SerializableValue>) -> Result<String> {
        let pairs = match value.into().resolve() {
            SerializableValue::Map(pairs) => pairs,
            other => {
                return Err(Error::unsupported_type(&format!(
                    "a Sled document must be a map with string keys, but got {}",
                    other.kind_name()
                )))
            }
        };

        debug!(
            layout = ?self.options.layout,
            pairs = pairs.len(),
            "serializing sled document"
        );

        let writer = Writer::new(&self.options);
        let mut output = String::new();
        let braces = self.options.use_top_level_braces;
        if writer.canonical {
            if braces {
                writer.write_map(&mut output, &pairs, "", Some(SledType::String))?;
            } else {
                writer.write_map_content(&mut output, &pairs, "", Some(SledType::String))?;
            }
            output.push_str(writer.line_separator);
        } else {
            if braces {
                output.push(MAP_OPEN_MARK);
            }
            writer.write_map_content(&mut output, &pairs, "", Some(SledType::String))?;
            if braces {
                output.push(MAP_CLOSE_MARK);
            }
        }

        trace!(len = output.len(), "serialized sled document");
        Ok(output)
    }

    /// Serializes any `T: Serialize` as a Sled document.
    ///
    /// # Errors
    ///
    /// As for [`Serializer::to_sled`].
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        self.to_sled(to_serializable(value)?)
    }
}

/// Per-call output state.
struct Writer<'a> {
    options: &'a SerializeOptions,
    canonical: bool,
    line_separator: &'static str,
    depth: Cell<usize>,
}

impl<'a> Writer<'a> {
    fn new(options: &'a SerializeOptions) -> Self {
        Writer {
            options,
            canonical: options.layout == Layout::Canonical,
            line_separator: options.line_separator.as_str(),
            depth: Cell::new(0),
        }
    }

    fn new_line(&self, output: &mut String, indent: &str) {
        output.push_str(self.line_separator);
        output.push_str(indent);
    }

    fn write_value(&self, output: &mut String, value: &SerializableValue, indent: &str) -> Result<()> {
        match value {
            SerializableValue::Nil => output.push_str(KeywordLiteral::Nil.lexeme()),
            SerializableValue::Boolean(true) => output.push_str(KeywordLiteral::True.lexeme()),
            SerializableValue::Boolean(false) => output.push_str(KeywordLiteral::False.lexeme()),
            SerializableValue::Integer(n) => self.write_integer(output, n)?,
            SerializableValue::Float(x) => self.write_float(output, *x),
            SerializableValue::Bytes(bytes) => self.write_hex(output, bytes, indent),
            SerializableValue::String(s) => self.write_string(output, s, indent),
            SerializableValue::Map(pairs) => {
                self.nested(|| self.write_map(output, pairs, indent, None))?
            }
            SerializableValue::List(list) => self.nested(|| self.write_list(output, list, indent))?,
            SerializableValue::Custom(adapter) => {
                self.write_value(output, &adapter.to_sled_serializable(), indent)?
            }
        }
        Ok(())
    }

    // Containers

    fn nested(&self, write: impl FnOnce() -> Result<()>) -> Result<()> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING_DEPTH {
            return Err(Error::serialize(
                ErrorCategory::Syntax,
                format!(
                    "Maps and lists may be nested at most {} deep.",
                    MAX_NESTING_DEPTH
                ),
            ));
        }
        self.depth.set(depth + 1);
        let result = write();
        self.depth.set(depth);
        result
    }

    fn write_map(
        &self,
        output: &mut String,
        pairs: &[(SerializableValue, SerializableValue)],
        indent: &str,
        required: Option<SledType>,
    ) -> Result<()> {
        if pairs.is_empty() {
            output.push(MAP_OPEN_MARK);
            output.push(MAP_CLOSE_MARK);
            return Ok(());
        }

        output.push(MAP_OPEN_MARK);
        if self.canonical {
            let nested = format!("{}{}", indent, self.options.indent);
            self.new_line(output, &nested);
            self.write_map_content(output, pairs, &nested, required)?;
            self.new_line(output, indent);
        } else {
            self.write_map_content(output, pairs, indent, required)?;
        }
        output.push(MAP_CLOSE_MARK);
        Ok(())
    }

    /// Writes the pairs of a map without enclosing braces. `indent` is the
    /// indent of the pairs themselves.
    fn write_map_content(
        &self,
        output: &mut String,
        pairs: &[(SerializableValue, SerializableValue)],
        indent: &str,
        required: Option<SledType>,
    ) -> Result<()> {
        let keys = map_keys(pairs, required)?;
        for (i, (key, (_, value))) in keys.iter().zip(pairs).enumerate() {
            if i > 0 {
                if self.canonical {
                    self.new_line(output, indent);
                } else {
                    output.push(DELIMITER_MARK);
                }
            }
            match key {
                MapKey::String(s) => self.write_string(output, s, indent),
                MapKey::Integer(n) => output.push_str(&self.format_integer(*n)),
            }
            if self.canonical {
                output.push(' ');
                output.push(KEY_VALUE_SEPARATOR);
                output.push(' ');
            } else {
                output.push(KEY_VALUE_SEPARATOR);
            }
            self.write_value(output, value, indent)?;
        }
        Ok(())
    }

    fn write_list(&self, output: &mut String, list: &[SerializableValue], indent: &str) -> Result<()> {
        output.push(LIST_OPEN_MARK);
        if list.is_empty() {
            output.push(LIST_CLOSE_MARK);
            return Ok(());
        }

        if self.canonical {
            let nested = format!("{}{}", indent, self.options.indent);
            for element in list {
                self.new_line(output, &nested);
                self.write_value(output, element, &nested)?;
            }
            self.new_line(output, indent);
        } else {
            for (i, element) in list.iter().enumerate() {
                if i > 0 {
                    output.push(DELIMITER_MARK);
                }
                self.write_value(output, element, indent)?;
            }
        }
        output.push(LIST_CLOSE_MARK);
        Ok(())
    }

    // Numbers

    fn grouped(&self) -> bool {
        self.canonical && self.options.use_thousands_separator
    }

    fn write_integer(&self, output: &mut String, n: &BigInt) -> Result<()> {
        let n = sled_integer(n)?;
        output.push_str(&self.format_integer(n));
        Ok(())
    }

    fn format_integer(&self, n: i64) -> String {
        let digits = n.unsigned_abs().to_string();
        let sign = if n < 0 { "-" } else { "" };
        if self.grouped() {
            format!("{}{}", sign, group_thousands(&digits))
        } else {
            format!("{}{}", sign, digits)
        }
    }

    fn write_float(&self, output: &mut String, x: f64) {
        if x.is_nan() {
            output.push_str(KeywordLiteral::Nan.lexeme());
            return;
        }
        if x.is_infinite() {
            let keyword = if x < 0.0 {
                KeywordLiteral::Ninf
            } else {
                KeywordLiteral::Inf
            };
            output.push_str(keyword.lexeme());
            return;
        }

        // Debug output is the shortest text that reads back as the same f64.
        let natural = format!("{:?}", x);
        let (sign, unsigned) = match natural.strip_prefix(MINUS_SIGN) {
            Some(rest) => ("-", rest),
            None => ("", natural.as_str()),
        };
        let (mantissa, exponent) = match unsigned.split_once('e') {
            Some((mantissa, exponent)) => (mantissa, Some(exponent)),
            None => (unsigned, None),
        };
        let (integral, fraction) = match mantissa.split_once('.') {
            Some((integral, fraction)) => (integral, Some(fraction)),
            None => (mantissa, None),
        };

        output.push_str(sign);
        if self.grouped() {
            output.push_str(&group_thousands(integral));
        } else {
            output.push_str(integral);
        }
        let decimal_mark = self.options.decimal_mark.as_char();
        if let Some(fraction) = fraction {
            output.push(decimal_mark);
            output.push_str(fraction);
        }
        match exponent {
            Some(exponent) => {
                output.push(self.options.exponent_prefix.as_char());
                output.push_str(exponent);
            }
            None if fraction.is_none() => {
                output.push(decimal_mark);
                output.push('0');
            }
            None => {}
        }
    }

    // Hex

    fn write_hex(&self, output: &mut String, bytes: &[u8], indent: &str) {
        let content = self.hex_content(bytes);
        output.push(KEYWORD_MARK);
        output.push_str(HEX_KEYWORD_NAME);
        output.push(KEYWORD_OPEN_MARK);

        let line_length = self.options.hex_line_length;
        if !self.canonical || line_length == 0 || content.chars().count() <= line_length {
            output.push_str(&content);
        } else {
            let line_indent = format!("{}{}", indent, self.options.indent);
            for line in self.fold_hex(&content) {
                self.new_line(output, &line_indent);
                output.push_str(&line);
            }
            self.new_line(output, indent);
        }
        output.push(KEYWORD_CLOSE_MARK);
    }

    fn hex_content(&self, bytes: &[u8]) -> String {
        let pairs: Vec<String> = bytes
            .iter()
            .map(|b| {
                if self.options.hex_upper_case {
                    format!("{:02X}", b)
                } else {
                    format!("{:02x}", b)
                }
            })
            .collect();

        let per_group = self.options.hex_bytes_per_separator.unsigned_abs() as usize;
        let separator = self.options.hex_separator.as_str();
        if !self.canonical || per_group == 0 || separator.is_empty() || pairs.is_empty() {
            return pairs.concat();
        }

        let mut groups: Vec<String> = Vec::new();
        let rest = if self.options.hex_bytes_per_separator > 0 {
            &pairs[..]
        } else {
            let head = pairs.len() % per_group;
            if head > 0 {
                groups.push(pairs[..head].concat());
            }
            &pairs[head..]
        };
        groups.extend(rest.chunks(per_group).map(|chunk| chunk.concat()));
        groups.join(separator)
    }

    /// Splits grouped hex content into lines, never splitting a group.
    ///
    /// When grouping from the right, the first line is the short one and is
    /// padded with spaces so its groups line up with the lines below.
    fn fold_hex(&self, content: &str) -> Vec<String> {
        let chars: Vec<char> = content.chars().collect();
        let group_len =
            self.options.hex_bytes_per_separator.unsigned_abs() as usize * HEX_DIGITS_PER_BYTE;
        let separator_len = self.options.hex_separator.as_str().len();

        if self.options.hex_bytes_per_separator >= 0 {
            return fold_from_left(&chars, group_len, separator_len, self.options.hex_line_length);
        }

        let reversed: Vec<char> = chars.into_iter().rev().collect();
        let mut lines: Vec<String> =
            fold_from_left(&reversed, group_len, separator_len, self.options.hex_line_length)
                .into_iter()
                .rev()
                .map(|line| line.chars().rev().collect())
                .collect();
        if lines.len() > 1 {
            let width = lines[1].chars().count();
            lines[0] = format!("{:>width$}", lines[0], width = width);
        }
        lines
    }

    // Strings

    fn write_string(&self, output: &mut String, s: &str, indent: &str) {
        let quote_mark = self.options.quote_mark.as_char();
        if s.is_empty() {
            output.push(quote_mark);
            output.push(quote_mark);
            return;
        }
        if self.is_identity(s) {
            output.push_str(s);
            return;
        }

        if self.canonical
            && self.options.break_on_line_separator
            && s.contains(self.line_separator)
        {
            let segments: Vec<&str> = s.split(self.line_separator).collect();
            let segment_indent = format!("{}{}", indent, self.options.indent);
            output.push(KEYWORD_MARK);
            output.push_str(CONCAT_KEYWORD_NAME);
            output.push(KEYWORD_OPEN_MARK);
            for (i, segment) in segments.iter().enumerate() {
                self.new_line(output, &segment_indent);
                output.push(quote_mark);
                self.escape_into(output, segment);
                if i + 1 < segments.len() {
                    output.push_str(self.options.line_separator.escaped());
                }
                output.push(quote_mark);
            }
            self.new_line(output, indent);
            output.push(KEYWORD_CLOSE_MARK);
            return;
        }

        output.push(quote_mark);
        self.escape_into(output, s);
        output.push(quote_mark);
    }

    fn is_identity(&self, s: &str) -> bool {
        let ascii_only = self.options.ascii_only;
        !self.options.always_quote
            && s.chars().next().is_some_and(|c| !is_identity_disallowed_start(c))
            && s.chars().all(|c| {
                !is_identity_disallowed(c) && !c.is_whitespace() && (c.is_ascii() || !ascii_only)
            })
    }

    fn escape_into(&self, output: &mut String, s: &str) {
        let quote_mark = self.options.quote_mark.as_char();
        for c in s.chars() {
            if c == ESCAPE_CHARACTER || c == quote_mark {
                output.push(ESCAPE_CHARACTER);
                output.push(c);
            } else if let Some(sequence) =
                simple_escape_sequence(c).filter(|_| is_c0_control(c))
            {
                output.push_str(sequence);
            } else if is_c0_control(c) || (self.options.ascii_only && !c.is_ascii()) {
                output.push_str(&unicode_escape(c));
            } else {
                output.push(c);
            }
        }
    }
}

fn fold_from_left(
    chars: &[char],
    group_len: usize,
    separator_len: usize,
    line_length: usize,
) -> Vec<String> {
    let (line_len, step) = if group_len > 0 && separator_len > 0 {
        let remainder = (line_length + separator_len) % (group_len + separator_len);
        let line_len = line_length - remainder;
        (line_len, line_len + separator_len)
    } else {
        (line_length, line_length)
    };

    let mut lines = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + line_len).min(chars.len());
        lines.push(chars[start..end].iter().collect());
        start += step;
    }
    lines
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(DIGIT_SEPARATOR);
        }
        grouped.push(c);
    }
    grouped
}

fn unicode_escape(c: char) -> String {
    format!(
        "{}{}{}{:X}{}",
        ESCAPE_CHARACTER, UNICODE_ESCAPE_MARK, UNICODE_ESCAPE_OPEN_MARK, c as u32, UNICODE_ESCAPE_CLOSE_MARK
    )
}
