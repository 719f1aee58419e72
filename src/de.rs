//! Sled parsing and deserialization.
//!
//! This module provides the recursive-descent [`Parser`] that turns Sled text
//! into a [`StringMap`], and [`from_value`], which hands a parsed tree to any
//! `T: Deserialize`.
//!
//! ## Overview
//!
//! - **Single pass**: the cursor only moves forward; no lexical form needs
//!   backtracking to tell it apart from the others
//! - **No recovery**: the first problem aborts the parse with a located error
//! - **Batched duplicates**: every repeated key of a map is reported together
//!
//! ## Usage
//!
//! ```rust
//! use serde_sled::{Parser, Value};
//!
//! let mut parser = Parser::new("name = \"John Doe\"\nage = 50\nchildren = [Jane; Jimmy]\n");
//! let document = parser.parse().unwrap();
//! assert_eq!(document.get("age"), Some(&Value::Integer(50)));
//! assert_eq!(
//!     document.get("children"),
//!     Some(&Value::List(vec![Value::from("Jane"), Value::from("Jimmy")]))
//! );
//! ```

use crate::error::ErrorCategory;
use crate::snapshot::ParseSnapshot;
use crate::spec::*;
use crate::value::{MapKey, SledType};
use crate::{Error, IntMap, Result, StringMap, Value};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{de, forward_to_deserialize_any};
use std::collections::HashSet;
use tracing::{debug, trace};

const INVALID_COEFFICIENT_REASON: &str =
    "Invalid number. Expected at least 1 digit excluding any exponent.";

/// The Sled parser.
///
/// Owns the normalized input and a forward-only cursor. One parser handles
/// one parse at a time; [`Parser::parse`] resets the cursor first, so the
/// same instance can be parsed again.
pub struct Parser {
    text: Vec<char>,
    index: usize,
    line_num: usize,
    line_start: usize,
    depth: usize,
}

fn describe(c: Option<char>) -> String {
    match c {
        Some(c) => format!("{:?}", c),
        None => "end of input".to_string(),
    }
}

impl Parser {
    /// Creates a parser over `text`. CRLF and CR line separators are
    /// normalized to LF.
    pub fn new(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        Parser {
            text: normalized.chars().collect(),
            index: 0,
            line_num: 1,
            line_start: 0,
            depth: 0,
        }
    }

    /// Moves the cursor back to the start of the input.
    pub fn reset(&mut self) {
        self.index = 0;
        self.line_num = 1;
        self.line_start = 0;
        self.depth = 0;
    }

    /// Parses the whole input as a document.
    ///
    /// # Errors
    ///
    /// Returns the first format violation found, with its location.
    pub fn parse(&mut self) -> Result<StringMap> {
        self.reset();
        trace!(chars = self.text.len(), "parsing sled document");
        let document = self.parse_document()?;
        trace!(pairs = document.len(), "parsed sled document");
        Ok(document)
    }

    fn parse_document(&mut self) -> Result<StringMap> {
        let has_braces = self.peek() == Some(MAP_OPEN_MARK);
        if has_braces {
            self.advance();
        }

        let pairs = self.parse_map_content(Some(SledType::String), 1, 1)?;
        let document = pairs
            .into_iter()
            .filter_map(|(key, value)| match key {
                MapKey::String(s) => Some((s, value)),
                MapKey::Integer(_) => None,
            })
            .collect();

        if has_braces {
            if self.peek() != Some(MAP_CLOSE_MARK) {
                return Err(self.error(format!(
                    "Expected '{}' to end top-level map, but got {}.",
                    MAP_CLOSE_MARK,
                    describe(self.peek())
                )));
            }
            self.advance();
            self.consume_ws()?;
        }

        if !self.at_end() {
            return Err(self.error("Sled input did not end where expected."));
        }
        Ok(document)
    }

    // Input

    fn at_end(&self) -> bool {
        self.index >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.text.get(self.index).copied()
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn range(&self, start: usize, end: usize) -> String {
        self.text[start..end.min(self.text.len())].iter().collect()
    }

    fn column(&self) -> usize {
        self.index - self.line_start + 1
    }

    fn snapshot(&self) -> ParseSnapshot {
        ParseSnapshot::pending(self.index, self.line_start, self.line_num)
    }

    // Errors

    fn find_line_end(&self, from: usize) -> usize {
        self.text[from.min(self.text.len())..]
            .iter()
            .position(|&c| c == LINE_FEED)
            .map_or(self.text.len(), |offset| from + offset)
    }

    fn error_at(
        &self,
        category: ErrorCategory,
        reason: impl Into<String>,
        start: usize,
        end: usize,
        line_start: usize,
        line_num: usize,
    ) -> Error {
        let line_end = self.find_line_end(line_start);
        let line = self.range(line_start, line_end);
        let end = end.min(line_end + 1);
        Error::parse(
            category,
            reason,
            &line,
            line_num,
            start - line_start,
            end.saturating_sub(line_start),
        )
    }

    fn error_span(
        &self,
        category: ErrorCategory,
        reason: impl Into<String>,
        snapshot: &ParseSnapshot,
    ) -> Error {
        self.error_at(
            category,
            reason,
            snapshot.start_index,
            snapshot.end_index,
            snapshot.line_start,
            snapshot.line_num,
        )
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        self.error_at(
            ErrorCategory::Syntax,
            reason,
            self.index,
            self.index + 1,
            self.line_start,
            self.line_num,
        )
    }

    // Whitespace and comments

    /// Consumes horizontal space, line separators and comments. Returns
    /// `true` if a line separator was among them.
    fn consume_ws(&mut self) -> Result<bool> {
        self.consume_ws_and(false)
    }

    /// Like [`Parser::consume_ws`], but also consumes `;`.
    fn consume_ws_or_delimiters(&mut self) -> Result<bool> {
        self.consume_ws_and(true)
    }

    fn consume_ws_and(&mut self, delimiters: bool) -> Result<bool> {
        let mut delimited = false;
        loop {
            match self.peek() {
                Some(LINE_FEED) => {
                    self.consume_line_separators();
                    delimited = true;
                }
                Some(COMMENT_MARK) => {
                    self.parse_comment()?;
                    delimited = true;
                }
                Some(c) if is_horizontal_space(c) => self.advance(),
                Some(DELIMITER_MARK) if delimiters => {
                    self.advance();
                    delimited = true;
                }
                _ => return Ok(delimited),
            }
        }
    }

    fn consume_line_separators(&mut self) {
        while self.peek() == Some(LINE_FEED) {
            self.advance();
            self.line_num += 1;
        }
        self.line_start = self.index;
    }

    /// Consumes a comment and the line separators that follow it.
    fn parse_comment(&mut self) -> Result<()> {
        self.advance();
        while matches!(self.peek(), Some(c) if !is_comment_disallowed(c)) {
            self.advance();
        }
        match self.peek() {
            None => Ok(()),
            Some(LINE_FEED) => {
                self.consume_line_separators();
                Ok(())
            }
            Some(c) => Err(self.error(format!(
                "Invalid comment. Found disallowed symbol {:?}.",
                c
            ))),
        }
    }

    // Containers

    fn parse_entity(&mut self) -> Result<Value> {
        match self.peek() {
            Some(MAP_OPEN_MARK) => {
                self.enter_container()?;
                let map = self.parse_map();
                self.depth -= 1;
                map
            }
            Some(LIST_OPEN_MARK) => {
                self.enter_container()?;
                self.advance();
                let list = self.parse_list_content();
                self.depth -= 1;
                list
            }
            Some(KEYWORD_MARK) => Ok(self.parse_keyword()?.0),
            Some(c) if is_number_start(c) => Ok(self.parse_number()?.0),
            Some(c) if is_quote_mark(c) => Ok(Value::String(self.parse_quote()?.0)),
            Some(c) if !is_identity_disallowed_start(c) => {
                Ok(Value::String(self.parse_identity().0))
            }
            c => Err(self.error(format!(
                "Invalid entity. No entity starts with {}.",
                describe(c)
            ))),
        }
    }

    /// Counts one more level of nesting at an opening mark.
    fn enter_container(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            debug!(line = self.line_num, depth = self.depth, "nesting limit reached");
            return Err(self.error(format!(
                "Maps and lists may be nested at most {} deep.",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_map(&mut self) -> Result<Value> {
        let (line_num, column) = (self.line_num, self.column());
        self.advance();
        let pairs = self.parse_map_content(None, line_num, column)?;
        if self.peek() != Some(MAP_CLOSE_MARK) {
            return Err(self.error(format!(
                "Expected '{}' to end map, but got {}.",
                MAP_CLOSE_MARK,
                describe(self.peek())
            )));
        }
        self.advance();
        Ok(collect_map(pairs))
    }

    /// Parses key-value pairs up to a closing brace or the end of input,
    /// which is left unconsumed.
    ///
    /// `expected` fixes the key type up front; otherwise the first key does.
    /// `line_num` and `column` locate the map for duplicate-key reports.
    fn parse_map_content(
        &mut self,
        expected: Option<SledType>,
        line_num: usize,
        column: usize,
    ) -> Result<Vec<(MapKey, Value)>> {
        let mut expected = expected;
        let mut keys: Vec<(MapKey, ParseSnapshot)> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        self.consume_ws_or_delimiters()?;
        let mut delimited = true;
        loop {
            let c = self.peek();
            if c.is_none() || c == Some(MAP_CLOSE_MARK) {
                break;
            }
            if !delimited {
                return Err(self.error(format!(
                    "Expected either the end of the map, or a delimiter ('{}' or a line separator) \
                     before the next key-value pair, but got {}.",
                    DELIMITER_MARK,
                    describe(c)
                )));
            }

            let (key, snapshot) = self.parse_map_key(expected)?;
            expected = Some(key.sled_type());

            self.consume_ws()?;
            if self.peek() != Some(KEY_VALUE_SEPARATOR) {
                return Err(self.error(format!(
                    "Expected '{}' between key and value, but got {}.",
                    KEY_VALUE_SEPARATOR,
                    describe(self.peek())
                )));
            }
            self.advance();
            self.consume_ws()?;
            let value = self.parse_entity()?;

            keys.push((key, snapshot));
            values.push(value);
            delimited = self.consume_ws_or_delimiters()?;
        }

        let mut seen = HashSet::with_capacity(keys.len());
        if keys.iter().any(|(key, _)| !seen.insert(key)) {
            debug!(line = line_num, column, "rejecting map with duplicate keys");
            return Err(Error::duplicate_map_key(&keys, line_num, column));
        }

        Ok(keys
            .into_iter()
            .map(|(key, _)| key)
            .zip(values)
            .collect())
    }

    fn parse_map_key(&mut self, expected: Option<SledType>) -> Result<(MapKey, ParseSnapshot)> {
        let (value, snapshot) = match self.peek() {
            Some(KEYWORD_MARK) => self.parse_keyword()?,
            Some(c) if is_number_start(c) => self.parse_number()?,
            Some(c) if is_quote_mark(c) => {
                let (s, snapshot) = self.parse_quote()?;
                (Value::String(s), snapshot)
            }
            Some(c) if !is_identity_disallowed_start(c) => {
                let (s, snapshot) = self.parse_identity();
                (Value::String(s), snapshot)
            }
            c => {
                return Err(self.error(format!(
                    "Invalid map key. No map key starts with {}.",
                    describe(c)
                )))
            }
        };

        let key = match value {
            Value::String(s) => MapKey::String(s),
            Value::Integer(n) => MapKey::Integer(n),
            other => {
                return Err(self.error_span(
                    ErrorCategory::MapKeyTypeMismatch,
                    format!(
                        "Expected map key to be either a string or integer, but got {}.",
                        other.sled_type()
                    ),
                    &snapshot,
                ))
            }
        };

        match expected {
            Some(expected) if expected != key.sled_type() => {
                debug!(
                    line = snapshot.line_num,
                    %expected,
                    found = %key.sled_type(),
                    "rejecting map with mixed key types"
                );
                Err(self.error_span(
                    ErrorCategory::MapKeyTypeMismatch,
                    format!(
                        "Expected every key in this map to be of type {}, but got {}.",
                        expected,
                        key.sled_type()
                    ),
                    &snapshot,
                ))
            }
            _ => Ok((key, snapshot)),
        }
    }

    fn parse_list_content(&mut self) -> Result<Value> {
        let mut list = Vec::new();
        self.consume_ws_or_delimiters()?;
        let mut delimited = true;
        loop {
            match self.peek() {
                Some(LIST_CLOSE_MARK) => {
                    self.advance();
                    return Ok(Value::List(list));
                }
                None => {
                    return Err(self.error(format!(
                        "Reached end of input without finding '{}' to end list.",
                        LIST_CLOSE_MARK
                    )))
                }
                c if !delimited => {
                    return Err(self.error(format!(
                        "Expected either '{}' to end the list, or a delimiter ('{}' or a line \
                         separator) before the next entity, but got {}.",
                        LIST_CLOSE_MARK,
                        DELIMITER_MARK,
                        describe(c)
                    )))
                }
                _ => {
                    list.push(self.parse_entity()?);
                    delimited = self.consume_ws_or_delimiters()?;
                }
            }
        }
    }

    // Keywords

    fn parse_keyword(&mut self) -> Result<(Value, ParseSnapshot)> {
        let snapshot = self.snapshot();
        self.advance();
        let name_start = self.index;
        while matches!(self.peek(), Some(c) if is_keyword_char(c)) {
            self.advance();
        }
        let name = self.range(name_start, self.index);

        if let Some(keyword) = KeywordLiteral::from_name(&name) {
            let evaluation = keyword.evaluation();
            let sled_type = evaluation.sled_type();
            return Ok((evaluation.into(), snapshot.finish(self.index, sled_type)));
        }

        match name.as_str() {
            HEX_KEYWORD_NAME => {
                self.open_keyword(HEX_KEYWORD_NAME)?;
                let bytes = self.parse_hex_content()?;
                self.advance();
                Ok((Value::Bytes(bytes), snapshot.finish(self.index, SledType::Hex)))
            }
            CONCAT_KEYWORD_NAME => {
                self.open_keyword(CONCAT_KEYWORD_NAME)?;
                let content = self.parse_concat_content()?;
                self.advance();
                Ok((
                    Value::String(content),
                    snapshot.finish(self.index, SledType::String),
                ))
            }
            _ => Err(self.error_at(
                ErrorCategory::Syntax,
                format!("Invalid keyword \"{}{}\".", KEYWORD_MARK, name),
                snapshot.start_index,
                self.index,
                snapshot.line_start,
                snapshot.line_num,
            )),
        }
    }

    fn open_keyword(&mut self, name: &str) -> Result<()> {
        self.consume_ws()?;
        if self.peek() != Some(KEYWORD_OPEN_MARK) {
            return Err(self.error(format!(
                "Expected '{}' to start {}, but got {}.",
                KEYWORD_OPEN_MARK,
                name,
                describe(self.peek())
            )));
        }
        self.advance();
        Ok(())
    }

    /// Parses hex digits up to, but not including, the closing parenthesis.
    fn parse_hex_content(&mut self) -> Result<Vec<u8>> {
        let mut nibbles: Vec<u8> = Vec::new();
        loop {
            match self.peek() {
                Some(KEYWORD_CLOSE_MARK) => break,
                Some(LINE_FEED) => self.consume_line_separators(),
                Some(c) if is_hex_content_char(c) => {
                    if let Some(digit) = c.to_digit(16) {
                        nibbles.push(digit as u8);
                    }
                    self.advance();
                }
                Some(c) => {
                    return Err(self.error(format!(
                        "Invalid hex. Expected only '{}', hexadecimal digits and whitespace \
                         between '{}' and '{}', but found {:?}.",
                        DIGIT_SEPARATOR, KEYWORD_OPEN_MARK, KEYWORD_CLOSE_MARK, c
                    )))
                }
                None => {
                    return Err(self.error(format!(
                        "Invalid hex. Reached end of input without finding '{}' to end hex.",
                        KEYWORD_CLOSE_MARK
                    )))
                }
            }
        }

        if nibbles.len() % HEX_DIGITS_PER_BYTE != 0 {
            return Err(self.error(format!(
                "Invalid hex. Expected an even number of hexadecimal digits for full bytes \
                 of data, but got {} hexadecimal digits.",
                nibbles.len()
            )));
        }

        Ok(nibbles
            .chunks(HEX_DIGITS_PER_BYTE)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect())
    }

    /// Parses concat segments up to, but not including, the closing parenthesis.
    fn parse_concat_content(&mut self) -> Result<String> {
        let mut content = String::new();
        self.consume_ws_or_delimiters()?;
        let mut delimited = true;
        loop {
            match self.peek() {
                Some(KEYWORD_CLOSE_MARK) => return Ok(content),
                Some(c) if is_quote_mark(c) && delimited => {
                    content.push_str(&self.parse_quote()?.0);
                    delimited = self.consume_ws_or_delimiters()?;
                }
                c if !delimited => {
                    return Err(self.error(format!(
                        "Expected either '{}' to end the concat, or a delimiter ('{}' or a line \
                         separator) before the next segment, but got {}.",
                        KEYWORD_CLOSE_MARK,
                        DELIMITER_MARK,
                        describe(c)
                    )))
                }
                c => {
                    return Err(self.error(format!(
                        "Expected either a quote mark (single or double) to start a quote, \
                         or '{}' to end the concat, but got {}.",
                        KEYWORD_CLOSE_MARK,
                        describe(c)
                    )))
                }
            }
        }
    }

    // Numbers

    /// Consumes digits and digit separators, returning only the digits.
    fn consume_digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(|&c| is_optional_digit(c)) {
            if is_digit(c) {
                digits.push(c);
            }
            self.advance();
        }
        digits
    }

    /// Skips leading digit separators, then consumes an optional sign.
    fn consume_sign(&mut self) -> Option<char> {
        while self.peek() == Some(DIGIT_SEPARATOR) {
            self.advance();
        }
        let sign = self.peek().filter(|&c| is_sign(c));
        if sign.is_some() {
            self.advance();
        }
        sign
    }

    /// Consumes an exponent and returns it as `e`, sign and digits.
    fn consume_exponent(&mut self) -> Result<String> {
        let prefix = self.peek().unwrap_or('e');
        self.advance();
        let sign = self.consume_sign();
        let digits = self.consume_digits();
        if digits.is_empty() {
            return Err(self.error(format!(
                "Invalid exponent. Expected at least 1 digit in the exponent (after '{}{}').",
                prefix,
                sign.map(String::from).unwrap_or_default()
            )));
        }
        Ok(format!(
            "e{}{}",
            sign.map(String::from).unwrap_or_default(),
            digits
        ))
    }

    fn parse_number(&mut self) -> Result<(Value, ParseSnapshot)> {
        let snapshot = self.snapshot();
        let sign = self.consume_sign().map(String::from).unwrap_or_default();

        let coefficient_start = self.index;
        let integral = self.consume_digits();
        let mut fraction = None;
        if self.peek().is_some_and(is_decimal_mark) {
            self.advance();
            fraction = Some(self.consume_digits());
        }

        let fraction_is_empty = fraction.as_deref().map_or(true, str::is_empty);
        if integral.is_empty() && fraction_is_empty {
            let line_start = self.line_start;
            return Err(self.error_at(
                ErrorCategory::Syntax,
                INVALID_COEFFICIENT_REASON,
                coefficient_start,
                self.index.max(coefficient_start + 1),
                line_start,
                self.line_num,
            ));
        }

        let exponent = if self.peek().is_some_and(is_exponent_prefix) {
            Some(self.consume_exponent()?)
        } else {
            None
        };

        if fraction.is_none() && exponent.is_none() {
            let snapshot = snapshot.finish(self.index, SledType::Integer);
            let text = format!("{}{}", sign, integral);
            return match text.parse::<i64>() {
                Ok(n) => Ok((Value::Integer(n), snapshot)),
                Err(_) => Err(self.error_span(
                    ErrorCategory::NumberRangeOverflow,
                    format!(
                        "Invalid integer. Does not fall within allowed values for Sled integer \
                         (overflow): {}",
                        text
                    ),
                    &snapshot,
                )),
            };
        }

        let snapshot = snapshot.finish(self.index, SledType::Float);
        let or_zero = |digits: &str| {
            if digits.is_empty() {
                "0".to_string()
            } else {
                digits.to_string()
            }
        };
        let text = format!(
            "{}{}.{}{}",
            sign,
            or_zero(&integral),
            or_zero(fraction.as_deref().unwrap_or_default()),
            exponent.unwrap_or_default()
        );
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok((Value::Float(x), snapshot)),
            Ok(x) => Err(self.error_span(
                ErrorCategory::NumberRangeOverflow,
                format!(
                    "Invalid float. Expected a non-keyword value, but the input evaluates to {}: {}",
                    x, text
                ),
                &snapshot,
            )),
            Err(e) => Err(self.error_span(
                ErrorCategory::NumberRangeOverflow,
                format!("Invalid float. Failed to convert input {}: {}", text, e),
                &snapshot,
            )),
        }
    }

    // Strings

    fn parse_quote(&mut self) -> Result<(String, ParseSnapshot)> {
        let snapshot = self.snapshot();
        let quote_mark = self.peek().unwrap_or(DOUBLE_QUOTE_MARK);
        self.advance();

        let mut content = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote_mark => {
                    self.advance();
                    break;
                }
                Some(ESCAPE_CHARACTER) => content.push(self.parse_escape_sequence()?),
                Some(c) if is_quote_restricted(c) => {
                    return Err(self.error(format!(
                        "Invalid quote. Found disallowed symbol {:?}.",
                        c
                    )))
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
                None => {
                    return Err(self.error(format!(
                        "Reached end of input without finding {:?} to end quote.",
                        quote_mark
                    )))
                }
            }
        }

        Ok((content, snapshot.finish(self.index, SledType::String)))
    }

    fn parse_escape_sequence(&mut self) -> Result<char> {
        let start = self.index;
        self.advance();
        let c = self.peek();
        if let Some(evaluation) = c.and_then(simple_escape_evaluation) {
            self.advance();
            return Ok(evaluation);
        }
        if c == Some(UNICODE_ESCAPE_MARK) {
            return self.parse_unicode_escape(start);
        }
        Err(self.error_at(
            ErrorCategory::Syntax,
            format!(
                "Invalid escape sequence. No escape sequence has the escape character \
                 followed by {}.",
                describe(c)
            ),
            start,
            self.index + 1,
            self.line_start,
            self.line_num,
        ))
    }

    fn parse_unicode_escape(&mut self, start: usize) -> Result<char> {
        self.advance();
        if self.peek() != Some(UNICODE_ESCAPE_OPEN_MARK) {
            return Err(self.error(format!(
                "Expected '{}' after \"{}{}\", but got {}.",
                UNICODE_ESCAPE_OPEN_MARK,
                ESCAPE_CHARACTER,
                UNICODE_ESCAPE_MARK,
                describe(self.peek())
            )));
        }
        self.advance();

        let mut code_point: u32 = 0;
        let mut digit_count = 0;
        loop {
            match self.peek() {
                Some(UNICODE_ESCAPE_CLOSE_MARK) => {
                    self.advance();
                    break;
                }
                Some(DIGIT_SEPARATOR) => self.advance(),
                Some(c) if c.is_ascii_hexdigit() => {
                    let digit = c.to_digit(16).unwrap_or_default();
                    code_point = code_point.saturating_mul(16).saturating_add(digit);
                    digit_count += 1;
                    self.advance();
                }
                Some(c) => {
                    return Err(self.error(format!(
                        "Invalid Unicode escape sequence. Expected only hexadecimal digits \
                         between '{}' and '{}', but found {:?}.",
                        UNICODE_ESCAPE_OPEN_MARK, UNICODE_ESCAPE_CLOSE_MARK, c
                    )))
                }
                None => {
                    return Err(self.error(format!(
                        "Invalid Unicode escape sequence. Reached end of input without finding \
                         '{}' to end escape sequence for Unicode code point.",
                        UNICODE_ESCAPE_CLOSE_MARK
                    )))
                }
            }
        }

        let invalid = |reason: String| {
            self.error_at(
                ErrorCategory::Syntax,
                reason,
                start,
                self.index,
                self.line_start,
                self.line_num,
            )
        };
        if digit_count == 0 {
            return Err(invalid(
                "Invalid Unicode escape sequence. Expected at least 1 hexadecimal digit."
                    .to_string(),
            ));
        }
        char::from_u32(code_point).ok_or_else(|| {
            invalid(format!(
                "Invalid Unicode escape sequence. {} is not a Unicode scalar value.",
                self.range(start, self.index)
            ))
        })
    }

    /// Parses an identity. The caller has checked the first character.
    fn parse_identity(&mut self) -> (String, ParseSnapshot) {
        let snapshot = self.snapshot();
        self.advance();
        while matches!(self.peek(), Some(c) if !is_identity_disallowed(c)) {
            self.advance();
        }
        (
            self.range(snapshot.start_index, self.index),
            snapshot.finish(self.index, SledType::String),
        )
    }
}

fn collect_map(pairs: Vec<(MapKey, Value)>) -> Value {
    let mut strings = StringMap::new();
    let mut integers = IntMap::new();
    for (key, value) in pairs {
        match key {
            MapKey::String(s) => strings.insert(s, value),
            MapKey::Integer(n) => integers.insert(n, value),
        };
    }
    if integers.is_empty() {
        Value::StringMap(strings)
    } else {
        Value::IntMap(integers)
    }
}

/// Deserializes an instance of `T` from a parsed value.
///
/// # Errors
///
/// Returns an error if the value's shape does not match `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(pairs: Vec<(Value, Value)>) -> Self {
        MapDeserializer {
            iter: pairs.into_iter(),
            value: None,
        }
    }

    fn from_string_map(map: StringMap) -> Self {
        Self::new(map.into_iter().map(|(k, v)| (Value::String(k), v)).collect())
    }

    fn from_int_map(map: IntMap) -> Self {
        Self::new(map.into_iter().map(|(k, v)| (Value::Integer(k), v)).collect())
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        let visitor = VariantDeserializer { value: self.value };
        Ok((variant, visitor))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Nil) | None => Ok(()),
            _ => Err(Error::custom("Expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("Expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::List(list)) => visitor.visit_seq(SeqDeserializer::new(list)),
            _ => Err(Error::custom("Expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::StringMap(map)) => visitor.visit_map(MapDeserializer::from_string_map(map)),
            _ => Err(Error::custom("Expected struct variant")),
        }
    }
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Nil => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Integer(n) => visitor.visit_i64(n),
            Value::Float(x) => visitor.visit_f64(x),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::String(s) => visitor.visit_string(s),
            Value::StringMap(map) => visitor.visit_map(MapDeserializer::from_string_map(map)),
            Value::IntMap(map) => visitor.visit_map(MapDeserializer::from_int_map(map)),
            Value::List(list) => visitor.visit_seq(SeqDeserializer::new(list)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Nil => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    // Bytes can fill any sequence of integers, such as `Vec<u8>`.
    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Bytes(bytes) => visitor.visit_seq(SeqDeserializer::new(
                bytes.into_iter().map(|b| Value::Integer(b as i64)).collect(),
            )),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::StringMap(map) if map.len() == 1 => match map.into_iter().next() {
                Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                }),
                None => Err(Error::custom("Expected enum variant")),
            },
            _ => Err(Error::custom("Expected enum")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn parse(text: &str) -> Result<StringMap> {
        Parser::new(text).parse()
    }

    fn single(text: &str) -> Value {
        let document = parse(&format!("v = {}", text)).unwrap();
        document.get("v").cloned().unwrap()
    }

    fn category(text: &str) -> Option<ErrorCategory> {
        parse(text).unwrap_err().category()
    }

    #[test]
    fn test_empty_documents() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("{}").unwrap().is_empty());
        assert!(parse(" ;\n# only a comment").unwrap().is_empty());
        assert!(parse("{\n}\n").unwrap().is_empty());
    }

    #[test]
    fn test_top_level_braces_must_close() {
        let err = parse("{a = 1").unwrap_err();
        assert!(err.to_string().contains("to end top-level map"));
        let err = parse("a = 1}").unwrap_err();
        assert!(err.to_string().starts_with("Sled input did not end where expected."));
    }

    #[test]
    fn test_delimiters_between_pairs() {
        let document = parse("a = 1; b = 2\nc = 3;;\n\n").unwrap();
        assert_eq!(document.len(), 3);
        let err = parse("a = 1 b = 2").unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Syntax));
        assert!(err.to_string().contains("or a delimiter"));
    }

    #[test]
    fn test_crlf_and_cr_are_line_separators() {
        let document = parse("a = 1\r\nb = 2\rc = 3").unwrap();
        assert_eq!(document.len(), 3);
        let err = parse("a = 1\r\nb = ?\r\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_identities() {
        assert_eq!(single("hello"), Value::from("hello"));
        assert_eq!(single("a.b-c+d@e,f"), Value::from("a.b-c+d@e,f"));
        assert_eq!(single("héllo"), Value::from("héllo"));
        assert_eq!(category("v = @bad"), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_quotes_and_escapes() {
        assert_eq!(single(r#""a b""#), Value::from("a b"));
        assert_eq!(single(r#"'say "hi"'"#), Value::from("say \"hi\""));
        assert_eq!(
            single(r#""\\ \" \' \n \r \t""#),
            Value::from("\\ \" ' \n \r \t")
        );
        assert_eq!(single(r#""\u{1_F600}\u{41}""#), Value::from("\u{1F600}A"));
        assert_eq!(single("\"tab\there\""), Value::from("tab\there"));
    }

    #[test]
    fn test_quote_errors() {
        assert_eq!(category("v = \"abc"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = \"a\nb\""), Some(ErrorCategory::Syntax));
        assert_eq!(category(r#"v = "\x""#), Some(ErrorCategory::Syntax));
        assert_eq!(category(r#"v = "\u{}""#), Some(ErrorCategory::Syntax));
        assert_eq!(category(r#"v = "\u{D800}""#), Some(ErrorCategory::Syntax));
        assert_eq!(category(r#"v = "\u{110000}""#), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(single("42"), Value::Integer(42));
        assert_eq!(single("-1_000"), Value::Integer(-1000));
        assert_eq!(single("__+7"), Value::Integer(7));
        assert_eq!(single("1.5"), Value::Float(1.5));
        assert_eq!(single("1,5"), Value::Float(1.5));
        assert_eq!(single(".5"), Value::Float(0.5));
        assert_eq!(single("5."), Value::Float(5.0));
        assert_eq!(single("1E3"), Value::Float(1000.0));
        assert_eq!(single("-2.5e-1_0"), Value::Float(-2.5e-10));
    }

    #[test]
    fn test_number_errors() {
        assert_eq!(category("v = ."), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = -"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = 1e"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = 1e999"), Some(ErrorCategory::NumberRangeOverflow));
        assert_eq!(
            category("v = -9223372036854775809"),
            Some(ErrorCategory::NumberRangeOverflow)
        );
        assert_eq!(single("-9223372036854775808"), Value::Integer(i64::MIN));
    }

    #[test]
    fn test_keyword_literals() {
        assert_eq!(single("@nil"), Value::Nil);
        assert_eq!(single("@true"), Value::Boolean(true));
        assert_eq!(single("@false"), Value::Boolean(false));
        assert_eq!(single("@inf"), Value::Float(f64::INFINITY));
        assert_eq!(single("@ninf"), Value::Float(f64::NEG_INFINITY));
        assert!(single("@nan").as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_hex() {
        assert_eq!(single("@hex(deadBEEF)"), Value::bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(single("@hex()"), Value::bytes(vec![]));
        assert_eq!(
            single("@hex (\n  de_ad\n  be ef\n)"),
            Value::bytes(vec![0xde, 0xad, 0xbe, 0xef])
        );
        assert_eq!(category("v = @hex(abc)"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = @hex(zz)"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = @hex(ab"), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_multi_line_hex_keeps_line_numbers() {
        let err = parse("a = @hex(\n00\n11\n)\nb = ?").unwrap_err();
        assert_eq!(err.line(), Some(5));
    }

    #[test]
    fn test_concat() {
        assert_eq!(single(r#"@concat("a"; 'b'
            "c")"#), Value::from("abc"));
        assert_eq!(single("@concat()"), Value::from(""));
        assert_eq!(category(r#"v = @concat("a" "b")"#), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = @concat(a)"), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_nested_containers() {
        let value = single("{x = [1; {}; []]; y = {1 = a; 2 = b}}");
        let map = value.as_string_map().unwrap();
        assert_eq!(
            map.get("x"),
            Some(&Value::List(vec![
                Value::Integer(1),
                Value::StringMap(StringMap::new()),
                Value::List(vec![]),
            ]))
        );
        let imap = map.get("y").and_then(Value::as_int_map).unwrap();
        assert_eq!(imap.get(&2_i64), Some(&Value::from("b")));
    }

    #[test]
    fn test_list_errors() {
        assert_eq!(category("v = [1 2]"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = [1; 2"), Some(ErrorCategory::Syntax));
        assert_eq!(category("v = {a = 1"), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_comments() {
        let document = parse("# head\na = 1 # trailing\n\t# indented\nb = 2 #").unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(category("a = 1 # bad \u{1} char"), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_map_key_kinds() {
        let document = parse(r#""quoted key" = 1; @concat("@nil") = 2"#).unwrap();
        assert!(document.contains_key("quoted key"));
        assert!(document.contains_key("@nil"));

        assert_eq!(category("1 = a"), Some(ErrorCategory::MapKeyTypeMismatch));
        assert_eq!(category("v = {1 = a; b = 2}"), Some(ErrorCategory::MapKeyTypeMismatch));
        assert_eq!(category("v = {1.5 = a}"), Some(ErrorCategory::MapKeyTypeMismatch));
        assert_eq!(category("@nil = 1"), Some(ErrorCategory::MapKeyTypeMismatch));
        assert_eq!(category("@hex(00) = 1"), Some(ErrorCategory::MapKeyTypeMismatch));
        assert_eq!(category("v = {[] = 1}"), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_duplicates_are_aggregated() {
        let err = parse("a = 1\nb = 2\na = 3\n\"b\" = 4\n").unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::DuplicateMapKey));
        let message = err.to_string();
        assert!(message.contains("\"a\": line 1 column 1, line 3 column 1"));
        assert!(message.contains("\"b\": line 2 column 1, line 4 column 1"));

        let err = parse("m = {\n  1 = x; 0_1 = y\n}").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert!(err.to_string().contains("1: line 2 column 3, line 2 column 10"));
    }

    #[test]
    fn test_error_pointer() {
        let err = parse("a = 1\nb = (oops)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid entity. No entity starts with '('.\nLine 2, column 5:\nb = (oops)\n    ^"
        );
    }

    #[test]
    fn test_reset_allows_reparse() {
        let mut parser = Parser::new("a = 1");
        let first = parser.parse().unwrap();
        parser.reset();
        assert_eq!(parser.parse().unwrap(), first);
    }

    #[test]
    fn test_from_value() {
        #[derive(Deserialize, Debug, PartialEq)]
        enum Shape {
            Dot,
            Circle { radius: f64 },
        }

        #[derive(Deserialize, Debug, PartialEq)]
        struct Drawing {
            name: String,
            shapes: Vec<Shape>,
            digest: Vec<u8>,
            note: Option<String>,
        }

        let document = parse(
            "name = demo\nshapes = [Dot; {Circle = {radius = 1.5}}]\n\
             digest = @hex(0102)\nnote = @nil\n",
        )
        .unwrap();
        let drawing: Drawing = from_value(Value::StringMap(document)).unwrap();
        assert_eq!(
            drawing,
            Drawing {
                name: "demo".to_string(),
                shapes: vec![Shape::Dot, Shape::Circle { radius: 1.5 }],
                digest: vec![1, 2],
                note: None,
            }
        );
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("a = {}{}", "[".repeat(n), "]".repeat(n));
        assert!(parse(&nested(MAX_NESTING_DEPTH)).is_ok());

        let err = parse(&nested(MAX_NESTING_DEPTH + 1)).unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Syntax));
        assert_eq!(err.line(), Some(1));

        let err = parse(&nested(200_000)).unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Syntax));

        let depth = MAX_NESTING_DEPTH + 1;
        let maps = format!("a = {}1{}", "{b = ".repeat(depth), "}".repeat(depth));
        let err = parse(&maps).unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Syntax));
    }

    #[test]
    fn test_nesting_depth_resets_between_parses() {
        let depth = MAX_NESTING_DEPTH;
        let text = format!("a = {}{}", "[".repeat(depth), "]".repeat(depth));
        let mut parser = Parser::new(&text);
        assert!(parser.parse().is_ok());
        assert!(parser.parse().is_ok());

        let mut parser = Parser::new("a = [[[");
        assert!(parser.parse().is_err());
        assert_eq!(parser.depth, 0);
    }
}
