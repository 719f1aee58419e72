//! # serde_sled
//!
//! A Serde-compatible parser and serializer for Sled, a human-friendly text
//! serialization format.
//!
//! ## What is Sled?
//!
//! A Sled document is a map of string keys to values. Values are nil,
//! booleans, 64-bit integers, floats, bytes, strings, maps and lists. The
//! syntax stays out of the way: most strings need no quotes, pairs are
//! separated by line breaks or `;`, and comments start with `#`.
//!
//! ```text
//! # Family record
//! name = "John Doe"
//! age = 50
//! children = [
//!   Jane
//!   Jimmy
//! ]
//! digest = @hex(dead_beef)
//! ```
//!
//! ## Key Features
//!
//! - **Serde Compatible**: Works with existing Rust types via `#[derive(Serialize, Deserialize)]`
//! - **Precise Errors**: Every parse error names the line and column and points at the offending text
//! - **Aggregated Duplicates**: All repeated keys of a map are reported in a single error
//! - **Two Layouts**: Canonical multi-line output and a minified single line
//! - **Checked Output**: The serializer rejects what Sled cannot represent instead of silently changing it
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! serde_sled = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Basic Serialization and Deserialization
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_sled::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User {
//!     id: 123,
//!     name: "Alice".to_string(),
//!     active: true,
//! };
//!
//! let sled = to_string(&user).unwrap();
//! assert_eq!(sled, "id = 123\nname = Alice\nactive = @true\n");
//!
//! let user_back: User = from_str(&sled).unwrap();
//! assert_eq!(user, user_back);
//! ```
//!
//! ### Parsing Without a Schema
//!
//! ```rust
//! use serde_sled::{parse, Value};
//!
//! let doc = parse("ports = [80; 443]\nenabled = @true").unwrap();
//! assert_eq!(doc.get("enabled"), Some(&Value::Boolean(true)));
//! assert_eq!(doc.get("ports").and_then(Value::as_list).map(Vec::len), Some(2));
//! ```
//!
//! ### Dynamic Values with sled! Macro
//!
//! ```rust
//! use serde_sled::{sled, Value};
//!
//! let data = sled!({
//!     "name": "Alice",
//!     "age": 30,
//!     "tags": ["rust", "serde"]
//! });
//!
//! if let Value::StringMap(map) = data {
//!     assert_eq!(map.get("name").and_then(Value::as_str), Some("Alice"));
//! }
//! ```
//!
//! ## Errors
//!
//! Format violations are reported as [`Error::Sled`] with an
//! [`ErrorCategory`]. Parse errors carry the text of the offending line with
//! a `^` pointer under the problem:
//!
//! ```rust
//! use serde_sled::{parse, ErrorCategory};
//!
//! let err = parse("a = [1; 2").unwrap_err();
//! assert_eq!(err.category(), Some(ErrorCategory::Syntax));
//! assert_eq!(err.line(), Some(1));
//! ```
//!
//! ## Logging
//!
//! The parser and serializer emit `tracing` events at `debug` and `trace`
//! level. Install any `tracing` subscriber to see them.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - No panics in public API
//! - Nesting deeper than [`spec::MAX_NESTING_DEPTH`] is an error, not a stack overflow

pub mod de;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod ser;
pub mod serializable;
pub mod snapshot;
pub mod spec;
pub mod value;

pub use de::{from_value, Parser};
pub use error::{Error, ErrorCategory, Result};
pub use map::{IntMap, SledMap, StringMap};
pub use options::{
    DecimalMark, ExponentPrefix, HexSeparator, Layout, LineSeparator, QuoteMark, SerializeOptions,
};
pub use ser::Serializer;
pub use serializable::{SerializableValue, SerializableValueSerializer, ToSledSerializable};
pub use snapshot::ParseSnapshot;
pub use value::{Concrete, MapKey, SledType, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Parse Sled text into its top-level map.
///
/// # Examples
///
/// ```rust
/// use serde_sled::{parse, Value};
///
/// let doc = parse("greeting = hello").unwrap();
/// assert_eq!(doc.get("greeting"), Some(&Value::from("hello")));
/// ```
///
/// # Errors
///
/// Returns [`Error::Sled`] if the text is not valid Sled. Error messages
/// include line and column information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(text: &str) -> Result<StringMap> {
    Parser::new(text).parse()
}

/// Serialize any `T: Serialize` to a canonical Sled string.
///
/// `T` must serialize as a map with string keys, such as a struct.
///
/// # Examples
///
/// ```rust
/// use serde_sled::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: -2 };
/// assert_eq!(to_string(&point).unwrap(), "x = 1\ny = -2\n");
/// ```
///
/// # Errors
///
/// Returns an error if the value is not a map with string keys, or if it
/// holds something Sled cannot represent, such as an integer outside the
/// signed 64-bit range.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, SerializeOptions::canonical())
}

/// Serialize any `T: Serialize` to a minified Sled string.
///
/// Minified output is a single line with `;` between pairs and no trailing
/// line separator.
///
/// # Examples
///
/// ```rust
/// use serde_sled::to_string_minified;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: 2 };
/// assert_eq!(to_string_minified(&point).unwrap(), "x=1;y=2");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_minified<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, SerializeOptions::minified())
}

/// Serialize any `T: Serialize` to a Sled string with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_sled::{to_string_with_options, QuoteMark, SerializeOptions};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Note { text: String }
///
/// let note = Note { text: "hi there".to_string() };
/// let options = SerializeOptions::new()
///     .with_quote_mark(QuoteMark::Single)
///     .with_indent("\t");
/// assert_eq!(to_string_with_options(&note, options).unwrap(), "text = 'hi there'\n");
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if the options are inconsistent, and
/// otherwise fails as [`to_string`] does.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: SerializeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Serializer::new(options)?.serialize(value)
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde_sled::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: 2 };
/// let value: Value = to_value(&point).unwrap();
/// assert!(value.is_string_map());
/// ```
///
/// # Errors
///
/// Returns an error if the value has no Sled equivalent: integers outside
/// the signed 64-bit range, or maps with mixed or repeated keys.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    serializable::to_serializable(value)?.into_value()
}

/// Serialize any `T: Serialize` to a writer in canonical Sled format.
///
/// # Examples
///
/// ```rust
/// use serde_sled::to_writer;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: 2 };
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &point).unwrap();
/// assert_eq!(buffer, b"x = 1\ny = 2\n");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, SerializeOptions::canonical())
}

/// Serialize any `T: Serialize` to a writer in Sled format with custom options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: SerializeOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let sled_string = to_string_with_options(value, options)?;
    writer
        .write_all(sled_string.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Deserialize an instance of type `T` from a string of Sled text.
///
/// # Examples
///
/// ```rust
/// use serde_sled::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let sled = "x = 1\ny = 2";
/// let point: Point = from_str(sled).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid Sled or cannot be deserialized
/// to type `T`. Error messages include line and column information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(Value::StringMap(parse(s)?))
}

/// Deserialize an instance of type `T` from an I/O stream of Sled.
///
/// # Examples
///
/// ```rust
/// use serde_sled::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let sled_bytes = b"x = 1\ny = 2";
/// let cursor = Cursor::new(sled_bytes);
/// let point: Point = from_reader(cursor).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails, the input is not valid
/// Sled, or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from bytes of Sled text.
///
/// # Examples
///
/// ```rust
/// use serde_sled::from_slice;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let sled_bytes = b"x = 1; y = 2";
/// let point: Point = from_slice(sled_bytes).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid Sled,
/// or cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}
