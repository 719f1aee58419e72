//! Dynamic value representation for Sled data.
//!
//! This module provides the [`Value`] enum which represents any Sled entity,
//! along with the smaller types the parser and serializer share:
//!
//! - [`Value`]: nil, boolean, integer, float, bytes, string, string-keyed map,
//!   integer-keyed map, or list
//! - [`Concrete`]: the scalar subset of [`Value`]
//! - [`MapKey`]: a key of either kind, used when both kinds must be handled together
//! - [`SledType`]: the type tag reported in parse metadata and error messages
//!
//! ## Creating Values
//!
//! ```rust
//! use serde_sled::{sled, Value};
//!
//! let nil = Value::Nil;
//! let boolean = Value::from(true);
//! let number = Value::from(42);
//! let text = Value::from("hello");
//! let digest = Value::bytes(vec![0xde, 0xad]);
//!
//! let map = sled!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(map.is_string_map());
//! ```
//!
//! ## Extracting Values
//!
//! ```rust
//! use serde_sled::Value;
//! use std::convert::TryFrom;
//!
//! let value = Value::from(42);
//! assert!(value.is_integer());
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use crate::{IntMap, StringMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamically-typed representation of any Sled entity.
///
/// Equality treats two NaN floats as equal so that a document containing
/// `@nan` compares equal to itself after a round trip.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    StringMap(StringMap),
    IntMap(IntMap),
    List(Vec<Value>),
}

/// The scalar entities.
#[derive(Clone, Debug)]
pub enum Concrete {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
}

/// A map key of either kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    String(String),
    Integer(i64),
}

/// The type of a parsed entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SledType {
    Nil,
    Boolean,
    Integer,
    Float,
    Hex,
    String,
    StringMap,
    IntMap,
    List,
}

impl SledType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SledType::Nil => "nil",
            SledType::Boolean => "boolean",
            SledType::Integer => "integer",
            SledType::Float => "float",
            SledType::Hex => "hex",
            SledType::String => "string",
            SledType::StringMap => "smap",
            SledType::IntMap => "imap",
            SledType::List => "list",
        }
    }

    /// Returns `true` for the two types a map key may have.
    #[must_use]
    pub const fn is_key_type(self) -> bool {
        matches!(self, SledType::String | SledType::Integer)
    }
}

impl fmt::Display for SledType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl MapKey {
    #[must_use]
    pub const fn sled_type(&self) -> SledType {
        match self {
            MapKey::String(_) => SledType::String,
            MapKey::Integer(_) => SledType::Integer,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::String(s) => write!(f, "{:?}", s),
            MapKey::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for MapKey {
    fn from(value: String) -> Self {
        MapKey::String(value)
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::String(value.to_string())
    }
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::Integer(value)
    }
}

impl Concrete {
    #[must_use]
    pub const fn sled_type(&self) -> SledType {
        match self {
            Concrete::Nil => SledType::Nil,
            Concrete::Boolean(_) => SledType::Boolean,
            Concrete::Integer(_) => SledType::Integer,
            Concrete::Float(_) => SledType::Float,
            Concrete::Bytes(_) => SledType::Hex,
            Concrete::String(_) => SledType::String,
        }
    }
}

impl From<Concrete> for Value {
    fn from(value: Concrete) -> Self {
        match value {
            Concrete::Nil => Value::Nil,
            Concrete::Boolean(b) => Value::Boolean(b),
            Concrete::Integer(n) => Value::Integer(n),
            Concrete::Float(x) => Value::Float(x),
            Concrete::Bytes(b) => Value::Bytes(b),
            Concrete::String(s) => Value::String(s),
        }
    }
}

impl From<MapKey> for Value {
    fn from(value: MapKey) -> Self {
        match value {
            MapKey::String(s) => Value::String(s),
            MapKey::Integer(n) => Value::Integer(n),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::StringMap(a), Value::StringMap(b)) => a == b,
            (Value::IntMap(a), Value::IntMap(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a byte-string value.
    #[must_use]
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }

    #[must_use]
    pub const fn sled_type(&self) -> SledType {
        match self {
            Value::Nil => SledType::Nil,
            Value::Boolean(_) => SledType::Boolean,
            Value::Integer(_) => SledType::Integer,
            Value::Float(_) => SledType::Float,
            Value::Bytes(_) => SledType::Hex,
            Value::String(_) => SledType::String,
            Value::StringMap(_) => SledType::StringMap,
            Value::IntMap(_) => SledType::IntMap,
            Value::List(_) => SledType::List,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string_map(&self) -> bool {
        matches!(self, Value::StringMap(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_int_map(&self) -> bool {
        matches!(self, Value::IntMap(_))
    }

    /// Returns `true` for maps of either key kind.
    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::StringMap(_) | Value::IntMap(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Returns `true` for the scalar entities.
    #[inline]
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !matches!(self, Value::StringMap(_) | Value::IntMap(_) | Value::List(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_sled::Value;
    ///
    /// assert_eq!(Value::Boolean(true).as_bool(), Some(true));
    /// assert_eq!(Value::from(42).as_bool(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// If the value is a float, returns it. Integers are not converted.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_sled::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_string_map(&self) -> Option<&StringMap> {
        match self {
            Value::StringMap(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_int_map(&self) -> Option<&IntMap> {
        match self {
            Value::IntMap(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Converts a scalar value into a [`Concrete`], or returns `None` for
    /// maps and lists.
    #[must_use]
    pub fn into_concrete(self) -> Option<Concrete> {
        match self {
            Value::Nil => Some(Concrete::Nil),
            Value::Boolean(b) => Some(Concrete::Boolean(b)),
            Value::Integer(n) => Some(Concrete::Integer(n)),
            Value::Float(x) => Some(Concrete::Float(x)),
            Value::Bytes(b) => Some(Concrete::Bytes(b)),
            Value::String(s) => Some(Concrete::String(s)),
            Value::StringMap(_) | Value::IntMap(_) | Value::List(_) => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::String(s) => serializer.serialize_str(s),
            Value::StringMap(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    state.serialize_entry(k, v)?;
                }
                state.end()
            }
            Value::IntMap(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    state.serialize_entry(k, v)?;
                }
                state.end()
            }
            Value::List(list) => {
                let mut state = serializer.serialize_seq(Some(list.len()))?;
                for element in list {
                    state.serialize_element(element)?;
                }
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct MapKeyVisitor;

        impl<'de> Visitor<'de> for MapKeyVisitor {
            type Value = MapKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer map key")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(MapKey::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(MapKey::Integer)
                    .map_err(|_| E::custom(format!("map key {} is out of range", value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(MapKey::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(MapKey::String(value))
            }
        }

        deserializer.deserialize_any(MapKeyVisitor)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid Sled value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Boolean(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value).map(Value::Integer).map_err(|_| {
                    E::custom(format!(
                        "value cannot be represented by a Sled integer: {}",
                        value
                    ))
                })
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Nil)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Nil)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::List(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut strings = StringMap::new();
                let mut integers = IntMap::new();
                while let Some((key, value)) = map.next_entry::<MapKey, Value>()? {
                    match key {
                        MapKey::String(s) => strings.insert(s, value),
                        MapKey::Integer(n) => integers.insert(n, value),
                    };
                    if !strings.is_empty() && !integers.is_empty() {
                        return Err(de::Error::custom(
                            "map keys must be either all strings or all integers",
                        ));
                    }
                }
                if integers.is_empty() {
                    Ok(Value::StringMap(strings))
                } else {
                    Ok(Value::IntMap(integers))
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Integer(n) => Ok(n),
            _ => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                value.sled_type()
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Integer(n) => Ok(n as f64),
            _ => Err(crate::Error::custom(format!(
                "expected float, found {}",
                value.sled_type()
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected boolean, found {}",
                value.sled_type()
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {}",
                value.sled_type()
            ))),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected hex, found {}",
                value.sled_type()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<StringMap> for Value {
    fn from(value: StringMap) -> Self {
        Value::StringMap(value)
    }
}

impl From<IntMap> for Value {
    fn from(value: IntMap) -> Self {
        Value::IntMap(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn test_tryfrom_i64() {
        let result: i64 = TryFrom::try_from(Value::Integer(42)).unwrap();
        assert_eq!(result, 42);

        assert!(i64::try_from(Value::Float(42.0)).is_err());
        assert!(i64::try_from(Value::from("test")).is_err());
    }

    #[test]
    fn test_tryfrom_f64() {
        let result: f64 = TryFrom::try_from(Value::Float(3.5)).unwrap();
        assert_eq!(result, 3.5);

        let result: f64 = TryFrom::try_from(Value::Integer(42)).unwrap();
        assert_eq!(result, 42.0);
    }

    #[test]
    fn test_tryfrom_bytes_and_string() {
        let bytes: Vec<u8> = Vec::try_from(Value::bytes(vec![1, 2])).unwrap();
        assert_eq!(bytes, vec![1, 2]);

        let err = String::try_from(Value::bytes(vec![1])).unwrap_err();
        assert!(err.to_string().contains("found hex"));
    }

    #[test]
    fn test_nan_equality() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(1.0), Value::Integer(1));
        assert_eq!(
            Value::List(vec![Value::Float(f64::NAN)]),
            Value::List(vec![Value::Float(f64::NAN)])
        );
    }

    #[test]
    fn test_sled_types() {
        assert_eq!(Value::Nil.sled_type(), SledType::Nil);
        assert_eq!(Value::bytes(vec![]).sled_type(), SledType::Hex);
        assert_eq!(Value::from(IntMap::new()).sled_type(), SledType::IntMap);
        assert_eq!(SledType::StringMap.to_string(), "smap");
        assert!(SledType::Integer.is_key_type());
        assert!(!SledType::Float.is_key_type());
    }

    #[test]
    fn test_into_concrete() {
        assert!(matches!(
            Value::from("a").into_concrete(),
            Some(Concrete::String(_))
        ));
        assert!(Value::List(vec![]).into_concrete().is_none());
        assert_eq!(Value::from(Concrete::Integer(3)), Value::Integer(3));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Nil);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn test_map_key_display() {
        assert_eq!(MapKey::from("a b").to_string(), "\"a b\"");
        assert_eq!(MapKey::from(-4).to_string(), "-4");
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, 2.5, null, true]}"#).unwrap();
        let map = value.as_string_map().unwrap();
        assert_eq!(
            map.get("a"),
            Some(&Value::List(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::Nil,
                Value::Boolean(true),
            ]))
        );
    }

    #[test]
    fn test_const_is_methods() {
        const fn check_nil(v: &Value) -> bool {
            v.is_nil()
        }

        assert!(check_nil(&Value::Nil));
        assert!(Value::from(IntMap::new()).is_map());
        assert!(!Value::List(vec![]).is_concrete());
    }
}
