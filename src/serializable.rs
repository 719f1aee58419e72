//! Values accepted by the Sled serializer.
//!
//! [`SerializableValue`] is looser than [`Value`]: integers are unbounded,
//! maps are plain lists of pairs with keys of any shape, and a value can
//! defer to a [`ToSledSerializable`] adapter. The serializer checks all of
//! this while it writes, so bad input surfaces as a Sled error instead of
//! being silently narrowed here.
//!
//! Any `T: Serialize` can be converted with [`to_serializable`]:
//!
//! ```rust
//! use serde::Serialize;
//! use serde_sled::serializable::to_serializable;
//! use serde_sled::SerializableValue;
//!
//! #[derive(Serialize)]
//! struct Point { x: u64, y: u64 }
//!
//! let value = to_serializable(&Point { x: u64::MAX, y: 2 }).unwrap();
//! assert!(matches!(value, SerializableValue::Map(ref pairs) if pairs.len() == 2));
//! ```

use crate::error::ErrorCategory;
use crate::value::{MapKey, SledType};
use crate::{Error, IntMap, Result, StringMap, Value};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{ser, Serialize};
use std::fmt;
use std::sync::Arc;

/// A custom serialization adapter.
///
/// The serializer calls [`ToSledSerializable::to_sled_serializable`] and
/// writes the result in place of the adapter. The result may itself be a
/// [`SerializableValue::Custom`], in which case it is resolved again.
///
/// # Examples
///
/// ```rust
/// use serde_sled::{to_string_with_options, SerializableValue, SerializeOptions, ToSledSerializable};
///
/// #[derive(Debug)]
/// struct Version(u32, u32);
///
/// impl ToSledSerializable for Version {
///     fn to_sled_serializable(&self) -> SerializableValue {
///         SerializableValue::String(format!("v{}.{}", self.0, self.1))
///     }
/// }
///
/// let document = SerializableValue::map(vec![(
///     SerializableValue::from("release"),
///     SerializableValue::custom(Version(1, 2)),
/// )]);
/// let text = to_string_with_options(&document, SerializeOptions::minified()).unwrap();
/// assert_eq!(text, "release=v1.2");
/// ```
pub trait ToSledSerializable: fmt::Debug + Send + Sync {
    fn to_sled_serializable(&self) -> SerializableValue;
}

/// Input to the serializer.
#[derive(Clone, Debug)]
pub enum SerializableValue {
    Nil,
    Boolean(bool),
    /// Any integer. Values outside the signed 64-bit range are rejected when written.
    Integer(BigInt),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    /// Key-value pairs in output order. Keys must resolve to all strings or
    /// all integers, without repeats.
    Map(Vec<(SerializableValue, SerializableValue)>),
    List(Vec<SerializableValue>),
    Custom(Arc<dyn ToSledSerializable>),
}

impl SerializableValue {
    #[must_use]
    pub fn custom(adapter: impl ToSledSerializable + 'static) -> Self {
        SerializableValue::Custom(Arc::new(adapter))
    }

    /// Builds a map from key-value pairs, keeping their order.
    #[must_use]
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<SerializableValue>,
        V: Into<SerializableValue>,
    {
        SerializableValue::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Follows custom adapters until a plain value is reached.
    #[must_use]
    pub fn resolve(self) -> SerializableValue {
        let mut value = self;
        while let SerializableValue::Custom(adapter) = value {
            value = adapter.to_sled_serializable();
        }
        value
    }

    /// A short name for the kind of value, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            SerializableValue::Nil => "nil",
            SerializableValue::Boolean(_) => "boolean",
            SerializableValue::Integer(_) => "integer",
            SerializableValue::Float(_) => "float",
            SerializableValue::Bytes(_) => "hex",
            SerializableValue::String(_) => "string",
            SerializableValue::Map(_) => "map",
            SerializableValue::List(_) => "list",
            SerializableValue::Custom(_) => "custom",
        }
    }

    /// Converts into a [`Value`], applying the same checks as serialization.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range integers, mixed or invalid map keys and
    /// repeated map keys.
    pub fn into_value(self) -> Result<Value> {
        match self.resolve() {
            SerializableValue::Nil => Ok(Value::Nil),
            SerializableValue::Boolean(b) => Ok(Value::Boolean(b)),
            SerializableValue::Integer(n) => Ok(Value::Integer(sled_integer(&n)?)),
            SerializableValue::Float(x) => Ok(Value::Float(x)),
            SerializableValue::Bytes(b) => Ok(Value::Bytes(b)),
            SerializableValue::String(s) => Ok(Value::String(s)),
            SerializableValue::List(list) => list
                .into_iter()
                .map(SerializableValue::into_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            SerializableValue::Map(pairs) => {
                let keys = map_keys(&pairs, None)?;
                let mut strings = StringMap::new();
                let mut integers = IntMap::new();
                for (key, (_, value)) in keys.into_iter().zip(pairs) {
                    let value = value.into_value()?;
                    match key {
                        MapKey::String(s) => strings.insert(s, value),
                        MapKey::Integer(n) => integers.insert(n, value),
                    };
                }
                if integers.is_empty() {
                    Ok(Value::StringMap(strings))
                } else {
                    Ok(Value::IntMap(integers))
                }
            }
            SerializableValue::Custom(_) => Err(Error::custom("unresolved custom value")),
        }
    }
}

impl Serialize for SerializableValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        use ser::{SerializeMap as _, SerializeSeq as _};

        match self {
            SerializableValue::Nil => serializer.serialize_unit(),
            SerializableValue::Boolean(b) => serializer.serialize_bool(*b),
            SerializableValue::Integer(n) => {
                if let Ok(n) = i64::try_from(n) {
                    serializer.serialize_i64(n)
                } else if let Ok(n) = i128::try_from(n) {
                    serializer.serialize_i128(n)
                } else if let Ok(n) = u128::try_from(n) {
                    serializer.serialize_u128(n)
                } else {
                    Err(ser::Error::custom(format!("integer out of range: {}", n)))
                }
            }
            SerializableValue::Float(x) => serializer.serialize_f64(*x),
            SerializableValue::Bytes(b) => serializer.serialize_bytes(b),
            SerializableValue::String(s) => serializer.serialize_str(s),
            SerializableValue::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            SerializableValue::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for element in list {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            SerializableValue::Custom(adapter) => {
                adapter.to_sled_serializable().serialize(serializer)
            }
        }
    }
}

/// Narrows an integer to the Sled range.
pub(crate) fn sled_integer(n: &BigInt) -> Result<i64> {
    i64::try_from(n).map_err(|_| {
        Error::serialize(
            ErrorCategory::NumberRangeOverflow,
            format!(
                "Value cannot be represented by a Sled integer (overflow): {}",
                n
            ),
        )
    })
}

fn resolve_key(key: &SerializableValue) -> Result<MapKey> {
    match key {
        SerializableValue::String(s) => Ok(MapKey::String(s.clone())),
        SerializableValue::Integer(n) => Ok(MapKey::Integer(sled_integer(n)?)),
        SerializableValue::Custom(adapter) => resolve_key(&adapter.to_sled_serializable()),
        other => Err(Error::serialize(
            ErrorCategory::MapKeyTypeMismatch,
            format!(
                "Expected map key to be either a string or integer, but got {}.",
                other.kind_name()
            ),
        )),
    }
}

/// Resolves the keys of one map and checks them as a whole.
///
/// Keys must all be strings or all be integers, or all be of `required`
/// when it is given, and must not repeat.
pub(crate) fn map_keys(
    pairs: &[(SerializableValue, SerializableValue)],
    required: Option<SledType>,
) -> Result<Vec<MapKey>> {
    let keys = pairs
        .iter()
        .map(|(key, _)| resolve_key(key))
        .collect::<Result<Vec<_>>>()?;

    let expected = required.or_else(|| keys.first().map(MapKey::sled_type));
    if let Some(expected) = expected {
        if let Some(key) = keys.iter().find(|key| key.sled_type() != expected) {
            return Err(Error::serialize(
                ErrorCategory::MapKeyTypeMismatch,
                format!(
                    "Expected every key in this map to be of type {}, but got {} key {}.",
                    expected,
                    key.sled_type(),
                    key
                ),
            ));
        }
    }

    let mut tally: IndexMap<&MapKey, usize> = IndexMap::new();
    for key in &keys {
        *tally.entry(key).or_default() += 1;
    }
    let repeated: Vec<String> = tally
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(key, count)| format!("{} ({})", key, count))
        .collect();
    if !repeated.is_empty() {
        return Err(Error::serialize(
            ErrorCategory::DuplicateMapKey,
            format!(
                "Serialization would result in repeated Sled keys in the same map: {}",
                repeated.join(", ")
            ),
        ));
    }

    Ok(keys)
}

impl From<Value> for SerializableValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => SerializableValue::Nil,
            Value::Boolean(b) => SerializableValue::Boolean(b),
            Value::Integer(n) => SerializableValue::Integer(n.into()),
            Value::Float(x) => SerializableValue::Float(x),
            Value::Bytes(b) => SerializableValue::Bytes(b),
            Value::String(s) => SerializableValue::String(s),
            Value::StringMap(map) => map.into(),
            Value::IntMap(map) => map.into(),
            Value::List(list) => list.into_iter().map(SerializableValue::from).collect(),
        }
    }
}

impl From<&Value> for SerializableValue {
    fn from(value: &Value) -> Self {
        value.clone().into()
    }
}

impl From<&SerializableValue> for SerializableValue {
    fn from(value: &SerializableValue) -> Self {
        value.clone()
    }
}

impl From<StringMap> for SerializableValue {
    fn from(map: StringMap) -> Self {
        SerializableValue::map(map)
    }
}

impl From<&StringMap> for SerializableValue {
    fn from(map: &StringMap) -> Self {
        map.clone().into()
    }
}

impl From<IntMap> for SerializableValue {
    fn from(map: IntMap) -> Self {
        SerializableValue::map(map)
    }
}

impl From<Vec<SerializableValue>> for SerializableValue {
    fn from(list: Vec<SerializableValue>) -> Self {
        SerializableValue::List(list)
    }
}

impl FromIterator<SerializableValue> for SerializableValue {
    fn from_iter<I: IntoIterator<Item = SerializableValue>>(iter: I) -> Self {
        SerializableValue::List(iter.into_iter().collect())
    }
}

impl From<Vec<u8>> for SerializableValue {
    fn from(bytes: Vec<u8>) -> Self {
        SerializableValue::Bytes(bytes)
    }
}

impl From<&[u8]> for SerializableValue {
    fn from(bytes: &[u8]) -> Self {
        SerializableValue::Bytes(bytes.to_vec())
    }
}

impl From<bool> for SerializableValue {
    fn from(b: bool) -> Self {
        SerializableValue::Boolean(b)
    }
}

impl From<BigInt> for SerializableValue {
    fn from(n: BigInt) -> Self {
        SerializableValue::Integer(n)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SerializableValue {
                fn from(n: $ty) -> Self {
                    SerializableValue::Integer(BigInt::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<f32> for SerializableValue {
    fn from(x: f32) -> Self {
        SerializableValue::Float(x as f64)
    }
}

impl From<f64> for SerializableValue {
    fn from(x: f64) -> Self {
        SerializableValue::Float(x)
    }
}

impl From<&str> for SerializableValue {
    fn from(s: &str) -> Self {
        SerializableValue::String(s.to_string())
    }
}

impl From<String> for SerializableValue {
    fn from(s: String) -> Self {
        SerializableValue::String(s)
    }
}

impl From<Arc<dyn ToSledSerializable>> for SerializableValue {
    fn from(adapter: Arc<dyn ToSledSerializable>) -> Self {
        SerializableValue::Custom(adapter)
    }
}

impl<T: Into<SerializableValue>> From<Option<T>> for SerializableValue {
    fn from(option: Option<T>) -> Self {
        option.map_or(SerializableValue::Nil, Into::into)
    }
}

/// Converts any `T: Serialize` into a [`SerializableValue`].
///
/// Structs and maps become maps, sequences and tuples become lists, and
/// `None` and unit become nil. Enum variants with data are externally
/// tagged as single-pair maps.
///
/// # Errors
///
/// Only errors raised by `T`'s own `Serialize` impl are returned.
pub fn to_serializable<T: Serialize + ?Sized>(value: &T) -> Result<SerializableValue> {
    value.serialize(SerializableValueSerializer)
}

/// A serde serializer that builds a [`SerializableValue`] tree.
pub struct SerializableValueSerializer;

pub struct SerializeVec {
    vec: Vec<SerializableValue>,
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    vec: Vec<SerializableValue>,
}

pub struct SerializeMap {
    pairs: Vec<(SerializableValue, SerializableValue)>,
    current_key: Option<SerializableValue>,
}

pub struct SerializeStructVariant {
    variant: &'static str,
    pairs: Vec<(SerializableValue, SerializableValue)>,
}

fn tagged(variant: &'static str, value: SerializableValue) -> SerializableValue {
    SerializableValue::Map(vec![(variant.into(), value)])
}

impl ser::Serializer for SerializableValueSerializer {
    type Ok = SerializableValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_i8(self, v: i8) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_i128(self, v: i128) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_u8(self, v: u8) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_u128(self, v: u128) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_f32(self, v: f32) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_char(self, v: char) -> Result<SerializableValue> {
        Ok(SerializableValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<SerializableValue> {
        Ok(v.into())
    }

    fn serialize_none(self) -> Result<SerializableValue> {
        Ok(SerializableValue::Nil)
    }

    fn serialize_some<T>(self, value: &T) -> Result<SerializableValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<SerializableValue> {
        Ok(SerializableValue::Nil)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<SerializableValue> {
        Ok(SerializableValue::Nil)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<SerializableValue> {
        Ok(variant.into())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<SerializableValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<SerializableValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_serializable(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or_default()))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len.unwrap_or_default()))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            pairs: Vec::with_capacity(len),
        })
    }
}

impl SerializeVec {
    fn new(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeMap {
    fn new(capacity: usize) -> Self {
        SerializeMap {
            pairs: Vec::with_capacity(capacity),
            current_key: None,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_serializable(value)?);
        Ok(())
    }

    fn end(self) -> Result<SerializableValue> {
        Ok(SerializableValue::List(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<SerializableValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<SerializableValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_serializable(value)?);
        Ok(())
    }

    fn end(self) -> Result<SerializableValue> {
        Ok(tagged(self.variant, SerializableValue::List(self.vec)))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(to_serializable(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.pairs.push((key, to_serializable(value)?));
        Ok(())
    }

    fn end(self) -> Result<SerializableValue> {
        Ok(SerializableValue::Map(self.pairs))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pairs.push((key.into(), to_serializable(value)?));
        Ok(())
    }

    fn end(self) -> Result<SerializableValue> {
        Ok(SerializableValue::Map(self.pairs))
    }
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = SerializableValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pairs.push((key.into(), to_serializable(value)?));
        Ok(())
    }

    fn end(self) -> Result<SerializableValue> {
        Ok(tagged(self.variant, SerializableValue::Map(self.pairs)))
    }
}
