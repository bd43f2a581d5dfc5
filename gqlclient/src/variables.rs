//! Operation variables and their validation.
//!
//! GraphQL variables must be a JSON object. Rather than serializing first and
//! looking at the result (which would let `HashMap<u32, _>` through, since
//! `serde_json` stringifies integer keys), the value is walked once with a
//! shape-probing [`serde::Serializer`] that only accepts:
//!
//! - a map whose keys serialize as strings (the *mapping* variant), or
//! - a struct with named fields (the *record* variant).
//!
//! Newtype wrappers and `Some(..)` are looked through. Everything else
//! (sequences, tuples, scalars, unit, `None`, enum variants) is rejected.

use serde::ser::{self, Impossible, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{GraphQLError, Result};

/// Which of the two accepted shapes a variables value had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariablesShape {
    /// String-keyed map with arbitrary values.
    Map,
    /// Struct with named fields.
    Record,
}

/// Validated operation variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Variables {
    /// Built from a string-keyed map.
    Map(Map<String, Value>),
    /// Built from a struct.
    Record(Map<String, Value>),
}

impl Variables {
    /// Empty variables, sent as `{}`.
    pub fn empty() -> Self {
        Self::Map(Map::new())
    }

    /// Validate and convert any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let shape = validate(value)?;
        match serde_json::to_value(value).map_err(GraphQLError::Serialize)? {
            Value::Object(map) => Ok(match shape {
                VariablesShape::Map => Self::Map(map),
                VariablesShape::Record => Self::Record(map),
            }),
            // A hand-written Serialize impl can disagree with itself between passes.
            other => Err(GraphQLError::InvalidVariables(format!(
                "expected variables to serialize as an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build mapping variables from string-keyed entries.
    ///
    /// The key type is checked at compile time, so unlike [`from_serialize`]
    /// this also holds for an empty collection.
    ///
    /// [`from_serialize`]: Self::from_serialize
    pub fn from_map<K, V, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        V: Serialize,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key.into(), serde_json::to_value(value).map_err(GraphQLError::Serialize)?);
        }
        Ok(Self::Map(map))
    }

    /// The shape the variables were built from.
    pub fn shape(&self) -> VariablesShape {
        match self {
            Self::Map(_) => VariablesShape::Map,
            Self::Record(_) => VariablesShape::Record,
        }
    }

    /// The variables as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        match self {
            Self::Map(map) | Self::Record(map) => map,
        }
    }

    /// Set a single variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        match self {
            Self::Map(map) | Self::Record(map) => {
                map.insert(name.into(), value);
            }
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    /// Check if there are no variables.
    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    /// Consume into a JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Map(map) | Self::Record(map) => Value::Object(map),
        }
    }
}

impl Default for Variables {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Map<String, Value>> for Variables {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl Serialize for Variables {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_map().serialize(serializer)
    }
}

/// Check that `value` is a string-keyed map or a struct without serializing it.
///
/// Map keys are checked as they are visited. An *empty* map has no keys to
/// visit, so `HashMap::<u32, _>::new()` passes as [`VariablesShape::Map`] and
/// is sent as `{}`. Use [`Variables::from_map`] to rule out non-string keys
/// at compile time.
pub fn validate<T: Serialize + ?Sized>(value: &T) -> Result<VariablesShape> {
    value
        .serialize(ShapeProbe)
        .map_err(|e| GraphQLError::InvalidVariables(e.0))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

#[derive(Debug)]
struct ShapeError(String);

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ShapeError {}

impl ser::Error for ShapeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

macro_rules! reject_scalars {
    ($($method:ident($ty:ty) => $kind:literal;)*) => {
        $(
            fn $method(self, _v: $ty) -> std::result::Result<Self::Ok, Self::Error> {
                Err(self.reject($kind))
            }
        )*
    };
}

macro_rules! reject_compounds {
    () => {
        fn serialize_unit(self) -> std::result::Result<Self::Ok, Self::Error> {
            Err(self.reject("unit"))
        }

        fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<Self::Ok, Self::Error> {
            Err(self.reject("unit struct"))
        }

        fn serialize_newtype_variant<T: Serialize + ?Sized>(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _value: &T,
        ) -> std::result::Result<Self::Ok, Self::Error> {
            Err(self.reject("enum variant"))
        }

        fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self::SerializeSeq, Self::Error> {
            Err(self.reject("sequence"))
        }

        fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, Self::Error> {
            Err(self.reject("tuple"))
        }

        fn serialize_tuple_struct(
            self,
            _name: &'static str,
            _len: usize,
        ) -> std::result::Result<Self::SerializeTupleStruct, Self::Error> {
            Err(self.reject("tuple struct"))
        }

        fn serialize_tuple_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> std::result::Result<Self::SerializeTupleVariant, Self::Error> {
            Err(self.reject("enum variant"))
        }

        fn serialize_struct_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> std::result::Result<Self::SerializeStructVariant, Self::Error> {
            Err(self.reject("enum variant"))
        }
    };
}

/// Top-level probe: accepts maps and structs.
#[derive(Clone, Copy)]
struct ShapeProbe;

impl ShapeProbe {
    fn reject(&self, kind: &str) -> ShapeError {
        ShapeError(format!(
            "expected variables to be a string-keyed map or a struct, got {kind}"
        ))
    }
}

impl ser::Serializer for ShapeProbe {
    type Ok = VariablesShape;
    type Error = ShapeError;
    type SerializeSeq = Impossible<VariablesShape, ShapeError>;
    type SerializeTuple = Impossible<VariablesShape, ShapeError>;
    type SerializeTupleStruct = Impossible<VariablesShape, ShapeError>;
    type SerializeTupleVariant = Impossible<VariablesShape, ShapeError>;
    type SerializeMap = MapKeys;
    type SerializeStruct = RecordFields;
    type SerializeStructVariant = Impossible<VariablesShape, ShapeError>;

    reject_scalars! {
        serialize_bool(bool) => "bool";
        serialize_i8(i8) => "integer";
        serialize_i16(i16) => "integer";
        serialize_i32(i32) => "integer";
        serialize_i64(i64) => "integer";
        serialize_u8(u8) => "integer";
        serialize_u16(u16) => "integer";
        serialize_u32(u32) => "integer";
        serialize_u64(u64) => "integer";
        serialize_f32(f32) => "float";
        serialize_f64(f64) => "float";
        serialize_char(char) => "char";
        serialize_str(&str) => "string";
        serialize_bytes(&[u8]) => "bytes";
    }

    reject_compounds!();

    fn serialize_none(self) -> std::result::Result<Self::Ok, Self::Error> {
        Err(self.reject("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> std::result::Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> std::result::Result<Self::Ok, Self::Error> {
        Err(self.reject("enum variant"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self::SerializeMap, Self::Error> {
        Ok(MapKeys)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, Self::Error> {
        Ok(RecordFields)
    }
}

/// Checks every key of a map; values are unconstrained.
struct MapKeys;

impl ser::SerializeMap for MapKeys {
    type Ok = VariablesShape;
    type Error = ShapeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> std::result::Result<(), Self::Error> {
        key.serialize(KeyProbe)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, _value: &T) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    fn end(self) -> std::result::Result<Self::Ok, Self::Error> {
        Ok(VariablesShape::Map)
    }
}

struct RecordFields;

impl ser::SerializeStruct for RecordFields {
    type Ok = VariablesShape;
    type Error = ShapeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    fn end(self) -> std::result::Result<Self::Ok, Self::Error> {
        Ok(VariablesShape::Record)
    }
}

/// Map key probe: accepts strings and unit enum variants (which serialize as their name).
#[derive(Clone, Copy)]
struct KeyProbe;

impl KeyProbe {
    fn reject(&self, kind: &str) -> ShapeError {
        ShapeError(format!("expected map key to be string, got {kind}"))
    }
}

impl ser::Serializer for KeyProbe {
    type Ok = ();
    type Error = ShapeError;
    type SerializeSeq = Impossible<(), ShapeError>;
    type SerializeTuple = Impossible<(), ShapeError>;
    type SerializeTupleStruct = Impossible<(), ShapeError>;
    type SerializeTupleVariant = Impossible<(), ShapeError>;
    type SerializeMap = Impossible<(), ShapeError>;
    type SerializeStruct = Impossible<(), ShapeError>;
    type SerializeStructVariant = Impossible<(), ShapeError>;

    reject_scalars! {
        serialize_bool(bool) => "bool";
        serialize_i8(i8) => "integer";
        serialize_i16(i16) => "integer";
        serialize_i32(i32) => "integer";
        serialize_i64(i64) => "integer";
        serialize_u8(u8) => "integer";
        serialize_u16(u16) => "integer";
        serialize_u32(u32) => "integer";
        serialize_u64(u64) => "integer";
        serialize_f32(f32) => "float";
        serialize_f64(f64) => "float";
        serialize_char(char) => "char";
        serialize_bytes(&[u8]) => "bytes";
    }

    reject_compounds!();

    fn serialize_str(self, _v: &str) -> std::result::Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn serialize_none(self) -> std::result::Result<Self::Ok, Self::Error> {
        Err(self.reject("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> std::result::Result<Self::Ok, Self::Error> {
        Err(self.reject("option"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> std::result::Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self::SerializeMap, Self::Error> {
        Err(self.reject("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, Self::Error> {
        Err(self.reject("struct"))
    }
}
