//! Tagged JSON: plain JSON extended with a few non-standard types.
//!
//! Values JSON has no native form for are written as objects carrying an
//! `"@"` type tag:
//!
//! ```text
//! {"@": "bytes",  "data": "<base64>"}
//! {"@": "set",    "data": [..]}
//! {"@": "tuple",  "data": [..]}
//! {"@": "date",   "year": 1970, "month": 1, "day": 1}
//! {"@": "markup", "data": "<b>trusted</b>"}
//! {"@": "dict",   "data": [[key, value], ..]}
//! ```
//!
//! The `dict` form is used for maps with non-string keys and for string maps
//! that themselves contain an `"@"` key.

use crate::errors::JsonError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use time::{Date, Month};

const TAG: &str = "@";

/// A decoded tagged JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Tagged {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Tagged>),
    Object(BTreeMap<String, Tagged>),
    Bytes(Vec<u8>),
    /// Unordered collection. Kept as a list, duplicates removed on decode.
    Set(Vec<Tagged>),
    Tuple(Vec<Tagged>),
    /// Calendar date, always valid.
    Date(Date),
    /// Trusted HTML.
    Markup(String),
    /// Map with arbitrary keys, in insertion order.
    Map(Vec<(Tagged, Tagged)>),
}

impl Tagged {
    /// Name written under the `"@"` key, if the value needs one.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Tagged::Bytes(_) => Some("bytes"),
            Tagged::Set(_) => Some("set"),
            Tagged::Tuple(_) => Some("tuple"),
            Tagged::Date(_) => Some("date"),
            Tagged::Markup(_) => Some("markup"),
            Tagged::Map(_) => Some("dict"),
            Tagged::Object(map) if map.contains_key(TAG) => Some("dict"),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tagged::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tagged::String(s) | Tagged::Markup(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Tagged::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tagged::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tagged::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Items of a list, tuple or set.
    pub fn as_items(&self) -> Option<&[Tagged]> {
        match self {
            Tagged::List(items) | Tagged::Tuple(items) | Tagged::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Member of an object by key.
    pub fn get(&self, key: &str) -> Option<&Tagged> {
        match self {
            Tagged::Object(map) => map.get(key),
            Tagged::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Tagged {
    fn from(b: bool) -> Self {
        Tagged::Bool(b)
    }
}

impl From<i64> for Tagged {
    fn from(n: i64) -> Self {
        Tagged::Number(n.into())
    }
}

impl From<i32> for Tagged {
    fn from(n: i32) -> Self {
        Tagged::Number(n.into())
    }
}

impl From<u64> for Tagged {
    fn from(n: u64) -> Self {
        Tagged::Number(n.into())
    }
}

impl From<f64> for Tagged {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Tagged::Null, Tagged::Number)
    }
}

impl From<&str> for Tagged {
    fn from(s: &str) -> Self {
        Tagged::String(s.to_string())
    }
}

impl From<String> for Tagged {
    fn from(s: String) -> Self {
        Tagged::String(s)
    }
}

impl<T: Into<Tagged>> From<Vec<T>> for Tagged {
    fn from(items: Vec<T>) -> Self {
        Tagged::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Tagged>> From<Option<T>> for Tagged {
    fn from(value: Option<T>) -> Self {
        value.map_or(Tagged::Null, Into::into)
    }
}

impl fmt::Display for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dumps(self))
    }
}

impl Serialize for Tagged {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tagged {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode(value).map_err(serde::de::Error::custom)
    }
}

/// Convert a tagged value into plain JSON.
pub fn encode(data: &Tagged) -> Value {
    match data {
        Tagged::Null => Value::Null,
        Tagged::Bool(b) => Value::Bool(*b),
        Tagged::Number(n) => Value::Number(n.clone()),
        Tagged::String(s) => Value::String(s.clone()),
        Tagged::List(items) => Value::Array(items.iter().map(encode).collect()),
        Tagged::Object(map) if map.contains_key(TAG) => {
            let pairs = map
                .iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), encode(v)]))
                .collect();
            tagged("dict", [("data", Value::Array(pairs))])
        }
        Tagged::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode(v)))
                .collect(),
        ),
        Tagged::Bytes(bytes) => tagged("bytes", [("data", Value::String(BASE64.encode(bytes)))]),
        Tagged::Set(items) => tagged("set", [("data", items.iter().map(encode).collect())]),
        Tagged::Tuple(items) => tagged("tuple", [("data", items.iter().map(encode).collect())]),
        Tagged::Date(date) => tagged(
            "date",
            [
                ("year", Value::from(date.year())),
                ("month", Value::from(u8::from(date.month()))),
                ("day", Value::from(date.day())),
            ],
        ),
        Tagged::Markup(s) => tagged("markup", [("data", Value::String(s.clone()))]),
        Tagged::Map(pairs) => {
            let pairs = pairs
                .iter()
                .map(|(k, v)| Value::Array(vec![encode(k), encode(v)]))
                .collect();
            tagged("dict", [("data", Value::Array(pairs))])
        }
    }
}

fn tagged<const N: usize>(name: &str, fields: [(&str, Value); N]) -> Value {
    let mut obj = Map::new();
    obj.insert(TAG.to_string(), Value::String(name.to_string()));
    for (key, value) in fields {
        obj.insert(key.to_string(), value);
    }
    Value::Object(obj)
}

/// Convert plain JSON back into a tagged value, recursively.
pub fn decode(data: Value) -> Result<Tagged, JsonError> {
    Ok(match data {
        Value::Null => Tagged::Null,
        Value::Bool(b) => Tagged::Bool(b),
        Value::Number(n) => Tagged::Number(n),
        Value::String(s) => Tagged::String(s),
        Value::Array(items) => Tagged::List(decode_items(items)?),
        Value::Object(mut obj) => match obj.remove(TAG) {
            None => Tagged::Object(
                obj.into_iter()
                    .map(|(k, v)| Ok((k, decode(v)?)))
                    .collect::<Result<_, JsonError>>()?,
            ),
            Some(Value::String(name)) => decode_tagged(&name, obj)?,
            Some(other) => return Err(JsonError::UnknownType(other.to_string())),
        },
    })
}

fn decode_items(items: Vec<Value>) -> Result<Vec<Tagged>, JsonError> {
    items.into_iter().map(decode).collect()
}

fn decode_tagged(name: &str, mut obj: Map<String, Value>) -> Result<Tagged, JsonError> {
    match name {
        "bytes" => {
            let data = take_string(name, &mut obj)?;
            BASE64
                .decode(data.as_bytes())
                .map(Tagged::Bytes)
                .map_err(|e| JsonError::malformed(name, e.to_string()))
        }
        "set" => {
            let mut unique: Vec<Tagged> = Vec::new();
            for item in decode_items(take_array(name, &mut obj)?)? {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            Ok(Tagged::Set(unique))
        }
        "tuple" => Ok(Tagged::Tuple(decode_items(take_array(name, &mut obj)?)?)),
        "markup" => Ok(Tagged::Markup(take_string(name, &mut obj)?)),
        "date" => {
            let year = take_int(name, &mut obj, "year")?;
            let month = take_int(name, &mut obj, "month")?;
            let day = take_int(name, &mut obj, "day")?;
            let out_of_range =
                |field: &str| JsonError::malformed(name, format!("{field} out of range"));
            let year = i32::try_from(year).map_err(|_| out_of_range("year"))?;
            let month = u8::try_from(month)
                .ok()
                .and_then(|m| Month::try_from(m).ok())
                .ok_or_else(|| out_of_range("month"))?;
            let day = u8::try_from(day).map_err(|_| out_of_range("day"))?;
            Date::from_calendar_date(year, month, day)
                .map(Tagged::Date)
                .map_err(|e| JsonError::malformed(name, e.to_string()))
        }
        "dict" => decode_dict(take_array(name, &mut obj)?),
        other => Err(JsonError::UnknownType(other.to_string())),
    }
}

/// Maps whose keys are all strings come back as `Object`.
fn decode_dict(items: Vec<Value>) -> Result<Tagged, JsonError> {
    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                let (Some(k), Some(v)) = (pair.next(), pair.next()) else {
                    return Err(JsonError::malformed("dict", "expected [key, value] pairs"));
                };
                pairs.push((decode(k)?, decode(v)?));
            }
            _ => return Err(JsonError::malformed("dict", "expected [key, value] pairs")),
        }
    }

    if pairs.iter().all(|(k, _)| matches!(k, Tagged::String(_))) {
        let map = pairs
            .into_iter()
            .filter_map(|(k, v)| match k {
                Tagged::String(k) => Some((k, v)),
                _ => None,
            })
            .collect();
        return Ok(Tagged::Object(map));
    }
    Ok(Tagged::Map(pairs))
}

fn take_array(kind: &str, obj: &mut Map<String, Value>) -> Result<Vec<Value>, JsonError> {
    match obj.remove("data") {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(JsonError::malformed(kind, "data must be a list")),
        None => Err(JsonError::malformed(kind, "missing data")),
    }
}

fn take_string(kind: &str, obj: &mut Map<String, Value>) -> Result<String, JsonError> {
    match obj.remove("data") {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(JsonError::malformed(kind, "data must be a string")),
        None => Err(JsonError::malformed(kind, "missing data")),
    }
}

fn take_int(kind: &str, obj: &mut Map<String, Value>, field: &str) -> Result<i64, JsonError> {
    obj.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| JsonError::malformed(kind, format!("{field} must be an integer")))
}

/// Tagged JSON text for `data`.
pub fn dumps(data: &Tagged) -> String {
    encode(data).to_string()
}

/// Parse tagged JSON text.
pub fn loads(text: &str) -> Result<Tagged, JsonError> {
    let value: Value = serde_json::from_str(text).map_err(|e| JsonError::Syntax(e.to_string()))?;
    decode(value)
}
