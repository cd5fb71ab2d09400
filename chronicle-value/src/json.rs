//! JSON encoding for [`Variant`], in the two forms a foreign record may use:
//!
//! - **Tagged**: `["i", 10]`, `["d", 1.5]`, `["b", true]`, `["s", "x"]`,
//!   `["p", [1.0, 2.0]]`; arrays use `"ai"`, `"ad"`, `"ab"`, `"as"`, `"ap"`.
//! - **Coalesced**: bare JSON values, inferred per the rules in
//!   [`from_coalesced`].

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use serde_json::Value as Json;

use crate::atom::{Atom, AtomType};
use crate::point::Point;
use crate::variant::{Array, Variant};

/// Errors raised while decoding a JSON-encoded [`Variant`].
#[derive(Debug, Clone, PartialEq)]
pub enum JsonVariantError {
    /// The JSON shape did not match any tagged or coalesced encoding.
    UnrecognizedShape(String),
    /// A tagged array mixed atom types, or an array was empty with no type
    /// hint.
    HeterogeneousArray,
    /// The deprecated `"10x20"` point string form was encountered. It is
    /// rejected on read, unlike `"[x,y]"` which remains accepted.
    DeprecatedPointForm(String),
}

impl core::fmt::Display for JsonVariantError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            JsonVariantError::UnrecognizedShape(s) => {
                write!(f, "not a recognized variant encoding: {s}")
            }
            JsonVariantError::HeterogeneousArray => {
                f.write_str("array atoms are not all of the same type")
            }
            JsonVariantError::DeprecatedPointForm(s) => {
                write!(f, "the \"10x20\" point form is no longer accepted: {s:?}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for JsonVariantError {}

/// Encodes a [`Variant`] using the tagged form (`["i", 10]`, ...).
pub fn to_tagged(value: &Variant) -> Json {
    match value {
        Variant::Atom(Atom::Int(v)) => Json::Array(vec!["i".into(), (*v).into()]),
        Variant::Atom(Atom::Double(v)) => Json::Array(vec!["d".into(), json_f64(*v)]),
        Variant::Atom(Atom::Bool(v)) => Json::Array(vec!["b".into(), (*v).into()]),
        Variant::Atom(Atom::String(v)) => Json::Array(vec!["s".into(), v.clone().into()]),
        Variant::Atom(Atom::Point(p)) => Json::Array(vec!["p".into(), point_json(*p)]),
        Variant::Array(arr) => tagged_array(arr),
    }
}

fn json_f64(v: f64) -> Json {
    serde_json::Number::from_f64(v).map(Json::Number).unwrap_or(Json::Null)
}

fn point_json(p: Point) -> Json {
    Json::Array(vec![json_f64(p.x), json_f64(p.y)])
}

fn tagged_array(arr: &Array) -> Json {
    let (tag, items): (&str, Vec<Json>) = match arr {
        Array::Int(v) => ("ai", v.iter().map(|x| (*x).into()).collect()),
        Array::Double(v) => ("ad", v.iter().map(|x| json_f64(*x)).collect()),
        Array::Bool(v) => ("ab", v.iter().map(|x| (*x).into()).collect()),
        Array::String(v) => ("as", v.iter().map(|x| x.clone().into()).collect()),
        Array::Point(v) => ("ap", v.iter().map(|p| point_json(*p)).collect()),
    };
    Json::Array(vec![tag.into(), Json::Array(items)])
}

/// Decodes a [`Variant`] from its tagged encoding.
pub fn from_tagged(json: &Json) -> Result<Variant, JsonVariantError> {
    let items = json
        .as_array()
        .filter(|a| a.len() == 2)
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))?;
    let tag = items[0]
        .as_str()
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))?;
    let payload = &items[1];
    match tag {
        "i" => Ok(Variant::int(as_i64(payload)?)),
        "d" => Ok(Variant::double(as_f64(payload)?)),
        "b" => Ok(Variant::Atom(Atom::Bool(as_bool(payload)?))),
        "s" => Ok(Variant::Atom(Atom::String(as_string(payload)?))),
        "p" => Ok(Variant::Atom(Atom::Point(as_point(payload)?))),
        "ai" => Ok(Variant::Array(Array::Int(as_vec(payload, as_i64)?))),
        "ad" => Ok(Variant::Array(Array::Double(as_vec(payload, as_f64)?))),
        "ab" => Ok(Variant::Array(Array::Bool(as_vec(payload, as_bool)?))),
        "as" => Ok(Variant::Array(Array::String(as_vec(payload, as_string)?))),
        "ap" => Ok(Variant::Array(Array::Point(as_vec(payload, as_point)?))),
        _ => Err(JsonVariantError::UnrecognizedShape(json.to_string())),
    }
}

fn as_vec<T>(
    json: &Json,
    item: impl Fn(&Json) -> Result<T, JsonVariantError>,
) -> Result<Vec<T>, JsonVariantError> {
    json.as_array()
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))?
        .iter()
        .map(item)
        .collect()
}

fn as_i64(json: &Json) -> Result<i64, JsonVariantError> {
    json.as_i64()
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))
}

fn as_f64(json: &Json) -> Result<f64, JsonVariantError> {
    json.as_f64()
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))
}

fn as_bool(json: &Json) -> Result<bool, JsonVariantError> {
    json.as_bool()
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))
}

fn as_string(json: &Json) -> Result<String, JsonVariantError> {
    json.as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))
}

fn as_point(json: &Json) -> Result<Point, JsonVariantError> {
    if let Some(items) = json.as_array() {
        if items.len() == 2 {
            return Ok(Point::new(as_f64(&items[0])?, as_f64(&items[1])?));
        }
    }
    if let Some(s) = json.as_str() {
        return parse_point_string(s);
    }
    Err(JsonVariantError::UnrecognizedShape(json.to_string()))
}

/// Parses the accepted `"[x,y]"` point string form; rejects the deprecated
/// `"10x20"` form.
pub fn parse_point_string(s: &str) -> Result<Point, JsonVariantError> {
    let inner = s.trim();
    if let Some(inner) = inner.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let mut parts = inner.split(',').map(|p| p.trim());
        if let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) {
            if let (Ok(x), Ok(y)) = (x.parse::<f64>(), y.parse::<f64>()) {
                return Ok(Point::new(x, y));
            }
        }
    }
    if inner.contains('x') && !inner.starts_with('[') {
        return Err(JsonVariantError::DeprecatedPointForm(inner.to_string()));
    }
    Err(JsonVariantError::UnrecognizedShape(s.to_string()))
}

/// Decodes a [`Variant`] by inferring its shape from a bare JSON value
/// (the "coalesced" encoding):
///
/// - a bare integer becomes `int`, a bare float becomes `double`
/// - `true`/`false` become `bool`, a string becomes `string`
/// - a 2-element array of numbers becomes `point`
/// - a homogeneous array of atoms becomes the matching array type
/// - a mixed numeric array (some ints, some doubles) widens to `double[]`
pub fn from_coalesced(json: &Json) -> Result<Variant, JsonVariantError> {
    match json {
        Json::Bool(v) => Ok(Variant::bool(*v)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Variant::int(i))
            } else {
                Ok(Variant::double(n.as_f64().unwrap_or_default()))
            }
        }
        Json::String(s) => Ok(Variant::string(s.clone())),
        Json::Array(items) => from_coalesced_array(items),
        other => Err(JsonVariantError::UnrecognizedShape(other.to_string())),
    }
}

fn from_coalesced_array(items: &[Json]) -> Result<Variant, JsonVariantError> {
    if items.len() == 2 && items.iter().all(|v| v.is_number()) {
        return Ok(Variant::Atom(Atom::Point(as_point(&Json::Array(
            items.to_vec(),
        ))?)));
    }
    if items.is_empty() {
        return Err(JsonVariantError::HeterogeneousArray);
    }
    if items.iter().all(|v| v.is_boolean()) {
        return Ok(Variant::Array(Array::Bool(as_vec(
            &Json::Array(items.to_vec()),
            as_bool,
        )?)));
    }
    if items.iter().all(|v| v.is_string()) {
        return Ok(Variant::Array(Array::String(as_vec(
            &Json::Array(items.to_vec()),
            as_string,
        )?)));
    }
    if items.iter().all(|v| v.is_number()) {
        if items.iter().all(|v| v.as_i64().is_some()) {
            return Ok(Variant::Array(Array::Int(as_vec(
                &Json::Array(items.to_vec()),
                as_i64,
            )?)));
        }
        return Ok(Variant::Array(Array::Double(as_vec(
            &Json::Array(items.to_vec()),
            as_f64,
        )?)));
    }
    Err(JsonVariantError::HeterogeneousArray)
}
