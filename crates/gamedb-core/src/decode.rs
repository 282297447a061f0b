//! Cell decoders: primitive text rules and the composite cell grammars.
//!
//! Every composite decoder treats an empty cell as a valid, empty value so
//! that downstream code never needs to distinguish "missing" from "empty".

use serde::{Deserialize, Serialize};
use std::num::{ParseFloatError, ParseIntError};

// ---------------------------------------------------------------------------
// Separators
// ---------------------------------------------------------------------------

/// Separator between elements of a list-of-pairs cell.
pub const LIST_SEPARATOR: char = ';';

/// Separator between the fields of one element.
pub const FIELD_SEPARATOR: char = ',';

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while decoding a single cell.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("{grammar} expects {expected} comma-separated fields, found {found} in '{text}'")]
    FieldCount {
        grammar: &'static str,
        expected: usize,
        found: usize,
        text: String,
    },
    #[error("invalid integer '{text}': {source}")]
    Int {
        text: String,
        source: ParseIntError,
    },
    #[error("invalid number '{text}': {source}")]
    Float {
        text: String,
        source: ParseFloatError,
    },
    #[error("invalid boolean '{0}'")]
    Bool(String),
    #[error("unreadable cell value: {0}")]
    Unreadable(String),
    #[error("'{text}' is out of range for a {kind:?} field")]
    OutOfRange { text: String, kind: FieldKind },
}

/// The closed set of decodable field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Composite,
}

// ---------------------------------------------------------------------------
// Composite grammars
// ---------------------------------------------------------------------------

/// A value decoded from one cell's text by a dedicated grammar.
///
/// `decode("")` must succeed and return `Self::default()`.
pub trait CellDecode: Sized + Default {
    fn decode(text: &str) -> Result<Self, DecodeError>;
}

/// An `(id, count)` pair, e.g. an item and a quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: i32,
    pub count: i32,
}

/// Semicolon-separated list of `id,count` pairs: `"1,2;3,4"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfos(pub Vec<ItemInfo>);

/// Comma-separated list of integers: `"1,2,3"`. Empty elements are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntList(pub Vec<i32>);

/// A single `key,value` pair: `"3,100"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropInfo {
    pub key: i32,
    pub value: i32,
}

fn parse_i32(text: &str) -> Result<i32, DecodeError> {
    let text = text.trim();
    text.parse::<i32>().map_err(|source| DecodeError::Int {
        text: text.to_string(),
        source,
    })
}

impl CellDecode for ItemInfos {
    fn decode(text: &str) -> Result<Self, DecodeError> {
        let list = text.trim().trim_end_matches(LIST_SEPARATOR);
        if list.is_empty() {
            return Ok(Self::default());
        }

        let mut infos = Vec::new();
        for elem in list.split(LIST_SEPARATOR) {
            let fields: Vec<&str> = elem.trim().split(FIELD_SEPARATOR).collect();
            if fields.len() != 2 {
                return Err(DecodeError::FieldCount {
                    grammar: "item list",
                    expected: 2,
                    found: fields.len(),
                    text: elem.to_string(),
                });
            }
            infos.push(ItemInfo {
                id: parse_i32(fields[0])?,
                count: parse_i32(fields[1])?,
            });
        }
        Ok(Self(infos))
    }
}

impl CellDecode for IntList {
    fn decode(text: &str) -> Result<Self, DecodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }

        text.split(FIELD_SEPARATOR)
            .filter(|elem| !elem.trim().is_empty())
            .map(parse_i32)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl CellDecode for PropInfo {
    fn decode(text: &str) -> Result<Self, DecodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }

        let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
        if fields.len() != 2 {
            return Err(DecodeError::FieldCount {
                grammar: "key/value pair",
                expected: 2,
                found: fields.len(),
                text: text.to_string(),
            });
        }
        Ok(Self {
            key: parse_i32(fields[0])?,
            value: parse_i32(fields[1])?,
        })
    }
}

// ---------------------------------------------------------------------------
// Primitive rules
// ---------------------------------------------------------------------------

/// Parse boolean text. Accepts `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Result<bool, DecodeError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(DecodeError::Bool(text.to_string())),
    }
}

/// Parse signed integer text, tolerating a fractional part.
///
/// The value is rounded to the nearest integer with ties away from zero
/// (`2.5 -> 3`, `-2.5 -> -3`). Non-finite values and values outside `i64`
/// fail.
pub fn parse_rounded_int(text: &str) -> Result<i64, DecodeError> {
    let rounded = parse_float(text)?.round();
    // `i64::MAX as f64` is 2^63, which is already out of range.
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(DecodeError::OutOfRange {
            text: text.to_string(),
            kind: FieldKind::Int,
        });
    }
    Ok(rounded as i64)
}

/// Parse unsigned base-10 integer text.
pub fn parse_uint(text: &str) -> Result<u64, DecodeError> {
    text.parse::<u64>().map_err(|source| DecodeError::Int {
        text: text.to_string(),
        source,
    })
}

/// Narrow a parsed value into the field's integer type.
pub fn fit<T: TryFrom<V>, V>(text: &str, kind: FieldKind, value: V) -> Result<T, DecodeError> {
    T::try_from(value).map_err(|_| DecodeError::OutOfRange {
        text: text.to_string(),
        kind,
    })
}

/// Parse floating-point text.
pub fn parse_float(text: &str) -> Result<f64, DecodeError> {
    text.parse::<f64>().map_err(|source| DecodeError::Float {
        text: text.to_string(),
        source,
    })
}

/// Strip newlines and escape embedded double quotes.
pub fn clean_string(text: &str) -> String {
    text.replace('\n', "").replace('"', "\\\"")
}
