//! Typed Property Values
//!
//! Converts raw node properties into the closed set of result shapes the
//! resolvers hand out. Three shapes get special treatment:
//!
//! - `Vec<String>`: multiple text values (JSON array, or one per line)
//! - `Vec<Vec<String>>`: grouped text values (array of arrays)
//! - `Vec<i64>` / `Vec<i32>`: integer lists from CSV, a single integer, or an array
//!
//! Everything else goes through the native conversion: JSON scalars with
//! lenient parsing of numeric and boolean strings, or serde for [`Typed`].

use serde::de::DeserializeOwned;

use super::ports::{ContentTree, NodeId, RawValue};

/// A type a property can be resolved as.
///
/// `Default` is the "not found" value handed back when nothing resolves.
pub trait PropertyValue: Default + Clone + Send + Sync + 'static {
    /// Convert a raw value, or `None` when it does not fit this type.
    fn from_raw(raw: &RawValue) -> Option<Self>;
}

/// Read a property with the native typed conversion, falling back to the
/// type's default.
pub fn read_property<T, C>(tree: &C, id: NodeId, alias: &str) -> T
where
    T: PropertyValue,
    C: ContentTree + ?Sized,
{
    tree.raw_property(id, alias)
        .and_then(|raw| T::from_raw(&raw))
        .unwrap_or_default()
}

// =============================================================================
// Raw Value Helpers
// =============================================================================

/// Text form of a raw value. `Null` has none.
pub fn raw_text(raw: &RawValue) -> Option<String> {
    match raw {
        RawValue::Null => None,
        RawValue::String(s) => Some(s.clone()),
        RawValue::Bool(b) => Some(b.to_string()),
        RawValue::Number(n) => Some(n.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

/// True when a raw value carries nothing: null, blank text, or an empty
/// collection.
pub fn is_blank(raw: &RawValue) -> bool {
    match raw {
        RawValue::Null => true,
        RawValue::String(s) => s.trim().is_empty(),
        RawValue::Array(items) => items.is_empty(),
        RawValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// True when the raw value's text equals one of the empty sentinel
/// encodings (case-insensitive).
pub fn is_empty_sentinel(raw: &RawValue, sentinels: &[String]) -> bool {
    match raw {
        RawValue::String(s) => sentinels.iter().any(|e| e.eq_ignore_ascii_case(s.trim())),
        _ => false,
    }
}

/// True when the value is usable: not blank and not an empty sentinel.
pub fn has_content(raw: &RawValue, sentinels: &[String]) -> bool {
    !is_blank(raw) && !is_empty_sentinel(raw, sentinels)
}

/// Split comma separated text, trimming parts and dropping empty ones.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Native Conversions
// =============================================================================

impl PropertyValue for String {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        raw_text(raw)
    }
}

impl PropertyValue for bool {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Bool(b) => Some(*b),
            RawValue::Number(n) => n.as_f64().map(|v| v != 0.0),
            RawValue::String(s) => parse_bool(s),
            _ => None,
        }
    }
}

macro_rules! integer_property {
    ($($ty:ty),*) => {
        $(
            impl PropertyValue for $ty {
                fn from_raw(raw: &RawValue) -> Option<Self> {
                    match raw {
                        RawValue::Number(n) => n.as_i64().and_then(|v| <$ty>::try_from(v).ok()),
                        RawValue::String(s) => s.trim().parse::<$ty>().ok(),
                        RawValue::Bool(b) => Some(<$ty>::from(*b)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_property!(i32, i64, u32, u64);

impl PropertyValue for f64 {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Number(n) => n.as_f64(),
            RawValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        if raw.is_null() {
            return Some(None);
        }
        Some(T::from_raw(raw))
    }
}

impl PropertyValue for RawValue {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        Some(raw.clone())
    }
}

/// Wrapper that resolves any serde type through `serde_json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Typed<T>(pub T);

impl<T> PropertyValue for Typed<T>
where
    T: DeserializeOwned + Default + Clone + Send + Sync + 'static,
{
    fn from_raw(raw: &RawValue) -> Option<Self> {
        serde_json::from_value(raw.clone()).ok().map(Typed)
    }
}

// =============================================================================
// Special Shapes
// =============================================================================

impl PropertyValue for Vec<String> {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Array(items) => Some(items.iter().filter_map(raw_text).collect()),
            RawValue::String(s) => Some(
                s.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            RawValue::Null => None,
            other => raw_text(other).map(|text| vec![text]),
        }
    }
}

impl PropertyValue for Vec<Vec<String>> {
    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Array(groups) => Some(
                groups
                    .iter()
                    .filter_map(|group| match group {
                        RawValue::Array(values) => {
                            Some(values.iter().filter_map(raw_text).collect())
                        }
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

macro_rules! integer_list_property {
    ($($ty:ty),*) => {
        $(
            impl PropertyValue for Vec<$ty> {
                fn from_raw(raw: &RawValue) -> Option<Self> {
                    match raw {
                        RawValue::String(s) => Some(
                            split_csv(s)
                                .iter()
                                .filter_map(|part| part.parse::<$ty>().ok())
                                .collect(),
                        ),
                        RawValue::Number(_) => <$ty>::from_raw(raw).map(|v| vec![v]),
                        RawValue::Array(items) => {
                            Some(items.iter().filter_map(<$ty>::from_raw).collect())
                        }
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_list_property!(i32, i64);

// =============================================================================
// Tests
// =============================================================================
