//! Lenient access to untyped document values.
//!
//! The narrative engine writes loosely-typed JSON: numbers arrive as strings,
//! maps arrive as arrays, fields go missing. These helpers read such values
//! the way the engine's authors expect (a numeric string is a number, a
//! missing number is zero) and write numbers back without turning `75` into
//! `75.0`.

use serde_json::{Map, Number, Value};

/// Splits a dotted path into its segments, ignoring empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

/// Looks up a value by path segments.
///
/// Objects are indexed by key, arrays by a decimal index segment.
pub fn get_in<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Looks up a value by dotted path.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    get_in(root, &split_path(path))
}

/// Writes a value at the given path segments, creating intermediate objects.
///
/// Any non-container value found on the way is replaced by an empty object.
/// Array elements are addressed by index. Returns false, leaving the document
/// untouched, when an array is reached with a segment that is not an index
/// in range.
#[must_use]
pub fn set_in<S: AsRef<str>>(root: &mut Value, segments: &[S], value: Value) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return true;
    };
    if !can_set(root, segments) {
        return false;
    }

    let mut current = root;
    for segment in parents {
        let segment = segment.as_ref();
        if !current.is_object() && !current.is_array() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|idx| items.get_mut(idx)) {
                Some(next) => next,
                None => return false,
            },
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            _ => return false,
        };
    }

    let last = last.as_ref();
    match current {
        Value::Array(items) => match last.parse::<usize>().ok().and_then(|idx| items.get_mut(idx)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            true
        }
        other => {
            let mut map = Map::new();
            map.insert(last.to_string(), value);
            *other = Value::Object(map);
            true
        }
    }
}

/// True if every array on the path is addressed by an in-range index.
fn can_set<S: AsRef<str>>(root: &Value, segments: &[S]) -> bool {
    let mut current = Some(root);
    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Some(Value::Array(items)) => match segment.parse::<usize>().ok().and_then(|idx| items.get(idx)) {
                Some(next) => Some(next),
                None => return false,
            },
            Some(Value::Object(map)) => map.get(segment),
            // Scalars and missing parents are replaced by fresh objects.
            _ => None,
        };
    }
    true
}

/// Writes a value at a dotted path. Returns false if the write was dropped.
#[must_use]
pub fn set_path(root: &mut Value, path: &str, value: Value) -> bool {
    set_in(root, &split_path(path), value)
}

/// Reads a value as a finite number.
///
/// Numbers and numeric strings are accepted; everything else is `None`.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Reads an optional value as a number, defaulting to zero.
#[must_use]
pub fn number_or_zero(value: Option<&Value>) -> f64 {
    value.and_then(coerce_number).unwrap_or(0.0)
}

/// Reads a value as display text (strings verbatim, scalars formatted).
#[must_use]
pub fn as_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Encodes a number, keeping whole values as JSON integers.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Numeric-aware equality: `75` and `75.0` are the same number.
#[must_use]
pub fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.as_f64() == y.as_f64(),
        (a, b) => a == b,
    }
}
