//! Coerces raw form data (string leaves) into the typed shape the rule
//! tables expect: numeric strings become numbers, a short list of
//! checkbox paths becomes real booleans, and everything that fails to
//! parse is left exactly as it arrived.

use serde_json::{Number, Value};

use super::record::numeric_prefix;

/// Fields that must stay strings even when they look numeric.
/// Matched as substrings of either the leaf key or the dotted path.
const STRING_FIELDS: &[&str] = &[
    "typeOfRoll",
    "feedDirection",
    "materialType",
    "grade",
    "coating",
    "surfaceCondition",
    "edgeCondition",
    "typeOfLine",
    "passline",
    "date",
    "dates.date",
    "rfq.dates.date",
];

/// Fields carrying counts and identifiers, parsed as integers.
const INTEGER_FIELDS: &[&str] = &[
    "numberOfRolls",
    "quantity",
    "coilID",
    "shiftsPerDay",
    "daysPerWeek",
    "rollCount",
    "guideQuantity",
    "cylinderCount",
    "maxCoilOD",
    "maxCoilWidth",
    "minCoilWidth",
    "maxCoilWeight",
];

/// Checkbox paths serialized by the form layer as `"true"` / `"false"`.
const BOOLEAN_FIELDS: &[&str] = &[
    "common.equipment.feed.nonMarking",
    "common.equipment.feed.lightGuageNonMarking",
    "rfq.coil.slitEdge",
    "rfq.coil.millEdge",
    "rfq.dies.progressiveDies",
    "rfq.dies.transferDies",
    "rfq.dies.blankingDies",
];

/// Transform a sheet record for autofill computation.
///
/// The input is never mutated; the returned record is a deep clone
/// with coerced leaves. Unparseable numerics silently remain strings,
/// and downstream code treats a surviving string as an implicit data
/// quality signal, never as an error.
pub fn transform_sheet_data(data: &Value) -> Value {
    let mut transformed = data.clone();
    convert_numeric_leaves(&mut transformed, "");
    for path in BOOLEAN_FIELDS {
        convert_boolean_leaf(&mut transformed, path);
    }
    transformed
}

fn convert_numeric_leaves(value: &mut Value, path: &str) {
    let Value::Object(map) = value else {
        return;
    };

    for (key, child) in map.iter_mut() {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        match child {
            Value::Object(_) => convert_numeric_leaves(child, &child_path),
            Value::String(s) if !s.trim().is_empty() => {
                if matches_field_list(STRING_FIELDS, key, &child_path) {
                    continue;
                }

                let parsed = if matches_field_list(INTEGER_FIELDS, key, &child_path) {
                    parse_integer(s)
                } else {
                    parse_float(s)
                };

                if let Some(number) = parsed {
                    *child = number;
                }
            }
            _ => {}
        }
    }
}

fn matches_field_list(fields: &[&str], key: &str, path: &str) -> bool {
    fields
        .iter()
        .any(|field| key.contains(field) || path.contains(field))
}

/// Leading digit run only, so "20abc" reads 20 and "20.7" truncates
/// to 20 in count fields.
fn parse_integer(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    trimmed[..end].parse::<i64>().ok().map(Value::from)
}

fn parse_float(s: &str) -> Option<Value> {
    let n = numeric_prefix(s)?;
    // Whole numbers render without a trailing .0.
    if n.fract() == 0.0 && n.abs() < 9e15 {
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

fn convert_boolean_leaf(data: &mut Value, path: &str) {
    let mut current = data;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if let Some(leaf) = current.get_mut(segment) {
                match leaf.as_str() {
                    Some("true") => *leaf = Value::Bool(true),
                    Some("false") => *leaf = Value::Bool(false),
                    _ => {}
                }
            }
            return;
        }
        match current.get_mut(segment) {
            Some(next) => current = next,
            None => return,
        }
    }
}
