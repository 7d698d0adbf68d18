//! Shared helpers for reading sparse, form-originated sheet records.
//!
//! A sheet record is a deeply nested `serde_json::Value` tree where any
//! leaf may be missing, a string, a number, or a boolean. Nothing here
//! assumes a path exists; absence is never an error.

use serde_json::Value;

/// Dotted field path parsed once into segments so the static rule
/// tables do not re-split on every lookup.
#[derive(Debug, Clone)]
pub struct FieldPath {
    raw: &'static str,
    segments: Vec<&'static str>,
}

impl FieldPath {
    pub fn new(raw: &'static str) -> Self {
        Self {
            raw,
            segments: raw.split('.').collect(),
        }
    }

    pub fn raw(&self) -> &'static str {
        self.raw
    }

    pub fn get<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        let mut current = data;
        for segment in &self.segments {
            current = current.get(segment)?;
        }
        Some(current)
    }
}

/// Resolve a dotted path against the record, `None` on any missing hop.
pub fn value_at<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Numeric reading of a leaf: real numbers pass through, numeric
/// strings are parsed. Anything else is not a number.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_prefix(s),
        _ => None,
    }
}

/// Parse the leading numeric run of a string: sign, digits, one
/// decimal point, optional exponent. Form inputs routinely carry units
/// ("480V", "0.5in") and the sheets have always read them as their
/// number.
pub fn numeric_prefix(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let mut saw_digit = false;
    let mut saw_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                saw_digit = true;
                end += 1;
            }
            b'.' if !saw_dot => {
                saw_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !saw_digit {
        return None;
    }

    // Exponent, only when completely formed.
    if bytes.get(end).is_some_and(|b| matches!(b, b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn number_at(data: &Value, path: &str) -> Option<f64> {
    value_at(data, path).and_then(number_of)
}

/// Numeric read with a hardcoded fallback, used by the default-value
/// functions so they stay total over sparse records.
pub fn number_or(data: &Value, path: &str, fallback: f64) -> f64 {
    number_at(data, path).unwrap_or(fallback)
}

pub fn str_at<'a>(data: &'a Value, path: &str) -> Option<&'a str> {
    value_at(data, path).and_then(Value::as_str)
}

pub fn string_or(data: &Value, path: &str, fallback: &str) -> String {
    str_at(data, path).unwrap_or(fallback).to_string()
}

/// Like [`string_or`] but an empty string also falls back.
pub fn nonempty_string_or(data: &Value, path: &str, fallback: &str) -> String {
    str_at(data, path)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Truthiness in the form-data sense, used by rule conditions: present
/// and non-empty / non-zero / `true`.
pub fn is_present(data: &Value, path: &str) -> bool {
    match value_at(data, path) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Whether a value counts as actually filled in by the user.
///
/// Placeholder strings ("Select...", "Choose", "Default", exactly
/// "none") are unset; numeric values and numeric strings are set only
/// when strictly positive (zero means "not chosen yet" on these forms);
/// other non-blank strings are set; booleans are always set.
pub fn has_meaningful_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => {
            if s.is_empty() {
                return false;
            }
            let lower = s.to_lowercase();
            if lower.contains("select")
                || lower.contains("choose")
                || lower.contains("default")
                || lower == "none"
            {
                return false;
            }
            if let Some(numeric) = numeric_prefix(s) {
                return numeric > 0.0;
            }
            !s.trim().is_empty()
        }
        Value::Number(n) => n.as_f64().map(|v| v > 0.0).unwrap_or(false),
        Value::Bool(_) => true,
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn meaningful_at(data: &Value, path: &str) -> bool {
    value_at(data, path).map(has_meaningful_value).unwrap_or(false)
}

/// Ordered fallback lookup: the first candidate path holding a
/// meaningful value wins.
pub fn first_meaningful_at<'a>(data: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| value_at(data, path))
        .find(|value| has_meaningful_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_is_not_meaningful() {
        assert!(!has_meaningful_value(&json!(0)));
        assert!(!has_meaningful_value(&json!("0")));
        assert!(!has_meaningful_value(&json!(0.0)));
        assert!(has_meaningful_value(&json!(0.001)));
        assert!(has_meaningful_value(&json!("0.001")));
    }

    #[test]
    fn placeholder_strings_are_not_meaningful() {
        assert!(!has_meaningful_value(&json!("Select...")));
        assert!(!has_meaningful_value(&json!("Choose a model")));
        assert!(!has_meaningful_value(&json!("Default")));
        assert!(!has_meaningful_value(&json!("none")));
        assert!(!has_meaningful_value(&json!("None")));
        // "selected" still contains the placeholder keyword
        assert!(!has_meaningful_value(&json!("None selected")));
    }

    #[test]
    fn ordinary_values_are_meaningful() {
        assert!(has_meaningful_value(&json!("Steel")));
        assert!(has_meaningful_value(&json!(48)));
        assert!(has_meaningful_value(&json!(true)));
        assert!(has_meaningful_value(&json!(false)));
        assert!(!has_meaningful_value(&json!("")));
        assert!(!has_meaningful_value(&json!("   ")));
        assert!(!has_meaningful_value(&Value::Null));
    }

    #[test]
    fn negative_numbers_are_not_meaningful() {
        assert!(!has_meaningful_value(&json!(-4)));
        assert!(!has_meaningful_value(&json!("-4")));
        assert!(!has_meaningful_value(&json!("-4in")));
    }

    #[test]
    fn unit_suffixed_strings_read_as_their_numeric_prefix() {
        assert_eq!(numeric_prefix("480V"), Some(480.0));
        assert_eq!(numeric_prefix("  0.5 in"), Some(0.5));
        assert_eq!(numeric_prefix("1e3rpm"), Some(1000.0));
        assert_eq!(numeric_prefix("12.5.3"), Some(12.5));
        assert_eq!(numeric_prefix("about an eighth"), None);
        assert_eq!(numeric_prefix("V480"), None);

        assert_eq!(number_of(&json!("480V")), Some(480.0));
        // A zero with a unit is still an unset value.
        assert!(!has_meaningful_value(&json!("0V")));
        assert!(has_meaningful_value(&json!("5 ft")));
    }

    #[test]
    fn nested_lookup_handles_missing_hops() {
        let data = json!({ "common": { "material": { "coilWidth": "48" } } });
        assert_eq!(number_at(&data, "common.material.coilWidth"), Some(48.0));
        assert_eq!(number_at(&data, "common.material.missing"), None);
        assert_eq!(number_at(&data, "missing.material.coilWidth"), None);
        assert_eq!(number_or(&data, "common.coil.maxCoilWeight", 4000.0), 4000.0);
    }

    #[test]
    fn leaf_where_object_expected_reads_as_absent() {
        let data = json!({ "common": { "material": "oops" } });
        assert_eq!(value_at(&data, "common.material.coilWidth"), None);
        assert!(!meaningful_at(&data, "common.material.coilWidth"));
    }

    #[test]
    fn first_meaningful_wins_in_order() {
        let data = json!({
            "materialSpecs": { "straightener": { "rolls": { "typeOfRoll": "" } } },
            "rollStrBackbend": { "straightener": { "rolls": { "typeOfRoll": "7 Roll Str. Backbend" } } }
        });
        let found = first_meaningful_at(
            &data,
            &[
                "materialSpecs.straightener.rolls.typeOfRoll",
                "rollStrBackbend.straightener.rolls.typeOfRoll",
                "materialSpecs.straightener.selectRoll",
            ],
        );
        assert_eq!(found, Some(&json!("7 Roll Str. Backbend")));
    }

    #[test]
    fn field_path_resolves_like_dotted_lookup() {
        let path = FieldPath::new("feed.feed.application");
        let data = json!({ "feed": { "feed": { "application": "Press Feed" } } });
        assert_eq!(path.get(&data), Some(&json!("Press Feed")));
        assert_eq!(path.raw(), "feed.feed.application");
    }
}
