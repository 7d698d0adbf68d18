//! Global range rules for the load-bearing numeric fields. These run
//! regardless of tab visibility and can override a tab default with a
//! corrective suggestion.

use std::sync::OnceLock;

use serde_json::{json, Value};

use super::record::{number_of, string_or, FieldPath};

/// A range check plus the correction to suggest when it fails.
pub struct ValidationRule {
    pub field: FieldPath,
    pub validate: fn(&Value, &Value) -> bool,
    pub suggest: fn(&Value) -> Value,
    pub description: &'static str,
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRule")
            .field("field", &self.field.raw())
            .field("description", &self.description)
            .finish()
    }
}

pub fn validation_rules() -> &'static [ValidationRule] {
    static RULES: OnceLock<Vec<ValidationRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            ValidationRule {
                field: FieldPath::new("common.material.materialThickness"),
                validate: |value, _| {
                    number_of(value).map(|v| v > 0.0 && v <= 2.0).unwrap_or(false)
                },
                suggest: |_| json!(0.125), // 1/8" is common
                description: "Material thickness must be positive and reasonable",
            },
            ValidationRule {
                field: FieldPath::new("common.material.maxYieldStrength"),
                validate: |value, _| {
                    number_of(value)
                        .map(|v| (20000.0..=200000.0).contains(&v))
                        .unwrap_or(false)
                },
                suggest: |data| {
                    let material =
                        string_or(data, "common.material.materialType", "").to_lowercase();
                    // "steel" is checked first so stainless steel names
                    // containing both words resolve to plain steel.
                    if material.contains("steel") {
                        json!(50000)
                    } else if material.contains("aluminum") {
                        json!(35000)
                    } else if material.contains("stainless") {
                        json!(75000)
                    } else {
                        json!(50000)
                    }
                },
                description: "Yield strength must be within engineering limits",
            },
            ValidationRule {
                field: FieldPath::new("common.material.coilWidth"),
                validate: |value, _| {
                    number_of(value).map(|v| v > 0.0 && v <= 120.0).unwrap_or(false)
                },
                suggest: |_| json!(12), // 12" is common
                description: "Coil width must be positive and within machine limits",
            },
        ]
    })
}

/// Validate a candidate suggestion before it enters the map: a field
/// with a global rule must satisfy it; otherwise numbers must be
/// positive and finite, strings non-blank, and anything else passes.
pub fn validate_suggested_value(field: &str, value: &Value, data: &Value) -> bool {
    if let Some(rule) = validation_rules().iter().find(|r| r.field.raw() == field) {
        return (rule.validate)(value, data);
    }

    match value {
        Value::Number(n) => n.as_f64().map(|v| v.is_finite() && v > 0.0).unwrap_or(false),
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(field: &str) -> &'static ValidationRule {
        validation_rules()
            .iter()
            .find(|r| r.field.raw() == field)
            .expect("rule exists")
    }

    #[test]
    fn thickness_range_accepts_strings_and_numbers() {
        let r = rule("common.material.materialThickness");
        let data = json!({});
        assert!((r.validate)(&json!(0.125), &data));
        assert!((r.validate)(&json!("0.125"), &data));
        assert!(!(r.validate)(&json!(0), &data));
        assert!(!(r.validate)(&json!(2.5), &data));
        assert!(!(r.validate)(&json!("thick"), &data));
    }

    #[test]
    fn yield_suggestion_depends_on_material_type() {
        let r = rule("common.material.maxYieldStrength");
        let steel = json!({ "common": { "material": { "materialType": "Steel" } } });
        let aluminum = json!({ "common": { "material": { "materialType": "Aluminum 5052" } } });
        let stainless = json!({ "common": { "material": { "materialType": "Stainless Steel" } } });
        assert_eq!((r.suggest)(&steel), json!(50000));
        assert_eq!((r.suggest)(&aluminum), json!(35000));
        // steel wins over stainless when both words appear
        assert_eq!((r.suggest)(&stainless), json!(50000));
        assert_eq!((r.suggest)(&json!({})), json!(50000));
    }

    #[test]
    fn generic_validation_rejects_nonpositive_numbers_and_blank_strings() {
        let data = json!({});
        assert!(validate_suggested_value("some.other.field", &json!(5), &data));
        assert!(!validate_suggested_value("some.other.field", &json!(0), &data));
        assert!(!validate_suggested_value("some.other.field", &json!(""), &data));
        assert!(validate_suggested_value("some.other.field", &json!("Conventional"), &data));
        assert!(validate_suggested_value("some.other.field", &json!(false), &data));
    }

    #[test]
    fn ruled_fields_use_their_rule_for_candidate_values() {
        let data = json!({});
        assert!(!validate_suggested_value(
            "common.material.coilWidth",
            &json!(500),
            &data
        ));
        assert!(validate_suggested_value(
            "common.material.coilWidth",
            &json!(48),
            &data
        ));
    }
}
