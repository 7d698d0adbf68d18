//! Composes the default store and the global validation rules into a
//! flat field-path → value suggestion map for the visible tabs.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::warn;

use super::defaults::{defaults_for, DefaultRule};
use super::record::{has_meaningful_value, is_present, str_at};
use super::validation::{validate_suggested_value, validation_rules};
use super::visibility::{Tab, VisibleTab};

/// Field path → suggested value. Freshly built per call; the caller
/// owns merging it back into the record.
pub type SuggestionMap = BTreeMap<String, Value>;

/// Evaluate one default rule against the record. A populated field, a
/// failed condition, or a panicking callback all yield no suggestion;
/// panics are additionally reported in `skipped`.
fn evaluate_rule(rule: &DefaultRule, data: &Value, skipped: &mut Vec<String>) -> Option<Value> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let current = rule.field.get(data);
        if current.map(has_meaningful_value).unwrap_or(false) {
            return None;
        }
        if let Some(condition) = rule.condition {
            if !condition(data) {
                return None;
            }
        }
        Some((rule.value)(data))
    }));

    match outcome {
        Ok(value) => value,
        Err(_) => {
            warn!(field = rule.field.raw(), "default rule panicked, skipping suggestion");
            skipped.push(rule.field.raw().to_string());
            None
        }
    }
}

/// Phase one: per-tab defaults for every visible tab, then the global
/// validation rules, whose corrective suggestions are applied last and
/// therefore win.
pub fn validation_aware_autofill(data: &Value, visible: &[VisibleTab]) -> SuggestionMap {
    let mut skipped = Vec::new();
    validation_aware_with_diagnostics(data, visible, &mut skipped)
}

pub(crate) fn validation_aware_with_diagnostics(
    data: &Value,
    visible: &[VisibleTab],
    skipped: &mut Vec<String>,
) -> SuggestionMap {
    let mut suggestions = SuggestionMap::new();

    for tab in visible {
        for rule in defaults_for(tab.value) {
            if let Some(value) = evaluate_rule(rule, data, skipped) {
                if validate_suggested_value(rule.field.raw(), &value, data) {
                    suggestions.insert(rule.field.raw().to_string(), value);
                }
            }
        }
    }

    for rule in validation_rules() {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let current = rule.field.get(data);
            let needs_correction = match current {
                Some(value) => {
                    !has_meaningful_value(value) || !(rule.validate)(value, data)
                }
                None => true,
            };
            if !needs_correction {
                return None;
            }
            let suggested = (rule.suggest)(data);
            if (rule.validate)(&suggested, data) {
                Some(suggested)
            } else {
                None
            }
        }));

        match outcome {
            Ok(Some(value)) => {
                suggestions.insert(rule.field.raw().to_string(), value);
            }
            Ok(None) => {}
            Err(_) => {
                warn!(
                    field = rule.field.raw(),
                    "validation rule panicked, skipping correction"
                );
                skipped.push(rule.field.raw().to_string());
            }
        }
    }

    suggestions
}

/// Suggestions for a single tab, highest priority first. Unknown tabs
/// (no registered defaults) yield an empty map.
pub fn tab_autofill(data: &Value, tab: Tab) -> SuggestionMap {
    let mut skipped = Vec::new();
    tab_autofill_with_diagnostics(data, tab, &mut skipped)
}

pub(crate) fn tab_autofill_with_diagnostics(
    data: &Value,
    tab: Tab,
    skipped: &mut Vec<String>,
) -> SuggestionMap {
    let mut rules: Vec<&DefaultRule> = defaults_for(tab).iter().collect();
    // Stable sort keeps table order for equal priorities.
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut suggestions = SuggestionMap::new();
    for rule in rules {
        if let Some(value) = evaluate_rule(rule, data, skipped) {
            if validate_suggested_value(rule.field.raw(), &value, data) {
                suggestions.insert(rule.field.raw().to_string(), value);
            }
        }
    }
    suggestions
}

/// Full two-phase composition: the validation-aware map, overlaid by
/// each visible tab's priority-ordered map in visibility order.
///
/// When two tabs default the same field path, the tab processed last
/// wins. That matches the long-standing sheet behavior and is pinned
/// by a test; a global max-priority merge would silently change
/// existing sheets.
pub fn comprehensive_autofill(data: &Value, visible: &[VisibleTab]) -> SuggestionMap {
    let mut skipped = Vec::new();
    comprehensive_with_diagnostics(data, visible, &mut skipped)
}

pub(crate) fn comprehensive_with_diagnostics(
    data: &Value,
    visible: &[VisibleTab],
    skipped: &mut Vec<String>,
) -> SuggestionMap {
    let mut all = validation_aware_with_diagnostics(data, visible, skipped);
    for tab in visible {
        let tab_suggestions = tab_autofill_with_diagnostics(data, tab.value, skipped);
        all.extend(tab_suggestions);
    }
    all
}

/// Whether a tab's own calculations have enough input data to succeed.
pub fn has_minimum_required_data(data: &Value, tab: Tab) -> bool {
    let application = str_at(data, "feed.feed.application");
    let line_type = str_at(data, "common.equipment.feed.lineType");
    let standalone = application == Some("Standalone");

    match tab {
        // RFQ can always be filled from defaults.
        Tab::Rfq => true,
        Tab::SummaryReport => {
            is_present(data, "common.material.coilWidth")
                || is_present(data, "common.coil.coilID")
        }
        Tab::MaterialSpecs => {
            is_present(data, "common.material.materialType")
                && is_present(data, "common.material.materialThickness")
                && is_present(data, "common.material.coilWidth")
        }
        Tab::StrUtility => {
            if standalone
                && matches!(line_type, Some("Straightener") | Some("Straightener-Reel Combination"))
            {
                is_present(data, "common.material.materialThickness")
            } else {
                is_present(data, "common.material.materialThickness")
                    && is_present(data, "common.equipment.straightener.model")
            }
        }
        Tab::Feed => {
            if standalone && matches!(line_type, Some("Feed") | Some("Feed-Shear")) {
                true
            } else {
                is_present(data, "common.feedRates.average.spm")
                    && is_present(data, "common.feedRates.average.length")
            }
        }
        Tab::ReelDrive => {
            if standalone
                && matches!(
                    line_type,
                    Some("Reel-Motorized") | Some("Reel-Pull Off")
                        | Some("Straightener-Reel Combination")
                )
            {
                is_present(data, "common.coil.maxCoilWeight")
            } else {
                is_present(data, "common.coil.maxCoilWeight")
                    && is_present(data, "common.equipment.reel.model")
            }
        }
        Tab::Tddbhd => {
            if standalone && line_type == Some("Threading Table") {
                is_present(data, "common.coil.maxCoilWeight")
            } else {
                is_present(data, "common.coil.maxCoilWeight")
                    && is_present(data, "common.material.materialThickness")
            }
        }
        Tab::RollStrBackbend => {
            is_present(data, "common.material.materialThickness")
                && is_present(data, "materialSpecs.straightener.rolls.typeOfRoll")
        }
        Tab::Shear => {
            if application == Some("Cut To Length")
                || (standalone && line_type == Some("Feed-Shear"))
            {
                is_present(data, "common.material.materialThickness")
                    && is_present(data, "common.material.maxYieldStrength")
            } else {
                false
            }
        }
    }
}
