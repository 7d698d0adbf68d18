//! Maps a changed field to the tabs whose computed values it affects.
//!
//! The rule table is static; a rule only fires when its minimum-data
//! preconditions hold, and a triggered tab that is not currently
//! visible is dropped silently.

use std::sync::OnceLock;

use serde::Serialize;
use serde_json::Value;

use super::record::{meaningful_at, FieldPath};
use super::visibility::{visible_tabs, Tab};

/// One entry of the trigger table: the field, the tabs it recomputes,
/// its priority, and the other fields that must already be filled in.
#[derive(Debug)]
pub struct TriggerRule {
    pub field: FieldPath,
    pub triggers_for: &'static [Tab],
    pub priority: u8,
    pub requires_minimum_data: &'static [&'static str],
}

impl TriggerRule {
    fn new(
        field: &'static str,
        triggers_for: &'static [Tab],
        priority: u8,
        requires_minimum_data: &'static [&'static str],
    ) -> Self {
        Self {
            field: FieldPath::new(field),
            triggers_for,
            priority,
            requires_minimum_data,
        }
    }

    fn minimum_data_met(&self, data: &Value) -> bool {
        self.requires_minimum_data
            .iter()
            .all(|path| meaningful_at(data, path))
    }
}

fn trigger_rules() -> &'static [TriggerRule] {
    static RULES: OnceLock<Vec<TriggerRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        use Tab::*;
        vec![
            // Material specifications: highest priority, drive most
            // downstream calculations.
            TriggerRule::new(
                "common.material.materialType",
                &[Rfq, MaterialSpecs, SummaryReport, RollStrBackbend, StrUtility, Feed, ReelDrive, Tddbhd],
                100,
                &["common.material.materialThickness"],
            ),
            TriggerRule::new(
                "common.material.materialThickness",
                &[MaterialSpecs, RollStrBackbend, StrUtility, Feed, Shear],
                95,
                &["common.material.materialType"],
            ),
            TriggerRule::new(
                "common.material.maxYieldStrength",
                &[MaterialSpecs, RollStrBackbend, StrUtility, Shear],
                90,
                &[],
            ),
            TriggerRule::new(
                "common.material.coilWidth",
                &[MaterialSpecs, SummaryReport, Feed, ReelDrive, Tddbhd],
                85,
                &[],
            ),
            // Configuration fields that drive tab visibility.
            TriggerRule::new(
                "feed.feed.application",
                &[Rfq, Feed, StrUtility, Tddbhd, ReelDrive, Shear],
                95,
                &[],
            ),
            TriggerRule::new(
                "common.equipment.feed.lineType",
                &[Rfq, StrUtility, ReelDrive, Tddbhd],
                90,
                &[],
            ),
            TriggerRule::new(
                "common.equipment.feed.typeOfLine",
                &[Rfq, StrUtility, ReelDrive, Shear],
                88,
                &[],
            ),
            TriggerRule::new(
                "feed.feed.pullThru.isPullThru",
                &[ReelDrive, SummaryReport],
                85,
                &[],
            ),
            TriggerRule::new(
                "common.equipment.feed.controlsLevel",
                &[Feed, StrUtility],
                80,
                &[],
            ),
            TriggerRule::new("materialSpecs.feed.controls", &[Feed], 75, &[]),
            TriggerRule::new(
                "materialSpecs.straightener.rolls.typeOfRoll",
                &[RollStrBackbend],
                90,
                &["common.material.materialThickness", "common.material.maxYieldStrength"],
            ),
            // Equipment models: determine which calculations apply.
            TriggerRule::new(
                "common.equipment.straightener.model",
                &[StrUtility, RollStrBackbend],
                85,
                &[],
            ),
            TriggerRule::new("common.equipment.feed.model", &[Feed], 80, &[]),
            TriggerRule::new("common.equipment.reel.model", &[ReelDrive, Tddbhd], 75, &[]),
            // Feed rates and operations.
            TriggerRule::new("common.feedRates.average.length", &[Feed, StrUtility], 80, &[]),
            TriggerRule::new(
                "common.feedRates.average.spm",
                &[Feed, StrUtility, ReelDrive],
                75,
                &[],
            ),
            // Coil specifications.
            TriggerRule::new(
                "common.coil.maxCoilWeight",
                &[MaterialSpecs, SummaryReport, ReelDrive, Tddbhd],
                55,
                &[],
            ),
            TriggerRule::new(
                "common.coil.maxCoilOD",
                &[MaterialSpecs, SummaryReport, ReelDrive, Tddbhd],
                50,
                &[],
            ),
        ]
    })
}

/// Tabs to recompute when `field` changes, intersected with the tabs
/// currently visible for the record. De-duplicated, first-hit order.
pub fn triggered_tabs(field: &str, data: &Value) -> Vec<Tab> {
    let rules: Vec<&TriggerRule> = trigger_rules()
        .iter()
        .filter(|rule| rule.field.raw() == field)
        .collect();

    if rules.is_empty() {
        return Vec::new();
    }

    let visible: Vec<Tab> = visible_tabs(data).iter().map(|t| t.value).collect();

    let mut triggered = Vec::new();
    for rule in rules {
        if !rule.minimum_data_met(data) {
            continue;
        }
        for tab in rule.triggers_for {
            if visible.contains(tab) && !triggered.contains(tab) {
                triggered.push(*tab);
            }
        }
    }
    triggered
}

/// Buckets for how a set of triggered tabs should be filled.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AutofillStrategy {
    /// Tabs fillable immediately from static defaults.
    pub immediate: Vec<Tab>,
    /// Reserved for tabs outside the static classification.
    pub conditional: Vec<Tab>,
    /// Tabs whose values come from engineering calculations.
    pub calculated: Vec<Tab>,
}

/// Classify the triggered tabs for a field change. The bucketing is a
/// fixed property of the tab, not of the record.
pub fn autofill_strategy(field: &str, data: &Value) -> AutofillStrategy {
    let mut strategy = AutofillStrategy::default();
    for tab in triggered_tabs(field, data) {
        match tab {
            Tab::Rfq | Tab::SummaryReport => strategy.immediate.push(tab),
            _ => strategy.calculated.push(tab),
        }
    }
    strategy
}

/// Whether changing `field` can fire at least one trigger rule given
/// the data currently on the sheet.
pub fn can_trigger_autofill(field: &str, data: &Value) -> bool {
    let rules: Vec<&TriggerRule> = trigger_rules()
        .iter()
        .filter(|rule| rule.field.raw() == field)
        .collect();

    !rules.is_empty() && rules.iter().any(|rule| rule.minimum_data_met(data))
}

/// Effective priority of a field: the maximum across its rules.
pub fn field_priority(field: &str) -> u8 {
    trigger_rules()
        .iter()
        .filter(|rule| rule.field.raw() == field)
        .map(|rule| rule.priority)
        .max()
        .unwrap_or(0)
}

/// Fields important enough to trigger autofill eagerly.
pub fn high_priority_fields() -> Vec<&'static str> {
    trigger_rules()
        .iter()
        .filter(|rule| rule.priority >= 70)
        .map(|rule| rule.field.raw())
        .collect()
}

/// Global gate for comprehensive autofill: material specs, a coil
/// width, and either an application or some equipment selection.
pub fn has_sufficient_data(data: &Value) -> bool {
    let has_material_specs = meaningful_at(data, "common.material.materialType")
        && meaningful_at(data, "common.material.materialThickness")
        && meaningful_at(data, "common.material.maxYieldStrength");

    let has_dimensions = meaningful_at(data, "common.material.coilWidth");

    let has_application = meaningful_at(data, "feed.feed.application");

    let has_equipment_model = meaningful_at(data, "common.equipment.straightener.model")
        || meaningful_at(data, "common.equipment.feed.model")
        || meaningful_at(data, "common.equipment.reel.model")
        || meaningful_at(data, "common.equipment.feed.lineType");

    has_material_specs && has_dimensions && (has_application || has_equipment_model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn press_feed_sheet() -> Value {
        json!({
            "feed": { "feed": { "application": "Press Feed" } },
            "common": {
                "material": {
                    "materialType": "Steel",
                    "materialThickness": 0.125,
                    "maxYieldStrength": 50000,
                    "coilWidth": 48
                }
            }
        })
    }

    #[test]
    fn minimum_data_gate_suppresses_triggers() {
        let data = json!({
            "feed": { "feed": { "application": "Press Feed" } },
            "common": { "material": { "materialType": "Steel" } }
        });
        // materialType's only rule requires materialThickness.
        assert!(triggered_tabs("common.material.materialType", &data).is_empty());
        assert!(!can_trigger_autofill("common.material.materialType", &data));
    }

    #[test]
    fn met_preconditions_release_visible_tabs() {
        let data = press_feed_sheet();
        let tabs = triggered_tabs("common.material.materialType", &data);
        assert!(tabs.contains(&Tab::MaterialSpecs));
        assert!(tabs.contains(&Tab::StrUtility));
        // Reel drive is in the rule but not visible without pull-through.
        assert!(!tabs.contains(&Tab::ReelDrive));
        assert!(can_trigger_autofill("common.material.materialType", &data));
    }

    #[test]
    fn hidden_tabs_are_dropped_from_triggers() {
        let data = json!({});
        let tabs = triggered_tabs("common.material.coilWidth", &data);
        // Only the two always-visible rule targets survive.
        assert_eq!(tabs, vec![Tab::MaterialSpecs, Tab::SummaryReport]);
    }

    #[test]
    fn unknown_fields_trigger_nothing() {
        assert!(triggered_tabs("common.material.unheardOf", &press_feed_sheet()).is_empty());
        assert_eq!(field_priority("common.material.unheardOf"), 0);
    }

    #[test]
    fn strategy_buckets_by_tab_kind() {
        let data = press_feed_sheet();
        let strategy = autofill_strategy("common.material.materialType", &data);
        assert!(strategy.immediate.contains(&Tab::Rfq));
        assert!(strategy.immediate.contains(&Tab::SummaryReport));
        assert!(strategy.calculated.contains(&Tab::MaterialSpecs));
        assert!(strategy.calculated.contains(&Tab::Feed));
        assert!(strategy.conditional.is_empty());
    }

    #[test]
    fn field_priority_is_the_maximum_across_rules() {
        assert_eq!(field_priority("common.material.materialType"), 100);
        assert_eq!(field_priority("common.coil.maxCoilOD"), 50);
        assert!(high_priority_fields().contains(&"feed.feed.application"));
        assert!(!high_priority_fields().contains(&"common.coil.maxCoilWeight"));
    }

    #[test]
    fn sufficiency_needs_material_dimensions_and_context() {
        assert!(has_sufficient_data(&press_feed_sheet()));

        let mut no_width = press_feed_sheet();
        no_width["common"]["material"]
            .as_object_mut()
            .expect("object")
            .remove("coilWidth");
        assert!(!has_sufficient_data(&no_width));

        let mut no_context = press_feed_sheet();
        no_context["feed"]["feed"]
            .as_object_mut()
            .expect("object")
            .remove("application");
        assert!(!has_sufficient_data(&no_context));

        // An equipment selection substitutes for the application.
        no_context["common"]["equipment"] =
            json!({ "feed": { "lineType": "Conventional" } });
        assert!(has_sufficient_data(&no_context));
    }

    #[test]
    fn zero_valued_preconditions_do_not_count() {
        let data = json!({
            "common": { "material": { "materialType": "Steel", "materialThickness": 0 } }
        });
        assert!(triggered_tabs("common.material.materialType", &data).is_empty());
    }
}
