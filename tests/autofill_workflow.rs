use serde_json::{json, Value};
use sheet_autofill::autofill::{
    transform_sheet_data, AutofillEngine, AutofillOptions, Tab,
};

/// A press-feed sheet as the form submits it: every value typed as a
/// string.
fn press_feed_submission() -> Value {
    json!({
        "feed": {
            "feed": {
                "application": "Press Feed",
                "pullThru": { "isPullThru": "No" }
            }
        },
        "common": {
            "material": {
                "materialType": "Steel",
                "materialThickness": "0.125",
                "maxYieldStrength": "50000",
                "coilWidth": "48"
            },
            "coil": {
                "maxCoilWeight": "20000",
                "maxCoilOD": "60",
                "coilID": "20"
            },
            "equipment": { "feed": { "lineType": "Conventional" } },
            "feedRates": { "average": { "length": "12", "spm": "30" } }
        }
    })
}

#[test]
fn submission_strings_normalize_before_rules_run() {
    let transformed = transform_sheet_data(&press_feed_submission());
    assert_eq!(transformed["common"]["material"]["materialThickness"], json!(0.125));
    assert_eq!(transformed["common"]["coil"]["maxCoilWeight"], json!(20000));
    assert_eq!(transformed["common"]["coil"]["coilID"], json!(20));
    // Labels stay strings.
    assert_eq!(transformed["common"]["material"]["materialType"], json!("Steel"));
    assert_eq!(
        transformed["common"]["equipment"]["feed"]["lineType"],
        json!("Conventional")
    );
}

#[test]
fn full_generation_pass_over_a_press_feed_sheet() {
    let engine = AutofillEngine::default();
    let result = engine.generate(
        &press_feed_submission(),
        &AutofillOptions::for_sheet("sheet-1"),
    );

    assert!(result.success);
    assert_eq!(
        result.visible_tabs,
        vec![
            Tab::Rfq,
            Tab::MaterialSpecs,
            Tab::Tddbhd,
            Tab::StrUtility,
            Tab::RollStrBackbend,
            Tab::Feed,
            Tab::SummaryReport,
        ]
    );

    assert!(result.metadata.has_sufficient_data);
    assert!(result.metadata.should_trigger_initial_autofill);
    assert!(result.metadata.skipped_fields.is_empty());

    let progress = result
        .metadata
        .completion_progress
        .expect("progress computed");
    assert_eq!(progress.rfq.percentage, 100.0);
    assert_eq!(progress.overall.percentage, 100.0);

    let suggestions = &result.suggestions;

    // Sized from the material specs.
    assert_eq!(
        suggestions.get("common.equipment.straightener.model"),
        Some(&json!("STR-306-Standard"))
    );
    assert_eq!(
        suggestions.get("common.material.materialDensity"),
        Some(&json!(0.284))
    );
    assert_eq!(
        suggestions.get("materialSpecs.material.minBendRadius"),
        Some(&json!(0.078125))
    );

    // Feed-rate arithmetic: 30 spm at 12 inches.
    assert_eq!(
        suggestions.get("strUtility.straightener.feedRate"),
        Some(&json!(360))
    );
    // Straightener horsepower floors at 5.
    assert_eq!(
        suggestions.get("strUtility.straightener.horsepower"),
        Some(&json!(5))
    );

    // Threading, drag brake, and holddown sizing from coil specs.
    assert_eq!(suggestions.get("tddbhd.coil.coilOD"), Some(&json!(60)));
    assert_eq!(suggestions.get("tddbhd.coil.coilWeight"), Some(&json!(20000)));
    assert_eq!(
        suggestions.get("tddbhd.reel.webTension.lbs"),
        Some(&json!(75000))
    );
    assert_eq!(
        suggestions.get("tddbhd.reel.dragBrake.torque"),
        Some(&json!(12000))
    );

    // Feed sizing.
    assert_eq!(
        suggestions.get("feed.feed.feedConfiguration"),
        Some(&json!("Medium Gauge Configuration"))
    );
    assert_eq!(
        suggestions.get("feed.feed.feedRolls.diameter"),
        Some(&json!(10))
    );

    // User-entered fields are untouched.
    assert!(!suggestions.contains_key("feed.feed.application"));
    assert!(!suggestions.contains_key("common.material.materialThickness"));
    assert!(!suggestions.contains_key("common.equipment.feed.lineType"));

    // Hidden tabs contribute nothing. The summary tab still answers
    // the motorization question, with "No" for a plain press feed.
    assert!(!suggestions.keys().any(|path| path.starts_with("shear.")));
    assert_eq!(
        suggestions.get("reelDrive.reel.motorization.isMotorized"),
        Some(&json!("No"))
    );
    assert!(!suggestions.contains_key("reelDrive.reel.motorization.driveHorsepower"));
}

#[test]
fn initial_autofill_fires_once_then_settles() {
    let engine = AutofillEngine::default();
    let options = AutofillOptions::for_sheet("sheet-42");
    let data = press_feed_submission();

    let first = engine.generate(&data, &options);
    assert!(first.metadata.should_trigger_initial_autofill);

    let second = engine.generate(&data, &options);
    assert!(!second.metadata.should_trigger_initial_autofill);
    // The suggestions themselves are unchanged between passes.
    assert_eq!(first.suggestions, second.suggestions);
}

#[test]
fn changed_field_limits_recomputation_to_affected_visible_tabs() {
    let engine = AutofillEngine::default();
    let options = AutofillOptions {
        sheet_id: Some("sheet-1".into()),
        changed_field: Some("common.material.materialThickness".into()),
        transform: true,
    };

    let result = engine.generate(&press_feed_submission(), &options);
    assert_eq!(
        result.triggered_tabs,
        vec![
            Tab::MaterialSpecs,
            Tab::RollStrBackbend,
            Tab::StrUtility,
            Tab::Feed,
        ]
    );
}

#[test]
fn sparse_sheet_reports_insufficient_data_but_still_suggests() {
    let engine = AutofillEngine::default();
    let sparse = json!({
        "common": { "material": { "materialType": "Steel" } }
    });

    let result = engine.generate(&sparse, &AutofillOptions::for_sheet("sheet-9"));
    assert!(result.success);
    assert!(!result.metadata.has_sufficient_data);
    assert!(!result.metadata.should_trigger_initial_autofill);
    assert_eq!(
        result.visible_tabs,
        vec![Tab::Rfq, Tab::MaterialSpecs, Tab::SummaryReport]
    );

    // Range-rule corrections still arrive for the missing criticals.
    assert_eq!(
        result.suggestions.get("common.material.materialThickness"),
        Some(&json!(0.125))
    );
    assert_eq!(
        result.suggestions.get("common.material.maxYieldStrength"),
        Some(&json!(50000))
    );
    assert_eq!(
        result.suggestions.get("common.material.coilWidth"),
        Some(&json!(12))
    );
}
