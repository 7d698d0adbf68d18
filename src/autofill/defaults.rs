//! Declarative default-value rules, keyed by tab then field path.
//!
//! Every `value` function is total over a sparse record: absent or
//! unparseable inputs degrade to the hardcoded fallback constants.
//! The numeric formulas are domain heuristics carried over from the
//! engineering team's sizing tables; they are deliberately not
//! re-derived here.

use std::sync::OnceLock;

use serde_json::{json, Value};

use super::record::{
    is_present, nonempty_string_or, number_or, str_at, string_or, value_at, FieldPath,
};
use super::visibility::Tab;

/// A conditional default for one field: compute `value` when the field
/// is empty and `condition` (if any) holds.
pub struct DefaultRule {
    pub field: FieldPath,
    pub value: fn(&Value) -> Value,
    pub condition: Option<fn(&Value) -> bool>,
    pub priority: u8,
}

impl std::fmt::Debug for DefaultRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRule")
            .field("field", &self.field.raw())
            .field("priority", &self.priority)
            .finish()
    }
}

fn rule(field: &'static str, priority: u8, value: fn(&Value) -> Value) -> DefaultRule {
    DefaultRule {
        field: FieldPath::new(field),
        value,
        condition: None,
        priority,
    }
}

fn rule_if(
    field: &'static str,
    priority: u8,
    condition: fn(&Value) -> bool,
    value: fn(&Value) -> Value,
) -> DefaultRule {
    DefaultRule {
        field: FieldPath::new(field),
        value,
        condition: Some(condition),
        priority,
    }
}

/// The rules registered for a tab; empty for tabs without defaults.
pub fn defaults_for(tab: Tab) -> &'static [DefaultRule] {
    static TABLES: OnceLock<Vec<(Tab, Vec<DefaultRule>)>> = OnceLock::new();
    TABLES
        .get_or_init(build_tables)
        .iter()
        .find(|(t, _)| *t == tab)
        .map(|(_, rules)| rules.as_slice())
        .unwrap_or(&[])
}

/// Render a whole number without a trailing `.0`.
fn num(x: f64) -> Value {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 9e15 {
        json!(x as i64)
    } else {
        json!(x)
    }
}

fn roll_diameter(data: &Value) -> f64 {
    let thickness = number_or(data, "common.material.materialThickness", 0.07);
    f64::max(4.0, (thickness * 60.0 * 10.0).round() / 10.0)
}

fn high_torque_brake(data: &Value) -> bool {
    let coil_weight = number_or(data, "common.coil.maxCoilWeight", 2000.0);
    let coil_od = number_or(data, "common.coil.maxCoilOD", 60.0);
    let thickness = number_or(data, "common.material.materialThickness", 0.07);
    coil_weight > 2000.0 || coil_od > 48.0 || thickness > 0.05
}

fn reel_model(data: &Value) -> String {
    string_or(data, "common.equipment.reel.model", "")
}

fn build_tables() -> Vec<(Tab, Vec<DefaultRule>)> {
    vec![
        (Tab::Rfq, rfq_rules()),
        (Tab::SummaryReport, summary_report_rules()),
        (Tab::MaterialSpecs, material_specs_rules()),
        (Tab::StrUtility, str_utility_rules()),
        (Tab::Feed, feed_rules()),
        (Tab::ReelDrive, reel_drive_rules()),
        (Tab::Tddbhd, tddbhd_rules()),
        (Tab::RollStrBackbend, roll_str_backbend_rules()),
        (Tab::Shear, shear_rules()),
    ]
}

fn rfq_rules() -> Vec<DefaultRule> {
    vec![
        rule("feed.feed.application", 95, |data| {
            // Press Feed is the most common configuration.
            json!(nonempty_string_or(data, "feed.feed.application", "Press Feed"))
        }),
        rule_if(
            "common.equipment.feed.lineType",
            90,
            |data| is_present(data, "feed.feed.application"),
            |data| match str_at(data, "feed.feed.application") {
                Some("Press Feed") | Some("Cut To Length") => json!("Conventional"),
                Some("Standalone") => json!("Feed"),
                _ => json!("Conventional"),
            },
        ),
        rule_if(
            "common.equipment.feed.typeOfLine",
            88,
            |data| is_present(data, "feed.feed.application"),
            |data| {
                let line_type = str_at(data, "common.equipment.feed.lineType");
                match str_at(data, "feed.feed.application") {
                    Some("Press Feed") => {
                        if line_type == Some("Conventional") {
                            json!("Conventional")
                        } else {
                            json!("Compact")
                        }
                    }
                    Some("Cut To Length") => {
                        if line_type == Some("Conventional") {
                            json!("Conventional CTL")
                        } else {
                            json!("Compact CTL")
                        }
                    }
                    Some("Standalone") => {
                        json!(nonempty_string_or(data, "common.equipment.feed.lineType", "Feed"))
                    }
                    _ => json!("Conventional"),
                }
            },
        ),
        rule("feed.feed.pullThru.isPullThru", 85, |data| {
            let compact =
                str_at(data, "common.equipment.feed.lineType") == Some("Compact");
            let pull_through_line = str_at(data, "common.equipment.feed.typeOfLine")
                .map(|t| t.to_lowercase().contains("pull through"))
                .unwrap_or(false);
            if compact || pull_through_line {
                json!("Yes")
            } else {
                json!("No")
            }
        }),
        rule_if(
            "common.equipment.feed.controlsLevel",
            80,
            |data| is_present(data, "feed.feed.application"),
            |data| match str_at(data, "feed.feed.application") {
                Some("Press Feed") => json!("SyncMaster"),
                Some("Cut To Length") => json!("SyncMaster Plus"),
                _ => json!("Basic"),
            },
        ),
        rule("materialSpecs.feed.controls", 75, |data| {
            let controls_level = string_or(data, "common.equipment.feed.controlsLevel", "");
            if controls_level.contains("Sigma") {
                json!("Sigma 5 Feed")
            } else if controls_level.contains("Allen Bradley") {
                json!("Allen Bradley")
            } else if str_at(data, "feed.feed.application") == Some("Standalone") {
                json!("Basic Feed Controls")
            } else {
                json!("Standard Feed Controls")
            }
        }),
        rule_if(
            "materialSpecs.straightener.rolls.typeOfRoll",
            85,
            |data| {
                matches!(
                    str_at(data, "feed.feed.application"),
                    Some("Press Feed") | Some("Cut To Length") | Some("Standalone")
                )
            },
            |data| {
                let application = str_at(data, "feed.feed.application");
                let line_type = str_at(data, "common.equipment.feed.lineType");
                let press_or_ctl =
                    matches!(application, Some("Press Feed") | Some("Cut To Length"));
                if press_or_ctl && matches!(line_type, Some("Conventional") | Some("") | None) {
                    json!("7 Roll Str. Backbend")
                } else {
                    // No sensible roll default for other configurations.
                    json!("")
                }
            },
        ),
        rule("rfq.dates.date", 70, |_| {
            json!(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string())
        }),
        rule("rfq.coil.slitEdge", 75, |_| json!(true)),
        rule("rfq.coil.millEdge", 75, |_| json!(true)),
        rule("rfq.dies.progressiveDies", 75, |_| json!(true)),
        rule("rfq.dies.transferDies", 70, |_| json!(false)),
        rule("rfq.dies.blankingDies", 70, |_| json!(false)),
    ]
}

fn summary_report_rules() -> Vec<DefaultRule> {
    vec![
        rule("common.customer", 60, |_| json!("Sample Customer")),
        rule_if(
            "common.equipment.reel.model",
            80,
            |data| is_present(data, "common.material.coilWidth"),
            |data| {
                let width = number_or(data, "common.material.coilWidth", 48.0);
                let weight = number_or(data, "common.coil.maxCoilWeight", 4000.0);
                // Reel sizing ladder by width and coil weight.
                let model = if width <= 12.0 && weight <= 5000.0 {
                    "CPR-040"
                } else if width <= 24.0 && weight <= 10000.0 {
                    "CPR-060"
                } else if width <= 36.0 && weight <= 15000.0 {
                    "CPR-080"
                } else if width <= 48.0 && weight <= 20000.0 {
                    "CPR-100"
                } else if width <= 60.0 && weight <= 30000.0 {
                    "CPR-150"
                } else {
                    "CPR-040"
                };
                json!(model)
            },
        ),
        rule_if(
            "common.equipment.reel.width",
            80,
            |data| is_present(data, "common.material.coilWidth"),
            |data| {
                let coil_width = number_or(data, "common.material.coilWidth", 48.0);
                // Round up to the nearest foot.
                num((coil_width / 12.0).ceil() * 12.0)
            },
        ),
        rule_if(
            "common.equipment.reel.backplate.diameter",
            80,
            |data| is_present(data, "common.coil.coilID"),
            |data| {
                let coil_id = number_or(data, "common.coil.coilID", 20.0);
                // At least 4" larger than the coil ID.
                num(f64::max(coil_id + 4.0, 24.0))
            },
        ),
        rule("reelDrive.reel.motorization.isMotorized", 85, |data| {
            if str_at(data, "feed.feed.pullThru.isPullThru") == Some("Yes") {
                return json!("Yes");
            }
            if str_at(data, "feed.feed.application") == Some("Standalone") {
                let motorized = matches!(
                    str_at(data, "common.equipment.feed.lineType"),
                    Some("Reel-Motorized") | Some("Straightener-Reel Combination")
                );
                return json!(if motorized { "Yes" } else { "No" });
            }
            json!("No")
        }),
        rule("common.equipment.feed.typeOfLine", 85, |data| {
            let application = str_at(data, "feed.feed.application");
            let line_type = str_at(data, "common.equipment.feed.lineType");
            if application == Some("Standalone") {
                if let Some(line_type) = line_type.filter(|t| !t.is_empty()) {
                    let mapped = match line_type {
                        "Feed" => "Standalone Feed Line",
                        "Feed-Shear" => "Feed-Shear Configuration",
                        "Straightener" => "Standalone Straightener",
                        "Reel-Motorized" => "Motorized Reel Configuration",
                        "Reel-Pull Off" => "Pull-Off Reel Configuration",
                        "Straightener-Reel Combination" => "Straightener-Reel Combination",
                        "Threading Table" => "Threading Table Configuration",
                        "Other" => "Custom Configuration",
                        other => other,
                    };
                    return json!(mapped);
                }
            }
            json!(nonempty_string_or(
                data,
                "common.equipment.feed.typeOfLine",
                "Standard Configuration"
            ))
        }),
    ]
}

fn material_specs_rules() -> Vec<DefaultRule> {
    vec![
        rule_if(
            "common.material.materialDensity",
            80,
            |data| is_present(data, "common.material.materialType"),
            |data| {
                let material = string_or(data, "common.material.materialType", "").to_lowercase();
                if material.contains("steel") {
                    json!(0.284)
                } else if material.contains("aluminum") {
                    json!(0.098)
                } else if material.contains("stainless") {
                    json!(0.289)
                } else {
                    json!(0.284)
                }
            },
        ),
        rule_if(
            "materialSpecs.material.minBendRadius",
            90,
            |data| {
                is_present(data, "common.material.materialThickness")
                    && is_present(data, "common.material.maxYieldStrength")
            },
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.0);
                let yield_strength = number_or(data, "common.material.maxYieldStrength", 50000.0);
                // R = t * (UTS / (2 * sigma_bend)), 40 ksi bending stress.
                num(thickness * (yield_strength / (2.0 * 40000.0)))
            },
        ),
    ]
}

fn str_utility_rules() -> Vec<DefaultRule> {
    vec![
        rule_if(
            "common.equipment.straightener.model",
            80,
            |data| is_present(data, "common.material.coilWidth"),
            |data| {
                let width = number_or(data, "common.material.coilWidth", 48.0);
                let thickness = number_or(data, "common.material.materialThickness", 0.125);
                let light = thickness <= 0.1;
                let model = if width <= 36.0 {
                    if light { "STR-250-Light" } else { "STR-250-Standard" }
                } else if width <= 60.0 {
                    if light { "STR-306-Light" } else { "STR-306-Standard" }
                } else if light {
                    "STR-400-Light"
                } else {
                    "STR-400-Standard"
                };
                json!(model)
            },
        ),
        rule_if(
            "strUtility.straightener.feedRate",
            75,
            |data| is_present(data, "common.feedRates.average.spm"),
            |data| {
                let spm = number_or(data, "common.feedRates.average.spm", 30.0);
                let length = number_or(data, "common.feedRates.average.length", 12.0);
                num((spm * length).round())
            },
        ),
        rule_if(
            "strUtility.straightener.horsepower",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.125);
                let width = number_or(data, "common.material.coilWidth", 12.0);
                let yield_strength = number_or(data, "common.material.maxYieldStrength", 50000.0);
                // HP = (Force * Speed) / 550 with a 1.5 safety factor.
                let estimated = (thickness * width * yield_strength * 1.5) / 550_000.0;
                num(f64::max(5.0, estimated.ceil()))
            },
        ),
    ]
}

fn feed_rules() -> Vec<DefaultRule> {
    vec![
        rule("common.equipment.feed.direction", 60, |_| json!("Left to Right")),
        rule_if(
            "feed.feed.accelerationRate",
            70,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.125);
                // 2-8 ft/sec^2, slower for thicker material.
                num(f64::max(2.0, f64::min(8.0, 10.0 - thickness * 4.0)))
            },
        ),
        rule_if(
            "feed.feed.motor.hp",
            85,
            |data| is_present(data, "reelDrive.reel.motorization.speed"),
            |data| {
                let reel_speed = number_or(data, "reelDrive.reel.motorization.speed", 400.0);
                let coil_weight = number_or(data, "common.coil.maxCoilWeight", 30000.0);
                let width = number_or(data, "common.material.coilWidth", 3.0);
                num((reel_speed * coil_weight * width / 33000.0 * 1.5).round())
            },
        ),
        rule_if(
            "feed.feed.motor.torque",
            80,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let coil_weight = number_or(data, "common.coil.maxCoilWeight", 30000.0);
                let width = number_or(data, "common.material.coilWidth", 3.0);
                num((coil_weight * width / 100.0).round())
            },
        ),
        rule_if(
            "feed.feed.feedConfiguration",
            90,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                if thickness <= 0.05 {
                    json!("Light Gauge Configuration")
                } else if thickness <= 0.125 {
                    json!("Medium Gauge Configuration")
                } else {
                    json!("Heavy Gauge Configuration")
                }
            },
        ),
        rule_if(
            "feed.feed.feedRolls.diameter",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                // 80x thickness, 6" minimum.
                num(f64::max(6.0, (thickness * 80.0 * 10.0).round() / 10.0))
            },
        ),
        rule("feed.feed.feedRolls.material", 70, |_| json!("Tool Steel D2")),
        rule("feed.feed.feedRolls.hardness", 70, |_| json!(58)),
        rule_if(
            "feed.feed.feedRolls.grip.pressure",
            85,
            |data| {
                is_present(data, "common.material.maxYieldStrength")
                    && is_present(data, "common.material.materialThickness")
            },
            |data| {
                let yield_strength = number_or(data, "common.material.maxYieldStrength", 45000.0);
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                num((yield_strength * thickness * 0.12).round())
            },
        ),
        rule_if(
            "feed.feed.threading.webGuides.quantity",
            75,
            |data| is_present(data, "common.material.coilWidth"),
            |data| {
                let width = number_or(data, "common.material.coilWidth", 3.0);
                // One per two feet of width, at least two.
                num(f64::max(2.0, (width / 2.0).ceil()))
            },
        ),
        rule("feed.feed.threading.webGuides.type", 70, |_| {
            json!("Adjustable Side Guides")
        }),
        rule_if(
            "feed.feed.threading.threadingSpeed",
            80,
            |data| is_present(data, "reelDrive.reel.motorization.speed"),
            |data| {
                let normal_speed = number_or(data, "reelDrive.reel.motorization.speed", 400.0);
                // Threading runs at 10% of line speed.
                num((normal_speed * 0.1).round())
            },
        ),
        rule("feed.feed.servo.positioning.accuracy", 75, |_| json!(0.001)),
        rule("feed.feed.servo.positioning.repeatability", 75, |_| json!(0.0005)),
    ]
}

fn reel_drive_rules() -> Vec<DefaultRule> {
    vec![
        rule_if(
            "reelDrive.reel.motorization.driveHorsepower",
            80,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let coil_weight = number_or(data, "common.coil.maxCoilWeight", 5000.0);
                let speed = number_or(data, "reelDrive.reel.motorization.speed", 100.0);
                let estimated = (coil_weight * speed) / 10000.0;
                num(f64::max(3.0, estimated.ceil()))
            },
        ),
        rule_if(
            "reelDrive.reel.motorization.accelRate",
            75,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let coil_weight = number_or(data, "common.coil.maxCoilWeight", 5000.0);
                // 5-25 fpm/sec, slower for heavier coils.
                num(f64::max(5.0, f64::min(25.0, 30.0 - coil_weight / 1000.0)))
            },
        ),
    ]
}

fn tddbhd_rules() -> Vec<DefaultRule> {
    vec![
        rule_if(
            "tddbhd.coil.coilOD",
            90,
            |data| is_present(data, "common.coil.maxCoilOD"),
            |data| num(number_or(data, "common.coil.maxCoilOD", 60.0)),
        ),
        rule_if(
            "tddbhd.coil.coilWeight",
            90,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| num(number_or(data, "common.coil.maxCoilWeight", 4000.0)),
        ),
        rule_if(
            "tddbhd.reel.webTension.lbs",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                let width = number_or(data, "common.material.coilWidth", 3.0);
                let yield_strength = number_or(data, "common.material.maxYieldStrength", 45000.0);
                // Web tension at 25% of yield.
                num((yield_strength * thickness * width * 0.25).round())
            },
        ),
        rule_if(
            "tddbhd.reel.dragBrake.torque",
            80,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let coil_weight = number_or(data, "common.coil.maxCoilWeight", 4000.0);
                let coil_od = number_or(data, "common.coil.maxCoilOD", 60.0);
                num((coil_weight * coil_od / 100.0).round())
            },
        ),
        rule_if(
            "tddbhd.reel.dragBrake.model",
            70,
            |data| is_present(data, "common.equipment.reel.model"),
            |data| {
                if high_torque_brake(data) {
                    return json!("Failsafe - Double Stage");
                }
                if reel_model(data) == "CPR-040" {
                    // B1 brake family handles light loads only.
                    json!("Failsafe - Single Stage")
                } else {
                    json!("Failsafe - Double Stage")
                }
            },
        ),
        rule("tddbhd.reel.dragBrake.quantity", 70, |_| json!(1)),
        rule_if(
            "tddbhd.reel.dragBrake.holdingForce",
            75,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let base_force: f64 = if high_torque_brake(data) { 2385.0 } else { 1000.0 };
                // baseForce * friction * pads * brake distance * quantity
                // with friction=0.35, pads=2, distance=12, quantity=1.
                num((base_force * 0.35 * 2.0 * 12.0 * 1.0).round())
            },
        ),
        rule("tddbhd.reel.dragBrake.psiAirRequired", 70, |_| json!(80)),
        rule("tddbhd.reel.airPressureAvailable", 70, |_| json!(80)),
        rule("tddbhd.reel.coefficientOfFriction", 70, |_| json!(0.35)),
        rule("tddbhd.reel.cylinderBore", 70, |data| {
            let brake_model =
                string_or(data, "tddbhd.reel.dragBrake.model", "Failsafe - Single Stage");
            if brake_model.contains("Single Stage") {
                json!(5)
            } else if brake_model.contains("Double Stage") || brake_model.contains("Triple Stage") {
                json!(4)
            } else {
                json!(5)
            }
        }),
        rule("tddbhd.reel.requiredDecelRate", 70, |_| json!(8)),
        rule_if(
            "tddbhd.reel.brakePadDiameter",
            75,
            |data| is_present(data, "common.equipment.reel.model"),
            |data| {
                let model = reel_model(data);
                if model.contains("040") {
                    json!(12)
                } else if model.contains("150") {
                    json!(16)
                } else {
                    json!(14)
                }
            },
        ),
        rule_if(
            "tddbhd.reel.minMaterialWidth",
            75,
            |data| is_present(data, "common.material.coilWidth"),
            |data| {
                let width = number_or(data, "common.material.coilWidth", 3.0);
                // 80% of max width, 0.5" floor.
                num(f64::max(0.5, width * 0.8))
            },
        ),
        rule("tddbhd.reel.confirmedMinWidth", 75, |_| json!(true)),
        rule_if(
            "tddbhd.reel.holddown.assy",
            70,
            |data| is_present(data, "common.equipment.reel.model"),
            |data| {
                let model = reel_model(data);
                if model == "CPR-040" {
                    json!("LD_NARROW")
                } else if model.contains("CPR-060") || model.contains("CPR-080") {
                    json!("LD_STANDARD")
                } else if model.contains("CPR-100")
                    || model.contains("CPR-150")
                    || model.contains("CPR-200")
                    || model.contains("CPR-300")
                    || model.contains("CPR-400")
                {
                    json!("MD")
                } else if model.contains("CPR-500") || model.contains("CPR-600") {
                    json!("HD_Single")
                } else {
                    json!("LD_NARROW")
                }
            },
        ),
        rule_if(
            "tddbhd.reel.holddown.cylinder",
            70,
            |data| is_present(data, "common.equipment.reel.model"),
            |data| {
                let model = reel_model(data);
                if model == "CPR-040"
                    || model.contains("CPR-060")
                    || model.contains("CPR-080")
                {
                    json!("4in Air")
                } else if model.contains("CPR-100")
                    || model.contains("CPR-150")
                    || model.contains("CPR-200")
                    || model.contains("CPR-300")
                    || model.contains("CPR-400")
                    || model.contains("CPR-500")
                    || model.contains("CPR-600")
                {
                    json!("Hydraulic")
                } else {
                    json!("4in Air")
                }
            },
        ),
        rule("tddbhd.reel.holddown.cylinderPressure", 70, |data| {
            let cylinder = string_or(data, "tddbhd.reel.holddown.cylinder", "");
            if cylinder.contains("Hydraulic") {
                json!(750)
            } else {
                json!(80)
            }
        }),
        rule_if(
            "tddbhd.reel.holddown.force.required",
            80,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let coil_weight = number_or(data, "common.coil.maxCoilWeight", 4000.0);
                num((coil_weight * 0.15).round())
            },
        ),
        rule_if(
            "tddbhd.reel.holddown.force.available",
            75,
            |data| is_present(data, "common.coil.maxCoilWeight"),
            |data| {
                let required =
                    (number_or(data, "common.coil.maxCoilWeight", 4000.0) * 0.15).round();
                // 50% safety factor over the required force.
                num((required * 1.5).round())
            },
        ),
        rule_if(
            "tddbhd.reel.threadingDrive.airClutch",
            70,
            |data| is_present(data, "common.equipment.reel.model"),
            |data| {
                if reel_model(data) == "CPR-040" {
                    json!("No")
                } else {
                    json!("Yes")
                }
            },
        ),
        rule_if(
            "tddbhd.reel.threadingDrive.hydThreadingDrive",
            70,
            |data| is_present(data, "common.equipment.reel.model"),
            |data| {
                let model = reel_model(data);
                if model == "CPR-040" {
                    json!("None")
                } else if model.contains("CPR-060") || model.contains("CPR-080") {
                    json!("22 cu in (D-15125)")
                } else if model.contains("CPR-100")
                    || model.contains("CPR-150")
                    || model.contains("CPR-200")
                    || model.contains("CPR-300")
                    || model.contains("CPR-400")
                {
                    json!("22 cu in (D-12689)")
                } else {
                    json!("None")
                }
            },
        ),
    ]
}

fn roll_str_backbend_rules() -> Vec<DefaultRule> {
    vec![
        rule_if(
            "rollStrBackbend.rollConfiguration",
            85,
            |data| is_present(data, "common.equipment.straightener.numberOfRolls"),
            |data| {
                let rolls = match value_at(data, "common.equipment.straightener.numberOfRolls") {
                    Some(Value::Number(n)) => n
                        .as_i64()
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| n.to_string()),
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    _ => "7".to_string(),
                };
                json!(format!("{rolls}-Roll Configuration"))
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.typeOfRoll",
            90,
            |data| is_present(data, "materialSpecs.straightener.rolls.typeOfRoll"),
            |data| {
                json!(nonempty_string_or(
                    data,
                    "materialSpecs.straightener.rolls.typeOfRoll",
                    "7 Roll Str. Backbend"
                ))
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rollDiameter",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| num(roll_diameter(data)),
        ),
        rule_if(
            "rollStrBackbend.straightener.centerDistance",
            80,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                // 1.2x the roll diameter.
                num((roll_diameter(data) * 1.2 * 10.0).round() / 10.0)
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.jackForceAvailable",
            80,
            |data| is_present(data, "common.equipment.straightener.model"),
            |data| {
                let model = string_or(data, "common.equipment.straightener.model", "");
                if model.contains("250") {
                    json!(25000)
                } else if model.contains("306") {
                    json!(50000)
                } else {
                    json!(30000)
                }
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.rollers.depthRequired",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                // Penetration depth at 60% of thickness.
                num((thickness * 0.6 * 1000.0).round() / 1000.0)
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.rollers.forceRequired",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                let width = number_or(data, "common.material.coilWidth", 3.0);
                let yield_strength = number_or(data, "common.material.maxYieldStrength", 45000.0);
                num((thickness * width * yield_strength * 0.5).round())
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.rollers.first.height",
            80,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                let diameter = roll_diameter(data);
                num(((diameter / 2.0 + thickness * 0.6) * 1000.0).round() / 1000.0)
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.rollers.middle.height",
            80,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                let diameter = roll_diameter(data);
                num(((diameter / 2.0 + thickness * 0.4) * 1000.0).round() / 1000.0)
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.rollers.last.height",
            80,
            |data| is_present(data, "common.material.materialThickness"),
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                let diameter = roll_diameter(data);
                num(((diameter / 2.0 + thickness * 0.2) * 1000.0).round() / 1000.0)
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.radius.radiusAtYield",
            85,
            |data| {
                is_present(data, "common.material.materialThickness")
                    && is_present(data, "common.material.maxYieldStrength")
            },
            |data| {
                let thickness = number_or(data, "common.material.materialThickness", 0.07);
                let yield_strength = number_or(data, "common.material.maxYieldStrength", 45000.0);
                let modulus = 29_000_000.0; // steel
                num((modulus * thickness / (2.0 * yield_strength) * 100.0).round() / 100.0)
            },
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.radius.comingOffCoil",
            80,
            |data| is_present(data, "common.coil.maxCoilOD"),
            |data| num(number_or(data, "common.coil.maxCoilOD", 60.0) / 2.0),
        ),
        rule_if(
            "rollStrBackbend.straightener.rolls.backbend.requiredRollDiameter",
            85,
            |data| is_present(data, "common.material.materialThickness"),
            |data| num(roll_diameter(data)),
        ),
    ]
}

fn shear_rules() -> Vec<DefaultRule> {
    vec![rule_if(
        "shear.shear.hydraulic.pressure",
        85,
        |data| is_present(data, "common.material.materialThickness"),
        |data| {
            let thickness = number_or(data, "common.material.materialThickness", 0.125);
            let tensile = super::record::number_at(data, "common.material.maxTensileStrength")
                .or_else(|| super::record::number_at(data, "common.material.maxYieldStrength"))
                .unwrap_or(50000.0);
            // 2x safety factor on the shear force.
            num((tensile * thickness * 2.0).round())
        },
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_tab_with_defaults_has_rules() {
        for tab in [
            Tab::Rfq,
            Tab::SummaryReport,
            Tab::MaterialSpecs,
            Tab::StrUtility,
            Tab::Feed,
            Tab::ReelDrive,
            Tab::Tddbhd,
            Tab::RollStrBackbend,
            Tab::Shear,
        ] {
            assert!(!defaults_for(tab).is_empty(), "no rules for {tab}");
        }
    }

    #[test]
    fn value_functions_are_total_over_an_empty_record() {
        let empty = json!({});
        for tab in Tab::ALL {
            for rule in defaults_for(tab) {
                // Conditions may veto, but values must never panic.
                let _ = (rule.value)(&empty);
                if let Some(condition) = rule.condition {
                    let _ = condition(&empty);
                }
            }
        }
    }

    #[test]
    fn reel_model_ladder_tracks_width_and_weight() {
        let narrow = json!({
            "common": { "material": { "coilWidth": 10 }, "coil": { "maxCoilWeight": 4000 } }
        });
        let wide = json!({
            "common": { "material": { "coilWidth": 54 }, "coil": { "maxCoilWeight": 25000 } }
        });
        let reel_rule = defaults_for(Tab::SummaryReport)
            .iter()
            .find(|r| r.field.raw() == "common.equipment.reel.model")
            .expect("reel model rule");
        assert_eq!((reel_rule.value)(&narrow), json!("CPR-040"));
        assert_eq!((reel_rule.value)(&wide), json!("CPR-150"));
    }

    #[test]
    fn brake_model_prefers_double_stage_for_demanding_coils() {
        let heavy = json!({
            "common": {
                "equipment": { "reel": { "model": "CPR-040" } },
                "coil": { "maxCoilWeight": 9000, "maxCoilOD": 60 },
                "material": { "materialThickness": 0.125 }
            }
        });
        let light = json!({
            "common": {
                "equipment": { "reel": { "model": "CPR-040" } },
                "coil": { "maxCoilWeight": 1500, "maxCoilOD": 40 },
                "material": { "materialThickness": 0.03 }
            }
        });
        let brake_rule = defaults_for(Tab::Tddbhd)
            .iter()
            .find(|r| r.field.raw() == "tddbhd.reel.dragBrake.model")
            .expect("brake model rule");
        assert_eq!((brake_rule.value)(&heavy), json!("Failsafe - Double Stage"));
        assert_eq!((brake_rule.value)(&light), json!("Failsafe - Single Stage"));
    }

    #[test]
    fn holding_force_scales_with_brake_duty() {
        let heavy = json!({
            "common": { "coil": { "maxCoilWeight": 9000, "maxCoilOD": 60 } }
        });
        let light = json!({
            "common": {
                "coil": { "maxCoilWeight": 1500, "maxCoilOD": 40 },
                "material": { "materialThickness": 0.03 }
            }
        });
        let force_rule = defaults_for(Tab::Tddbhd)
            .iter()
            .find(|r| r.field.raw() == "tddbhd.reel.dragBrake.holdingForce")
            .expect("holding force rule");
        // baseForce * 0.35 friction * 2 pads * 12" * 1 brake
        assert_eq!((force_rule.value)(&heavy), json!(20034));
        assert_eq!((force_rule.value)(&light), json!(8400));
    }

    #[test]
    fn empty_line_type_counts_as_unset_for_the_roll_default() {
        let roll_rule = defaults_for(Tab::Rfq)
            .iter()
            .find(|r| r.field.raw() == "materialSpecs.straightener.rolls.typeOfRoll")
            .expect("roll type rule");
        let blank = json!({
            "feed": { "feed": { "application": "Press Feed" } },
            "common": { "equipment": { "feed": { "lineType": "" } } }
        });
        let compact = json!({
            "feed": { "feed": { "application": "Press Feed" } },
            "common": { "equipment": { "feed": { "lineType": "Compact" } } }
        });
        assert_eq!((roll_rule.value)(&blank), json!("7 Roll Str. Backbend"));
        assert_eq!((roll_rule.value)(&compact), json!(""));
    }

    #[test]
    fn roll_diameter_formula_floors_at_four_inches() {
        let thin = json!({ "common": { "material": { "materialThickness": 0.03 } } });
        let thick = json!({ "common": { "material": { "materialThickness": 0.125 } } });
        assert_eq!(roll_diameter(&thin), 4.0);
        assert_eq!(roll_diameter(&thick), 7.5);
    }

    #[test]
    fn line_type_default_follows_the_application() {
        let line_type_rule = defaults_for(Tab::Rfq)
            .iter()
            .find(|r| r.field.raw() == "common.equipment.feed.lineType")
            .expect("line type rule");
        let press = json!({ "feed": { "feed": { "application": "Press Feed" } } });
        let standalone = json!({ "feed": { "feed": { "application": "Standalone" } } });
        assert_eq!((line_type_rule.value)(&press), json!("Conventional"));
        assert_eq!((line_type_rule.value)(&standalone), json!("Feed"));
    }
}
