//! Resolves which form tabs apply to a sheet from a small snapshot of
//! configuration fields. Recomputed from scratch on every call; the
//! output ordering is fixed and must stay stable for the UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{first_meaningful_at, str_at};

/// Closed set of performance-sheet tab identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    Rfq,
    MaterialSpecs,
    Tddbhd,
    StrUtility,
    RollStrBackbend,
    ReelDrive,
    Feed,
    Shear,
    SummaryReport,
}

impl Tab {
    pub const ALL: [Tab; 9] = [
        Tab::Rfq,
        Tab::MaterialSpecs,
        Tab::Tddbhd,
        Tab::StrUtility,
        Tab::RollStrBackbend,
        Tab::ReelDrive,
        Tab::Feed,
        Tab::Shear,
        Tab::SummaryReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Rfq => "rfq",
            Tab::MaterialSpecs => "material-specs",
            Tab::Tddbhd => "tddbhd",
            Tab::StrUtility => "str-utility",
            Tab::RollStrBackbend => "roll-str-backbend",
            Tab::ReelDrive => "reel-drive",
            Tab::Feed => "feed",
            Tab::Shear => "shear",
            Tab::SummaryReport => "summary-report",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Rfq => "RFQ",
            Tab::MaterialSpecs => "Material Specs",
            Tab::Tddbhd => "TDDBHD",
            Tab::StrUtility => "Str Utility",
            Tab::RollStrBackbend => "Roll Straightener",
            Tab::ReelDrive => "Reel Drive",
            Tab::Feed => "Feed",
            Tab::Shear => "Shear",
            Tab::SummaryReport => "Equipment Summary",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tab entry as presented to the caller, with the occasional
/// configuration-dependent display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleTab {
    pub label: &'static str,
    pub value: Tab,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_label: Option<&'static str>,
}

impl VisibleTab {
    fn plain(tab: Tab) -> Self {
        Self {
            label: tab.label(),
            value: tab,
            dynamic_label: None,
        }
    }

    fn with_dynamic_label(tab: Tab, dynamic_label: &'static str) -> Self {
        Self {
            label: tab.label(),
            value: tab,
            dynamic_label: Some(dynamic_label),
        }
    }
}

/// Canonical line application. Form inputs arrive in several spellings
/// ("Press Feed", "pressFeed"); anything unrecognized passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineApplication {
    PressFeed,
    CutToLength,
    Standalone,
    Other(String),
}

impl LineApplication {
    pub fn from_raw(raw: &str) -> Self {
        let normalized: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match normalized.as_str() {
            "pressfeed" => LineApplication::PressFeed,
            "cuttolength" => LineApplication::CutToLength,
            "standalone" => LineApplication::Standalone,
            _ => LineApplication::Other(raw.to_string()),
        }
    }

    fn is_press_or_ctl(&self) -> bool {
        matches!(self, LineApplication::PressFeed | LineApplication::CutToLength)
    }
}

/// Snapshot of the configuration fields that drive tab visibility.
#[derive(Debug, Clone, Default)]
pub struct TabVisibilityConfig {
    pub application: Option<LineApplication>,
    pub line_type: Option<String>,
    pub pull_through: Option<String>,
    pub controls_level: Option<String>,
    pub type_of_line: Option<String>,
    pub feed_controls: Option<String>,
    pub select_roll: Option<String>,
}

impl TabVisibilityConfig {
    /// Ordered candidate locations for the selected roll type; the
    /// first one holding a meaningful value wins.
    const SELECT_ROLL_PATHS: [&'static str; 3] = [
        "materialSpecs.straightener.rolls.typeOfRoll",
        "rollStrBackbend.straightener.rolls.typeOfRoll",
        "materialSpecs.straightener.selectRoll",
    ];

    pub fn from_record(data: &Value) -> Self {
        Self {
            application: str_at(data, "feed.feed.application").map(LineApplication::from_raw),
            line_type: str_at(data, "common.equipment.feed.lineType").map(str::to_string),
            pull_through: str_at(data, "feed.feed.pullThru.isPullThru").map(str::to_string),
            controls_level: str_at(data, "common.equipment.feed.controlsLevel")
                .map(str::to_string),
            type_of_line: str_at(data, "common.equipment.feed.typeOfLine").map(str::to_string),
            feed_controls: str_at(data, "materialSpecs.feed.controls").map(str::to_string),
            select_roll: first_meaningful_at(data, &Self::SELECT_ROLL_PATHS)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    fn line_type_is(&self, expected: &str) -> bool {
        self.line_type.as_deref() == Some(expected)
    }

    fn type_of_line_contains_lower(&self, needle: &str) -> bool {
        self.type_of_line
            .as_deref()
            .map(|t| t.to_lowercase().contains(needle))
            .unwrap_or(false)
    }

    fn type_of_line_contains(&self, needle: &str) -> bool {
        self.type_of_line
            .as_deref()
            .map(|t| t.contains(needle))
            .unwrap_or(false)
    }
}

/// Determine the ordered list of visible tabs for a record.
///
/// `rfq` and `material-specs` always lead, `summary-report` always
/// closes; the conditional tabs appear in a fixed relative order.
pub fn visible_tabs(data: &Value) -> Vec<VisibleTab> {
    let config = TabVisibilityConfig::from_record(data);

    let mut tabs = vec![VisibleTab::plain(Tab::Rfq), VisibleTab::plain(Tab::MaterialSpecs)];

    if shows_tddbhd(&config) {
        tabs.push(VisibleTab::plain(Tab::Tddbhd));
    }
    if shows_str_utility(&config) {
        tabs.push(VisibleTab::plain(Tab::StrUtility));
    }
    if shows_roll_str_backbend(&config) {
        tabs.push(VisibleTab::with_dynamic_label(
            Tab::RollStrBackbend,
            "Roll Str Backbend",
        ));
    }
    if shows_reel_drive(&config) {
        tabs.push(VisibleTab::plain(Tab::ReelDrive));
    }
    if shows_feed(&config) {
        tabs.push(VisibleTab::with_dynamic_label(Tab::Feed, "Feed"));
    }
    if shows_shear(&config) {
        tabs.push(VisibleTab::plain(Tab::Shear));
    }

    tabs.push(VisibleTab::plain(Tab::SummaryReport));
    tabs
}

/// Full tab listing for reference displays.
pub fn all_tabs() -> Vec<VisibleTab> {
    Tab::ALL.iter().copied().map(VisibleTab::plain).collect()
}

fn shows_tddbhd(config: &TabVisibilityConfig) -> bool {
    match &config.application {
        Some(app) if app.is_press_or_ctl() => true,
        Some(LineApplication::Standalone) => config.line_type_is("Threading Table"),
        _ => false,
    }
}

fn shows_str_utility(config: &TabVisibilityConfig) -> bool {
    match &config.application {
        Some(app) if app.is_press_or_ctl() => {
            // A press/CTL line without an explicit line type is treated
            // as conventional.
            let conventional = match config.line_type.as_deref() {
                None | Some("") | Some("Conventional") => true,
                _ => false,
            };
            conventional || config.type_of_line_contains_lower("conventional")
        }
        Some(LineApplication::Standalone) => {
            config.line_type_is("Straightener")
                || config.line_type_is("Straightener-Reel Combination")
        }
        _ => false,
    }
}

fn shows_roll_str_backbend(config: &TabVisibilityConfig) -> bool {
    match &config.application {
        Some(app) if app.is_press_or_ctl() => true,
        Some(LineApplication::Standalone) => {
            config.line_type_is("Straightener")
                || config.line_type_is("Straightener-Reel Combination")
        }
        _ => false,
    }
}

fn shows_reel_drive(config: &TabVisibilityConfig) -> bool {
    match &config.application {
        Some(app) if app.is_press_or_ctl() => {
            config.pull_through.as_deref() == Some("Yes")
                || config.type_of_line_contains_lower("pull through")
        }
        Some(LineApplication::Standalone) => {
            config.line_type_is("Reel-Motorized")
                || config.line_type_is("Reel-Pull Off")
                || config.line_type_is("Straightener-Reel Combination")
        }
        _ => false,
    }
}

fn shows_feed(config: &TabVisibilityConfig) -> bool {
    match &config.application {
        Some(app) if app.is_press_or_ctl() => true,
        Some(LineApplication::Standalone) => {
            config.line_type_is("Feed") || config.line_type_is("Feed-Shear")
        }
        // Legacy sheets configured feed controls without an application.
        _ => config
            .feed_controls
            .as_deref()
            .map(|c| !c.is_empty())
            .unwrap_or(false),
    }
}

fn shows_shear(config: &TabVisibilityConfig) -> bool {
    match &config.application {
        Some(LineApplication::CutToLength) => return true,
        Some(LineApplication::Standalone) if config.line_type_is("Feed-Shear") => return true,
        _ => {}
    }
    // Legacy free-text line descriptors.
    config.type_of_line_contains("CTL") || config.type_of_line_contains("Shear")
}
