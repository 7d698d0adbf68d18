//! Autofill rules engine for equipment performance sheets.
//!
//! A sheet is a nested JSON record edited tab by tab. The engine
//! normalizes form-typed values, decides which tabs are visible,
//! reacts to field changes, and produces a flat map of suggested
//! values that never overwrites what the user already entered.

pub mod completion;
pub mod defaults;
pub mod record;
pub mod suggestions;
pub mod transform;
pub mod triggers;
pub mod validation;
pub mod visibility;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use completion::{
    CompletionCheck, CompletionError, CompletionProgress, CompletionTracker,
    InMemoryCompletionTracker, SectionProgress,
};
pub use record::{has_meaningful_value, value_at};
pub use suggestions::{
    comprehensive_autofill, has_minimum_required_data, tab_autofill, SuggestionMap,
};
pub use transform::transform_sheet_data;
pub use triggers::{
    autofill_strategy, can_trigger_autofill, field_priority, has_sufficient_data,
    high_priority_fields, triggered_tabs, AutofillStrategy,
};
pub use validation::validate_suggested_value;
pub use visibility::{visible_tabs, LineApplication, Tab, VisibleTab};

const DEFAULT_SHEET_ID: &str = "default";

fn default_transform() -> bool {
    true
}

/// Per-request knobs for a generation pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillOptions {
    /// Identity used for once-per-sheet completion tracking.
    pub sheet_id: Option<String>,
    /// The field that just changed, if this is an incremental pass.
    pub changed_field: Option<String>,
    /// Normalize form-typed values before evaluating rules.
    #[serde(default = "default_transform")]
    pub transform: bool,
}

impl Default for AutofillOptions {
    fn default() -> Self {
        Self {
            sheet_id: None,
            changed_field: None,
            transform: true,
        }
    }
}

impl AutofillOptions {
    pub fn for_sheet(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: Some(sheet_id.into()),
            changed_field: None,
            transform: true,
        }
    }
}

/// Everything a caller needs to apply or explain the suggestions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillResult {
    pub success: bool,
    pub suggestions: SuggestionMap,
    pub triggered_tabs: Vec<Tab>,
    pub visible_tabs: Vec<Tab>,
    pub metadata: AutofillMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillMetadata {
    pub has_sufficient_data: bool,
    pub should_trigger_initial_autofill: bool,
    pub completion_progress: Option<CompletionProgress>,
    /// Fields whose rules failed and were skipped.
    pub skipped_fields: Vec<String>,
}

/// Facade tying the rule tables, visibility, validation, and completion
/// tracking together behind one call.
pub struct AutofillEngine<C: CompletionTracker> {
    tracker: C,
}

impl Default for AutofillEngine<InMemoryCompletionTracker> {
    fn default() -> Self {
        Self::new(InMemoryCompletionTracker::new())
    }
}

impl<C: CompletionTracker> AutofillEngine<C> {
    pub fn new(tracker: C) -> Self {
        Self { tracker }
    }

    /// Run a full generation pass over one sheet revision.
    pub fn generate(&self, data: &Value, options: &AutofillOptions) -> AutofillResult {
        let normalized;
        let data = if options.transform {
            normalized = transform_sheet_data(data);
            &normalized
        } else {
            data
        };

        let visible = visible_tabs(data);
        let visible_ids: Vec<Tab> = visible.iter().map(|t| t.value).collect();

        let triggered = options
            .changed_field
            .as_deref()
            .map(|field| triggered_tabs(field, data))
            .unwrap_or_default();

        let sufficient = has_sufficient_data(data);
        let sheet_id = options.sheet_id.as_deref().unwrap_or(DEFAULT_SHEET_ID);

        let check = match self.tracker.check_and_update(data, sheet_id) {
            Ok(check) => check,
            Err(error) => {
                warn!(%error, sheet_id, "completion tracking failed");
                return AutofillResult {
                    success: false,
                    suggestions: SuggestionMap::new(),
                    triggered_tabs: triggered,
                    visible_tabs: visible_ids,
                    metadata: AutofillMetadata {
                        has_sufficient_data: sufficient,
                        should_trigger_initial_autofill: false,
                        completion_progress: None,
                        skipped_fields: Vec::new(),
                    },
                };
            }
        };

        let mut skipped = Vec::new();
        let suggestions = suggestions::comprehensive_with_diagnostics(data, &visible, &mut skipped);

        debug!(
            sheet_id,
            suggestion_count = suggestions.len(),
            visible_tabs = visible_ids.len(),
            sufficient,
            "generated autofill suggestions"
        );

        AutofillResult {
            success: true,
            suggestions,
            triggered_tabs: triggered,
            visible_tabs: visible_ids,
            metadata: AutofillMetadata {
                has_sufficient_data: sufficient,
                should_trigger_initial_autofill: check.should_trigger_initial_autofill,
                completion_progress: Some(self.tracker.completion_progress(data)),
                skipped_fields: skipped,
            },
        }
    }

    /// Suggestions for one tab, without completion tracking.
    pub fn tab_suggestions(&self, data: &Value, tab: Tab) -> SuggestionMap {
        tab_autofill(data, tab)
    }

    /// Whether a tab's calculations can run on the current record.
    pub fn can_autofill_tab(&self, data: &Value, tab: Tab) -> bool {
        has_minimum_required_data(data, tab)
    }

    /// How the tabs affected by a field change should be filled.
    pub fn field_strategy(&self, field: &str, data: &Value) -> AutofillStrategy {
        autofill_strategy(field, data)
    }

    pub fn check_initial_autofill_trigger(
        &self,
        data: &Value,
        sheet_id: &str,
    ) -> Result<CompletionCheck, CompletionError> {
        self.tracker.check_and_update(data, sheet_id)
    }

    pub fn mark_initial_autofill_triggered(&self, sheet_id: &str) -> Result<(), CompletionError> {
        self.tracker.mark_initial_autofill_triggered(sheet_id)
    }
}
