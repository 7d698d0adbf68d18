//! Tracks per-sheet completion so the comprehensive pass fires once,
//! when a sheet first accumulates enough data, instead of on every
//! keystroke.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::record::meaningful_at;
use super::triggers::has_sufficient_data;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion state store is unavailable")]
    StoreUnavailable,
}

/// Progress over one section's required fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

impl SectionProgress {
    fn over(data: &Value, required: &[&str]) -> Self {
        let completed = required
            .iter()
            .filter(|path| meaningful_at(data, path))
            .count();
        let total = required.len();
        let percentage = if total == 0 {
            100.0
        } else {
            (completed as f64 / total as f64 * 100.0).round()
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// Completion progress across the sections that gate the initial pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionProgress {
    pub rfq: SectionProgress,
    pub material_specs: SectionProgress,
    pub overall: SectionProgress,
}

/// Outcome of a completion check for one sheet revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionCheck {
    /// Whether the sheet currently has sufficient data.
    pub sufficient: bool,
    /// True exactly once per sheet: the revision where sufficiency
    /// first appeared and the initial pass has not yet run.
    pub should_trigger_initial_autofill: bool,
}

const RFQ_REQUIRED: &[&str] = &[
    "feed.feed.application",
    "common.equipment.feed.lineType",
    "common.material.materialType",
    "common.material.materialThickness",
    "common.material.coilWidth",
];

const MATERIAL_SPECS_REQUIRED: &[&str] = &[
    "common.material.materialType",
    "common.material.materialThickness",
    "common.material.maxYieldStrength",
    "common.material.coilWidth",
    "common.coil.maxCoilWeight",
    "common.coil.maxCoilOD",
];

/// Storage seam for completion state. The engine only needs these three
/// operations; production deployments back them with the sheet store.
pub trait CompletionTracker: Send + Sync {
    /// Record the latest revision of a sheet and report whether the
    /// initial comprehensive pass should run now.
    fn check_and_update(
        &self,
        data: &Value,
        sheet_id: &str,
    ) -> Result<CompletionCheck, CompletionError>;

    /// Section-by-section progress for the given record.
    fn completion_progress(&self, data: &Value) -> CompletionProgress {
        let rfq = SectionProgress::over(data, RFQ_REQUIRED);
        let material_specs = SectionProgress::over(data, MATERIAL_SPECS_REQUIRED);
        let completed = rfq.completed + material_specs.completed;
        let total = rfq.total + material_specs.total;
        let percentage = if total == 0 {
            100.0
        } else {
            (completed as f64 / total as f64 * 100.0).round()
        };
        CompletionProgress {
            rfq,
            material_specs,
            overall: SectionProgress {
                completed,
                total,
                percentage,
            },
        }
    }

    /// Mark the initial pass as done so it never re-fires for the sheet.
    fn mark_initial_autofill_triggered(&self, sheet_id: &str) -> Result<(), CompletionError>;
}

#[derive(Debug, Default, Clone, Copy)]
struct SheetState {
    sufficient: bool,
    initial_autofill_done: bool,
}

/// Process-local tracker keyed by sheet id. The mutex is held across
/// the whole read-modify-write so concurrent checks for the same sheet
/// serialize and the trigger still fires exactly once.
#[derive(Debug, Default)]
pub struct InMemoryCompletionTracker {
    states: Mutex<HashMap<String, SheetState>>,
}

impl InMemoryCompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionTracker for InMemoryCompletionTracker {
    fn check_and_update(
        &self,
        data: &Value,
        sheet_id: &str,
    ) -> Result<CompletionCheck, CompletionError> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| CompletionError::StoreUnavailable)?;
        let state = states.entry(sheet_id.to_string()).or_default();

        let sufficient = has_sufficient_data(data);
        let should_trigger = sufficient && !state.initial_autofill_done;

        state.sufficient = sufficient;
        if should_trigger {
            // Claim the trigger here rather than waiting for the mark
            // call, so a crashed caller cannot double-fire.
            state.initial_autofill_done = true;
        }

        Ok(CompletionCheck {
            sufficient,
            should_trigger_initial_autofill: should_trigger,
        })
    }

    fn mark_initial_autofill_triggered(&self, sheet_id: &str) -> Result<(), CompletionError> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| CompletionError::StoreUnavailable)?;
        states.entry(sheet_id.to_string()).or_default().initial_autofill_done = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sufficient_sheet() -> Value {
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
    fn initial_trigger_fires_once_per_sheet() {
        let tracker = InMemoryCompletionTracker::new();
        let data = sufficient_sheet();

        let first = tracker.check_and_update(&data, "sheet-1").expect("check");
        assert!(first.sufficient);
        assert!(first.should_trigger_initial_autofill);

        let second = tracker.check_and_update(&data, "sheet-1").expect("check");
        assert!(second.sufficient);
        assert!(!second.should_trigger_initial_autofill);

        // A different sheet gets its own trigger.
        let other = tracker.check_and_update(&data, "sheet-2").expect("check");
        assert!(other.should_trigger_initial_autofill);
    }

    #[test]
    fn insufficient_sheets_never_trigger() {
        let tracker = InMemoryCompletionTracker::new();
        let sparse = json!({ "common": { "material": { "materialType": "Steel" } } });

        let check = tracker.check_and_update(&sparse, "sheet-1").expect("check");
        assert!(!check.sufficient);
        assert!(!check.should_trigger_initial_autofill);

        // Sufficiency arriving later fires the trigger then.
        let check = tracker
            .check_and_update(&sufficient_sheet(), "sheet-1")
            .expect("check");
        assert!(check.should_trigger_initial_autofill);
    }

    #[test]
    fn explicit_mark_suppresses_the_trigger() {
        let tracker = InMemoryCompletionTracker::new();
        tracker
            .mark_initial_autofill_triggered("sheet-1")
            .expect("mark");

        let check = tracker
            .check_and_update(&sufficient_sheet(), "sheet-1")
            .expect("check");
        assert!(check.sufficient);
        assert!(!check.should_trigger_initial_autofill);
    }

    #[test]
    fn progress_counts_meaningful_required_fields() {
        let tracker = InMemoryCompletionTracker::new();
        let progress = tracker.completion_progress(&sufficient_sheet());

        // application, materialType, thickness, coilWidth; no lineType.
        assert_eq!(progress.rfq.completed, 4);
        assert_eq!(progress.rfq.total, 5);
        assert_eq!(progress.rfq.percentage, 80.0);

        // type, thickness, yield, width; no coil weight or OD.
        assert_eq!(progress.material_specs.completed, 4);
        assert_eq!(progress.material_specs.total, 6);
        assert_eq!(progress.overall.completed, 8);
        assert_eq!(progress.overall.total, 11);
        assert_eq!(progress.overall.percentage, 73.0);

        let empty = tracker.completion_progress(&json!({}));
        assert_eq!(empty.overall.completed, 0);
        assert_eq!(empty.overall.percentage, 0.0);
    }
}
