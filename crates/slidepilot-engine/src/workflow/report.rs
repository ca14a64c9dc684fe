use super::state::WorkflowState;
use crate::extraction::ExtractedResponse;

/// A step that timed out or failed but let the workflow continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedStep {
    pub state: WorkflowState,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub response: Option<ExtractedResponse>,
    pub presentation_url: Option<String>,
    pub degraded: Vec<DegradedStep>,
    pub snapshots: Vec<String>,
    pub final_state: WorkflowState,
}

impl WorkflowReport {
    /// Finished without any degraded step.
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}
