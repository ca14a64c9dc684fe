use crate::protocol::ElementHandle;

/// Errors raised by a DOM backend.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    // ============================================================
    // Navigation Errors
    // ============================================================
    #[error("Navigation failed: {0}")]
    Navigation(String),

    // ============================================================
    // Element Errors
    // ============================================================
    #[error("Element {handle} is stale (removed or re-queried)")]
    ElementStale { handle: ElementHandle },

    #[error("Element {handle} is not visible")]
    ElementNotVisible { handle: ElementHandle },

    #[error("Element {handle} is disabled")]
    ElementDisabled { handle: ElementHandle },

    #[error("Invalid selector '{selector}': {reason}")]
    SelectorInvalid { selector: String, reason: String },

    // ============================================================
    // Execution Errors
    // ============================================================
    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    // ============================================================
    // System Errors
    // ============================================================
    #[error("Not ready")]
    NotReady,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// True when the action was refused because the element changed between
    /// resolution and dispatch. These are recovered by re-resolving.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BackendError::ElementStale { .. }
                | BackendError::ElementNotVisible { .. }
                | BackendError::ElementDisabled { .. }
        )
    }
}
