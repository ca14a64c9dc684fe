use async_trait::async_trait;
pub use slidepilot_common::error::BackendError;
use slidepilot_common::protocol::{
    ElementHandle, ElementSnapshot, NavigationResult, Neighborhood, Scope,
};

/// The DOM query surface the engine runs against.
///
/// One backend drives one page. Every query re-tags the elements it returns,
/// so handles from an earlier query may come back as `ElementStale`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, attach to page, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// URL the page currently shows.
    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// All elements matching a CSS selector inside `scope`, in document order.
    async fn query(
        &mut self,
        scope: &Scope,
        selector: &str,
    ) -> Result<Vec<ElementSnapshot>, BackendError>;

    /// Presentation facts for the element and the nodes around it.
    async fn neighborhood(&mut self, handle: &ElementHandle) -> Result<Neighborhood, BackendError>;

    /// Visible text of the whole page.
    async fn page_text(&mut self) -> Result<String, BackendError>;

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), BackendError>;

    /// Replace the element's value/content with `text`.
    async fn fill(&mut self, handle: &ElementHandle, text: &str) -> Result<(), BackendError>;

    async fn clear(&mut self, handle: &ElementHandle) -> Result<(), BackendError>;

    /// Focus the element and insert `text` at the caret as keyboard input would.
    async fn insert_text(&mut self, handle: &ElementHandle, text: &str)
    -> Result<(), BackendError>;

    /// Capture a full-page PNG.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError>;

    /// Press a key on the focused element.
    async fn press_key(&mut self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("press_key".into()))
    }
}
