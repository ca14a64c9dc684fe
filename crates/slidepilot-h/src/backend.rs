use crate::cdp::CdpClient;
use crate::inject::{ProbeCommand, run_probe};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::page::ScreenshotParams;
use slidepilot_engine::backend::{Backend, BackendError};
use slidepilot_engine::protocol::{
    ElementHandle, ElementSnapshot, NavigationResult, Neighborhood, Scope,
};
use tracing::info;

/// Chromium driven over CDP. Element work goes through the injected probe script.
pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
    profile: Option<String>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
            profile: None,
        }
    }

    /// Keep this backend's browser state under its own named profile.
    pub fn with_profile(mut self, name: impl Into<String>) -> Self {
        self.profile = Some(name.into());
        self
    }

    fn client(&self) -> Result<&CdpClient, BackendError> {
        self.client.as_ref().ok_or(BackendError::NotReady)
    }

    async fn get_navigation_result(
        page: &chromiumoxide::Page,
    ) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }

    async fn dispatch_key(
        &self,
        kind: DispatchKeyEventType,
        key: &str,
    ) -> Result<(), BackendError> {
        let client = self.client()?;
        let mut builder = DispatchKeyEventParams::builder().r#type(kind.clone()).key(key);
        if key == "Enter" {
            builder = builder
                .code("Enter")
                .windows_virtual_key_code(13)
                .native_virtual_key_code(13);
            if kind == DispatchKeyEventType::KeyDown {
                builder = builder.text("\r");
            }
        }
        let params = builder
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build key event: {:?}", e)))?;
        client
            .page
            .execute(params)
            .await
            .map_err(|e| BackendError::Other(format!("press_key {:?} failed: {}", kind, e)))?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        self.client = Some(CdpClient::launch(self.visible, self.profile.as_deref()).await?);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client()?;
        info!("Navigating to {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(&client.page).await
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client()?;
        Ok(client
            .page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default())
    }

    async fn query(
        &mut self,
        scope: &Scope,
        selector: &str,
    ) -> Result<Vec<ElementSnapshot>, BackendError> {
        run_probe(&self.client()?.page, ProbeCommand::Query { scope, selector }).await
    }

    async fn neighborhood(&mut self, handle: &ElementHandle) -> Result<Neighborhood, BackendError> {
        run_probe(&self.client()?.page, ProbeCommand::Neighborhood { handle }).await
    }

    async fn page_text(&mut self) -> Result<String, BackendError> {
        run_probe(&self.client()?.page, ProbeCommand::PageText).await
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), BackendError> {
        run_probe(&self.client()?.page, ProbeCommand::Click { handle }).await
    }

    async fn fill(&mut self, handle: &ElementHandle, text: &str) -> Result<(), BackendError> {
        run_probe(&self.client()?.page, ProbeCommand::Fill { handle, text }).await
    }

    async fn clear(&mut self, handle: &ElementHandle) -> Result<(), BackendError> {
        run_probe(&self.client()?.page, ProbeCommand::Clear { handle }).await
    }

    async fn insert_text(
        &mut self,
        handle: &ElementHandle,
        text: &str,
    ) -> Result<(), BackendError> {
        let client = self.client()?;
        run_probe::<()>(&client.page, ProbeCommand::Focus { handle }).await?;
        client
            .page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(|e| BackendError::Other(format!("insert_text failed: {}", e)))?;
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let client = self.client()?;
        client
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| BackendError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await
    }
}
