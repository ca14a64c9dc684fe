use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use slidepilot_engine::backend::BackendError;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Environment variable naming a persistent Chromium profile directory.
/// Reusing one keeps chat and deck sessions signed in between runs. Each
/// named profile gets its own subdirectory, since Chromium locks a profile
/// to one process.
pub const USER_DATA_DIR_ENV: &str = "SLIDEPILOT_USER_DATA_DIR";

const WINDOW_SIZE: (u32, u32) = (1440, 900);

/// One Chromium process with a single page attached.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: PathBuf,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(visible: bool, profile: Option<&str>) -> Result<Self, BackendError> {
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir(profile)?;
        let mut config_builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1)
            .user_data_dir(&user_data_dir);

        if visible {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let config = config_builder
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build browser config: {}", e)))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BackendError::Other(format!("Failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BackendError::Other(format!("Failed to create page: {}", e)))?;

        forward_console(&page).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir,
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), BackendError> {
        self.browser
            .close()
            .await
            .map_err(|e| BackendError::Other(format!("Error closing browser: {}", e)))?;
        self.handler_task
            .await
            .map_err(|e| BackendError::Other(format!("Error awaiting handler: {}", e)))?;

        if self.cleanup_user_data_dir
            && let Err(e) = std::fs::remove_dir_all(&self.user_data_dir)
        {
            tracing::debug!(
                "Failed to clean up user-data-dir {}: {}",
                self.user_data_dir.display(),
                e
            );
        }

        Ok(())
    }
}

async fn forward_console(page: &Page) -> Result<(), BackendError> {
    let mut console_events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| BackendError::Other(format!("Failed to subscribe to console events: {}", e)))?;

    tokio::spawn(async move {
        while let Some(event) = console_events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| {
                    arg.description
                        .clone()
                        .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                        .unwrap_or_else(|| "unknown".to_string())
                })
                .collect();
            tracing::debug!("Browser Console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });
    Ok(())
}

/// Alerts and `beforeunload` prompts would block every later evaluation.
async fn accept_dialogs(page: &Page) -> Result<(), BackendError> {
    let mut dialog_events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| BackendError::Other(format!("Failed to subscribe to dialog events: {}", e)))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialog_events.next().await {
            tracing::info!(
                "Accepting JavaScript dialog: {} ({:?})",
                event.message,
                event.r#type
            );
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

fn resolve_user_data_dir(profile: Option<&str>) -> Result<(PathBuf, bool), BackendError> {
    let io_err = |e: std::io::Error| BackendError::Other(format!("user-data-dir: {}", e));

    if let Ok(dir) = std::env::var(USER_DATA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        let mut path = PathBuf::from(dir);
        if let Some(profile) = profile {
            path.push(profile);
        }
        std::fs::create_dir_all(&path).map_err(io_err)?;
        tracing::info!(
            "Using user data dir from {}: {}",
            USER_DATA_DIR_ENV,
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BackendError::Other(format!("System clock error: {}", e)))?
        .as_nanos();
    let unique = format!("slidepilot-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path).map_err(io_err)?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
