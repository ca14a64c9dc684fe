use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use slidepilot_engine::backend::BackendError;
use slidepilot_engine::protocol::{ElementHandle, Scope};
use std::future::Future;
use std::time::Duration;

const PROBE_JS: &str = include_str!("probe.js");

/// Default timeout for JavaScript evaluation (10 seconds).
/// This prevents hanging when dialogs (alert/confirm/prompt) block the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// One call into the page-side probe.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ProbeCommand<'a> {
    Query { scope: &'a Scope, selector: &'a str },
    Neighborhood { handle: &'a ElementHandle },
    Click { handle: &'a ElementHandle },
    Fill { handle: &'a ElementHandle, text: &'a str },
    Clear { handle: &'a ElementHandle },
    Focus { handle: &'a ElementHandle },
    PageText,
}

impl ProbeCommand<'_> {
    fn handle(&self) -> Option<&ElementHandle> {
        match self {
            ProbeCommand::Neighborhood { handle }
            | ProbeCommand::Click { handle }
            | ProbeCommand::Fill { handle, .. }
            | ProbeCommand::Clear { handle }
            | ProbeCommand::Focus { handle } => Some(handle),
            ProbeCommand::Query {
                scope: Scope::Within { handle },
                ..
            } => Some(handle),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    ok: bool,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProbeReply {
    fn into_result<T: DeserializeOwned>(self, command: &ProbeCommand<'_>) -> Result<T, BackendError> {
        if self.ok {
            return Ok(serde_json::from_value(self.data)?);
        }
        let message = self.message.unwrap_or_default();
        let handle = || command.handle().cloned().unwrap_or_else(|| ElementHandle::from("?"));
        Err(match self.code.as_deref() {
            Some("stale") => BackendError::ElementStale { handle: handle() },
            Some("not_visible") => BackendError::ElementNotVisible { handle: handle() },
            Some("disabled") => BackendError::ElementDisabled { handle: handle() },
            Some("selector") => BackendError::SelectorInvalid {
                selector: match command {
                    ProbeCommand::Query { selector, .. } => selector.to_string(),
                    _ => String::new(),
                },
                reason: message,
            },
            _ => BackendError::ScriptError(message),
        })
    }
}

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Retry an async operation that may fail due to context errors during page navigation.
/// Returns immediately on success or non-context errors; retries only on context errors.
async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, BackendError>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if is_context_error(&err_str) {
                    tracing::debug!(
                        "{} context error (attempt {}/{}), retrying...",
                        operation_name,
                        attempt + 1,
                        MAX_CONTEXT_RETRIES
                    );
                    last_error = Some(err_str);
                    tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                    continue;
                }
                return Err(BackendError::ScriptError(err_str));
            }
        }
    }

    Err(BackendError::ScriptError(last_error.unwrap_or_else(|| {
        format!("{} failed after retries", operation_name)
    })))
}

pub async fn inject_probe(page: &Page) -> Result<(), BackendError> {
    retry_on_context_error("Probe injection", || try_inject_probe(page)).await
}

async fn try_inject_probe(page: &Page) -> Result<(), String> {
    let is_loaded: bool = page
        .evaluate("typeof window.__slidepilot !== 'undefined'")
        .await
        .map_err(|e| format!("Failed to check probe status: {}", e))?
        .into_value()
        .map_err(|e| format!("Failed to get bool value: {}", e))?;

    if !is_loaded {
        page.evaluate(PROBE_JS)
            .await
            .map_err(|e| format!("Failed to inject probe.js: {}", e))?;
    }

    Ok(())
}

/// Run one probe command, injecting the probe first if the page lost it.
pub async fn run_probe<T: DeserializeOwned>(
    page: &Page,
    command: ProbeCommand<'_>,
) -> Result<T, BackendError> {
    let expression = format!(
        "window.__slidepilot.process({})",
        serde_json::to_string(&command)?
    );
    tracing::trace!("Evaluating probe: {}", expression);

    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        inject_probe(page).await?;

        match evaluate_with_timeout(page, &expression).await {
            Ok(value) => {
                let reply: ProbeReply = serde_json::from_value(value)?;
                return reply.into_result(&command);
            }
            Err(EvalError::Timeout) => {
                return Err(BackendError::Timeout {
                    operation: "probe evaluation (possibly blocked by a dialog)".to_string(),
                });
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during probe (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => {
                return Err(BackendError::ScriptError(format!(
                    "Evaluation failed: {}",
                    err_str
                )));
            }
        }
    }

    Err(BackendError::ScriptError(last_error.unwrap_or_else(|| {
        "Failed to run probe after retries".to_string()
    })))
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => remote_object
            .into_value::<serde_json::Value>()
            .map_err(|e| EvalError::Other(format!("Failed to get result: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_serialize_for_the_probe() {
        let handle = ElementHandle::from("3:1");
        let scope = Scope::within(&handle);
        let value = serde_json::to_value(ProbeCommand::Query {
            scope: &scope,
            selector: "button",
        })
        .expect("serializes");
        assert_eq!(
            value,
            json!({"cmd": "query", "scope": {"kind": "within", "handle": "3:1"}, "selector": "button"})
        );
        assert_eq!(
            serde_json::to_value(ProbeCommand::PageText).expect("serializes"),
            json!({"cmd": "page_text"})
        );
    }

    #[test]
    fn error_codes_map_to_backend_errors() {
        let handle = ElementHandle::from("1:0");
        let command = ProbeCommand::Click { handle: &handle };
        let reply: ProbeReply = serde_json::from_value(json!({
            "ok": false, "code": "disabled", "message": "element 1:0 is disabled"
        }))
        .expect("reply");
        let err = reply.into_result::<()>(&command).unwrap_err();
        assert!(err.is_rejection());

        let reply: ProbeReply = serde_json::from_value(json!({
            "ok": false, "code": "selector", "message": "not a valid selector"
        }))
        .expect("reply");
        let err = reply
            .into_result::<()>(&ProbeCommand::Query {
                scope: &Scope::Document,
                selector: "a[",
            })
            .unwrap_err();
        assert!(matches!(err, BackendError::SelectorInvalid { selector, .. } if selector == "a["));
    }

    #[test]
    fn null_data_reads_as_unit() {
        let reply: ProbeReply = serde_json::from_value(json!({"ok": true, "data": null})).expect("reply");
        let handle = ElementHandle::from("1:0");
        assert!(reply.into_result::<()>(&ProbeCommand::Focus { handle: &handle }).is_ok());
    }
}
