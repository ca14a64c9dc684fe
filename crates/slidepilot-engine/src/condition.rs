use crate::backend::Backend;
use crate::cascade::{self, Cascade, normalize_text};
use async_recursion::async_recursion;
use regex::Regex;
use serde::{Deserialize, Serialize};
use slidepilot_common::protocol::Scope;
use tracing::warn;

/// Declarative completion predicate evaluated against the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Some element of the cascade exists, visible or not.
    Present(Cascade),
    /// Some element of the cascade is visible and enabled.
    Usable(Cascade),
    /// No element of the cascade exists.
    Absent(Cascade),
    UrlMatches(String),
    UrlContains(Vec<String>),
    TextContains(String),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Always,
    Never,
}

impl Condition {
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Evaluate once. Backend failures evaluate to `false` for positive
    /// checks; they never abort the caller.
    #[async_recursion]
    pub async fn evaluate<B: Backend + ?Sized>(&self, backend: &mut B) -> bool {
        match self {
            Condition::Present(c) => cascade::resolve_any(backend, c, &Scope::Document)
                .await
                .is_some(),
            Condition::Usable(c) => cascade::resolve(backend, c, &Scope::Document)
                .await
                .is_some(),
            Condition::Absent(c) => cascade::resolve_any(backend, c, &Scope::Document)
                .await
                .is_none(),
            Condition::UrlMatches(pattern) => match backend.current_url().await {
                Ok(url) => match Regex::new(pattern) {
                    Ok(re) => re.is_match(&url),
                    // Fallback to contains for invalid regex
                    Err(_) => url.contains(pattern.as_str()),
                },
                Err(e) => {
                    warn!("Could not read current URL: {}", e);
                    false
                }
            },
            Condition::UrlContains(fragments) => match backend.current_url().await {
                Ok(url) => fragments.iter().any(|s| url.contains(s.as_str())),
                Err(e) => {
                    warn!("Could not read current URL: {}", e);
                    false
                }
            },
            Condition::TextContains(text) => match backend.page_text().await {
                Ok(page) => normalize_text(&page).contains(&normalize_text(text)),
                Err(e) => {
                    warn!("Could not read page text: {}", e);
                    false
                }
            },
            Condition::All(conditions) => {
                for cond in conditions {
                    if !cond.evaluate(backend).await {
                        return false;
                    }
                }
                true
            }
            Condition::Any(conditions) => {
                for cond in conditions {
                    if cond.evaluate(backend).await {
                        return true;
                    }
                }
                false
            }
            Condition::Not(inner) => !inner.evaluate(backend).await,
            Condition::Always => true,
            Condition::Never => false,
        }
    }
}
