//! Resolve-then-act with recovery from rejected actions.
//!
//! The element can go stale, hidden or disabled between resolution and the
//! click. Those rejections are retried against a freshly resolved element;
//! anything else gives up and reports `None`.

use crate::backend::{Backend, BackendError};
use crate::cascade::{self, Cascade, ResolvedElement};
use slidepilot_common::protocol::{ElementHandle, Scope};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction<'a> {
    Click,
    Fill(&'a str),
    Clear,
    InsertText(&'a str),
}

impl fmt::Display for Interaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interaction::Click => write!(f, "click"),
            Interaction::Fill(v) => write!(f, "fill ({} chars)", v.chars().count()),
            Interaction::Clear => write!(f, "clear"),
            Interaction::InsertText(v) => write!(f, "insert text ({} chars)", v.chars().count()),
        }
    }
}

pub async fn perform<B: Backend + ?Sized>(
    backend: &mut B,
    handle: &ElementHandle,
    interaction: Interaction<'_>,
) -> Result<(), BackendError> {
    match interaction {
        Interaction::Click => backend.click(handle).await,
        Interaction::Fill(value) => backend.fill(handle, value).await,
        Interaction::Clear => backend.clear(handle).await,
        Interaction::InsertText(value) => backend.insert_text(handle, value).await,
    }
}

/// Resolve `cascade` and apply `interaction`, up to `attempts` times.
///
/// Returns the element the interaction finally landed on.
pub async fn act<B: Backend + ?Sized>(
    backend: &mut B,
    cascade: &Cascade,
    scope: &Scope,
    interaction: Interaction<'_>,
    attempts: usize,
) -> Option<ResolvedElement> {
    for attempt in 1..=attempts.max(1) {
        let resolved = cascade::resolve(backend, cascade, scope).await?;
        match perform(backend, resolved.handle(), interaction).await {
            Ok(()) => {
                debug!("{}: {} on {}", cascade.name, interaction, resolved.element);
                return Some(resolved);
            }
            Err(e) if e.is_rejection() => {
                debug!(
                    "{}: {} rejected on attempt {}/{}: {}",
                    cascade.name, interaction, attempt, attempts, e
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => {
                warn!("{}: {} failed: {}", cascade.name, interaction, e);
                return None;
            }
        }
    }
    warn!("{}: {} kept being rejected", cascade.name, interaction);
    None
}

/// Act on an element resolved earlier in the same tick. A rejection falls
/// back to re-resolving `cascade`.
pub async fn act_on<B: Backend + ?Sized>(
    backend: &mut B,
    resolved: ResolvedElement,
    cascade: &Cascade,
    interaction: Interaction<'_>,
    attempts: usize,
) -> Option<ResolvedElement> {
    match perform(backend, resolved.handle(), interaction).await {
        Ok(()) => {
            debug!("{}: {} on {}", cascade.name, interaction, resolved.element);
            Some(resolved)
        }
        Err(e) if e.is_rejection() => {
            debug!("{}: {} rejected, re-resolving: {}", cascade.name, interaction, e);
            act(backend, cascade, &Scope::Document, interaction, attempts).await
        }
        Err(e) => {
            warn!("{}: {} failed: {}", cascade.name, interaction, e);
            None
        }
    }
}
