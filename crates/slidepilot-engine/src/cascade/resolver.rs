//! Cascade resolution against a live backend.
//!
//! A cascade is walked in rank order and the first usable match wins. A
//! descriptor that matches nothing, or whose evaluation fails, is skipped: one
//! selector the page does not understand must never abort the whole cascade.

use super::descriptor::{Cascade, Descriptor};
use crate::backend::{Backend, BackendError};
use slidepilot_common::protocol::{ElementHandle, ElementSnapshot, Scope};
use tracing::{debug, warn};

/// The element a cascade settled on at one instant.
///
/// Never carried across poll ticks: the handle is only meaningful until the
/// backend's next query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElement {
    pub element: ElementSnapshot,
    pub cascade: String,
    pub rank: usize,
    pub descriptor: String,
}

impl ResolvedElement {
    pub fn handle(&self) -> &ElementHandle {
        &self.element.handle
    }

    pub fn text(&self) -> &str {
        self.element.trimmed_text()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Usable,
    Present,
}

/// First visible, enabled element across the cascade.
pub async fn resolve<B: Backend + ?Sized>(
    backend: &mut B,
    cascade: &Cascade,
    scope: &Scope,
) -> Option<ResolvedElement> {
    walk(backend, cascade, scope, Filter::Usable).await
}

/// First element across the cascade regardless of visibility or enablement.
pub async fn resolve_any<B: Backend + ?Sized>(
    backend: &mut B,
    cascade: &Cascade,
    scope: &Scope,
) -> Option<ResolvedElement> {
    walk(backend, cascade, scope, Filter::Present).await
}

/// Elements matched by a single descriptor, predicates applied.
pub async fn matches<B: Backend + ?Sized>(
    backend: &mut B,
    descriptor: &Descriptor,
    scope: &Scope,
) -> Result<Vec<ElementSnapshot>, BackendError> {
    let found = backend.query(scope, descriptor.matcher.selector()).await?;
    Ok(found
        .into_iter()
        .filter(|el| descriptor.matcher.accepts(el))
        .collect())
}

/// Match count of the first descriptor that matches anything.
pub async fn count<B: Backend + ?Sized>(
    backend: &mut B,
    cascade: &Cascade,
    scope: &Scope,
) -> usize {
    for descriptor in &cascade.descriptors {
        if let Ok(found) = matches(backend, descriptor, scope).await
            && !found.is_empty()
        {
            return found.len();
        }
    }
    0
}

async fn walk<B: Backend + ?Sized>(
    backend: &mut B,
    cascade: &Cascade,
    scope: &Scope,
    filter: Filter,
) -> Option<ResolvedElement> {
    for descriptor in &cascade.descriptors {
        let found = match matches(backend, descriptor, scope).await {
            Ok(found) => found,
            Err(e) if e.is_rejection() => {
                debug!(
                    "{}: scope went away while evaluating {}: {}",
                    cascade.name, descriptor, e
                );
                continue;
            }
            Err(e) => {
                warn!("{}: descriptor {} failed: {}", cascade.name, descriptor, e);
                continue;
            }
        };

        let hit = found.into_iter().find(|el| match filter {
            Filter::Usable => el.is_usable(),
            Filter::Present => true,
        });

        match hit {
            Some(element) => {
                debug!("{}: matched {} via {}", cascade.name, element, descriptor);
                return Some(ResolvedElement {
                    element,
                    cascade: cascade.name.clone(),
                    rank: descriptor.rank,
                    descriptor: descriptor.matcher.to_string(),
                });
            }
            None => debug!("{}: no {:?} match for {}", cascade.name, filter, descriptor),
        }
    }

    None
}
