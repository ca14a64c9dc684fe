//! Response extraction: structured read, then document scan, then raw page text.

pub mod strategies;

use crate::backend::Backend;
use crate::cascade::{self, Cascade};
use crate::profile::ChatProfile;
use slidepilot_common::protocol::{ElementSnapshot, Scope};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Read from the last-message cascade.
    Structured { descriptor: String },
    /// Picked while walking message containers backward.
    DocumentScan { index: usize },
    PageText,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Structured { descriptor } => write!(f, "structured ({})", descriptor),
            Provenance::DocumentScan { index } => write!(f, "document scan (container #{})", index),
            Provenance::PageText => write!(f, "page text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedResponse {
    pub text: String,
    pub provenance: Provenance,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No response text found (structured, document scan and page text all empty)")]
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    last_message: Cascade,
    message_shapes: Vec<String>,
    min_message_chars: usize,
    min_line_chars: usize,
    chrome_strings: Vec<String>,
}

impl ResponseExtractor {
    pub fn from_profile(profile: &ChatProfile) -> Self {
        Self {
            last_message: profile.last_message.clone(),
            message_shapes: profile.message_shapes.clone(),
            min_message_chars: profile.min_message_chars,
            min_line_chars: profile.min_line_chars,
            chrome_strings: profile.chrome_strings.clone(),
        }
    }

    /// Run the strategies in order; the first non-empty result wins.
    pub async fn extract<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        scope: &Scope,
        prompt: &str,
    ) -> Result<ExtractedResponse, ExtractionError> {
        if let Some(found) = self.structured(backend, scope).await {
            return Ok(found);
        }
        if let Some(found) = self.document_scan(backend, scope, prompt).await {
            return Ok(found);
        }
        if let Some(found) = self.page_text(backend).await {
            return Ok(found);
        }
        warn!("Extraction failed: all strategies came back empty");
        Err(ExtractionError::Failed)
    }

    async fn structured<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        scope: &Scope,
    ) -> Option<ExtractedResponse> {
        let resolved = cascade::resolve_any(backend, &self.last_message, scope).await?;
        let text = resolved.text();
        if text.is_empty() {
            debug!("Structured read matched {} but it is empty", resolved.descriptor);
            return None;
        }
        info!("Extracted {} chars via {}", text.chars().count(), resolved.descriptor);
        Some(ExtractedResponse {
            text: text.to_string(),
            provenance: Provenance::Structured {
                descriptor: resolved.descriptor.clone(),
            },
        })
    }

    async fn document_scan<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        scope: &Scope,
        prompt: &str,
    ) -> Option<ExtractedResponse> {
        let candidates = self.message_containers(backend, scope).await;
        debug!("Document scan found {} containers", candidates.len());
        let (index, text) =
            strategies::pick_message(&candidates, prompt, self.min_message_chars)?;
        info!("Extracted {} chars from container #{}", text.chars().count(), index);
        Some(ExtractedResponse {
            text,
            provenance: Provenance::DocumentScan { index },
        })
    }

    /// All message containers in document order. A combined selector keeps
    /// document order; if the backend rejects it, each shape is queried
    /// separately.
    async fn message_containers<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        scope: &Scope,
    ) -> Vec<ElementSnapshot> {
        if self.message_shapes.is_empty() {
            return Vec::new();
        }
        let joined = self.message_shapes.join(", ");
        match backend.query(scope, &joined).await {
            Ok(found) => return found,
            Err(e) => debug!("Combined message selector failed, querying shapes one by one: {}", e),
        }

        let mut collected = Vec::new();
        for shape in &self.message_shapes {
            match backend.query(scope, shape).await {
                Ok(found) => collected.extend(found),
                Err(e) => debug!("Message shape {} failed: {}", shape, e),
            }
        }
        strategies::dedupe(collected)
    }

    async fn page_text<B: Backend + ?Sized>(&self, backend: &mut B) -> Option<ExtractedResponse> {
        let page = match backend.page_text().await {
            Ok(page) => page,
            Err(e) => {
                warn!("Could not read page text: {}", e);
                return None;
            }
        };
        let line = strategies::pick_line(&page, &self.chrome_strings, self.min_line_chars)?;
        info!("Extracted {} chars from raw page text", line.chars().count());
        Some(ExtractedResponse {
            text: line,
            provenance: Provenance::PageText,
        })
    }
}
