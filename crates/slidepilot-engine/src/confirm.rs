//! Visual confirmation that a selection click took effect.
//!
//! Everything here is heuristic. A `false` answer means "no evidence", never
//! "definitely not selected", and callers keep going either way.

use crate::backend::Backend;
use crate::cascade::{self, Cascade};
use crate::interact::{self, Interaction};
use serde::{Deserialize, Serialize};
use slidepilot_common::protocol::{ElementHandle, Neighborhood, Relation, Scope, StyleProbe};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn distance(&self, other: &Rgb) -> f64 {
        let dr = f64::from(self.0) - f64::from(other.0);
        let dg = f64::from(self.1) - f64::from(other.1);
        let db = f64::from(self.2) - f64::from(other.2);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Parse a computed `rgb(...)` / `rgba(...)` color. Fully transparent colors
/// yield `None`.
pub fn parse_css_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner
        .split(|c| c == ',' || c == ' ' || c == '/')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    if let Some(alpha) = parts.get(3).and_then(|a| a.parse::<f64>().ok())
        && alpha < 0.05
    {
        return None;
    }
    let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0) as u8);
    Some(Rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

/// Background colors a target theme uses for selected items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<Rgb>,
    /// Maximum RGB distance still counted as a match.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    16.0
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Rgb(232, 240, 254),
                Rgb(219, 234, 254),
                Rgb(224, 231, 255),
                Rgb(237, 233, 254),
                Rgb(59, 130, 246),
                Rgb(99, 102, 241),
            ],
            tolerance: default_tolerance(),
        }
    }
}

impl Palette {
    pub fn matches(&self, color: &Rgb) -> bool {
        self.colors
            .iter()
            .any(|c| c.distance(color) <= self.tolerance)
    }
}

/// What convinced the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationSignal {
    Marker(String),
    ClassName(String),
    Attribute { name: String, value: String },
    BackgroundColor(String),
}

impl fmt::Display for ConfirmationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationSignal::Marker(m) => write!(f, "marker '{}'", m),
            ConfirmationSignal::ClassName(c) => write!(f, "class '{}'", c),
            ConfirmationSignal::Attribute { name, value } => write!(f, "{}=\"{}\"", name, value),
            ConfirmationSignal::BackgroundColor(c) => write!(f, "background {}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfirmation {
    #[serde(default)]
    pub palette: Palette,
    #[serde(default = "default_marker_glyphs")]
    pub marker_glyphs: Vec<String>,
    #[serde(default = "default_marker_words")]
    pub marker_words: Vec<String>,
    #[serde(default = "default_class_fragments")]
    pub class_fragments: Vec<String>,
    /// Ancestors deeper than this only count for marker text.
    #[serde(default = "default_ancestor_depth")]
    pub ancestor_depth: u8,
}

fn default_marker_glyphs() -> Vec<String> {
    ["✓", "✔", "☑", "✅"].iter().map(|s| s.to_string()).collect()
}

fn default_marker_words() -> Vec<String> {
    ["selected", "applied", "in use", "current"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_class_fragments() -> Vec<String> {
    ["selected", "checked", "active", "chosen", "current"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ancestor_depth() -> u8 {
    2
}

impl Default for VisualConfirmation {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            marker_glyphs: default_marker_glyphs(),
            marker_words: default_marker_words(),
            class_fragments: default_class_fragments(),
            ancestor_depth: default_ancestor_depth(),
        }
    }
}

const SELECTION_ATTRIBUTES: &[&str] = &[
    "aria-selected",
    "aria-checked",
    "aria-pressed",
    "data-selected",
];

const SELECTED_STATES: &[&str] = &["checked", "selected", "active", "on"];

impl VisualConfirmation {
    /// First selection signal in the neighborhood, if any.
    pub fn evaluate(&self, neighborhood: &Neighborhood) -> Option<ConfirmationSignal> {
        neighborhood
            .probes
            .iter()
            .find_map(|probe| self.evaluate_probe(probe))
    }

    fn evaluate_probe(&self, probe: &StyleProbe) -> Option<ConfirmationSignal> {
        let (styled, attributed) = match probe.relation {
            Relation::Anchor | Relation::Ancestor(1) => (true, true),
            Relation::Ancestor(depth) => (false, depth <= self.ancestor_depth),
            Relation::Descendant(_) => (false, true),
            Relation::Sibling => (false, false),
        };

        if let Some(marker) = self.marker(probe) {
            return Some(ConfirmationSignal::Marker(marker));
        }
        if attributed {
            if let Some(signal) = selection_attribute(probe) {
                return Some(signal);
            }
            if let Some(class) = self.selected_class(probe) {
                return Some(ConfirmationSignal::ClassName(class));
            }
        }
        if styled
            && let Some(color) = &probe.background_color
            && let Some(rgb) = parse_css_color(color)
            && self.palette.matches(&rgb)
        {
            return Some(ConfirmationSignal::BackgroundColor(color.clone()));
        }
        None
    }

    fn marker(&self, probe: &StyleProbe) -> Option<String> {
        let own = probe.text.trim();
        let pseudo = probe.pseudo_content.as_deref().unwrap_or("");
        for glyph in &self.marker_glyphs {
            if own.contains(glyph.as_str()) || pseudo.contains(glyph.as_str()) {
                return Some(glyph.clone());
            }
        }
        // Words only count as a standalone badge, not inside a sentence.
        let lowered = own.to_lowercase();
        self.marker_words
            .iter()
            .find(|w| lowered == w.as_str())
            .cloned()
    }

    fn selected_class(&self, probe: &StyleProbe) -> Option<String> {
        probe
            .classes
            .iter()
            .find(|class| {
                let lowered = class.to_lowercase();
                lowered
                    .split(['-', '_'])
                    .any(|part| self.class_fragments.iter().any(|f| part.starts_with(f.as_str())))
            })
            .cloned()
    }

    /// Inspect the element's neighborhood. Backend failures count as "no
    /// evidence".
    pub async fn confirmation<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        anchor: &ElementHandle,
    ) -> Option<ConfirmationSignal> {
        match backend.neighborhood(anchor).await {
            Ok(neighborhood) => self.evaluate(&neighborhood),
            Err(e) => {
                debug!("Neighborhood of {} unavailable: {}", anchor, e);
                None
            }
        }
    }

    pub async fn is_confirmed<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        anchor: &ElementHandle,
    ) -> bool {
        self.confirmation(backend, anchor).await.is_some()
    }
}

fn selection_attribute(probe: &StyleProbe) -> Option<ConfirmationSignal> {
    for name in SELECTION_ATTRIBUTES {
        if let Some(value) = probe.attributes.get(*name)
            && value.eq_ignore_ascii_case("true")
        {
            return Some(ConfirmationSignal::Attribute {
                name: name.to_string(),
                value: value.clone(),
            });
        }
    }
    if let Some(state) = probe.attributes.get("data-state")
        && SELECTED_STATES.contains(&state.to_lowercase().as_str())
    {
        return Some(ConfirmationSignal::Attribute {
            name: "data-state".to_string(),
            value: state.clone(),
        });
    }
    None
}

/// What a bounded select-and-confirm run observed.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    pub attempts: usize,
    pub clicked: bool,
    pub signal: Option<ConfirmationSignal>,
}

impl SelectionReport {
    pub fn confirmed(&self) -> bool {
        self.signal.is_some()
    }
}

/// Click the cascade's element and check for a selection signal, re-clicking
/// up to `attempts` times while no signal shows.
///
/// The check always re-resolves the cascade: a re-rendered card is a new
/// element, so the clicked handle is not reused.
pub async fn select_with_confirmation<B: Backend + ?Sized>(
    backend: &mut B,
    cascade: &Cascade,
    checker: &VisualConfirmation,
    attempts: usize,
    settle: Duration,
) -> SelectionReport {
    let mut report = SelectionReport {
        attempts: 0,
        clicked: false,
        signal: None,
    };

    for attempt in 1..=attempts.max(1) {
        report.attempts = attempt;
        if interact::act(backend, cascade, &Scope::Document, Interaction::Click, 2)
            .await
            .is_none()
        {
            warn!("{}: nothing to click on attempt {}", cascade.name, attempt);
            break;
        }
        report.clicked = true;
        tokio::time::sleep(settle).await;

        let Some(fresh) = cascade::resolve_any(backend, cascade, &Scope::Document).await else {
            debug!("{}: element vanished after click", cascade.name);
            continue;
        };
        if let Some(signal) = checker.confirmation(backend, fresh.handle()).await {
            info!(
                "{}: selection confirmed by {} on attempt {}",
                cascade.name, signal, attempt
            );
            report.signal = Some(signal);
            return report;
        }
        debug!("{}: no selection signal after attempt {}", cascade.name, attempt);
    }

    report
}
