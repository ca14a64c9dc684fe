use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Custom deserializer for HashMap<String, String> that filters out null values.
/// The probe script reports missing attributes as null.
fn deserialize_nullable_string_map<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: HashMap<String, Option<String>> = HashMap::deserialize(deserializer)?;
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| v.map(|val| (k, val)))
        .collect())
}

/// Opaque reference to an element, valid only for the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Where a query is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Document,
    Within { handle: ElementHandle },
}

impl Scope {
    pub fn within(handle: &ElementHandle) -> Self {
        Scope::Within {
            handle: handle.clone(),
        }
    }
}

/// One element as observed at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub handle: ElementHandle,
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string_map")]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub classes: Vec<String>,
    pub visible: bool,
    pub enabled: bool,
    #[serde(default)]
    pub rect: Rect,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Visible and not disabled.
    pub fn is_usable(&self) -> bool {
        self.visible && self.enabled
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

impl fmt::Display for ElementSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.trimmed_text().chars().take(40).collect();
        write!(f, "<{}> {} \"{}\"", self.tag, self.handle, text)
    }
}

/// Position of a probed node relative to the anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Anchor,
    Ancestor(u8),
    Descendant(u8),
    Sibling,
}

/// Presentation facts for one node around an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProbe {
    pub relation: Relation,
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable_string_map")]
    pub attributes: HashMap<String, String>,
    /// Own short text (truncated by the backend).
    #[serde(default)]
    pub text: String,
    /// Generated `::before`/`::after` content, if any.
    #[serde(default)]
    pub pseudo_content: Option<String>,
}

impl StyleProbe {
    pub fn new(relation: Relation, tag: &str) -> Self {
        Self {
            relation,
            tag: tag.to_string(),
            classes: Vec::new(),
            background_color: None,
            attributes: HashMap::new(),
            text: String::new(),
            pseudo_content: None,
        }
    }
}

/// The anchor plus the nodes around it that may carry a selection marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub probes: Vec<StyleProbe>,
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}
