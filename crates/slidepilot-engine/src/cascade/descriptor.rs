use serde::{Deserialize, Serialize};
use slidepilot_common::protocol::ElementSnapshot;
use std::fmt;

/// How a descriptor recognises its element.
///
/// The CSS part is evaluated by the backend; text and attribute predicates are
/// applied to the returned snapshots so they behave the same on every backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    Css {
        selector: String,
    },
    Text {
        selector: String,
        contains: String,
        #[serde(default)]
        exact: bool,
    },
    Attribute {
        selector: String,
        name: String,
        /// Substring the attribute value must contain. `None` only checks presence.
        #[serde(default)]
        value: Option<String>,
    },
}

impl Matcher {
    pub fn selector(&self) -> &str {
        match self {
            Matcher::Css { selector }
            | Matcher::Text { selector, .. }
            | Matcher::Attribute { selector, .. } => selector,
        }
    }

    pub fn accepts(&self, element: &ElementSnapshot) -> bool {
        match self {
            Matcher::Css { .. } => true,
            Matcher::Text {
                contains, exact, ..
            } => {
                let have = normalize_text(&element.text);
                let want = normalize_text(contains);
                if *exact { have == want } else { have.contains(&want) }
            }
            Matcher::Attribute { name, value, .. } => match (element.attr(name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(wanted)) => actual
                    .to_lowercase()
                    .contains(&wanted.to_lowercase()),
                (None, _) => false,
            },
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Css { selector } => write!(f, "{}", selector),
            Matcher::Text {
                selector, contains, ..
            } => write!(f, "{} :text(\"{}\")", selector, contains),
            Matcher::Attribute {
                selector,
                name,
                value: Some(v),
            } => write!(f, "{} [{}*=\"{}\"]", selector, name, v),
            Matcher::Attribute {
                selector,
                name,
                value: None,
            } => write!(f, "{} [{}]", selector, name),
        }
    }
}

/// Lowercase and collapse runs of whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One candidate representation of a UI concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Position in the owning cascade; lower is preferred.
    #[serde(skip)]
    pub rank: usize,
    #[serde(flatten)]
    pub matcher: Matcher,
}

impl Descriptor {
    pub fn new(matcher: Matcher) -> Self {
        Self { rank: 0, matcher }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rank, self.matcher)
    }
}

#[derive(Deserialize)]
struct CascadeRepr {
    name: String,
    descriptors: Vec<Descriptor>,
}

impl From<CascadeRepr> for Cascade {
    fn from(repr: CascadeRepr) -> Self {
        let mut cascade = Cascade::new(&repr.name);
        for descriptor in repr.descriptors {
            cascade = cascade.with(descriptor.matcher);
        }
        cascade
    }
}

/// Ordered descriptors for one UI concept, most reliable first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CascadeRepr")]
pub struct Cascade {
    pub name: String,
    pub descriptors: Vec<Descriptor>,
}

impl Cascade {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptors: Vec::new(),
        }
    }

    pub fn with(mut self, matcher: Matcher) -> Self {
        let rank = self.descriptors.len();
        self.descriptors.push(Descriptor { rank, matcher });
        self
    }

    pub fn css(self, selector: &str) -> Self {
        self.with(Matcher::Css {
            selector: selector.to_string(),
        })
    }

    pub fn text(self, selector: &str, contains: &str) -> Self {
        self.with(Matcher::Text {
            selector: selector.to_string(),
            contains: contains.to_string(),
            exact: false,
        })
    }

    pub fn attr(self, selector: &str, name: &str, value: Option<&str>) -> Self {
        self.with(Matcher::Attribute {
            selector: selector.to_string(),
            name: name.to_string(),
            value: value.map(str::to_string),
        })
    }

    /// Same structure, but every descriptor must also contain `text`.
    ///
    /// Used for runtime narrowing, e.g. a template card with a configured name.
    pub fn narrowed_by_text(&self, text: &str) -> Cascade {
        let mut narrowed = Cascade::new(&format!("{} \"{}\"", self.name, text));
        for descriptor in &self.descriptors {
            narrowed = narrowed.text(descriptor.matcher.selector(), text);
        }
        narrowed
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}

impl fmt::Display for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} descriptors)", self.name, self.descriptors.len())
    }
}
