//! Per-site knowledge: which cascades name which UI concept, and which
//! conditions mean a transition finished.

pub mod builtin;

use crate::cascade::Cascade;
use crate::condition::Condition;
use crate::confirm::VisualConfirmation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatProfile {
    /// Present only once a signed-in chat session is showing.
    pub chat_indicators: Cascade,
    pub login_indicators: Cascade,
    pub email_input: Cascade,
    pub password_input: Cascade,
    pub login_submit: Cascade,
    pub signup_affordance: Cascade,
    pub chat_input: Cascade,
    pub send_button: Cascade,
    /// Typed into the chat input to open the knowledge picker.
    #[serde(default = "default_knowledge_trigger")]
    pub knowledge_trigger: String,
    pub knowledge_options: Cascade,
    /// Holds once the assistant has finished answering.
    pub response_complete: Condition,
    pub last_message: Cascade,
    /// Structural shapes a message container may take, in document order.
    pub message_shapes: Vec<String>,
    #[serde(default = "default_min_message_chars")]
    pub min_message_chars: usize,
    #[serde(default = "default_min_line_chars")]
    pub min_line_chars: usize,
    #[serde(default)]
    pub chrome_strings: Vec<String>,
}

fn default_knowledge_trigger() -> String {
    "#".to_string()
}

fn default_min_message_chars() -> usize {
    50
}

fn default_min_line_chars() -> usize {
    100
}

impl Default for ChatProfile {
    fn default() -> Self {
        builtin::chat_profile()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckProfile {
    pub content_input: Cascade,
    pub continue_button: Cascade,
    /// Regex matched against the URL once the outline editor is showing.
    pub outline_url: String,
    pub template_cards: Cascade,
    /// Present when some template already counts as applied.
    pub selected_template: Cascade,
    pub generate_button: Cascade,
    /// Tried only when the primary cascade finds nothing clickable.
    pub generate_fallback: Cascade,
    /// Button texts meaning the generate button is still busy.
    #[serde(default)]
    pub loading_markers: Vec<String>,
    pub presentation_url: String,
    pub render_spinner: Cascade,
    pub slide_content: Cascade,
    #[serde(default)]
    pub confirmation: VisualConfirmation,
}

impl Default for DeckProfile {
    fn default() -> Self {
        builtin::deck_profile()
    }
}

impl DeckProfile {
    /// Spinner gone and slides showing.
    pub fn render_complete(&self) -> Condition {
        Condition::All(vec![
            Condition::Absent(self.render_spinner.clone()),
            Condition::Present(self.slide_content.clone()),
        ])
    }

    pub fn outline_ready(&self) -> Condition {
        Condition::UrlMatches(self.outline_url.clone())
    }

    pub fn presentation_ready(&self) -> Condition {
        Condition::UrlMatches(self.presentation_url.clone())
    }

    /// Whether a button text still reads as "busy".
    pub fn is_loading_text(&self, text: &str) -> bool {
        let text = crate::cascade::normalize_text(text);
        self.loading_markers
            .iter()
            .any(|m| text.contains(&crate::cascade::normalize_text(m)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteProfiles {
    #[serde(default)]
    pub chat: Option<ChatProfile>,
    #[serde(default)]
    pub deck: Option<DeckProfile>,
}

impl SiteProfiles {
    pub fn chat(&self) -> ChatProfile {
        self.chat.clone().unwrap_or_default()
    }

    pub fn deck(&self) -> DeckProfile {
        self.deck.clone().unwrap_or_default()
    }
}
