use crate::profile::SiteProfiles;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlidePilotConfig {
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub targets: Targets,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub workflow: WorkflowSettings,
    #[serde(default)]
    pub profiles: SiteProfiles,
}

/// Every wait in the workflow, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub page_ready_ms: u64,
    pub login_detect_ms: u64,
    pub chat_ready_ms: u64,
    /// How long a manual signup may take before the workflow moves on.
    pub signup_wait_ms: u64,
    pub knowledge_option_ms: u64,
    pub response_ms: u64,
    pub outline_ms: u64,
    pub generate_button_ms: u64,
    pub redirect_ms: u64,
    pub render_ms: u64,
    pub review_hold_ms: u64,
    pub failure_hold_ms: u64,
    pub poll_interval_ms: u64,
    pub progress_every_ms: u64,
    pub settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_ready_ms: 60_000,
            login_detect_ms: 30_000,
            chat_ready_ms: 60_000,
            signup_wait_ms: 300_000,
            knowledge_option_ms: 10_000,
            response_ms: 600_000,
            outline_ms: 120_000,
            generate_button_ms: 900_000,
            redirect_ms: 120_000,
            render_ms: 600_000,
            review_hold_ms: 300_000,
            failure_hold_ms: 300_000,
            poll_interval_ms: 2_000,
            progress_every_ms: 60_000,
            settle_ms: 1_500,
        }
    }
}

impl Timeouts {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn progress_every(&self) -> Duration {
        Duration::from_millis(self.progress_every_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    #[serde(default = "default_deck_url")]
    pub deck_url: String,
    /// Joined onto `deck_url` to reach the paste-in-text wizard.
    #[serde(default = "default_deck_upload_path")]
    pub deck_upload_path: String,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            deck_url: default_deck_url(),
            deck_upload_path: default_deck_upload_path(),
        }
    }
}

fn default_chat_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_deck_url() -> String {
    "https://gamma.app/".to_string()
}

fn default_deck_upload_path() -> String {
    "create/paste".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl Credentials {
    /// Both present and non-empty.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Knowledge collection to attach before prompting. `None` skips the step.
    #[serde(default)]
    pub knowledge_tag: Option<String>,
    /// Template to prefer on the theme step; otherwise the first card.
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default = "default_template_attempts")]
    pub template_attempts: usize,
    #[serde(default = "default_action_attempts")]
    pub action_attempts: usize,
    #[serde(default = "default_knowledge_attempts")]
    pub knowledge_attempts: u32,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            knowledge_tag: None,
            template_name: None,
            template_attempts: default_template_attempts(),
            action_attempts: default_action_attempts(),
            knowledge_attempts: default_knowledge_attempts(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

fn default_template_attempts() -> usize {
    2
}

fn default_action_attempts() -> usize {
    3
}

fn default_knowledge_attempts() -> u32 {
    2
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}
