//! The two-stage workflow: extract a chat response, then turn it into a deck.
//!
//! Each state runs one bounded action and reports a [`StepOutcome`]; the next
//! state comes from [`transition`]. Only two outcomes are fatal, everything
//! else is recorded as a degraded step and the run continues.

mod chat;
mod deck;
pub mod report;
pub mod state;

pub use deck::ReadyButton;
pub use report::{DegradedStep, WorkflowReport};
pub use state::{Route, Stage, StepOutcome, WorkflowState, route_login, transition};

use crate::backend::{Backend, BackendError};
use crate::cascade::ResolvedElement;
use crate::config::{ConfigError, SlidePilotConfig};
use crate::extraction::ExtractedResponse;
use crate::poller::{PollOptions, hold};
use crate::profile::{ChatProfile, DeckProfile};
use crate::snapshot::{SnapshotRecorder, SnapshotSink};
use chat::ChatStage;
use deck::DeckStage;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Response extraction failed: {0}")]
    FatalExtraction(String),

    #[error("Neither the primary nor the fallback generate button could be clicked")]
    GenerateAborted,

    #[error("No transition from {state} on outcome '{outcome}'")]
    InvalidTransition {
        state: WorkflowState,
        outcome: String,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Values one state hands to a later one.
pub(crate) struct RunContext {
    pub prompt: String,
    pub knowledge_selected: bool,
    pub response: Option<ExtractedResponse>,
    /// Generate button resolved on the tick that satisfied the wait.
    pub pending_generate: Option<ResolvedElement>,
    pub presentation_url: Option<String>,
}

impl RunContext {
    fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            knowledge_selected: false,
            response: None,
            pending_generate: None,
            presentation_url: None,
        }
    }
}

pub(crate) fn wait_options(config: &SlidePilotConfig, label: &str, timeout_ms: u64) -> PollOptions {
    PollOptions::new(label, Duration::from_millis(timeout_ms), config.timeouts.interval())
        .with_progress_every(config.timeouts.progress_every())
}

pub struct Workflow<S: SnapshotSink> {
    config: SlidePilotConfig,
    chat: ChatProfile,
    deck: DeckProfile,
    snapshots: SnapshotRecorder<S>,
    degraded: Vec<DegradedStep>,
}

impl<S: SnapshotSink> Workflow<S> {
    pub fn new(config: SlidePilotConfig, sink: S) -> Self {
        let chat = config.profiles.chat();
        let deck = config.profiles.deck();
        Self {
            config,
            chat,
            deck,
            snapshots: SnapshotRecorder::new(sink),
            degraded: Vec::new(),
        }
    }

    pub fn config(&self) -> &SlidePilotConfig {
        &self.config
    }

    /// Snapshot paths captured so far, including those of a failed run.
    pub fn snapshots(&self) -> &[String] {
        self.snapshots.paths()
    }

    pub fn degraded(&self) -> &[DegradedStep] {
        &self.degraded
    }

    /// Produce a rendered presentation from `prompt`.
    pub async fn run<C, D>(
        &mut self,
        chat: &mut C,
        deck: &mut D,
        prompt: &str,
    ) -> Result<WorkflowReport, WorkflowError>
    where
        C: Backend + ?Sized,
        D: Backend + ?Sized,
    {
        self.drive(chat, Some(deck), prompt).await
    }

    /// Run the chat stage only. The report's `final_state` is the first
    /// deck state, which was not entered.
    pub async fn run_extraction<C>(
        &mut self,
        chat: &mut C,
        prompt: &str,
    ) -> Result<WorkflowReport, WorkflowError>
    where
        C: Backend + ?Sized,
    {
        self.drive::<C, C>(chat, None, prompt).await
    }

    async fn drive<C, D>(
        &mut self,
        chat: &mut C,
        mut deck: Option<&mut D>,
        prompt: &str,
    ) -> Result<WorkflowReport, WorkflowError>
    where
        C: Backend + ?Sized,
        D: Backend + ?Sized,
    {
        self.degraded.clear();
        let mut ctx = RunContext::new(prompt);
        let mut state = WorkflowState::Init;
        info!("Workflow started");

        loop {
            let outcome = match state.stage() {
                Stage::Finished => break,
                Stage::Chat => {
                    let stage = ChatStage {
                        config: &self.config,
                        profile: &self.chat,
                    };
                    stage.step(state, chat, &mut ctx, &mut self.snapshots).await
                }
                Stage::Deck => {
                    let Some(deck) = deck.as_deref_mut() else {
                        break;
                    };
                    let stage = DeckStage {
                        config: &self.config,
                        profile: &self.deck,
                    };
                    stage.step(state, deck, &mut ctx, &mut self.snapshots).await
                }
            };

            match transition(state, &outcome) {
                Ok(next) => {
                    if outcome.is_degraded() {
                        warn!("{} {}, continuing with degraded confidence", state, outcome);
                        self.degraded.push(DegradedStep {
                            state,
                            reason: outcome.reason(),
                        });
                    }
                    info!("{} -> {} ({})", state, next, outcome);
                    state = next;
                }
                Err(e) => {
                    match state.stage() {
                        Stage::Chat => self.abort(chat, state, &e).await,
                        Stage::Deck => {
                            if let Some(deck) = deck.as_deref_mut() {
                                self.abort(deck, state, &e).await;
                            }
                        }
                        Stage::Finished => {}
                    }
                    return Err(e);
                }
            }
        }

        info!(
            "Workflow finished in {} with {} degraded step(s)",
            state,
            self.degraded.len()
        );
        Ok(WorkflowReport {
            response: ctx.response,
            presentation_url: ctx.presentation_url,
            degraded: self.degraded.clone(),
            snapshots: self.snapshots.paths().to_vec(),
            final_state: state,
        })
    }

    /// Capture, report, and keep the page open for inspection.
    async fn abort<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        state: WorkflowState,
        err: &WorkflowError,
    ) {
        self.snapshots
            .capture(backend, &format!("fatal_{}", state))
            .await;
        error!("Workflow aborted in {}: {}", state, err);
        let hold_ms = self.config.timeouts.failure_hold_ms;
        if hold_ms > 0 {
            error!("Keeping the page open for {}s for inspection", hold_ms / 1000);
            hold(backend, wait_options(&self.config, "failure hold", hold_ms)).await;
        }
    }
}
