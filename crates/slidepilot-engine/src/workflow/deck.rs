//! Deck-side states: paste the response into the creation wizard and drive it
//! to a rendered presentation.

use super::RunContext;
use super::state::{Route, StepOutcome, WorkflowState};
use crate::backend::Backend;
use crate::cascade::{self, Cascade, ResolvedElement, normalize_text};
use crate::condition::Condition;
use crate::config::SlidePilotConfig;
use crate::confirm::select_with_confirmation;
use crate::interact::{self, Interaction};
use crate::poller::{PollOutcome, Probe, hold, poll_until};
use crate::profile::DeckProfile;
use crate::snapshot::{SnapshotRecorder, SnapshotSink};
use async_trait::async_trait;
use slidepilot_common::protocol::Scope;
use tracing::{debug, info, warn};
use url::Url;

/// Satisfied by a usable generate button whose label no longer reads as
/// busy. Yields the button resolved on the satisfying tick.
pub struct ReadyButton<'p> {
    profile: &'p DeckProfile,
}

impl<'p> ReadyButton<'p> {
    pub fn new(profile: &'p DeckProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl<'p, B: Backend + ?Sized> Probe<B> for ReadyButton<'p> {
    type Output = ResolvedElement;

    async fn probe(&mut self, backend: &mut B) -> Option<ResolvedElement> {
        let button =
            cascade::resolve(backend, &self.profile.generate_button, &Scope::Document).await?;
        if self.profile.is_loading_text(button.text()) {
            debug!("Generate button still busy: \"{}\"", button.text());
            return None;
        }
        Some(button)
    }
}

pub(crate) struct DeckStage<'w> {
    pub config: &'w SlidePilotConfig,
    pub profile: &'w DeckProfile,
}

impl DeckStage<'_> {
    pub async fn step<B, S>(
        &self,
        state: WorkflowState,
        backend: &mut B,
        ctx: &mut RunContext,
        snapshots: &mut SnapshotRecorder<S>,
    ) -> StepOutcome
    where
        B: Backend + ?Sized,
        S: SnapshotSink,
    {
        match state {
            WorkflowState::UploadNavigate => self.open_upload(backend).await,
            WorkflowState::ContentFill => self.fill_content(backend, ctx).await,
            WorkflowState::OutlineWait => {
                let outline = self.profile.outline_ready();
                self.await_condition(backend, outline, "outline", self.config.timeouts.outline_ms)
                    .await
            }
            WorkflowState::TemplateSelectCheck => self.template_check(backend, snapshots).await,
            WorkflowState::TemplateSelect => self.template_select(backend).await,
            WorkflowState::GenerateWait => self.generate_wait(backend, ctx).await,
            WorkflowState::GenerateClick => self.generate_click(backend, ctx).await,
            WorkflowState::PresentationRedirectWait => self.redirect(backend, ctx).await,
            WorkflowState::RenderWait => self.render(backend, snapshots).await,
            WorkflowState::ReviewHold => {
                info!(
                    "Presentation ready; holding for review ({}s)",
                    self.config.timeouts.review_hold_ms / 1000
                );
                let options = super::wait_options(
                    self.config,
                    "review hold",
                    self.config.timeouts.review_hold_ms,
                );
                hold(backend, options).await;
                StepOutcome::Satisfied
            }
            other => StepOutcome::Failed(format!("{} is not a deck state", other)),
        }
    }

    fn attempts(&self) -> usize {
        self.config.workflow.action_attempts
    }

    async fn await_condition<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        mut condition: Condition,
        label: &str,
        timeout_ms: u64,
    ) -> StepOutcome {
        let options = super::wait_options(self.config, label, timeout_ms);
        match poll_until(backend, &mut condition, options).await {
            PollOutcome::Satisfied(()) => StepOutcome::Satisfied,
            _ => StepOutcome::TimedOut,
        }
    }

    async fn open_upload<B: Backend + ?Sized>(&self, backend: &mut B) -> StepOutcome {
        let targets = &self.config.targets;
        let target = match Url::parse(&targets.deck_url)
            .and_then(|base| base.join(&targets.deck_upload_path))
        {
            Ok(url) => url,
            Err(e) => {
                return StepOutcome::Failed(format!("bad deck URL '{}': {}", targets.deck_url, e));
            }
        };
        if let Err(e) = backend.navigate(target.as_str()).await {
            return StepOutcome::Failed(format!("could not open {}: {}", target, e));
        }
        info!("Opened deck wizard at {}", target);
        self.await_condition(
            backend,
            Condition::Usable(self.profile.content_input.clone()),
            "deck wizard",
            self.config.timeouts.page_ready_ms,
        )
        .await
    }

    async fn fill_content<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &RunContext,
    ) -> StepOutcome {
        let Some(response) = ctx.response.as_ref() else {
            return StepOutcome::Failed("no extracted response to paste".to_string());
        };
        let p = self.profile;
        let attempts = self.attempts();

        if interact::act(
            backend,
            &p.content_input,
            &Scope::Document,
            Interaction::Fill(&response.text),
            attempts,
        )
        .await
        .is_none()
        {
            return StepOutcome::Failed("content input not found".to_string());
        }
        tokio::time::sleep(self.config.timeouts.settle()).await;

        let clicked = interact::act(
            backend,
            &p.continue_button,
            &Scope::Document,
            Interaction::Click,
            attempts,
        )
        .await;
        match clicked {
            Some(_) => StepOutcome::Satisfied,
            None => StepOutcome::Failed("continue button not found".to_string()),
        }
    }

    async fn template_check<B, S>(
        &self,
        backend: &mut B,
        snapshots: &mut SnapshotRecorder<S>,
    ) -> StepOutcome
    where
        B: Backend + ?Sized,
        S: SnapshotSink,
    {
        let wanted = self.config.workflow.template_name.as_deref();
        let selected =
            cascade::resolve_any(backend, &self.profile.selected_template, &Scope::Document).await;
        let route = match (&selected, wanted) {
            (Some(current), Some(name))
                if normalize_text(current.text()).contains(&normalize_text(name)) =>
            {
                Route::TemplateConfirmed
            }
            (Some(_), None) => Route::TemplateConfirmed,
            _ => Route::TemplateNeeded,
        };
        info!(
            "Template check: selected={} wanted={:?} -> {:?}",
            selected.as_ref().map(|s| s.text()).unwrap_or("none"),
            wanted,
            route
        );
        snapshots.capture(backend, "template_check").await;
        StepOutcome::Route(route)
    }

    async fn template_select<B: Backend + ?Sized>(&self, backend: &mut B) -> StepOutcome {
        let cards = self.template_cards(backend).await;
        let report = select_with_confirmation(
            backend,
            &cards,
            &self.profile.confirmation,
            self.config.workflow.template_attempts,
            self.config.timeouts.settle(),
        )
        .await;

        if !report.clicked {
            StepOutcome::Failed("no template card to click".to_string())
        } else if report.confirmed() {
            StepOutcome::Satisfied
        } else {
            StepOutcome::Failed(format!(
                "template selection unconfirmed after {} attempts",
                report.attempts
            ))
        }
    }

    /// Cards narrowed to the configured template when any of them matches.
    async fn template_cards<B: Backend + ?Sized>(&self, backend: &mut B) -> Cascade {
        let all = &self.profile.template_cards;
        let Some(name) = self.config.workflow.template_name.as_deref() else {
            return all.clone();
        };
        let narrowed = all.narrowed_by_text(name);
        if cascade::resolve(backend, &narrowed, &Scope::Document).await.is_some() {
            narrowed
        } else {
            warn!("No template card mentions '{}', using the first card", name);
            all.clone()
        }
    }

    async fn generate_wait<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &mut RunContext,
    ) -> StepOutcome {
        let mut ready = ReadyButton::new(self.profile);
        let options = super::wait_options(
            self.config,
            "generate button",
            self.config.timeouts.generate_button_ms,
        );
        match poll_until(backend, &mut ready, options).await {
            PollOutcome::Satisfied(button) => {
                info!("Generate button ready: {}", button.element);
                ctx.pending_generate = Some(button);
                StepOutcome::Satisfied
            }
            _ => StepOutcome::TimedOut,
        }
    }

    /// Click the button from the satisfying tick, else a ready primary
    /// button found now, else the fallback cascade.
    async fn generate_click<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &mut RunContext,
    ) -> StepOutcome {
        let p = self.profile;
        let attempts = self.attempts();

        // A primary button still labelled as busy is not clicked.
        let pending = match ctx.pending_generate.take() {
            Some(button) => Some(button),
            None => {
                let mut ready = ReadyButton::new(p);
                ready.probe(backend).await
            }
        };
        let primary = match pending {
            Some(button) => {
                interact::act_on(backend, button, &p.generate_button, Interaction::Click, attempts)
                    .await
            }
            None => None,
        };
        if let Some(button) = primary {
            info!("Clicked generate: {}", button.element);
            return StepOutcome::Satisfied;
        }

        warn!("Primary generate button not clickable, trying fallback");
        let fallback = interact::act(
            backend,
            &p.generate_fallback,
            &Scope::Document,
            Interaction::Click,
            attempts,
        )
        .await;
        match fallback {
            Some(button) => {
                info!("Clicked fallback generate: {}", button.element);
                StepOutcome::Satisfied
            }
            None => StepOutcome::Failed("no clickable generate button".to_string()),
        }
    }

    async fn redirect<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &mut RunContext,
    ) -> StepOutcome {
        let outcome = self
            .await_condition(
                backend,
                self.profile.presentation_ready(),
                "presentation redirect",
                self.config.timeouts.redirect_ms,
            )
            .await;
        match backend.current_url().await {
            Ok(url) => {
                info!("Presentation URL: {}", url);
                ctx.presentation_url = Some(url);
            }
            Err(e) => warn!("Could not read presentation URL: {}", e),
        }
        outcome
    }

    async fn render<B, S>(
        &self,
        backend: &mut B,
        snapshots: &mut SnapshotRecorder<S>,
    ) -> StepOutcome
    where
        B: Backend + ?Sized,
        S: SnapshotSink,
    {
        let outcome = self
            .await_condition(
                backend,
                self.profile.render_complete(),
                "render",
                self.config.timeouts.render_ms,
            )
            .await;
        snapshots.capture(backend, "rendered").await;
        outcome
    }
}
