//! Chat-side states: reach a signed-in session, submit the prompt, read the
//! answer.

use super::RunContext;
use super::state::{Route, StepOutcome, WorkflowState, route_login};
use crate::backend::Backend;
use crate::cascade;
use crate::condition::Condition;
use crate::config::SlidePilotConfig;
use crate::extraction::ResponseExtractor;
use crate::interact::{self, Interaction};
use crate::poller::{PollOutcome, UsableElement, poll_until, probe_fn};
use crate::profile::ChatProfile;
use crate::snapshot::{SnapshotRecorder, SnapshotSink};
use futures::FutureExt;
use slidepilot_common::protocol::Scope;
use tracing::{debug, info, warn};

pub(crate) struct ChatStage<'w> {
    pub config: &'w SlidePilotConfig,
    pub profile: &'w ChatProfile,
}

impl ChatStage<'_> {
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
            WorkflowState::Init => self.open(backend).await,
            WorkflowState::LoginCheck => self.login_check(backend, snapshots).await,
            WorkflowState::Login => self.login(backend).await,
            WorkflowState::SignupFallback => self.signup(backend, snapshots).await,
            WorkflowState::KnowledgeSelect => self.knowledge(backend, ctx).await,
            WorkflowState::PromptSubmit => self.submit(backend, ctx).await,
            WorkflowState::ResponseWait => self.await_response(backend).await,
            WorkflowState::ResponseExtract => self.extract(backend, ctx).await,
            other => StepOutcome::Failed(format!("{} is not a chat state", other)),
        }
    }

    fn attempts(&self) -> usize {
        self.config.workflow.action_attempts
    }

    async fn open<B: Backend + ?Sized>(&self, backend: &mut B) -> StepOutcome {
        let url = &self.config.targets.chat_url;
        match backend.navigate(url).await {
            Ok(nav) => {
                info!("Opened chat at {} ({})", nav.url, nav.title);
                StepOutcome::Satisfied
            }
            Err(e) => StepOutcome::Failed(format!("could not open {}: {}", url, e)),
        }
    }

    async fn login_check<B, S>(
        &self,
        backend: &mut B,
        snapshots: &mut SnapshotRecorder<S>,
    ) -> StepOutcome
    where
        B: Backend + ?Sized,
        S: SnapshotSink,
    {
        let chat = self.profile.chat_indicators.clone();
        let login = self.profile.login_indicators.clone();
        let mut probe = probe_fn(move |b: &mut B| {
            let chat = chat.clone();
            let login = login.clone();
            async move {
                let chat_present = cascade::resolve_any(b, &chat, &Scope::Document).await.is_some();
                let login_present =
                    cascade::resolve_any(b, &login, &Scope::Document).await.is_some();
                (chat_present || login_present).then_some((chat_present, login_present))
            }
            .boxed()
        });

        let options = super::wait_options(
            self.config,
            "login check",
            self.config.timeouts.login_detect_ms,
        );
        let (chat_present, login_present) = poll_until(backend, &mut probe, options)
            .await
            .satisfied()
            .unwrap_or((false, false));
        let route = route_login(
            chat_present,
            login_present,
            self.config.credentials.pair().is_some(),
        );
        info!(
            "Login check: chat={} login={} -> {:?}",
            chat_present, login_present, route
        );
        if route == Route::Unrecognized {
            snapshots.capture(backend, "login_check_unrecognized").await;
        }
        StepOutcome::Route(route)
    }

    async fn login<B: Backend + ?Sized>(&self, backend: &mut B) -> StepOutcome {
        let Some((email, password)) = self.config.credentials.pair() else {
            return StepOutcome::Failed("no credentials configured".to_string());
        };
        let p = self.profile;
        let attempts = self.attempts();

        if interact::act(
            backend,
            &p.email_input,
            &Scope::Document,
            Interaction::Fill(email),
            attempts,
        )
        .await
        .is_none()
        {
            return StepOutcome::Failed("email input not found".to_string());
        }
        if interact::act(
            backend,
            &p.password_input,
            &Scope::Document,
            Interaction::Fill(password),
            attempts,
        )
        .await
        .is_none()
        {
            return StepOutcome::Failed("password input not found".to_string());
        }
        if interact::act(backend, &p.login_submit, &Scope::Document, Interaction::Click, attempts)
            .await
            .is_none()
        {
            debug!("No login submit button, pressing Enter");
            if let Err(e) = backend.press_key("Enter").await {
                return StepOutcome::Failed(format!("could not submit login form: {}", e));
            }
        }

        let mut signed_in = Condition::Present(p.chat_indicators.clone());
        let options = super::wait_options(self.config, "login", self.config.timeouts.chat_ready_ms);
        match poll_until(backend, &mut signed_in, options).await {
            PollOutcome::Satisfied(()) => StepOutcome::Satisfied,
            _ => StepOutcome::TimedOut,
        }
    }

    async fn signup<B, S>(
        &self,
        backend: &mut B,
        snapshots: &mut SnapshotRecorder<S>,
    ) -> StepOutcome
    where
        B: Backend + ?Sized,
        S: SnapshotSink,
    {
        let p = self.profile;
        warn!("No credentials configured; complete signup in the browser window");
        if interact::act(backend, &p.signup_affordance, &Scope::Document, Interaction::Click, 1)
            .await
            .is_none()
        {
            debug!("No signup affordance found, waiting on the current page");
        }
        snapshots.capture(backend, "signup_required").await;

        let mut signed_in = Condition::Present(p.chat_indicators.clone());
        let options = super::wait_options(
            self.config,
            "manual signup",
            self.config.timeouts.signup_wait_ms,
        );
        match poll_until(backend, &mut signed_in, options).await {
            PollOutcome::Satisfied(()) => StepOutcome::Satisfied,
            _ => StepOutcome::TimedOut,
        }
    }

    /// Type the trigger plus tag and pick the matching option. Each miss
    /// clears the input before the next attempt.
    async fn knowledge<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &mut RunContext,
    ) -> StepOutcome {
        let Some(tag) = self.config.workflow.knowledge_tag.as_deref() else {
            return StepOutcome::Skipped("no knowledge tag configured".to_string());
        };
        let p = self.profile;
        let attempts = self.attempts();
        let options = p.knowledge_options.narrowed_by_text(tag);
        let typed = format!("{}{}", p.knowledge_trigger, tag);

        for attempt in 1..=self.config.workflow.knowledge_attempts.max(1) {
            if interact::act(
                backend,
                &p.chat_input,
                &Scope::Document,
                Interaction::Fill(&typed),
                attempts,
            )
            .await
            .is_none()
            {
                return StepOutcome::Failed("chat input not found".to_string());
            }

            let mut offered = UsableElement::new(&options);
            let wait = super::wait_options(
                self.config,
                "knowledge option",
                self.config.timeouts.knowledge_option_ms,
            );
            if let PollOutcome::Satisfied(option) = poll_until(backend, &mut offered, wait).await
                && interact::act_on(backend, option, &options, Interaction::Click, attempts)
                    .await
                    .is_some()
            {
                info!("Knowledge '{}' attached", tag);
                ctx.knowledge_selected = true;
                return StepOutcome::Satisfied;
            }

            debug!("Knowledge option '{}' not offered on attempt {}", tag, attempt);
            if interact::act(backend, &p.chat_input, &Scope::Document, Interaction::Clear, attempts)
                .await
                .is_none()
            {
                warn!("Could not clear the partial knowledge input");
            }
        }

        warn!("Knowledge '{}' never appeared, continuing without it", tag);
        StepOutcome::TimedOut
    }

    async fn submit<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &mut RunContext,
    ) -> StepOutcome {
        let p = self.profile;
        let attempts = self.attempts();
        // Filling would wipe the knowledge chip, so append instead.
        let typing = if ctx.knowledge_selected {
            Interaction::InsertText(&ctx.prompt)
        } else {
            Interaction::Fill(&ctx.prompt)
        };

        if interact::act(backend, &p.chat_input, &Scope::Document, typing, attempts)
            .await
            .is_none()
        {
            return StepOutcome::Failed("chat input not found".to_string());
        }
        tokio::time::sleep(self.config.timeouts.settle()).await;

        if interact::act(backend, &p.send_button, &Scope::Document, Interaction::Click, attempts)
            .await
            .is_some()
        {
            info!("Prompt submitted");
            return StepOutcome::Satisfied;
        }
        debug!("No send button, pressing Enter");
        match backend.press_key("Enter").await {
            Ok(()) => {
                info!("Prompt submitted with Enter");
                StepOutcome::Satisfied
            }
            Err(e) => StepOutcome::Failed(format!("could not send prompt: {}", e)),
        }
    }

    async fn await_response<B: Backend + ?Sized>(&self, backend: &mut B) -> StepOutcome {
        tokio::time::sleep(self.config.timeouts.settle()).await;
        let mut complete = &self.profile.response_complete;
        let options = super::wait_options(
            self.config,
            "response",
            self.config.timeouts.response_ms,
        );
        match poll_until(backend, &mut complete, options).await {
            PollOutcome::Satisfied(()) => StepOutcome::Satisfied,
            _ => StepOutcome::TimedOut,
        }
    }

    async fn extract<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        ctx: &mut RunContext,
    ) -> StepOutcome {
        let extractor = ResponseExtractor::from_profile(self.profile);
        match extractor.extract(backend, &Scope::Document, &ctx.prompt).await {
            Ok(response) => {
                info!(
                    "Response extracted: {} chars via {}",
                    response.text.chars().count(),
                    response.provenance
                );
                ctx.response = Some(response);
                StepOutcome::Satisfied
            }
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}
