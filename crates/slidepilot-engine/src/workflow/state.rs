use super::WorkflowError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Init,
    LoginCheck,
    Login,
    SignupFallback,
    KnowledgeSelect,
    PromptSubmit,
    ResponseWait,
    ResponseExtract,
    UploadNavigate,
    ContentFill,
    OutlineWait,
    TemplateSelectCheck,
    TemplateSelect,
    GenerateWait,
    GenerateClick,
    PresentationRedirectWait,
    RenderWait,
    ReviewHold,
    Done,
}

/// Which target application a state drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Chat,
    Deck,
    Finished,
}

impl WorkflowState {
    pub fn stage(&self) -> Stage {
        use WorkflowState::*;
        match self {
            Init | LoginCheck | Login | SignupFallback | KnowledgeSelect | PromptSubmit
            | ResponseWait | ResponseExtract => Stage::Chat,
            UploadNavigate | ContentFill | OutlineWait | TemplateSelectCheck | TemplateSelect
            | GenerateWait | GenerateClick | PresentationRedirectWait | RenderWait
            | ReviewHold => Stage::Deck,
            Done => Stage::Finished,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A branch decision made by a check state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SessionActive,
    LoginForm,
    SignupRequired,
    Unrecognized,
    TemplateConfirmed,
    TemplateNeeded,
}

/// What one state's bounded action observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Satisfied,
    TimedOut,
    Skipped(String),
    Failed(String),
    Route(Route),
}

impl StepOutcome {
    /// Outcomes that let the workflow continue with lower confidence.
    pub fn is_degraded(&self) -> bool {
        matches!(self, StepOutcome::TimedOut | StepOutcome::Failed(_))
    }

    pub fn reason(&self) -> String {
        match self {
            StepOutcome::Satisfied => "satisfied".to_string(),
            StepOutcome::TimedOut => "timed out".to_string(),
            StepOutcome::Skipped(why) => format!("skipped: {}", why),
            StepOutcome::Failed(why) => format!("failed: {}", why),
            StepOutcome::Route(route) => format!("route {:?}", route),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Chat indicators win over login indicators; login indicators lead to a
/// login only when there is something to log in with.
pub fn route_login(chat_present: bool, login_present: bool, has_credentials: bool) -> Route {
    match (chat_present, login_present) {
        (true, _) => Route::SessionActive,
        (false, true) if has_credentials => Route::LoginForm,
        (false, true) => Route::SignupRequired,
        (false, false) => Route::Unrecognized,
    }
}

/// Next state for `(state, outcome)`.
///
/// Timeouts and failures advance like success everywhere except
/// `ResponseExtract` and `GenerateClick`, which have nothing to fall back to.
pub fn transition(
    state: WorkflowState,
    outcome: &StepOutcome,
) -> Result<WorkflowState, WorkflowError> {
    use WorkflowState::*;

    if let StepOutcome::Route(route) = outcome {
        return match (state, route) {
            (LoginCheck, Route::SessionActive | Route::Unrecognized) => Ok(KnowledgeSelect),
            (LoginCheck, Route::LoginForm) => Ok(Login),
            (LoginCheck, Route::SignupRequired) => Ok(SignupFallback),
            (TemplateSelectCheck, Route::TemplateConfirmed) => Ok(GenerateWait),
            (TemplateSelectCheck, Route::TemplateNeeded) => Ok(TemplateSelect),
            _ => Err(invalid(state, outcome)),
        };
    }

    match state {
        Init => Ok(LoginCheck),
        // A check that produced no route could not look at the page at all.
        LoginCheck => Ok(KnowledgeSelect),
        Login | SignupFallback => Ok(KnowledgeSelect),
        KnowledgeSelect => Ok(PromptSubmit),
        PromptSubmit => Ok(ResponseWait),
        ResponseWait => Ok(ResponseExtract),
        ResponseExtract => match outcome {
            StepOutcome::Satisfied => Ok(UploadNavigate),
            other => Err(WorkflowError::FatalExtraction(other.reason())),
        },
        UploadNavigate => Ok(ContentFill),
        ContentFill => Ok(OutlineWait),
        OutlineWait => Ok(TemplateSelectCheck),
        TemplateSelectCheck => Ok(GenerateWait),
        TemplateSelect => Ok(GenerateWait),
        GenerateWait => Ok(GenerateClick),
        GenerateClick => match outcome {
            StepOutcome::Satisfied => Ok(PresentationRedirectWait),
            _ => Err(WorkflowError::GenerateAborted),
        },
        PresentationRedirectWait => Ok(RenderWait),
        RenderWait => Ok(ReviewHold),
        ReviewHold => Ok(Done),
        Done => Err(invalid(state, outcome)),
    }
}

fn invalid(state: WorkflowState, outcome: &StepOutcome) -> WorkflowError {
    WorkflowError::InvalidTransition {
        state,
        outcome: outcome.reason(),
    }
}
