//! Bounded-time polling of a completion predicate.
//!
//! Target pages give no completion signal, so every wait in the workflow is a
//! poll: evaluate, sleep, evaluate again, until the predicate holds or the
//! deadline passes. A deadline passing is an outcome, not an error.

use crate::backend::Backend;
use crate::cascade::{self, Cascade, ResolvedElement};
use crate::condition::Condition;
use async_trait::async_trait;
use futures::future::BoxFuture;
use slidepilot_common::protocol::Scope;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Result of one tick, or of a whole run when terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T = ()> {
    Pending,
    Satisfied(T),
    TimedOut,
}

impl<T> PollOutcome<T> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollOutcome::Satisfied(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut)
    }

    pub fn satisfied(self) -> Option<T> {
        match self {
            PollOutcome::Satisfied(value) => Some(value),
            _ => None,
        }
    }
}

/// A predicate evaluated once per tick. `Some` means satisfied.
#[async_trait]
pub trait Probe<B: Backend + ?Sized>: Send {
    type Output: Send;

    async fn probe(&mut self, backend: &mut B) -> Option<Self::Output>;
}

#[async_trait]
impl<B: Backend + ?Sized> Probe<B> for Condition {
    type Output = ();

    async fn probe(&mut self, backend: &mut B) -> Option<()> {
        self.evaluate(backend).await.then_some(())
    }
}

#[async_trait]
impl<'c, B: Backend + ?Sized> Probe<B> for &'c Condition {
    type Output = ();

    async fn probe(&mut self, backend: &mut B) -> Option<()> {
        self.evaluate(backend).await.then_some(())
    }
}

/// Satisfied by the first usable element of a cascade, yielding that element.
pub struct UsableElement<'c> {
    pub cascade: &'c Cascade,
    pub scope: Scope,
}

impl<'c> UsableElement<'c> {
    pub fn new(cascade: &'c Cascade) -> Self {
        Self {
            cascade,
            scope: Scope::Document,
        }
    }
}

#[async_trait]
impl<'c, B: Backend + ?Sized> Probe<B> for UsableElement<'c> {
    type Output = ResolvedElement;

    async fn probe(&mut self, backend: &mut B) -> Option<ResolvedElement> {
        cascade::resolve(backend, self.cascade, &self.scope).await
    }
}

/// Adapter turning a closure into a [`Probe`].
pub struct FnProbe<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

/// Wrap a closure as a probe.
///
/// ```ignore
/// let mut probe = probe_fn(|b: &mut MyBackend| async move {
///     b.current_url().await.ok().filter(|u| u.contains("/outline"))
/// }.boxed());
/// ```
pub fn probe_fn<B, T, F>(f: F) -> FnProbe<F, T>
where
    B: Backend + ?Sized,
    F: for<'a> FnMut(&'a mut B) -> BoxFuture<'a, Option<T>> + Send,
{
    FnProbe {
        f,
        _output: PhantomData,
    }
}

#[async_trait]
impl<B, T, F> Probe<B> for FnProbe<F, T>
where
    B: Backend + ?Sized,
    T: Send,
    F: for<'a> FnMut(&'a mut B) -> BoxFuture<'a, Option<T>> + Send,
{
    type Output = T;

    async fn probe(&mut self, backend: &mut B) -> Option<T> {
        (self.f)(backend).await
    }
}

#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Name used in progress messages.
    pub label: String,
    pub timeout: Duration,
    pub interval: Duration,
    /// How often a still-pending poll reports progress.
    pub progress_every: Duration,
}

impl PollOptions {
    pub fn new(label: &str, timeout: Duration, interval: Duration) -> Self {
        Self {
            label: label.to_string(),
            timeout,
            interval,
            progress_every: Duration::from_secs(60),
        }
    }

    pub fn with_progress_every(mut self, every: Duration) -> Self {
        self.progress_every = every;
        self
    }
}

/// One poll run: owns its deadline and tick count.
pub struct PollRun {
    options: PollOptions,
    started: Instant,
    deadline: Instant,
    last_progress: Instant,
    ticks: u32,
}

impl PollRun {
    pub fn start(options: PollOptions) -> Self {
        let started = Instant::now();
        Self {
            deadline: started + options.timeout,
            last_progress: started,
            started,
            options,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Evaluate the probe once.
    pub async fn tick<B, P>(&mut self, backend: &mut B, probe: &mut P) -> PollOutcome<P::Output>
    where
        B: Backend + ?Sized,
        P: Probe<B> + ?Sized,
    {
        self.ticks += 1;
        if let Some(value) = probe.probe(backend).await {
            debug!("{}: satisfied on tick {}", self.options.label, self.ticks);
            return PollOutcome::Satisfied(value);
        }

        let now = Instant::now();
        if now >= self.deadline {
            return PollOutcome::TimedOut;
        }

        if now.duration_since(self.last_progress) >= self.options.progress_every {
            self.last_progress = now;
            info!(
                "{}: still waiting after {}s (limit {}s)",
                self.options.label,
                now.duration_since(self.started).as_secs(),
                self.options.timeout.as_secs()
            );
        }
        PollOutcome::Pending
    }

    /// Sleep until the next tick is due, never past the deadline.
    pub async fn pause(&self) {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(self.options.interval.min(remaining)).await;
    }
}

/// Poll `probe` until it is satisfied or `options.timeout` elapses.
///
/// A probe satisfied on the first evaluation returns without sleeping.
/// `TimedOut` is only returned once the full timeout has passed.
pub async fn poll_until<B, P>(
    backend: &mut B,
    probe: &mut P,
    options: PollOptions,
) -> PollOutcome<P::Output>
where
    B: Backend + ?Sized,
    P: Probe<B> + ?Sized,
{
    let label = options.label.clone();
    let mut run = PollRun::start(options);
    loop {
        match run.tick(backend, probe).await {
            PollOutcome::Pending => run.pause().await,
            PollOutcome::TimedOut => {
                info!(
                    "{}: timed out after {} ticks ({}s)",
                    label,
                    run.ticks(),
                    run.elapsed().as_secs()
                );
                return PollOutcome::TimedOut;
            }
            satisfied => return satisfied,
        }
    }
}

/// Hold for the full `options.timeout`, reporting progress like any other wait.
pub async fn hold<B: Backend + ?Sized>(backend: &mut B, options: PollOptions) {
    let mut never = Condition::Never;
    let _ = poll_until(backend, &mut never, options).await;
}
