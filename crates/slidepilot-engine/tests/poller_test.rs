mod common;

use common::{MockBackend, disabled, el};
use futures::FutureExt;
use slidepilot_engine::backend::Backend;
use slidepilot_engine::cascade::Cascade;
use slidepilot_engine::condition::Condition;
use slidepilot_engine::interact::{self, Interaction};
use slidepilot_engine::poller::{
    PollOptions, PollOutcome, PollRun, UsableElement, hold, poll_until, probe_fn,
};
use slidepilot_engine::profile::DeckProfile;
use slidepilot_engine::workflow::ReadyButton;
use std::time::Duration;
use tokio::time::Instant;

const INTERVAL: Duration = Duration::from_secs(2);

fn options(timeout: Duration) -> PollOptions {
    PollOptions::new("test", timeout, INTERVAL)
}

#[tokio::test(start_paused = true)]
async fn satisfied_on_first_tick_does_not_sleep() {
    let mut backend = MockBackend::new();
    let started = Instant::now();
    let mut always = Condition::Always;

    let outcome = poll_until(&mut backend, &mut always, options(Duration::from_secs(30))).await;

    assert!(outcome.is_satisfied());
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn always_false_times_out_no_earlier_than_timeout() {
    let mut backend = MockBackend::new();
    let timeout = Duration::from_secs(7);
    let started = Instant::now();
    let mut never = Condition::Never;

    let outcome = poll_until(&mut backend, &mut never, options(timeout)).await;

    assert!(outcome.is_timed_out());
    let elapsed = started.elapsed();
    assert!(elapsed >= timeout, "returned after {:?}", elapsed);
    // The final sleep is clipped to the deadline.
    assert!(elapsed < timeout + INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn tick_counts_and_clipped_sleep() {
    let mut backend = MockBackend::new();
    let mut never = Condition::Never;
    let mut run = PollRun::start(options(Duration::from_secs(5)));

    let mut outcomes = Vec::new();
    loop {
        let outcome = run.tick(&mut backend, &mut never).await;
        if outcome != PollOutcome::Pending {
            outcomes.push(outcome);
            break;
        }
        run.pause().await;
    }
    // Ticks at 0s, 2s, 4s and 5s.
    assert_eq!(run.ticks(), 4);
    assert_eq!(outcomes, vec![PollOutcome::TimedOut]);
}

#[tokio::test(start_paused = true)]
async fn element_appearing_later_is_yielded() {
    let mut backend = MockBackend::new()
        .then_at(Duration::from_secs(3))
        .with(&["#chat"], el("chat", "textarea", ""));
    let cascade = Cascade::new("chat").css("#chat");
    let mut probe = UsableElement::new(&cascade);

    let outcome = poll_until(&mut backend, &mut probe, options(Duration::from_secs(30))).await;
    let element = outcome.satisfied().expect("appears at 3s");
    assert_eq!(element.handle().as_str(), "chat");
}

#[tokio::test(start_paused = true)]
async fn closure_probe_reads_url() {
    let mut backend = MockBackend::new().at_url("https://deck.example/create");
    let mut probe = probe_fn(|b: &mut MockBackend| {
        async move {
            b.current_url()
                .await
                .ok()
                .filter(|url| url.contains("/create"))
        }
        .boxed()
    });

    let outcome = poll_until(&mut backend, &mut probe, options(Duration::from_secs(1))).await;
    assert_eq!(
        outcome,
        PollOutcome::Satisfied("https://deck.example/create".to_string())
    );
}

/// Busy and disabled for three ticks, ready on the fourth: the wait ends on
/// tick 4 and the click lands on the element from that tick.
#[tokio::test(start_paused = true)]
async fn generate_button_ready_on_fourth_tick() {
    let selector = "[data-testid='generate-button']";
    let mut backend = MockBackend::new()
        .with(&[selector, "button"], disabled(el("gen-t1", "button", "Loading…")))
        .then_at(Duration::from_secs(6))
        .with(&[selector, "button"], el("gen-t4", "button", "Generate Presentation"));
    let profile = DeckProfile::default();
    let mut ready = ReadyButton::new(&profile);
    let mut run = PollRun::start(options(Duration::from_secs(60)));

    let button = loop {
        match run.tick(&mut backend, &mut ready).await {
            PollOutcome::Satisfied(button) => break button,
            PollOutcome::Pending => run.pause().await,
            PollOutcome::TimedOut => panic!("button never became ready"),
        }
    };
    assert_eq!(run.ticks(), 4);
    assert_eq!(button.handle().as_str(), "gen-t4");

    let clicked = interact::act_on(
        &mut backend,
        button,
        &profile.generate_button,
        Interaction::Click,
        2,
    )
    .await
    .expect("clicked");
    assert_eq!(clicked.handle().as_str(), "gen-t4");
    assert_eq!(backend.clicks, vec!["gen-t4"]);
}

#[tokio::test(start_paused = true)]
async fn stale_handle_from_earlier_tick_is_rejected() {
    let mut backend = MockBackend::new()
        .with(&["#go"], el("go-1", "button", "Go"))
        .then_at(Duration::from_secs(2))
        .with(&["#go"], el("go-2", "button", "Go"));
    let cascade = Cascade::new("go").css("#go");
    let early = slidepilot_engine::cascade::resolve(
        &mut backend,
        &cascade,
        &slidepilot_engine::protocol::Scope::Document,
    )
    .await
    .expect("tick 1 element");

    tokio::time::sleep(Duration::from_secs(2)).await;
    let clicked = interact::act_on(&mut backend, early, &cascade, Interaction::Click, 2)
        .await
        .expect("re-resolved");
    assert_eq!(clicked.handle().as_str(), "go-2");
    assert_eq!(backend.clicks, vec!["go-2"]);
}

#[tokio::test(start_paused = true)]
async fn hold_waits_full_duration() {
    let mut backend = MockBackend::new();
    let started = Instant::now();
    hold(&mut backend, options(Duration::from_secs(300))).await;
    assert!(started.elapsed() >= Duration::from_secs(300));
}
