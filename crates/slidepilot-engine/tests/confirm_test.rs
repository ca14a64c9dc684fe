mod common;

use common::{MockBackend, el};
use slidepilot_engine::cascade::Cascade;
use slidepilot_engine::confirm::{ConfirmationSignal, VisualConfirmation, select_with_confirmation};
use slidepilot_engine::protocol::{ElementHandle, Neighborhood, Relation, StyleProbe};
use std::time::Duration;

fn selected_neighborhood() -> Neighborhood {
    let mut anchor = StyleProbe::new(Relation::Anchor, "div");
    anchor
        .attributes
        .insert("aria-selected".into(), "true".into());
    Neighborhood {
        probes: vec![anchor],
    }
}

fn cards() -> Cascade {
    Cascade::new("template_cards").css(".template-card")
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_click_is_retried_once() {
    let mut backend = MockBackend::new().with(&[".template-card"], el("card", "div", "Chisel"));
    backend.neighborhoods.push_back(Neighborhood::default());
    backend.neighborhoods.push_back(selected_neighborhood());

    let report = select_with_confirmation(
        &mut backend,
        &cards(),
        &VisualConfirmation::default(),
        3,
        Duration::from_millis(500),
    )
    .await;

    assert_eq!(report.attempts, 2);
    assert!(report.confirmed());
    assert_eq!(backend.clicks, vec!["card", "card"]);
    assert!(matches!(
        report.signal,
        Some(ConfirmationSignal::Attribute { ref name, .. }) if name == "aria-selected"
    ));
}

#[tokio::test(start_paused = true)]
async fn never_confirmed_stops_at_attempt_budget() {
    let mut backend = MockBackend::new().with(&[".template-card"], el("card", "div", "Chisel"));

    let report = select_with_confirmation(
        &mut backend,
        &cards(),
        &VisualConfirmation::default(),
        2,
        Duration::from_millis(500),
    )
    .await;

    assert_eq!(report.attempts, 2);
    assert!(report.clicked);
    assert!(!report.confirmed());
    assert_eq!(backend.clicks.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn nothing_to_click_reports_unclicked() {
    let mut backend = MockBackend::new();
    let report = select_with_confirmation(
        &mut backend,
        &cards(),
        &VisualConfirmation::default(),
        2,
        Duration::from_millis(500),
    )
    .await;
    assert!(!report.clicked);
    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn inspection_errors_count_as_unconfirmed() {
    let mut backend = MockBackend::new();
    let checker = VisualConfirmation::default();
    assert!(
        !checker
            .is_confirmed(&mut backend, &ElementHandle::from("missing"))
            .await
    );
}
