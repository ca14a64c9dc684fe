mod common;

use common::{MockBackend, disabled, el, hidden};
use slidepilot_engine::cascade::{self, Cascade};
use slidepilot_engine::protocol::{ElementHandle, Scope};

fn send_button() -> Cascade {
    Cascade::new("send")
        .css("#send")
        .attr("button", "aria-label", Some("send"))
        .text("button", "send")
}

#[tokio::test]
async fn resolves_first_descriptor_in_rank_order() {
    let mut labelled = el("b2", "button", "");
    labelled
        .attributes
        .insert("aria-label".into(), "Send message".into());
    let mut backend = MockBackend::new()
        .with(&["button"], el("b1", "button", "Send"))
        .with(&["button"], labelled);

    let resolved = cascade::resolve(&mut backend, &send_button(), &Scope::Document)
        .await
        .expect("resolved");
    assert_eq!(resolved.handle(), &ElementHandle::from("b2"));
    assert_eq!(resolved.rank, 1);
    assert_eq!(resolved.cascade, "send");
}

#[tokio::test]
async fn resolution_is_deterministic_for_a_fixed_page() {
    let mut backend = MockBackend::new()
        .with(&["button"], el("a", "button", "Send now"))
        .with(&["button"], el("b", "button", "Send later"));
    let cascade = send_button();

    let first = cascade::resolve(&mut backend, &cascade, &Scope::Document).await;
    for _ in 0..5 {
        assert_eq!(
            cascade::resolve(&mut backend, &cascade, &Scope::Document).await,
            first
        );
    }
    assert_eq!(first.map(|r| r.element.handle), Some(ElementHandle::from("a")));
}

#[tokio::test]
async fn no_matches_is_none_not_error() {
    let mut backend = MockBackend::new().with(&["div"], el("d", "div", "unrelated"));
    assert!(
        cascade::resolve(&mut backend, &send_button(), &Scope::Document)
            .await
            .is_none()
    );
    // Every descriptor was tried.
    assert_eq!(backend.queries, vec!["#send", "button", "button"]);
}

#[tokio::test]
async fn failing_descriptor_is_skipped() {
    let mut backend = MockBackend::new()
        .invalid("#send")
        .with(&["button"], el("b", "button", "Send"));

    let resolved = cascade::resolve(&mut backend, &send_button(), &Scope::Document)
        .await
        .expect("later descriptor still resolves");
    assert_eq!(resolved.rank, 2);
}

#[tokio::test]
async fn unusable_elements_only_count_for_presence() {
    let mut backend = MockBackend::new()
        .with(&["#send"], disabled(el("off", "button", "Send")))
        .with(&["#send"], hidden(el("gone", "button", "Send")));
    let cascade = Cascade::new("send").css("#send");

    assert!(
        cascade::resolve(&mut backend, &cascade, &Scope::Document)
            .await
            .is_none()
    );
    let any = cascade::resolve_any(&mut backend, &cascade, &Scope::Document)
        .await
        .expect("present");
    assert_eq!(any.handle(), &ElementHandle::from("off"));
    assert_eq!(cascade::count(&mut backend, &cascade, &Scope::Document).await, 2);
}

#[tokio::test]
async fn detached_scope_is_skipped() {
    let mut backend = MockBackend::new().with(&["#send"], el("b", "button", "Send"));
    let scope = Scope::within(&ElementHandle::from("not-there"));
    assert!(
        cascade::resolve(&mut backend, &send_button(), &scope)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn narrowed_cascade_requires_text() {
    let mut backend = MockBackend::new()
        .with(&[".card"], el("c1", "div", "Vortex"))
        .with(&[".card"], el("c2", "div", "Chisel"));
    let cards = Cascade::new("cards").css(".card");

    let narrowed = cards.narrowed_by_text("chisel");
    let resolved = cascade::resolve(&mut backend, &narrowed, &Scope::Document)
        .await
        .expect("named card");
    assert_eq!(resolved.handle(), &ElementHandle::from("c2"));
}
