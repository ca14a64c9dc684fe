mod common;

use common::{MockBackend, el};
use slidepilot_engine::cascade::Cascade;
use slidepilot_engine::extraction::{ExtractionError, Provenance, ResponseExtractor};
use slidepilot_engine::profile::ChatProfile;
use slidepilot_engine::protocol::Scope;

const PROMPT: &str = "Summarize the quarterly results for the board in five slides with key numbers";

fn profile() -> ChatProfile {
    let mut profile = ChatProfile::default();
    profile.last_message = Cascade::new("last_message").css(".message:last-child .content");
    profile.message_shapes = vec![".message".to_string(), "article".to_string()];
    profile.chrome_strings = vec!["send a message".to_string(), "sign in".to_string()];
    profile
}

fn long(prefix: &str, n: usize) -> String {
    format!("{} {}", prefix, "lorem ".repeat(n))
}

#[tokio::test]
async fn structured_read_wins_when_present() {
    let answer = long("Revenue grew", 20);
    let mut backend = MockBackend::new()
        .with(&[".message:last-child .content"], el("c", "div", &answer))
        .with(&[".message"], el("m", "div", &long("Older message", 20)));
    let extractor = ResponseExtractor::from_profile(&profile());

    let response = extractor
        .extract(&mut backend, &Scope::Document, PROMPT)
        .await
        .expect("extracted");
    assert_eq!(response.text, answer.trim());
    assert!(matches!(response.provenance, Provenance::Structured { .. }));
}

#[tokio::test]
async fn document_scan_only_after_empty_structured_read() {
    let first = long("First answer", 20);
    let last = long("Final answer", 20);
    let mut backend = MockBackend::new()
        .with(&[".message:last-child .content"], el("c", "div", "   "))
        .with(&[".message"], el("m1", "div", &first))
        .with(&[".message"], el("m2", "div", &last))
        .with(&[".message"], el("m3", "div", PROMPT))
        .with(&[".message"], el("m4", "div", "Thanks!"));
    let extractor = ResponseExtractor::from_profile(&profile());

    let response = extractor
        .extract(&mut backend, &Scope::Document, PROMPT)
        .await
        .expect("extracted");
    assert_eq!(response.text, last.trim());
    assert_eq!(response.provenance, Provenance::DocumentScan { index: 1 });
}

#[tokio::test]
async fn short_prompt_restated_in_answer_is_not_an_echo() {
    let prompt = "Solar power";
    let answer =
        "Solar power converts sunlight into electricity using photovoltaic cells and mirrors.";
    let mut backend = MockBackend::new()
        .with(&[".message"], el("m1", "div", prompt))
        .with(&[".message"], el("m2", "div", answer));
    let extractor = ResponseExtractor::from_profile(&profile());

    let response = extractor
        .extract(&mut backend, &Scope::Document, prompt)
        .await
        .expect("extracted");
    assert_eq!(response.text, answer);
    assert_eq!(response.provenance, Provenance::DocumentScan { index: 1 });
}

#[tokio::test]
async fn shapes_queried_separately_when_combined_selector_fails() {
    let answer = long("From an article", 20);
    let mut backend = MockBackend::new()
        .invalid(".message, article")
        .with(&["article"], el("a1", "article", &answer));
    let extractor = ResponseExtractor::from_profile(&profile());

    let response = extractor
        .extract(&mut backend, &Scope::Document, PROMPT)
        .await
        .expect("extracted");
    assert_eq!(response.provenance, Provenance::DocumentScan { index: 0 });
    assert!(backend.queries.contains(&".message".to_string()));
    assert!(backend.queries.contains(&"article".to_string()));
}

#[tokio::test]
async fn page_text_is_the_last_resort() {
    let body = long("The board should note", 25);
    let text = format!(
        "Send a message {}\n{}\nSign in\n{}",
        "x".repeat(120),
        body,
        "short footer"
    );
    let mut backend = MockBackend::new().with_text(&text);
    let extractor = ResponseExtractor::from_profile(&profile());

    let response = extractor
        .extract(&mut backend, &Scope::Document, PROMPT)
        .await
        .expect("extracted");
    assert_eq!(response.provenance, Provenance::PageText);
    assert_eq!(response.text, body.trim());
}

#[tokio::test]
async fn twenty_character_message_is_not_a_response() {
    let message = "Here is your answer.";
    assert_eq!(message.len(), 20);
    let mut backend = MockBackend::new()
        .with(&[".message"], el("m", "div", message))
        .with_text(message);
    let extractor = ResponseExtractor::from_profile(&profile());

    let result = extractor.extract(&mut backend, &Scope::Document, PROMPT).await;
    assert_eq!(result, Err(ExtractionError::Failed));
}
