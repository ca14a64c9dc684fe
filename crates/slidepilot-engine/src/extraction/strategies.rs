//! The pure parts of each extraction strategy.

use crate::cascade::normalize_text;
use slidepilot_common::protocol::ElementSnapshot;
use std::collections::HashSet;

/// Number of leading prompt characters that count as an echo.
pub const ECHO_PREFIX_CHARS: usize = 50;

/// Whether `text` merely repeats the submitted prompt.
///
/// Prompts shorter than [`ECHO_PREFIX_CHARS`] only echo on an exact match,
/// since answers routinely restate a short topic.
pub fn echoes_prompt(text: &str, prompt: &str) -> bool {
    let prompt = normalize_text(prompt);
    if prompt.is_empty() {
        return false;
    }
    let text = normalize_text(text);
    if text == prompt {
        return true;
    }
    if prompt.chars().count() < ECHO_PREFIX_CHARS {
        return false;
    }
    let prefix: String = prompt.chars().take(ECHO_PREFIX_CHARS).collect();
    text.starts_with(&prefix)
}

/// Whether a page-text line is a known piece of UI chrome: the whole line,
/// or the chrome string followed by non-alphanumeric decoration.
fn is_chrome(line: &str, chrome: &[String]) -> bool {
    let line = normalize_text(line);
    chrome.iter().any(|c| {
        line == *c
            || line
                .strip_prefix(c.as_str())
                .is_some_and(|rest| !rest.chars().any(char::is_alphanumeric))
    })
}

/// Document-scan pick: walk backward, skipping short or echoing candidates.
pub fn pick_message(
    candidates: &[ElementSnapshot],
    prompt: &str,
    min_chars: usize,
) -> Option<(usize, String)> {
    candidates
        .iter()
        .enumerate()
        .rev()
        .map(|(index, el)| (index, el.trimmed_text()))
        .find(|(_, text)| text.chars().count() >= min_chars && !echoes_prompt(text, prompt))
        .map(|(index, text)| (index, text.to_string()))
}

/// Drop elements reported more than once by overlapping per-shape queries,
/// keeping the first occurrence.
pub fn dedupe(elements: Vec<ElementSnapshot>) -> Vec<ElementSnapshot> {
    let mut seen = HashSet::new();
    elements
        .into_iter()
        .filter(|el| seen.insert(el.handle.clone()))
        .collect()
}

/// Raw-text pick: last line that is long enough and is not UI chrome.
pub fn pick_line(page_text: &str, chrome: &[String], min_chars: usize) -> Option<String> {
    let chrome: Vec<String> = chrome.iter().map(|c| normalize_text(c)).collect();
    page_text
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= min_chars)
        .filter(|line| !is_chrome(line, &chrome))
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidepilot_common::protocol::{ElementHandle, Rect};

    fn el(id: &str, text: &str) -> ElementSnapshot {
        ElementSnapshot {
            handle: ElementHandle::from(id),
            tag: "div".into(),
            text: text.into(),
            attributes: Default::default(),
            classes: vec![],
            visible: true,
            enabled: true,
            rect: Rect::default(),
        }
    }

    #[test]
    fn echo_detection() {
        let prompt = "Write a ten slide deck about the history of container shipping and its economics";
        assert!(echoes_prompt(prompt, prompt));
        assert!(echoes_prompt(&format!("{} please", prompt.to_uppercase()), prompt));
        assert!(!echoes_prompt(&format!("You asked: {}", prompt), prompt));
        assert!(!echoes_prompt("Container shipping began in 1956 when ...", prompt));
        assert!(!echoes_prompt("anything", "   "));
    }

    #[test]
    fn short_prompt_only_echoes_exactly() {
        let prompt = "Solar power";
        let answer =
            "Solar power converts sunlight into electricity using photovoltaic cells and mirrors.";
        assert!(echoes_prompt("  solar POWER ", prompt));
        assert!(!echoes_prompt(answer, prompt));

        let candidates = vec![el("1", prompt), el("2", answer)];
        assert_eq!(
            pick_message(&candidates, prompt, 50),
            Some((1, answer.to_string()))
        );
    }

    #[test]
    fn pick_message_walks_backward() {
        let long_a = "a".repeat(60);
        let long_b = "b".repeat(60);
        let candidates = vec![el("1", &long_a), el("2", &long_b), el("3", "short")];
        assert_eq!(pick_message(&candidates, "prompt", 50), Some((1, long_b)));
    }

    #[test]
    fn pick_message_skips_prompt_echo() {
        let prompt = "p".repeat(80);
        let answer = "x".repeat(70);
        let candidates = vec![el("1", &answer), el("2", &prompt)];
        assert_eq!(pick_message(&candidates, &prompt, 50), Some((0, answer)));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let out = dedupe(vec![el("1", "a"), el("2", "b"), el("1", "a")]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn pick_line_drops_chrome_and_short_lines() {
        let body = "x".repeat(120);
        let chrome_line = format!("Send a message {}", " ·".repeat(60));
        let page = format!("short\n{}\n{}\ntiny", body, chrome_line);
        let chrome = vec!["send a message".to_string()];
        assert_eq!(pick_line(&page, &chrome, 100), Some(body));
        assert_eq!(pick_line("only short lines\nhere", &chrome, 100), None);
    }

    #[test]
    fn pick_line_keeps_content_mentioning_chrome_words() {
        let content = "The team used copy editing and careful review of the settings panel \
                       to keep every slide consistent for the stakeholders involved.";
        let page = format!("{}\nCopy\nRegenerate", content);
        let chrome = crate::profile::ChatProfile::default().chrome_strings;
        assert_eq!(pick_line(&page, &chrome, 100), Some(content.to_string()));
    }
}
