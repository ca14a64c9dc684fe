use super::{ChatProfile, DeckProfile};
use crate::cascade::Cascade;
use crate::condition::Condition;
use crate::confirm::VisualConfirmation;

pub fn chat_profile() -> ChatProfile {
    ChatProfile {
        chat_indicators: Cascade::new("chat_indicators")
            .css("#chat-input")
            .css("textarea[placeholder*='message' i]")
            .attr("nav, aside", "aria-label", Some("chat history"))
            .css("[data-testid='user-menu']"),
        login_indicators: Cascade::new("login_indicators")
            .css("form[action*='login'], form[action*='signin']")
            .css("input[type='password']")
            .text("button, a", "sign in")
            .text("button, a", "log in"),
        email_input: Cascade::new("email_input")
            .css("input[type='email']")
            .css("input[name='email'], input[autocomplete='username']")
            .attr("input", "placeholder", Some("email")),
        password_input: Cascade::new("password_input")
            .css("input[type='password']")
            .css("input[name='password']"),
        login_submit: Cascade::new("login_submit")
            .css("button[type='submit']")
            .text("button", "sign in")
            .text("button", "log in")
            .text("button", "continue"),
        signup_affordance: Cascade::new("signup_affordance")
            .text("a, button", "sign up")
            .text("a, button", "create account")
            .text("a, button", "register"),
        chat_input: Cascade::new("chat_input")
            .css("#chat-input")
            .css("textarea[placeholder*='message' i]")
            .css("div[contenteditable='true']")
            .css("textarea"),
        send_button: Cascade::new("send_button")
            .css("#send-message-button")
            .attr("button", "aria-label", Some("send"))
            .css("button[type='submit']")
            .text("button", "send"),
        knowledge_trigger: "#".to_string(),
        knowledge_options: Cascade::new("knowledge_options")
            .css("[role='listbox'] [role='option']")
            .css("[role='menu'] [role='menuitem']")
            .css("ul.dropdown li button, ul.dropdown li"),
        // Suggestions only render once the answer has finished streaming.
        response_complete: Condition::Present(
            Cascade::new("follow_ups")
                .css("[data-testid='follow-ups'] button")
                .css(".follow-ups button, .follow-up-suggestions button")
                .attr("button", "data-testid", Some("follow-up"))
                .css("[aria-label*='follow-up' i] button"),
        ),
        last_message: Cascade::new("last_message")
            .css(".chat-assistant:last-of-type .content")
            .css("[data-role='assistant']:last-of-type .markdown")
            .css("div.message:last-of-type .prose"),
        message_shapes: vec![
            ".chat-assistant".to_string(),
            "[data-role='assistant']".to_string(),
            "div.message".to_string(),
            "article".to_string(),
            "div.prose, div.markdown".to_string(),
        ],
        min_message_chars: 50,
        min_line_chars: 100,
        chrome_strings: [
            "send a message",
            "sign in",
            "sign up",
            "new chat",
            "regenerate",
            "copy",
            "can make mistakes",
            "follow up",
            "settings",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

pub fn deck_profile() -> DeckProfile {
    DeckProfile {
        content_input: Cascade::new("content_input")
            .css("textarea[name='content']")
            .attr("textarea", "placeholder", Some("paste"))
            .css("div[contenteditable='true']")
            .css("textarea"),
        continue_button: Cascade::new("continue_button")
            .text("button", "continue")
            .text("button", "next")
            .text("button", "generate outline"),
        outline_url: r"/(outline|edit-outline)".to_string(),
        template_cards: Cascade::new("template_cards")
            .css("[data-testid='template-card']")
            .css(".template-card, .theme-card")
            .attr("[role='radio'], [role='option']", "aria-label", Some("template")),
        selected_template: Cascade::new("selected_template")
            .css("[data-testid='template-card'][aria-selected='true']")
            .css(".template-card.selected, .theme-card.selected")
            .css("[data-testid='template-card'][data-state='checked']"),
        generate_button: Cascade::new("generate_button")
            .css("[data-testid='generate-button']")
            .text("button", "generate presentation")
            .text("button", "generate"),
        generate_fallback: Cascade::new("generate_fallback")
            .css("button[type='submit']")
            .text("button", "create")
            .text("button", "done"),
        loading_markers: ["loading", "generating", "please wait"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        presentation_url: r"/(presentation|docs|deck)s?/[A-Za-z0-9_-]+".to_string(),
        render_spinner: Cascade::new("render_spinner")
            .css("[role='progressbar']")
            .css(".spinner, .loading-spinner")
            .attr("[aria-busy]", "aria-busy", Some("true")),
        slide_content: Cascade::new("slide_content")
            .css("[data-testid='slide']")
            .css(".slide, section.slide-container"),
        confirmation: VisualConfirmation::default(),
    }
}
