//! Chatbot widget markup.

use std::fmt::Write as _;

use crate::session::{ChatWidget, Message};

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn display(visible: bool) -> &'static str {
    if visible { "flex" } else { "none" }
}

fn render_message(out: &mut String, msg: &Message) {
    let _ = write!(
        out,
        r#"<div class="chatbot-message {}">{}</div>"#,
        msg.sender.as_str(),
        escape_html(&msg.text)
    );
}

/// Render the widget: trigger button, panel, transcript and input form.
///
/// `widget_id` is used to build the HTMX endpoints.
#[must_use]
pub fn render_widget(widget_id: &str, widget: &ChatWidget) -> String {
    let id = escape_html(widget_id);
    let mut messages = String::new();
    for msg in widget.transcript().messages() {
        render_message(&mut messages, msg);
    }

    // Poll until the pending reply replaces the placeholder.
    let (poll, disabled) = if widget.is_turn_in_flight() {
        (
            format!(r#" hx-get="/api/widgets/{id}/fragment" hx-trigger="every 1s""#),
            " disabled",
        )
    } else {
        (String::new(), "")
    };

    format!(
        r##"<div id="chatbot" hx-target="#chatbot" hx-swap="outerHTML"{poll}>
    <button id="chatbot-button" type="button" style="display:{trigger}"
        hx-post="/api/widgets/{id}/open?format=html">Chat</button>
    <div id="chatbot-window" style="display:{panel}">
        <div class="chatbot-header">
            <span>Datafish</span>
            <button id="chatbot-close" type="button"
                hx-post="/api/widgets/{id}/close?format=html">&times;</button>
        </div>
        <div id="chatbot-messages">{messages}</div>
        <form id="chatbot-form" hx-post="/api/widgets/{id}/turns?format=html" hx-ext="json-enc">
            <input id="chatbot-input" name="text" type="text" autocomplete="off"{disabled}>
            <button type="submit"{disabled}>Envoyer</button>
        </form>
    </div>
</div>"##,
        trigger = display(widget.trigger_visible()),
        panel = display(widget.is_open()),
    )
}
