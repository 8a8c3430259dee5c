//! Server-rendered widget markup.
//!
//! The browser surface is plain HTML plus HTMX: the composer, reset, demo
//! and quick-prompt controls post to the widget routes and swap the
//! returned fragments into the message list. All message content is
//! escaped before interpolation.

use crate::config::ChatConfig;
use crate::transcript::{Role, Turn};

/// Render a single message bubble.
#[must_use]
pub fn message_bubble(role: Role, content: &str) -> String {
    format!(
        r#"<div class="message message--{role}">{content}</div>"#,
        role = role.as_str(),
        content = html_escape::encode_text(content),
    )
}

/// Render the greeting followed by every transcript turn.
///
/// Used by the demo poller: the displayed list is always the greeting plus
/// the transcript, since the replay starts with a reset.
#[must_use]
pub fn messages_fragment(greeting: &str, turns: &[Turn]) -> String {
    let mut out = message_bubble(Role::Assistant, greeting);
    for turn in turns {
        out.push_str(&message_bubble(turn.role, &turn.content));
    }
    out
}

/// Message list container.
///
/// When `polling` is set (during a demo replay) the container refreshes
/// itself from `/widget/messages` until the server answers 286.
fn messages_container(inner: &str, polling: bool) -> String {
    let poll_attrs = if polling {
        r#" hx-get="/widget/messages" hx-trigger="load delay:250ms, every 500ms" hx-swap="innerHTML""#
    } else {
        ""
    };
    format!(
        r#"<div id="messages" class="messages" hx-on--after-swap="this.scrollTop = this.scrollHeight"{poll_attrs}>{inner}</div>"#
    )
}

/// Container rendered in response to a demo start.
#[must_use]
pub fn demo_started_fragment(greeting: &str) -> String {
    messages_container(&message_bubble(Role::Assistant, greeting), true)
}

/// Full widget page.
#[must_use]
pub fn widget_page(chat: &ChatConfig, greeting: &str) -> String {
    let messages = messages_container(&message_bubble(Role::Assistant, greeting), false);

    let quick_prompts: String = chat
        .quick_prompts
        .iter()
        .map(|prompt| {
            let vals = serde_json::json!({ "message": prompt }).to_string();
            format!(
                r##"<button type="button" class="prompt" hx-post="/widget/send" hx-vals="{vals}" hx-target="#messages" hx-swap="beforeend">{label}</button>"##,
                vals = html_escape::encode_double_quoted_attribute(&vals),
                label = html_escape::encode_text(prompt),
            )
        })
        .collect();

    let content = format!(
        r##"
    <div class="chat-shell">
        <header class="chat-header">
            <h1>{assistant_name}</h1>
            <div class="chat-actions">
                <button id="demo" hx-post="/widget/demo" hx-target="#messages" hx-swap="outerHTML" hx-disabled-elt="this">Run demo scenario</button>
                <button id="reset" hx-post="/widget/reset" hx-target="#messages" hx-swap="innerHTML">Reset</button>
            </div>
        </header>

        {messages}

        <div class="prompts">{quick_prompts}</div>

        <form id="composer" class="composer"
              hx-post="/widget/send"
              hx-target="#messages"
              hx-swap="beforeend"
              hx-on--after-request="this.reset()">
            <input type="text" name="message" placeholder="Type your message..." autocomplete="off" required>
            <button type="submit">Send</button>
        </form>
    </div>
    "##,
        assistant_name = html_escape::encode_text(&chat.assistant_name),
    );

    html_shell(&chat.assistant_name, &content)
}

/// Generate the HTML shell for the widget page.
fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Customer support chat widget">
    <title>{title} - Support Chat</title>

    <script src="https://unpkg.com/htmx.org@2.0.8"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <main class="container">
        {content}
    </main>
</body>
</html>"#,
        title = html_escape::encode_text(title),
    )
}
