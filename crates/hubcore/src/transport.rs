//! Chat-platform seam.
//!
//! The core renders text plus an optional [`Keyboard`] and hands it to a
//! [`Transport`]. The Telegram implementation lives in the bot crate; tests
//! use [`crate::testing::RecordingTransport`].

use async_trait::async_trait;

use crate::core::error::HubResult;
use crate::router::keyboard::Keyboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRef {
    pub id: i64,
    pub kind: ChatKind,
}

impl ChatRef {
    pub fn private(id: i64) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
        }
    }

    pub fn public(id: i64) -> Self {
        Self {
            id,
            kind: ChatKind::Public,
        }
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

/// Address of a sent message, used to edit or delete it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

impl MessageRef {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self { chat_id, message_id }
    }
}

/// The user behind an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl Actor {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            username: None,
        }
    }

    /// Display name for game boards and leaderboards, HTML-escaped.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", escape_html(username)),
            None => escape_html(&self.first_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef {
    pub file_id: String,
    pub unique_id: String,
}

/// An inbound text or photo message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    pub message_id: i32,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Largest available size
    pub photo: Option<PhotoRef>,
}

impl IncomingMessage {
    pub fn text(message_id: i32, text: impl Into<String>) -> Self {
        Self {
            message_id,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Text, or the caption of a media message.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

/// Inline query answer that posts `text` into the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub text: String,
}

/// Everything the core asks of the chat platform.
///
/// Texts are HTML. Implementations never retry; a failed call is returned
/// to the caller, which logs it and abandons the step.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_new(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> HubResult<MessageRef>;

    async fn send_edit(&self, anchor: MessageRef, text: &str, keyboard: Option<&Keyboard>) -> HubResult<()>;

    async fn delete(&self, anchor: MessageRef) -> HubResult<()>;

    async fn send_photo(&self, chat_id: i64, file_id: &str, caption: Option<&str>) -> HubResult<MessageRef>;

    async fn answer_inline(&self, query_id: &str, articles: &[InlineArticle]) -> HubResult<()>;

    /// Deep link opening a private chat with the bot, passing `start` to `/start`.
    fn private_link(&self, start: &str) -> String;
}

/// Escapes text for HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_display_name_prefers_username() {
        let mut actor = Actor::new(1, "Ann <3");
        assert_eq!(actor.display_name(), "Ann &lt;3");
        actor.username = Some("ann".into());
        assert_eq!(actor.display_name(), "@ann");
    }

    #[test]
    fn test_body_falls_back_to_caption() {
        let msg = IncomingMessage {
            caption: Some("cat".into()),
            ..IncomingMessage::default()
        };
        assert_eq!(msg.body(), Some("cat"));
        assert_eq!(IncomingMessage::text(1, "hi").body(), Some("hi"));
    }
}
