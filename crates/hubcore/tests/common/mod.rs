//! Shared fixtures: an in-memory hub, two players and a group chat.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use hubcore::core::config::xp;
use hubcore::testing::{memory_hub, test_config, RecordingTransport, Sent};
use hubcore::{Actor, ChatRef, Hub, HubConfig, IncomingMessage, MessageRef, SqliteStore, UserStore};

pub const GROUP: i64 = -100;

pub struct Fixture {
    pub hub: Arc<Hub>,
    pub transport: Arc<RecordingTransport>,
    pub store: Arc<SqliteStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: HubConfig) -> Self {
        let (hub, transport, store) = memory_hub(config).expect("in-memory hub");
        Self { hub, transport, store }
    }

    pub async fn press(&self, chat: ChatRef, user: &Actor, anchor: Option<MessageRef>, data: &str) {
        self.hub.handle_callback(chat, user.clone(), anchor, data).await;
    }

    pub async fn say(&self, chat: ChatRef, user: &Actor, text: &str) {
        self.hub
            .handle_message(chat, user.clone(), IncomingMessage::text(0, text))
            .await;
    }

    pub fn last(&self) -> Sent {
        self.transport.last().expect("something was sent")
    }

    pub fn last_text(&self) -> String {
        self.last().text().unwrap_or_default().to_string()
    }

    /// Callback data of the first button of the last message whose label contains `label`.
    pub fn button(&self, label: &str) -> String {
        let sent = self.last();
        let keyboard = sent.keyboard().expect("last message has a keyboard");
        let button = keyboard.find(label).unwrap_or_else(|| panic!("no {label:?} button in {keyboard:?}"));
        button.data().expect("callback button").to_string()
    }

    pub fn xp(&self, user_id: i64, title: &str) -> i64 {
        self.store
            .user_xp(user_id)
            .unwrap()
            .into_iter()
            .find(|row| row.title == title)
            .map(|row| row.xp)
            .unwrap_or(0)
    }

    pub fn games_xp(&self, user_id: i64) -> i64 {
        self.xp(user_id, xp::GAMES_TITLE)
    }
}

pub fn ann() -> Actor {
    Actor::new(1, "Ann")
}

pub fn bob() -> Actor {
    Actor::new(2, "Bob")
}

pub fn group() -> ChatRef {
    ChatRef::public(GROUP)
}

pub fn dm(user: &Actor) -> ChatRef {
    ChatRef::private(user.id)
}
