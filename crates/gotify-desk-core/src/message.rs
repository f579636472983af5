use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MESSAGE_CAPACITY: usize = 50;
pub const HIGH_PRIORITY_THRESHOLD: u32 = 5;
pub const EMPTY_FEED_PLACEHOLDER: &str = "No messages yet";
const UNTITLED_MESSAGE: &str = "Notification";

/// A message as forwarded by the host from the Gotify stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GotifyMessage {
    pub id: u64,
    pub appid: u64,
    pub message: String,
    pub title: String,
    pub priority: u32,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageCard {
    pub id: Option<u64>,
    pub title: String,
    pub body: String,
    pub date: String,
    pub high_priority: bool,
}

impl MessageCard {
    /// Builds a card from an event payload. Payloads that are not message
    /// objects are still shown, using their text or JSON form as the body.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        if payload.is_object() {
            if let Ok(message) = serde_json::from_value::<GotifyMessage>(payload.clone()) {
                return Self::from(message);
            }
        }
        let body = match payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            id: None,
            title: UNTITLED_MESSAGE.to_string(),
            body,
            date: String::new(),
            high_priority: false,
        }
    }
}

impl From<GotifyMessage> for MessageCard {
    fn from(message: GotifyMessage) -> Self {
        let title = if message.title.trim().is_empty() {
            UNTITLED_MESSAGE.to_string()
        } else {
            message.title
        };
        Self {
            id: Some(message.id),
            title,
            body: message.message,
            date: message.date,
            high_priority: message.priority >= HIGH_PRIORITY_THRESHOLD,
        }
    }
}

/// Received messages, newest first.
#[derive(Debug, Clone)]
pub struct MessageFeed {
    cards: VecDeque<MessageCard>,
    capacity: usize,
}

impl Default for MessageFeed {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_CAPACITY)
    }
}

impl MessageFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cards: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push_payload(&mut self, payload: &Value) -> &MessageCard {
        self.push(MessageCard::from_payload(payload))
    }

    pub fn push(&mut self, card: MessageCard) -> &MessageCard {
        self.cards.truncate(self.capacity - 1);
        self.cards.push_front(card);
        &self.cards[0]
    }

    pub fn cards(&self) -> impl Iterator<Item = &MessageCard> {
        self.cards.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
