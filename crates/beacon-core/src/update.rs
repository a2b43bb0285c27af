//! The inbound update envelope.
//!
//! One webhook call carries exactly one [`Update`]: a union-shaped record in
//! which exactly one of the top-level payload fields is present. The router
//! classifies the envelope by inspecting which field that is; the envelope
//! itself is read-only and never mutated.
//!
//! Deserialization is deliberately lenient: every payload struct ignores
//! unknown fields and models only what the core and the built-in plugins
//! consume. Anything else rides along in the raw JSON the webhook received.

use serde::{Deserialize, Serialize};

/// One external update, as delivered by the messaging platform webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic identifier assigned by the platform.
    #[serde(default)]
    pub update_id: i64,

    // Exactly one of the following is present per update.
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub channel_post: Option<Message>,
    pub edited_channel_post: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
    pub inline_query: Option<InlineQuery>,
    pub chosen_inline_result: Option<ChosenInlineResult>,
    pub my_chat_member: Option<ChatMemberUpdated>,
    pub chat_member: Option<ChatMemberUpdated>,
    pub poll: Option<Poll>,
    pub poll_answer: Option<PollAnswer>,
}

impl Update {
    /// The user who originated this update, if any payload carries one.
    pub fn user(&self) -> Option<&User> {
        if let Some(message) = &self.message {
            return message.from.as_ref();
        }
        if let Some(query) = &self.callback_query {
            return Some(&query.from);
        }
        if let Some(query) = &self.inline_query {
            return Some(&query.from);
        }
        if let Some(member) = &self.my_chat_member {
            return Some(&member.from);
        }
        None
    }

    /// The chat this update concerns, if any payload carries one.
    pub fn chat(&self) -> Option<&Chat> {
        if let Some(message) = &self.message {
            return Some(&message.chat);
        }
        if let Some(query) = &self.callback_query {
            return query.message.as_ref().map(|m| &m.chat);
        }
        if let Some(member) = &self.my_chat_member {
            return Some(&member.chat);
        }
        if let Some(post) = &self.channel_post {
            return Some(&post.chat);
        }
        None
    }
}

/// A message in a private chat, group, or channel.
///
/// The attachment fields drive the router's secondary classification: every
/// present attachment fires its own event alongside the generic message
/// event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    pub from: Option<User>,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,

    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub video: Option<Video>,
    pub document: Option<Document>,
    pub audio: Option<Audio>,
    pub voice: Option<Voice>,
    pub sticker: Option<Sticker>,
    pub location: Option<Location>,
    pub poll: Option<Poll>,
    pub new_chat_members: Option<Vec<User>>,
    pub left_chat_member: Option<User>,
}

/// A platform user or bot account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// A conversation: private chat, group, supergroup, or channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// One of `private`, `group`, `supergroup`, `channel`.
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl Chat {
    /// Returns `true` for one-on-one chats with the bot.
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }

    /// Returns `true` for channels and supergroups the bot can manage.
    pub fn is_broadcast(&self) -> bool {
        self.kind == "channel" || self.kind == "supergroup"
    }
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// An inline query typed into another chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub offset: String,
}

/// An inline result the user picked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    #[serde(default)]
    pub result_id: String,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub query: String,
}

/// A change to a member's status in a chat (including the bot's own).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub old_chat_member: ChatMember,
    #[serde(default)]
    pub new_chat_member: ChatMember,
}

/// A member's standing within a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMember {
    /// One of `creator`, `administrator`, `member`, `restricted`, `left`, `kicked`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user: User,
}

impl ChatMember {
    /// Returns `true` when the member can manage the chat.
    pub fn is_admin(&self) -> bool {
        self.status == "administrator" || self.status == "creator"
    }

    /// Returns `true` when the member is no longer in the chat.
    pub fn is_gone(&self) -> bool {
        self.status == "left" || self.status == "kicked"
    }
}

/// A native poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Poll {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub total_voter_count: i64,
    #[serde(default)]
    pub is_closed: bool,
}

/// A user's answer in a non-anonymous poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollAnswer {
    #[serde(default)]
    pub poll_id: String,
    pub user: Option<User>,
    #[serde(default)]
    pub option_ids: Vec<i64>,
}

/// One size variant of a photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoSize {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}

/// A video attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub duration: i64,
}

/// A generic file attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

/// An audio-track attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Audio {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub duration: i64,
}

/// A voice-note attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voice {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub duration: i64,
}

/// A sticker attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sticker {
    #[serde(default)]
    pub file_id: String,
    pub emoji: Option<String>,
}

/// A shared location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_parse_ignores_unknown_fields() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "chat": { "id": 42, "type": "private", "unknown": true },
                "text": "hi",
                "entities": [{ "type": "bold", "offset": 0, "length": 2 }]
            }
        }))
        .unwrap();

        let message = update.message.as_ref().unwrap();
        assert_eq!(message.text.as_deref(), Some("hi"));
        assert!(message.chat.is_private());
        assert_eq!(update.chat().map(|c| c.id), Some(42));
    }

    #[test]
    fn user_helper_walks_payload_kinds() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 11,
            "callback_query": {
                "id": "cbq",
                "from": { "id": 7, "first_name": "Ada" },
                "data": "open:dashboard"
            }
        }))
        .unwrap();

        assert_eq!(update.user().map(|u| u.id), Some(7));
        assert!(update.chat().is_none());
    }
}
