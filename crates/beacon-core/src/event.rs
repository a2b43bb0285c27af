//! Typed events produced by the update router.
//!
//! [`EventKind`] enumerates every logical event the router can emit — the
//! wire contract between the router and the plugins — and [`Event`] is the
//! tagged union carrying each kind's payload. Listener signatures are
//! statically known: a listener matches on the variant it subscribed to and
//! gets typed fields, not a variadic argument list.
//!
//! Kinds split into three groups:
//!
//! - `UpdateReceived`: the catch-all, fired once for every update.
//! - Primary kinds (one per top-level envelope field): mutually exclusive,
//!   exactly one fires per update.
//! - Secondary kinds: fired only alongside `MessageReceived`, one per
//!   matching message attribute, non-exclusively.

use std::fmt;
use std::sync::Arc;

use crate::update::{
    CallbackQuery, ChatMemberUpdated, ChosenInlineResult, InlineQuery, Message, Poll, PollAnswer,
    Update,
};

/// Every event name the router can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Generic catch-all, fired for every update regardless of category.
    UpdateReceived,

    // ── Primary categories (exactly one per update) ──────────────────────────
    MessageReceived,
    EditedMessageReceived,
    ChannelPostReceived,
    EditedChannelPostReceived,
    CallbackQueryReceived,
    InlineQueryReceived,
    ChosenInlineResultReceived,
    MyChatMemberChanged,
    ChatMemberChanged,
    PollReceived,
    PollAnswerReceived,

    // ── Secondary kinds (message category only, non-exclusive) ───────────────
    TextReceived,
    CommandReceived,
    PhotoReceived,
    VideoReceived,
    DocumentReceived,
    AudioReceived,
    VoiceReceived,
    StickerReceived,
    LocationReceived,
    PollInMessageReceived,
    NewChatMembersReceived,
    LeftChatMemberReceived,
}

impl EventKind {
    /// The stable wire name of this event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateReceived => "updateReceived",
            Self::MessageReceived => "messageReceived",
            Self::EditedMessageReceived => "editedMessageReceived",
            Self::ChannelPostReceived => "channelPostReceived",
            Self::EditedChannelPostReceived => "editedChannelPostReceived",
            Self::CallbackQueryReceived => "callbackQueryReceived",
            Self::InlineQueryReceived => "inlineQueryReceived",
            Self::ChosenInlineResultReceived => "chosenInlineResultReceived",
            Self::MyChatMemberChanged => "myChatMemberChanged",
            Self::ChatMemberChanged => "chatMemberChanged",
            Self::PollReceived => "pollReceived",
            Self::PollAnswerReceived => "pollAnswerReceived",
            Self::TextReceived => "textReceived",
            Self::CommandReceived => "commandReceived",
            Self::PhotoReceived => "photoReceived",
            Self::VideoReceived => "videoReceived",
            Self::DocumentReceived => "documentReceived",
            Self::AudioReceived => "audioReceived",
            Self::VoiceReceived => "voiceReceived",
            Self::StickerReceived => "stickerReceived",
            Self::LocationReceived => "locationReceived",
            Self::PollInMessageReceived => "pollInMessageReceived",
            Self::NewChatMembersReceived => "newChatMembersReceived",
            Self::LeftChatMemberReceived => "leftChatMemberReceived",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed bot command from a message's leading `/token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The command name, lowercased, without the leading slash or a
    /// trailing `@botname` suffix.
    pub name: String,
    /// Everything after the command token, trimmed; `None` when absent.
    pub args: Option<String>,
}

impl Command {
    /// Parses `text` as a command. Returns `None` unless the text starts
    /// with the command prefix.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let (token, tail) = match rest.split_once(char::is_whitespace) {
            Some((token, tail)) => (token, tail.trim()),
            None => (rest, ""),
        };
        if token.is_empty() {
            return None;
        }
        let name = match token.split_once('@') {
            Some((name, _bot)) => name,
            None => token,
        };
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_lowercase(),
            args: (!tail.is_empty()).then(|| tail.to_string()),
        })
    }
}

/// A dispatched event with its typed payload.
///
/// Payload fields are `Arc`-shared with the envelope, so cloning an event to
/// hand it to each listener is cheap. All events of one routing pass share
/// the same `Arc<Update>`.
#[derive(Debug, Clone)]
pub enum Event {
    UpdateReceived {
        update: Arc<Update>,
    },
    MessageReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    EditedMessageReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    ChannelPostReceived {
        post: Arc<Message>,
        update: Arc<Update>,
    },
    EditedChannelPostReceived {
        post: Arc<Message>,
        update: Arc<Update>,
    },
    CallbackQueryReceived {
        query: Arc<CallbackQuery>,
        update: Arc<Update>,
    },
    InlineQueryReceived {
        query: Arc<InlineQuery>,
        update: Arc<Update>,
    },
    ChosenInlineResultReceived {
        result: Arc<ChosenInlineResult>,
        update: Arc<Update>,
    },
    MyChatMemberChanged {
        member: Arc<ChatMemberUpdated>,
        update: Arc<Update>,
    },
    ChatMemberChanged {
        member: Arc<ChatMemberUpdated>,
        update: Arc<Update>,
    },
    PollReceived {
        poll: Arc<Poll>,
        update: Arc<Update>,
    },
    PollAnswerReceived {
        answer: Arc<PollAnswer>,
        update: Arc<Update>,
    },
    TextReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    CommandReceived {
        command: Command,
        message: Arc<Message>,
        update: Arc<Update>,
    },
    PhotoReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    VideoReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    DocumentReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    AudioReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    VoiceReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    StickerReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    LocationReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    PollInMessageReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    NewChatMembersReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
    LeftChatMemberReceived {
        message: Arc<Message>,
        update: Arc<Update>,
    },
}

impl Event {
    /// The kind tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UpdateReceived { .. } => EventKind::UpdateReceived,
            Self::MessageReceived { .. } => EventKind::MessageReceived,
            Self::EditedMessageReceived { .. } => EventKind::EditedMessageReceived,
            Self::ChannelPostReceived { .. } => EventKind::ChannelPostReceived,
            Self::EditedChannelPostReceived { .. } => EventKind::EditedChannelPostReceived,
            Self::CallbackQueryReceived { .. } => EventKind::CallbackQueryReceived,
            Self::InlineQueryReceived { .. } => EventKind::InlineQueryReceived,
            Self::ChosenInlineResultReceived { .. } => EventKind::ChosenInlineResultReceived,
            Self::MyChatMemberChanged { .. } => EventKind::MyChatMemberChanged,
            Self::ChatMemberChanged { .. } => EventKind::ChatMemberChanged,
            Self::PollReceived { .. } => EventKind::PollReceived,
            Self::PollAnswerReceived { .. } => EventKind::PollAnswerReceived,
            Self::TextReceived { .. } => EventKind::TextReceived,
            Self::CommandReceived { .. } => EventKind::CommandReceived,
            Self::PhotoReceived { .. } => EventKind::PhotoReceived,
            Self::VideoReceived { .. } => EventKind::VideoReceived,
            Self::DocumentReceived { .. } => EventKind::DocumentReceived,
            Self::AudioReceived { .. } => EventKind::AudioReceived,
            Self::VoiceReceived { .. } => EventKind::VoiceReceived,
            Self::StickerReceived { .. } => EventKind::StickerReceived,
            Self::LocationReceived { .. } => EventKind::LocationReceived,
            Self::PollInMessageReceived { .. } => EventKind::PollInMessageReceived,
            Self::NewChatMembersReceived { .. } => EventKind::NewChatMembersReceived,
            Self::LeftChatMemberReceived { .. } => EventKind::LeftChatMemberReceived,
        }
    }

    /// The envelope every event variant carries.
    pub fn update(&self) -> &Arc<Update> {
        match self {
            Self::UpdateReceived { update }
            | Self::MessageReceived { update, .. }
            | Self::EditedMessageReceived { update, .. }
            | Self::ChannelPostReceived { update, .. }
            | Self::EditedChannelPostReceived { update, .. }
            | Self::CallbackQueryReceived { update, .. }
            | Self::InlineQueryReceived { update, .. }
            | Self::ChosenInlineResultReceived { update, .. }
            | Self::MyChatMemberChanged { update, .. }
            | Self::ChatMemberChanged { update, .. }
            | Self::PollReceived { update, .. }
            | Self::PollAnswerReceived { update, .. }
            | Self::TextReceived { update, .. }
            | Self::CommandReceived { update, .. }
            | Self::PhotoReceived { update, .. }
            | Self::VideoReceived { update, .. }
            | Self::DocumentReceived { update, .. }
            | Self::AudioReceived { update, .. }
            | Self::VoiceReceived { update, .. }
            | Self::StickerReceived { update, .. }
            | Self::LocationReceived { update, .. }
            | Self::PollInMessageReceived { update, .. }
            | Self::NewChatMembersReceived { update, .. }
            | Self::LeftChatMemberReceived { update, .. } => update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parse_basic() {
        let cmd = Command::parse("/start").unwrap();
        assert_eq!(cmd.name, "start");
        assert_eq!(cmd.args, None);
    }

    #[test]
    fn command_parse_strips_bot_suffix_and_keeps_args() {
        let cmd = Command::parse("/Schedule@channel_bot tomorrow 09:00").unwrap();
        assert_eq!(cmd.name, "schedule");
        assert_eq!(cmd.args.as_deref(), Some("tomorrow 09:00"));
    }

    #[test]
    fn command_parse_rejects_plain_text() {
        assert!(Command::parse("start").is_none());
        assert!(Command::parse("/").is_none());
        assert!(Command::parse("/ args").is_none());
        assert!(Command::parse("/@bot").is_none());
    }

    #[test]
    fn kind_wire_names_are_stable() {
        assert_eq!(EventKind::UpdateReceived.as_str(), "updateReceived");
        assert_eq!(EventKind::CommandReceived.as_str(), "commandReceived");
        assert_eq!(EventKind::MyChatMemberChanged.to_string(), "myChatMemberChanged");
    }
}
