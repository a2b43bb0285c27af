//! Classification of inbound updates into typed events.
//!
//! One routing pass per update, in three strictly ordered stages:
//!
//! 1. The catch-all `updateReceived` event, fired unconditionally.
//! 2. **Primary** classification: the envelope's payload fields are probed
//!    in a fixed order and the first present field wins, so exactly one
//!    primary event fires even for malformed envelopes carrying several
//!    payloads. An envelope with no recognized payload fires only the
//!    catch-all.
//! 3. **Secondary** classification, message category only: every matching
//!    attribute rule fires its own event, in fixed rule order. A message
//!    whose text parses as a command fires both `textReceived` and
//!    `commandReceived`.
//!
//! Events of one pass share the same `Arc<Update>`, and every secondary
//! event shares the primary event's `Arc<Message>`. Dispatch is sequential:
//! a listener sees all events of a pass in classification order.

use std::sync::Arc;

use tracing::debug;

use beacon_core::{Command, Container, Event, Message, Update};

use crate::registry::PluginRegistry;

/// Routes updates through classification and the registry's event bus.
pub struct UpdateRouter {
    registry: Arc<PluginRegistry>,
    container: Arc<Container>,
}

impl UpdateRouter {
    /// Creates a router over a booted registry.
    pub fn new(registry: Arc<PluginRegistry>, container: Arc<Container>) -> Self {
        Self { registry, container }
    }

    /// The shared container this router dispatches with.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Classifies one update and dispatches every resulting event in order.
    pub async fn route(&self, update: Update) {
        let update = Arc::new(update);
        let events = classify(&update);
        debug!(
            update_id = update.update_id,
            events = events.len(),
            "routing update"
        );
        for event in &events {
            self.registry.dispatch(event, &self.container).await;
        }
    }
}

/// Produces the full, ordered event list for one envelope.
pub fn classify(update: &Arc<Update>) -> Vec<Event> {
    let mut events = vec![Event::UpdateReceived {
        update: Arc::clone(update),
    }];

    if let Some(primary) = classify_primary(update) {
        if let Event::MessageReceived { message, .. } = &primary {
            let message = Arc::clone(message);
            events.push(primary);
            classify_secondary(&message, update, &mut events);
        } else {
            events.push(primary);
        }
    }

    events
}

/// First-match probe over the envelope's payload fields.
fn classify_primary(update: &Arc<Update>) -> Option<Event> {
    let up = || Arc::clone(update);

    if let Some(message) = &update.message {
        return Some(Event::MessageReceived {
            message: Arc::new(message.clone()),
            update: up(),
        });
    }
    if let Some(message) = &update.edited_message {
        return Some(Event::EditedMessageReceived {
            message: Arc::new(message.clone()),
            update: up(),
        });
    }
    if let Some(post) = &update.channel_post {
        return Some(Event::ChannelPostReceived {
            post: Arc::new(post.clone()),
            update: up(),
        });
    }
    if let Some(post) = &update.edited_channel_post {
        return Some(Event::EditedChannelPostReceived {
            post: Arc::new(post.clone()),
            update: up(),
        });
    }
    if let Some(query) = &update.callback_query {
        return Some(Event::CallbackQueryReceived {
            query: Arc::new(query.clone()),
            update: up(),
        });
    }
    if let Some(query) = &update.inline_query {
        return Some(Event::InlineQueryReceived {
            query: Arc::new(query.clone()),
            update: up(),
        });
    }
    if let Some(result) = &update.chosen_inline_result {
        return Some(Event::ChosenInlineResultReceived {
            result: Arc::new(result.clone()),
            update: up(),
        });
    }
    if let Some(member) = &update.my_chat_member {
        return Some(Event::MyChatMemberChanged {
            member: Arc::new(member.clone()),
            update: up(),
        });
    }
    if let Some(member) = &update.chat_member {
        return Some(Event::ChatMemberChanged {
            member: Arc::new(member.clone()),
            update: up(),
        });
    }
    if let Some(poll) = &update.poll {
        return Some(Event::PollReceived {
            poll: Arc::new(poll.clone()),
            update: up(),
        });
    }
    if let Some(answer) = &update.poll_answer {
        return Some(Event::PollAnswerReceived {
            answer: Arc::new(answer.clone()),
            update: up(),
        });
    }

    None
}

/// Appends one event per matching message attribute, in fixed rule order.
///
/// Only `text` drives the text and command rules; a caption never does.
fn classify_secondary(message: &Arc<Message>, update: &Arc<Update>, events: &mut Vec<Event>) {
    let msg = || Arc::clone(message);
    let up = || Arc::clone(update);

    if let Some(text) = &message.text {
        events.push(Event::TextReceived {
            message: msg(),
            update: up(),
        });
        if let Some(command) = Command::parse(text) {
            events.push(Event::CommandReceived {
                command,
                message: msg(),
                update: up(),
            });
        }
    }
    if message.photo.is_some() {
        events.push(Event::PhotoReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.video.is_some() {
        events.push(Event::VideoReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.document.is_some() {
        events.push(Event::DocumentReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.audio.is_some() {
        events.push(Event::AudioReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.voice.is_some() {
        events.push(Event::VoiceReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.sticker.is_some() {
        events.push(Event::StickerReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.location.is_some() {
        events.push(Event::LocationReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.poll.is_some() {
        events.push(Event::PollInMessageReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.new_chat_members.is_some() {
        events.push(Event::NewChatMembersReceived {
            message: msg(),
            update: up(),
        });
    }
    if message.left_chat_member.is_some() {
        events.push(Event::LeftChatMemberReceived {
            message: msg(),
            update: up(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use beacon_core::EventKind;
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::plugin::Plugin;

    fn parse(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    fn kinds(update: Update) -> Vec<EventKind> {
        let update = Arc::new(update);
        classify(&update).iter().map(Event::kind).collect()
    }

    #[test]
    fn command_text_fires_exact_event_sequence() {
        let update = parse(json!({
            "update_id": 1,
            "message": {
                "message_id": 5,
                "chat": { "id": 9, "type": "private" },
                "text": "/start"
            }
        }));

        assert_eq!(
            kinds(update),
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::TextReceived,
                EventKind::CommandReceived,
            ]
        );
    }

    #[test]
    fn plain_text_does_not_fire_command() {
        let update = parse(json!({
            "update_id": 2,
            "message": {
                "message_id": 6,
                "chat": { "id": 9, "type": "private" },
                "text": "hello there"
            }
        }));

        assert_eq!(
            kinds(update),
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::TextReceived,
            ]
        );
    }

    #[test]
    fn captioned_photo_never_fires_text_events() {
        let update = parse(json!({
            "update_id": 3,
            "message": {
                "message_id": 7,
                "chat": { "id": 9, "type": "private" },
                "caption": "/looks_like_a_command",
                "photo": [{ "file_id": "p1", "width": 90, "height": 90 }]
            }
        }));

        assert_eq!(
            kinds(update),
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::PhotoReceived,
            ]
        );
    }

    #[test]
    fn non_message_payload_fires_primary_only() {
        let update = parse(json!({
            "update_id": 4,
            "callback_query": {
                "id": "cbq",
                "from": { "id": 1, "first_name": "Ada" },
                "data": "vote:1"
            }
        }));

        assert_eq!(
            kinds(update),
            vec![EventKind::UpdateReceived, EventKind::CallbackQueryReceived]
        );
    }

    #[test]
    fn unrecognized_envelope_fires_catch_all_only() {
        let update = parse(json!({ "update_id": 5 }));
        assert_eq!(kinds(update), vec![EventKind::UpdateReceived]);
    }

    #[test]
    fn multiple_payloads_resolve_first_match() {
        // Malformed envelope carrying two payloads: the probe order decides.
        let update = parse(json!({
            "update_id": 6,
            "message": {
                "message_id": 8,
                "chat": { "id": 9, "type": "group" },
                "text": "hi"
            },
            "poll": { "id": "p", "question": "?" }
        }));

        let kinds = kinds(update);
        assert!(kinds.contains(&EventKind::MessageReceived));
        assert!(!kinds.contains(&EventKind::PollReceived));
    }

    #[test]
    fn secondary_events_share_the_primary_message() {
        let update = Arc::new(parse(json!({
            "update_id": 7,
            "message": {
                "message_id": 10,
                "chat": { "id": 9, "type": "private" },
                "text": "hi",
                "location": { "latitude": 1.0, "longitude": 2.0 }
            }
        })));

        let events = classify(&update);
        let primary = match &events[1] {
            Event::MessageReceived { message, .. } => Arc::clone(message),
            other => panic!("unexpected event: {other:?}"),
        };
        for event in &events[2..] {
            match event {
                Event::TextReceived { message, .. }
                | Event::LocationReceived { message, .. } => {
                    assert!(Arc::ptr_eq(message, &primary));
                }
                other => panic!("unexpected event: {other:?}"),
            }
            assert!(Arc::ptr_eq(event.update(), &update));
        }
    }

    struct RecorderPlugin {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Plugin for RecorderPlugin {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn subscriptions(&self) -> Vec<EventKind> {
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::TextReceived,
                EventKind::CommandReceived,
                EventKind::PhotoReceived,
            ]
        }

        async fn on_event(&self, event: Event, _container: Arc<Container>) -> anyhow::Result<()> {
            self.seen.lock().push(event.kind());
            Ok(())
        }
    }

    #[tokio::test]
    async fn route_dispatches_in_classification_order() {
        let mut container = Container::new();
        let mut registry = PluginRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        registry.register(
            RecorderPlugin {
                seen: Arc::clone(&seen),
            },
            &mut container,
        );

        let container = Arc::new(container);
        registry.boot(&container).await.unwrap();
        let router = UpdateRouter::new(Arc::new(registry), container);

        router
            .route(parse(json!({
                "update_id": 8,
                "message": {
                    "message_id": 11,
                    "chat": { "id": 9, "type": "private" },
                    "text": "/help now"
                }
            })))
            .await;

        assert_eq!(
            *seen.lock(),
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::TextReceived,
                EventKind::CommandReceived,
            ]
        );
    }
}
