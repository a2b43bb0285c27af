//! The core command surface and channel membership bookkeeping.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use beacon_core::{
    ChatMemberUpdated, Command, Container, Event, EventKind, Message, MessagingApi, Storage,
};

use crate::plugin::Plugin;

/// Storage namespace holding one document per managed channel.
const CHANNELS_NS: &str = "channels";

/// Baseline bot behavior: `/start` and `/help` in private chats, plus
/// bookkeeping when the bot is promoted in or removed from a channel.
///
/// Channel documents live under the `channels` namespace, keyed by chat id:
/// title, kind, the promoting user as owner, and an `active` flag that
/// removal flips instead of deleting the record.
#[derive(Debug, Default)]
pub struct CorePlugin;

#[async_trait]
impl Plugin for CorePlugin {
    fn name(&self) -> &'static str {
        "core"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![EventKind::CommandReceived, EventKind::MyChatMemberChanged]
    }

    async fn on_event(&self, event: Event, container: Arc<Container>) -> anyhow::Result<()> {
        match event {
            Event::CommandReceived {
                command, message, ..
            } => self.handle_command(&command, &message, &container).await,
            Event::MyChatMemberChanged { member, .. } => {
                self.handle_membership(&member, &container).await
            }
            _ => Ok(()),
        }
    }
}

impl CorePlugin {
    async fn handle_command(
        &self,
        command: &Command,
        message: &Message,
        container: &Container,
    ) -> anyhow::Result<()> {
        // Commands are only served one-on-one.
        if !message.chat.is_private() {
            return Ok(());
        }
        let api = container.resolve::<dyn MessagingApi>()?;
        let chat_id = message.chat.id;

        match command.name.as_str() {
            "start" => {
                let user_id = message.from.as_ref().map(|u| u.id).unwrap_or_default();
                let storage = container.resolve::<dyn Storage>()?;
                let owned = storage
                    .get(CHANNELS_NS, &format!("owner:{user_id}"))
                    .await?
                    .and_then(|v| v.as_array().map(Vec::len))
                    .unwrap_or(0);

                let text = if owned == 0 {
                    "<b>Welcome!</b>\n\n\
                     Add this bot as administrator to your channel to get started. \
                     You will automatically become the owner."
                        .to_string()
                } else {
                    format!(
                        "<b>Welcome back!</b>\n\nYou manage <b>{owned}</b> channel{}.",
                        if owned == 1 { "" } else { "s" }
                    )
                };
                api.send_message(chat_id, &text).await?;
            }
            "help" => {
                api.send_message(
                    chat_id,
                    "<b>Help</b>\n\n\
                     1. Add this bot as administrator to your channel\n\
                     2. You automatically become the owner\n\
                     3. Use /start to see your channels\n\n\
                     <b>Commands:</b>\n\
                     /start - Show your channels\n\
                     /help - Show this help",
                )
                .await?;
            }
            other => {
                warn!(command = other, chat = chat_id, "unknown command");
                api.send_message(chat_id, "Unknown command. Use /start to begin.")
                    .await?;
            }
        }
        Ok(())
    }

    async fn handle_membership(
        &self,
        member: &ChatMemberUpdated,
        container: &Container,
    ) -> anyhow::Result<()> {
        // Only broadcast chats are tracked.
        if !member.chat.is_broadcast() {
            return Ok(());
        }
        let storage = container.resolve::<dyn Storage>()?;
        let api = container.resolve::<dyn MessagingApi>()?;

        let chat_id = member.chat.id;
        let user_id = member.from.id;
        let title = member.chat.title.clone().unwrap_or_default();
        let status = &member.new_chat_member.status;

        if member.new_chat_member.is_admin() {
            storage
                .put(
                    CHANNELS_NS,
                    &chat_id.to_string(),
                    json!({
                        "id": chat_id,
                        "title": title,
                        "kind": member.chat.kind,
                        "owner_id": user_id,
                        "active": true,
                    }),
                )
                .await?;
            self.track_ownership(&*storage, user_id, chat_id, true).await?;
            info!(chat = chat_id, owner = user_id, status, "channel added");

            api.send_message(
                user_id,
                &format!(
                    "\u{2705} <b>Channel Added!</b>\n\n\
                     You can now manage <b>{title}</b>\n\n\
                     Use /start to see your channels."
                ),
            )
            .await?;
        } else if member.new_chat_member.is_gone() {
            if let Some(mut doc) = storage.get(CHANNELS_NS, &chat_id.to_string()).await? {
                doc["active"] = json!(false);
                storage.put(CHANNELS_NS, &chat_id.to_string(), doc).await?;
            }
            self.track_ownership(&*storage, user_id, chat_id, false).await?;
            info!(chat = chat_id, status, "channel removed");

            api.send_message(
                user_id,
                &format!(
                    "\u{274c} <b>Channel Removed</b>\n\n\
                     The bot was removed from <b>{title}</b>"
                ),
            )
            .await?;
        }
        Ok(())
    }

    /// Maintains the `owner:<user>` → channel-id list document.
    async fn track_ownership(
        &self,
        storage: &dyn Storage,
        user_id: i64,
        chat_id: i64,
        owned: bool,
    ) -> anyhow::Result<()> {
        let key = format!("owner:{user_id}");
        let mut ids: Vec<i64> = storage
            .get(CHANNELS_NS, &key)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        if owned {
            if !ids.contains(&chat_id) {
                ids.push(chat_id);
            }
        } else {
            ids.retain(|id| *id != chat_id);
        }
        storage.put(CHANNELS_NS, &key, json!(ids)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{ApiResult, MemoryStorage, Update};
    use parking_lot::Mutex;
    use serde_json::Value;

    #[derive(Default)]
    struct RecordingApi {
        sent: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl MessagingApi for RecordingApi {
        async fn call(&self, method: &str, params: Value) -> ApiResult<Value> {
            self.sent.lock().push((method.to_string(), params));
            Ok(json!({ "message_id": 1 }))
        }
    }

    fn container_with_mocks() -> (Arc<Container>, Arc<RecordingApi>, Arc<MemoryStorage>) {
        let api = Arc::new(RecordingApi::default());
        let storage = Arc::new(MemoryStorage::new());
        let mut container = Container::new();
        container.register_instance::<dyn MessagingApi>(Arc::clone(&api) as Arc<dyn MessagingApi>);
        container.register_instance::<dyn Storage>(Arc::clone(&storage) as Arc<dyn Storage>);
        (Arc::new(container), api, storage)
    }

    fn command_event(name: &str, chat_kind: &str) -> Event {
        let message: Message = serde_json::from_value(json!({
            "message_id": 1,
            "from": { "id": 7, "first_name": "Ada" },
            "chat": { "id": 7, "type": chat_kind },
            "text": format!("/{name}")
        }))
        .unwrap();
        Event::CommandReceived {
            command: Command::parse(&format!("/{name}")).unwrap(),
            message: Arc::new(message),
            update: Arc::new(Update::default()),
        }
    }

    fn membership_event(status: &str) -> Event {
        let member: ChatMemberUpdated = serde_json::from_value(json!({
            "chat": { "id": -100, "type": "channel", "title": "News" },
            "from": { "id": 7, "first_name": "Ada" },
            "new_chat_member": { "status": status, "user": { "id": 99, "is_bot": true } }
        }))
        .unwrap();
        Event::MyChatMemberChanged {
            member: Arc::new(member),
            update: Arc::new(Update::default()),
        }
    }

    #[tokio::test]
    async fn start_replies_in_private_chat() {
        let (container, api, _) = container_with_mocks();
        CorePlugin
            .on_event(command_event("start", "private"), Arc::clone(&container))
            .await
            .unwrap();

        let sent = api.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "sendMessage");
        assert!(sent[0].1["text"].as_str().unwrap().contains("Welcome"));
    }

    #[tokio::test]
    async fn commands_are_ignored_outside_private_chats() {
        let (container, api, _) = container_with_mocks();
        CorePlugin
            .on_event(command_event("start", "group"), container)
            .await
            .unwrap();
        assert!(api.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_gets_a_hint() {
        let (container, api, _) = container_with_mocks();
        CorePlugin
            .on_event(command_event("frobnicate", "private"), container)
            .await
            .unwrap();

        let sent = api.sent.lock();
        assert!(sent[0].1["text"].as_str().unwrap().contains("Unknown command"));
    }

    #[tokio::test]
    async fn promotion_records_channel_and_notifies_owner() {
        let (container, api, storage) = container_with_mocks();
        CorePlugin
            .on_event(membership_event("administrator"), container)
            .await
            .unwrap();

        let doc = storage.get(CHANNELS_NS, "-100").await.unwrap().unwrap();
        assert_eq!(doc["title"], "News");
        assert_eq!(doc["owner_id"], 7);
        assert_eq!(doc["active"], true);

        let owned = storage.get(CHANNELS_NS, "owner:7").await.unwrap().unwrap();
        assert_eq!(owned, json!([-100]));

        let sent = api.sent.lock();
        assert_eq!(sent[0].1["chat_id"], 7);
        assert!(sent[0].1["text"].as_str().unwrap().contains("Channel Added"));
    }

    #[tokio::test]
    async fn removal_deactivates_instead_of_deleting() {
        let (container, api, storage) = container_with_mocks();
        CorePlugin
            .on_event(membership_event("administrator"), Arc::clone(&container))
            .await
            .unwrap();
        CorePlugin
            .on_event(membership_event("kicked"), container)
            .await
            .unwrap();

        let doc = storage.get(CHANNELS_NS, "-100").await.unwrap().unwrap();
        assert_eq!(doc["active"], false);
        let owned = storage.get(CHANNELS_NS, "owner:7").await.unwrap().unwrap();
        assert_eq!(owned, json!([]));
        assert_eq!(api.sent.lock().len(), 2);
    }

    #[tokio::test]
    async fn group_membership_changes_are_ignored() {
        let (container, api, storage) = container_with_mocks();
        let member: ChatMemberUpdated = serde_json::from_value(json!({
            "chat": { "id": -5, "type": "group" },
            "from": { "id": 7 },
            "new_chat_member": { "status": "administrator" }
        }))
        .unwrap();
        CorePlugin
            .on_event(
                Event::MyChatMemberChanged {
                    member: Arc::new(member),
                    update: Arc::new(Update::default()),
                },
                container,
            )
            .await
            .unwrap();

        assert!(api.sent.lock().is_empty());
        assert!(storage.is_empty());
    }
}
