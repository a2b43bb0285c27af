//! Per-channel post statistics.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use beacon_core::{Container, Event, EventKind, Message, Storage};

use crate::plugin::Plugin;

const STATS_NS: &str = "channel_stats";

/// Counts channel posts and edits, one document per channel.
///
/// The document layout is `{ "posts": n, "edits": n, "last_post_id": id }`,
/// keyed by chat id under the `channel_stats` namespace.
#[derive(Debug, Default)]
pub struct ChannelLogPlugin;

#[async_trait]
impl Plugin for ChannelLogPlugin {
    fn name(&self) -> &'static str {
        "channel-log"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![
            EventKind::ChannelPostReceived,
            EventKind::EditedChannelPostReceived,
        ]
    }

    async fn on_event(&self, event: Event, container: Arc<Container>) -> anyhow::Result<()> {
        match event {
            Event::ChannelPostReceived { post, .. } => {
                self.bump(&post, "posts", &container).await
            }
            Event::EditedChannelPostReceived { post, .. } => {
                self.bump(&post, "edits", &container).await
            }
            _ => Ok(()),
        }
    }
}

impl ChannelLogPlugin {
    async fn bump(&self, post: &Message, field: &str, container: &Container) -> anyhow::Result<()> {
        let storage = container.resolve::<dyn Storage>()?;
        let key = post.chat.id.to_string();

        let mut doc = storage
            .get(STATS_NS, &key)
            .await?
            .unwrap_or_else(|| json!({ "posts": 0, "edits": 0 }));
        let count = doc[field].as_i64().unwrap_or(0) + 1;
        doc[field] = json!(count);
        doc["last_post_id"] = json!(post.message_id);

        storage.put(STATS_NS, &key, doc).await?;
        debug!(chat = post.chat.id, field, count, "channel activity recorded");
        Ok(())
    }
}
