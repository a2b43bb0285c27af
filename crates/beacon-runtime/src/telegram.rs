//! The Telegram Bot API client.
//!
//! One [`Client`] per invocation, built from [`TelegramConfig`]. Every call
//! POSTs JSON to `{api_base}/bot{token}/{method}` and unwraps the platform's
//! response envelope: `ok = true` yields the `result` payload, `ok = false`
//! becomes [`ApiError::Api`] with the reported code and description.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use beacon_core::{
    ApiError, ApiResult, Injectable, MessagingApi, ResolveError, ResolveResult, Resolver,
};

use crate::config::{BeaconConfig, TelegramConfig};

/// Update categories the webhook subscribes to.
const ALLOWED_UPDATES: &[&str] = &[
    "message",
    "edited_message",
    "channel_post",
    "edited_channel_post",
    "callback_query",
    "inline_query",
    "chosen_inline_result",
    "my_chat_member",
    "chat_member",
    "poll",
    "poll_answer",
];

/// HTTP client for the Telegram Bot API.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl Client {
    /// Builds a client from connection settings.
    pub fn from_config(config: &TelegramConfig) -> ApiResult<Self> {
        if config.token.is_empty() {
            return Err(ApiError::InvalidConfig("bot token is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Performs one API call and unwraps the response envelope.
    pub async fn request(&self, method: &str, params: Value) -> ApiResult<Value> {
        debug!(method, "calling platform API");
        let response = self
            .http
            .post(self.endpoint(method))
            .json(&params)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        if body["ok"].as_bool() != Some(true) {
            let code = body["error_code"].as_i64().unwrap_or(status.as_u16() as i64);
            let description = body["description"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            warn!(method, code, description, "platform API call failed");
            return Err(ApiError::Api { code, description });
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Fetches the bot's own account record.
    pub async fn get_me(&self) -> ApiResult<Value> {
        self.request("getMe", json!({})).await
    }

    /// Registers `url` as the webhook, subscribed to every category the
    /// router classifies.
    pub async fn set_webhook(&self, url: &str) -> ApiResult<Value> {
        self.request(
            "setWebhook",
            json!({
                "url": url,
                "allowed_updates": ALLOWED_UPDATES,
            }),
        )
        .await
    }

    /// Removes the webhook registration.
    pub async fn delete_webhook(&self) -> ApiResult<Value> {
        self.request("deleteWebhook", json!({})).await
    }

    /// Fetches the current webhook status.
    pub async fn get_webhook_info(&self) -> ApiResult<Value> {
        self.request("getWebhookInfo", json!({})).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token stays out of logs.
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessagingApi for Client {
    async fn call(&self, method: &str, params: Value) -> ApiResult<Value> {
        self.request(method, params).await
    }
}

impl Injectable for Client {
    fn construct(resolver: &Resolver<'_>) -> ResolveResult<Arc<Self>> {
        let config = resolver.resolve::<BeaconConfig>()?;
        Self::from_config(&config.telegram)
            .map(Arc::new)
            .map_err(|e| ResolveError::Construction {
                service: std::any::type_name::<Self>(),
                reason: e.to_string(),
            })
    }
}
