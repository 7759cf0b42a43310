use super::GatewayEndpoint;
use crate::error::{GatewayError, GatewayResult};
use crate::events::MessageCreateEvent;
use crate::snowflake::Snowflake;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde_json::json;
use std::time::Duration;

/// User agent sent on REST calls and the websocket upgrade
pub const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/relay-bot, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot-authenticated REST client
///
/// Requests are independent of the websocket session.
#[derive(Debug, Clone)]
pub struct DiscordHttp {
    client: Client,
    base: String,
}

impl DiscordHttp {
    pub fn new(api_base: &str, token: &str) -> GatewayResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|_| GatewayError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Discover the websocket URL and session-start limits
    pub async fn get_gateway_bot(&self) -> GatewayResult<GatewayEndpoint> {
        let url = format!("{}/gateway/bot", self.base);
        tracing::debug!(url = %url, "Fetching gateway endpoint");

        let response = check(self.client.get(&url).send().await?).await?;
        let endpoint: GatewayEndpoint = response.json().await?;

        tracing::info!(
            url = %endpoint.url,
            shards = endpoint.shards,
            remaining = endpoint.session_start_limit.remaining,
            total = endpoint.session_start_limit.total,
            "Gateway endpoint discovered"
        );
        Ok(endpoint)
    }

    /// Post a plain text message to a channel
    pub async fn create_message(
        &self,
        channel_id: Snowflake,
        content: &str,
    ) -> GatewayResult<MessageCreateEvent> {
        let url = format!("{}/channels/{channel_id}/messages", self.base);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let message: MessageCreateEvent = check(response).await?.json().await?;

        tracing::debug!(channel_id = %channel_id, message_id = %message.id, "Message posted");
        Ok(message)
    }
}

/// Turn a non-2xx response into [`GatewayError::Http`]
async fn check(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), body = %body, "REST request rejected");
    Err(GatewayError::Http {
        status: status.as_u16(),
        body,
    })
}
