//! Paginated REST history client
//!
//! One logical [`HistoryQuery`] becomes as many 100-message requests as it
//! takes to reach `limit` or a short page. Every request is bounded by a
//! timeout so a stalled connection surfaces as [`FetchError::Timeout`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use history_common::AppConfig;
use history_core::{
    ChannelInfo, Closeable, FetchError, FetchResult, HistoryFetcher, HistoryQuery, RawMessage,
    Snowflake,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::models::{ApiChannel, ApiGuild, ApiMessage, RateLimitBody};

/// Largest page the platform serves per request
pub const MAX_PAGE_SIZE: usize = 100;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Fetcher configuration
#[derive(Clone)]
pub struct DiscordFetcherConfig {
    pub token: String,
    /// Base URL without trailing slash, e.g. `https://discord.com/api/v10`
    pub api_base: String,
    /// Bound on each individual HTTP request
    pub request_timeout: Duration,
}

impl std::fmt::Debug for DiscordFetcherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordFetcherConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl From<&AppConfig> for DiscordFetcherConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            token: config.discord.token.clone(),
            api_base: config.discord.api_base.clone(),
            request_timeout: config.backfill.fetch_timeout(),
        }
    }
}

/// `HistoryFetcher` over the platform REST API
#[derive(Debug)]
pub struct DiscordFetcher {
    client: Client,
    api_base: String,
    request_timeout: Duration,
    closed: AtomicBool,
}

/// Direction of a paginated walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Towards newer messages, pages returned oldest to newest
    Forward,
    /// Towards older messages, pages returned newest to oldest
    Backward,
}

impl DiscordFetcher {
    /// Build the HTTP client with bot authorization headers
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the token is not a valid header value
    /// or the client cannot be constructed.
    pub fn new(config: DiscordFetcherConfig) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bot {}", config.token))
            .map_err(|_| FetchError::Transport("token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "history-worker/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            closed: AtomicBool::new(false),
        })
    }

    /// Create from application config
    pub fn from_config(config: &AppConfig) -> FetchResult<Self> {
        Self::new(DiscordFetcherConfig::from(config))
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        channel_id: Snowflake,
        path: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T> {
        if self.is_closed() {
            return Err(FetchError::Transport("fetcher is closed".into()));
        }

        let url = format!("{}{}", self.api_base, path);
        let request = async {
            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let retry_header = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body = response.text().await.unwrap_or_default();
                return Err(map_status(
                    status,
                    channel_id,
                    retry_header.as_deref(),
                    &body,
                ));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            serde_json::from_slice::<T>(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
        };

        tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(self.request_timeout))?
    }

    async fn fetch_page(
        &self,
        channel_id: Snowflake,
        limit: usize,
        before: Option<Snowflake>,
        after: Option<Snowflake>,
    ) -> FetchResult<Vec<ApiMessage>> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        self.get_json(channel_id, &format!("/channels/{channel_id}/messages"), &query)
            .await
    }
}

#[async_trait]
impl HistoryFetcher for DiscordFetcher {
    #[instrument(skip(self), fields(limit = query.limit))]
    async fn fetch(
        &self,
        channel_id: Snowflake,
        query: HistoryQuery,
    ) -> FetchResult<Vec<RawMessage>> {
        let direction = if query.after.is_some() {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let mut before = query.before;
        let mut after = query.after;
        let mut collected: Vec<RawMessage> = Vec::with_capacity(query.limit);

        while collected.len() < query.limit {
            let page_limit = (query.limit - collected.len()).min(MAX_PAGE_SIZE);
            let mut page = self
                .fetch_page(channel_id, page_limit, before, after)
                .await?;
            let short = page.len() < page_limit;

            order_page(&mut page, direction);
            match direction {
                Direction::Forward => after = page.last().map(|m| m.id).or(after),
                Direction::Backward => before = page.last().map(|m| m.id).or(before),
            }

            debug!(channel_id = %channel_id, page = page.len(), "Fetched history page");
            collected.extend(page.into_iter().map(RawMessage::from));

            if short {
                break;
            }
        }

        Ok(collected)
    }

    #[instrument(skip(self))]
    async fn channel_info(&self, channel_id: Snowflake) -> FetchResult<ChannelInfo> {
        let channel: ApiChannel = self
            .get_json(channel_id, &format!("/channels/{channel_id}"), &[])
            .await?;

        let guild_name = match channel.guild_id {
            Some(guild_id) => {
                match self
                    .get_json::<ApiGuild>(channel_id, &format!("/guilds/{guild_id}"), &[])
                    .await
                {
                    Ok(guild) => Some(guild.name),
                    Err(e) => {
                        warn!(channel_id = %channel_id, guild_id = %guild_id, error = %e, "Guild lookup failed");
                        Some(guild_id.to_string())
                    }
                }
            }
            None => None,
        };

        Ok(ChannelInfo {
            id: channel.id,
            name: channel.name.unwrap_or_else(|| "DM".to_string()),
            guild_name,
        })
    }
}

#[async_trait]
impl Closeable for DiscordFetcher {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Sort a page so that its last element is the next cursor
fn order_page(page: &mut [ApiMessage], direction: Direction) {
    match direction {
        Direction::Forward => page.sort_by_key(|m| m.id),
        Direction::Backward => page.sort_by(|a, b| b.id.cmp(&a.id)),
    }
}

fn map_status(
    status: StatusCode,
    channel_id: Snowflake,
    retry_header: Option<&str>,
    body: &str,
) -> FetchError {
    match status {
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => FetchError::Forbidden(channel_id),
        StatusCode::NOT_FOUND => FetchError::NotFound(channel_id),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            retry_after: retry_after(retry_header, body),
        },
        other => FetchError::Transport(format!("unexpected status {other}")),
    }
}

/// Rate limit delay from the JSON body, then the header, else one second
fn retry_after(header: Option<&str>, body: &str) -> Duration {
    serde_json::from_str::<RateLimitBody>(body)
        .ok()
        .map(|b| b.retry_after)
        .or_else(|| header.and_then(|h| h.trim().parse::<f64>().ok()))
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs_f64)
}
