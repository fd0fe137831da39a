//! Platform REST adapter implementing `HistoryFetcher`

mod client;
mod models;

pub use client::{DiscordFetcher, DiscordFetcherConfig, MAX_PAGE_SIZE};
pub use models::{clean_content, ApiChannel, ApiGuild, ApiMessage, ApiUser};
