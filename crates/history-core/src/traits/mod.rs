//! Traits (ports) implemented by infrastructure crates

mod fetcher;
mod lifecycle;
mod repositories;

pub use fetcher::{FetchResult, HistoryFetcher, HistoryQuery};
pub use lifecycle::Closeable;
pub use repositories::{ChannelStatusRepository, MessageRepository, RepoResult};
