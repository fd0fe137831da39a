//! History service
//!
//! Write-through fetching from the platform and the tiered lookup used to
//! assemble transcripts: cache chain, then durable store, then live fetch.

use std::collections::HashSet;

use history_cache::{Lookup, LookupTier};
use history_core::{ContextLine, HistoryQuery, RawMessage, Snowflake, StoredMessage};
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Result of one write-through fetch
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Messages returned by the platform, contentless ones included
    pub raw_count: usize,
    /// Oldest and newest ids in the raw page
    pub oldest_raw: Option<Snowflake>,
    pub newest_raw: Option<Snowflake>,
    /// Every id the platform returned
    pub raw_ids: Vec<Snowflake>,
    /// Rows written to the store, oldest first
    pub stored: Vec<StoredMessage>,
}

impl FetchedPage {
    pub fn is_empty(&self) -> bool {
        self.raw_count == 0
    }
}

/// History service
pub struct HistoryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> HistoryService<'a> {
    /// Create a new HistoryService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fetch a page from the platform, bounded by the fetch timeout
    pub async fn fetch_raw(
        &self,
        channel_id: Snowflake,
        query: HistoryQuery,
    ) -> ServiceResult<Vec<RawMessage>> {
        let timeout = self.ctx.settings().backfill.fetch_timeout();
        let page = tokio::time::timeout(timeout, self.ctx.fetcher().fetch(channel_id, query))
            .await
            .map_err(|_| history_core::FetchError::Timeout(timeout))??;
        Ok(page)
    }

    /// Fetch a page and upsert every storable message, oldest first.
    ///
    /// Contentless messages are skipped but still count towards the raw page,
    /// so pagination cursors keep moving past them.
    #[instrument(skip(self), fields(limit = query.limit))]
    pub async fn fetch_and_store(
        &self,
        channel_id: Snowflake,
        query: HistoryQuery,
    ) -> ServiceResult<FetchedPage> {
        let raw = self.fetch_raw(channel_id, query).await?;
        let page = self.page_from_raw(&raw);
        self.store_page(&page).await?;

        debug!(
            channel_id = %channel_id,
            fetched = page.raw_count,
            stored = page.stored.len(),
            "Fetched and stored page"
        );
        Ok(page)
    }

    fn page_from_raw(&self, raw: &[RawMessage]) -> FetchedPage {
        let tz = self.ctx.settings().context.timezone;
        let mut stored: Vec<StoredMessage> = raw
            .iter()
            .filter_map(|message| StoredMessage::from_raw(message, tz))
            .collect();
        stored.sort_by_key(|m| m.message_id);

        let raw_ids: Vec<Snowflake> = raw.iter().map(|m| m.id).collect();
        FetchedPage {
            raw_count: raw.len(),
            oldest_raw: raw_ids.iter().copied().min(),
            newest_raw: raw_ids.iter().copied().max(),
            raw_ids,
            stored,
        }
    }

    async fn store_page(&self, page: &FetchedPage) -> ServiceResult<()> {
        if !page.stored.is_empty() {
            self.ctx.message_repo().upsert_many(&page.stored).await?;
        }
        Ok(())
    }

    /// Up to `limit` lines strictly older than `before` (or the newest lines
    /// when `before` is `None`), oldest first, tagged with the serving tier.
    ///
    /// Never fails: when the live fetch is needed and fails, whatever the
    /// store or a stale in-process window holds is returned instead.
    #[instrument(skip(self))]
    pub async fn recent_before(
        &self,
        channel_id: Snowflake,
        before: Option<Snowflake>,
        limit: usize,
    ) -> Lookup {
        if limit == 0 {
            return Lookup::new(Vec::new(), LookupTier::Memory);
        }

        // 1. Cache chain
        if let Some(hit) = self.ctx.cache().lookup(channel_id).await {
            if let Some(lines) = window_before(&hit.lines, before, limit) {
                debug!(channel_id = %channel_id, tier = %hit.tier, "Context served from cache");
                return Lookup::new(lines, hit.tier);
            }
        }

        // 2. Durable store
        let stored = match self.store_window(channel_id, before, limit).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Store read failed");
                None
            }
        };
        if let Some((lines, complete)) = &stored {
            if lines.len() >= limit || *complete {
                self.write_back(channel_id, lines.clone()).await;
                return Lookup::new(lines.clone(), LookupTier::Store);
            }
        }

        // 3. Live fetch
        let query = match before {
            Some(id) => HistoryQuery::before(id, limit),
            None => HistoryQuery::latest(limit),
        };
        match self.fetch_raw(channel_id, query).await {
            Ok(raw) => {
                let page = self.page_from_raw(&raw);
                // The fetched page is served even when the write-through fails
                if let Err(e) = self.store_page(&page).await {
                    warn!(channel_id = %channel_id, error = %e, "Write-through of live page failed");
                }
                let lines: Vec<ContextLine> = page.stored.into_iter().map(ContextLine::from).collect();
                self.write_back(channel_id, lines.clone()).await;
                Lookup::new(lines, LookupTier::Live)
            }
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Live fetch failed, serving degraded context");
                self.degraded(channel_id, before, limit, stored.map(|(lines, _)| lines))
            }
        }
    }

    /// Store rows before the cursor, plus whether the store holds the whole channel
    async fn store_window(
        &self,
        channel_id: Snowflake,
        before: Option<Snowflake>,
        limit: usize,
    ) -> ServiceResult<Option<(Vec<ContextLine>, bool)>> {
        let rows = match before {
            Some(id) => self.ctx.message_repo().get_before(channel_id, id, limit).await?,
            None => self.ctx.message_repo().get_recent(channel_id, limit).await?,
        };
        let complete = self.ctx.status_repo().is_backfilled(channel_id).await?;
        if rows.is_empty() && !complete {
            return Ok(None);
        }
        Ok(Some((rows.into_iter().map(ContextLine::from).collect(), complete)))
    }

    fn degraded(
        &self,
        channel_id: Snowflake,
        before: Option<Snowflake>,
        limit: usize,
        stored: Option<Vec<ContextLine>>,
    ) -> Lookup {
        if let Some(lines) = stored.filter(|lines| !lines.is_empty()) {
            return Lookup::new(lines, LookupTier::Store);
        }
        if let Some(stale) = self.ctx.cache().stale(channel_id) {
            let lines = take_before(&stale.lines, before, limit);
            return Lookup::new(lines, LookupTier::Stale);
        }
        Lookup::new(Vec::new(), LookupTier::Store)
    }

    /// Refill the cache with `lines`, keeping cached lines newer than them
    async fn write_back(&self, channel_id: Snowflake, lines: Vec<ContextLine>) {
        let Some(newest) = lines.iter().map(|l| l.message_id).max() else {
            return;
        };
        let newer = self
            .ctx
            .cache()
            .stale(channel_id)
            .map(|hit| hit.lines)
            .unwrap_or_default()
            .into_iter()
            .filter(|l| l.message_id > newest);
        let merged = merge_lines(lines, newer);

        if let Err(e) = self.ctx.cache().set(channel_id, &merged).await {
            warn!(channel_id = %channel_id, error = %e, "Cache write-back failed");
        }
    }
}

/// The last `limit` lines older than `before`, or `None` if fewer exist
fn window_before(
    lines: &[ContextLine],
    before: Option<Snowflake>,
    limit: usize,
) -> Option<Vec<ContextLine>> {
    let window = take_before(lines, before, limit);
    (window.len() >= limit).then_some(window)
}

/// The last `limit` lines older than `before`, however many exist
fn take_before(lines: &[ContextLine], before: Option<Snowflake>, limit: usize) -> Vec<ContextLine> {
    let eligible: Vec<&ContextLine> = lines
        .iter()
        .filter(|l| before.map_or(true, |cursor| l.message_id < cursor))
        .collect();
    let start = eligible.len().saturating_sub(limit);
    eligible[start..].iter().map(|l| (*l).clone()).collect()
}

/// Union by message id, sorted oldest first
fn merge_lines(
    lines: Vec<ContextLine>,
    extra: impl IntoIterator<Item = ContextLine>,
) -> Vec<ContextLine> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ContextLine> = lines
        .into_iter()
        .chain(extra)
        .filter(|l| seen.insert(l.message_id))
        .collect();
    merged.sort_by_key(|l| l.message_id);
    merged
}
