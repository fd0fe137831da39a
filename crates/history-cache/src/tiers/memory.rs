//! In-process tier: short-lived per-channel windows

use std::time::{Duration, Instant};

use dashmap::DashMap;
use history_core::{ContextLine, Snowflake};

use super::window::{remove_lines, replace_line, trim, upsert_line};

#[derive(Debug, Clone)]
struct MemoryEntry {
    lines: Vec<ContextLine>,
    stored_at: Instant,
}

/// Per-channel windows held in a sharded map.
///
/// Only map mutation is synchronized; nothing awaits while a shard is locked.
#[derive(Debug)]
pub struct InProcessCache {
    entries: DashMap<Snowflake, MemoryEntry>,
    ttl: Duration,
    max_lines: usize,
}

impl InProcessCache {
    pub fn new(ttl: Duration, max_lines: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_lines,
        }
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Window for a channel if it is younger than the TTL
    pub fn get(&self, channel_id: Snowflake) -> Option<Vec<ContextLine>> {
        let entry = self.entries.get(&channel_id)?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.lines.clone())
    }

    /// Window for a channel regardless of age, used when every other source failed
    pub fn get_stale(&self, channel_id: Snowflake) -> Option<Vec<ContextLine>> {
        self.entries.get(&channel_id).map(|entry| entry.lines.clone())
    }

    /// Replace the whole window
    pub fn set(&self, channel_id: Snowflake, mut lines: Vec<ContextLine>) {
        lines.sort_by_key(|l| l.message_id);
        lines.dedup_by_key(|l| l.message_id);
        trim(&mut lines, self.max_lines);
        self.entries.insert(
            channel_id,
            MemoryEntry {
                lines,
                stored_at: Instant::now(),
            },
        );
    }

    /// Add a new message, creating the window if the channel had none
    pub fn append_one(&self, channel_id: Snowflake, line: ContextLine) {
        let max_lines = self.max_lines;
        let mut entry = self.entries.entry(channel_id).or_insert_with(|| MemoryEntry {
            lines: Vec::new(),
            stored_at: Instant::now(),
        });
        upsert_line(&mut entry.lines, line, max_lines);
        entry.stored_at = Instant::now();
    }

    /// Update an edited message in place; returns whether it was cached
    pub fn replace_one(&self, channel_id: Snowflake, line: ContextLine) -> bool {
        self.entries
            .get_mut(&channel_id)
            .is_some_and(|mut entry| replace_line(&mut entry.lines, line))
    }

    /// Remove messages from a channel's window, returning how many were cached
    pub fn remove_many(&self, channel_id: Snowflake, message_ids: &[Snowflake]) -> usize {
        self.entries
            .get_mut(&channel_id)
            .map_or(0, |mut entry| remove_lines(&mut entry.lines, message_ids))
    }

    /// Drop a channel's window
    pub fn delete(&self, channel_id: Snowflake) {
        self.entries.remove(&channel_id);
    }

    /// Number of channels with a window
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
