//! Relative and absolute timestamp labels.
//!
//! Transcript lines carry a label relative to "now" so the consumer can
//! reason about recency without doing date arithmetic. Anything older than a
//! week falls back to an absolute date in the display timezone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Display timezone used when none is configured
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Render `[just now]`, `[Nm ago]`, `[Nh ago]`, `[Nd ago]` or `[Mon DD, HH:MM]`.
pub fn relative_label(created_at: DateTime<Utc>, now: DateTime<Utc>, tz: Tz) -> String {
    let diff = now.signed_duration_since(created_at);

    if diff.num_seconds() < 60 {
        "[just now]".to_string()
    } else if diff.num_minutes() < 60 {
        format!("[{}m ago]", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("[{}h ago]", diff.num_hours())
    } else if diff.num_days() < 7 {
        format!("[{}d ago]", diff.num_days())
    } else {
        format!("[{}]", created_at.with_timezone(&tz).format("%b %d, %H:%M"))
    }
}

/// Absolute `YYYY-MM-DD HH:MM:SS` rendering stored alongside each message
pub fn absolute_timestamp(created_at: DateTime<Utc>, tz: Tz) -> String {
    created_at
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// `YYYY-MM-DD HH:MM:SS TZ` used in the transcript header
pub fn current_time_line(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}
