//! Human-readable timestamp rendering for transcript lines

mod timestamp;

pub use timestamp::{absolute_timestamp, current_time_line, relative_label, DEFAULT_TIMEZONE};
