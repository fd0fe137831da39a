//! Edits on a channel window kept sorted by message id (oldest first)

use history_core::{ContextLine, Snowflake};

/// Insert or overwrite `line`, keeping at most `max_lines` newest entries.
///
/// Returns true when the id was not present before.
pub(crate) fn upsert_line(lines: &mut Vec<ContextLine>, line: ContextLine, max_lines: usize) -> bool {
    let inserted = match lines.binary_search_by_key(&line.message_id, |l| l.message_id) {
        Ok(idx) => {
            lines[idx] = line;
            false
        }
        Err(idx) => {
            lines.insert(idx, line);
            true
        }
    };
    trim(lines, max_lines);
    inserted
}

/// Overwrite an existing line; absent ids are ignored
pub(crate) fn replace_line(lines: &mut [ContextLine], line: ContextLine) -> bool {
    match lines.binary_search_by_key(&line.message_id, |l| l.message_id) {
        Ok(idx) if lines[idx] != line => {
            lines[idx] = line;
            true
        }
        _ => false,
    }
}

/// Drop every line whose id is in `ids`, returning how many were removed
pub(crate) fn remove_lines(lines: &mut Vec<ContextLine>, ids: &[Snowflake]) -> usize {
    let before = lines.len();
    lines.retain(|l| !ids.contains(&l.message_id));
    before - lines.len()
}

/// Keep only the newest `max_lines` lines
pub(crate) fn trim(lines: &mut Vec<ContextLine>, max_lines: usize) {
    if lines.len() > max_lines {
        let excess = lines.len() - max_lines;
        lines.drain(..excess);
    }
}
