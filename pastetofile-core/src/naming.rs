use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use chrono::{Datelike, Local, NaiveDate};

use crate::{BASE_NAME_PREFIX, MAX_COLLISION_SUFFIX};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub fn month_abbrev(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTHS.get(index as usize))
        .copied()
        .unwrap_or("unk")
}

/// `PTF-YYYY-mon-DD` for the given calendar date.
pub fn base_name_for(date: NaiveDate) -> String {
    format!(
        "{BASE_NAME_PREFIX}-{:04}-{}-{:02}",
        date.year(),
        month_abbrev(date.month()),
        date.day()
    )
}

/// Base name for today's local date.
pub fn dated_base_name() -> String {
    base_name_for(Local::now().date_naive())
}

/// Per-entry base name used by history export; `index` is 1-based.
pub fn history_base_name(dated_base: &str, index: usize) -> String {
    format!("{dated_base}-HIST-{index:04}")
}

/// Candidate file names in the order they are tried: `base.ext`,
/// `base-01.ext` .. `base-999.ext`, then a tick-suffixed last resort that
/// keeps the search finite even if every numbered name is taken.
pub fn candidates<'a>(
    dir: &'a Path,
    base: &'a str,
    extension: &'a str,
) -> impl Iterator<Item = PathBuf> + 'a {
    (0..=MAX_COLLISION_SUFFIX)
        .map(move |attempt| dir.join(candidate_name(base, extension, attempt)))
        .chain(std::iter::once_with(move || {
            tick_candidate(dir, base, extension)
        }))
}

pub fn candidate_name(base: &str, extension: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{base}.{extension}")
    } else {
        format!("{base}-{attempt:02}.{extension}")
    }
}

/// First candidate that does not exist right now. Another writer may claim it
/// before it is used, so callers that create files go through
/// [`crate::persist::write_unique`] instead.
pub fn resolve_unique_path(dir: &Path, base: &str, extension: &str) -> PathBuf {
    candidates(dir, base, extension)
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| tick_candidate(dir, base, extension))
}

fn tick_candidate(dir: &Path, base: &str, extension: &str) -> PathBuf {
    dir.join(format!("{base}-{}.{extension}", tick_count()))
}

/// Wall-clock milliseconds, forced strictly increasing within the process so
/// a stepped-back clock or two calls in the same millisecond never repeat a
/// value. Across processes a repeat only costs a create-new collision.
fn tick_count() -> u64 {
    static LAST_TICK: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64;
    let previous = LAST_TICK
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or(now);
    now.max(previous.saturating_add(1))
}
