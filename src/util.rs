/// Utility helpers shared by all sources.
///
/// This module contains:
/// - Time helpers (timestamps, search windows)
/// - Text truncation
/// - Small numeric formatting utilities
///
/// IMPORTANT:
/// - No source-specific logic should live here.
/// - Everything except the clock readers is pure.
///

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};

/// Local wall-clock time as an ISO-8601 string without offset,
/// microsecond precision.
///
/// Used for every `fetched_at` and `collected_at` field.
pub fn now_iso() -> String {
    iso(Local::now().naive_local())
}

pub fn iso(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Date `days` before `now`, formatted `YYYY-MM-DD`.
///
/// Used as the lower bound for "recently created" searches.
pub fn days_before(now: NaiveDateTime, days: i64) -> String {
    let date: NaiveDate = (now - Duration::days(days)).date();
    date.format("%Y-%m-%d").to_string()
}

/// Keep at most `max` characters.
///
/// Counts Unicode scalar values, never bytes, so multi-byte
/// descriptions are never split mid-character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Date-only prefix of an ISO timestamp ("2026-03-01T12:00:00Z" -> "2026-03-01").
///
/// Shorter inputs are returned unchanged.
pub fn date_prefix(ts: &str) -> String {
    truncate_chars(ts, 10)
}

/// Round to 2 decimals, ties to even (0.125 -> 0.12, 0.375 -> 0.38).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Format a raw USD figure in billions.
///
/// No unit scaling: 250M is rendered "$0.25B".
pub fn format_billions(usd: f64) -> String {
    format!("${:.2}B", usd / 1e9)
}
