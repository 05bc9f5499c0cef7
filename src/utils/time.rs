//! Timestamp parsing and presentation helpers.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};

/// Date format accepted by the import CSV layout.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Timestamp format used by the CSV export.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DAY_NAMES: [&str; 7] = [
    "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu",
];

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

// WIB (UTC+7)
const DISPLAY_OFFSET_HOURS: i64 = 7;

/// Renders a timestamp as a long Indonesian date in WIB, e.g. `Rabu, 1 Januari 2025`.
pub fn format_long_date(t: DateTime<Utc>) -> String {
    let local = t.naive_utc() + Duration::hours(DISPLAY_OFFSET_HOURS);
    let day_name = DAY_NAMES[local.weekday().num_days_from_monday() as usize];
    let month_name = MONTH_NAMES[local.month0() as usize];
    format!("{day_name}, {} {month_name} {}", local.day(), local.year())
}

/// Parses a date that must match `YYYY-MM-DD` exactly, as midnight UTC.
pub fn parse_strict_date(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// Parses a timestamp that must match `YYYY-MM-DD HH:MM:SS` exactly, as UTC.
pub fn parse_strict_datetime(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != 19 {
        return None;
    }
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .ok()
        .map(|n| n.and_utc())
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.
pub fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_strict_datetime(s).or_else(|| parse_strict_date(s))
}

pub fn deserialize_flexible<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn deserialize_flexible_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_flexible(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}
