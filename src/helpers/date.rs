//! Date helper functions (Portuguese, Brazil)

use chrono::{DateTime, Locale, TimeZone, Utc};
use std::fmt::Display;

/// Parse a content API timestamp such as `2021-03-25T19:25:28+0000`
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// Format as `dd MMM yyyy` with pt-BR month abbreviations
///
/// # Examples
/// ```ignore
/// publication_date(&date) // -> "25 mar 2021"
/// ```
pub fn publication_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format_localized("%d %b %Y", Locale::pt_BR).to_string()
}

/// Format as `dd MMM yyyy, às HH:mm`
pub fn edited_at<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format_localized("%d %b %Y, às %H:%M", Locale::pt_BR)
        .to_string()
}
