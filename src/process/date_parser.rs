use chrono::NaiveDate;

/// Formats tried, in order, for free-form date cells such as `Reopen date`.
const FLEXIBLE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    // two-digit years first: `%Y` would read "20" as the year 20
    "%m/%d/%y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%Y/%m/%d",
    "%Y%m%d",
];

/// Fast parse of `"YYYYMMDD"` (the case feed's `date` column).
pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // the feed is integer-typed; tolerate a trailing ".0"
    let s = s.strip_suffix(".0").unwrap_or(s);
    if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a year-less `"Month Day"` expiry cell by appending `year`.
///
/// `%B` accepts both full and abbreviated English month names.
pub fn parse_month_day(raw: &str, year: i32) -> Option<NaiveDate> {
    let raw = raw.trim().trim_end_matches('.');
    if raw.is_empty() {
        return None;
    }
    let with_year = format!("{} {}", raw, year);
    NaiveDate::parse_from_str(&with_year, "%B %d %Y").ok()
}

/// Try each of the known layouts; `None` if nothing matches.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // "2020-05-01 00:00:00" style timestamps keep only the date part
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    FLEXIBLE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(raw, fmt)
                .or_else(|_| NaiveDate::parse_from_str(date_part, fmt))
                .ok()
        })
}

/// Null-safe later-of-two.
pub fn later_of(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
