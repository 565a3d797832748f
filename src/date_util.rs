use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Three-letter English month abbreviations, January first.
pub const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.map_or(NaiveDate::MAX, |d| d - Duration::days(1))
}

/// 1-based month number for an abbreviation like `"Feb"`. Case-sensitive.
pub fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    MONTH_ABBREVS
        .iter()
        .position(|m| *m == abbrev)
        .map(|i| i as u32 + 1)
}

/// Parse a stored timestamp. Accepts RFC 3339 (`2025-01-15T10:30:00Z`) and
/// SQLite's `datetime('now')` format (`2025-01-15 10:30:00`, taken as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a `YYYY-MM-DD` date, also accepting a full timestamp and keeping
/// only its date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|dt| dt.date_naive()))
}

/// The `days`-long window ending on `end`, both ends inclusive. `None` when
/// the start would fall before the earliest representable date.
pub fn trailing_window(end: NaiveDate, days: u32) -> Option<(NaiveDate, NaiveDate)> {
    let back = Duration::try_days(i64::from(days.saturating_sub(1)))?;
    end.checked_sub_signed(back).map(|start| (start, end))
}
