use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::date_util::{last_day_of_month, month_from_abbrev, MONTH_ABBREVS};
use crate::error::{Error, Result};

static RE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][a-z]{2})-(\d{4})$").unwrap());

/// One pulse-check cycle, written `Mon-YYYY` (e.g. `Feb-2026`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodToken {
    year: i32,
    month: u32,
}

impl PeriodToken {
    /// Earliest and latest years a token can carry; the same range the
    /// four-digit `Mon-YYYY` form can spell.
    pub const MIN_YEAR: i32 = 0;
    pub const MAX_YEAR: i32 = 9999;

    /// Build a token from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::PeriodParse(format!("month out of range: {month}")));
        }
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(Error::PeriodParse(format!(
                "year out of range: {year} (expected {}..={})",
                Self::MIN_YEAR,
                Self::MAX_YEAR
            )));
        }
        Ok(Self { year, month })
    }

    /// Parse a `Mon-YYYY` token. Month abbreviations are English, title case.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = RE_TOKEN
            .captures(s)
            .ok_or_else(|| Error::PeriodParse(format!("expected Mon-YYYY, got {s:?}")))?;
        let month = month_from_abbrev(&caps[1])
            .ok_or_else(|| Error::PeriodParse(format!("unknown month in {s:?}")))?;
        let year: i32 = caps[2]
            .parse()
            .map_err(|_| Error::PeriodParse(format!("invalid year in {s:?}")))?;
        Ok(Self { year, month })
    }

    /// The period containing `date`.
    pub fn from_date(date: NaiveDate) -> Result<Self> {
        Self::new(date.year(), date.month())
    }

    /// The period containing today's local date.
    pub fn current() -> Result<Self> {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn to_key(&self) -> String {
        format!("{}-{:04}", MONTH_ABBREVS[self.month as usize - 1], self.year)
    }

    /// Shift back `n` whole months, borrowing across year boundaries.
    /// Shifting before `Jan-0000` is an error.
    pub fn offset(&self, n: u32) -> Result<Self> {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) - n as i64;
        if index < Self::MIN_YEAR as i64 * 12 {
            return Err(Error::PeriodParse(format!(
                "{self} shifted back {n} months is before Jan-0000"
            )));
        }
        Self::new(index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
    }

    pub fn previous(&self) -> Result<Self> {
        self.offset(1)
    }

    /// First and last calendar day of the month (inclusive).
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN);
        (start, last_day_of_month(self.year, self.month))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// Shift `token` back `n` months.
pub fn offset_period(token: &PeriodToken, n: u32) -> Result<PeriodToken> {
    token.offset(n)
}

/// The `n` periods ending at and including `token`, oldest first.
pub fn last_n_periods(token: &PeriodToken, n: u32) -> Result<Vec<PeriodToken>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    // Fail on the oldest period before collecting any.
    token.offset(n - 1)?;
    (0..n).rev().map(|back| token.offset(back)).collect()
}

impl Ord for PeriodToken {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month).cmp(&(other.year, other.month))
    }
}

impl PartialOrd for PeriodToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

impl FromStr for PeriodToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PeriodToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_key())
    }
}

impl<'de> Deserialize<'de> for PeriodToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PeriodToken {
        PeriodToken::parse(s).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        let t = p("Feb-2026");
        assert_eq!(t.year(), 2026);
        assert_eq!(t.month(), 2);
        assert_eq!(p("Dec-1999").month(), 12);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PeriodToken::parse("").is_err());
        assert!(PeriodToken::parse("feb-2026").is_err());
        assert!(PeriodToken::parse("FEB-2026").is_err());
        assert!(PeriodToken::parse("Feb-26").is_err());
        assert!(PeriodToken::parse("Feb 2026").is_err());
        assert!(PeriodToken::parse("Foo-2026").is_err());
        assert!(PeriodToken::parse("2026-02").is_err());
        assert!(PeriodToken::parse(" Feb-2026").is_err());
        assert!(matches!(
            PeriodToken::parse("Fbr-2026"),
            Err(Error::PeriodParse(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_month() {
        assert!(PeriodToken::new(2025, 0).is_err());
        assert!(PeriodToken::new(2025, 13).is_err());
        assert_eq!(PeriodToken::new(2025, 7).unwrap(), p("Jul-2025"));
    }

    #[test]
    fn test_to_key() {
        assert_eq!(p("Jan-2025").to_key(), "Jan-2025");
        assert_eq!(PeriodToken::new(812, 3).unwrap().to_key(), "Mar-0812");
        assert_eq!(p("Sep-2024").to_string(), "Sep-2024");
    }

    #[test]
    fn test_offset_wraps_year() {
        assert_eq!(offset_period(&p("Feb-2026"), 0).unwrap(), p("Feb-2026"));
        assert_eq!(offset_period(&p("Feb-2026"), 1).unwrap(), p("Jan-2026"));
        assert_eq!(offset_period(&p("Feb-2026"), 2).unwrap(), p("Dec-2025"));
        assert_eq!(offset_period(&p("Jan-2026"), 12).unwrap(), p("Jan-2025"));
        assert_eq!(offset_period(&p("Jan-2026"), 25).unwrap(), p("Dec-2023"));
        assert_eq!(p("Jan-2025").previous().unwrap(), p("Dec-2024"));
    }

    #[test]
    fn test_last_n_periods() {
        assert_eq!(
            last_n_periods(&p("Feb-2026"), 3).unwrap(),
            vec![p("Dec-2025"), p("Jan-2026"), p("Feb-2026")]
        );
        assert!(last_n_periods(&p("Feb-2026"), 0).unwrap().is_empty());
        assert_eq!(last_n_periods(&p("Feb-2026"), 1).unwrap(), vec![p("Feb-2026")]);
    }

    #[test]
    fn test_last_n_periods_strictly_increasing() {
        for n in [1u32, 5, 12, 13, 40] {
            let periods = last_n_periods(&p("Mar-2025"), n).unwrap();
            assert_eq!(periods.len(), n as usize);
            assert_eq!(*periods.last().unwrap(), p("Mar-2025"));
            for pair in periods.windows(2) {
                assert!(pair[0] < pair[1]);
                assert_eq!(pair[1].previous().unwrap(), pair[0]);
            }
        }
    }

    #[test]
    fn test_date_range() {
        let (s, e) = p("Feb-2024").date_range();
        assert_eq!(s, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(e, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(p("Feb-2024").contains(e));
        assert!(!p("Feb-2024").contains(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
    }

    #[test]
    fn test_from_date_and_ordering() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 30).unwrap();
        assert_eq!(PeriodToken::from_date(d).unwrap(), p("Nov-2025"));
        assert!(p("Dec-2024") < p("Jan-2025"));
        assert!(p("Feb-2025") > p("Jan-2025"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&p("Oct-2025")).unwrap();
        assert_eq!(json, "\"Oct-2025\"");
        let back: PeriodToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("Oct-2025"));
        assert!(serde_json::from_str::<PeriodToken>("\"2025-10\"").is_err());
    }

    #[test]
    fn test_year_range_is_enforced() {
        assert!(PeriodToken::new(-1, 1).is_err());
        assert!(PeriodToken::new(10_000, 1).is_err());
        assert_eq!(PeriodToken::new(9999, 12).unwrap(), p("Dec-9999"));
        assert!(PeriodToken::from_date(NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap()).is_err());

        assert!(matches!(p("Jan-0000").previous(), Err(Error::PeriodParse(_))));
        assert!(offset_period(&p("Feb-2026"), u32::MAX).is_err());
        assert!(last_n_periods(&p("Feb-0000"), 3).is_err());
        assert_eq!(last_n_periods(&p("Feb-0000"), 2).unwrap(), vec![p("Jan-0000"), p("Feb-0000")]);
    }

    #[test]
    fn test_every_shift_round_trips_through_text() {
        for n in [0u32, 1, 11, 12, 1000, 24_000] {
            let token = offset_period(&p("Jun-2026"), n).unwrap();
            assert_eq!(p(&token.to_key()), token);
        }
    }
}
