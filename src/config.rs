use serde::Serialize;

use crate::error::{Error, Result};
use crate::storage::{repository, Database};

pub const TREND_MONTHS_KEY: &str = "trend_months";
pub const LEADERBOARD_DAYS_KEY: &str = "leaderboard_days";
pub const FETCH_TIMEOUT_KEY: &str = "fetch_timeout_secs";

/// Longest trailing series: ten years of monthly periods.
pub const MAX_TREND_MONTHS: u32 = 120;
/// Longest recognition window: ten years of days.
pub const MAX_LEADERBOARD_DAYS: u32 = 3660;

/// Analytics settings stored in `app_config`. Missing keys fall back to the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalyticsConfig {
    /// Length of the trailing series shown by `series`.
    pub trend_months: u32,
    /// Recognition window for the leaderboard, ending today.
    pub leaderboard_days: u32,
    pub fetch_timeout_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_months: 6,
            leaderboard_days: 30,
            fetch_timeout_secs: 10,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}

/// Parse a count that must lie in `1..=max`.
fn parse_count(key: &str, value: &str, max: u32) -> Result<u32> {
    let n: u32 = parse_value(key, value)?;
    if !(1..=max).contains(&n) {
        return Err(Error::Config(format!("{key} must be between 1 and {max}, got {n}")));
    }
    Ok(n)
}

/// Check that `months` is a usable trailing-series length.
pub fn check_trend_months(months: u32) -> Result<u32> {
    parse_count(TREND_MONTHS_KEY, &months.to_string(), MAX_TREND_MONTHS)
}

/// Check that `days` is a usable recognition window length.
pub fn check_leaderboard_days(days: u32) -> Result<u32> {
    parse_count(LEADERBOARD_DAYS_KEY, &days.to_string(), MAX_LEADERBOARD_DAYS)
}

impl AnalyticsConfig {
    pub async fn load(db: &Database) -> Result<Self> {
        let (months, days, timeout) = db
            .reader()
            .call(|conn| {
                Ok::<_, rusqlite::Error>((
                    repository::get_config(conn, TREND_MONTHS_KEY)?,
                    repository::get_config(conn, LEADERBOARD_DAYS_KEY)?,
                    repository::get_config(conn, FETCH_TIMEOUT_KEY)?,
                ))
            })
            .await?;

        let defaults = Self::default();
        Ok(Self {
            trend_months: match months {
                Some(v) => parse_count(TREND_MONTHS_KEY, &v, MAX_TREND_MONTHS)?,
                None => defaults.trend_months,
            },
            leaderboard_days: match days {
                Some(v) => parse_count(LEADERBOARD_DAYS_KEY, &v, MAX_LEADERBOARD_DAYS)?,
                None => defaults.leaderboard_days,
            },
            fetch_timeout_secs: match timeout {
                Some(v) => parse_value(FETCH_TIMEOUT_KEY, &v)?,
                None => defaults.fetch_timeout_secs,
            },
        })
    }

    /// Reject values for known keys that `load` would not accept.
    pub fn validate(key: &str, value: &str) -> Result<()> {
        match key {
            TREND_MONTHS_KEY => parse_count(key, value, MAX_TREND_MONTHS).map(|_| ()),
            LEADERBOARD_DAYS_KEY => parse_count(key, value, MAX_LEADERBOARD_DAYS).map(|_| ()),
            FETCH_TIMEOUT_KEY => parse_value::<u64>(key, value).map(|_| ()),
            _ => Ok(()),
        }
    }
}
