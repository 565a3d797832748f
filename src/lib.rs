pub mod config;
pub mod date_util;
pub mod directory;
pub mod error;
pub mod leaderboard;
pub mod metrics;
pub mod model;
pub mod query;
pub mod scoring;
pub mod snapshot;
pub mod storage;

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;

pub use config::AnalyticsConfig;
pub use directory::{DirectoryQuery, SortDirection, SortKey};
pub use error::{Error, Result};
pub use leaderboard::{LeaderboardEntry, PODIUM_SIZE};
pub use metrics::{
    EmployeePerformance, GroupRollup, GroupTrend, ManagerRollup, RecognitionTally, RollupReport,
    SeriesPoint,
};
pub use query::filter::{GroupBy, RollupFilter};
pub use query::period::PeriodToken;
pub use scoring::{BurnoutRisk, ManagerAccountability};
pub use snapshot::Snapshot;
pub use storage::Database;

use storage::repository;

/// Main entry point for the pulse analytics warehouse.
///
/// Every query loads a fresh [`Snapshot`] and computes over it; nothing is
/// cached between calls.
pub struct PulseDW {
    db: Database,
    fetch_timeout: Duration,
}

impl PulseDW {
    pub fn new(db: Database, fetch_timeout: Duration) -> Self {
        Self { db, fetch_timeout }
    }

    /// Build from the timeout stored in `app_config`.
    pub async fn from_config(db: Database) -> Result<Self> {
        let cfg = AnalyticsConfig::load(&db).await?;
        Ok(Self::new(db, Duration::from_secs(cfg.fetch_timeout_secs)))
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    async fn fetch<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.fetch_timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.fetch_timeout.as_secs()))?
    }

    /// Load a consistent view of the store, bounded by the fetch timeout.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.fetch(Snapshot::load(&self.db)).await
    }

    // ── Rollups ────────────────────────────────────────────────────

    pub async fn group_rollup(
        &self,
        group_by: GroupBy,
        filter: &RollupFilter,
    ) -> Result<RollupReport<GroupRollup>> {
        let snapshot = self.snapshot().await?;
        Ok(metrics::group_rollup(&snapshot, group_by, filter))
    }

    pub async fn group_trend(
        &self,
        group_by: GroupBy,
        current: PeriodToken,
        comparison: PeriodToken,
        filter: &RollupFilter,
    ) -> Result<RollupReport<GroupTrend>> {
        let snapshot = self.snapshot().await?;
        Ok(metrics::group_trend(&snapshot, group_by, current, comparison, filter))
    }

    pub async fn trend_series(
        &self,
        end: PeriodToken,
        months: u32,
        filter: &RollupFilter,
    ) -> Result<RollupReport<SeriesPoint>> {
        if !(1..=config::MAX_TREND_MONTHS).contains(&months) {
            return Err(Error::InvalidArgument(format!(
                "months must be between 1 and {}, got {months}",
                config::MAX_TREND_MONTHS
            )));
        }
        let snapshot = self.snapshot().await?;
        metrics::trend_series(&snapshot, end, months, filter)
    }

    pub async fn directory(
        &self,
        filter: &RollupFilter,
        query: &DirectoryQuery,
    ) -> Result<Vec<EmployeePerformance>> {
        let snapshot = self.snapshot().await?;
        let report = metrics::employee_performance(&snapshot, filter);
        Ok(directory::combine(report.rows, query))
    }

    // ── Scores ─────────────────────────────────────────────────────

    pub async fn burnout_risks(&self, filter: &RollupFilter) -> Result<Vec<BurnoutRisk>> {
        let snapshot = self.snapshot().await?;
        Ok(scoring::detect_burnout_risks(&snapshot, filter))
    }

    /// Burnout check for one person, reading only their own submissions.
    /// `Ok(None)` means insufficient history or Low risk.
    pub async fn risk_for_person(&self, person_id: &str) -> Result<Option<BurnoutRisk>> {
        let id = person_id.to_string();
        let (person, submissions) = self
            .fetch(async {
                self.db
                    .reader()
                    .call(move |conn| {
                        let person = repository::get_person(conn, &id)?;
                        let submissions = repository::list_submissions_for_user(conn, &id)?;
                        Ok::<_, rusqlite::Error>((person, submissions.rows))
                    })
                    .await
                    .map_err(Error::from)
            })
            .await?;

        let person = person.ok_or_else(|| Error::NotFound(format!("person {person_id}")))?;
        let refs: Vec<&model::Submission> = submissions.iter().collect();
        Ok(scoring::assess_person(&person, &refs))
    }

    /// Manager scores with overdue evaluated as of `today`.
    pub async fn manager_accountability(
        &self,
        today: NaiveDate,
        filter: &RollupFilter,
    ) -> Result<RollupReport<ManagerAccountability>> {
        let snapshot = self.snapshot().await?;
        Ok(scoring::score_managers(&snapshot, today, filter))
    }

    // ── Recognition ────────────────────────────────────────────────

    /// Kudos received within `[start, end]`, ranked to `podium`.
    pub async fn leaderboard(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        podium: u32,
    ) -> Result<Vec<LeaderboardEntry>> {
        check_window(start, end)?;
        let snapshot = self.snapshot().await?;
        let tally = metrics::recognition_tally(&snapshot, start, end);
        Ok(leaderboard::rank_leaderboard(tally.rows, podium))
    }

    /// Named (non-anonymous) kudos given within `[start, end]`, ranked to
    /// `podium`.
    pub async fn top_givers(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        podium: u32,
    ) -> Result<Vec<LeaderboardEntry>> {
        check_window(start, end)?;
        let snapshot = self.snapshot().await?;
        let tally = metrics::giver_tally(&snapshot, start, end);
        Ok(leaderboard::rank_leaderboard(tally.rows, podium))
    }

    // ── Config & status ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        Ok(self
            .db
            .reader()
            .call(move |conn| repository::get_config(conn, &key))
            .await?)
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        AnalyticsConfig::validate(key, value)?;
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .writer()
            .call(move |conn| repository::set_config(conn, &key, &value))
            .await?;
        Ok(())
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        Ok(self.db.reader().call(|conn| repository::list_config(conn)).await?)
    }

    /// Row counts per table.
    pub async fn status(&self) -> Result<Vec<(&'static str, i64)>> {
        Ok(self.db.reader().call(|conn| repository::table_counts(conn)).await?)
    }
}

fn check_window(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::InvalidArgument(format!(
            "window start {start} is after end {end}"
        )));
    }
    Ok(())
}
