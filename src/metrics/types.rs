use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{MoodLabel, Role};
use crate::query::period::PeriodToken;

/// Rows of a rollup, plus how many input records were dropped because the
/// Person they reference is missing from the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RollupReport<T> {
    pub rows: Vec<T>,
    pub skipped_rows: u64,
}

/// Submissions for one department or project in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRollup {
    pub group_key: String,
    pub period: PeriodToken,
    pub avg_sat_score: f64,
    /// Mean over scored submissions only; 0 when none are scored.
    pub avg_sentiment: f64,
    pub total_feedback_count: u64,
    pub distinct_submitter_count: u64,
}

/// One group's satisfaction in a period compared with another period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTrend {
    pub group_key: String,
    pub current_period: PeriodToken,
    pub comparison_period: PeriodToken,
    pub current_avg_sat_score: Option<f64>,
    pub comparison_avg_sat_score: Option<f64>,
    pub current_feedback_count: u64,
    pub comparison_feedback_count: u64,
    /// `current - comparison`; `None` when either period has no submissions,
    /// so a new group is not mistaken for a stable one.
    pub delta: Option<f64>,
}

/// One point of a trailing-months series. Periods without submissions are
/// gaps (`None` averages), not zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: PeriodToken,
    pub avg_sat_score: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub feedback_count: u64,
}

/// Task counts for one manager. Overdue is evaluated against the date
/// the rollup was asked about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerRollup {
    pub manager_id: String,
    pub manager_email: String,
    pub manager_name: String,
    pub dept_code: String,
    pub total_tasks: u64,
    pub pending_count: u64,
    pub overdue_count: u64,
}

/// Per-person directory row. Every numeric field is 0 when the person has no
/// submissions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeePerformance {
    pub person_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub dept_code: String,
    pub project_code: String,
    pub avg_sentiment: f64,
    pub latest_sentiment: f64,
    pub avg_sat_score: f64,
    pub latest_sat_score: i64,
    pub latest_mood_label: Option<MoodLabel>,
    pub avg_workload: f64,
    pub avg_work_life_balance: f64,
    pub total_feedback_count: u64,
    pub pending_action_count: u64,
    pub total_action_count: u64,
}

impl EmployeePerformance {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Recognitions received (or given) by one person within a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionTally {
    pub user_id: String,
    pub display_name: String,
    pub dept_code: String,
    pub kudos_count: u64,
    /// Count per value tag.
    pub value_tags: BTreeMap<String, u64>,
}
