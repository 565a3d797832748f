//! Single-value metric functions shared by every rollup and scorer.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::TaskStatus;

/// Burnout alert level derived from a sentiment drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Manager accountability level derived from overdue task count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HealthTier {
    Healthy,
    AtRisk,
    Critical,
}

/// Relative decline from `previous` to `current`. A non-positive baseline
/// carries no signal and yields 0.
pub fn drop_percentage(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        (previous - current) / previous
    } else {
        0.0
    }
}

/// `> 0.30` is High, `> 0.15` is Medium, anything else Low.
pub fn risk_tier(drop: f64) -> RiskTier {
    if drop > 0.30 {
        RiskTier::High
    } else if drop > 0.15 {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

pub fn health_tier(overdue_count: u64) -> HealthTier {
    match overdue_count {
        0 => HealthTier::Healthy,
        1..=2 => HealthTier::AtRisk,
        _ => HealthTier::Critical,
    }
}

/// Share of non-pending tasks as a whole percentage, 0 when there are none.
pub fn completion_rate(total: u64, pending: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let done = total - pending.min(total);
    (done as f64 / total as f64 * 100.0).round() as u32
}

/// A task is overdue once its due date has passed and it is not completed.
pub fn is_overdue(status: TaskStatus, due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    status != TaskStatus::Completed && due_date.is_some_and(|due| due < today)
}

/// Arithmetic mean; 0 for no values.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Ratio as a whole percent, rounded half away from zero (0.375 → 38).
pub fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}
