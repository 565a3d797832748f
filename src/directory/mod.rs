use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::metrics::EmployeePerformance;
use crate::model::Role;

/// Column the directory is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Sentiment,
    Satisfaction,
    SubmissionCount,
    Workload,
    WorkLifeBalance,
    PendingActions,
}

impl SortKey {
    fn compare(&self, a: &EmployeePerformance, b: &EmployeePerformance) -> Ordering {
        match self {
            SortKey::Name => a.full_name().cmp(&b.full_name()),
            SortKey::Sentiment => a.avg_sentiment.total_cmp(&b.avg_sentiment),
            SortKey::Satisfaction => a.avg_sat_score.total_cmp(&b.avg_sat_score),
            SortKey::SubmissionCount => a.total_feedback_count.cmp(&b.total_feedback_count),
            SortKey::Workload => a.avg_workload.total_cmp(&b.avg_workload),
            SortKey::WorkLifeBalance => a.avg_work_life_balance.total_cmp(&b.avg_work_life_balance),
            SortKey::PendingActions => a.pending_action_count.cmp(&b.pending_action_count),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Name => "name",
            SortKey::Sentiment => "sentiment",
            SortKey::Satisfaction => "satisfaction",
            SortKey::SubmissionCount => "submission_count",
            SortKey::Workload => "workload",
            SortKey::WorkLifeBalance => "work_life_balance",
            SortKey::PendingActions => "pending_actions",
        })
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SortKey::Name),
            "sentiment" => Ok(SortKey::Sentiment),
            "satisfaction" => Ok(SortKey::Satisfaction),
            "submission_count" | "submissions" => Ok(SortKey::SubmissionCount),
            "workload" => Ok(SortKey::Workload),
            "work_life_balance" | "wlb" => Ok(SortKey::WorkLifeBalance),
            "pending_actions" => Ok(SortKey::PendingActions),
            other => Err(Error::InvalidArgument(format!("unknown sort key: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(Error::InvalidArgument(format!("unknown sort direction: {other}"))),
        }
    }
}

/// Options controlling a directory listing.
#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    /// Case-insensitive substring matched against names, email, department
    /// and project.
    pub search: Option<String>,
    pub department: Option<String>,
    pub role: Option<Role>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

fn matches_search(row: &EmployeePerformance, needle: &str) -> bool {
    let full_name = row.full_name();
    [
        row.first_name.as_str(),
        row.last_name.as_str(),
        full_name.as_str(),
        row.email.as_str(),
        row.dept_code.as_str(),
        row.project_code.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Filter and order per-employee rows for display. Ties keep their input
/// order whichever direction is asked for.
pub fn combine(rows: Vec<EmployeePerformance>, query: &DirectoryQuery) -> Vec<EmployeePerformance> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut rows: Vec<EmployeePerformance> = rows
        .into_iter()
        .filter(|r| query.department.as_ref().is_none_or(|d| r.dept_code == *d))
        .filter(|r| query.role.is_none_or(|role| r.role == role))
        .filter(|r| needle.as_deref().is_none_or(|n| matches_search(r, n)))
        .collect();

    rows.sort_by(|a, b| match query.direction {
        SortDirection::Asc => query.sort.compare(a, b),
        SortDirection::Desc => query.sort.compare(b, a),
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, first: &str, last: &str, dept: &str, role: Role, sentiment: f64) -> EmployeePerformance {
        EmployeePerformance {
            person_id: id.to_string(),
            email: format!("{id}@example.com"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role,
            dept_code: dept.to_string(),
            project_code: "APOLLO".to_string(),
            avg_sentiment: sentiment,
            latest_sentiment: sentiment,
            avg_sat_score: 5.0,
            latest_sat_score: 5,
            latest_mood_label: None,
            avg_workload: 3.0,
            avg_work_life_balance: 3.0,
            total_feedback_count: 1,
            pending_action_count: 0,
            total_action_count: 0,
        }
    }

    fn ids(rows: &[EmployeePerformance]) -> Vec<&str> {
        rows.iter().map(|r| r.person_id.as_str()).collect()
    }

    fn sample() -> Vec<EmployeePerformance> {
        vec![
            row("u1", "Zoe", "Adams", "ENG", Role::Employee, 0.4),
            row("u2", "Ann", "Baker", "OPS", Role::Manager, 0.9),
            row("u3", "Ann", "Allen", "ENG", Role::Employee, 0.4),
            row("u4", "Bob", "Stone", "ENG", Role::Manager, 0.1),
        ]
    }

    #[test]
    fn test_default_sorts_by_full_name() {
        let out = combine(sample(), &DirectoryQuery::default());
        assert_eq!(ids(&out), vec!["u3", "u2", "u4", "u1"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_fields() {
        let query = |s: &str| DirectoryQuery {
            search: Some(s.to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&combine(sample(), &query("ann b"))), vec!["u2"]);
        assert_eq!(ids(&combine(sample(), &query("STONE"))), vec!["u4"]);
        assert_eq!(ids(&combine(sample(), &query("ops"))), vec!["u2"]);
        assert_eq!(ids(&combine(sample(), &query("u1@EXAMPLE"))), vec!["u1"]);
        assert_eq!(combine(sample(), &query("apollo")).len(), 4);
        assert_eq!(combine(sample(), &query("   ")).len(), 4);
        assert!(combine(sample(), &query("nobody")).is_empty());
    }

    #[test]
    fn test_department_and_role_filters() {
        let q = DirectoryQuery {
            department: Some("ENG".to_string()),
            role: Some(Role::Manager),
            ..Default::default()
        };
        assert_eq!(ids(&combine(sample(), &q)), vec!["u4"]);
    }

    #[test]
    fn test_numeric_sort_is_stable_both_ways() {
        let asc = DirectoryQuery {
            sort: SortKey::Sentiment,
            ..Default::default()
        };
        assert_eq!(ids(&combine(sample(), &asc)), vec!["u4", "u1", "u3", "u2"]);

        let desc = DirectoryQuery {
            sort: SortKey::Sentiment,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        // u1 and u3 tie and keep input order.
        assert_eq!(ids(&combine(sample(), &desc)), vec!["u2", "u1", "u3", "u4"]);
    }

    #[test]
    fn test_pending_actions_sort() {
        let mut rows = sample();
        rows[0].pending_action_count = 4;
        rows[3].pending_action_count = 2;
        let q = DirectoryQuery {
            sort: SortKey::PendingActions,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        assert_eq!(ids(&combine(rows, &q)), vec!["u1", "u4", "u2", "u3"]);
    }

    #[test]
    fn test_parse_sort_options() {
        assert_eq!("work-life-balance".parse::<SortKey>().unwrap(), SortKey::WorkLifeBalance);
        assert_eq!("Satisfaction".parse::<SortKey>().unwrap(), SortKey::Satisfaction);
        assert_eq!("submission_count".parse::<SortKey>().unwrap(), SortKey::SubmissionCount);
        assert!("salary".parse::<SortKey>().is_err());
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
        assert_eq!(SortKey::PendingActions.to_string(), "pending_actions");
    }
}
