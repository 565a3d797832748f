//! Read-only records loaded from the survey store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::query::period::PeriodToken;

/// Implements `as_str`, `Display` and `FromStr` over the snake_case text a
/// variant is stored as.
macro_rules! stored_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Error> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidArgument(format!(
                        "unknown {}: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Manager,
    SeniorMgmt,
}

stored_enum!(Role {
    Employee => "employee",
    Manager => "manager",
    SeniorMgmt => "senior_mgmt",
});

/// Self-reported mood, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLabel {
    VeryUnhappy,
    Unhappy,
    Neutral,
    Happy,
    VeryHappy,
}

stored_enum!(MoodLabel {
    VeryUnhappy => "very_unhappy",
    Unhappy => "unhappy",
    Neutral => "neutral",
    Happy => "happy",
    VeryHappy => "very_happy",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Blocked,
    Completed,
}

stored_enum!(TaskStatus {
    Pending => "pending",
    InProgress => "in_progress",
    Blocked => "blocked",
    Completed => "completed",
});

/// Which side of a task's employee/manager pair owns the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedTo {
    Employee,
    Manager,
}

stored_enum!(AssignedTo {
    Employee => "employee",
    Manager => "manager",
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub dept_code: String,
    pub project_code: String,
    pub manager_email: Option<String>,
    pub is_admin: bool,
}

impl Person {
    /// `"<first> <last>"`, the form used for display and name sorting.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether this person reports to `manager_email` (emails compare
    /// case-insensitively).
    pub fn reports_to(&self, manager_email: &str) -> bool {
        self.manager_email
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(manager_email))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub period: PeriodToken,
    /// 1-10.
    pub sat_score: i64,
    pub mood_label: MoodLabel,
    /// 1-5.
    pub workload_level: i64,
    /// 1-5.
    pub work_life_balance: i64,
    /// Model-scored sentiment in [0, 1]; `None` until scored.
    pub ai_sentiment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub employee_email: String,
    pub manager_email: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: AssignedTo,
}

impl Task {
    /// Email of whoever the task is assigned to.
    pub fn assignee_email(&self) -> &str {
        match self.assigned_to {
            AssignedTo::Employee => &self.employee_email,
            AssignedTo::Manager => &self.manager_email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub id: String,
    pub giver_user_id: String,
    pub receiver_user_id: String,
    pub value_tag: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_enum_round_trip() {
        assert_eq!("senior_mgmt".parse::<Role>().unwrap(), Role::SeniorMgmt);
        assert_eq!(Role::SeniorMgmt.to_string(), "senior_mgmt");
        assert_eq!("In_Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("very_happy".parse::<MoodLabel>().unwrap(), MoodLabel::VeryHappy);
        assert!("ecstatic".parse::<MoodLabel>().is_err());
        assert!(matches!(
            "intern".parse::<Role>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_mood_is_ordinal() {
        assert!(MoodLabel::VeryUnhappy < MoodLabel::Unhappy);
        assert!(MoodLabel::Neutral < MoodLabel::Happy);
        assert!(MoodLabel::Happy < MoodLabel::VeryHappy);
    }

    #[test]
    fn test_assignee_email() {
        let mut task = Task {
            id: "t1".into(),
            title: "Follow up".into(),
            employee_email: "ann@example.com".into(),
            manager_email: "max@example.com".into(),
            status: TaskStatus::Pending,
            due_date: None,
            assigned_to: AssignedTo::Employee,
        };
        assert_eq!(task.assignee_email(), "ann@example.com");
        task.assigned_to = AssignedTo::Manager;
        assert_eq!(task.assignee_email(), "max@example.com");
    }

    #[test]
    fn test_reports_to_ignores_case() {
        let person = Person {
            id: "u1".into(),
            email: "ann@example.com".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            role: Role::Employee,
            dept_code: "ENG".into(),
            project_code: "APOLLO".into(),
            manager_email: Some("Max@Example.com".into()),
            is_admin: false,
        };
        assert!(person.reports_to("max@example.com"));
        assert!(!person.reports_to("mia@example.com"));
        assert_eq!(person.full_name(), "Ann Lee");
    }
}
