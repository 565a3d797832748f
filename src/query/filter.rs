use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::model::Person;
use crate::query::period::PeriodToken;

/// Which Person field a rollup groups submissions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Department,
    Project,
}

impl GroupBy {
    pub fn key_of<'a>(&self, person: &'a Person) -> &'a str {
        match self {
            GroupBy::Department => &person.dept_code,
            GroupBy::Project => &person.project_code,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupBy::Department => "department",
            GroupBy::Project => "project",
        })
    }
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "department" | "dept" => Ok(GroupBy::Department),
            "project" => Ok(GroupBy::Project),
            other => Err(Error::InvalidArgument(format!("unknown group-by: {other}"))),
        }
    }
}

/// Optional narrowing applied before any rollup. Department, project and
/// manager match against the Person a record belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollupFilter {
    period: Option<PeriodToken>,
    department: Option<String>,
    project: Option<String>,
    manager_email: Option<String>,
}

impl RollupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn period(mut self, period: PeriodToken) -> Self {
        self.period = Some(period);
        self
    }

    pub fn department(mut self, code: &str) -> Self {
        self.department = Some(code.to_string());
        self
    }

    pub fn project(mut self, code: &str) -> Self {
        self.project = Some(code.to_string());
        self
    }

    pub fn manager(mut self, email: &str) -> Self {
        self.manager_email = Some(email.to_string());
        self
    }

    /// Same filter with the period constraint removed, for queries that pick
    /// their own periods.
    pub fn without_period(mut self) -> Self {
        self.period = None;
        self
    }

    pub fn period_filter(&self) -> Option<PeriodToken> {
        self.period
    }

    pub fn matches_period(&self, period: &PeriodToken) -> bool {
        self.period.is_none_or(|p| p == *period)
    }

    pub fn matches_person(&self, person: &Person) -> bool {
        if let Some(ref dept) = self.department {
            if person.dept_code != *dept {
                return false;
            }
        }
        if let Some(ref project) = self.project {
            if person.project_code != *project {
                return false;
            }
        }
        if let Some(ref manager) = self.manager_email {
            if !person.reports_to(manager) {
                return false;
            }
        }
        true
    }
}
