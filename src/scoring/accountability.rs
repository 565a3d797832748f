use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::manager_rollup;
use crate::metrics::primitives::{completion_rate, health_tier, HealthTier};
use crate::metrics::RollupReport;
use crate::query::filter::RollupFilter;
use crate::snapshot::Snapshot;

/// A manager's task follow-through as of one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerAccountability {
    pub manager_id: String,
    pub manager_email: String,
    pub manager_name: String,
    pub dept_code: String,
    pub total_tasks: u64,
    pub pending_count: u64,
    pub overdue_count: u64,
    /// Whole percent of tasks no longer pending.
    pub completion_rate: u32,
    pub health_tier: HealthTier,
    pub direct_reports: u64,
}

/// Score every manager in the rollup, worst health first.
pub fn score_managers(
    snapshot: &Snapshot,
    today: NaiveDate,
    filter: &RollupFilter,
) -> RollupReport<ManagerAccountability> {
    let rollup = manager_rollup(snapshot, today, filter);

    let mut rows: Vec<ManagerAccountability> = rollup
        .rows
        .into_iter()
        .map(|m| {
            let direct_reports = snapshot
                .persons
                .iter()
                .filter(|p| p.reports_to(&m.manager_email))
                .count() as u64;
            ManagerAccountability {
                completion_rate: completion_rate(m.total_tasks, m.pending_count),
                health_tier: health_tier(m.overdue_count),
                direct_reports,
                manager_id: m.manager_id,
                manager_email: m.manager_email,
                manager_name: m.manager_name,
                dept_code: m.dept_code,
                total_tasks: m.total_tasks,
                pending_count: m.pending_count,
                overdue_count: m.overdue_count,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.health_tier
            .cmp(&a.health_tier)
            .then_with(|| b.overdue_count.cmp(&a.overdue_count))
            .then_with(|| a.manager_email.cmp(&b.manager_email))
    });

    RollupReport {
        rows,
        skipped_rows: rollup.skipped_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssignedTo, Role, TaskStatus};
    use crate::snapshot::builders::*;

    fn overdue(id: &str, manager: &str) -> crate::model::Task {
        task(id, "u1", manager, TaskStatus::Pending, Some("2026-01-01"), AssignedTo::Employee)
    }

    #[test]
    fn test_score_managers() {
        let mut employee = person("u1", Role::Employee, "ENG", "A", Some("m1"));
        employee.manager_email = Some("M1@Example.com".into());
        let snap = Snapshot {
            persons: vec![
                person("m1", Role::Manager, "ENG", "A", None),
                person("m2", Role::Manager, "OPS", "B", None),
                person("m3", Role::Manager, "OPS", "B", None),
                employee,
                person("u2", Role::Employee, "ENG", "A", Some("m1")),
                person("u3", Role::Employee, "OPS", "B", Some("m2")),
            ],
            tasks: vec![
                overdue("t1", "m1"),
                overdue("t2", "m1"),
                overdue("t3", "m1"),
                task("t4", "u1", "m1", TaskStatus::Completed, None, AssignedTo::Employee),
                overdue("t5", "m2"),
                task("t6", "u3", "m2", TaskStatus::InProgress, None, AssignedTo::Employee),
                task("t7", "u3", "m2", TaskStatus::Completed, None, AssignedTo::Employee),
            ],
            ..Default::default()
        };

        let report = score_managers(&snap, date("2026-02-01"), &RollupFilter::new());
        let ids: Vec<&str> = report.rows.iter().map(|r| r.manager_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);

        let m1 = &report.rows[0];
        assert_eq!(m1.health_tier, HealthTier::Critical);
        assert_eq!(m1.overdue_count, 3);
        assert_eq!(m1.completion_rate, 25);
        assert_eq!(m1.direct_reports, 2);

        let m2 = &report.rows[1];
        assert_eq!(m2.health_tier, HealthTier::AtRisk);
        assert_eq!(m2.completion_rate, 67);
        assert_eq!(m2.direct_reports, 1);

        let m3 = &report.rows[2];
        assert_eq!(m3.total_tasks, 0);
        assert_eq!(m3.completion_rate, 0);
        assert_eq!(m3.health_tier, HealthTier::Healthy);
        assert_eq!(m3.direct_reports, 0);
    }

    #[test]
    fn test_health_depends_on_today() {
        let snap = Snapshot {
            persons: vec![person("m1", Role::Manager, "ENG", "A", None)],
            tasks: vec![overdue("t1", "m1")],
            ..Default::default()
        };
        let before = score_managers(&snap, date("2026-01-01"), &RollupFilter::new());
        assert_eq!(before.rows[0].health_tier, HealthTier::Healthy);
        let after = score_managers(&snap, date("2026-01-02"), &RollupFilter::new());
        assert_eq!(after.rows[0].health_tier, HealthTier::AtRisk);
    }
}
