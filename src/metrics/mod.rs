pub mod primitives;
pub mod types;

pub use types::*;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::{Recognition, Role, Submission, TaskStatus};
use crate::query::filter::{GroupBy, RollupFilter};
use crate::query::period::{last_n_periods, PeriodToken};
use crate::snapshot::Snapshot;
use primitives::{is_overdue, mean};

/// Running totals for a set of submissions.
#[derive(Debug, Default)]
struct SubmissionAcc<'a> {
    sat_scores: Vec<f64>,
    sentiments: Vec<f64>,
    submitters: HashSet<&'a str>,
}

impl<'a> SubmissionAcc<'a> {
    fn add(&mut self, s: &'a Submission) {
        self.sat_scores.push(s.sat_score as f64);
        if let Some(sentiment) = s.ai_sentiment {
            self.sentiments.push(sentiment);
        }
        self.submitters.insert(&s.user_id);
    }

    fn count(&self) -> u64 {
        self.sat_scores.len() as u64
    }
}

/// Submissions passing `filter`, each paired with its submitter's group key.
/// Returns the pairs and the number of submissions whose submitter is unknown.
fn joined_submissions<'a>(
    snapshot: &'a Snapshot,
    group_by: Option<GroupBy>,
    filter: &RollupFilter,
) -> (Vec<(&'a str, &'a Submission)>, u64) {
    let persons = snapshot.persons_by_id();
    let mut skipped = 0;
    let mut joined = Vec::new();
    for s in snapshot
        .submissions
        .iter()
        .filter(|s| filter.matches_period(&s.period))
    {
        let Some(&person) = persons.get(s.user_id.as_str()) else {
            log::debug!("Submission {} references unknown user {}", s.id, s.user_id);
            skipped += 1;
            continue;
        };
        if !filter.matches_person(person) {
            continue;
        }
        let key = group_by.map_or("", |g| g.key_of(person));
        joined.push((key, s));
    }
    (joined, skipped)
}

/// Satisfaction and participation per group and period.
pub fn group_rollup(
    snapshot: &Snapshot,
    group_by: GroupBy,
    filter: &RollupFilter,
) -> RollupReport<GroupRollup> {
    let (joined, skipped_rows) = joined_submissions(snapshot, Some(group_by), filter);

    let mut groups: BTreeMap<(&str, PeriodToken), SubmissionAcc> = BTreeMap::new();
    for (key, s) in joined {
        groups.entry((key, s.period)).or_default().add(s);
    }

    let rows = groups
        .into_iter()
        .map(|((key, period), acc)| GroupRollup {
            group_key: key.to_string(),
            period,
            avg_sat_score: mean(acc.sat_scores.iter().copied()),
            avg_sentiment: mean(acc.sentiments.iter().copied()),
            total_feedback_count: acc.count(),
            distinct_submitter_count: acc.submitters.len() as u64,
        })
        .collect();

    RollupReport { rows, skipped_rows }
}

/// Compare each group's average satisfaction in `current` with `comparison`.
/// Groups present in only one of the two periods get no delta.
pub fn group_trend(
    snapshot: &Snapshot,
    group_by: GroupBy,
    current: PeriodToken,
    comparison: PeriodToken,
    filter: &RollupFilter,
) -> RollupReport<GroupTrend> {
    let now = group_rollup(snapshot, group_by, &filter.clone().period(current));
    let then = group_rollup(snapshot, group_by, &filter.clone().period(comparison));

    let mut by_group: BTreeMap<String, (Option<GroupRollup>, Option<GroupRollup>)> =
        BTreeMap::new();
    for row in now.rows {
        let key = row.group_key.clone();
        by_group.entry(key).or_default().0 = Some(row);
    }
    for row in then.rows {
        let key = row.group_key.clone();
        by_group.entry(key).or_default().1 = Some(row);
    }

    let rows = by_group
        .into_iter()
        .map(|(group_key, (cur, cmp))| {
            let current_avg = cur.as_ref().map(|r| r.avg_sat_score);
            let comparison_avg = cmp.as_ref().map(|r| r.avg_sat_score);
            GroupTrend {
                group_key,
                current_period: current,
                comparison_period: comparison,
                current_avg_sat_score: current_avg,
                comparison_avg_sat_score: comparison_avg,
                current_feedback_count: cur.map_or(0, |r| r.total_feedback_count),
                comparison_feedback_count: cmp.map_or(0, |r| r.total_feedback_count),
                delta: current_avg.zip(comparison_avg).map(|(c, p)| c - p),
            }
        })
        .collect();

    RollupReport {
        rows,
        skipped_rows: now.skipped_rows + then.skipped_rows,
    }
}

/// Organisation-wide (or filtered) averages for the `months` periods ending
/// at `end`, oldest first. Always exactly `months` points; a window reaching
/// before `Jan-0000` is an error.
pub fn trend_series(
    snapshot: &Snapshot,
    end: PeriodToken,
    months: u32,
    filter: &RollupFilter,
) -> Result<RollupReport<SeriesPoint>> {
    let periods = last_n_periods(&end, months)?;
    let wanted: HashSet<PeriodToken> = periods.iter().copied().collect();
    let (joined, skipped_rows) = joined_submissions(snapshot, None, &filter.clone().without_period());

    let mut by_period: HashMap<PeriodToken, SubmissionAcc> = HashMap::new();
    for (_, s) in joined.into_iter().filter(|(_, s)| wanted.contains(&s.period)) {
        by_period.entry(s.period).or_default().add(s);
    }

    let rows = periods
        .into_iter()
        .map(|period| match by_period.get(&period) {
            Some(acc) => SeriesPoint {
                period,
                avg_sat_score: Some(mean(acc.sat_scores.iter().copied())),
                avg_sentiment: (!acc.sentiments.is_empty())
                    .then(|| mean(acc.sentiments.iter().copied())),
                feedback_count: acc.count(),
            },
            None => SeriesPoint {
                period,
                avg_sat_score: None,
                avg_sentiment: None,
                feedback_count: 0,
            },
        })
        .collect();

    Ok(RollupReport { rows, skipped_rows })
}

/// Task counts per manager, with overdue evaluated against `today`.
///
/// Every Manager/SeniorMgmt person passing the filter appears, even with no
/// tasks; other people appear once a task names them as manager.
pub fn manager_rollup(
    snapshot: &Snapshot,
    today: NaiveDate,
    filter: &RollupFilter,
) -> RollupReport<ManagerRollup> {
    let by_email = snapshot.persons_by_email();
    let mut managers: BTreeMap<String, ManagerRollup> = BTreeMap::new();

    let empty_row = |p: &crate::model::Person| ManagerRollup {
        manager_id: p.id.clone(),
        manager_email: p.email.clone(),
        manager_name: p.full_name(),
        dept_code: p.dept_code.clone(),
        total_tasks: 0,
        pending_count: 0,
        overdue_count: 0,
    };

    for p in snapshot
        .persons
        .iter()
        .filter(|p| matches!(p.role, Role::Manager | Role::SeniorMgmt))
        .filter(|p| filter.matches_person(p))
    {
        managers.insert(p.email.to_ascii_lowercase(), empty_row(p));
    }

    let mut skipped_rows = 0;
    for task in &snapshot.tasks {
        let key = task.manager_email.to_ascii_lowercase();
        let Some(&manager) = by_email.get(&key) else {
            log::debug!("Task {} references unknown manager {}", task.id, task.manager_email);
            skipped_rows += 1;
            continue;
        };
        if !filter.matches_person(manager) {
            continue;
        }
        let row = managers.entry(key).or_insert_with(|| empty_row(manager));
        row.total_tasks += 1;
        if task.status == TaskStatus::Pending {
            row.pending_count += 1;
        }
        if is_overdue(task.status, task.due_date, today) {
            row.overdue_count += 1;
        }
    }

    RollupReport {
        rows: managers.into_values().collect(),
        skipped_rows,
    }
}

/// Survey and action-item aggregates for every Employee and Manager.
pub fn employee_performance(
    snapshot: &Snapshot,
    filter: &RollupFilter,
) -> RollupReport<EmployeePerformance> {
    let mut submissions: HashMap<&str, Vec<&Submission>> = HashMap::new();
    for s in snapshot
        .submissions
        .iter()
        .filter(|s| filter.matches_period(&s.period))
    {
        submissions.entry(s.user_id.as_str()).or_default().push(s);
    }

    let by_email = snapshot.persons_by_email();
    let mut actions: HashMap<&str, (u64, u64)> = HashMap::new();
    let mut skipped_rows = 0;
    for task in &snapshot.tasks {
        let Some(&assignee) = by_email.get(&task.assignee_email().to_ascii_lowercase()) else {
            log::debug!("Task {} references unknown assignee {}", task.id, task.assignee_email());
            skipped_rows += 1;
            continue;
        };
        let (pending, total) = actions.entry(assignee.id.as_str()).or_default();
        *total += 1;
        if task.status != TaskStatus::Completed {
            *pending += 1;
        }
    }

    let rows = snapshot
        .persons
        .iter()
        .filter(|p| matches!(p.role, Role::Employee | Role::Manager))
        .filter(|p| filter.matches_person(p))
        .map(|p| {
            let subs = submissions.get(p.id.as_str()).map_or(&[][..], |v| v.as_slice());
            let latest = subs
                .iter()
                .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            let (pending, total) = actions.get(p.id.as_str()).copied().unwrap_or_default();

            EmployeePerformance {
                person_id: p.id.clone(),
                email: p.email.clone(),
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                role: p.role,
                dept_code: p.dept_code.clone(),
                project_code: p.project_code.clone(),
                avg_sentiment: mean(subs.iter().filter_map(|s| s.ai_sentiment)),
                latest_sentiment: latest.and_then(|s| s.ai_sentiment).unwrap_or(0.0),
                avg_sat_score: mean(subs.iter().map(|s| s.sat_score as f64)),
                latest_sat_score: latest.map_or(0, |s| s.sat_score),
                latest_mood_label: latest.map(|s| s.mood_label),
                avg_workload: mean(subs.iter().map(|s| s.workload_level as f64)),
                avg_work_life_balance: mean(subs.iter().map(|s| s.work_life_balance as f64)),
                total_feedback_count: subs.len() as u64,
                pending_action_count: pending,
                total_action_count: total,
            }
        })
        .collect();

    RollupReport { rows, skipped_rows }
}

/// Recognitions created within `[start, end]` (inclusive, by date), counted
/// per person chosen by `key`. Records for which `key` is `None` are ignored.
fn tally_by<'a>(
    snapshot: &'a Snapshot,
    start: NaiveDate,
    end: NaiveDate,
    key: impl Fn(&'a Recognition) -> Option<&'a str>,
) -> RollupReport<RecognitionTally> {
    let persons = snapshot.persons_by_id();
    let mut tallies: BTreeMap<&str, RecognitionTally> = BTreeMap::new();
    let mut skipped_rows = 0;

    for r in &snapshot.recognitions {
        let day = r.created_at.date_naive();
        if day < start || day > end {
            continue;
        }
        let Some(user_id) = key(r) else {
            continue;
        };
        let Some(&person) = persons.get(user_id) else {
            log::debug!("Recognition {} references unknown user {user_id}", r.id);
            skipped_rows += 1;
            continue;
        };
        let tally = tallies.entry(user_id).or_insert_with(|| RecognitionTally {
            user_id: person.id.clone(),
            display_name: person.full_name(),
            dept_code: person.dept_code.clone(),
            kudos_count: 0,
            value_tags: BTreeMap::new(),
        });
        tally.kudos_count += 1;
        *tally.value_tags.entry(r.value_tag.clone()).or_default() += 1;
    }

    RollupReport {
        rows: tallies.into_values().collect(),
        skipped_rows,
    }
}

/// Kudos received per person within `[start, end]`.
pub fn recognition_tally(
    snapshot: &Snapshot,
    start: NaiveDate,
    end: NaiveDate,
) -> RollupReport<RecognitionTally> {
    tally_by(snapshot, start, end, |r| Some(r.receiver_user_id.as_str()))
}

/// Kudos given per person within `[start, end]`. Anonymous recognitions are
/// never credited to their giver.
pub fn giver_tally(
    snapshot: &Snapshot,
    start: NaiveDate,
    end: NaiveDate,
) -> RollupReport<RecognitionTally> {
    tally_by(snapshot, start, end, |r| {
        (!r.is_anonymous).then_some(r.giver_user_id.as_str())
    })
}
