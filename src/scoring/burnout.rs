use std::collections::HashMap;

use serde::Serialize;

use crate::metrics::primitives::{drop_percentage, percent, risk_tier, RiskTier};
use crate::model::{Person, Submission};
use crate::query::filter::RollupFilter;
use crate::query::period::PeriodToken;
use crate::snapshot::Snapshot;

/// A person whose sentiment fell enough between their two latest scored
/// submissions to warrant attention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurnoutRisk {
    pub person_id: String,
    pub email: String,
    pub display_name: String,
    pub dept_code: String,
    pub current_period: PeriodToken,
    pub previous_period: PeriodToken,
    pub current_sentiment: f64,
    pub previous_sentiment: f64,
    /// Relative drop as a whole percent.
    pub drop_percentage: i64,
    pub risk_tier: RiskTier,
    #[serde(skip)]
    drop: f64,
}

/// Compare a person's two most recent scored submissions.
///
/// Returns `None` with fewer than two scored submissions or when the drop
/// rates as Low.
pub fn assess_person(person: &Person, submissions: &[&Submission]) -> Option<BurnoutRisk> {
    let mut scored: Vec<(&Submission, f64)> = submissions
        .iter()
        .filter_map(|s| s.ai_sentiment.map(|v| (*s, v)))
        .collect();
    if scored.len() < 2 {
        return None;
    }
    scored.sort_by(|(a, _), (b, _)| {
        b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    });

    let (current, current_sentiment) = scored[0];
    let (previous, previous_sentiment) = scored[1];
    let drop = drop_percentage(previous_sentiment, current_sentiment);
    let tier = risk_tier(drop);
    if tier == RiskTier::Low {
        return None;
    }

    Some(BurnoutRisk {
        person_id: person.id.clone(),
        email: person.email.clone(),
        display_name: person.full_name(),
        dept_code: person.dept_code.clone(),
        current_period: current.period,
        previous_period: previous.period,
        current_sentiment,
        previous_sentiment,
        drop_percentage: percent(drop),
        risk_tier: tier,
        drop,
    })
}

/// Medium and High burnout risks across every person passing `filter`,
/// largest drop first.
pub fn detect_burnout_risks(snapshot: &Snapshot, filter: &RollupFilter) -> Vec<BurnoutRisk> {
    let mut by_user: HashMap<&str, Vec<&Submission>> = HashMap::new();
    for s in &snapshot.submissions {
        by_user.entry(s.user_id.as_str()).or_default().push(s);
    }

    let mut risks: Vec<BurnoutRisk> = snapshot
        .persons
        .iter()
        .filter(|p| filter.matches_person(p))
        .filter_map(|p| {
            let subs = by_user.get(p.id.as_str())?;
            assess_person(p, subs)
        })
        .collect();

    risks.sort_by(|a, b| {
        b.drop
            .total_cmp(&a.drop)
            .then_with(|| a.email.cmp(&b.email))
    });
    log::debug!("Detected {} burnout risks", risks.len());
    risks
}
