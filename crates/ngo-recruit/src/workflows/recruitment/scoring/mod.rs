//! Criterion scoring: maps one organization profile and one criterion to a bounded score.

mod completeness;
mod rules;

pub use rules::ScoringFault;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Criterion, EvaluationRecord, OrganizationProfile};

/// Score a profile against one criterion.
///
/// The result always lies in `[0, criterion.max_score]` and is rounded to two decimals.
/// A fault while computing the criterion scores zero for that criterion only.
pub fn score_criterion(profile: &OrganizationProfile, criterion: &Criterion) -> f64 {
    let raw = match rules::raw_score(profile, &criterion.code, criterion.max_score) {
        Ok(score) => score,
        Err(fault) => {
            warn!(
                criterion = %criterion.code,
                criterion_id = %criterion.id.0,
                error = %fault,
                "criterion scoring failed; recording zero"
            );
            0.0
        }
    };

    bound(raw, criterion.max_score)
}

fn bound(score: f64, max_score: f64) -> f64 {
    if !score.is_finite() || !max_score.is_finite() || max_score <= 0.0 {
        return 0.0;
    }

    round_to_cents(score.clamp(0.0, max_score)).min(max_score)
}

pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fresh evaluation records and their total for one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub records: Vec<EvaluationRecord>,
    pub total_score: f64,
}

/// Score every criterion in order and total the results.
pub fn evaluate_profile<'a, I>(profile: &OrganizationProfile, criteria: I) -> Evaluation
where
    I: IntoIterator<Item = &'a Criterion>,
{
    let records: Vec<EvaluationRecord> = criteria
        .into_iter()
        .map(|criterion| {
            let score = score_criterion(profile, criterion);
            debug!(criterion = %criterion.code, score, max_score = criterion.max_score, "criterion scored");
            EvaluationRecord {
                criterion_id: criterion.id.clone(),
                code: criterion.code.clone(),
                max_score: criterion.max_score,
                score,
            }
        })
        .collect();

    let total_score = total_of(&records);
    Evaluation {
        records,
        total_score,
    }
}

pub(crate) fn total_of(records: &[EvaluationRecord]) -> f64 {
    records.iter().map(|record| record.score).sum()
}
