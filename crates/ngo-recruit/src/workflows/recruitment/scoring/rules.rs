use super::super::domain::{CriterionCode, DocumentSet, OrganizationProfile};
use super::completeness::fill_ratio;

/// Internal failure while computing one criterion. Contained by the scorer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringFault {
    #[error("criterion max score must be positive and finite, found {0}")]
    InvalidMaxScore(f64),
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
}

const EXPERIENCE_BANDS: &[(i64, f64)] = &[(10, 1.0), (5, 0.8), (3, 0.6), (1, 0.4)];

const BUDGET_BANDS: &[(f64, f64)] = &[
    (1_000_000.0, 1.0),
    (500_000.0, 0.8),
    (100_000.0, 0.6),
    (50_000.0, 0.4),
    (10_000.0, 0.2),
];

const STAFF_BANDS: &[(i64, f64)] = &[(100, 1.0), (50, 0.8), (20, 0.6), (10, 0.4), (5, 0.2)];

const DOMAIN_BANDS: &[(usize, f64)] = &[(3, 1.0), (2, 0.7), (1, 0.5)];

const CUSTOM_FRACTION: f64 = 0.5;

/// First band whose threshold the value reaches. Bands are sorted high to low.
fn band_fraction<T: PartialOrd + Copy>(value: T, bands: &[(T, f64)]) -> f64 {
    bands
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(_, fraction)| *fraction)
        .unwrap_or(0.0)
}

pub(super) fn raw_score(
    profile: &OrganizationProfile,
    code: &CriterionCode,
    max_score: f64,
) -> Result<f64, ScoringFault> {
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err(ScoringFault::InvalidMaxScore(max_score));
    }

    let fraction = match code {
        CriterionCode::Experience => band_fraction(profile.years_experience, EXPERIENCE_BANDS),
        CriterionCode::Budget => {
            if !profile.annual_budget.is_finite() {
                return Err(ScoringFault::NonFinite {
                    field: "annual_budget",
                });
            }
            band_fraction(profile.annual_budget, BUDGET_BANDS)
        }
        CriterionCode::Staff => {
            let headcount = profile.staff_count.saturating_add(profile.volunteer_count);
            band_fraction(headcount, STAFF_BANDS)
        }
        CriterionCode::Documents => {
            profile.documents.provided() as f64 / DocumentSet::SLOTS as f64
        }
        CriterionCode::Completeness => fill_ratio(profile),
        CriterionCode::ActivityDomains => {
            band_fraction(profile.activity_domains.len(), DOMAIN_BANDS)
        }
        CriterionCode::Custom(_) => CUSTOM_FRACTION,
    };

    Ok(fraction * max_score)
}
