use super::super::domain::OrganizationProfile;

const REQUIRED_WEIGHT: f64 = 2.0;
const IMPORTANT_WEIGHT: f64 = 1.5;
const OPTIONAL_WEIGHT: f64 = 1.0;

const COUNTRY_WEIGHT: f64 = 1.5;
const DOMAINS_WEIGHT: f64 = 2.0;
/// Denominator share of the two relational fields, counted whether or not they are filled.
const RELATIONAL_WEIGHT: f64 = COUNTRY_WEIGHT + DOMAINS_WEIGHT;

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn has_optional_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(has_text)
}

/// Weighted share of tracked profile fields that carry a value, in `[0, 1]`.
pub(super) fn fill_ratio(profile: &OrganizationProfile) -> f64 {
    let tracked = [
        (has_text(&profile.name), REQUIRED_WEIGHT),
        (has_text(&profile.email), REQUIRED_WEIGHT),
        (has_text(&profile.registration_number), REQUIRED_WEIGHT),
        (has_text(&profile.main_activities), REQUIRED_WEIGHT),
        (profile.years_experience > 0, REQUIRED_WEIGHT),
        (has_optional_text(&profile.phone), IMPORTANT_WEIGHT),
        (has_optional_text(&profile.city), IMPORTANT_WEIGHT),
        (has_optional_text(&profile.funding_sources), IMPORTANT_WEIGHT),
        (has_optional_text(&profile.previous_projects), IMPORTANT_WEIGHT),
        (has_optional_text(&profile.website), OPTIONAL_WEIGHT),
        (has_optional_text(&profile.street), OPTIONAL_WEIGHT),
        (has_optional_text(&profile.references), OPTIONAL_WEIGHT),
    ];

    let mut total_weight = RELATIONAL_WEIGHT;
    let mut filled_weight = 0.0;
    for (filled, weight) in tracked {
        total_weight += weight;
        if filled {
            filled_weight += weight;
        }
    }

    if has_optional_text(&profile.country) {
        filled_weight += COUNTRY_WEIGHT;
    }
    if !profile.activity_domains.is_empty() {
        filled_weight += DOMAINS_WEIGHT;
    }

    filled_weight / total_weight
}
