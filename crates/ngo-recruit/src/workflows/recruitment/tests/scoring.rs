use super::common::*;
use crate::workflows::recruitment::domain::{
    ActivityDomain, CriterionCode, DocumentRef, DocumentSet,
};
use crate::workflows::recruitment::scoring::{evaluate_profile, score_criterion};

fn certificate() -> DocumentRef {
    DocumentRef {
        file_name: "certificate.pdf".to_string(),
        storage_key: "ngo-docs/certificate.pdf".to_string(),
    }
}

#[test]
fn experience_of_seven_years_scores_eighty_percent() {
    let mut profile = profile();
    profile.years_experience = 7;

    let score = score_criterion(&profile, &criterion("exp", "experience", 20.0, 1));
    assert_eq!(score, 16.0);
}

#[test]
fn budget_between_bands_uses_lower_band() {
    let mut profile = profile();
    profile.annual_budget = 750_000.0;

    let score = score_criterion(&profile, &criterion("budget", "budget", 20.0, 1));
    assert_eq!(score, 16.0);
}

#[test]
fn staff_counts_employees_and_volunteers_together() {
    let mut profile = profile();
    profile.staff_count = 4;
    profile.volunteer_count = 16;

    let score = score_criterion(&profile, &criterion("staff", "staff", 10.0, 1));
    assert_eq!(score, 6.0);
}

#[test]
fn two_of_three_documents_score_two_thirds() {
    let score = score_criterion(&profile(), &criterion("docs", "documents", 15.0, 1));
    assert_eq!(score, 10.0);
}

#[test]
fn single_document_rounds_to_cents() {
    let mut profile = profile();
    profile.documents = DocumentSet {
        statute: None,
        registration_certificate: Some(certificate()),
        financial_report: None,
    };

    let score = score_criterion(&profile, &criterion("docs", "documents", 10.0, 1));
    assert_eq!(score, 3.33);
}

#[test]
fn unknown_code_scores_half_of_maximum() {
    let criterion = criterion("impact", "community_impact", 10.0, 1);
    assert_eq!(
        criterion.code,
        CriterionCode::Custom("community_impact".to_string())
    );

    assert_eq!(score_criterion(&profile(), &criterion), 5.0);
}

#[test]
fn activity_domain_count_follows_bands() {
    let mut profile = profile();
    let criterion = criterion("domains", "activity_domains", 10.0, 1);
    assert_eq!(score_criterion(&profile, &criterion), 7.0);

    profile
        .activity_domains
        .insert(ActivityDomain("water".to_string()));
    assert_eq!(score_criterion(&profile, &criterion), 10.0);

    profile.activity_domains.clear();
    assert_eq!(score_criterion(&profile, &criterion), 0.0);
}

#[test]
fn complete_profile_is_fully_filled() {
    let score = score_criterion(&profile(), &criterion("fill", "completeness", 15.0, 1));
    assert_eq!(score, 15.0);
}

#[test]
fn empty_profile_reaches_no_filled_weight() {
    let score = score_criterion(&empty_profile(), &criterion("fill", "completeness", 15.0, 1));
    assert_eq!(score, 0.0);
}

#[test]
fn zero_years_do_not_count_toward_completeness() {
    let mut profile = profile();
    profile.years_experience = 0;

    // 20.5 of 22.5 weight filled.
    let score = score_criterion(&profile, &criterion("fill", "completeness", 22.5, 1));
    assert_eq!(score, 20.5);
}

#[test]
fn relational_fields_fill_the_remaining_weight() {
    let mut profile = empty_profile();
    profile.country = Some("KE".to_string());
    profile
        .activity_domains
        .insert(ActivityDomain("health".to_string()));

    let score = score_criterion(&profile, &criterion("fill", "completeness", 22.5, 1));
    assert_eq!(score, 3.5);
}

#[test]
fn scores_stay_within_bounds_for_hostile_inputs() {
    let mut negative = empty_profile();
    negative.years_experience = -3;
    negative.staff_count = -40;
    negative.volunteer_count = i64::MIN;
    negative.annual_budget = -250_000.0;

    let mut overflowing = profile();
    overflowing.staff_count = i64::MAX;
    overflowing.volunteer_count = i64::MAX;
    overflowing.annual_budget = f64::MAX;

    let mut non_finite = profile();
    non_finite.annual_budget = f64::NAN;

    let codes = [
        "experience",
        "budget",
        "staff",
        "documents",
        "completeness",
        "activity_domains",
        "mystery",
    ];

    for profile in [negative, overflowing, non_finite, empty_profile()] {
        for code in codes {
            for max_score in [0.01, 1.0, 15.0, 1_000.0] {
                let score = score_criterion(&profile, &criterion("c", code, max_score, 1));
                assert!(
                    score.is_finite() && (0.0..=max_score).contains(&score),
                    "{code} scored {score} against max {max_score}"
                );
            }
        }
    }
}

#[test]
fn non_finite_budget_scores_zero_instead_of_failing() {
    let mut profile = profile();
    profile.annual_budget = f64::INFINITY;

    assert_eq!(
        score_criterion(&profile, &criterion("budget", "budget", 20.0, 1)),
        0.0
    );
}

#[test]
fn invalid_max_scores_yield_zero() {
    for max_score in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let score = score_criterion(&profile(), &criterion("exp", "experience", max_score, 1));
        assert_eq!(score, 0.0, "max score {max_score}");
    }
}

#[test]
fn evaluation_total_equals_sum_of_records() {
    let campaign = campaign("cmp-sum", 3, standard_criteria());
    let evaluation = evaluate_profile(&profile(), campaign.ordered_criteria());

    assert_eq!(evaluation.records.len(), 6);
    let sum: f64 = evaluation.records.iter().map(|record| record.score).sum();
    assert_eq!(evaluation.total_score, sum);
    assert_eq!(evaluation.total_score, 79.5);
}

#[test]
fn evaluation_follows_criterion_sequence() {
    let criteria = vec![
        criterion("crit-b", "budget", 20.0, 20),
        criterion("crit-a", "experience", 20.0, 10),
        criterion("crit-c", "staff", 20.0, 10),
    ];
    let campaign = campaign("cmp-order", 1, criteria);

    let evaluation = evaluate_profile(&profile(), campaign.ordered_criteria());
    let ids: Vec<&str> = evaluation
        .records
        .iter()
        .map(|record| record.criterion_id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["crit-a", "crit-c", "crit-b"]);
}

#[test]
fn scoring_is_deterministic() {
    let campaign = campaign("cmp-repeat", 1, standard_criteria());
    let first = evaluate_profile(&profile(), campaign.ordered_criteria());
    let second = evaluate_profile(&profile(), campaign.ordered_criteria());
    assert_eq!(first, second);
}
