use std::collections::HashMap;

use serde::Serialize;

use super::domain::{ApplicationState, CampaignId};
use super::repository::ApplicationRecord;

/// Score bucket upper bounds (inclusive) used by dashboard histograms.
const SCORE_BUCKETS: [(f64, &str); 5] = [
    (20.0, "0-20"),
    (40.0, "21-40"),
    (60.0, "41-60"),
    (80.0, "61-80"),
    (100.0, "81-100"),
];
const OVERFLOW_BUCKET: &str = "100+";
const TOP_BREAKDOWN_LEN: usize = 5;
const UNSPECIFIED_COUNTRY: &str = "unspecified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Application count for one country or activity domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Per-campaign counters, score distribution, and the most common countries and domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignStatistics {
    pub campaign_id: CampaignId,
    pub total_applications: usize,
    pub draft_applications: usize,
    pub pending_applications: usize,
    pub selected_applications: usize,
    pub rejected_applications: usize,
    pub score_distribution: Vec<ScoreBucket>,
    pub top_countries: Vec<LabelCount>,
    pub top_activity_domains: Vec<LabelCount>,
}

impl CampaignStatistics {
    pub fn from_records(campaign_id: CampaignId, records: &[ApplicationRecord]) -> Self {
        let count_in = |states: &[ApplicationState]| {
            records
                .iter()
                .filter(|record| states.contains(&record.state))
                .count()
        };

        Self {
            campaign_id,
            total_applications: records.len(),
            draft_applications: count_in(&[ApplicationState::Draft]),
            pending_applications: count_in(&[
                ApplicationState::Submitted,
                ApplicationState::UnderReview,
            ]),
            selected_applications: count_in(&[ApplicationState::Selected]),
            rejected_applications: count_in(&[ApplicationState::Rejected]),
            score_distribution: score_distribution(records),
            top_countries: top_labels(records.iter().map(|record| {
                record
                    .profile
                    .country
                    .clone()
                    .unwrap_or_else(|| UNSPECIFIED_COUNTRY.to_string())
            })),
            top_activity_domains: top_labels(records.iter().flat_map(|record| {
                record
                    .profile
                    .activity_domains
                    .iter()
                    .map(|domain| domain.0.clone())
            })),
        }
    }
}

fn bucket_label(score: f64) -> &'static str {
    SCORE_BUCKETS
        .iter()
        .find(|(upper, _)| score <= *upper)
        .map(|(_, label)| *label)
        .unwrap_or(OVERFLOW_BUCKET)
}

fn score_distribution(records: &[ApplicationRecord]) -> Vec<ScoreBucket> {
    let mut buckets: Vec<ScoreBucket> = SCORE_BUCKETS
        .iter()
        .map(|(_, label)| *label)
        .chain(std::iter::once(OVERFLOW_BUCKET))
        .map(|label| ScoreBucket { label, count: 0 })
        .collect();

    for record in records {
        let label = bucket_label(record.total_score);
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.label == label) {
            bucket.count += 1;
        }
    }

    buckets
}

/// Count descending, then label ascending, capped at five entries.
fn top_labels(labels: impl Iterator<Item = String>) -> Vec<LabelCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }

    let mut ranked: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.label.cmp(&right.label))
    });
    ranked.truncate(TOP_BREAKDOWN_LEN);
    ranked
}
