use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationState, Campaign, CampaignId};
use super::repository::ApplicationRecord;

/// Counts reported after an auto-selection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub campaign_id: CampaignId,
    pub selected_count: usize,
    pub rejected_count: usize,
    pub total_evaluated: usize,
}

impl SelectionSummary {
    pub fn empty(campaign_id: CampaignId) -> Self {
        Self {
            campaign_id,
            selected_count: 0,
            rejected_count: 0,
            total_evaluated: 0,
        }
    }
}

pub(crate) struct SelectionPlan {
    pub selected: Vec<ApplicationRecord>,
    pub rejected: Vec<ApplicationRecord>,
}

impl SelectionPlan {
    pub fn summary(&self, campaign_id: CampaignId) -> SelectionSummary {
        SelectionSummary {
            campaign_id,
            selected_count: self.selected.len(),
            rejected_count: self.rejected.len(),
            total_evaluated: self.selected.len() + self.rejected.len(),
        }
    }

    pub fn into_records(self) -> Vec<ApplicationRecord> {
        let mut records = self.selected;
        records.extend(self.rejected);
        records
    }
}

/// True when the stored evaluation set no longer reflects the campaign criteria.
pub(crate) fn needs_rescoring(record: &ApplicationRecord, campaign: &Campaign) -> bool {
    let criteria = campaign.ordered_criteria();
    if record.evaluations.len() != criteria.len() {
        return true;
    }

    let mismatched = record
        .evaluations
        .iter()
        .zip(criteria)
        .any(|(evaluation, criterion)| {
            evaluation.criterion_id != criterion.id
                || evaluation.code != criterion.code
                || evaluation.max_score != criterion.max_score
        });

    mismatched || record.total_score != record.evaluation_sum()
}

/// Missing submission timestamps rank after present ones.
fn submitted_first(left: &ApplicationRecord, right: &ApplicationRecord) -> Ordering {
    match (left.submitted_at, right.submitted_at) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Descending total score; ties go to the earlier submission, then the lower id.
pub(crate) fn ranking_order(left: &ApplicationRecord, right: &ApplicationRecord) -> Ordering {
    right
        .total_score
        .total_cmp(&left.total_score)
        .then_with(|| submitted_first(left, right))
        .then_with(|| left.id.cmp(&right.id))
}

pub(crate) fn plan_selection(
    mut applications: Vec<ApplicationRecord>,
    max_selections: u32,
) -> SelectionPlan {
    applications.sort_by(ranking_order);

    let considered = applications.len();
    let cut = usize::try_from(max_selections)
        .unwrap_or(usize::MAX)
        .min(considered);
    let mut rejected = applications.split_off(cut);
    let mut selected = applications;

    for record in &mut selected {
        record.state = ApplicationState::Selected;
        record.rejection_reason = None;
    }
    for (offset, record) in rejected.iter_mut().enumerate() {
        record.state = ApplicationState::Rejected;
        record.rejection_reason = Some(format!(
            "ranked {} of {} with {:.2} points; campaign selects {}",
            cut + offset + 1,
            considered,
            record.total_score,
            max_selections
        ));
    }

    SelectionPlan { selected, rejected }
}
