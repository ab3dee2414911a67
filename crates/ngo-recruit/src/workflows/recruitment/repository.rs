use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationState, Campaign, CampaignId, CampaignState, EvaluationRecord,
    OrganizationProfile,
};
use super::scoring::total_of;

/// Repository record holding the organization profile, lifecycle state, and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub campaign_id: CampaignId,
    pub profile: OrganizationProfile,
    pub state: ApplicationState,
    pub submitted_at: Option<DateTime<Utc>>,
    pub evaluations: Vec<EvaluationRecord>,
    pub total_score: f64,
    pub rejection_reason: Option<String>,
}

impl ApplicationRecord {
    pub fn draft(id: ApplicationId, campaign_id: CampaignId, profile: OrganizationProfile) -> Self {
        Self {
            id,
            campaign_id,
            profile,
            state: ApplicationState::Draft,
            submitted_at: None,
            evaluations: Vec::new(),
            total_score: 0.0,
            rejection_reason: None,
        }
    }

    pub fn evaluation_sum(&self) -> f64 {
        total_of(&self.evaluations)
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            campaign_id: self.campaign_id.clone(),
            organization: self.profile.name.clone(),
            status: self.state.label(),
            submitted_at: self.submitted_at,
            total_score: (!self.evaluations.is_empty()).then_some(self.total_score),
            rejection_reason: self.rejection_reason.clone(),
        }
    }
}

/// Persistence capability consumed by the recruitment service.
///
/// `commit_selection` must apply the campaign and every application write as one unit.
pub trait RecruitmentRepository: Send + Sync {
    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn applications_for_campaign(
        &self,
        campaign_id: &CampaignId,
        state: Option<ApplicationState>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;

    fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError>;
    fn update_campaign(&self, campaign: Campaign) -> Result<(), RepositoryError>;
    fn fetch_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError>;
    fn campaigns_in_state(&self, state: CampaignState) -> Result<Vec<Campaign>, RepositoryError>;

    fn commit_selection(
        &self,
        campaign: Campaign,
        applications: Vec<ApplicationRecord>,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (e-mail, chatter, webhooks). Delivery is best-effort.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Notification payload handed to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub campaign_id: CampaignId,
    pub organization: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}
