use chrono::{DateTime, Duration, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use ngo_recruit::workflows::recruitment::{
    ApplicationId, ApplicationRecord, ApplicationState, Campaign, CampaignId, CampaignState,
    Criterion, CriterionCode, CriterionId, Notification, NotificationError,
    NotificationPublisher, RecruitmentRepository, RepositoryError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

pub(crate) const SAMPLE_CAMPAIGN_ID: &str = "partners-2025";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRecruitmentRepository {
    applications: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    campaigns: Arc<Mutex<HashMap<CampaignId, Campaign>>>,
}

impl RecruitmentRepository for InMemoryRecruitmentRepository {
    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn applications_for_campaign(
        &self,
        campaign_id: &CampaignId,
        state: Option<ApplicationState>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        let mut records: Vec<ApplicationRecord> = guard
            .values()
            .filter(|record| &record.campaign_id == campaign_id)
            .filter(|record| state.map_or(true, |state| record.state == state))
            .cloned()
            .collect();
        records.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(records)
    }

    fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError> {
        let mut guard = self.campaigns.lock().expect("repository mutex poisoned");
        if guard.contains_key(&campaign.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(campaign.id.clone(), campaign.clone());
        Ok(campaign)
    }

    fn update_campaign(&self, campaign: Campaign) -> Result<(), RepositoryError> {
        let mut guard = self.campaigns.lock().expect("repository mutex poisoned");
        if guard.contains_key(&campaign.id) {
            guard.insert(campaign.id.clone(), campaign);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let guard = self.campaigns.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn campaigns_in_state(&self, state: CampaignState) -> Result<Vec<Campaign>, RepositoryError> {
        let guard = self.campaigns.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|campaign| campaign.state == state)
            .cloned()
            .collect())
    }

    /// Both maps are locked for the whole write so readers never see a partial selection.
    fn commit_selection(
        &self,
        campaign: Campaign,
        applications: Vec<ApplicationRecord>,
    ) -> Result<(), RepositoryError> {
        let mut campaigns = self.campaigns.lock().expect("repository mutex poisoned");
        let mut records = self.applications.lock().expect("repository mutex poisoned");

        if !campaigns.contains_key(&campaign.id)
            || applications
                .iter()
                .any(|record| !records.contains_key(&record.id))
        {
            return Err(RepositoryError::NotFound);
        }

        campaigns.insert(campaign.id.clone(), campaign);
        for record in applications {
            records.insert(record.id.clone(), record);
        }
        Ok(())
    }
}

/// Logs every notification and keeps a copy for inspection.
#[derive(Default, Clone)]
pub(crate) struct TracingNotificationPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for TracingNotificationPublisher {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            application_id = %notification.application_id,
            "notification queued"
        );
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl TracingNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

fn criterion(code: &str, name: &str, max_score: f64, sequence: i32) -> Criterion {
    Criterion {
        id: CriterionId(format!("crit-{code}")),
        name: name.to_string(),
        code: CriterionCode::parse(code),
        max_score,
        sequence,
    }
}

/// Built-in criterion set worth 100 points.
pub(crate) fn default_criteria() -> Vec<Criterion> {
    vec![
        criterion("experience", "Years of field experience", 20.0, 10),
        criterion("budget", "Annual budget", 20.0, 20),
        criterion("staff", "Staff and volunteers", 15.0, 30),
        criterion("documents", "Supporting documents", 15.0, 40),
        criterion("completeness", "Profile completeness", 15.0, 50),
        criterion("activity_domains", "Activity domains", 15.0, 60),
    ]
}

pub(crate) fn sample_campaign(
    opens_at: DateTime<Utc>,
    open_for: Duration,
    max_selections: u32,
) -> Campaign {
    Campaign {
        id: CampaignId(SAMPLE_CAMPAIGN_ID.to_string()),
        name: "Community partners 2025".to_string(),
        start_date: opens_at,
        end_date: opens_at + open_for,
        max_selections,
        state: CampaignState::Open,
        auto_selection: true,
        criteria: default_criteria(),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("'{raw}' has no midnight"))
}
