use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::recruitment::clock::FixedClock;
use crate::workflows::recruitment::domain::{
    ActivityDomain, ApplicationForm, ApplicationId, ApplicationState, Campaign, CampaignId,
    CampaignState, Criterion, CriterionCode, CriterionId, DocumentRef, DocumentSet, LegalStatus,
    OrganizationProfile,
};
use crate::workflows::recruitment::intake::IntakeGuard;
use crate::workflows::recruitment::repository::{
    ApplicationRecord, Notification, NotificationError, NotificationPublisher,
    RecruitmentRepository, RepositoryError,
};
use crate::workflows::recruitment::service::RecruitmentService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn criterion(id: &str, code: &str, max_score: f64, sequence: i32) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        name: id.replace('_', " "),
        code: CriterionCode::parse(code),
        max_score,
        sequence,
    }
}

/// Six built-in criteria adding up to 100 points.
pub(super) fn standard_criteria() -> Vec<Criterion> {
    vec![
        criterion("crit-experience", "experience", 20.0, 10),
        criterion("crit-budget", "budget", 20.0, 20),
        criterion("crit-staff", "staff", 15.0, 30),
        criterion("crit-documents", "documents", 15.0, 40),
        criterion("crit-completeness", "completeness", 15.0, 50),
        criterion("crit-domains", "activity_domains", 15.0, 60),
    ]
}

pub(super) fn campaign(id: &str, max_selections: u32, criteria: Vec<Criterion>) -> Campaign {
    Campaign {
        id: CampaignId(id.to_string()),
        name: format!("Partnership round {id}"),
        start_date: now() - Duration::days(30),
        end_date: now() + Duration::days(30),
        max_selections,
        state: CampaignState::Open,
        auto_selection: true,
        criteria,
    }
}

fn document(name: &str) -> DocumentRef {
    DocumentRef {
        file_name: format!("{name}.pdf"),
        storage_key: format!("ngo-docs/{name}.pdf"),
    }
}

/// Fully filled form scoring 79.5 against `standard_criteria`.
pub(super) fn form(name: &str, email: &str) -> ApplicationForm {
    ApplicationForm {
        name: name.to_string(),
        email: email.to_string(),
        phone: Some("+221 33 800 00 00".to_string()),
        website: Some("www.example-ngo.org".to_string()),
        street: Some("12 Rue des Jardins".to_string()),
        city: Some("Dakar".to_string()),
        country: Some("SN".to_string()),
        registration_number: "SN-ASSOC-2014-0042".to_string(),
        legal_status: Some(LegalStatus::Association),
        activity_domains: vec![
            ActivityDomain("education".to_string()),
            ActivityDomain("health".to_string()),
        ],
        main_activities: "Literacy programs and community health outreach".to_string(),
        annual_budget: 750_000.0,
        funding_sources: Some("Membership fees, foundation grants".to_string()),
        staff_count: 30,
        volunteer_count: 25,
        years_experience: 7,
        previous_projects: Some("Rural school kits 2019-2023".to_string()),
        references: Some("Regional education office".to_string()),
        documents: DocumentSet {
            statute: Some(document("statute")),
            registration_certificate: Some(document("certificate")),
            financial_report: None,
        },
    }
}

pub(super) fn profile() -> OrganizationProfile {
    IntakeGuard::new()
        .profile_from_form(form("Sahel Learning Trust", "contact@sahel.example.org"))
        .expect("fixture form is valid")
}

pub(super) fn empty_profile() -> OrganizationProfile {
    OrganizationProfile {
        name: String::new(),
        email: String::new(),
        phone: None,
        website: None,
        street: None,
        city: None,
        country: None,
        registration_number: String::new(),
        legal_status: None,
        activity_domains: Default::default(),
        main_activities: String::new(),
        annual_budget: 0.0,
        funding_sources: None,
        staff_count: 0,
        volunteer_count: 0,
        years_experience: 0,
        previous_projects: None,
        references: None,
        documents: DocumentSet::default(),
    }
}

pub(super) fn submitted_record(id: &str, campaign_id: &str, total_score: f64) -> ApplicationRecord {
    let mut record = ApplicationRecord::draft(
        ApplicationId(id.to_string()),
        CampaignId(campaign_id.to_string()),
        profile(),
    );
    record.state = ApplicationState::Submitted;
    record.submitted_at = Some(now());
    record.total_score = total_score;
    record
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    applications: Mutex<BTreeMap<ApplicationId, ApplicationRecord>>,
    campaigns: Mutex<BTreeMap<CampaignId, Campaign>>,
    fail_commits: AtomicBool,
    listing_gate: Mutex<Option<Arc<ListingGate>>>,
}

/// Parks the next unfiltered application listing until the test releases it.
pub(super) struct ListingGate {
    pub(super) entered: Barrier,
    pub(super) release: Barrier,
}

impl MemoryRepository {
    pub(super) fn with_campaign(campaign: Campaign) -> Self {
        let repository = Self::default();
        repository
            .insert_campaign(campaign)
            .expect("campaign stored");
        repository
    }

    pub(super) fn gate_next_listing(&self) -> Arc<ListingGate> {
        let gate = Arc::new(ListingGate {
            entered: Barrier::new(2),
            release: Barrier::new(2),
        });
        *self.listing_gate.lock().expect("gate mutex poisoned") = Some(gate.clone());
        gate
    }

    pub(super) fn fail_commits(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    pub(super) fn application(&self, id: &ApplicationId) -> ApplicationRecord {
        self.fetch_application(id)
            .expect("fetch succeeds")
            .expect("record present")
    }

    pub(super) fn campaign(&self, id: &CampaignId) -> Campaign {
        self.fetch_campaign(id)
            .expect("fetch succeeds")
            .expect("campaign present")
    }
}

impl RecruitmentRepository for MemoryRepository {
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
        guard.insert(record.id.clone(), record);
        Ok(())
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
        if state.is_none() {
            let gate = self.listing_gate.lock().expect("gate mutex poisoned").take();
            if let Some(gate) = gate {
                gate.entered.wait();
                gate.release.wait();
            }
        }

        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.campaign_id == campaign_id)
            .filter(|record| state.map_or(true, |state| record.state == state))
            .cloned()
            .collect())
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
        guard.insert(campaign.id.clone(), campaign);
        Ok(())
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

    fn commit_selection(
        &self,
        campaign: Campaign,
        applications: Vec<ApplicationRecord>,
    ) -> Result<(), RepositoryError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("commit rejected".to_string()));
        }

        let mut campaigns = self.campaigns.lock().expect("repository mutex poisoned");
        let mut records = self.applications.lock().expect("repository mutex poisoned");
        campaigns.insert(campaign.id.clone(), campaign);
        for record in applications {
            records.insert(record.id.clone(), record);
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationPublisher for OfflineNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct Harness {
    pub(super) service: RecruitmentService<MemoryRepository, MemoryNotifications>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness(campaign: Campaign) -> Harness {
    let repository = Arc::new(MemoryRepository::with_campaign(campaign));
    let notifications = Arc::new(MemoryNotifications::default());
    let clock = Arc::new(FixedClock::new(now()));
    let service =
        RecruitmentService::with_clock(repository.clone(), notifications.clone(), clock.clone());

    Harness {
        service,
        repository,
        notifications,
        clock,
    }
}

/// Create and submit an application, returning its id.
pub(super) fn submit_form(harness: &Harness, campaign_id: &str, form: ApplicationForm) -> ApplicationId {
    let draft = harness
        .service
        .create_application(&CampaignId(campaign_id.to_string()), form)
        .expect("draft created");
    harness
        .service
        .submit(&draft.id)
        .expect("submission accepted")
        .id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
