use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    ApplicationForm, ApplicationId, ApplicationState, Campaign, CampaignId, CampaignState,
};
use super::intake::{IntakeGuard, ValidationError};
use super::report::CampaignStatistics;
use super::repository::{
    ApplicationRecord, Notification, NotificationPublisher, RecruitmentRepository,
    RepositoryError,
};
use super::scoring::{evaluate_profile, Evaluation};
use super::selection::{needs_rescoring, plan_selection, SelectionPlan, SelectionSummary};

const SUBMITTED_TEMPLATE: &str = "application_submitted";

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("ngo-{id:06}"))
}

/// Raised when another submission or selection already holds the campaign.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("campaign {campaign_id} is locked by a concurrent submission or selection")]
pub struct ConcurrencyConflict {
    pub campaign_id: CampaignId,
}

/// Exclusive per-campaign leases serializing submissions against selection.
#[derive(Debug, Default)]
pub(crate) struct CampaignLeases {
    held: Mutex<HashSet<CampaignId>>,
}

impl CampaignLeases {
    pub(crate) fn try_acquire(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<CampaignLease<'_>, ConcurrencyConflict> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(campaign_id.clone()) {
            return Err(ConcurrencyConflict {
                campaign_id: campaign_id.clone(),
            });
        }

        Ok(CampaignLease {
            leases: self,
            campaign_id: campaign_id.clone(),
        })
    }
}

/// Released on drop.
#[derive(Debug)]
pub(crate) struct CampaignLease<'a> {
    leases: &'a CampaignLeases,
    campaign_id: CampaignId,
}

impl Drop for CampaignLease<'_> {
    fn drop(&mut self) {
        self.leases
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.campaign_id);
    }
}

/// Outcome of one deadline sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub closed: Vec<SelectionSummary>,
    pub deferred: Vec<CampaignId>,
    pub failed: Vec<(CampaignId, String)>,
}

/// Service composing intake validation, criterion scoring, and automatic selection.
pub struct RecruitmentService<R, N> {
    guard: IntakeGuard,
    repository: Arc<R>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
    leases: CampaignLeases,
}

impl<R, N> RecruitmentService<R, N>
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>) -> Self {
        Self::with_clock(repository, notifications, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<R>, notifications: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            guard: IntakeGuard::new(),
            repository,
            notifications,
            clock,
            leases: CampaignLeases::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn leases(&self) -> &CampaignLeases {
        &self.leases
    }

    /// Validate a raw form and store it as a draft application.
    pub fn create_application(
        &self,
        campaign_id: &CampaignId,
        form: ApplicationForm,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        let campaign = self.load_campaign(campaign_id)?;
        let profile = self.guard.profile_from_form(form)?;
        let _lease = self.leases.try_acquire(&campaign.id)?;

        // Drafts may omit the email; only a filled address can collide.
        let duplicate = !profile.email.is_empty()
            && self
                .repository
                .applications_for_campaign(&campaign.id, None)?
                .into_iter()
                .any(|existing| existing.profile.email == profile.email);
        if duplicate {
            return Err(ValidationError::DuplicateApplication {
                email: profile.email,
            }
            .into());
        }

        let record = ApplicationRecord::draft(next_application_id(), campaign.id, profile);
        let stored = self.repository.insert_application(record)?;
        debug!(application_id = %stored.id, campaign_id = %stored.campaign_id, "draft application stored");
        Ok(stored)
    }

    /// Move a draft to `submitted`, score it, and notify.
    pub fn submit(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        let campaign_id = self.load_application(application_id)?.campaign_id;
        let lease = self.leases.try_acquire(&campaign_id)?;

        let mut record = self.load_application(application_id)?;
        if record.state != ApplicationState::Draft {
            return Err(ValidationError::NotDraft {
                state: record.state,
            }
            .into());
        }

        let campaign = self.load_campaign(&campaign_id)?;
        if campaign.state != CampaignState::Open {
            return Err(ValidationError::CampaignNotOpen {
                state: campaign.state,
            }
            .into());
        }

        let now = self.clock.now();
        if campaign.is_past_deadline(now) {
            return Err(ValidationError::DeadlinePassed {
                deadline: campaign.end_date,
            }
            .into());
        }

        self.guard.ensure_submittable(&record.profile)?;

        record.state = ApplicationState::Submitted;
        record.submitted_at = Some(now);
        apply_evaluation(&mut record, &campaign);
        self.repository.update_application(record.clone())?;
        drop(lease);

        info!(
            application_id = %record.id,
            campaign_id = %record.campaign_id,
            organization = %record.profile.name,
            total_score = record.total_score,
            "application submitted"
        );
        self.notify_submitted(&record);

        Ok(record)
    }

    /// Replace the evaluation records of a submitted application and recompute its total.
    pub fn evaluate(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Evaluation, RecruitmentServiceError> {
        let campaign_id = self.load_application(application_id)?.campaign_id;
        let _lease = self.leases.try_acquire(&campaign_id)?;

        let mut record = self.load_application(application_id)?;
        if !record.state.is_evaluable() {
            return Err(RecruitmentServiceError::NotEvaluable {
                state: record.state,
            });
        }

        let campaign = self.load_campaign(&record.campaign_id)?;
        apply_evaluation(&mut record, &campaign);
        self.repository.update_application(record.clone())?;

        Ok(Evaluation {
            records: record.evaluations,
            total_score: record.total_score,
        })
    }

    /// Close a campaign to applications and, when enabled, run auto-selection.
    pub fn close_and_select(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<SelectionSummary, RecruitmentServiceError> {
        let _lease = self.leases.try_acquire(campaign_id)?;

        let mut campaign = self.load_campaign(campaign_id)?;
        ensure_campaign_transition(&campaign, CampaignState::Evaluation)?;
        campaign.state = CampaignState::Evaluation;

        if !campaign.auto_selection {
            self.repository.update_campaign(campaign)?;
            info!(%campaign_id, "campaign closed to applications; auto-selection disabled");
            return Ok(SelectionSummary::empty(campaign_id.clone()));
        }

        let plan = self.plan_auto_selection(&campaign)?;
        let summary = plan.summary(campaign.id.clone());
        self.repository
            .commit_selection(campaign, plan.into_records())?;

        info!(
            %campaign_id,
            selected = summary.selected_count,
            rejected = summary.rejected_count,
            total_evaluated = summary.total_evaluated,
            "auto-selection completed: {} of {} applications selected",
            summary.selected_count,
            summary.total_evaluated
        );

        Ok(summary)
    }

    fn plan_auto_selection(
        &self,
        campaign: &Campaign,
    ) -> Result<SelectionPlan, RecruitmentServiceError> {
        let mut submitted = self
            .repository
            .applications_for_campaign(&campaign.id, Some(ApplicationState::Submitted))?;

        for record in &mut submitted {
            if needs_rescoring(record, campaign) {
                debug!(application_id = %record.id, "stale evaluation set; rescoring before ranking");
                apply_evaluation(record, campaign);
            }
        }

        Ok(plan_selection(submitted, campaign.max_selections))
    }

    pub fn open_campaign(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Campaign, RecruitmentServiceError> {
        self.advance_campaign(campaign_id, CampaignState::Open)
    }

    pub fn close_campaign(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Campaign, RecruitmentServiceError> {
        self.advance_campaign(campaign_id, CampaignState::Closed)
    }

    fn advance_campaign(
        &self,
        campaign_id: &CampaignId,
        next: CampaignState,
    ) -> Result<Campaign, RecruitmentServiceError> {
        let _lease = self.leases.try_acquire(campaign_id)?;
        let mut campaign = self.load_campaign(campaign_id)?;
        ensure_campaign_transition(&campaign, next)?;

        campaign.state = next;
        self.repository.update_campaign(campaign.clone())?;
        info!(%campaign_id, state = %next, "campaign state changed");
        Ok(campaign)
    }

    /// Close every open campaign whose deadline has passed. Safe to run repeatedly.
    pub fn sweep_deadlines(&self) -> Result<SweepReport, RecruitmentServiceError> {
        let now = self.clock.now();
        let expired: Vec<Campaign> = self
            .repository
            .campaigns_in_state(CampaignState::Open)?
            .into_iter()
            .filter(|campaign| campaign.is_past_deadline(now))
            .collect();

        let mut report = SweepReport::default();
        for campaign in expired {
            match self.close_and_select(&campaign.id) {
                Ok(summary) => report.closed.push(summary),
                Err(RecruitmentServiceError::Conflict(conflict)) => {
                    warn!(campaign_id = %conflict.campaign_id, "campaign busy; deadline close deferred to next sweep");
                    report.deferred.push(conflict.campaign_id);
                }
                Err(RecruitmentServiceError::CampaignTransition { from, .. }) => {
                    debug!(campaign_id = %campaign.id, state = %from, "campaign already left the open state");
                }
                Err(error) => {
                    warn!(campaign_id = %campaign.id, %error, "deadline close failed");
                    report.failed.push((campaign.id, error.to_string()));
                }
            }
        }

        Ok(report)
    }

    pub fn review(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        self.transition(application_id, ApplicationState::UnderReview, None)
    }

    /// Administrative selection bypassing the ranking.
    pub fn select(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        self.transition(application_id, ApplicationState::Selected, None)
    }

    /// Administrative rejection bypassing the ranking.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
        reason: Option<String>,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        self.transition(application_id, ApplicationState::Rejected, reason)
    }

    fn transition(
        &self,
        application_id: &ApplicationId,
        next: ApplicationState,
        reason: Option<String>,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        let campaign_id = self.load_application(application_id)?.campaign_id;
        let _lease = self.leases.try_acquire(&campaign_id)?;

        let mut record = self.load_application(application_id)?;
        if !record.state.can_transition_to(next) {
            return Err(RecruitmentServiceError::ApplicationTransition {
                from: record.state,
                to: next,
            });
        }

        record.state = next;
        if next == ApplicationState::Rejected {
            record.rejection_reason = reason;
        }
        self.repository.update_application(record.clone())?;
        info!(application_id = %record.id, state = %next, "application state changed manually");
        Ok(record)
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        self.load_application(application_id)
    }

    pub fn campaign_statistics(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<CampaignStatistics, RecruitmentServiceError> {
        let campaign = self.load_campaign(campaign_id)?;
        let records = self
            .repository
            .applications_for_campaign(&campaign.id, None)?;
        Ok(CampaignStatistics::from_records(campaign.id, &records))
    }

    fn load_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        let record = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn load_campaign(&self, campaign_id: &CampaignId) -> Result<Campaign, RecruitmentServiceError> {
        let campaign = self
            .repository
            .fetch_campaign(campaign_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(campaign)
    }

    fn notify_submitted(&self, record: &ApplicationRecord) {
        let mut details = BTreeMap::new();
        details.insert("campaign_id".to_string(), record.campaign_id.0.clone());
        details.insert("organization".to_string(), record.profile.name.clone());
        details.insert("email".to_string(), record.profile.email.clone());
        details.insert(
            "total_score".to_string(),
            format!("{:.2}", record.total_score),
        );
        if let Some(submitted_at) = record.submitted_at {
            details.insert("submitted_at".to_string(), submitted_at.to_rfc3339());
        }

        let notification = Notification {
            template: SUBMITTED_TEMPLATE.to_string(),
            application_id: record.id.clone(),
            details,
        };

        if let Err(error) = self.notifications.publish(notification) {
            warn!(application_id = %record.id, %error, "submission notification not delivered");
        }
    }
}

fn apply_evaluation(record: &mut ApplicationRecord, campaign: &Campaign) {
    let evaluation = evaluate_profile(&record.profile, campaign.ordered_criteria());
    record.evaluations = evaluation.records;
    record.total_score = evaluation.total_score;
}

fn ensure_campaign_transition(
    campaign: &Campaign,
    next: CampaignState,
) -> Result<(), RecruitmentServiceError> {
    if campaign.state.can_transition_to(next) {
        Ok(())
    } else {
        Err(RecruitmentServiceError::CampaignTransition {
            from: campaign.state,
            to: next,
        })
    }
}

/// Error raised by the recruitment service.
#[derive(Debug, thiserror::Error)]
pub enum RecruitmentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConcurrencyConflict),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("application cannot move from {from} to {to}")]
    ApplicationTransition {
        from: ApplicationState,
        to: ApplicationState,
    },
    #[error("campaign cannot move from {from} to {to}")]
    CampaignTransition {
        from: CampaignState,
        to: CampaignState,
    },
    #[error("application in state {state} cannot be evaluated")]
    NotEvaluable { state: ApplicationState },
}

impl RecruitmentServiceError {
    /// Concurrency conflicts clear once the competing operation finishes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecruitmentServiceError::Conflict(_))
    }
}
