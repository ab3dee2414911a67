//! NGO recruitment campaigns: application intake, criterion scoring, and automatic
//! selection of the best-ranked organizations when a campaign closes.

pub mod clock;
pub mod domain;
pub(crate) mod intake;
pub mod repository;
pub mod report;
pub mod router;
pub mod scoring;
pub(crate) mod selection;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    ActivityDomain, ApplicationForm, ApplicationId, ApplicationState, Campaign, CampaignId,
    CampaignState, Criterion, CriterionCode, CriterionId, DocumentRef, DocumentSet,
    EvaluationRecord, LegalStatus, OrganizationProfile,
};
pub use intake::{IntakeGuard, ValidationError};
pub use report::{CampaignStatistics, LabelCount, ScoreBucket};
pub use repository::{
    ApplicationRecord, ApplicationStatusView, Notification, NotificationError,
    NotificationPublisher, RecruitmentRepository, RepositoryError,
};
pub use router::recruitment_router;
pub use scoring::{evaluate_profile, score_criterion, Evaluation, ScoringFault};
pub use selection::SelectionSummary;
pub use service::{ConcurrencyConflict, RecruitmentService, RecruitmentServiceError, SweepReport};
