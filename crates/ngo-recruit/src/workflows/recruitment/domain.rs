use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for NGO applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for recruitment campaigns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// Reference to an activity domain (education, health, water access, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityDomain(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalStatus {
    Association,
    Foundation,
    InternationalNgo,
    Other,
}

/// Pointer to an uploaded document. The bytes live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub file_name: String,
    pub storage_key: String,
}

/// The three supporting documents an organization may attach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSet {
    #[serde(default)]
    pub statute: Option<DocumentRef>,
    #[serde(default)]
    pub registration_certificate: Option<DocumentRef>,
    #[serde(default)]
    pub financial_report: Option<DocumentRef>,
}

impl DocumentSet {
    pub const SLOTS: usize = 3;

    pub fn provided(&self) -> usize {
        [
            &self.statute,
            &self.registration_certificate,
            &self.financial_report,
        ]
        .into_iter()
        .filter(|slot| slot.is_some())
        .count()
    }
}

/// Raw application form as received from the intake channel, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub registration_number: String,
    #[serde(default)]
    pub legal_status: Option<LegalStatus>,
    #[serde(default)]
    pub activity_domains: Vec<ActivityDomain>,
    pub main_activities: String,
    #[serde(default)]
    pub annual_budget: f64,
    #[serde(default)]
    pub funding_sources: Option<String>,
    #[serde(default)]
    pub staff_count: i64,
    #[serde(default)]
    pub volunteer_count: i64,
    #[serde(default)]
    pub years_experience: i64,
    #[serde(default)]
    pub previous_projects: Option<String>,
    #[serde(default)]
    pub references: Option<String>,
    #[serde(default)]
    pub documents: DocumentSet,
}

/// Normalized organization profile stored with an application and consumed by scoring.
///
/// Numeric fields stay signed so that scoring remains total over malformed records
/// that bypassed intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub registration_number: String,
    pub legal_status: Option<LegalStatus>,
    pub activity_domains: BTreeSet<ActivityDomain>,
    pub main_activities: String,
    pub annual_budget: f64,
    pub funding_sources: Option<String>,
    pub staff_count: i64,
    pub volunteer_count: i64,
    pub years_experience: i64,
    pub previous_projects: Option<String>,
    pub references: Option<String>,
    pub documents: DocumentSet,
}

/// Lifecycle of an application inside a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    Draft,
    Submitted,
    UnderReview,
    Selected,
    Rejected,
}

impl ApplicationState {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationState::Draft => "draft",
            ApplicationState::Submitted => "submitted",
            ApplicationState::UnderReview => "under_review",
            ApplicationState::Selected => "selected",
            ApplicationState::Rejected => "rejected",
        }
    }

    /// Selected and rejected applications are frozen for scoring.
    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationState::Selected | ApplicationState::Rejected)
    }

    pub const fn is_evaluable(self) -> bool {
        matches!(
            self,
            ApplicationState::Submitted | ApplicationState::UnderReview
        )
    }

    pub fn can_transition_to(self, next: ApplicationState) -> bool {
        use ApplicationState::*;

        matches!(
            (self, next),
            (Draft, Submitted)
                | (Submitted | UnderReview, UnderReview)
                | (Submitted | UnderReview, Selected)
                | (Submitted | UnderReview, Rejected)
        )
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Campaign lifecycle: draft, open for applications, under evaluation, closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    Draft,
    Open,
    Evaluation,
    Closed,
}

impl CampaignState {
    pub const fn label(self) -> &'static str {
        match self {
            CampaignState::Draft => "draft",
            CampaignState::Open => "open",
            CampaignState::Evaluation => "evaluation",
            CampaignState::Closed => "closed",
        }
    }

    pub fn can_transition_to(self, next: CampaignState) -> bool {
        matches!(
            (self, next),
            (CampaignState::Draft, CampaignState::Open)
                | (CampaignState::Open, CampaignState::Evaluation)
                | (CampaignState::Evaluation, CampaignState::Closed)
        )
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scoring rule selector. Unknown codes fall back to `Custom` and the default rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CriterionCode {
    Experience,
    Budget,
    Staff,
    Documents,
    Completeness,
    ActivityDomains,
    Custom(String),
}

impl CriterionCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "experience" => CriterionCode::Experience,
            "budget" => CriterionCode::Budget,
            "staff" => CriterionCode::Staff,
            "documents" => CriterionCode::Documents,
            "completeness" => CriterionCode::Completeness,
            "activity_domains" => CriterionCode::ActivityDomains,
            other => CriterionCode::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CriterionCode::Experience => "experience",
            CriterionCode::Budget => "budget",
            CriterionCode::Staff => "staff",
            CriterionCode::Documents => "documents",
            CriterionCode::Completeness => "completeness",
            CriterionCode::ActivityDomains => "activity_domains",
            CriterionCode::Custom(code) => code,
        }
    }
}

impl From<String> for CriterionCode {
    fn from(value: String) -> Self {
        CriterionCode::parse(&value)
    }
}

impl From<CriterionCode> for String {
    fn from(value: CriterionCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CriterionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted evaluation dimension attached to a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub code: CriterionCode,
    pub max_score: f64,
    #[serde(default)]
    pub sequence: i32,
}

/// Stored score of one application against one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub criterion_id: CriterionId,
    pub code: CriterionCode,
    pub max_score: f64,
    pub score: f64,
}

/// Time-boxed recruitment round with a capacity and a criterion set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_selections: u32,
    pub state: CampaignState,
    #[serde(default = "default_auto_selection")]
    pub auto_selection: bool,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

fn default_auto_selection() -> bool {
    true
}

impl Campaign {
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }

    /// Criteria in evaluation order: `sequence`, then id.
    pub fn ordered_criteria(&self) -> Vec<&Criterion> {
        let mut criteria: Vec<&Criterion> = self.criteria.iter().collect();
        criteria.sort_by(|left, right| {
            left.sequence
                .cmp(&right.sequence)
                .then_with(|| left.id.cmp(&right.id))
        });
        criteria
    }
}
