use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::domain::{ApplicationForm, ApplicationState, CampaignState, OrganizationProfile};

/// User-correctable problems raised at intake or submission time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("application is incomplete: {}", .0.join("; "))]
    Incomplete(Vec<String>),
    #[error("email address '{0}' is not valid")]
    InvalidEmail(String),
    #[error("website URL '{0}' is not valid")]
    InvalidWebsite(String),
    #[error("{field} cannot be negative")]
    NegativeValue { field: &'static str },
    #[error("{field} must be a finite number")]
    NonFiniteValue { field: &'static str },
    #[error("campaign is {state} and does not accept applications")]
    CampaignNotOpen { state: CampaignState },
    #[error("application deadline passed at {deadline}")]
    DeadlinePassed { deadline: DateTime<Utc> },
    #[error("an application with email {email} already exists for this campaign")]
    DuplicateApplication { email: String },
    #[error("only draft applications can be submitted (current state: {state})")]
    NotDraft { state: ApplicationState },
}

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const WEBSITE_PATTERN: &str = r"^https?://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\S*$";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

fn website_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(WEBSITE_PATTERN).expect("website pattern compiles"))
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

fn trimmed_optional(value: Option<String>) -> Option<String> {
    value
        .map(|inner| inner.trim().to_string())
        .filter(|inner| !inner.is_empty())
}

/// Normalizes raw forms into profiles and enforces submission completeness.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase the email address so duplicate detection is case-insensitive.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Bare hosts get an `https://` prefix.
    pub fn normalize_website(website: &str) -> String {
        let website = website.trim();
        if website.starts_with("http://") || website.starts_with("https://") {
            website.to_string()
        } else {
            format!("https://{website}")
        }
    }

    pub fn profile_from_form(
        &self,
        form: ApplicationForm,
    ) -> Result<OrganizationProfile, ValidationError> {
        let email = Self::normalize_email(&form.email);
        if !email.is_empty() && !email_pattern().is_match(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }

        let website = trimmed_optional(form.website).map(|raw| Self::normalize_website(&raw));
        if let Some(url) = &website {
            if !website_pattern().is_match(url) {
                return Err(ValidationError::InvalidWebsite(url.clone()));
            }
        }

        if !form.annual_budget.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "annual_budget",
            });
        }
        let numeric = [
            ("annual_budget", form.annual_budget < 0.0),
            ("staff_count", form.staff_count < 0),
            ("volunteer_count", form.volunteer_count < 0),
            ("years_experience", form.years_experience < 0),
        ];
        if let Some((field, _)) = numeric.into_iter().find(|(_, negative)| *negative) {
            return Err(ValidationError::NegativeValue { field });
        }

        Ok(OrganizationProfile {
            name: trimmed(&form.name),
            email,
            phone: trimmed_optional(form.phone),
            website,
            street: trimmed_optional(form.street),
            city: trimmed_optional(form.city),
            country: trimmed_optional(form.country),
            registration_number: trimmed(&form.registration_number),
            legal_status: form.legal_status,
            activity_domains: form.activity_domains.into_iter().collect(),
            main_activities: trimmed(&form.main_activities),
            annual_budget: form.annual_budget,
            funding_sources: trimmed_optional(form.funding_sources),
            staff_count: form.staff_count,
            volunteer_count: form.volunteer_count,
            years_experience: form.years_experience,
            previous_projects: trimmed_optional(form.previous_projects),
            references: trimmed_optional(form.references),
            documents: form.documents,
        })
    }

    /// Every problem blocking submission, reported together.
    pub fn ensure_submittable(&self, profile: &OrganizationProfile) -> Result<(), ValidationError> {
        let mut problems = Vec::new();

        let required = [
            ("organization name", profile.name.as_str()),
            ("email", profile.email.as_str()),
            ("registration number", profile.registration_number.as_str()),
            ("main activities", profile.main_activities.as_str()),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("{label} is required"));
            }
        }

        if profile.legal_status.is_none() {
            problems.push("legal status is required".to_string());
        }
        if profile.years_experience <= 0 {
            problems.push("years of experience must be greater than zero".to_string());
        }
        if profile.activity_domains.is_empty() {
            problems.push("at least one activity domain must be selected".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Incomplete(problems))
        }
    }
}
