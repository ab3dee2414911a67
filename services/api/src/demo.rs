use crate::infra::{
    sample_campaign, InMemoryRecruitmentRepository, TracingNotificationPublisher,
    SAMPLE_CAMPAIGN_ID,
};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use ngo_recruit::error::AppError;
use ngo_recruit::workflows::recruitment::{
    ActivityDomain, ApplicationForm, ApplicationId, ApplicationRecord, CampaignId, DocumentRef,
    DocumentSet, FixedClock, LegalStatus, NotificationPublisher, RecruitmentRepository,
    RecruitmentService, RecruitmentServiceError,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of organizations the campaign selects
    #[arg(long, default_value_t = 2)]
    pub(crate) max_selections: u32,
    /// Campaign opening date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) opens_on: Option<DateTime<Utc>>,
    /// How many days the campaign accepts submissions
    #[arg(long, default_value_t = 21)]
    pub(crate) open_days: i64,
    /// Print every criterion score per application
    #[arg(long)]
    pub(crate) list_evaluations: bool,
}

fn document(slug: &str, kind: &str) -> DocumentRef {
    DocumentRef {
        file_name: format!("{kind}.pdf"),
        storage_key: format!("demo/{slug}/{kind}.pdf"),
    }
}

#[allow(clippy::too_many_arguments)]
fn sample_form(
    name: &str,
    slug: &str,
    years_experience: i64,
    annual_budget: f64,
    staff_count: i64,
    volunteer_count: i64,
    domains: &[&str],
    documents: DocumentSet,
) -> ApplicationForm {
    ApplicationForm {
        name: name.to_string(),
        email: format!("contact@{slug}.example.org"),
        phone: Some("+254 20 000 0000".to_string()),
        website: Some(format!("{slug}.example.org")),
        street: None,
        city: Some("Nairobi".to_string()),
        country: Some("KE".to_string()),
        registration_number: format!("OP.218/051/{years_experience:02}/{slug}"),
        legal_status: Some(LegalStatus::Association),
        activity_domains: domains
            .iter()
            .map(|domain| ActivityDomain(domain.to_string()))
            .collect(),
        main_activities: format!("{name} community programs"),
        annual_budget,
        funding_sources: Some("Grants and individual donors".to_string()),
        staff_count,
        volunteer_count,
        years_experience,
        previous_projects: None,
        references: None,
        documents,
    }
}

/// Four organizations of decreasing strength.
pub(crate) fn sample_forms() -> Vec<ApplicationForm> {
    vec![
        sample_form(
            "Maji Safi Alliance",
            "majisafi",
            14,
            1_400_000.0,
            60,
            80,
            &["water", "health", "education"],
            DocumentSet {
                statute: Some(document("majisafi", "statute")),
                registration_certificate: Some(document("majisafi", "certificate")),
                financial_report: Some(document("majisafi", "financials")),
            },
        ),
        sample_form(
            "Green Hills Youth Network",
            "greenhills",
            6,
            420_000.0,
            18,
            40,
            &["education", "environment"],
            DocumentSet {
                statute: Some(document("greenhills", "statute")),
                registration_certificate: Some(document("greenhills", "certificate")),
                financial_report: None,
            },
        ),
        sample_form(
            "Lakeside Women Cooperative",
            "lakeside",
            4,
            95_000.0,
            6,
            12,
            &["livelihoods"],
            DocumentSet {
                statute: Some(document("lakeside", "statute")),
                registration_certificate: None,
                financial_report: None,
            },
        ),
        sample_form(
            "New Dawn Outreach",
            "newdawn",
            1,
            12_000.0,
            2,
            3,
            &["health"],
            DocumentSet::default(),
        ),
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        max_selections,
        opens_on,
        open_days,
        list_evaluations,
    } = args;

    let opens_at = opens_on.unwrap_or_else(Utc::now);
    let open_for = Duration::days(open_days.max(1));

    let repository = Arc::new(InMemoryRecruitmentRepository::default());
    let notifications = Arc::new(TracingNotificationPublisher::default());
    let clock = Arc::new(FixedClock::new(opens_at));
    let campaign = repository
        .insert_campaign(sample_campaign(opens_at, open_for, max_selections))
        .map_err(RecruitmentServiceError::from)?;
    let service = RecruitmentService::with_clock(
        repository.clone(),
        notifications.clone(),
        clock.clone(),
    );

    println!("NGO recruitment demo");
    println!(
        "Campaign: {} ({}), open {} to {}, selecting {}",
        campaign.name,
        campaign.id,
        campaign.start_date.format("%Y-%m-%d"),
        campaign.end_date.format("%Y-%m-%d"),
        campaign.max_selections
    );

    let campaign_id = CampaignId(SAMPLE_CAMPAIGN_ID.to_string());
    let mut submitted = Vec::new();
    println!("\nSubmissions");
    for form in sample_forms() {
        let draft = service.create_application(&campaign_id, form)?;
        let record = service.submit(&draft.id)?;
        println!(
            "  {} {:<30} {:>6.2} points",
            record.id, record.profile.name, record.total_score
        );
        if list_evaluations {
            for evaluation in &record.evaluations {
                println!(
                    "      {:<18} {:>6.2} / {:>6.2}",
                    evaluation.code.as_str(),
                    evaluation.score,
                    evaluation.max_score
                );
            }
        }
        submitted.push(record.id);
        clock.advance(Duration::hours(6));
    }

    clock.set(campaign.end_date + Duration::minutes(1));
    let late = service.create_application(
        &campaign_id,
        sample_form(
            "Late Harvest Foundation",
            "lateharvest",
            8,
            600_000.0,
            25,
            10,
            &["agriculture"],
            DocumentSet::default(),
        ),
    )?;
    match service.submit(&late.id) {
        Ok(_) => println!("\nLate submission unexpectedly accepted"),
        Err(err) => println!("\nLate submission refused: {err}"),
    }

    let report = service.sweep_deadlines()?;
    println!(
        "\nDeadline sweep closed {} campaign(s), deferred {}, failed {}",
        report.closed.len(),
        report.deferred.len(),
        report.failed.len()
    );
    for summary in &report.closed {
        println!(
            "  {}: {} selected, {} rejected, {} evaluated",
            summary.campaign_id,
            summary.selected_count,
            summary.rejected_count,
            summary.total_evaluated
        );
    }

    render_ranking(&service, &submitted)?;

    let statistics = service.campaign_statistics(&campaign_id)?;
    println!("\nScore distribution");
    for bucket in &statistics.score_distribution {
        println!("  {:<7} {}", bucket.label, bucket.count);
    }
    println!("\nNotifications queued: {}", notifications.events().len());

    Ok(())
}

fn render_ranking<R, N>(
    service: &RecruitmentService<R, N>,
    ids: &[ApplicationId],
) -> Result<(), AppError>
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let mut records: Vec<ApplicationRecord> = ids
        .iter()
        .map(|id| service.get(id))
        .collect::<Result<_, _>>()?;
    records.sort_by(|left, right| right.total_score.total_cmp(&left.total_score));

    println!("\nFinal ranking");
    for (position, record) in records.iter().enumerate() {
        println!(
            "  {}. {:<30} {:>6.2}  {}",
            position + 1,
            record.profile.name,
            record.total_score,
            record.state
        );
        if let Some(reason) = &record.rejection_reason {
            println!("     {reason}");
        }
    }
    Ok(())
}
