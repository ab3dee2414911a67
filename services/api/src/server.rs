use crate::cli::ServeArgs;
use crate::infra::{
    sample_campaign, AppState, InMemoryRecruitmentRepository, TracingNotificationPublisher,
};
use crate::routes::with_recruitment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration as CampaignDuration, Utc};
use ngo_recruit::config::AppConfig;
use ngo_recruit::error::AppError;
use ngo_recruit::telemetry;
use ngo_recruit::workflows::recruitment::{
    NotificationPublisher, RecruitmentRepository, RecruitmentService, RecruitmentServiceError,
    SweepReport,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const SAMPLE_CAMPAIGN_DAYS: i64 = 30;
const SAMPLE_CAMPAIGN_SELECTIONS: u32 = 5;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryRecruitmentRepository::default());
    if !args.no_seed {
        let campaign = repository
            .insert_campaign(sample_campaign(
                Utc::now(),
                CampaignDuration::days(SAMPLE_CAMPAIGN_DAYS),
                SAMPLE_CAMPAIGN_SELECTIONS,
            ))
            .map_err(RecruitmentServiceError::from)?;
        info!(campaign_id = %campaign.id, deadline = %campaign.end_date, "sample campaign open");
    }

    let notifications = Arc::new(TracingNotificationPublisher::default());
    let recruitment_service = Arc::new(RecruitmentService::new(repository, notifications));

    let sweep = spawn_deadline_sweep(
        recruitment_service.clone(),
        config.recruitment.sweep_interval(),
    );

    let app = with_recruitment_routes(recruitment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sweep_interval_secs = config.recruitment.sweep_interval_secs,
        "ngo recruitment service ready"
    );

    let served = axum::serve(listener, app).await;
    sweep.abort();
    served?;
    Ok(())
}

/// Periodically close campaigns whose deadline has passed.
pub(crate) fn spawn_deadline_sweep<R, N>(
    service: Arc<RecruitmentService<R, N>>,
    interval: Duration,
) -> JoinHandle<()>
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match service.sweep_deadlines() {
                Ok(report) if sweep_is_idle(&report) => {
                    debug!("deadline sweep found nothing to close");
                }
                Ok(report) => info!(
                    closed = report.closed.len(),
                    deferred = report.deferred.len(),
                    failed = report.failed.len(),
                    "deadline sweep finished"
                ),
                Err(error) => warn!(%error, "deadline sweep failed"),
            }
        }
    })
}

fn sweep_is_idle(report: &SweepReport) -> bool {
    report.closed.is_empty() && report.deferred.is_empty() && report.failed.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::sample_forms;
    use crate::infra::SAMPLE_CAMPAIGN_ID;
    use ngo_recruit::workflows::recruitment::{
        ApplicationState, CampaignId, CampaignState, FixedClock,
    };

    #[tokio::test]
    async fn deadline_sweep_task_closes_expired_campaign() {
        let repository = Arc::new(InMemoryRecruitmentRepository::default());
        let opened = Utc::now() - CampaignDuration::days(10);
        repository
            .insert_campaign(sample_campaign(opened, CampaignDuration::days(7), 1))
            .expect("campaign seeded");

        let clock = Arc::new(FixedClock::new(opened + CampaignDuration::days(1)));
        let service = Arc::new(RecruitmentService::with_clock(
            repository.clone(),
            Arc::new(TracingNotificationPublisher::default()),
            clock.clone(),
        ));
        let campaign_id = CampaignId(SAMPLE_CAMPAIGN_ID.to_string());
        let draft = service
            .create_application(&campaign_id, sample_forms()[0].clone())
            .expect("draft");
        service.submit(&draft.id).expect("submitted");
        clock.advance(CampaignDuration::days(7));

        let sweep = spawn_deadline_sweep(service.clone(), Duration::from_millis(10));
        let mut closed = false;
        for _ in 0..50 {
            let campaign = repository
                .fetch_campaign(&campaign_id)
                .expect("fetch")
                .expect("present");
            if campaign.state == CampaignState::Evaluation {
                closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweep.abort();

        assert!(closed, "sweep closed the campaign");
        assert_eq!(
            service.get(&draft.id).expect("application").state,
            ApplicationState::Selected
        );
    }

    #[test]
    fn sweep_with_only_failures_is_not_idle() {
        assert!(sweep_is_idle(&SweepReport::default()));

        let report = SweepReport {
            failed: vec![(
                CampaignId(SAMPLE_CAMPAIGN_ID.to_string()),
                "repository unavailable".to_string(),
            )],
            ..SweepReport::default()
        };
        assert!(!sweep_is_idle(&report));
    }
}
