use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events follow the configured level; everything else stays at `warn`.
const RECRUITMENT_TARGETS: [&str; 2] = ["ngo_recruit", "ngo_recruit_api"];
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directives}' (from APP_LOG_LEVEL '{value}')")]
    EnvFilter {
        value: String,
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("unable to install tracing subscriber: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expand a bare level such as `debug` into per-target directives for the recruitment
/// crates. Values that already carry directives pass through untouched.
pub fn filter_directives(log_level: &str) -> String {
    let log_level = log_level.trim();
    if log_level.contains('=') || log_level.contains(',') {
        return log_level.to_string();
    }

    let mut directives = vec![DEPENDENCY_LEVEL.to_string()];
    directives.extend(
        RECRUITMENT_TARGETS
            .iter()
            .map(|target| format!("{target}={log_level}")),
    );
    directives.join(",")
}

fn configured_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let directives = filter_directives(&config.log_level);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        directives,
        source,
    })
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `APP_LOG_LEVEL`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(config)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
