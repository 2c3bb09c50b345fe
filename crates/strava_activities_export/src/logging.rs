use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV: &str = "STRAVA_EXPORT_LOG_LEVEL";

// keep the HTTP stack quiet unless asked for explicitly
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn";

/// `STRAVA_EXPORT_LOG_LEVEL`, else `RUST_LOG`, else `info`.
pub fn log_directive(level: Option<String>, rust_log: Option<String>) -> String {
    level
        .or(rust_log)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(format!("{directive},{QUIET_DEPENDENCIES}"))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_DEPENDENCIES}")))
}

/// Install the global subscriber: compact lines on stderr.
pub fn init() {
    let directive = log_directive(
        std::env::var(LOG_LEVEL_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&directive))
        .init();
    tracing::debug!("strava-export: log filter: {}", directive);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_priority() {
        assert_eq!(
            log_directive(Some("debug".into()), Some("warn".into())),
            "debug"
        );
        assert_eq!(log_directive(None, Some("warn".into())), "warn");
        assert_eq!(log_directive(None, None), "info");
        assert_eq!(log_directive(Some("  ".into()), None), "info");
    }

    #[test]
    fn invalid_directive_falls_back() {
        let filter = env_filter("invalid[[[filter");
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn valid_directive_is_kept() {
        let filter = env_filter("strava_activities_client=trace");
        assert!(format!("{filter}").contains("strava_activities_client=trace"));
    }
}
