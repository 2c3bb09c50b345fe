//! End-to-end export: refresh token, list activities, shape rows, write the file.

pub mod cli;
pub mod logging;

use cli::ExportArgs;
use std::path::PathBuf;
use strava_activities_client::config::Config;
use strava_activities_client::http_client::ReqwestStravaClient;
use strava_activities_client::shaping::shape_all;
use strava_activities_client::sink::write_csv;
use strava_activities_client::{StravaError, fetch_cycle};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub output: PathBuf,
}

/// Run one export. Nothing is written unless both the token exchange and
/// the activity listing succeed.
pub async fn run(args: &ExportArgs, config: Config) -> Result<ExportSummary, StravaError> {
    let client = ReqwestStravaClient::new(config)?.with_page_delay(args.page_delay());
    let options = args.fetch_options();
    info!(
        per_page = options.per_page,
        max_pages = ?options.max_pages,
        after = ?options.after,
        "starting activity export"
    );

    let cycle = fetch_cycle(&client, &options).await?;
    let rows = shape_all(&cycle.activities);
    write_csv(&args.output, &rows)?;
    info!(rows = rows.len(), path = %args.output.display(), "wrote activity export");

    Ok(ExportSummary {
        rows: rows.len(),
        output: args.output.clone(),
    })
}
