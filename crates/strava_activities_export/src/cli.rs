use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use strava_activities_client::{FetchOptions, MAX_PER_PAGE};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "strava-export",
    about = "Export Strava activities to a semicolon-delimited file"
)]
pub struct ExportArgs {
    /// Destination file; parent directories are created.
    #[arg(long, default_value = "output/strava_activities.csv")]
    pub output: PathBuf,

    /// Activities requested per page (Strava allows at most 100).
    #[arg(long, default_value_t = MAX_PER_PAGE, value_parser = clap::value_parser!(u32).range(1..=MAX_PER_PAGE as i64))]
    pub per_page: u32,

    /// Stop after this many pages.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Keep requesting pages until Strava returns an empty one.
    #[arg(long, conflicts_with = "max_pages")]
    pub all_pages: bool,

    /// Only export activities that started after this Unix timestamp.
    #[arg(long)]
    pub after: Option<i64>,

    /// Pause between page requests, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub page_delay_ms: u64,
}

impl ExportArgs {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            after: self.after,
            per_page: self.per_page,
            max_pages: (!self.all_pages).then_some(self.max_pages),
        }
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}
