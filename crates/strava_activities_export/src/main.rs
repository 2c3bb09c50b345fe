use anyhow::Context;
use clap::Parser;
use strava_activities_client::config::Config;
use strava_activities_export::cli::ExportArgs;
use strava_activities_export::{logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Credentials usually live in a local .env next to the binary
    dotenvy::dotenv().ok();
    let args = ExportArgs::parse();
    logging::init();

    let config = Config::from_env().context("failed to load Strava configuration")?;
    match run(&args, config).await {
        Ok(summary) => {
            println!(
                "Exported {} activities to {}",
                summary.rows,
                summary.output.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "activity export failed");
            Err(e).context("activity export failed")
        }
    }
}
