use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use skylens_common::{Config, ReportFailure};
use skylens_insights::produce_report;

/// Account analytics for AT Protocol identities.
#[derive(Parser)]
#[command(name = "skylens", version)]
struct Args {
    /// Handle to analyze, with or without a leading @.
    handle: String,

    /// Print only the 30-day or 90-day sibling report.
    #[arg(long, value_parser = ["30", "90"])]
    window: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("skylens_insights=warn".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    bar.set_message("resolving identity");

    let progress_bar = bar.clone();
    let result = produce_report(&config, &args.handle, move |pages| {
        progress_bar.set_message(format!("{pages} pages fetched"));
        progress_bar.tick();
    })
    .await;

    bar.finish_and_clear();
    match result {
        Ok(report) => {
            let output = match args.window.as_deref() {
                Some("30") => serde_json::to_string_pretty(&report.last_30_days)?,
                Some("90") => serde_json::to_string_pretty(&report.last_90_days)?,
                _ => serde_json::to_string_pretty(&report)?,
            };
            println!("{output}");
            Ok(())
        }
        Err(err) => {
            let failure = ReportFailure::from(&err);
            eprintln!("{}", serde_json::to_string_pretty(&failure)?);
            std::process::exit(1);
        }
    }
}
