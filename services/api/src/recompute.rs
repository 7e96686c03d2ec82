use crate::infra::{build_service, load_fixture};
use clap::Args;
use internship_match::config::AppConfig;
use internship_match::error::AppError;
use internship_match::workflows::matching::{recompute_all_parallel, RecomputeSummary};
use internship_match::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct RecomputeArgs {
    /// JSON fixture of departments, students, and internships
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Override the configured number of postings allocated at once
    #[arg(long)]
    pub(crate) concurrency: Option<usize>,
    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_recompute(args: RecomputeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let fixture = load_fixture(Some(&args.fixture))?;
    let service = build_service(fixture, config.engine)?;
    let concurrency = args.concurrency.unwrap_or(config.batch.concurrency);

    let summary = recompute_all_parallel(service, concurrency).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        render_summary(&summary);
    }
    Ok(())
}

fn render_summary(summary: &RecomputeSummary) {
    println!("Batch recompute");
    println!("  Postings allocated: {}", summary.postings);
    println!(
        "  Matches: {} created, {} updated, {} unchanged, {} skipped",
        summary.created, summary.updated, summary.unchanged, summary.skipped
    );
    println!("  Expired: {}", summary.expired);
    println!("  Excluded candidates: {}", summary.excluded);
    println!("  Applications closed: {}", summary.applications_closed);

    if summary.failures.is_empty() {
        return;
    }
    println!("  Failures:");
    for failure in &summary.failures {
        match failure.internship_id {
            Some(id) => println!("    - internship {}: {}", id.0, failure.error),
            None => println!("    - {}", failure.error),
        }
    }
}
