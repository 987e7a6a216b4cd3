//! The `scrape` command: scheduling, per-task execution and reconciliation.
//!
//! Called from `main` after config is loaded. Task failures are recorded on
//! the task's provider record and never abort the run.

mod reconcile;
mod runner;
mod scheduler;

use dinedeal_core::{AppConfig, ScrapeStatus, StatusCounts};
use dinedeal_db::PgStore;
use dinedeal_scraper::{DomainThrottle, PageClient};

pub(crate) use runner::ScrapeOptions;
use runner::{run_scrape, RunReport, RunSettings};

/// Connects to Postgres and executes one run.
///
/// # Errors
///
/// Returns an error if the pool, HTTP client, or any run-level store call
/// fails.
pub(crate) async fn run_scrape_command(
    config: &AppConfig,
    options: &ScrapeOptions,
) -> anyhow::Result<()> {
    let pool_config = dinedeal_db::PoolConfig::from_app_config(config);
    let pool = dinedeal_db::connect_pool(&config.database_url, pool_config).await?;
    let store = PgStore::new(pool);

    let client = PageClient::new(config.request_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
    let throttle = DomainThrottle::from_config(config);

    let report = run_scrape(
        &store,
        &client,
        &throttle,
        RunSettings::from_config(config),
        options,
    )
    .await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    if !report.missing_place_ids.is_empty() {
        eprintln!(
            "warning: no place matches id(s): {}",
            report.missing_place_ids.join(", ")
        );
    }
    let Some(summary) = &report.summary else {
        return;
    };
    println!("run {} {}", summary.run_id, summary.status.as_str());
    println!("  total        {}", format_counts(&summary.counts));
    for (provider, counts) in &summary.providers {
        println!("  {:<12} {}", provider.as_str(), format_counts(counts));
    }
}

fn format_counts(counts: &StatusCounts) -> String {
    ScrapeStatus::ALL
        .iter()
        .map(|status| format!("{}={}", status.as_str(), counts.get(*status)))
        .collect::<Vec<_>>()
        .join(" ")
}
