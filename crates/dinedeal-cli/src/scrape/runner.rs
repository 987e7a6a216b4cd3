//! Run orchestration: plan due tasks, execute them with bounded parallelism,
//! and persist one record update per task plus the run summary.

use std::collections::BTreeSet;

use chrono::Utc;
use dinedeal_core::{
    AppConfig, HostBlock, OfferStore, ParseResult, Place, ProviderKey, RunSummary, RunTally,
    ScrapeStatus,
};
use dinedeal_scraper::{host_of, parser_for, DomainThrottle, PageClient, ScraperError};
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use super::reconcile::reconcile;
use super::scheduler::{plan_place, ScrapeTask};

const BLOCKED_MESSAGE: &str = "Domain temporarily blocked";

/// Knobs for a run taken from [`AppConfig`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunSettings {
    pub max_concurrent_tasks: usize,
    pub offer_text_limit: usize,
}

impl RunSettings {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            max_concurrent_tasks: config.max_concurrent_tasks,
            offer_text_limit: config.offer_text_limit,
        }
    }
}

/// Flags from the `scrape` command.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScrapeOptions {
    pub force: bool,
    /// Restrict the run to these place ids. Empty means every place.
    pub place_ids: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub(crate) struct RunReport {
    /// `None` for a dry run.
    pub summary: Option<RunSummary>,
    pub tasks_planned: usize,
    /// Filter ids that matched no place.
    pub missing_place_ids: Vec<String>,
}

/// Executes one scrape run against `store`.
///
/// Per-task failures end up in the task's record and counts; only store
/// failures while creating the run, listing places, reading provider
/// records, or finishing the run are returned as errors.
///
/// # Errors
///
/// Returns an error if the store cannot create or finish the run, list
/// places, or read provider records.
pub(crate) async fn run_scrape<S: OfferStore>(
    store: &S,
    client: &PageClient,
    throttle: &DomainThrottle,
    settings: RunSettings,
    options: &ScrapeOptions,
) -> anyhow::Result<RunReport> {
    let started = if options.dry_run {
        None
    } else {
        let summary = RunSummary::start(Uuid::new_v4(), Utc::now());
        store.create_run(&summary).await?;
        tracing::info!(run_id = %summary.run_id, "scrape run started");
        restore_host_blocks(store, throttle).await;
        Some(summary)
    };

    let (places, missing_place_ids) = select_places(store.list_places().await?, &options.place_ids);
    for id in &missing_place_ids {
        tracing::warn!(place_id = %id, "no place matches filter id");
    }

    let now = Utc::now();
    let mut tasks = Vec::new();
    for place in &places {
        let records = store.provider_records(&place.id).await?;
        tasks.extend(plan_place(place, &records, options.force, now));
    }
    let tasks_planned = tasks.len();
    tracing::info!(places = places.len(), tasks = tasks_planned, "scrape plan ready");

    let Some(started) = started else {
        print_plan(&tasks);
        return Ok(RunReport {
            summary: None,
            tasks_planned,
            missing_place_ids,
        });
    };

    let max_concurrent = settings.max_concurrent_tasks.max(1);
    let outcomes: Vec<(ProviderKey, ScrapeStatus)> = stream::iter(tasks)
        .map(|task| execute_task(store, client, throttle, settings.offer_text_limit, task))
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let summary = started.finish(RunTally::fold(outcomes), Utc::now());
    store.finish_run(&summary).await?;
    tracing::info!(
        run_id = %summary.run_id,
        ok = summary.counts.ok,
        blocked = summary.counts.blocked,
        error = summary.counts.error,
        parse_error = summary.counts.parse_error,
        "scrape run finished"
    );
    let now = Utc::now();
    for block in throttle.blocked_hosts() {
        if block.blocked_until > now {
            tracing::info!(host = %block.host, until = %block.blocked_until, "host still in backoff");
        }
    }

    Ok(RunReport {
        summary: Some(summary),
        tasks_planned,
        missing_place_ids,
    })
}

/// Loads persisted backoff into `throttle`. A store failure only costs the
/// restored blocks, so it is logged and ignored.
async fn restore_host_blocks<S: OfferStore>(store: &S, throttle: &DomainThrottle) {
    match store.load_host_blocks().await {
        Ok(blocks) => {
            for block in blocks {
                tracing::info!(host = %block.host, until = %block.blocked_until, "restoring host backoff");
                throttle.block_host_until(&block.host, block.blocked_until);
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not load host backoff; continuing without it"),
    }
}

/// Applies the id filter. Blank ids are ignored; ids are trimmed. Returns the
/// kept places and the filter ids that matched nothing, in filter order.
fn select_places(places: Vec<Place>, filter: &[String]) -> (Vec<Place>, Vec<String>) {
    let wanted: BTreeSet<&str> = filter
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();
    if wanted.is_empty() {
        return (places, Vec::new());
    }

    let kept: Vec<Place> = places
        .into_iter()
        .filter(|place| wanted.contains(place.id.as_str()))
        .collect();
    let found: BTreeSet<&str> = kept.iter().map(|place| place.id.as_str()).collect();

    let mut missing = Vec::new();
    for id in filter.iter().map(|id| id.trim()) {
        if !id.is_empty() && !found.contains(id) && !missing.iter().any(|m| m == id) {
            missing.push(id.to_owned());
        }
    }
    (kept, missing)
}

fn print_plan(tasks: &[ScrapeTask]) {
    println!("dry-run: {} task(s) due", tasks.len());
    for task in tasks {
        println!("  {:<24} {:<16} {}", task.place_id, task.provider, task.url);
    }
}

/// Runs one task to completion and writes its record update. Always yields
/// a status; a failed write is logged and does not change it.
async fn execute_task<S: OfferStore>(
    store: &S,
    client: &PageClient,
    throttle: &DomainThrottle,
    text_limit: usize,
    task: ScrapeTask,
) -> (ProviderKey, ScrapeStatus) {
    let result = fetch_and_parse(store, client, throttle, text_limit, &task).await;
    let status = result.status;
    let offers = result.offers.len();
    if let Some(message) = result.error_message.as_deref() {
        tracing::info!(
            place_id = %task.place_id,
            provider = %task.provider,
            status = status.as_str(),
            error = message,
            "task finished"
        );
    } else {
        tracing::info!(
            place_id = %task.place_id,
            provider = %task.provider,
            status = status.as_str(),
            offers,
            "task finished"
        );
    }

    let update = reconcile(task.prior.as_ref(), &result);
    if let Err(e) = store
        .upsert_provider_record(&task.place_id, task.provider, &update)
        .await
    {
        tracing::error!(
            place_id = %task.place_id,
            provider = %task.provider,
            error = %e,
            "failed to write provider record"
        );
    }

    (task.provider, status)
}

/// Throttled fetch followed by the provider parser.
///
/// The host permit is held until parsing finishes so secondary requests a
/// parser makes to the same host count against the same slot.
async fn fetch_and_parse<S: OfferStore>(
    store: &S,
    client: &PageClient,
    throttle: &DomainThrottle,
    text_limit: usize,
    task: &ScrapeTask,
) -> ParseResult {
    let provider = task.provider;
    let url = task.url.as_str();
    let fail = |status, message: String| ParseResult::failure(provider, url, status, message);

    let Some(host) = host_of(url) else {
        return fail(ScrapeStatus::Error, "Invalid URL".to_owned());
    };
    if throttle.is_blocked(&host) {
        return fail(ScrapeStatus::Blocked, BLOCKED_MESSAGE.to_owned());
    }
    let Some(parser) = parser_for(provider) else {
        return fail(ScrapeStatus::ParseError, "Parser not implemented".to_owned());
    };

    let permit = throttle.acquire(&host).await;
    // Another task may have been rate limited while this one waited.
    if throttle.is_blocked(&host) {
        return fail(ScrapeStatus::Blocked, BLOCKED_MESSAGE.to_owned());
    }
    throttle.jitter_delay().await;

    let html = match client.fetch_page(url).await {
        Ok(html) => html,
        Err(ScraperError::RateLimited { status, .. }) => {
            let blocked_until = throttle.block_host(&host);
            let block = HostBlock {
                host: host.clone(),
                blocked_until,
            };
            if let Err(e) = store.save_host_block(&block).await {
                tracing::warn!(host = %host, error = %e, "failed to persist host backoff");
            }
            return fail(ScrapeStatus::Blocked, format!("HTTP {status}")).with_http_status(status);
        }
        Err(ScraperError::UnexpectedStatus { status, .. }) => {
            return fail(ScrapeStatus::Error, format!("HTTP {status}")).with_http_status(status);
        }
        Err(e) => return fail(ScrapeStatus::Error, e.to_string()),
    };

    let result = parser.parse(client, &html, url, text_limit).await;
    throttle.release(permit);
    result
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
