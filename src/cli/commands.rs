use std::path::Path;
use std::sync::Arc;

use crate::app::{AppContext, PipelineError, Result};
use crate::config::Config;
use crate::daemon::{self, ScheduleConfig, Scheduler};
use crate::domain::RecordOutcome;
use crate::narrate;
use crate::parser::ListingParser;
use crate::rewrite::{LlamaClient, Rewriter};
use crate::store::{CsvStore, Store};

pub async fn run_scheduler(
    ctx: AppContext,
    interval: Option<&str>,
    no_initial_cycle: bool,
) -> Result<()> {
    let mut schedule = ctx.config.schedule.clone();
    if let Some(interval) = interval {
        schedule.interval_secs = ScheduleConfig::parse_interval(interval)
            .map_err(|e| PipelineError::Config(format!("Invalid interval: {}", e)))?;
    }
    if no_initial_cycle {
        schedule.run_on_start = false;
    }

    println!(
        "Crawling {} every {} (Ctrl+C to stop)",
        ctx.config.site.listing_url,
        ScheduleConfig::format_interval(schedule.interval_secs)
    );
    println!("Store: {}", ctx.store.path().display());

    let scheduler = Scheduler::new(Arc::new(ctx), schedule);
    scheduler.run().await
}

pub async fn crawl_once(ctx: &AppContext) -> Result<()> {
    let url = &ctx.config.site.listing_url;
    println!("Crawling {}...", url);

    let outcome = ctx.crawler.run_cycle(url).await;
    if outcome.is_failed() {
        println!(
            "Crawl failed after {} attempts; store left untouched",
            outcome.attempts()
        );
        return Ok(());
    }

    let fetched = outcome.records().len();
    let report = ctx
        .accumulator
        .accumulate(&ctx.store, outcome.into_records())?;

    println!(
        "Fetched {} posts, {} passed the filter, {} new",
        fetched,
        report.accepted,
        report.added()
    );
    println!("{} posts in {}", report.total, ctx.store.path().display());
    Ok(())
}

pub fn parse_file(config: &Config, path: &Path) -> Result<()> {
    let html = std::fs::read_to_string(path)?;
    let parser = ListingParser::new(config.site.clone())?;
    let outcomes = parser.parse(&html);

    if outcomes.is_empty() {
        println!("No entries matched '{}'", config.site.entry_selector);
        return Ok(());
    }

    let mut kept = 0;
    for outcome in outcomes {
        match outcome {
            RecordOutcome::Kept(record) => {
                kept += 1;
                let mut markers = String::new();
                if record.has_image {
                    markers.push_str(" [img]");
                }
                if record.has_poll {
                    markers.push_str(" [poll]");
                }
                println!(
                    "{:>5} likes {:>4} comments  [{}] {}{}\n  {}",
                    record.like,
                    record.comment,
                    record.topic,
                    record.display_title(),
                    markers,
                    record.link
                );
            }
            RecordOutcome::Skipped { index, reason } => {
                eprintln!("  ! entry {} skipped: {}", index + 1, reason);
            }
        }
    }

    println!("\n{} entries parsed", kept);
    Ok(())
}

pub fn list_posts(ctx: &AppContext, limit: usize) -> Result<()> {
    let table = ctx.store.load()?;

    if table.is_empty() {
        println!("No posts in {}", ctx.store.path().display());
        return Ok(());
    }

    println!("{} posts in {}", table.len(), ctx.store.path().display());
    for row in 0..table.len().min(limit) {
        let time = table.get(row, "crawl_time").unwrap_or("");
        let like = table.get(row, "like").unwrap_or("");
        let title = table.get(row, "title").unwrap_or("");
        let chars = table.get(row, "content").map_or(0, |c| c.chars().count());
        println!("{:<19} {:>5} likes {:>6} chars  {}", time, like, chars, title);
    }

    Ok(())
}

pub async fn rewrite_posts(ctx: &AppContext) -> Result<()> {
    let output = CsvStore::new(AppContext::processed_path(&ctx.config)?);
    let model = LlamaClient::new(ctx.config.rewrite.clone())?;
    let rewriter = Rewriter::new(model, ctx.config.rewrite.clone());

    println!("Rewriting posts with {}...", ctx.config.rewrite.endpoint);
    let report = rewriter.run(&ctx.store, &output).await?;

    if report.processed() == 0 {
        println!("Nothing to rewrite");
        return Ok(());
    }

    println!(
        "Rewrite complete: {} generated, {} rejected, {} too short, {} errors",
        report.generated, report.rejected, report.insufficient, report.failed
    );
    println!("Output: {}", output.path().display());
    Ok(())
}

pub fn narrate_posts(config: &Config) -> Result<()> {
    let source = CsvStore::new(AppContext::processed_path(config)?);
    let dir = AppContext::narration_dir(config)?;

    let report = narrate::write_scripts(&source, &dir)?;
    for path in &report.written {
        println!("  + {}", path.display());
    }
    println!(
        "Narration complete: {} scripts, {} skipped",
        report.written.len(),
        report.skipped
    );
    Ok(())
}

pub fn scheduler_status() {
    println!("{}", daemon::scheduler_status());
}

pub fn stop_scheduler() -> Result<()> {
    daemon::stop_scheduler().map_err(PipelineError::Other)?;
    println!("Scheduler stopped");
    Ok(())
}
