//! # Threadcast
//!
//! Crawls the best-posts listing of a community site into a CSV store
//! and prepares the stored posts for narration.
//!
//! ## Architecture
//!
//! The crawl stage is a sequential pipeline run on an interval:
//!
//! ```text
//! Page Fetcher → Listing Parser → Detail Fetcher → Accumulator → Store
//! ```
//!
//! Downstream stages read the store:
//!
//! ```text
//! Store → Rewrite (local LLM) → processed store → Narration scripts
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # One crawl cycle
//! threadcast crawl
//!
//! # Crawl every 5 minutes until Ctrl+C
//! threadcast run --interval 5m
//!
//! # Inspect the store
//! threadcast list --limit 20
//! ```

/// Filtering, merging and deduplication of crawled records.
pub mod accumulator;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the crawler,
/// accumulator and store from a loaded [`Config`](config::Config).
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/threadcast/config.toml`.
pub mod config;

/// One crawl cycle with attempt-level retry.
pub mod crawler;

/// Interval scheduler.
///
/// - `threadcast run` - Run the scheduler in the foreground
/// - `threadcast stop` - Stop it via its PID file
/// - `threadcast status` - Check if it is running
pub mod daemon;

/// Core domain models.
///
/// - [`Record`](domain::Record): One crawled post
/// - [`RecordOutcome`](domain::RecordOutcome): Per-entry parse result
/// - [`CycleOutcome`](domain::CycleOutcome): Per-cycle crawl result
pub mod domain;

/// Plain HTTP reachability check run before driving the browser.
pub mod fetcher;

/// Narration script generation from rewritten posts.
pub mod narrate;

/// Listing page HTML to records.
pub mod parser;

/// Post rewriting through a llama.cpp-compatible server.
pub mod rewrite;

/// Headless Chrome page fetching via chromiumoxide.
///
/// - [`PageFetcher`](scraper::PageFetcher): Rendered listing pages
/// - [`DetailFetcher`](scraper::DetailFetcher): Post body text
/// - [`BrowserSession`](scraper::BrowserSession): Browser capability trait
pub mod scraper;

/// CSV persistence.
///
/// - [`Store`](store::Store): Whole-table load/save trait
/// - [`CsvStore`](store::CsvStore): CSV file implementation
pub mod store;
