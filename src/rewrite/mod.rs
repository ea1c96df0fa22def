//! Rewrite stage: turn stored posts into first-person narrations with a
//! local language model.
//!
//! ```text
//! crawl store → pending rows → prompt → llama server → postprocess → processed store
//! ```

mod config;
pub mod llama;
pub mod prompt;

pub use config::RewriteConfig;
pub use llama::LlamaClient;

use std::collections::HashSet;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::app::Result;
use crate::store::{Store, Table};

/// Written instead of a narration when the post is too short to send.
pub const INSUFFICIENT_CONTENT: &str = "insufficient content";

/// Written instead of a narration when the model's answer was rejected.
pub const REJECTED_OUTPUT: &str = "generation failed: response too short";

/// Prefix of the marker written when the model call itself failed.
pub const ERROR_PREFIX: &str = "error: ";

/// Text generation backend.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteReport {
    pub generated: usize,
    pub rejected: usize,
    pub insufficient: usize,
    pub failed: usize,
}

impl RewriteReport {
    pub fn processed(&self) -> usize {
        self.generated + self.rejected + self.insufficient + self.failed
    }
}

pub struct Rewriter<C: Completion> {
    model: C,
    config: RewriteConfig,
}

impl<C: Completion> Rewriter<C> {
    pub fn new(model: C, config: RewriteConfig) -> Self {
        Self { model, config }
    }

    /// Rewrite every post of `input` that has no narration yet and is not
    /// already in `output`, then save `output` with the new rows appended.
    ///
    /// Per-row failures are recorded in the row and never stop the batch.
    pub async fn run<I, O>(&self, input: &I, output: &O) -> Result<RewriteReport>
    where
        I: Store + ?Sized,
        O: Store + ?Sized,
    {
        let source = input.load()?;
        let mut processed = output.load()?;

        let done: HashSet<String> = (0..processed.len())
            .filter(|&i| !processed.get(i, "generated_text").unwrap_or("").is_empty())
            .filter_map(|i| processed.get(i, "link").map(String::from))
            .collect();

        let pending: Vec<usize> = source
            .rows_missing("generated_text")
            .into_iter()
            .filter(|&i| !done.contains(source.get(i, "link").unwrap_or("")))
            .collect();

        if pending.is_empty() {
            info!("No new posts to rewrite");
            return Ok(RewriteReport::default());
        }

        let mut batch = source.select_rows(&pending);
        let report = self.rewrite_rows(&mut batch).await;

        processed.append(&batch);
        processed.dedup_by("link");
        output.save(&processed)?;

        info!(
            "Rewrote {} posts: {} generated, {} rejected, {} too short, {} failed",
            report.processed(),
            report.generated,
            report.rejected,
            report.insufficient,
            report.failed
        );
        Ok(report)
    }

    async fn rewrite_rows(&self, batch: &mut Table) -> RewriteReport {
        let mut report = RewriteReport::default();
        batch.ensure_column("generated_text");
        batch.ensure_column("processing_time");
        let total = batch.len();

        for row in 0..total {
            let content = batch.get(row, "content").unwrap_or("").trim().to_string();
            if content.chars().count() < self.config.min_input_chars {
                batch.set(row, "generated_text", INSUFFICIENT_CONTENT);
                report.insufficient += 1;
                continue;
            }

            let started = Instant::now();
            let prompt = prompt::format_prompt(&self.config.system_prompt, &content);

            let text = match self.model.complete(&prompt).await {
                Ok(raw) => match prompt::postprocess(
                    &raw,
                    self.config.min_output_chars,
                    self.config.min_sentences,
                ) {
                    Some(text) => {
                        report.generated += 1;
                        text
                    }
                    None => {
                        report.rejected += 1;
                        REJECTED_OUTPUT.to_string()
                    }
                },
                Err(e) => {
                    warn!("Rewrite of row {} failed: {}", row + 1, e);
                    report.failed += 1;
                    format!("{}{}", ERROR_PREFIX, e)
                }
            };

            let elapsed = started.elapsed().as_secs_f64();
            batch.set(row, "generated_text", text);
            batch.set(row, "processing_time", format!("{:.2}", elapsed));
            info!("Rewrote {}/{} in {:.2}s", row + 1, total, elapsed);
        }

        report
    }
}
