//! Listing page → records.
//!
//! Parsing is pure: the same HTML always yields the same outcomes. A
//! malformed entry becomes [`RecordOutcome::Skipped`] and does not affect
//! its neighbours.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::app::{PipelineError, Result};
use crate::config::SiteConfig;
use crate::domain::{Record, RecordOutcome};

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// First run of ASCII digits in `text`, e.g. `"좋아요 37"` → 37.
pub fn first_number(text: &str) -> Result<u64> {
    let digits = DIGITS
        .find(text)
        .ok_or_else(|| PipelineError::Parse(format!("no digits in {:?}", text.trim())))?;
    digits
        .as_str()
        .parse::<u64>()
        .map_err(|e| PipelineError::Parse(format!("{}: {}", digits.as_str(), e)))
}

struct Selectors {
    entry: Selector,
    topic: Selector,
    title: Selector,
    like: Selector,
    comment: Selector,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| PipelineError::Config(format!("invalid selector {}: {}", selector, e)))
}

/// Extracts partially populated records (no content yet) from a listing.
pub struct ListingParser {
    site: SiteConfig,
    selectors: Selectors,
}

impl ListingParser {
    pub fn new(site: SiteConfig) -> Result<Self> {
        let selectors = Selectors {
            entry: compile(&site.entry_selector)?,
            topic: compile(&site.topic_selector)?,
            title: compile(&site.title_selector)?,
            like: compile(&site.like_selector)?,
            comment: compile(&site.comment_selector)?,
        };
        Ok(Self { site, selectors })
    }

    /// One outcome per listing entry, in document order.
    pub fn parse(&self, html: &str) -> Vec<RecordOutcome> {
        let document = Html::parse_document(html);
        document
            .select(&self.selectors.entry)
            .enumerate()
            .map(|(index, entry)| match self.parse_entry(entry) {
                Ok(record) => RecordOutcome::Kept(record),
                Err(e) => RecordOutcome::Skipped {
                    index,
                    reason: e.to_string(),
                },
            })
            .collect()
    }

    fn parse_entry(&self, entry: ElementRef<'_>) -> Result<Record> {
        let topic = entry
            .select(&self.selectors.topic)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();

        let title_el = entry
            .select(&self.selectors.title)
            .next()
            .ok_or_else(|| PipelineError::Parse("missing title element".to_string()))?;

        let href = title_el
            .value()
            .attr("href")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| PipelineError::Parse("title element has no link".to_string()))?;

        let mut record = Record::new(element_text(&title_el), self.site.absolutize(href));
        record.topic = topic;

        let classes: Vec<&str> = title_el.value().classes().collect();
        record.has_image = classes.contains(&self.site.image_class.as_str());
        record.has_poll = classes.contains(&self.site.poll_class.as_str());

        record.like = self.counter(entry, &self.selectors.like, "like")?;
        record.comment = self.counter(entry, &self.selectors.comment, "comment")?;

        Ok(record)
    }

    fn counter(&self, entry: ElementRef<'_>, selector: &Selector, name: &str) -> Result<u64> {
        let element = entry
            .select(selector)
            .next()
            .ok_or_else(|| PipelineError::Parse(format!("missing {} counter", name)))?;
        first_number(&element_text(&element))
            .map_err(|e| PipelineError::Parse(format!("{} counter: {}", name, e)))
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
