use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp layout written to the `crawl_time` column. Lexicographic
/// order of this layout matches chronological order.
pub const CRAWL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns owned by the crawler, in the order they are written.
pub const RECORD_COLUMNS: [&str; 9] = [
    "topic",
    "title",
    "link",
    "content",
    "has_image",
    "has_poll",
    "like",
    "comment",
    "crawl_time",
];

/// One forum post as seen on the listing page, plus the body text fetched
/// from its detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub topic: String,
    pub title: String,
    pub link: String,
    pub content: String,
    pub has_image: bool,
    pub has_poll: bool,
    pub like: u64,
    pub comment: u64,
    pub crawl_time: Option<NaiveDateTime>,
}

impl Record {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            topic: String::new(),
            title: title.into(),
            link: link.into(),
            content: String::new(),
            has_image: false,
            has_poll: false,
            like: 0,
            comment: 0,
            crawl_time: None,
        }
    }

    /// Body length in characters, not bytes.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Stamp the record with the current local time unless it already has one.
    pub fn stamp_if_missing(&mut self) {
        if self.crawl_time.is_none() {
            self.crawl_time = Some(Local::now().naive_local());
        }
    }

    /// Value for one of [`RECORD_COLUMNS`]; `None` for columns the record
    /// does not own.
    pub fn column_value(&self, column: &str) -> Option<String> {
        let value = match column {
            "topic" => self.topic.clone(),
            "title" => self.title.clone(),
            "link" => self.link.clone(),
            "content" => self.content.clone(),
            "has_image" => self.has_image.to_string(),
            "has_poll" => self.has_poll.to_string(),
            "like" => self.like.to_string(),
            "comment" => self.comment.to_string(),
            "crawl_time" => self
                .crawl_time
                .map(|t| t.format(CRAWL_TIME_FORMAT).to_string())
                .unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }
}
