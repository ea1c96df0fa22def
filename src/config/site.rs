use serde::{Deserialize, Serialize};

/// Where the listing lives and how its markup is shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Listing page crawled every cycle
    pub listing_url: String,

    /// Prefix for relative post links
    pub origin: String,

    /// Element whose presence means the listing has rendered
    pub listing_marker: String,

    /// One element per post once lazy content has loaded
    pub content_item: String,

    /// Container of a single post on the listing
    pub entry_selector: String,

    pub topic_selector: String,
    pub title_selector: String,
    pub like_selector: String,
    pub comment_selector: String,

    /// Class on the title link when the post carries an image
    pub image_class: String,

    /// Class on the title link when the post carries a poll
    pub poll_class: String,

    /// Body container on a post's own page
    pub detail_content_selector: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.teamblind.com/kr/".to_string(),
            origin: "https://www.teamblind.com".to_string(),
            listing_marker: "div.topic-list.best".to_string(),
            content_item: "div.article".to_string(),
            entry_selector: "div.topic-list.best div.article".to_string(),
            topic_selector: "span.topic a".to_string(),
            title_selector: "a.tit".to_string(),
            like_selector: "span.like".to_string(),
            comment_selector: "a.cmt".to_string(),
            image_class: "ico-img".to_string(),
            poll_class: "ico-poll".to_string(),
            detail_content_selector: "p.contents-txt#contentArea".to_string(),
        }
    }
}

impl SiteConfig {
    /// Make a post link absolute by prefixing the site origin.
    pub fn absolutize(&self, link: &str) -> String {
        if link.starts_with("http") {
            return link.to_string();
        }
        let origin = self.origin.trim_end_matches('/');
        if link.starts_with('/') {
            format!("{}{}", origin, link)
        } else {
            format!("{}/{}", origin, link)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_relative_link() {
        let site = SiteConfig::default();
        assert_eq!(site.absolutize("/p/123"), "https://www.teamblind.com/p/123");
        assert_eq!(site.absolutize("p/123"), "https://www.teamblind.com/p/123");
    }

    #[test]
    fn test_absolutize_keeps_absolute_link() {
        let site = SiteConfig::default();
        assert_eq!(
            site.absolutize("https://other.example/p/9"),
            "https://other.example/p/9"
        );
    }
}
