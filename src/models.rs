//! Data models for scraped posts and their topic classifications.
//!
//! - [`ArticleLink`]: one entry of the blog index (link + title), no body yet
//! - [`Article`]: a post whose body has been fetched and extracted
//! - [`Blog`]: the blog being scanned and the articles fetched from it
//! - [`TopicScore`], [`ArticleReport`], [`RunReport`]: classification output,
//!   serialisable for the JSON report
//!
//! None of these types perform I/O on construction. Fetching is an explicit
//! step implemented in [`crate::scrapers::blog`].

use serde::{Deserialize, Serialize};

/// A post as listed on the blog index page.
///
/// `url` is the anchor's `href` and `title` its text, both copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleLink {
    pub url: String,
    pub title: String,
}

/// A post whose body text has been scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// The post URL, as found on the index page.
    pub url: String,
    /// The post title, as found on the index page.
    pub title: String,
    /// Text content of the post body container.
    pub body: String,
    /// Last update date. Never scraped; kept so reports have a stable shape.
    pub update_date: Option<String>,
}

/// A blog and the articles fetched from its index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub name: String,
    pub url: String,
    /// Articles in index order.
    pub articles: Vec<Article>,
}

impl Blog {
    /// Describe a blog. No network access happens here; see
    /// [`Blog::scan_index`](crate::scrapers::blog) and `fetch_articles`.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            articles: Vec::new(),
        }
    }
}

/// What to do when a single article cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    #[default]
    Abort,
    /// Log the failure and continue with the next article.
    Skip,
}

/// One topic's share of a document, with the terms that define the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic_id: usize,
    pub score: f64,
    /// Top terms of the topic with their weight in the topic-term distribution.
    pub terms: Vec<(String, f64)>,
}

/// Ranked topics for one article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleReport {
    pub url: String,
    pub title: String,
    pub topics: Vec<TopicScore>,
}

/// Everything a run produced, as written by `--json-output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub blog: String,
    pub url: String,
    /// RFC 3339 timestamp of when the report was assembled.
    pub generated_at: String,
    pub articles: Vec<ArticleReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_new_does_not_fetch() {
        let blog = Blog::new("Scrapping Hub", "https://blog.scrapinghub.com/");
        assert_eq!(blog.name, "Scrapping Hub");
        assert_eq!(blog.url, "https://blog.scrapinghub.com/");
        assert!(blog.articles.is_empty());
    }

    #[test]
    fn test_failure_policy_defaults_to_abort() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }

    #[test]
    fn test_run_report_serialization() {
        let report = RunReport {
            blog: "Example".to_string(),
            url: "https://example.com/".to_string(),
            generated_at: "2025-05-06T20:30:00+00:00".to_string(),
            articles: vec![ArticleReport {
                url: "https://example.com/a".to_string(),
                title: "A post".to_string(),
                topics: vec![TopicScore {
                    topic_id: 3,
                    score: 0.75,
                    terms: vec![("space".to_string(), 0.02)],
                }],
            }],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"topic_id\":3"));
        assert!(json.contains("\"space\""));

        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.articles[0].topics[0].topic_id, 3);
        assert_eq!(back.articles[0].title, "A post");
    }

    #[test]
    fn test_article_update_date_is_optional() {
        let json = r#"{
            "url": "https://example.com/a",
            "title": "A",
            "body": "text",
            "update_date": null
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.update_date, None);
    }
}
