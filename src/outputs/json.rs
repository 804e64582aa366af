//! JSON report output.
//!
//! The report holds the blog, a generation timestamp and, for each article,
//! its ranked topics:
//!
//! ```json
//! {
//!   "blog": "Scrapping Hub",
//!   "url": "https://blog.scrapinghub.com/",
//!   "generated_at": "2025-05-06T20:30:00+00:00",
//!   "articles": [
//!     { "url": "...", "title": "...",
//!       "topics": [ { "topic_id": 3, "score": 0.81, "terms": [["crawl", 0.021]] } ] }
//!   ]
//! }
//! ```

use crate::models::{ArticleReport, Blog, RunReport};
use chrono::Utc;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Assemble a [`RunReport`] stamped with the current UTC time.
pub fn build_report(blog: &Blog, articles: Vec<ArticleReport>) -> RunReport {
    RunReport {
        blog: blog.name.clone(),
        url: blog.url.clone(),
        generated_at: Utc::now().to_rfc3339(),
        articles,
    }
}

/// Write `report` as pretty-printed JSON to `path`.
///
/// # Arguments
///
/// * `report` - The run report to serialize
/// * `path` - Destination file, replaced if it exists
///
/// # Returns
///
/// `Ok(())` on success, or an error if serialization or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(report: &RunReport, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write JSON report");
        return Err(e.into());
    }
    info!(articles = report.articles.len(), "Wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopicScore;

    #[tokio::test]
    async fn test_write_report_round_trip() {
        let blog = Blog::new("Example", "https://blog.example.com/");
        let report = build_report(
            &blog,
            vec![ArticleReport {
                url: "https://blog.example.com/a".to_string(),
                title: "A".to_string(),
                topics: vec![TopicScore {
                    topic_id: 1,
                    score: 0.9,
                    terms: vec![("crawl".to_string(), 0.02)],
                }],
            }],
        );
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&report, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: RunReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.blog, "Example");
        assert_eq!(back.articles[0].topics[0].terms[0].0, "crawl");
    }

    #[tokio::test]
    async fn test_write_report_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let report = build_report(&Blog::new("Example", "https://blog.example.com/"), vec![]);
        assert!(write_report(&report, &path).await.is_err());
    }
}
