//! Blog index and post-body scraper.
//!
//! The index page lists posts as anchors matched by a CSS selector
//! (`div.post-header > h2 > a` by default); each anchor becomes an
//! [`ArticleLink`]. A post's body is the text of the first element matching the
//! body selector (`.post-body` by default).
//!
//! # Extraction rules
//!
//! - Links keep document order, with no deduplication and no pagination.
//! - `href` and link text are copied exactly, without URL resolution or trimming.
//! - Body text is the concatenation of every text node under the container.
//! - A missing container or `href` is an error, never an empty string.

use crate::error::{Error, Result};
use crate::models::{Article, ArticleLink, Blog, FailurePolicy};
use crate::scrapers::Fetch;
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument, warn};

/// Compile a CSS selector, keeping the selector text in the error.
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Extract post links from an index page, in document order.
pub fn parse_index(html: &str, selector: &str) -> Result<Vec<ArticleLink>> {
    let compiled = parse_selector(selector)?;
    let document = Html::parse_document(html);

    document
        .select(&compiled)
        .map(|element| {
            let url = element
                .value()
                .attr("href")
                .ok_or_else(|| Error::MissingAttribute {
                    selector: selector.to_string(),
                    attribute: "href".to_string(),
                })?;
            Ok(ArticleLink {
                url: url.to_string(),
                title: element.text().collect::<String>(),
            })
        })
        .collect()
}

/// Text of the first element matching `selector`.
///
/// `context` names the page in the error message when nothing matches.
pub fn extract_body(html: &str, selector: &str, context: &str) -> Result<String> {
    let compiled = parse_selector(selector)?;
    let document = Html::parse_document(html);

    document
        .select(&compiled)
        .next()
        .map(|element| element.text().collect::<String>())
        .ok_or_else(|| Error::MissingElement {
            selector: selector.to_string(),
            context: context.to_string(),
        })
}

impl ArticleLink {
    /// Download the post and extract its body.
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    pub async fn fetch<F: Fetch>(&self, fetcher: &F, body_selector: &str) -> Result<Article> {
        let html = fetcher.fetch_text(&self.url).await?;
        let body = extract_body(&html, body_selector, &self.url)?;
        info!(bytes = body.len(), "Parsed article body");
        debug!(preview = %truncate_for_log(body.trim(), 120), "Article body");

        Ok(Article {
            url: self.url.clone(),
            title: self.title.clone(),
            body,
            update_date: None,
        })
    }
}

impl Blog {
    /// Fetch the index page and list its posts.
    #[instrument(level = "info", skip_all, fields(blog = %self.name, url = %self.url))]
    pub async fn scan_index<F: Fetch>(
        &self,
        fetcher: &F,
        index_selector: &str,
    ) -> Result<Vec<ArticleLink>> {
        let html = fetcher.fetch_text(&self.url).await?;
        let links = parse_index(&html, index_selector)?;

        info!(count = links.len(), "Indexed blog posts");
        debug!(urls = ?links.iter().map(|l| l.url.as_str()).collect::<Vec<_>>(), "Post URLs");
        Ok(links)
    }

    /// Fetch every listed post in order and append it to `self.articles`.
    ///
    /// With [`FailurePolicy::Abort`] the first failure is returned and the
    /// articles fetched so far are kept. With [`FailurePolicy::Skip`] failures
    /// are logged and counted. Returns the number of skipped posts.
    #[instrument(level = "info", skip_all, fields(blog = %self.name, count = links.len()))]
    pub async fn fetch_articles<F: Fetch>(
        &mut self,
        fetcher: &F,
        links: &[ArticleLink],
        body_selector: &str,
        policy: FailurePolicy,
    ) -> Result<usize> {
        let mut skipped = 0usize;

        for link in links {
            match link.fetch(fetcher, body_selector).await {
                Ok(article) => self.articles.push(article),
                Err(e) => match policy {
                    FailurePolicy::Abort => {
                        error!(error = %e, url = %link.url, "Article fetch failed");
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        warn!(error = %e, url = %link.url, "Article fetch failed; skipping");
                        skipped += 1;
                    }
                },
            }
        }

        info!(
            fetched = self.articles.len(),
            skipped, "Fetched blog article contents"
        );
        Ok(skipped)
    }
}
