//! Page fetching and blog scraping.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: fetch the blog index and list its posts ([`blog`])
//! 2. **Fetching**: download each post and extract its body text
//!
//! Network access goes through the [`Fetch`] trait so the parsing code can be
//! driven from static fixtures. [`HttpFetcher`] is the `reqwest` implementation
//! used by the binary. Pages are fetched one at a time and failures are
//! returned to the caller, never retried.

pub mod blog;

use crate::config::HttpConfig;
use crate::error::Result;
use std::time::Duration;
use tracing::{debug, instrument};

/// Something that can turn a URL into page text.
pub trait Fetch {
    /// GET `url` and return the decoded response body.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// [`Fetch`] implementation backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from the `http` config section.
    ///
    /// # Arguments
    ///
    /// * `config` - User agent and optional request timeout
    ///
    /// # Returns
    ///
    /// A fetcher sharing one connection pool across all requests.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] if the TLS backend cannot be initialised.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Fetch for HttpFetcher {
    /// Non-2xx responses are returned as [`crate::Error::Http`].
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "Fetched page");
        Ok(text)
    }
}

/// In-memory page map used by tests in place of the network.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: std::collections::HashMap<String, String>,
    requests: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Fetch for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("no fixture for {url}"))
                .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request on a loopback port with `response`.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    fn loopback_fetcher() -> HttpFetcher {
        HttpFetcher {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    #[test]
    fn test_http_fetcher_builds_with_defaults() {
        let fetcher = HttpFetcher::new(&HttpConfig::default());
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body_on_success() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 9\r\nConnection: close\r\n\r\n<p>hi</p>",
        )
        .await;

        let text = loopback_fetcher().fetch_text(&format!("{base}/")).await.unwrap();
        assert_eq!(text, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_http_fetcher_non_success_status_is_http_error() {
        let base =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;

        let result = loopback_fetcher().fetch_text(&format!("{base}/missing")).await;
        match result {
            Err(Error::Http(e)) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
            other => panic!("expected an HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_static_fetcher_serves_fixtures() {
        let fetcher = StaticFetcher::new().with_page("https://example.com/", "<p>hi</p>");
        let text = fetcher.fetch_text("https://example.com/").await.unwrap();
        assert_eq!(text, "<p>hi</p>");

        let missing = fetcher.fetch_text("https://example.com/missing").await;
        assert!(matches!(missing, Err(Error::Io(_))));
        assert_eq!(
            fetcher.requests(),
            vec!["https://example.com/", "https://example.com/missing"]
        );
    }
}
