//! Runtime configuration.
//!
//! Every setting has a default that reproduces the reference run: scan the
//! Scrapinghub blog, train an 8-topic model for 10 passes with 2 workers. A YAML
//! file can override any subset of fields, and CLI flags override the file.
//!
//! ```yaml
//! blog:
//!   name: Scrapping Hub
//!   url: https://blog.scrapinghub.com/
//! http:
//!   timeout_secs: 30
//! model:
//!   num_topics: 8
//!   seed: 7
//! ```

use crate::cli::Cli;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub blog: BlogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Display name of the blog
    #[serde(default = "default_blog_name")]
    pub name: String,
    /// Index page listing the posts
    #[serde(default = "default_blog_url")]
    pub url: String,
    /// Selector for post anchors on the index page
    #[serde(default = "default_index_selector")]
    pub index_selector: String,
    /// Selector for the body container on a post page
    #[serde(default = "default_body_selector")]
    pub body_selector: String,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            name: default_blog_name(),
            url: default_blog_url(),
            index_selector: default_index_selector(),
            body_selector: default_body_selector(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Whole-request timeout. None waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSON-lines file with the training split (one `{"text": ...}` per line)
    #[serde(default = "default_train_url")]
    pub train_url: String,
    /// JSON-lines file with the test split
    #[serde(default = "default_test_url")]
    pub test_url: String,
    /// Where downloaded splits are kept. Defaults to the user cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Extracted `20news-bydate` tree to read instead of downloading
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            train_url: default_train_url(),
            test_url: default_test_url(),
            cache_dir: None,
            local_dir: None,
        }
    }
}

impl CorpusConfig {
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("blog_topics")
        })
    }
}

/// Vocabulary pruning, LDA training and inference parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_num_topics")]
    pub num_topics: usize,
    #[serde(default = "default_passes")]
    pub passes: usize,
    /// Threads used for each E-step during training
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Documents per online update
    #[serde(default = "default_chunksize")]
    pub chunksize: usize,
    /// Maximum per-document variational iterations
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_gamma_threshold")]
    pub gamma_threshold: f64,
    #[serde(default = "default_decay")]
    pub decay: f64,
    #[serde(default = "default_offset")]
    pub offset: f64,
    /// Document-topic prior. None means 1 / num_topics.
    #[serde(default)]
    pub alpha: Option<f64>,
    /// Topic-word prior. None means 1 / num_topics.
    #[serde(default)]
    pub eta: Option<f64>,
    /// Drop terms found in fewer documents than this
    #[serde(default = "default_no_below")]
    pub no_below: usize,
    /// Drop terms found in more than this fraction of documents
    #[serde(default = "default_no_above")]
    pub no_above: f64,
    /// Vocabulary size cap
    #[serde(default = "default_keep_n")]
    pub keep_n: usize,
    /// Terms reported per topic
    #[serde(default = "default_top_terms")]
    pub top_terms: usize,
    /// Topics below this probability are not reported
    #[serde(default = "default_minimum_probability")]
    pub minimum_probability: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            num_topics: default_num_topics(),
            passes: default_passes(),
            workers: default_workers(),
            chunksize: default_chunksize(),
            iterations: default_iterations(),
            gamma_threshold: default_gamma_threshold(),
            decay: default_decay(),
            offset: default_offset(),
            alpha: None,
            eta: None,
            no_below: default_no_below(),
            no_above: default_no_above(),
            keep_n: default_keep_n(),
            top_terms: default_top_terms(),
            minimum_probability: default_minimum_probability(),
            seed: default_seed(),
        }
    }
}

impl ModelConfig {
    pub fn alpha(&self) -> f64 {
        self.alpha.unwrap_or(1.0 / self.num_topics as f64)
    }

    pub fn eta(&self) -> f64 {
        self.eta.unwrap_or(1.0 / self.num_topics as f64)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("num_topics", self.num_topics),
            ("passes", self.passes),
            ("workers", self.workers),
            ("chunksize", self.chunksize),
            ("iterations", self.iterations),
            ("keep_n", self.keep_n),
            ("top_terms", self.top_terms),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(Error::Config(format!("model.{name} must be greater than zero")));
        }
        if !(self.no_above > 0.0 && self.no_above <= 1.0) {
            return Err(Error::Config("model.no_above must be in (0, 1]".into()));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(Error::Config("model.decay must be in (0, 1]".into()));
        }
        if self.offset <= 0.0 {
            return Err(Error::Config("model.offset must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.minimum_probability) {
            return Err(Error::Config(
                "model.minimum_probability must be in [0, 1]".into(),
            ));
        }
        for (name, prior) in [("alpha", self.alpha), ("eta", self.eta)] {
            if matches!(prior, Some(p) if p <= 0.0) {
                return Err(Error::Config(format!("model.{name} must be positive")));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Read a YAML configuration file. Missing fields take their defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML file
    ///
    /// # Returns
    ///
    /// The parsed configuration, not yet validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Yaml`] if
    /// it is not a valid configuration document.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let config: Config = serde_yaml::from_str(&raw)?;
        info!("Loaded configuration");
        Ok(config)
    }

    /// Resolve the run configuration: defaults, then the config file (if
    /// any), then CLI flags.
    ///
    /// # Arguments
    ///
    /// * `cli` - Parsed command-line arguments
    ///
    /// # Returns
    ///
    /// A validated configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`Config::load`] failures and [`Config::validate`] rejections.
    pub async fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(name) = &cli.blog_name {
            self.blog.name = name.clone();
        }
        if let Some(url) = &cli.blog_url {
            self.blog.url = url.clone();
        }
        if let Some(dir) = &cli.corpus_dir {
            self.corpus.local_dir = Some(dir.clone());
        }
        if let Some(dir) = &cli.cache_dir {
            self.corpus.cache_dir = Some(dir.clone());
        }
        if let Some(seed) = cli.seed {
            self.model.seed = seed;
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.blog.url)?;
        if self.blog.index_selector.trim().is_empty() || self.blog.body_selector.trim().is_empty() {
            return Err(Error::Config("blog selectors must not be empty".into()));
        }
        self.model.validate()
    }
}

fn default_blog_name() -> String {
    "Scrapping Hub".to_string()
}

fn default_blog_url() -> String {
    "https://blog.scrapinghub.com/".to_string()
}

fn default_index_selector() -> String {
    "div.post-header > h2 > a".to_string()
}

fn default_body_selector() -> String {
    ".post-body".to_string()
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_train_url() -> String {
    "https://huggingface.co/datasets/SetFit/20_newsgroups/resolve/main/train.jsonl".to_string()
}

fn default_test_url() -> String {
    "https://huggingface.co/datasets/SetFit/20_newsgroups/resolve/main/test.jsonl".to_string()
}

fn default_num_topics() -> usize {
    8
}

fn default_passes() -> usize {
    10
}

fn default_workers() -> usize {
    2
}

fn default_chunksize() -> usize {
    2000
}

fn default_iterations() -> usize {
    50
}

fn default_gamma_threshold() -> f64 {
    0.001
}

fn default_decay() -> f64 {
    0.5
}

fn default_offset() -> f64 {
    1.0
}

fn default_no_below() -> usize {
    15
}

fn default_no_above() -> f64 {
    0.1
}

fn default_keep_n() -> usize {
    100_000
}

fn default_top_terms() -> usize {
    5
}

fn default_minimum_probability() -> f64 {
    0.01
}

fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = Config::default();
        assert_eq!(config.blog.name, "Scrapping Hub");
        assert_eq!(config.blog.url, "https://blog.scrapinghub.com/");
        assert_eq!(config.blog.index_selector, "div.post-header > h2 > a");
        assert_eq!(config.blog.body_selector, ".post-body");
        assert_eq!(config.model.num_topics, 8);
        assert_eq!(config.model.passes, 10);
        assert_eq!(config.model.workers, 2);
        assert_eq!(config.model.no_below, 15);
        assert_eq!(config.model.no_above, 0.1);
        assert_eq!(config.model.keep_n, 100_000);
        assert_eq!(config.model.top_terms, 5);
        assert!((config.model.alpha() - 0.125).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
blog:
  name: Other Blog
  url: https://other.example.com/
model:
  num_topics: 4
  seed: 7
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.blog.name, "Other Blog");
        assert_eq!(config.blog.body_selector, ".post-body");
        assert_eq!(config.model.num_topics, 4);
        assert_eq!(config.model.passes, 10);
        assert_eq!(config.model.seed, 7);
        assert_eq!(config.http.timeout_secs, None);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http:\n  timeout_secs: 15\n").unwrap();
        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.http.timeout_secs, Some(15));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model: [not, a, map]").unwrap();
        assert!(matches!(Config::load(file.path()).await, Err(Error::Yaml(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("absent.yaml")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.model.num_topics = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.model.no_above = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.model.alpha = Some(-1.0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.blog.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::Url(_))));
    }

    #[tokio::test]
    async fn test_cli_overrides_win() {
        let cli = Cli::parse_from([
            "blog_topics",
            "--blog-name",
            "Fixture Blog",
            "--blog-url",
            "https://fixture.example.com/",
            "--seed",
            "99",
            "--corpus-dir",
            "/tmp/20news",
        ]);
        let config = Config::from_cli(&cli).await.unwrap();
        assert_eq!(config.blog.name, "Fixture Blog");
        assert_eq!(config.blog.url, "https://fixture.example.com/");
        assert_eq!(config.model.seed, 99);
        assert_eq!(config.corpus.local_dir, Some(PathBuf::from("/tmp/20news")));
    }

    #[tokio::test]
    async fn test_cli_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model:\n  seed: 5\n  num_topics: 6\n").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let cli = Cli::parse_from(["blog_topics", "--config", &path, "--seed", "42"]);

        let config = Config::from_cli(&cli).await.unwrap();
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.model.num_topics, 6);
    }

    #[test]
    fn test_resolved_cache_dir_prefers_explicit() {
        let corpus = CorpusConfig {
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            ..CorpusConfig::default()
        };
        assert_eq!(corpus.resolved_cache_dir(), PathBuf::from("/tmp/cache"));
        assert!(CorpusConfig::default()
            .resolved_cache_dir()
            .ends_with("blog_topics"));
    }
}
