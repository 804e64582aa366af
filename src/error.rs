//! Error type shared by the scraping, corpus and topic-model code.
//!
//! Every fallible operation below the binary edge returns [`Result`]. The
//! binary itself converts these into `Box<dyn Error>` and lets the first
//! failure end the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid CSS selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("no element matching `{selector}` in {context}")]
    MissingElement { selector: String, context: String },

    #[error("element matching `{selector}` has no `{attribute}` attribute")]
    MissingAttribute { selector: String, attribute: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Model error: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, Error>;
