//! # Blog Topics
//!
//! Scrapes the posts of a blog and reports, for each one, the topics an LDA
//! model trained on the 20 Newsgroups corpus assigns to it.
//!
//! ## Pipeline
//!
//! 1. **Model**: load the corpus, preprocess, build the vocabulary, train LDA
//! 2. **Indexing**: fetch the blog index and list its posts
//! 3. **Fetching**: download each post and extract its body text
//! 4. **Classification**: rank each post's topics and print them
//!
//! Every step runs sequentially; the only parallelism is inside LDA training.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod outputs;
pub mod scrapers;
pub mod topics;
pub mod utils;

pub use error::{Error, Result};
