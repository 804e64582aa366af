//! Sources for the 20 Newsgroups training corpus.
//!
//! The corpus is an explicit dependency of model training rather than a
//! global download, so tests and offline runs can substitute their own data:
//!
//! | Source | Reads from |
//! |--------|------------|
//! | [`NewsgroupsDownload`] | JSON-lines splits over HTTP, cached on disk |
//! | [`NewsgroupsDir`] | an extracted `20news-bydate` tree |
//! | [`InMemoryCorpus`] | documents held in memory |
//!
//! The file-backed sources shuffle documents with a seeded RNG so repeated
//! runs see the same order.

use crate::error::{Error, Result};
use crate::scrapers::Fetch;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    fn name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    fn stream(self) -> u64 {
        match self {
            Split::Train => 1,
            Split::Test => 2,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that can provide the raw documents of a corpus split.
pub trait CorpusSource {
    async fn load(&self, split: Split) -> Result<Vec<String>>;
}

/// Fixed documents, returned as given.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

impl InMemoryCorpus {
    pub fn new(train: Vec<String>, test: Vec<String>) -> Self {
        Self { train, test }
    }
}

impl CorpusSource for InMemoryCorpus {
    async fn load(&self, split: Split) -> Result<Vec<String>> {
        let docs = match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
        };
        non_empty(docs.clone(), split)
    }
}

#[derive(Deserialize)]
struct Record {
    text: String,
}

/// JSON-lines splits (one `{"text": ...}` object per line) downloaded once
/// and then read from `cache_dir`.
#[derive(Debug)]
pub struct NewsgroupsDownload<F> {
    fetcher: F,
    train_url: String,
    test_url: String,
    cache_dir: PathBuf,
    seed: u64,
}

impl<F: Fetch> NewsgroupsDownload<F> {
    pub fn new(
        fetcher: F,
        train_url: impl Into<String>,
        test_url: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        seed: u64,
    ) -> Self {
        Self {
            fetcher,
            train_url: train_url.into(),
            test_url: test_url.into(),
            cache_dir: cache_dir.into(),
            seed,
        }
    }

    pub fn cache_path(&self, split: Split) -> PathBuf {
        self.cache_dir.join(format!("20newsgroups-{split}.jsonl"))
    }

    /// Cached file contents, downloading them first if needed.
    async fn raw_split(&self, split: Split) -> Result<String> {
        let path = self.cache_path(split);
        if fs::try_exists(&path).await? {
            debug!(path = %path.display(), "Using cached corpus split");
            return Ok(fs::read_to_string(&path).await?);
        }

        let url = match split {
            Split::Train => &self.train_url,
            Split::Test => &self.test_url,
        };
        info!(%url, %split, "Downloading corpus split");
        let raw = self.fetcher.fetch_text(url).await?;

        fs::create_dir_all(&self.cache_dir).await?;
        let partial = path.with_extension("jsonl.part");
        fs::write(&partial, &raw).await?;
        fs::rename(&partial, &path).await?;
        info!(path = %path.display(), bytes = raw.len(), "Cached corpus split");
        Ok(raw)
    }
}

impl<F: Fetch> CorpusSource for NewsgroupsDownload<F> {
    #[instrument(level = "info", skip(self), fields(cache_dir = %self.cache_dir.display()))]
    async fn load(&self, split: Split) -> Result<Vec<String>> {
        let raw = self.raw_split(split).await?;
        let mut docs = parse_jsonl(&raw)?;
        shuffle(&mut docs, self.seed, split);
        info!(count = docs.len(), "Loaded corpus split");
        non_empty(docs, split)
    }
}

/// The `20news-bydate-train` / `20news-bydate-test` layout: one directory per
/// newsgroup, one Latin-1 encoded file per message.
#[derive(Debug, Clone)]
pub struct NewsgroupsDir {
    root: PathBuf,
    seed: u64,
}

impl NewsgroupsDir {
    pub fn new(root: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            root: root.into(),
            seed,
        }
    }

    pub fn split_dir(&self, split: Split) -> PathBuf {
        self.root.join(format!("20news-bydate-{split}"))
    }
}

impl CorpusSource for NewsgroupsDir {
    #[instrument(level = "info", skip(self), fields(root = %self.root.display()))]
    async fn load(&self, split: Split) -> Result<Vec<String>> {
        let split_dir = self.split_dir(split);
        let mut docs = Vec::new();

        for group in sorted_entries(&split_dir).await? {
            if !fs::metadata(&group).await?.is_dir() {
                continue;
            }
            for message in sorted_entries(&group).await? {
                let bytes = fs::read(&message).await?;
                docs.push(encoding_rs::mem::decode_latin1(&bytes).into_owned());
            }
        }

        shuffle(&mut docs, self.seed, split);
        info!(count = docs.len(), "Loaded corpus split");
        non_empty(docs, split)
    }
}

async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

fn parse_jsonl(raw: &str) -> Result<Vec<String>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<Record>(line)
                .map(|r| r.text)
                .map_err(|e| Error::Corpus(format!("line {}: {e}", n + 1)))
        })
        .collect()
}

fn shuffle(docs: &mut [String], seed: u64, split: Split) {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(split.stream()));
    docs.shuffle(&mut rng);
}

fn non_empty(docs: Vec<String>, split: Split) -> Result<Vec<String>> {
    if docs.is_empty() {
        return Err(Error::Corpus(format!("{split} split has no documents")));
    }
    Ok(docs)
}
