//! Term vocabulary with document frequencies.
//!
//! Ids are assigned in first-seen order. [`Dictionary::filter_extremes`] prunes
//! rare and overly common terms and then compacts the ids, keeping their
//! relative order, so the surviving ids are always `0..len()`.

use itertools::Itertools;
use std::collections::HashMap;
use tracing::debug;

/// Sparse bag-of-words: `(term id, count)` pairs sorted by id.
pub type BowVector = Vec<(usize, u32)>;

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    token2id: HashMap<String, usize>,
    id2token: Vec<String>,
    /// Number of documents containing each term, indexed by id.
    dfs: Vec<usize>,
    num_docs: usize,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec<String>>,
    {
        let mut dictionary = Self::new();
        for doc in docs {
            dictionary.add_document(doc);
        }
        dictionary
    }

    /// Register a document's terms and update document frequencies.
    pub fn add_document(&mut self, doc: &[String]) {
        self.num_docs += 1;
        let mut seen = Vec::new();
        for token in doc {
            let id = match self.token2id.get(token) {
                Some(&id) => id,
                None => {
                    let id = self.id2token.len();
                    self.token2id.insert(token.clone(), id);
                    self.id2token.push(token.clone());
                    self.dfs.push(0);
                    id
                }
            };
            seen.push(id);
        }
        for id in seen.into_iter().unique() {
            self.dfs[id] += 1;
        }
    }

    /// Keep terms present in at least `no_below` documents and at most
    /// `no_above` (a fraction) of all documents, then keep only the `keep_n`
    /// most frequent of those.
    pub fn filter_extremes(&mut self, no_below: usize, no_above: f64, keep_n: usize) {
        let no_above_abs = (no_above * self.num_docs as f64) as usize;

        let mut kept: Vec<usize> = (0..self.id2token.len())
            .filter(|&id| (no_below..=no_above_abs).contains(&self.dfs[id]))
            .sorted_by(|a, b| self.dfs[*b].cmp(&self.dfs[*a]))
            .take(keep_n)
            .collect();
        kept.sort_unstable();

        let before = self.id2token.len();
        let id2token: Vec<String> = kept.iter().map(|&id| self.id2token[id].clone()).collect();
        let dfs: Vec<usize> = kept.iter().map(|&id| self.dfs[id]).collect();
        self.token2id = id2token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id))
            .collect();
        self.id2token = id2token;
        self.dfs = dfs;

        debug!(
            before,
            after = self.id2token.len(),
            no_below,
            no_above_abs,
            keep_n,
            "Filtered dictionary extremes"
        );
    }

    /// Count known terms of `doc`. Unknown terms are ignored.
    pub fn doc2bow(&self, doc: &[String]) -> BowVector {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in doc {
            if let Some(&id) = self.token2id.get(token) {
                *counts.entry(id).or_default() += 1;
            }
        }
        counts.into_iter().sorted_unstable().collect()
    }

    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    pub fn doc_freq(&self, id: usize) -> Option<usize> {
        self.dfs.get(id).copied()
    }
}
