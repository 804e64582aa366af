//! Topic model: preprocessing, vocabulary, LDA and corpus loading.
//!
//! [`TopicModel`] bundles everything needed to classify unseen text with the
//! same pipeline used during training:
//!
//! ```text
//! text ─► preprocess ─► doc2bow ─► LDA inference ─► ranked TopicScores
//! ```
//!
//! The model is trained once, from a [`corpus::CorpusSource`], and is never
//! persisted.

pub mod corpus;
pub mod dictionary;
pub mod lda;
pub mod preprocess;
pub mod stopwords;

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::models::TopicScore;
use corpus::{CorpusSource, Split};
use dictionary::{BowVector, Dictionary};
use itertools::Itertools;
use lda::LdaModel;
use preprocess::Preprocessor;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct TopicModel {
    preprocessor: Preprocessor,
    dictionary: Dictionary,
    lda: LdaModel,
    top_terms: usize,
    minimum_probability: f64,
}

impl TopicModel {
    /// Preprocess `documents`, build the pruned vocabulary and fit the LDA model.
    #[instrument(level = "info", skip_all, fields(docs = documents.len()))]
    pub fn train(documents: &[String], params: &ModelConfig) -> Result<Self> {
        params.validate()?;
        let preprocessor = Preprocessor::new();

        let processed: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| preprocessor.preprocess(doc))
            .collect();
        let mut dictionary = Dictionary::from_documents(&processed);
        let raw_terms = dictionary.len();
        dictionary.filter_extremes(params.no_below, params.no_above, params.keep_n);
        if dictionary.is_empty() {
            return Err(Error::Model(format!(
                "no terms left after pruning {raw_terms} terms (no_below={}, no_above={})",
                params.no_below, params.no_above
            )));
        }
        info!(raw_terms, kept_terms = dictionary.len(), "Built dictionary");

        let bow_corpus: Vec<BowVector> = processed
            .iter()
            .map(|doc| dictionary.doc2bow(doc))
            .collect();
        let lda = LdaModel::train(&bow_corpus, dictionary.len(), params)?;

        Ok(Self {
            preprocessor,
            dictionary,
            lda,
            top_terms: params.top_terms,
            minimum_probability: params.minimum_probability,
        })
    }

    /// Load the corpus from `source` and train on its train split.
    ///
    /// The test split is loaded as well, but only its size is logged.
    /// Training runs on the blocking thread pool.
    pub async fn train_from_source<S: CorpusSource>(source: &S, params: &ModelConfig) -> Result<Self> {
        let train = source.load(Split::Train).await?;
        let test = source.load(Split::Test).await?;
        info!(train = train.len(), test = test.len(), "Loaded corpus");
        if let Some(first) = train.first() {
            debug!(preview = %crate::utils::truncate_for_log(first, 200), "First training document");
        }

        let params = params.clone();
        tokio::task::spawn_blocking(move || Self::train(&train, &params))
            .await
            .map_err(|e| Error::Model(format!("training task failed: {e}")))?
    }

    /// Ranked topics of `text` with their defining terms.
    pub fn main_topics(&self, text: &str) -> Vec<TopicScore> {
        let bow = self.dictionary.doc2bow(&self.preprocessor.preprocess(text));
        debug!(known_terms = bow.len(), "Vectorised document");

        self.lda
            .document_topics(&bow, self.minimum_probability)
            .into_iter()
            .map(|(topic_id, score)| TopicScore {
                topic_id,
                score,
                terms: self.topic_terms(topic_id, self.top_terms),
            })
            .collect()
    }

    /// The `topn` heaviest terms of a topic.
    pub fn topic_terms(&self, topic: usize, topn: usize) -> Vec<(String, f64)> {
        self.lda
            .topic_terms(topic, topn)
            .into_iter()
            .filter_map(|(id, weight)| {
                self.dictionary
                    .token(id)
                    .map(|token| (token.to_string(), weight))
            })
            .collect()
    }

    pub fn num_topics(&self) -> usize {
        self.lda.num_topics()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}

/// `0.012*"term" + 0.010*"other"`.
pub fn format_topic(terms: &[(String, f64)]) -> String {
    terms
        .iter()
        .map(|(term, weight)| format!("{weight:.3}*\"{term}\""))
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus::InMemoryCorpus;

    const SPACE: [&str; 6] = ["space", "orbit", "rocket", "launch", "satellite", "planet"];
    const HOCKEY: [&str; 6] = ["hockey", "goalie", "skate", "puck", "playoff", "arena"];

    fn themed_docs() -> Vec<String> {
        (0..40)
            .map(|i| {
                let words = if i % 2 == 0 { SPACE } else { HOCKEY };
                (0..4)
                    .map(|j| words[(i / 2 + j) % words.len()])
                    .collect::<Vec<_>>()
                    .join(" the ")
            })
            .collect()
    }

    fn params() -> ModelConfig {
        ModelConfig {
            num_topics: 2,
            passes: 20,
            workers: 2,
            chunksize: 10,
            no_below: 2,
            no_above: 0.6,
            seed: 5,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_format_topic() {
        let terms = vec![("space".to_string(), 0.0123), ("orbit".to_string(), 0.01)];
        assert_eq!(format_topic(&terms), "0.012*\"space\" + 0.010*\"orbit\"");
        assert_eq!(format_topic(&[]), "");
    }

    #[test]
    fn test_pruning_everything_is_an_error() {
        let docs = themed_docs();
        let err = TopicModel::train(&docs, &ModelConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn test_classifies_by_theme() {
        let model = TopicModel::train(&themed_docs(), &params()).unwrap();
        assert_eq!(model.num_topics(), 2);
        assert_eq!(model.dictionary().len(), 12);

        let space = model.main_topics("The rocket launch put a satellite into orbit.");
        let hockey = model.main_topics("Their goalie stopped every puck in the playoff.");
        assert!(!space.is_empty() && !hockey.is_empty());
        assert_ne!(space[0].topic_id, hockey[0].topic_id);
        assert!(space[0].score > 0.7, "{space:?}");

        assert_eq!(space[0].terms.len(), 5);
        let space_terms = model.preprocessor.preprocess(&SPACE.join(" "));
        assert!(
            space[0].terms.iter().all(|(t, _)| space_terms.contains(t)),
            "space topic terms: {:?}",
            space[0].terms
        );
    }

    #[test]
    fn test_inference_is_reproducible() {
        let a = TopicModel::train(&themed_docs(), &params()).unwrap();
        let b = TopicModel::train(&themed_docs(), &params()).unwrap();
        let text = "A hockey arena near the rocket launch site";
        assert_eq!(a.main_topics(text), b.main_topics(text));
        assert_eq!(a.main_topics(text), a.main_topics(text));
    }

    #[test]
    fn test_unknown_text_gets_uniform_topics() {
        let model = TopicModel::train(&themed_docs(), &params()).unwrap();
        let topics = model.main_topics("completely unrelated vocabulary here");
        assert_eq!(topics.len(), 2);
        assert!((topics[0].score - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_train_from_source() {
        let source = InMemoryCorpus::new(themed_docs(), vec!["held out".to_string()]);
        let model = TopicModel::train_from_source(&source, &params()).await.unwrap();
        assert_eq!(model.num_topics(), 2);
    }

    #[tokio::test]
    async fn test_train_from_source_needs_test_split() {
        let source = InMemoryCorpus::new(themed_docs(), vec![]);
        assert!(TopicModel::train_from_source(&source, &params()).await.is_err());
    }
}
