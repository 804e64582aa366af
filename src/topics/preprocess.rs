//! Text preprocessing shared by training and inference.
//!
//! A document becomes a token list in four steps:
//!
//! 1. lowercase it and split it into alphabetic runs of 2 to 15 characters
//! 2. drop stop words and tokens of 3 characters or fewer
//! 3. lemmatize: map irregular verb forms to their base, then Snowball-stem
//! 4. apply the step 2 filter again to the lemmas
//!
//! The output is a fixed point: preprocessing the space-joined tokens returns
//! the same tokens.
//!
//! Lemmas are Snowball stems, not dictionary words. Nouns are reduced along
//! with verbs, so "satellite" becomes `satellit` and "goalie" becomes `goali`,
//! and those stems are what topic listings print. A WordNet verb lemmatizer
//! would leave both nouns untouched.

use super::stopwords::is_stopword;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

const MIN_TOKEN_CHARS: usize = 2;
const MAX_TOKEN_CHARS: usize = 15;
/// Tokens must be strictly longer than this to be kept.
const SHORT_TOKEN_CHARS: usize = 3;
const MAX_LEMMA_ROUNDS: usize = 8;

// Letters only: \w without digits.
static ALPHABETIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\W\d]+").expect("valid regex"));

static IRREGULAR_VERBS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("arose", "arise"), ("arisen", "arise"), ("awoke", "awake"), ("awoken", "awake"),
        ("began", "begin"), ("begun", "begin"), ("bent", "bend"), ("bitten", "bite"),
        ("blew", "blow"), ("blown", "blow"), ("broke", "break"), ("broken", "break"),
        ("brought", "bring"), ("built", "build"), ("burnt", "burn"), ("bought", "buy"),
        ("caught", "catch"), ("chose", "choose"), ("chosen", "choose"), ("came", "come"),
        ("dealt", "deal"), ("drew", "draw"), ("drawn", "draw"), ("dreamt", "dream"),
        ("drank", "drink"), ("drunk", "drink"), ("drove", "drive"), ("driven", "drive"),
        ("eaten", "eat"), ("fell", "fall"), ("fallen", "fall"), ("felt", "feel"),
        ("fought", "fight"), ("fled", "flee"), ("flew", "fly"), ("flown", "fly"),
        ("forbade", "forbid"), ("forbidden", "forbid"), ("forgot", "forget"),
        ("forgotten", "forget"), ("forgave", "forgive"), ("forgiven", "forgive"),
        ("froze", "freeze"), ("frozen", "freeze"), ("gave", "give"), ("given", "give"),
        ("went", "go"), ("gone", "go"), ("grew", "grow"), ("grown", "grow"), ("hung", "hang"),
        ("heard", "hear"), ("hidden", "hide"), ("held", "hold"), ("kept", "keep"),
        ("knelt", "kneel"), ("knew", "know"), ("known", "know"), ("laid", "lay"), ("led", "lead"),
        ("leapt", "leap"), ("learnt", "learn"), ("left", "leave"), ("lent", "lend"),
        ("lain", "lie"), ("lost", "lose"), ("meant", "mean"), ("mistook", "mistake"),
        ("mistaken", "mistake"), ("paid", "pay"), ("proven", "prove"), ("rode", "ride"),
        ("ridden", "ride"), ("rang", "ring"), ("rung", "ring"), ("rose", "rise"),
        ("risen", "rise"), ("said", "say"), ("sought", "seek"), ("sold", "sell"),
        ("sent", "send"), ("shook", "shake"), ("shaken", "shake"), ("shone", "shine"),
        ("shot", "shoot"), ("shown", "show"), ("shrank", "shrink"), ("shrunk", "shrink"),
        ("sang", "sing"), ("sung", "sing"), ("sank", "sink"), ("sunk", "sink"),
        ("slept", "sleep"), ("slid", "slide"), ("spoke", "speak"), ("spoken", "speak"),
        ("spent", "spend"), ("spun", "spin"), ("sprang", "spring"), ("sprung", "spring"),
        ("stood", "stand"), ("stole", "steal"), ("stolen", "steal"), ("stuck", "stick"),
        ("stung", "sting"), ("strode", "stride"), ("struck", "strike"), ("strove", "strive"),
        ("striven", "strive"), ("swore", "swear"), ("sworn", "swear"), ("swept", "sweep"),
        ("swam", "swim"), ("swum", "swim"), ("swung", "swing"), ("took", "take"),
        ("taken", "take"), ("taught", "teach"), ("tore", "tear"), ("torn", "tear"),
        ("thought", "think"), ("threw", "throw"), ("thrown", "throw"), ("told", "tell"),
        ("understood", "understand"), ("undertook", "undertake"), ("undertaken", "undertake"),
        ("woke", "wake"), ("woken", "wake"), ("wore", "wear"), ("worn", "wear"),
        ("wove", "weave"), ("woven", "weave"), ("wept", "weep"), ("won", "win"),
        ("wound", "wind"), ("withdrew", "withdraw"), ("withdrawn", "withdraw"),
        ("wrote", "write"), ("written", "write"),
    ]
    .into_iter()
    .collect()
});

/// Split text into lowercase alphabetic tokens of 2 to 15 characters.
///
/// Tokens starting with `_` are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    ALPHABETIC
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| {
            let chars = token.chars().count();
            (MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&chars) && !token.starts_with('_')
        })
        .map(str::to_string)
        .collect()
}

/// True for tokens that carry topical content.
pub fn is_content_token(token: &str) -> bool {
    token.chars().count() > SHORT_TOKEN_CHARS && !is_stopword(token)
}

/// Verb-oriented lemmatizer: irregular forms first, Snowball stemming after.
pub struct Lemmatizer {
    stemmer: Stemmer,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl std::fmt::Debug for Lemmatizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lemmatizer").field("algorithm", &"english").finish()
    }
}

impl Lemmatizer {
    fn lemmatize_once(&self, token: &str) -> String {
        let base = IRREGULAR_VERBS.get(token).copied().unwrap_or(token);
        self.stemmer.stem(base).into_owned()
    }

    /// Lemma of `token`. Repeats until the result stops changing, so
    /// `lemmatize(lemmatize(t)) == lemmatize(t)`.
    pub fn lemmatize(&self, token: &str) -> String {
        let mut current = self.lemmatize_once(token);
        for _ in 0..MAX_LEMMA_ROUNDS {
            let next = self.lemmatize_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// Tokenize → filter → lemmatize → filter.
#[derive(Debug, Default)]
pub struct Preprocessor {
    lemmatizer: Lemmatizer,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preprocess(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter(|token| is_content_token(token))
            .map(|token| self.lemmatizer.lemmatize(&token))
            .filter(|lemma| is_content_token(lemma))
            .collect()
    }
}
