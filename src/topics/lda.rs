//! Latent Dirichlet Allocation trained with online variational Bayes.
//!
//! This follows Hoffman, Blei & Bach (2010), "Online Learning for Latent
//! Dirichlet Allocation", in the same shape gensim implements it:
//!
//! - the corpus is streamed in chunks of `chunksize` documents, `passes` times
//! - the E-step fits per-document topic weights (`gamma`) and accumulates
//!   sufficient statistics; each chunk is split across `workers` threads
//! - the M-step blends the topic-term parameters (`lambda`) towards the chunk
//!   estimate with step size `rho = (offset + pass + updates / chunksize)^-decay`,
//!   once per chunk regardless of the worker count
//!
//! Every random draw comes from a `StdRng` derived from the model seed, the
//! pass, the chunk and the worker index, so a fixed seed and worker count
//! reproduce the same model exactly.

use super::dictionary::BowVector;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use tracing::{debug, info, instrument};

/// Added to normalizers to avoid dividing by zero.
const EPSILON: f64 = 1e-100;
/// Stream id used to seed inference, distinct from every training stream.
const INFERENCE_STREAM: u64 = u64::MAX;

#[derive(Debug, Clone)]
pub struct LdaModel {
    num_topics: usize,
    num_terms: usize,
    alpha: f64,
    eta: f64,
    iterations: usize,
    gamma_threshold: f64,
    seed: u64,
    /// Variational topic-term parameters, `num_topics` rows of `num_terms`.
    lambda: Vec<f64>,
    /// `exp(E[log beta])` under `lambda`, same layout.
    exp_elog_beta: Vec<f64>,
    /// Documents seen by the M-step so far.
    num_updates: usize,
}

/// Per-worker E-step output.
struct EStep {
    sstats: Vec<f64>,
    converged: usize,
}

impl LdaModel {
    /// Untrained model with randomly initialised topics.
    pub fn new(num_terms: usize, params: &ModelConfig) -> Result<Self> {
        if num_terms == 0 {
            return Err(Error::Model("vocabulary is empty".into()));
        }
        params.validate()?;

        let num_topics = params.num_topics;
        let mut rng = StdRng::seed_from_u64(derive_seed(params.seed, &[0]));
        let lambda: Vec<f64> = (0..num_topics * num_terms)
            .map(|_| init_weight(&mut rng))
            .collect();

        let mut model = Self {
            num_topics,
            num_terms,
            alpha: params.alpha(),
            eta: params.eta(),
            iterations: params.iterations,
            gamma_threshold: params.gamma_threshold,
            seed: params.seed,
            exp_elog_beta: Vec::new(),
            lambda,
            num_updates: 0,
        };
        model.refresh_exp_elog_beta();
        Ok(model)
    }

    /// Fit a model on `corpus`, whose term ids must be below `num_terms`.
    #[instrument(level = "info", skip_all, fields(docs = corpus.len(), num_terms, topics = params.num_topics))]
    pub fn train(corpus: &[BowVector], num_terms: usize, params: &ModelConfig) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::Model("training corpus is empty".into()));
        }
        if let Some(&(id, _)) = corpus.iter().flatten().find(|(id, _)| *id >= num_terms) {
            return Err(Error::Model(format!(
                "term id {id} outside vocabulary of {num_terms}"
            )));
        }

        let mut model = Self::new(num_terms, params)?;
        let total_docs = corpus.len();

        for pass in 0..params.passes {
            let mut converged = 0usize;
            for (chunk_no, chunk) in corpus.chunks(params.chunksize).enumerate() {
                let stream = [pass as u64 + 1, chunk_no as u64 + 1];
                let (sstats, chunk_converged) = model.e_step_parallel(chunk, params.workers, &stream);
                converged += chunk_converged;

                let rho = (params.offset
                    + pass as f64
                    + model.num_updates as f64 / params.chunksize as f64)
                    .powf(-params.decay);
                model.m_step(&sstats, rho, total_docs as f64 / chunk.len() as f64);
                model.num_updates += chunk.len();
                debug!(pass, chunk = chunk_no, rho, "Applied online update");
            }
            info!(
                pass = pass + 1,
                passes = params.passes,
                converged,
                docs = total_docs,
                "Finished training pass"
            );
        }

        Ok(model)
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    /// Topic distribution of a document, keeping topics with probability at
    /// least `minimum_probability`, sorted by descending probability (ties by
    /// topic id). Inference is seeded, so equal inputs give equal outputs.
    pub fn document_topics(&self, bow: &[(usize, u32)], minimum_probability: f64) -> Vec<(usize, f64)> {
        let mut rng = StdRng::seed_from_u64(derive_seed(self.seed, &[INFERENCE_STREAM]));
        let (gamma, _) = self.infer_document(bow, &mut rng, None);
        let total: f64 = gamma.iter().sum();

        let mut topics: Vec<(usize, f64)> = gamma
            .iter()
            .enumerate()
            .map(|(k, g)| (k, g / total))
            .filter(|(_, p)| *p >= minimum_probability)
            .collect();
        topics.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        topics
    }

    /// The `topn` heaviest terms of `topic` as `(term id, probability)`.
    pub fn topic_terms(&self, topic: usize, topn: usize) -> Vec<(usize, f64)> {
        let row = self.topic_row(topic);
        let total: f64 = row.iter().sum();
        let mut terms: Vec<(usize, f64)> = row
            .iter()
            .enumerate()
            .map(|(id, w)| (id, w / total))
            .collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        terms.truncate(topn);
        terms
    }

    fn topic_row(&self, topic: usize) -> &[f64] {
        &self.lambda[topic * self.num_terms..(topic + 1) * self.num_terms]
    }

    /// Split `chunk` across `workers` threads and sum their statistics in
    /// worker order.
    fn e_step_parallel(&self, chunk: &[BowVector], workers: usize, stream: &[u64]) -> (Vec<f64>, usize) {
        let per_worker = chunk.len().div_ceil(workers.max(1)).max(1);

        let results: Vec<EStep> = thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .chunks(per_worker)
                .enumerate()
                .map(|(worker, docs)| {
                    let mut parts = stream.to_vec();
                    parts.push(worker as u64);
                    let seed = derive_seed(self.seed, &parts);
                    scope.spawn(move || self.e_step(docs, seed))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });

        let mut sstats = vec![0.0; self.lambda.len()];
        let mut converged = 0;
        for result in results {
            for (acc, s) in sstats.iter_mut().zip(&result.sstats) {
                *acc += s;
            }
            converged += result.converged;
        }
        for (s, b) in sstats.iter_mut().zip(&self.exp_elog_beta) {
            *s *= b;
        }
        (sstats, converged)
    }

    fn e_step(&self, docs: &[BowVector], seed: u64) -> EStep {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sstats = vec![0.0; self.lambda.len()];
        let mut converged = 0;
        for bow in docs {
            let (_, did_converge) = self.infer_document(bow, &mut rng, Some(sstats.as_mut_slice()));
            if did_converge {
                converged += 1;
            }
        }
        EStep { sstats, converged }
    }

    /// Variational inference for one document. Returns `gamma` and whether it
    /// converged within `iterations`. When `sstats` is given, the document's
    /// contribution (before multiplying by `exp_elog_beta`) is added to it.
    fn infer_document(
        &self,
        bow: &[(usize, u32)],
        rng: &mut StdRng,
        sstats: Option<&mut [f64]>,
    ) -> (Vec<f64>, bool) {
        let k = self.num_topics;
        let v = self.num_terms;
        let ids: Vec<usize> = bow.iter().map(|(id, _)| *id).collect();
        let cts: Vec<f64> = bow.iter().map(|(_, c)| *c as f64).collect();

        let mut gamma: Vec<f64> = (0..k).map(|_| init_weight(rng)).collect();
        let mut exp_elog_theta = exp_dirichlet_expectation(&gamma);
        let mut phinorm = self.phinorm(&ids, &exp_elog_theta);
        let mut converged = false;

        for _ in 0..self.iterations {
            let last = gamma.clone();
            for topic in 0..k {
                let row = &self.exp_elog_beta[topic * v..(topic + 1) * v];
                let dot: f64 = ids
                    .iter()
                    .zip(&cts)
                    .zip(&phinorm)
                    .map(|((&id, &ct), &norm)| ct / norm * row[id])
                    .sum();
                gamma[topic] = self.alpha + exp_elog_theta[topic] * dot;
            }
            exp_elog_theta = exp_dirichlet_expectation(&gamma);
            phinorm = self.phinorm(&ids, &exp_elog_theta);

            let change = gamma
                .iter()
                .zip(&last)
                .map(|(a, b)| (a - b).abs())
                .sum::<f64>()
                / k as f64;
            if change < self.gamma_threshold {
                converged = true;
                break;
            }
        }

        if let Some(sstats) = sstats {
            for topic in 0..k {
                let row = &mut sstats[topic * v..(topic + 1) * v];
                for ((&id, &ct), &norm) in ids.iter().zip(&cts).zip(&phinorm) {
                    row[id] += exp_elog_theta[topic] * ct / norm;
                }
            }
        }

        (gamma, converged)
    }

    fn phinorm(&self, ids: &[usize], exp_elog_theta: &[f64]) -> Vec<f64> {
        let v = self.num_terms;
        ids.iter()
            .map(|&id| {
                exp_elog_theta
                    .iter()
                    .enumerate()
                    .map(|(topic, t)| t * self.exp_elog_beta[topic * v + id])
                    .sum::<f64>()
                    + EPSILON
            })
            .collect()
    }

    /// Blend `lambda` towards `eta + scale * sstats` with weight `rho`.
    fn m_step(&mut self, sstats: &[f64], rho: f64, scale: f64) {
        for (lambda, s) in self.lambda.iter_mut().zip(sstats) {
            *lambda = (1.0 - rho) * *lambda + rho * (self.eta + scale * s);
        }
        self.refresh_exp_elog_beta();
    }

    fn refresh_exp_elog_beta(&mut self) {
        let v = self.num_terms;
        self.exp_elog_beta = self
            .lambda
            .chunks(v)
            .flat_map(exp_dirichlet_expectation)
            .collect();
    }
}

/// Positive starting value near 1.
fn init_weight(rng: &mut StdRng) -> f64 {
    rng.random_range(0.8..1.2)
}

/// `exp(E[log X])` for `X ~ Dirichlet(alpha)`.
fn exp_dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let psi_total = digamma(alpha.iter().sum());
    alpha
        .iter()
        .map(|a| (digamma(*a) - psi_total).exp())
        .collect()
}

/// Digamma function via recurrence and its asymptotic series.
fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

/// SplitMix64 over the base seed and a stream path.
fn derive_seed(base: u64, parts: &[u64]) -> u64 {
    fn mix(mut z: u64) -> u64 {
        z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
    parts.iter().fold(mix(base), |acc, p| mix(acc ^ mix(*p)))
}
