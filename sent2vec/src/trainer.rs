use std::time::Instant;

use anyhow::Result;
use indicatif::ProgressBar;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::SeedableRng;

use crate::config::Config;
use crate::real;
use crate::rng::Rng;
use crate::similarity;
use crate::train::{train_sentence, TrainBuffers};
use crate::vectors::SentenceVectors;
use crate::word_model::WordModel;

/// Trains one vector per sentence against a word model.
pub struct Sent2Vec {
    config: Config,
    model: WordModel,
    /// Row `i` is the vector for sentence `i` of the last `train` call.
    sents: Array2<real>,
    rng: Rng,
}

/// Mixed into the seed by `Sent2Vec::new`, so that the sentence vectors don't
/// replay the draws that initialised `syn0` from the same seed.
const SENTENCE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

impl Sent2Vec {
    pub fn new(config: Config, model: WordModel) -> Result<Self> {
        let rng = Rng::seed_from_u64(config.seed ^ SENTENCE_STREAM);
        Self::with_rng(config, model, rng)
    }

    /// Like `new`, but keep drawing from `rng`, usually the generator that
    /// just built `model`.
    pub fn with_rng(config: Config, model: WordModel, rng: Rng) -> Result<Self> {
        config.validate()?;
        model.check(&config)?;
        Ok(Sent2Vec {
            sents: Array2::zeros((0, config.size)),
            config,
            model,
            rng,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &WordModel {
        &self.model
    }

    pub fn sentence_vectors(&self) -> ArrayView2<'_, real> {
        self.sents.view()
    }

    pub fn into_sentence_vectors(self) -> SentenceVectors {
        SentenceVectors::new(self.config, self.sents.view())
    }

    pub fn train(&mut self, sentences: &[Vec<Option<usize>>]) -> u64 {
        self.train_with_progress(sentences, &ProgressBar::hidden())
    }

    /// Train a fresh vector for every sentence, replacing any earlier ones.
    ///
    /// Each sentence gets `config.iterations` passes. The learning rate falls
    /// linearly with the number of words trained so far, down to `min_alpha`.
    /// Returns the number of words trained.
    pub fn train_with_progress(
        &mut self,
        sentences: &[Vec<Option<usize>>],
        progress: &ProgressBar,
    ) -> u64 {
        let size = self.config.size;
        let iterations = self.config.iterations as u64;
        let total_words = iterations
            * sentences
                .iter()
                .map(|s| s.iter().flatten().count() as u64)
                .sum::<u64>();
        info!(
            "training {} sentence vectors ({total_words} words)",
            sentences.len()
        );

        self.sents = Array2::random_using(
            (sentences.len(), size),
            Uniform::<real>::new(-0.5, 0.5),
            &mut self.rng,
        ) / size as real;

        let start = Instant::now();
        let mut buffers = TrainBuffers::new(size);
        let mut word_count: u64 = 0;
        let mut last_word_count: u64 = 0;
        progress.set_length(sentences.len() as u64);

        let Sent2Vec {
            config,
            model,
            sents,
            rng,
        } = self;
        for (sentence, mut sent_vec) in sentences.iter().zip(sents.rows_mut()) {
            for _ in 0..iterations {
                let alpha = learning_rate(config, word_count, total_words);
                word_count += train_sentence(
                    config,
                    model,
                    sent_vec.view_mut(),
                    sentence,
                    alpha,
                    rng,
                    Some(&mut buffers),
                ) as u64;
            }

            if word_count - last_word_count > 10000 {
                last_word_count = word_count;
                let alpha = learning_rate(config, word_count, total_words);
                debug!(
                    "alpha: {alpha}  progress: {:.2}%  words/sec: {:.2}k",
                    word_count as real / (total_words + 1) as real * 100.0,
                    word_count as f64 / ((start.elapsed().as_secs_f64() + 1.0) * 1000.0),
                );
                progress.set_message(format!("alpha {alpha:.6}"));
            }
            progress.inc(1);
        }

        info!(
            "trained {word_count} words in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        word_count
    }

    /// Cosine similarity of sentences `a` and `b`.
    pub fn similarity(&self, a: usize, b: usize) -> real {
        similarity::cosine_similarity(self.sents.row(a), self.sents.row(b))
    }

    /// Fill `sims[..n]` with the similarity of `vec` to each of the first `n` sentences.
    pub fn rank_by_similarity(&self, vec: ArrayView1<'_, real>, n: usize, sims: &mut [real]) {
        similarity::rank_by_similarity(self.sents.view(), vec, n, sims);
    }

    /// The `topn` sentences most similar to sentence `i`, best first, excluding `i`.
    pub fn most_similar(&self, i: usize, topn: usize) -> Vec<(usize, real)> {
        similarity::most_similar(self.sents.view(), self.sents.row(i), topn, Some(i))
    }
}

/// `alpha` decayed by the fraction of `total_words` already trained, floored at `min_alpha`.
fn learning_rate(config: &Config, word_count: u64, total_words: u64) -> real {
    let fraction = word_count as real / (total_words + 1) as real;
    (config.alpha * (1.0 - fraction)).max(config.min_alpha)
}
