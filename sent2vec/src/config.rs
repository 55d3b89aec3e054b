use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::real;

/// Which word2vec architecture drives the sentence vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    /// Predict each context word from the sentence vector.
    SkipGram,
    /// Predict the center word from the pooled context plus the sentence vector.
    Cbow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub architecture: Architecture,

    /// Number of dimensions of word and sentence vectors.
    pub size: usize,

    /// Max skip length between words.
    pub window: usize,

    /// Use hierarchical softmax.
    pub hs: bool,

    /// Number of negative examples (0 = not used).
    pub negative: usize,

    /// Also update the word matrices (`syn0`, `syn1`, `syn1neg`), not just the
    /// sentence vectors.
    pub word_learn: bool,

    /// CBOW only: average the context instead of summing it.
    pub cbow_mean: bool,

    /// Starting learning rate.
    pub alpha: real,

    /// The learning rate never decays below this.
    pub min_alpha: real,

    /// Training passes over each sentence.
    pub iterations: usize,

    /// Discard words that appear less than this many times.
    pub min_count: u64,

    /// Number of slots in the negative-sampling table.
    pub table_size: usize,

    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            architecture: Architecture::SkipGram,
            size: 100,
            window: 5,
            hs: false,
            negative: 5,
            word_learn: false,
            cbow_mean: false,
            alpha: 0.025,
            min_alpha: 0.0001,
            iterations: 1,
            min_count: 1,
            table_size: 10_000_000,
            seed: 1,
        }
    }
}

impl Config {
    /// Check the settings once, before training. The per-token loops trust them.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.size > 0, "vector size must be positive");
        ensure!(self.window > 0, "window must be at least 1");
        ensure!(self.iterations > 0, "need at least one training iteration");
        ensure!(
            self.alpha > 0.0,
            "learning rate must be positive, got {}",
            self.alpha
        );
        ensure!(
            0.0 <= self.min_alpha && self.min_alpha <= self.alpha,
            "min_alpha ({}) must be between 0 and alpha ({})",
            self.min_alpha,
            self.alpha
        );
        ensure!(
            self.hs || self.negative > 0,
            "enable hierarchical softmax or negative sampling, or nothing gets trained"
        );
        ensure!(
            self.negative == 0 || self.table_size > 0,
            "negative sampling needs a non-empty unigram table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = [
            Config { size: 0, ..Config::default() },
            Config { window: 0, ..Config::default() },
            Config { iterations: 0, ..Config::default() },
            Config { min_alpha: 0.5, ..Config::default() },
            Config { hs: false, negative: 0, ..Config::default() },
            Config { table_size: 0, ..Config::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn hs_alone_is_fine() {
        let config = Config {
            hs: true,
            negative: 0,
            table_size: 0,
            ..Config::default()
        };
        config.validate().unwrap();
    }
}
