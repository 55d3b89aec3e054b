use anyhow::{ensure, Result};
use log::debug;
use ndarray::prelude::*;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::config::Config;
use crate::real;
use crate::vocab::Vocab;

/// The word2vec parameters the sentence vectors are trained against.
///
/// Every training call mutates these in place when word learning is enabled.
#[derive(Debug, Clone)]
pub struct WordModel {
    pub vocab: Vocab,
    /// Input word vectors, one row per vocabulary word.
    pub syn0: Array2<real>,
    /// Hierarchical-softmax weights, one row per internal node of the Huffman tree.
    pub syn1: Option<Array2<real>>,
    /// Negative-sampling weights, one row per vocabulary word.
    pub syn1neg: Option<Array2<real>>,
    /// Unigram table: vocabulary indices, each word repeated in proportion to `count^0.75`.
    pub table: Vec<usize>,
}

impl WordModel {
    pub fn new<R: Rng + ?Sized>(vocab: Vocab, config: &Config, rng: &mut R) -> Result<Self> {
        ensure!(!vocab.is_empty(), "vocabulary is empty");
        let vocab_size = vocab.len();
        let size = config.size;

        let syn0 = Array2::random_using((vocab_size, size), Uniform::<real>::new(-0.5, 0.5), rng)
            / size as real;
        let syn1 = config
            .hs
            .then(|| Array2::zeros((vocab_size.saturating_sub(1).max(1), size)));
        let (syn1neg, table) = if config.negative > 0 {
            (
                Some(Array2::zeros((vocab_size, size))),
                unigram_table(&vocab, config.table_size),
            )
        } else {
            (None, vec![])
        };
        debug!("allocated word model: {vocab_size} words x {size} dimensions");

        Ok(WordModel {
            vocab,
            syn0,
            syn1,
            syn1neg,
            table,
        })
    }

    /// Embedding size.
    pub fn size(&self) -> usize {
        self.syn0.ncols()
    }

    /// Check that this model has what `config` is going to ask of it.
    pub fn check(&self, config: &Config) -> Result<()> {
        let size = self.size();
        ensure!(
            size == config.size,
            "word vectors have {size} dimensions, configuration says {}",
            config.size
        );
        ensure!(
            self.syn0.nrows() == self.vocab.len(),
            "syn0 has {} rows for {} words",
            self.syn0.nrows(),
            self.vocab.len()
        );
        if config.hs {
            let syn1 = self.syn1.as_ref();
            ensure!(
                syn1.map_or(false, |m| m.ncols() == size),
                "hierarchical softmax is enabled but the model has no matching syn1"
            );
        }
        if config.negative > 0 {
            ensure!(
                self.syn1neg
                    .as_ref()
                    .map_or(false, |m| m.dim() == (self.vocab.len(), size)),
                "negative sampling is enabled but the model has no matching syn1neg"
            );
            ensure!(
                !self.table.is_empty(),
                "negative sampling is enabled but the unigram table is empty"
            );
        }
        Ok(())
    }
}

/// Lay out `table_size` slots, giving word `i` a share proportional to `count^0.75`.
pub fn unigram_table(vocab: &Vocab, table_size: usize) -> Vec<usize> {
    let power: f64 = 0.75;
    let words = vocab.words();
    if words.is_empty() {
        return vec![];
    }
    let train_words_pow = words
        .iter()
        .map(|v| (v.count as f64).powf(power))
        .sum::<f64>();

    let mut table = Vec::with_capacity(table_size);
    let mut i = 0;
    let mut d1 = (words[i].count as f64).powf(power) / train_words_pow;
    for a in 0..table_size {
        table.push(i);
        if (a as f64 / table_size as f64) > d1 && i + 1 < words.len() {
            i += 1;
            d1 += (words[i].count as f64).powf(power) / train_words_pow;
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::rng::Rng as Lcg;

    fn vocab() -> Vocab {
        Vocab::from_counts(
            [("a", 100u64), ("b", 30), ("c", 10), ("d", 1)]
                .iter()
                .map(|&(w, c)| (w.to_string(), c)),
            1,
        )
    }

    #[test]
    fn table_proportions() {
        let table = unigram_table(&vocab(), 1000);
        assert_eq!(table.len(), 1000);
        assert!(table.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(table[0], 0);
        assert_eq!(*table.last().unwrap(), 3);
        let share = |i| table.iter().filter(|&&t| t == i).count();
        assert!(share(0) > share(1));
        assert!(share(1) > share(2));
        assert!(share(2) > share(3));
        assert!(share(3) > 0);
    }

    #[test]
    fn allocates_what_config_asks_for() {
        let mut rng = Lcg::seed_from_u64(1);
        let config = Config {
            size: 8,
            hs: true,
            negative: 3,
            table_size: 100,
            ..Config::default()
        };
        let model = WordModel::new(vocab(), &config, &mut rng).unwrap();
        assert_eq!(model.syn0.dim(), (4, 8));
        assert_eq!(model.syn1.as_ref().unwrap().dim(), (3, 8));
        assert_eq!(model.syn1neg.as_ref().unwrap().dim(), (4, 8));
        assert_eq!(model.table.len(), 100);
        assert!(model.syn0.iter().all(|&x| x.abs() <= 0.5 / 8.0));
        assert!(model.syn0.iter().any(|&x| x != 0.0));
        model.check(&config).unwrap();

        let config = Config {
            hs: false,
            negative: 0,
            ..config
        };
        let model = WordModel::new(vocab(), &config, &mut rng).unwrap();
        assert!(model.syn1.is_none());
        assert!(model.syn1neg.is_none());
        assert!(model.table.is_empty());
    }

    #[test]
    fn check_catches_missing_layers() {
        let mut rng = Lcg::seed_from_u64(1);
        let config = Config {
            size: 4,
            hs: false,
            negative: 2,
            table_size: 10,
            ..Config::default()
        };
        let model = WordModel::new(vocab(), &config, &mut rng).unwrap();
        assert!(model.check(&Config { hs: true, ..config.clone() }).is_err());
        assert!(model.check(&Config { size: 5, ..config.clone() }).is_err());
        model.check(&config).unwrap();
    }

    #[test]
    fn empty_vocab_is_an_error() {
        let mut rng = Lcg::seed_from_u64(1);
        assert!(WordModel::new(Vocab::default(), &Config::default(), &mut rng).is_err());
    }
}
