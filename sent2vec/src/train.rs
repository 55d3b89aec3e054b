//! Gradient updates for one sentence.
//!
//! These functions trust their inputs: a missing `syn1` while `hs` is on, an
//! empty unigram table while `negative > 0`, or vectors of the wrong length
//! panic. `Config::validate` and `WordModel::check` are where those get caught.

use std::ops::Range;

use ndarray::prelude::*;
use rand::Rng;

use crate::config::{Architecture, Config};
use crate::real;
use crate::word_model::WordModel;

/// Scratch space for the training functions, so that a long run doesn't
/// allocate per token.
#[derive(Debug, Clone)]
pub struct TrainBuffers {
    /// Hidden layer activation (CBOW only; skip-gram uses the sentence vector).
    neu1: Array1<real>,
    /// Error propagated back to the hidden layer.
    neu1e: Array1<real>,
    /// Output-layer rows to score against the hidden layer, with their labels.
    targets: Vec<(usize, real)>,
    grads: Vec<real>,
    negatives: Vec<usize>,
    context: Vec<usize>,
}

impl TrainBuffers {
    pub fn new(size: usize) -> Self {
        TrainBuffers {
            neu1: Array1::zeros(size),
            neu1e: Array1::zeros(size),
            targets: vec![],
            grads: vec![],
            negatives: vec![],
            context: vec![],
        }
    }

    /// The hidden-layer error from the most recent prediction.
    pub fn hidden_error(&self) -> ArrayView1<'_, real> {
        self.neu1e.view()
    }
}

/// The logistic function, 1 / (1 + e^-x).
pub fn sigmoid(x: real) -> real {
    1.0 / (1.0 + (-x).exp())
}

/// Positions at most `radius` away from `i`, clipped to `0..len`.
pub fn window_around(i: usize, radius: usize, len: usize) -> Range<usize> {
    let start = i.saturating_sub(radius);
    let stop = (i + radius + 1).min(len);
    start..stop
}

/// Fill `out` with `target` followed by `negative` words drawn from `table`.
///
/// A draw that hits `target` is thrown away and redrawn, so `out` always ends
/// up `negative + 1` long with `target` only at position 0. Loops forever if
/// `table` contains nothing but `target`.
pub fn draw_negative_samples<R: Rng + ?Sized>(
    rng: &mut R,
    table: &[usize],
    target: usize,
    negative: usize,
    out: &mut Vec<usize>,
) {
    out.clear();
    out.push(target);
    while out.len() < negative + 1 {
        let w = table[rng.gen_range(0..table.len())];
        if w != target {
            out.push(w);
        }
    }
}

/// Score `l1` against each target row of `weights` and backpropagate.
///
/// All scores and errors use the rows as they were on entry; the rows are
/// updated afterwards, and only if `learn_weights` is set.
///
/// A row listed more than once (a negative drawn twice) gets every one of its
/// updates, as in word2vec.c. A vectorised `weights[rows] += g * l1` would
/// keep only one of them. The CBOW context rows of `syn0` add up the same way.
fn backprop(
    l1: ArrayView1<'_, real>,
    targets: &[(usize, real)],
    weights: &mut Array2<real>,
    alpha: real,
    learn_weights: bool,
    grads: &mut Vec<real>,
    neu1e: &mut Array1<real>,
) {
    grads.clear();
    for &(row, label) in targets {
        // Propagate hidden -> output
        let l2 = weights.row(row);
        let f = sigmoid(l1.dot(&l2));
        // 'g' is the gradient multiplied by the learning rate
        let g = (label - f) * alpha;
        // Propagate errors output -> hidden
        neu1e.scaled_add(g, &l2);
        grads.push(g);
    }
    if learn_weights {
        // Learn weights hidden -> output
        for (&(row, _), &g) in targets.iter().zip(grads.iter()) {
            weights.row_mut(row).scaled_add(g, &l1);
        }
    }
}

/// Predict `word` from the hidden layer `l1` with every enabled output layer,
/// adding the resulting error into `neu1e`.
#[allow(clippy::too_many_arguments)]
fn predict<R: Rng + ?Sized>(
    config: &Config,
    model: &mut WordModel,
    l1: ArrayView1<'_, real>,
    word: usize,
    alpha: real,
    rng: &mut R,
    targets: &mut Vec<(usize, real)>,
    grads: &mut Vec<real>,
    negatives: &mut Vec<usize>,
    neu1e: &mut Array1<real>,
) {
    let WordModel {
        vocab,
        syn1,
        syn1neg,
        table,
        ..
    } = model;

    // HIERARCHICAL SOFTMAX
    if config.hs {
        let syn1 = syn1
            .as_mut()
            .expect("syn1 is allocated whenever hierarchical softmax is on");
        let vw = &vocab[word];
        targets.clear();
        targets.extend(
            vw.point
                .iter()
                .zip(&vw.code)
                .map(|(&node, &bit)| (node as usize, 1.0 - bit as real)),
        );
        backprop(l1, targets, syn1, alpha, config.word_learn, grads, neu1e);
    }

    // NEGATIVE SAMPLING
    if config.negative > 0 {
        let syn1neg = syn1neg
            .as_mut()
            .expect("syn1neg is allocated whenever negative sampling is on");
        draw_negative_samples(rng, table, word, config.negative, negatives);
        targets.clear();
        targets.extend(
            negatives
                .iter()
                .enumerate()
                .map(|(d, &w)| (w, if d == 0 { 1.0 } else { 0.0 })),
        );
        backprop(l1, targets, syn1neg, alpha, config.word_learn, grads, neu1e);
    }
}

fn count_words(sentence: &[Option<usize>]) -> usize {
    sentence.iter().flatten().count()
}

/// Train `sent_vec` on one sentence, choosing the architecture from `config`.
///
/// Returns the number of in-vocabulary words in the sentence. Pass `buffers`
/// to reuse scratch space across calls; otherwise it is allocated here.
pub fn train_sentence<R: Rng + ?Sized>(
    config: &Config,
    model: &mut WordModel,
    sent_vec: ArrayViewMut1<'_, real>,
    sentence: &[Option<usize>],
    alpha: real,
    rng: &mut R,
    buffers: Option<&mut TrainBuffers>,
) -> usize {
    let mut local;
    let buffers = match buffers {
        Some(buffers) => buffers,
        None => {
            local = TrainBuffers::new(sent_vec.len());
            &mut local
        }
    };
    match config.architecture {
        Architecture::SkipGram => {
            train_sentence_sg(config, model, sent_vec, sentence, alpha, rng, buffers)
        }
        Architecture::Cbow => {
            train_sentence_cbow(config, model, sent_vec, sentence, alpha, rng, buffers)
        }
    }
}

/// Skip-gram: the sentence vector stands in for the center word and is used to
/// predict every word in the (randomly shrunk) window.
///
/// The window includes the center position itself.
pub fn train_sentence_sg<R: Rng + ?Sized>(
    config: &Config,
    model: &mut WordModel,
    mut sent_vec: ArrayViewMut1<'_, real>,
    sentence: &[Option<usize>],
    alpha: real,
    rng: &mut R,
    buffers: &mut TrainBuffers,
) -> usize {
    let window = config.window;
    let TrainBuffers {
        neu1e,
        targets,
        grads,
        negatives,
        ..
    } = buffers;

    for (pos, word) in sentence.iter().enumerate() {
        if word.is_none() {
            continue;
        }
        let reduced_window = rng.gen_range(0..window); // `b` in word2vec.c
        let span = window_around(pos, window - reduced_window, sentence.len());
        for &word2 in sentence[span].iter().flatten() {
            neu1e.fill(0.0);
            predict(
                config,
                model,
                sent_vec.view(),
                word2,
                alpha,
                rng,
                targets,
                grads,
                negatives,
                neu1e,
            );
            // Learn input -> hidden
            sent_vec += &*neu1e;
        }
    }
    count_words(sentence)
}

/// CBOW: the context words plus the sentence vector predict the center word.
///
/// The sentence vector acts as one more context word that is always present.
pub fn train_sentence_cbow<R: Rng + ?Sized>(
    config: &Config,
    model: &mut WordModel,
    mut sent_vec: ArrayViewMut1<'_, real>,
    sentence: &[Option<usize>],
    alpha: real,
    rng: &mut R,
    buffers: &mut TrainBuffers,
) -> usize {
    let window = config.window;
    let TrainBuffers {
        neu1,
        neu1e,
        targets,
        grads,
        negatives,
        context,
    } = buffers;

    for (pos, word) in sentence.iter().enumerate() {
        let word = match *word {
            Some(word) => word,
            None => continue,
        };
        let reduced_window = rng.gen_range(0..window);
        context.clear();
        for c in window_around(pos, window - reduced_window, sentence.len()) {
            if c != pos {
                if let Some(word2) = sentence[c] {
                    context.push(word2);
                }
            }
        }

        // in -> hidden
        neu1.fill(0.0);
        for &word2 in context.iter() {
            *neu1 += &model.syn0.row(word2);
        }
        *neu1 += &sent_vec;
        if config.cbow_mean && !context.is_empty() {
            *neu1 /= (context.len() + 1) as real;
        }

        neu1e.fill(0.0);
        predict(
            config,
            model,
            neu1.view(),
            word,
            alpha,
            rng,
            targets,
            grads,
            negatives,
            neu1e,
        );

        // hidden -> in, once per context occurrence
        if config.word_learn {
            for &word2 in context.iter() {
                let mut row = model.syn0.row_mut(word2);
                row += &*neu1e;
            }
        }
        sent_vec += &*neu1e;
    }
    count_words(sentence)
}
