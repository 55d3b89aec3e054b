//! Cosine similarity between sentence vectors.

use std::cmp::Reverse;

use ndarray::prelude::*;
use ordered_float::OrderedFloat;

use crate::real;

pub fn norm(v: ArrayView1<'_, real>) -> real {
    v.dot(&v).sqrt()
}

/// Cosine similarity of `a` and `b`. Not defined (NaN) if either is zero.
pub fn cosine_similarity(a: ArrayView1<'_, real>, b: ArrayView1<'_, real>) -> real {
    a.dot(&b) / (norm(a) * norm(b))
}

/// Set `sims[i]` to the cosine similarity between `vec` and `sents[i]`, for
/// each `i` in `0..num`.
///
/// Zero vectors are not special-cased; they produce NaN (or infinity) just as
/// the division does. Sorting the results is up to the caller.
pub fn rank_by_similarity(
    sents: ArrayView2<'_, real>,
    vec: ArrayView1<'_, real>,
    num: usize,
    sims: &mut [real],
) {
    let vec_len_r = 1.0 / norm(vec);
    for (i, sim) in sims[..num].iter_mut().enumerate() {
        let vec2 = sents.row(i);
        let vec2_len_r = 1.0 / norm(vec2);
        *sim = vec2.dot(&vec) * vec2_len_r * vec_len_r;
    }
}

/// The `topn` rows of `sents` most similar to `vec`, best first.
///
/// Rows scoring NaN are left out, as is `exclude` (usually `vec`'s own row).
pub fn most_similar(
    sents: ArrayView2<'_, real>,
    vec: ArrayView1<'_, real>,
    topn: usize,
    exclude: Option<usize>,
) -> Vec<(usize, real)> {
    let n = sents.nrows();
    let mut sims = vec![0.0; n];
    rank_by_similarity(sents, vec, n, &mut sims);

    let mut best: Vec<(usize, real)> = sims
        .into_iter()
        .enumerate()
        .filter(|&(i, sim)| Some(i) != exclude && !sim.is_nan())
        .collect();
    best.sort_by_key(|&(i, sim)| (Reverse(OrderedFloat(sim)), i));
    best.truncate(topn);
    best
}
