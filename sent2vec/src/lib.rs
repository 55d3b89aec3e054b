//! Sentence vectors trained on top of a word2vec model.
//!
//! Each sentence gets a dense vector that is trained by plain SGD, either as
//! the input of a skip-gram model predicting the sentence's words or as an
//! extra, always-present context word of a CBOW model. The shared word
//! matrices can be trained along with it or held fixed.

pub mod config;
pub mod corpus;
pub mod rng;
pub mod similarity;
pub mod train;
pub mod trainer;
pub mod vectors;
pub mod vocab;
pub mod word_model;

pub use config::{Architecture, Config};
pub use rng::Rng;
pub use similarity::{cosine_similarity, most_similar, rank_by_similarity};
pub use train::{train_sentence, train_sentence_cbow, train_sentence_sg, TrainBuffers};
pub use trainer::Sent2Vec;
pub use vectors::{OutputFormat, SentenceVectors};
pub use vocab::{Vocab, VocabWord};
pub use word_model::WordModel;

/// Max length of a word, in bytes.
pub const MAX_STRING: usize = 100;

/// Longer sentences are cut off at this many words.
pub const MAX_SENTENCE_LENGTH: usize = 1000;

// Precision of float numbers
#[cfg(not(feature = "double"))]
#[allow(non_camel_case_types)]
pub type real = f32;
#[cfg(feature = "double")]
#[allow(non_camel_case_types)]
pub type real = f64;

#[cfg(test)]
mod tests {
    use super::real;

    #[test]
    fn precision_follows_feature() {
        let bytes = if cfg!(feature = "double") { 8 } else { 4 };
        assert_eq!(std::mem::size_of::<real>(), bytes);
    }
}
