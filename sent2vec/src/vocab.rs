use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabWord {
    /// Position of this word in the vocabulary, and its row in `syn0`/`syn1neg`.
    pub index: usize,
    pub count: u64,
    pub word: String,
    /// Huffman code, root first. `code[d]` is which child (0 or 1) the path
    /// takes at internal node `point[d]`.
    pub code: Vec<u8>,
    /// Internal tree nodes on the path from the root, as rows of `syn1`.
    pub point: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct Vocab {
    words: Vec<VocabWord>,
    vocab_hash: HashMap<String, usize>,
}

impl Vocab {
    /// Count every token, drop the rare ones, and sort by descending frequency.
    ///
    /// Ties keep first-seen order, so the result doesn't depend on hashing.
    pub fn build<'a, S>(sentences: S, min_count: u64) -> Self
    where
        S: IntoIterator<Item = &'a [String]>,
    {
        let mut vocab = Vocab::default();
        for sentence in sentences {
            for token in sentence {
                if let Some(&a) = vocab.vocab_hash.get(token) {
                    vocab.words[a].count += 1;
                } else {
                    let a = vocab.add_word(token.clone());
                    vocab.words[a].count = 1;
                }
            }
        }
        vocab.sort(min_count);
        vocab
    }

    /// Build a vocabulary from `(word, count)` pairs, e.g. a saved vocab listing.
    pub fn from_counts<I>(counts: I, min_count: u64) -> Self
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let mut vocab = Vocab::default();
        for (word, count) in counts {
            let a = vocab.add_word(word);
            vocab.words[a].count = count;
        }
        vocab.sort(min_count);
        vocab
    }

    fn add_word(&mut self, word: String) -> usize {
        let n = self.words.len();
        self.words.push(VocabWord {
            index: n,
            count: 0,
            word: word.clone(),
            code: Vec::new(),
            point: Vec::new(),
        });
        self.vocab_hash.insert(word, n);
        n
    }

    fn sort(&mut self, min_count: u64) {
        self.words.sort_by_key(|vw| Reverse(vw.count));
        self.words.retain(|vw| vw.count >= min_count);

        // Indices changed; rebuild the hash.
        self.vocab_hash.clear();
        for (i, vw) in self.words.iter_mut().enumerate() {
            vw.index = i;
            self.vocab_hash.insert(vw.word.clone(), i);
        }
        self.create_binary_tree();
        debug!("vocabulary: {} words, {} tokens", self.len(), self.train_words());
    }

    // Create binary Huffman tree using the word counts.
    // Frequent words will have short unique binary codes.
    #[allow(clippy::needless_range_loop)]
    fn create_binary_tree(&mut self) {
        let vocab_size = self.words.len();
        if vocab_size < 2 {
            // A tree needs at least one internal node.
            for vw in &mut self.words {
                vw.code.clear();
                vw.point.clear();
            }
            return;
        }

        let mut count = vec![0u64; vocab_size * 2 + 1];
        let mut binary = vec![0u8; vocab_size * 2 + 1]; // which child a node is of its parent (0 or 1)
        let mut parent_node = vec![0usize; vocab_size * 2 + 1];

        for a in 0..vocab_size {
            count[a] = self.words[a].count;
        }
        for a in vocab_size..(vocab_size * 2) {
            count[a] = 1_000_000_000_000_000;
        }

        // Leaves are sorted by descending count, so the two smallest nodes are
        // always at the end of the leaves (pos1) or the start of the new
        // internal nodes (pos2).
        let mut pos1 = vocab_size;
        let mut pos2 = vocab_size;
        for a in 0..(vocab_size - 1) {
            let min1i;
            if pos1 > 0 && count[pos1 - 1] < count[pos2] {
                pos1 -= 1;
                min1i = pos1;
            } else {
                min1i = pos2;
                pos2 += 1;
            }

            let min2i;
            if pos1 > 0 && count[pos1 - 1] < count[pos2] {
                pos1 -= 1;
                min2i = pos1;
            } else {
                min2i = pos2;
                pos2 += 1;
            }

            count[vocab_size + a] = count[min1i] + count[min2i];
            parent_node[min1i] = vocab_size + a;
            parent_node[min2i] = vocab_size + a;
            binary[min2i] = 1;
        }

        // Walk each leaf up to the root. Internal node `n` becomes row `n - vocab_size` of syn1.
        let root = vocab_size * 2 - 2;
        for a in 0..vocab_size {
            let mut code: Vec<u8> = vec![];
            let mut point: Vec<u32> = vec![];
            let mut b = a;
            loop {
                code.push(binary[b]);
                b = parent_node[b];
                if b == root {
                    break;
                }
                point.push((b - vocab_size) as u32);
            }
            point.push((root - vocab_size) as u32);
            code.reverse();
            point.reverse();
            self.words[a].code = code;
            self.words[a].point = point;
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Total number of in-vocabulary tokens counted.
    pub fn train_words(&self) -> u64 {
        self.words.iter().map(|vw| vw.count).sum()
    }

    /// Returns position of a word in the vocabulary; if the word is not found, returns None.
    pub fn search(&self, word: &str) -> Option<usize> {
        self.vocab_hash.get(word).copied()
    }

    pub fn get(&self, word: &str) -> Option<&VocabWord> {
        self.search(word).map(|i| &self.words[i])
    }

    pub fn words(&self) -> &[VocabWord] {
        &self.words
    }

    /// Map tokens to vocabulary indices, `None` for out-of-vocabulary tokens.
    pub fn encode(&self, tokens: &[String]) -> Vec<Option<usize>> {
        tokens.iter().map(|t| self.search(t)).collect()
    }

    pub fn save(&self, vocab_file: &Path) -> Result<()> {
        let mut fo = BufWriter::new(
            File::create(vocab_file).context("error creating vocab file for write")?,
        );
        for vw in &self.words {
            writeln!(fo, "{} {}", vw.word, vw.count).context("error writing vocab file")?;
        }
        fo.flush().context("error writing vocab file")?;
        Ok(())
    }
}

impl std::ops::Index<usize> for Vocab {
    type Output = VocabWord;

    fn index(&self, i: usize) -> &VocabWord {
        &self.words[i]
    }
}
