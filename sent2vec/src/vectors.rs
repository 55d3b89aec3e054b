use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Index;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::real;
use crate::similarity;

/// How to write sentence vectors to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `num size` header, then one `sent_<i> v0 v1 ...` line per sentence.
    Text,
    /// Same header and labels, but each vector as raw native-endian `real`s.
    Binary,
    /// The whole `SentenceVectors` value, bincode-encoded; can be loaded back.
    Bincode,
}

/// Trained sentence vectors, one per input line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceVectors {
    /// Settings the vectors were trained with.
    pub config: Config,

    /// Embedding vector length (number of dimensions).
    size: usize,

    /// `vectors[k * size..(k+1) * size]` is the vector for sentence `k`.
    vectors: Vec<real>,
}

impl Index<usize> for SentenceVectors {
    type Output = [real];

    fn index(&self, i: usize) -> &[real] {
        &self.vectors[i * self.size..][..self.size]
    }
}

impl SentenceVectors {
    pub fn new(config: Config, sents: ArrayView2<'_, real>) -> Self {
        SentenceVectors {
            config,
            size: sents.ncols(),
            vectors: sents.iter().copied().collect(),
        }
    }

    pub fn num_sentences(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.vectors.len() / self.size
        }
    }

    /// Returns the vector size.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn view(&self) -> ArrayView2<'_, real> {
        ArrayView2::from_shape((self.num_sentences(), self.size), &self.vectors[..])
            .expect("vectors.len() is a multiple of size")
    }

    /// The `topn` sentences closest to sentence `i`, not counting `i` itself.
    pub fn most_similar(&self, i: usize, topn: usize) -> Vec<(usize, real)> {
        let sents = self.view();
        similarity::most_similar(sents, sents.row(i), topn, Some(i))
    }

    pub fn save(&self, output_file: &Path, format: OutputFormat) -> Result<()> {
        let mut fo =
            BufWriter::new(File::create(output_file).context("error creating output file")?);
        match format {
            OutputFormat::Bincode => {
                bincode::serialize_into(&mut fo, self).context("error writing output file")?;
            }
            OutputFormat::Text | OutputFormat::Binary => {
                writeln!(fo, "{} {}", self.num_sentences(), self.size)
                    .context("error writing output file")?;
                for a in 0..self.num_sentences() {
                    write!(fo, "sent_{a} ").context("error writing output file")?;
                    let vec = &self[a];
                    if format == OutputFormat::Binary {
                        fo.write_all(bytemuck::cast_slice::<real, u8>(vec))
                            .context("error writing output file")?;
                    } else {
                        for f in vec {
                            write!(fo, "{f} ").context("error writing output file")?;
                        }
                    }
                    writeln!(fo).context("error writing output file")?;
                }
            }
        }
        fo.flush().context("error writing output file")?;
        Ok(())
    }

    /// Load vectors saved with `OutputFormat::Bincode`.
    pub fn load(filename: &Path) -> Result<Self> {
        let f = BufReader::new(
            File::open(filename)
                .with_context(|| format!("failed to open vectors file {filename:?}"))?,
        );
        let vectors: SentenceVectors = bincode::deserialize_from(f)
            .with_context(|| format!("failed to load vectors from file {filename:?}"))?;
        ensure!(
            vectors.size == 0 || vectors.vectors.len() % vectors.size == 0,
            "corrupt vectors file {filename:?}"
        );
        Ok(vectors)
    }
}
