use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{MAX_SENTENCE_LENGTH, MAX_STRING};

/// Read one sentence per line, splitting on spaces, tabs and `\r`.
///
/// Every line yields a sentence, even an empty one, so sentence `i` is always
/// line `i + 1` of the file. Over-long sentences are cut at
/// `MAX_SENTENCE_LENGTH` words and over-long words at `MAX_STRING - 1` bytes.
pub fn read_sentences(path: &Path) -> Result<Vec<Vec<String>>> {
    let f = BufReader::new(File::open(path).context("error opening training data file")?);
    let sentences = parse_sentences(f).context("error reading training data file")?;
    debug!(
        "read {} sentences ({} tokens) from {}",
        sentences.len(),
        sentences.iter().map(Vec::len).sum::<usize>(),
        path.display()
    );
    Ok(sentences)
}

pub fn parse_sentences<R: BufRead>(input: R) -> Result<Vec<Vec<String>>> {
    let mut sentences = vec![];
    for (line_num, line) in input.split(b'\n').enumerate() {
        let line = line?;
        let mut sentence: Vec<String> = vec![];
        for word in line
            .split(|&b| b == b' ' || b == b'\t' || b == b'\r')
            .filter(|w| !w.is_empty())
        {
            if sentence.len() >= MAX_SENTENCE_LENGTH {
                warn!(
                    "line {}: sentence truncated to {MAX_SENTENCE_LENGTH} words",
                    line_num + 1
                );
                break;
            }
            let word = &word[..word.len().min(MAX_STRING - 1)]; // Truncate too long words
            sentence.push(String::from_utf8_lossy(word).to_string());
        }
        sentences.push(sentence);
    }
    Ok(sentences)
}
