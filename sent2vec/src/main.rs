use std::path::PathBuf;
use std::process;

use anyhow::{ensure, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use rand::SeedableRng;

use sent2vec::corpus::read_sentences;
use sent2vec::{real, Architecture, Config, OutputFormat, Rng, Sent2Vec, Vocab, WordModel};

#[derive(Parser)]
#[command(about = "SENTENCE VECTOR estimation toolkit", long_about = None, version = "0.1")]
struct Options {
    /// Use text data from FILE to train the model, one sentence per line
    #[arg(long = "train", value_name = "FILE")]
    train_file: PathBuf,

    /// Use FILE to save the resulting sentence vectors
    #[arg(long = "output", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Set size of word and sentence vectors
    #[arg(long = "size", default_value_t = 100)]
    layer1_size: usize,

    /// Set max skip length between words
    #[arg(long, default_value_t = 5)]
    window: usize,

    /// Use Hierarchical Softmax
    #[arg(long)]
    hs: bool,

    /// Number of negative examples; common values are 3 - 10 (0 = not used)
    #[arg(long, default_value_t = 5)]
    negative: usize,

    /// Training passes over each sentence
    #[arg(long, default_value_t = 1)]
    iter: usize,

    /// Discard words that appear less than N times
    #[arg(long = "min-count", value_name = "N", default_value_t = 1)]
    min_count: u64,

    /// Set the starting learning rate; default is 0.025 for skip-gram and 0.05 for CBOW
    #[arg(long)]
    alpha: Option<real>,

    /// The learning rate never decays below this
    #[arg(long = "min-alpha", default_value_t = 0.0001)]
    min_alpha: real,

    /// Use the continuous bag of words model (otherwise, use skip-gram model)
    #[arg(long)]
    cbow: bool,

    /// CBOW: use the mean of the context vectors instead of their sum
    #[arg(long = "cbow-mean")]
    cbow_mean: bool,

    /// Also train the word vectors and output weights, not just the sentence vectors
    #[arg(long = "word-learn")]
    word_learn: bool,

    /// Number of slots in the negative sampling table
    #[arg(long = "table-size", value_name = "N", default_value_t = 10_000_000)]
    table_size: usize,

    /// Seed for the random number generator
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Set the debug mode (default = 2 = more info during training)
    #[arg(long = "debug", default_value_t = 2)]
    debug_mode: usize,

    /// Save the resulting vectors in binary mode
    #[arg(long, group = "format")]
    binary: bool,

    /// Save the vectors and settings in bincode format
    #[arg(long, group = "format")]
    bincode: bool,

    /// The vocabulary will be saved to FILE
    #[arg(long = "save-vocab", value_name = "FILE")]
    save_vocab_file: Option<PathBuf>,

    /// After training, list the sentences closest to sentence N (0-based line number)
    #[arg(long, value_name = "N")]
    query: Option<usize>,

    /// Number of closest sentences to list with --query
    #[arg(long, default_value_t = 10)]
    topn: usize,
}

impl Options {
    fn config(&self) -> Config {
        Config {
            architecture: if self.cbow {
                Architecture::Cbow
            } else {
                Architecture::SkipGram
            },
            size: self.layer1_size,
            window: self.window,
            hs: self.hs,
            negative: self.negative,
            word_learn: self.word_learn,
            cbow_mean: self.cbow_mean,
            alpha: self.alpha.unwrap_or(if self.cbow { 0.05 } else { 0.025 }),
            min_alpha: self.min_alpha,
            iterations: self.iter,
            min_count: self.min_count,
            table_size: self.table_size,
            seed: self.seed,
        }
    }

    fn output_format(&self) -> OutputFormat {
        if self.bincode {
            OutputFormat::Bincode
        } else if self.binary {
            OutputFormat::Binary
        } else {
            OutputFormat::Text
        }
    }

    fn log_level(&self) -> LevelFilter {
        match self.debug_mode {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

fn train(options: &Options) -> Result<()> {
    let config = options.config();
    config.validate()?;
    info!(
        "Starting training using file {}",
        options.train_file.display()
    );

    let sentences = read_sentences(&options.train_file)?;
    let vocab = Vocab::build(sentences.iter().map(Vec::as_slice), config.min_count);
    info!("Vocab size: {}", vocab.len());
    info!("Words in train file: {}", vocab.train_words());
    if let Some(f) = &options.save_vocab_file {
        vocab.save(f)?;
    }

    let encoded: Vec<Vec<Option<usize>>> = sentences.iter().map(|s| vocab.encode(s)).collect();
    if let Some(query) = options.query {
        ensure!(
            query < encoded.len(),
            "--query {query} is out of range: the training file has {} sentences",
            encoded.len()
        );
    }

    let mut rng = Rng::seed_from_u64(config.seed);
    let model = WordModel::new(vocab, &config, &mut rng)?;
    let mut sent2vec = Sent2Vec::with_rng(config, model, rng)?;

    let progress = if options.debug_mode > 1 {
        let bar = ProgressBar::new(encoded.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{elapsed_precise} [{bar:40}] {pos}/{len} sentences {msg}",
            )?
            .progress_chars("#>-"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };
    sent2vec.train_with_progress(&encoded, &progress);
    progress.finish_and_clear();

    if let Some(query) = options.query {
        println!();
        println!("Sentence {query}: {}", sentences[query].join(" "));
        println!();
        println!("  Sentence                                                    Cosine distance");
        println!("------------------------------------------------------------------------------");
        for (i, sim) in sent2vec.most_similar(query, options.topn) {
            println!("{:>8}  {:50}\t\t{}", i, sentences[i].join(" "), sim);
        }
    }

    if let Some(output_file) = &options.output_file {
        sent2vec
            .into_sentence_vectors()
            .save(output_file, options.output_format())?;
        info!("Saved sentence vectors to {}", output_file.display());
    }
    Ok(())
}

fn main() {
    let options = Options::parse();

    env_logger::Builder::new()
        .filter_level(options.log_level())
        .parse_default_env()
        .init();

    if let Err(err) = train(&options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
