//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.
//! Model selection and sampling flags are shared argument groups, flattened
//! into the commands that need them.

mod compress;
mod decode;
mod encode;
mod profile;

pub use compress::CompressCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use profile::ProfileCommand;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use tokenhide::model::ngram::DEFAULT_ORDER;
use tokenhide::model::{NgramModel, SyntheticModel};
use tokenhide::{LanguageModel, SamplingConfig};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self) -> Result<()>;
}

/// Which language model to run. Encoder and decoder must pick the same one.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Train a character n-gram model on this corpus file
    #[arg(long, conflicts_with = "synthetic")]
    pub corpus: Option<PathBuf>,

    /// N-gram order for --corpus
    #[arg(long, default_value_t = DEFAULT_ORDER)]
    pub order: usize,

    /// Use the seeded synthetic model (printable ASCII gibberish)
    #[arg(long, value_name = "SEED")]
    pub synthetic: Option<u64>,
}

impl ModelArgs {
    /// Builds the selected model.
    pub fn load(&self) -> Result<Box<dyn LanguageModel>> {
        if let Some(seed) = self.synthetic {
            info!(seed, "synthetic model");
            return Ok(Box::new(SyntheticModel::new(seed)));
        }

        let Some(path) = &self.corpus else {
            bail!("No model selected. Use --corpus <FILE> or --synthetic <SEED>");
        };

        let corpus = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus from {}", path.display()))?;
        let model = NgramModel::train(&corpus, self.order)
            .with_context(|| format!("Failed to train model on {}", path.display()))?;

        info!(
            order = model.order(),
            vocabulary = model.vocabulary_size(),
            "n-gram model"
        );
        Ok(Box::new(model))
    }
}

/// Sampling flags shared by encode and decode.
///
/// Values resolve in order: flag, profile file, built-in default.
#[derive(Args, Debug, Clone)]
pub struct SamplingArgs {
    /// Number of greedy tokens generated before encoding starts
    #[arg(short = 'k', long)]
    pub skip_start: Option<usize>,

    /// Maximum number of tokens to generate
    #[arg(short = 't', long)]
    pub token_count: Option<usize>,

    /// MinP filtering value (0-1)
    #[arg(long)]
    pub min_p: Option<f64>,

    /// TopK filtering value (0 = no limit)
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Sampling temperature
    #[arg(long)]
    pub temp: Option<f64>,

    /// Profile file with the agreed settings
    /// Defaults to ~/.tokenhide/profile.toml when it exists
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

impl SamplingArgs {
    /// Resolves flags over the profile.
    pub fn resolve(&self) -> Result<SamplingConfig> {
        self.resolve_with(false)
    }

    /// Like [`resolve`](Self::resolve), but a missing `--profile` file can
    /// fall back to the defaults (for a profile about to be created).
    pub fn resolve_with(&self, allow_missing: bool) -> Result<SamplingConfig> {
        let mut config = match &self.profile {
            Some(path) if allow_missing && !path.exists() => SamplingConfig::default(),
            Some(path) => SamplingConfig::load(path)
                .with_context(|| format!("Failed to load profile from {}", path.display()))?,
            None => SamplingConfig::load_default().context("Failed to load default profile")?,
        };

        if let Some(skip_start) = self.skip_start {
            config.skip_start = skip_start;
        }
        if let Some(token_count) = self.token_count {
            config.token_budget = token_count;
        }
        if let Some(min_p) = self.min_p {
            config.min_p = min_p;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(temp) = self.temp {
            config.temperature = temp;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Reads `path`, or stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Writes `data` to `path`, or to stdout when no path is given.
pub(crate) fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
