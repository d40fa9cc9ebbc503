//! Decode command - recover a secret from carrier text.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tokenhide::decode;

use super::{read_input, write_output, CommandExecutor, ModelArgs, SamplingArgs};

/// Recover the secret hidden in the carrier text read from stdin (or --infile).
///
/// Model and sampling settings must match the ones used to encode.
/// `--token-count` is accepted for symmetry and ignored.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// File to read the carrier text from (defaults to stdin)
    #[arg(short, long)]
    pub infile: Option<PathBuf>,

    /// File to write the recovered secret to (defaults to stdout)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self) -> Result<()> {
        let model = self.model.load()?;
        let sampling = self.sampling.resolve()?;

        let input = read_input(self.infile.as_deref())?;
        let carrier = String::from_utf8(input).context("Carrier text is not valid UTF-8")?;

        let decoded = decode(model.as_ref(), &carrier, &sampling).context("Failed to decode carrier")?;

        eprintln!(
            "Decoded {} bytes from {} tokens",
            decoded.message.len(),
            decoded.report.steps
        );

        write_output(self.outfile.as_deref(), &decoded.message)
    }
}
