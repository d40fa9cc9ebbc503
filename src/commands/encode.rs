//! Encode command - hide a secret in generated text.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tokenhide::{encode_with_config, EncoderConfig, StepEvent};

use super::{read_input, write_output, CommandExecutor, ModelArgs, SamplingArgs};

/// Hide the secret read from stdin (or --infile) in text generated from PROMPT.
///
/// The carrier text is written to stdout (or --outfile). The decoder needs
/// the same model and sampling settings, but not the prompt.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// The prompt that steers the start of the generated text
    pub prompt: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// File to read the secret from (defaults to stdin)
    #[arg(short, long)]
    pub infile: Option<PathBuf>,

    /// File to write the carrier text to (defaults to stdout)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    /// Stream generated tokens to stderr as they are chosen
    #[arg(long)]
    pub preview: bool,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self) -> Result<()> {
        let model = self.model.load()?;
        let sampling = self.sampling.resolve()?;
        let secret = read_input(self.infile.as_deref())?;

        let preview = |event: &StepEvent| {
            if let Ok(piece) = model.detokenize(&[event.token]) {
                let mut stderr = std::io::stderr().lock();
                write!(stderr, "{}", piece).and_then(|_| stderr.flush()).ok();
            }
        };
        let config = EncoderConfig {
            on_step: self.preview.then_some(&preview as &dyn Fn(&StepEvent)),
            ..Default::default()
        };

        let encoded = encode_with_config(model.as_ref(), &self.prompt, &secret, &sampling, &config)
            .context("Failed to encode secret")?;

        if self.preview {
            eprintln!();
        }

        let report = &encoded.report;
        eprintln!(
            "Encoded {} payload bits in {} tokens ({} greedy, {} entropy, {} filler)",
            report.payload_bits,
            report.steps,
            report.greedy_steps,
            report.entropy_steps + report.zero_bit_steps,
            report.filler_steps
        );

        // No trailing newline: the decoder needs the exact carrier bytes
        write_output(self.outfile.as_deref(), encoded.text.as_bytes())
    }
}
