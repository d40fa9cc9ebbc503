//! Compress command - show how many bits a secret costs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tokenhide::payload::{compress, compression_ratio, payload_bits};

use super::{read_input, CommandExecutor};

/// Get the size of the secret read from stdin (or --infile) in bits, before
/// and after compression.
#[derive(Args, Debug)]
pub struct CompressCommand {
    /// File to read the secret from (defaults to stdin)
    #[arg(short, long)]
    pub infile: Option<PathBuf>,
}

impl CommandExecutor for CompressCommand {
    fn execute(&self) -> Result<()> {
        let secret = read_input(self.infile.as_deref())?;
        let compressed = compress(&secret).context("Failed to compress secret")?;

        println!("Normal: {}", secret.len() * 8);
        println!("Compressed: {}", compressed.len() * 8);
        println!("Payload: {}", payload_bits(&secret)?);
        println!(
            "Ratio: {:.1}%",
            compression_ratio(&secret, &compressed) * 100.0
        );

        Ok(())
    }
}
