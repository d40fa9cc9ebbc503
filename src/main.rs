//! Tokenhide - Hide bytes in generated text
//!
//! A CLI tool for language-model steganography.
//! The secret becomes the token choices of a deterministic model; only the
//! generated text is transmitted.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CommandExecutor, CompressCommand, DecodeCommand, EncodeCommand, ProfileCommand};

/// Tokenhide - Hide bytes in generated text
///
/// Every generated token after the warm-up is a digit of the compressed
/// secret. The same model and sampling settings recover it.
#[derive(Parser)]
#[command(name = "tokenhide")]
#[command(version)]
#[command(about = "Hide messages in language-model generated text")]
#[command(long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv per-step digits, -vvv candidate sets)
    /// RUST_LOG takes precedence when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide the message sent into stdin in the generated text
    Encode(EncodeCommand),

    /// Recover a hidden message from the text sent to stdin
    Decode(DecodeCommand),

    /// Get the length of the text sent to stdin before and after compression in bits
    Compress(CompressCommand),

    /// Show or save the sampling profile
    Profile(ProfileCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Encode(cmd) => cmd.execute(),
        Commands::Decode(cmd) => cmd.execute(),
        Commands::Compress(cmd) => cmd.execute(),
        Commands::Profile(cmd) => cmd.execute(),
    }
}

/// Logs go to stderr; stdout carries only carrier text or secrets.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
