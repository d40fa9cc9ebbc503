//! Error taxonomy for the steganographic codec.
//!
//! Every variant is terminal for the call that produced it. Nothing is
//! retried internally: encode and decode are deterministic, so a retry with
//! identical inputs reproduces the same failure.

use thiserror::Error;

use crate::model::{ModelError, TokenId};
use crate::payload::CompressionError;

/// Errors returned by [`encode`](crate::encode) and [`decode`](crate::decode).
#[derive(Error, Debug)]
pub enum StegoError {
    /// Payload bits were left over when generation stopped.
    ///
    /// Raise the token budget or shorten the secret.
    #[error(
        "Message too long for this generation: {remaining_bits} of {payload_bits} payload bits \
         left unencoded after {steps} tokens"
    )]
    CapacityExceeded {
        /// Bits still held by the accumulator when generation stopped.
        remaining_bits: u64,
        /// Total bits of the framed payload.
        payload_bits: u64,
        /// Number of tokens generated before stopping.
        steps: usize,
    },

    /// An observed carrier token is not among the recomputed candidates.
    ///
    /// The sampling settings, the model, or the carrier text differ from
    /// what was used when encoding.
    #[error(
        "Carrier token {token} at step {step} is not among the {candidates} candidates; \
         sampling settings or model differ from the encoder's"
    )]
    Desynchronized {
        /// Zero-based index of the carrier token.
        step: usize,
        /// The observed token id, or `TokenId::MAX` when the carrier holds a
        /// symbol the model cannot tokenize.
        token: TokenId,
        /// Size of the coding alphabet at that step.
        candidates: usize,
    },

    /// The recovered bits do not form a valid compressed payload.
    #[error("Recovered payload is corrupt: {0}")]
    CorruptPayload(String),

    /// Sampling configuration is out of range.
    #[error("Invalid sampling configuration: {0}")]
    InvalidConfig(String),

    /// The carrier text does not tokenize back into the generated tokens.
    #[error("Carrier text re-tokenizes differently at token {position}; it could not be decoded")]
    Retokenization {
        /// First token index where the round trip differs.
        position: usize,
    },

    /// The call was cancelled between two steps.
    #[error("Cancelled at step {step}")]
    Cancelled {
        /// The step that was about to run.
        step: usize,
    },

    /// The secret could not be compressed.
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    /// The model adapter failed.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
