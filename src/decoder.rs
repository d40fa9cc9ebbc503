//! Secret recovery from carrier text.
//!
//! This module orchestrates the decoding process:
//! 1. Tokenize the carrier text with the model's tokenizer
//! 2. Replay generation from the model's start context
//! 3. Read the rank of each observed token as a mixed-radix digit
//! 4. Unframe and decompress the rebuilt payload
//!
//! Decoding fails loudly. A carrier produced with other settings, another
//! model, or altered in transit surfaces as [`StegoError::Desynchronized`]
//! or [`StegoError::CorruptPayload`].

use std::borrow::Cow;
use std::sync::atomic::AtomicBool;

use tracing::{debug, info, trace, warn};

use crate::config::SamplingConfig;
use crate::encoder::{candidates, check_cancelled};
use crate::error::StegoError;
use crate::model::{LanguageModel, ModelError, TokenId};
use crate::payload::{self, BitAccumulator};
use crate::step::coding_alphabet;

/// Hooks for a running decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderConfig<'a> {
    /// Checked before every step; when set the decode stops with
    /// [`StegoError::Cancelled`].
    pub cancel: Option<&'a AtomicBool>,
}

/// Statistics of one decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
    /// Tokens in the carrier.
    pub steps: usize,
    /// Warm-up tokens skipped.
    pub greedy_steps: usize,
    /// Tokens read as a digit of radix 2 or more, filler included.
    pub digit_steps: usize,
    /// Tokens with a single candidate.
    pub zero_bit_steps: usize,
    /// `sum(log2(radix))` over digit steps.
    pub capacity_bits: f64,
}

/// Result of decoding a carrier.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// The recovered secret.
    pub message: Vec<u8>,
    /// Step statistics.
    pub report: DecodeReport,
}

impl DecodedMessage {
    /// The secret as text, with invalid UTF-8 replaced.
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.message)
    }
}

/// Recovers the secret hidden in `carrier`.
///
/// # Arguments
/// * `model` - The language model used by the encoder
/// * `carrier` - The carrier text, byte-identical to what was encoded
/// * `sampling` - The encoder's sampling settings (`token_budget` is unused)
pub fn decode<M>(
    model: &M,
    carrier: &str,
    sampling: &SamplingConfig,
) -> Result<DecodedMessage, StegoError>
where
    M: LanguageModel + ?Sized,
{
    decode_with_config(model, carrier, sampling, &DecoderConfig::default())
}

/// Decodes a carrier with a cancellation hook.
pub fn decode_with_config<M>(
    model: &M,
    carrier: &str,
    sampling: &SamplingConfig,
    config: &DecoderConfig<'_>,
) -> Result<DecodedMessage, StegoError>
where
    M: LanguageModel + ?Sized,
{
    sampling.validate()?;

    // Step 1: Tokenize
    let (tokens, foreign) = tokenize_carrier(model, carrier)?;
    info!(
        tokens = tokens.len(),
        skip_start = sampling.skip_start,
        "decoding"
    );

    // Step 2: Replay
    let mut context = model.start_context();
    let mut value = BitAccumulator::new();
    let mut report = DecodeReport {
        steps: tokens.len(),
        ..Default::default()
    };

    for (step, &token) in tokens.iter().enumerate() {
        check_cancelled(config.cancel, step)?;

        if step < sampling.skip_start {
            report.greedy_steps += 1;
            context.push(token);
            continue;
        }

        let set = candidates(model, &context, sampling)?;
        let alphabet = coding_alphabet(model, &set);
        trace!(step, candidates = alphabet.len(), "candidate set");

        // Step 3: The rank is the digit
        let Some(digit) = alphabet.iter().position(|&t| t == token) else {
            warn!(step, token, candidates = alphabet.len(), "desynchronized");
            return Err(StegoError::Desynchronized {
                step,
                token,
                candidates: alphabet.len(),
            });
        };

        let radix = alphabet.len();
        if radix > 1 {
            debug!(step, digit, radix, "digit");
            value.absorb_digit(digit, radix);
            report.digit_steps += 1;
            report.capacity_bits += (radix as f64).log2();
        } else {
            report.zero_bit_steps += 1;
        }

        context.push(token);
    }

    if let Some(symbol) = foreign {
        let step = tokens.len();
        let width = if step < sampling.skip_start {
            1
        } else {
            coding_alphabet(model, &candidates(model, &context, sampling)?).len()
        };
        warn!(step, %symbol, candidates = width, "desynchronized on a symbol outside the vocabulary");
        return Err(StegoError::Desynchronized {
            step,
            token: TokenId::MAX,
            candidates: width,
        });
    }

    // Step 4: Unframe
    let message = payload::unpack(value)?;
    info!(bytes = message.len(), "decoded");

    Ok(DecodedMessage { message, report })
}

/// Tokenizes the carrier up to the first symbol the model has no token for.
///
/// That symbol is returned alongside the tokens before it, so the replay can
/// report where the carrier left the model's vocabulary.
fn tokenize_carrier<M>(
    model: &M,
    carrier: &str,
) -> Result<(Vec<TokenId>, Option<char>), StegoError>
where
    M: LanguageModel + ?Sized,
{
    match model.tokenize(carrier) {
        Ok(tokens) => Ok((tokens, None)),
        Err(ModelError::UnknownSymbol(symbol)) => {
            let end = carrier.find(symbol).unwrap_or(carrier.len());
            let tokens = model.tokenize(&carrier[..end])?;
            Ok((tokens, Some(symbol)))
        }
        Err(e) => Err(e.into()),
    }
}
