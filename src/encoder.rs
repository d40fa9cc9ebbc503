//! Carrier generation.
//!
//! This module orchestrates the encoding process:
//! 1. Compress and frame the secret into a big-integer accumulator
//! 2. Generate `skip_start` greedy tokens steered by the prompt
//! 3. Spend one mixed-radix digit of the accumulator per generated token
//! 4. Continue greedily once the accumulator is exhausted
//! 5. Check the carrier text re-tokenizes into the generated tokens
//!
//! The prompt only steers the warm-up. Digit-bearing steps are computed from
//! the generated tokens alone, so the decoder needs nothing but the carrier
//! text, the model and the sampling settings.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace, warn};

use crate::config::SamplingConfig;
use crate::error::StegoError;
use crate::model::{LanguageModel, TokenId};
use crate::payload;
use crate::sampling::{candidate_set, CandidateSet};
use crate::step::{coding_alphabet, GenerationStep, StepEvent};

/// Hooks for a running encode.
#[derive(Clone, Copy, Default)]
pub struct EncoderConfig<'a> {
    /// Checked before every step; when set the encode stops with
    /// [`StegoError::Cancelled`].
    pub cancel: Option<&'a AtomicBool>,

    /// Called after each emitted token.
    pub on_step: Option<&'a dyn Fn(&StepEvent)>,
}

/// Statistics of one encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeReport {
    /// Tokens in the carrier.
    pub steps: usize,
    /// Warm-up tokens.
    pub greedy_steps: usize,
    /// Tokens that carried a digit of radix 2 or more.
    pub entropy_steps: usize,
    /// Entropy-bearing tokens with a single candidate.
    pub zero_bit_steps: usize,
    /// Greedy tokens after the payload was exhausted.
    pub filler_steps: usize,
    /// Framed payload size in bits.
    pub payload_bits: u64,
    /// Information capacity spent on the payload, `sum(log2(radix))`.
    pub capacity_bits: f64,
    /// Generation ended on an end-of-sequence token.
    pub stopped_on_eos: bool,
}

/// Result of encoding a secret.
#[derive(Debug, Clone)]
pub struct EncodedCarrier {
    /// The carrier text, this is what gets transmitted.
    pub text: String,
    /// Tokens of the carrier text.
    pub tokens: Vec<TokenId>,
    /// Step statistics.
    pub report: EncodeReport,
}

/// Hides `secret` in text generated by `model` from `prompt`.
///
/// # Arguments
/// * `model` - The language model (both parties must use the same one)
/// * `prompt` - Steers the first `skip_start` tokens
/// * `secret` - The bytes to hide
/// * `sampling` - Sampling settings, shared with the decoder
///
/// # Returns
/// An `EncodedCarrier` containing the text to transmit.
pub fn encode<M>(
    model: &M,
    prompt: &str,
    secret: &[u8],
    sampling: &SamplingConfig,
) -> Result<EncodedCarrier, StegoError>
where
    M: LanguageModel + ?Sized,
{
    encode_with_config(model, prompt, secret, sampling, &EncoderConfig::default())
}

/// Encodes a secret with cancellation and progress hooks.
pub fn encode_with_config<M>(
    model: &M,
    prompt: &str,
    secret: &[u8],
    sampling: &SamplingConfig,
    config: &EncoderConfig<'_>,
) -> Result<EncodedCarrier, StegoError>
where
    M: LanguageModel + ?Sized,
{
    sampling.validate()?;

    // Step 1: Frame the payload
    let mut value = payload::pack(secret)?;
    let payload_bits = value.remaining_bits();

    info!(
        secret_bytes = secret.len(),
        payload_bits,
        budget = sampling.token_budget,
        skip_start = sampling.skip_start,
        "encoding"
    );

    let mut prompted = model.prompt_context(prompt)?;
    let mut carrier = model.start_context();
    let mut tokens: Vec<TokenId> = Vec::new();
    let mut report = EncodeReport {
        payload_bits,
        ..Default::default()
    };

    for index in 0..sampling.token_budget {
        check_cancelled(config.cancel, index)?;

        // Step 2: Warm-up, then one digit per token, then filler
        let (kind, token, radix) = if index < sampling.skip_start {
            let set = candidates(model, &prompted, sampling)?;
            (GenerationStep::Greedy, set.top().token, 1)
        } else {
            let set = candidates(model, &carrier, sampling)?;
            trace!(step = index, candidates = set.len(), "candidate set");

            if value.is_exhausted() {
                (GenerationStep::Filler, set.top().token, 1)
            } else {
                let alphabet = coding_alphabet(model, &set);
                match alphabet.len() {
                    0 => {
                        debug!(step = index, "only end-of-sequence left");
                        report.stopped_on_eos = true;
                        break;
                    }
                    1 => (GenerationStep::EntropyBearing, alphabet[0], 1),
                    radix => {
                        let digit = value.extract_digit(radix);
                        debug!(step = index, digit, radix, "digit");
                        (GenerationStep::EntropyBearing, alphabet[digit], radix)
                    }
                }
            }
        };

        if model.is_end_of_sequence(token) {
            debug!(step = index, %kind, "end of sequence");
            report.stopped_on_eos = true;
            break;
        }

        match kind {
            GenerationStep::Greedy => report.greedy_steps += 1,
            GenerationStep::Filler => report.filler_steps += 1,
            GenerationStep::EntropyBearing if radix > 1 => {
                report.entropy_steps += 1;
                report.capacity_bits += (radix as f64).log2();
            }
            GenerationStep::EntropyBearing => report.zero_bit_steps += 1,
        }

        tokens.push(token);
        prompted.push(token);
        carrier.push(token);
        report.steps += 1;

        if let Some(on_step) = config.on_step {
            on_step(&StepEvent {
                index,
                kind,
                token,
                radix,
            });
        }
    }

    // Step 3: Every payload bit must have been spent
    if !value.is_exhausted() {
        let remaining_bits = value.remaining_bits();
        warn!(
            remaining_bits,
            payload_bits,
            steps = report.steps,
            "capacity exceeded"
        );
        return Err(StegoError::CapacityExceeded {
            remaining_bits,
            payload_bits,
            steps: report.steps,
        });
    }

    // Step 4: The decoder sees text, not tokens
    let text = model.detokenize(&tokens)?;
    let retokenized = model.tokenize(&text)?;
    if retokenized != tokens {
        let position = tokens
            .iter()
            .zip(&retokenized)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| tokens.len().min(retokenized.len()));
        warn!(position, "carrier does not re-tokenize");
        return Err(StegoError::Retokenization { position });
    }

    info!(
        steps = report.steps,
        entropy_steps = report.entropy_steps,
        capacity_bits = report.capacity_bits,
        "encoded"
    );

    Ok(EncodedCarrier {
        text,
        tokens,
        report,
    })
}

/// Greedy continuation of `prompt`, without any payload.
///
/// Stops after `count` tokens or at an end-of-sequence token. An encode with
/// the same prompt and settings starts with these tokens for its first
/// `skip_start` steps.
pub fn generate_greedy<M>(
    model: &M,
    prompt: &str,
    sampling: &SamplingConfig,
    count: usize,
) -> Result<Vec<TokenId>, StegoError>
where
    M: LanguageModel + ?Sized,
{
    let mut context = model.prompt_context(prompt)?;
    let mut tokens = Vec::with_capacity(count);

    for _ in 0..count {
        let token = candidates(model, &context, sampling)?.top().token;
        if model.is_end_of_sequence(token) {
            break;
        }
        tokens.push(token);
        context.push(token);
    }

    Ok(tokens)
}

pub(crate) fn candidates<M>(
    model: &M,
    context: &[TokenId],
    sampling: &SamplingConfig,
) -> Result<CandidateSet, StegoError>
where
    M: LanguageModel + ?Sized,
{
    let distribution = model.next_distribution(context)?;
    candidate_set(&distribution, sampling)
}

pub(crate) fn check_cancelled(cancel: Option<&AtomicBool>, step: usize) -> Result<(), StegoError> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(StegoError::Cancelled { step }),
        _ => Ok(()),
    }
}
