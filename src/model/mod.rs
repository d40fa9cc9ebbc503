//! Language model adapters.
//!
//! The codec only needs one capability from a model: given a context, return
//! the probability distribution over the next token. Encode and decode
//! usually run in different processes, so that distribution MUST be a pure
//! function of the context. Adapters that sample internally, or that sum
//! floating-point values in a hash-dependent order, break decoding.
//!
//! Two adapters ship with the crate:
//! - [`ngram::NgramModel`]: a character n-gram model trained from a corpus
//! - [`synthetic::SyntheticModel`]: seeded pseudo-random distributions with
//!   a controllable shape, used for tests and demos

pub mod ngram;
pub mod synthetic;

pub use ngram::NgramModel;
pub use synthetic::{Shape, SyntheticModel};

use thiserror::Error;

/// Identifier of a token in a model's vocabulary.
pub type TokenId = u32;

/// Errors raised by model adapters.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Empty distribution: the model proposed no token with positive probability")]
    EmptyDistribution,

    #[error("Invalid probability {probability} for token {token}")]
    InvalidProbability { token: TokenId, probability: f64 },

    #[error("Character {0:?} is not in the model vocabulary")]
    UnknownSymbol(char),

    #[error("Token {0} is not in the model vocabulary")]
    UnknownToken(TokenId),

    #[error("Generated bytes are not valid UTF-8")]
    InvalidText,

    #[error("Empty training corpus")]
    EmptyCorpus,

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),
}

/// Probability of one token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenProb {
    pub token: TokenId,
    pub p: f64,
}

/// A normalized next-token distribution.
///
/// Entries are unique per token and kept in ascending token order, so every
/// traversal (and every floating-point sum over it) happens in the same
/// order on both sides of the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    probs: Vec<TokenProb>,
}

impl Distribution {
    /// Builds a distribution from `(token, weight)` pairs.
    ///
    /// Weights need not sum to one. Duplicate tokens have their weights
    /// added. Zero weights are dropped.
    pub fn from_weights(
        weights: impl IntoIterator<Item = (TokenId, f64)>,
    ) -> Result<Self, ModelError> {
        let mut probs: Vec<TokenProb> = Vec::new();
        for (token, p) in weights {
            if !p.is_finite() || p < 0.0 {
                return Err(ModelError::InvalidProbability {
                    token,
                    probability: p,
                });
            }
            if p > 0.0 {
                probs.push(TokenProb { token, p });
            }
        }

        probs.sort_by_key(|t| t.token);
        probs.dedup_by(|next, kept| {
            if next.token == kept.token {
                kept.p += next.p;
                true
            } else {
                false
            }
        });

        let total: f64 = probs.iter().map(|t| t.p).sum();
        if probs.is_empty() || !total.is_finite() || total <= 0.0 {
            return Err(ModelError::EmptyDistribution);
        }

        for t in &mut probs {
            t.p /= total;
        }

        Ok(Self { probs })
    }

    /// Builds a distribution from dense logits, where the token id is the
    /// index. `-inf` logits get zero probability.
    pub fn from_logits(logits: &[f32]) -> Result<Self, ModelError> {
        let max = logits
            .iter()
            .copied()
            .filter(|l| l.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            return Err(ModelError::EmptyDistribution);
        }

        Self::from_weights(logits.iter().enumerate().map(|(i, &logit)| {
            let weight = if logit.is_finite() {
                ((logit - max) as f64).exp()
            } else {
                0.0
            };
            (i as TokenId, weight)
        }))
    }

    /// Entries in ascending token order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenProb> {
        self.probs.iter()
    }

    /// Number of tokens with positive probability.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Always false for a constructed distribution.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Probability of `token`, zero when absent.
    pub fn probability(&self, token: TokenId) -> f64 {
        self.probs
            .binary_search_by_key(&token, |t| t.token)
            .map(|i| self.probs[i].p)
            .unwrap_or(0.0)
    }
}

/// A deterministic autoregressive language model.
///
/// # Determinism
///
/// `next_distribution` must return bit-identical results for identical
/// contexts, across calls and across processes. This is a precondition of
/// the codec, not something it can check.
pub trait LanguageModel {
    /// Distribution over the token that follows `context`.
    fn next_distribution(&self, context: &[TokenId]) -> Result<Distribution, ModelError>;

    /// Converts text into tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, ModelError>;

    /// Converts tokens back into text.
    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, ModelError>;

    /// Returns true for tokens that end generation.
    fn is_end_of_sequence(&self, token: TokenId) -> bool;

    /// Context every generation starts from, shared by encoder and decoder.
    fn start_context(&self) -> Vec<TokenId> {
        Vec::new()
    }

    /// Context used to steer the greedy warm-up towards `prompt`.
    fn prompt_context(&self, prompt: &str) -> Result<Vec<TokenId>, ModelError> {
        let mut context = self.start_context();
        context.extend(self.tokenize(prompt)?);
        Ok(context)
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn next_distribution(&self, context: &[TokenId]) -> Result<Distribution, ModelError> {
        (**self).next_distribution(context)
    }

    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, ModelError> {
        (**self).tokenize(text)
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, ModelError> {
        (**self).detokenize(tokens)
    }

    fn is_end_of_sequence(&self, token: TokenId) -> bool {
        (**self).is_end_of_sequence(token)
    }

    fn start_context(&self) -> Vec<TokenId> {
        (**self).start_context()
    }

    fn prompt_context(&self, prompt: &str) -> Result<Vec<TokenId>, ModelError> {
        (**self).prompt_context(prompt)
    }
}
