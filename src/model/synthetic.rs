//! Deterministic synthetic language model.
//!
//! Each context is hashed into a ChaCha20 seed; the seed shuffles the
//! printable ASCII symbols and a [`Shape`] assigns weights by shuffled rank.
//! The result looks like gibberish but behaves like a model: every context
//! has its own reproducible distribution, with an entropy the caller
//! controls. Useful for tests, demos and capacity experiments.

use hkdf::Hkdf;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use super::{Distribution, LanguageModel, ModelError, TokenId};

/// HKDF salt for per-context seeds.
const SALT_CONTEXT: &[u8] = b"TOKENHIDE-SYNTHETIC-V1";

/// Token ids are byte values; this one ends generation.
pub const END_OF_SEQUENCE: TokenId = 256;

/// Printable ASCII, the only bytes the model ever proposes.
const SYMBOLS: std::ops::RangeInclusive<u8> = b' '..=b'~';

/// How probability mass is spread over the shuffled symbols.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Weight `1 / (rank + 1)^exponent`, a natural-language-like tail.
    Zipf { exponent: f64 },
    /// The first `width` symbols are equally likely, the rest impossible.
    Uniform { width: usize },
    /// One dominant symbol, the rest at a thousandth of its weight.
    Peaked,
}

impl Shape {
    fn weight(&self, rank: usize) -> f64 {
        match *self {
            Shape::Zipf { exponent } => ((rank + 1) as f64).powf(-exponent),
            Shape::Uniform { width } => {
                if rank < width.max(1) {
                    1.0
                } else {
                    0.0
                }
            }
            Shape::Peaked => {
                if rank == 0 {
                    1.0
                } else {
                    1e-3
                }
            }
        }
    }
}

/// Seeded model over printable ASCII bytes.
#[derive(Debug, Clone)]
pub struct SyntheticModel {
    seed: u64,
    shape: Shape,
    end_weight: f64,
}

impl SyntheticModel {
    /// Creates a Zipf-shaped model (exponent 1) that never ends on its own.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            shape: Shape::Zipf { exponent: 1.0 },
            end_weight: 0.0,
        }
    }

    /// Replaces the weight shape.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Gives the end-of-sequence token `weight`, relative to a top symbol
    /// weight of 1.
    pub fn with_end_of_sequence(mut self, weight: f64) -> Self {
        self.end_weight = weight;
        self
    }

    /// Symbols in the order the shape ranks them for `context`.
    fn ranked_symbols(&self, context: &[TokenId]) -> Result<Vec<u8>, ModelError> {
        let mut ikm = Vec::with_capacity(8 + context.len() * 4);
        ikm.extend_from_slice(&self.seed.to_le_bytes());
        for token in context {
            ikm.extend_from_slice(&token.to_le_bytes());
        }

        let hk = Hkdf::<Sha256>::new(Some(SALT_CONTEXT), &ikm);
        let mut seed = [0u8; 32];
        hk.expand(b"next-token", &mut seed)
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;

        let mut rng = ChaCha20Rng::from_seed(seed);
        let mut symbols: Vec<u8> = SYMBOLS.collect();
        symbols.shuffle(&mut rng);
        Ok(symbols)
    }
}

impl LanguageModel for SyntheticModel {
    fn next_distribution(&self, context: &[TokenId]) -> Result<Distribution, ModelError> {
        if !self.end_weight.is_finite() || self.end_weight < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "end-of-sequence weight {}",
                self.end_weight
            )));
        }

        let symbols = self.ranked_symbols(context)?;
        let weights = symbols
            .into_iter()
            .enumerate()
            .map(|(rank, byte)| (TokenId::from(byte), self.shape.weight(rank)))
            .chain(std::iter::once((END_OF_SEQUENCE, self.end_weight)));

        Distribution::from_weights(weights)
    }

    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, ModelError> {
        Ok(text.bytes().map(TokenId::from).collect())
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, ModelError> {
        let bytes = tokens
            .iter()
            .map(|&t| u8::try_from(t).map_err(|_| ModelError::UnknownToken(t)))
            .collect::<Result<Vec<u8>, _>>()?;

        String::from_utf8(bytes).map_err(|_| ModelError::InvalidText)
    }

    fn is_end_of_sequence(&self, token: TokenId) -> bool {
        token == END_OF_SEQUENCE
    }
}
