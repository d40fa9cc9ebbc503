//! Per-step vocabulary shared by the encoder and the decoder.

use std::fmt;

use crate::model::{LanguageModel, TokenId};
use crate::sampling::CandidateSet;

/// Role of one generation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStep {
    /// Warm-up token: the argmax of the prompted context, carries no bits.
    Greedy,
    /// Token chosen by a digit of the payload.
    EntropyBearing,
    /// Greedy continuation once the payload is exhausted.
    Filler,
}

impl fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStep::Greedy => "greedy",
            GenerationStep::EntropyBearing => "entropy",
            GenerationStep::Filler => "filler",
        };
        f.write_str(name)
    }
}

/// Candidates a digit can select: the candidate set without end-of-sequence
/// tokens, in rank order.
///
/// An end-of-sequence token never appears in the carrier text, so a digit
/// spent on one could not be read back.
pub fn coding_alphabet<M>(model: &M, candidates: &CandidateSet) -> Vec<TokenId>
where
    M: LanguageModel + ?Sized,
{
    candidates.filtered(|token| !model.is_end_of_sequence(token))
}

/// What happened at one step, reported to an [`EncoderConfig`] observer.
///
/// [`EncoderConfig`]: crate::encoder::EncoderConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Zero-based step index.
    pub index: usize,
    /// Role of the step.
    pub kind: GenerationStep,
    /// Chosen token.
    pub token: TokenId,
    /// Radix of the digit carried by the token (1 when it carries none).
    pub radix: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::model::{Distribution, ModelError};
    use crate::sampling::candidate_set;

    struct EndsOnZero;

    impl LanguageModel for EndsOnZero {
        fn next_distribution(&self, _context: &[TokenId]) -> Result<Distribution, ModelError> {
            Distribution::from_weights([(0, 5.0), (1, 3.0), (2, 2.0)])
        }

        fn tokenize(&self, _text: &str) -> Result<Vec<TokenId>, ModelError> {
            Ok(Vec::new())
        }

        fn detokenize(&self, _tokens: &[TokenId]) -> Result<String, ModelError> {
            Ok(String::new())
        }

        fn is_end_of_sequence(&self, token: TokenId) -> bool {
            token == 0
        }
    }

    #[test]
    fn test_alphabet_drops_end_of_sequence() {
        let model = EndsOnZero;
        let dist = model.next_distribution(&[]).unwrap();
        let set = candidate_set(&dist, &SamplingConfig::default()).unwrap();

        assert_eq!(set.top().token, 0);
        assert_eq!(coding_alphabet(&model, &set), vec![1, 2]);
    }

    #[test]
    fn test_display() {
        assert_eq!(GenerationStep::EntropyBearing.to_string(), "entropy");
        assert_eq!(GenerationStep::Greedy.to_string(), "greedy");
    }
}
