//! Character n-gram model trained from a text corpus.
//!
//! Tokens are the distinct characters of the corpus, numbered in sorted
//! order, plus one end-of-sequence token after them. Probabilities use
//! interpolated Witten-Bell smoothing down to an add-one unigram, so every
//! vocabulary character keeps a small nonzero probability in any context.
//!
//! All tables are `BTreeMap`s and every sum runs in token order, so the
//! same corpus yields bit-identical distributions in every process.

use std::collections::{BTreeMap, BTreeSet};

use super::{Distribution, LanguageModel, ModelError, TokenId};

/// Default n-gram order (three characters of context).
pub const DEFAULT_ORDER: usize = 4;

/// Largest supported order.
pub const MAX_ORDER: usize = 12;

/// Counts of what follows one context.
#[derive(Debug, Clone, Default)]
struct Continuations {
    total: u64,
    next: BTreeMap<TokenId, u64>,
}

/// Character n-gram model.
#[derive(Debug, Clone)]
pub struct NgramModel {
    order: usize,
    symbols: Vec<char>,
    index: BTreeMap<char, TokenId>,
    unigram: Vec<u64>,
    total: u64,
    /// `levels[n - 1]` maps contexts of `n` characters to their continuations.
    levels: Vec<BTreeMap<Vec<TokenId>, Continuations>>,
}

impl NgramModel {
    /// Trains a model of the given `order` on `corpus`.
    ///
    /// An order of `n` conditions on the previous `n - 1` characters.
    pub fn train(corpus: &str, order: usize) -> Result<Self, ModelError> {
        if order == 0 || order > MAX_ORDER {
            return Err(ModelError::InvalidParameter(format!(
                "order must be between 1 and {}, got {}",
                MAX_ORDER, order
            )));
        }

        let symbols: Vec<char> = corpus.chars().collect::<BTreeSet<_>>().into_iter().collect();
        if symbols.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }

        let index: BTreeMap<char, TokenId> = symbols
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i as TokenId))
            .collect();

        // Every corpus character is in the index
        let ids: Vec<TokenId> = corpus.chars().map(|c| index[&c]).collect();

        let mut unigram = vec![0u64; symbols.len()];
        let mut levels: Vec<BTreeMap<Vec<TokenId>, Continuations>> =
            vec![BTreeMap::new(); order - 1];

        for (i, &token) in ids.iter().enumerate() {
            unigram[token as usize] += 1;

            for n in 1..order {
                if i < n {
                    break;
                }
                let entry = levels[n - 1].entry(ids[i - n..i].to_vec()).or_default();
                entry.total += 1;
                *entry.next.entry(token).or_insert(0) += 1;
            }
        }

        Ok(Self {
            order,
            symbols,
            index,
            unigram,
            total: ids.len() as u64,
            levels,
        })
    }

    /// The n-gram order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Vocabulary size, end-of-sequence token included.
    pub fn vocabulary_size(&self) -> usize {
        self.symbols.len() + 1
    }

    /// The end-of-sequence token.
    pub fn end_of_sequence(&self) -> TokenId {
        self.symbols.len() as TokenId
    }

    fn count(&self, token: usize) -> u64 {
        self.unigram.get(token).copied().unwrap_or(0)
    }
}

impl LanguageModel for NgramModel {
    fn next_distribution(&self, context: &[TokenId]) -> Result<Distribution, ModelError> {
        let vocabulary = self.vocabulary_size();

        let denom = (self.total + vocabulary as u64) as f64;
        let mut probs: Vec<f64> = (0..vocabulary)
            .map(|w| (self.count(w) + 1) as f64 / denom)
            .collect();

        // Interpolate from short to long contexts; an unseen context means
        // every longer one is unseen too.
        for n in 1..self.order {
            if context.len() < n {
                break;
            }
            let Some(seen) = self.levels[n - 1].get(&context[context.len() - n..]) else {
                break;
            };

            let distinct = seen.next.len() as f64;
            let norm = seen.total as f64 + distinct;
            for (w, p) in probs.iter_mut().enumerate() {
                let c = seen.next.get(&(w as TokenId)).copied().unwrap_or(0) as f64;
                *p = (c + distinct * *p) / norm;
            }
        }

        Distribution::from_weights(
            probs
                .into_iter()
                .enumerate()
                .map(|(w, p)| (w as TokenId, p)),
        )
    }

    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, ModelError> {
        text.chars()
            .map(|c| {
                self.index
                    .get(&c)
                    .copied()
                    .ok_or(ModelError::UnknownSymbol(c))
            })
            .collect()
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, ModelError> {
        tokens
            .iter()
            .map(|&t| {
                self.symbols
                    .get(t as usize)
                    .copied()
                    .ok_or(ModelError::UnknownToken(t))
            })
            .collect()
    }

    fn is_end_of_sequence(&self, token: TokenId) -> bool {
        token == self.end_of_sequence()
    }

    /// Characters missing from the corpus are skipped. The prompt only
    /// steers the warm-up and is never decoded.
    fn prompt_context(&self, prompt: &str) -> Result<Vec<TokenId>, ModelError> {
        let mut context = self.start_context();
        context.extend(prompt.chars().filter_map(|c| self.index.get(&c).copied()));
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = "yoga is union. yoga is breath. yoga is balance.";

    fn top_token(model: &NgramModel, text: &str) -> TokenId {
        let context = model.tokenize(text).unwrap();
        let dist = model.next_distribution(&context).unwrap();
        dist.iter()
            .max_by(|a, b| a.p.total_cmp(&b.p).then(b.token.cmp(&a.token)))
            .unwrap()
            .token
    }

    #[test]
    fn test_vocabulary() {
        let model = NgramModel::train("abca", 3).unwrap();
        assert_eq!(model.vocabulary_size(), 4);
        assert_eq!(model.end_of_sequence(), 3);
        assert_eq!(model.tokenize("cab").unwrap(), vec![2, 0, 1]);
        assert!(model.is_end_of_sequence(3));
        assert!(!model.is_end_of_sequence(2));
    }

    #[test]
    fn test_tokenize_roundtrip() {
        let model = NgramModel::train(CORPUS, DEFAULT_ORDER).unwrap();
        let tokens = model.tokenize("yoga is balance").unwrap();
        assert_eq!(model.detokenize(&tokens).unwrap(), "yoga is balance");
    }

    #[test]
    fn test_unknown_symbol() {
        let model = NgramModel::train(CORPUS, DEFAULT_ORDER).unwrap();
        assert!(matches!(
            model.tokenize("yoga!"),
            Err(ModelError::UnknownSymbol('!'))
        ));

        let eos = model.end_of_sequence();
        assert!(matches!(
            model.detokenize(&[eos]),
            Err(ModelError::UnknownToken(t)) if t == eos
        ));
    }

    #[test]
    fn test_distribution_covers_vocabulary() {
        let model = NgramModel::train(CORPUS, DEFAULT_ORDER).unwrap();
        let context = model.tokenize("yoga is ").unwrap();
        let dist = model.next_distribution(&context).unwrap();

        assert_eq!(dist.len(), model.vocabulary_size());
        let total: f64 = dist.iter().map(|t| t.p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_follows_corpus() {
        let model = NgramModel::train(CORPUS, DEFAULT_ORDER).unwrap();
        assert_eq!(top_token(&model, "yog"), model.tokenize("a").unwrap()[0]);
        assert_eq!(top_token(&model, "is"), model.tokenize(" ").unwrap()[0]);
    }

    #[test]
    fn test_unigram_order() {
        let model = NgramModel::train("aaab", 1).unwrap();
        let a = model.next_distribution(&[1]).unwrap();
        let b = model.next_distribution(&[]).unwrap();
        assert_eq!(a, b);
        assert!(a.probability(0) > a.probability(1));
    }

    #[test]
    fn test_distribution_is_deterministic() {
        let context: Vec<TokenId> = NgramModel::train(CORPUS, 5)
            .unwrap()
            .tokenize("yoga")
            .unwrap();

        let a = NgramModel::train(CORPUS, 5).unwrap();
        let b = NgramModel::train(CORPUS, 5).unwrap();
        assert_eq!(
            a.next_distribution(&context).unwrap(),
            b.next_distribution(&context).unwrap()
        );
    }

    #[test]
    fn test_prompt_skips_unknown_characters() {
        let model = NgramModel::train(CORPUS, DEFAULT_ORDER).unwrap();
        let context = model.prompt_context("Yoga?").unwrap();
        assert_eq!(context, model.tokenize("oga").unwrap());
    }

    #[test]
    fn test_invalid_training() {
        assert!(matches!(
            NgramModel::train("", 3),
            Err(ModelError::EmptyCorpus)
        ));
        assert!(matches!(
            NgramModel::train(CORPUS, 0),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
