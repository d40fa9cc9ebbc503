//! Ordered candidate sets.

use std::cmp::Ordering;

use crate::model::{TokenId, TokenProb};

/// Total order used for candidates: higher probability first, then lower
/// token id. Both sides of the channel must break float ties the same way.
pub fn candidate_order(a: &TokenProb, b: &TokenProb) -> Ordering {
    b.p.total_cmp(&a.p).then_with(|| a.token.cmp(&b.token))
}

/// Tokens that survived filtering at one step, best first.
///
/// The rank of a token in this set is the digit it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<TokenProb>,
}

impl CandidateSet {
    /// Wraps candidates that are already filtered and ordered.
    pub(crate) fn from_sorted(candidates: Vec<TokenProb>) -> Self {
        debug_assert!(!candidates.is_empty());
        debug_assert!(candidates
            .windows(2)
            .all(|w| candidate_order(&w[0], &w[1]) == Ordering::Less));
        Self { candidates }
    }

    /// The most likely candidate.
    pub fn top(&self) -> &TokenProb {
        &self.candidates[0]
    }

    /// Number of candidates. Never zero.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false; a filtered set keeps at least the best token.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenProb> {
        self.candidates.iter()
    }

    /// Candidate at `rank`.
    pub fn get(&self, rank: usize) -> Option<&TokenProb> {
        self.candidates.get(rank)
    }

    /// Rank of `token`, if it survived filtering.
    pub fn rank_of(&self, token: TokenId) -> Option<usize> {
        self.candidates.iter().position(|c| c.token == token)
    }

    /// Total tempered probability mass kept by the filter.
    pub fn mass(&self) -> f64 {
        self.candidates.iter().map(|c| c.p).sum()
    }

    /// Candidates that `keep` accepts, in rank order.
    pub fn filtered(&self, mut keep: impl FnMut(TokenId) -> bool) -> Vec<TokenId> {
        self.candidates
            .iter()
            .map(|c| c.token)
            .filter(|&t| keep(t))
            .collect()
    }
}
