//! Distribution filter: temperature, top-k, min-p.
//!
//! Turns a raw next-token distribution into the ordered candidate set that
//! serves as the alphabet of one mixed-radix digit. Every step here is
//! deterministic; encoder and decoder run it on identical inputs and must
//! reach bit-identical candidate sets.

use crate::config::SamplingConfig;
use crate::error::StegoError;
use crate::model::{Distribution, ModelError, TokenProb};
use crate::sampling::candidates::{candidate_order, CandidateSet};

/// Filters `distribution` with `config`, in fixed order:
///
/// 1. temperature, `p^(1/temperature)` renormalized
/// 2. top-k (0 keeps everything)
/// 3. min-p against the best survivor, boundary inclusive
/// 4. descending probability, ties by ascending token id
///
/// Tokens whose tempered probability is zero are never candidates.
pub fn candidate_set(
    distribution: &Distribution,
    config: &SamplingConfig,
) -> Result<CandidateSet, StegoError> {
    config.validate()?;

    let mut ranked: Vec<TokenProb> = apply_temperature(distribution, config.temperature)
        .into_iter()
        .filter(|t| t.p > 0.0)
        .collect();
    if ranked.is_empty() {
        return Err(ModelError::EmptyDistribution.into());
    }

    ranked.sort_by(candidate_order);
    apply_top_k(&mut ranked, config.top_k);
    apply_min_p(&mut ranked, config.min_p);

    Ok(CandidateSet::from_sorted(ranked))
}

/// Raises each probability to `1/temperature` and renormalizes.
///
/// Computed relative to the most likely token in log space, so a very low
/// temperature sharpens towards the argmax instead of underflowing every
/// probability to zero.
fn apply_temperature(distribution: &Distribution, temperature: f64) -> Vec<TokenProb> {
    if temperature == 1.0 {
        return distribution.iter().copied().collect();
    }

    let max_ln = distribution
        .iter()
        .map(|t| t.p.ln())
        .fold(f64::NEG_INFINITY, f64::max);

    let mut tempered: Vec<TokenProb> = distribution
        .iter()
        .map(|t| TokenProb {
            token: t.token,
            p: ((t.p.ln() - max_ln) / temperature).exp(),
        })
        .collect();

    // Ascending token order, same as the distribution.
    let total: f64 = tempered.iter().map(|t| t.p).sum();
    for t in &mut tempered {
        t.p /= total;
    }

    tempered
}

fn apply_top_k(ranked: &mut Vec<TokenProb>, top_k: usize) {
    if top_k > 0 {
        ranked.truncate(top_k);
    }
}

fn apply_min_p(ranked: &mut Vec<TokenProb>, min_p: f64) {
    let threshold = min_p * ranked[0].p;
    let keep = ranked.iter().take_while(|t| t.p >= threshold).count();
    ranked.truncate(keep.max(1));
}
