//! Deterministic candidate selection.
//!
//! This module provides:
//! - The distribution filter (temperature, top-k, min-p)
//! - Candidate sets with a total order shared by encoder and decoder

pub mod candidates;
pub mod filter;

pub use candidates::{candidate_order, CandidateSet};
pub use filter::candidate_set;
