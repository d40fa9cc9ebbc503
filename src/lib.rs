//! # Tokenhide - Hide bytes in generated text
//!
//! Tokenhide hides a secret in the token choices of a language model. The
//! carrier is ordinary generated text; only someone holding the same model
//! and sampling settings can read the secret back.
//!
//! ## Overview
//!
//! - The secret is **compressed** (dictionary-primed DEFLATE when it helps)
//!   and framed with a sentinel bit into one big integer
//! - Generation starts with `skip_start` **greedy** tokens steered by a prompt
//! - Every later token is a **mixed-radix digit**: its rank among the
//!   candidates that survive temperature, top-k and min-p filtering
//! - Once the integer is spent, generation continues greedily up to the
//!   token budget
//! - The decoder replays the model over the carrier and reads the ranks back
//!
//! ## Requirements
//!
//! - **Deterministic model**: identical contexts must give bit-identical
//!   distributions, on both sides of the channel
//! - **Shared settings**: temperature, top-k, min-p and `skip_start` must match
//! - **Exact carrier**: the text must reach the decoder byte for byte
//!
//! Nothing is encrypted. Encrypt the secret first if it must stay private.
//!
//! ## Example Usage
//!
//! ```rust
//! use tokenhide::model::SyntheticModel;
//! use tokenhide::{decode, encode, SamplingConfig};
//!
//! // Both parties use the same model and settings
//! let model = SyntheticModel::new(42);
//! let sampling = SamplingConfig::default();
//!
//! let encoded = encode(&model, "What is yoga?", b"This is a secret.", &sampling).unwrap();
//!
//! // Only encoded.text is transmitted
//! println!("Transmit this: {}", encoded.text);
//!
//! let decoded = decode(&model, &encoded.text, &sampling).unwrap();
//! assert_eq!(decoded.message, b"This is a secret.");
//! ```
//!
//! ## Modules
//!
//! - [`model`]: The language model trait and the bundled adapters
//! - [`sampling`]: Distribution filter and candidate sets
//! - [`payload`]: Compression and the big-integer digit accumulator
//! - [`encoder`]: Carrier generation
//! - [`decoder`]: Secret recovery
//! - [`config`]: Sampling settings and profiles

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod model;
pub mod payload;
pub mod sampling;
pub mod step;

// Re-export commonly used types at the crate root
pub use config::{ProfileError, SamplingConfig};
pub use decoder::{decode, decode_with_config, DecodeReport, DecodedMessage, DecoderConfig};
pub use encoder::{
    encode, encode_with_config, generate_greedy, EncodeReport, EncodedCarrier, EncoderConfig,
};
pub use error::StegoError;
pub use model::{Distribution, LanguageModel, ModelError, TokenId};
pub use sampling::{candidate_set, CandidateSet};
pub use step::{GenerationStep, StepEvent};
