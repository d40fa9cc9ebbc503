//! Integration tests for Tokenhide
//!
//! Decode fails loudly: a carrier read with the wrong model or settings
//! surfaces as an error (or, rarely, a different message), never the
//! original secret.
//!
//! Covered:
//! - Round trips with the synthetic and the n-gram model
//! - Capacity limits and the exact budget boundary
//! - Greedy warm-up and determinism
//! - Sensitivity to every shared sampling value

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use tokenhide::model::{NgramModel, Shape, SyntheticModel};
use tokenhide::payload::compress;
use tokenhide::{decode, encode, generate_greedy, SamplingConfig, StegoError};

const PROMPT: &str = "What is yoga?";
const SECRET: &[u8] = b"This is a secret.";
const CORPUS: &str = include_str!("data/yoga.txt");

fn yoga_config() -> SamplingConfig {
    SamplingConfig::new(1024, 8, 0.02, 0, 1.0)
}

fn binary_model() -> SyntheticModel {
    SyntheticModel::new(99).with_shape(Shape::Uniform { width: 2 })
}

/// Returns true only when decoding silently produced `secret`.
fn silently_recovered(result: Result<tokenhide::DecodedMessage, StegoError>, secret: &[u8]) -> bool {
    matches!(result, Ok(decoded) if decoded.message == secret)
}

/// Test the reference scenario round trip
#[test]
fn test_yoga_roundtrip() {
    let model = SyntheticModel::new(2024);
    let config = yoga_config();

    let encoded = encode(&model, PROMPT, SECRET, &config).unwrap();
    assert_eq!(encoded.tokens.len(), 1024);
    assert_eq!(encoded.report.greedy_steps, 8);
    assert!(encoded.report.filler_steps > 0);
    assert!(encoded.report.payload_bits < 8 * SECRET.len() as u64);

    let decoded = decode(&model, &encoded.text, &config).unwrap();
    assert_eq!(decoded.message, SECRET);
    assert_eq!(decoded.text_lossy(), "This is a secret.");
}

/// Test that a different temperature never yields the secret
#[test]
fn test_yoga_wrong_temperature() {
    let model = SyntheticModel::new(2024);
    let encoded = encode(&model, PROMPT, SECRET, &yoga_config()).unwrap();

    let altered = SamplingConfig {
        temperature: 1.1,
        ..yoga_config()
    };
    assert!(!silently_recovered(decode(&model, &encoded.text, &altered), SECRET));
}

/// Test that the empty secret round-trips
#[test]
fn test_empty_secret() {
    let model = SyntheticModel::new(1);
    let config = yoga_config();

    let encoded = encode(&model, PROMPT, b"", &config).unwrap();
    assert_eq!(encoded.report.payload_bits, 9);

    let decoded = decode(&model, &encoded.text, &config).unwrap();
    assert!(decoded.message.is_empty());
}

/// Test binary secrets, including invalid UTF-8
#[test]
fn test_binary_secret() {
    let model = SyntheticModel::new(5);
    let secret: Vec<u8> = (0..=255u8).rev().collect();
    let config = SamplingConfig {
        token_budget: 600,
        ..yoga_config()
    };

    let encoded = encode(&model, PROMPT, &secret, &config).unwrap();
    let decoded = decode(&model, &encoded.text, &config).unwrap();
    assert_eq!(decoded.message, secret);
}

/// Test the exact budget boundary with one bit per token
#[test]
fn test_capacity_boundary() {
    let model = binary_model();
    let skip = 3;
    let needed = skip + 8 * compress(SECRET).unwrap().len() + 1;

    let exact = SamplingConfig::new(needed, skip, 0.02, 0, 1.0);
    let encoded = encode(&model, PROMPT, SECRET, &exact).unwrap();
    assert_eq!(encoded.report.filler_steps, 0);
    assert_eq!(decode(&model, &encoded.text, &exact).unwrap().message, SECRET);

    let short = SamplingConfig::new(needed - 1, skip, 0.02, 0, 1.0);
    match encode(&model, PROMPT, SECRET, &short) {
        Err(StegoError::CapacityExceeded {
            remaining_bits,
            payload_bits,
            steps,
        }) => {
            assert_eq!(remaining_bits, 1);
            assert_eq!(payload_bits as usize, needed - skip);
            assert_eq!(steps, needed - 1);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other.map(|e| e.text)),
    }
}

/// Test that a low-entropy model cannot carry any payload
#[test]
fn test_low_entropy_model() {
    let model = SyntheticModel::new(8).with_shape(Shape::Peaked);

    for secret in [&b""[..], &b"a"[..], SECRET] {
        assert!(matches!(
            encode(&model, PROMPT, secret, &yoga_config()),
            Err(StegoError::CapacityExceeded { .. })
        ));
    }
}

/// Test that identical inputs give identical carriers
#[test]
fn test_determinism() {
    let config = yoga_config();
    let a = encode(&SyntheticModel::new(3), PROMPT, SECRET, &config).unwrap();
    let b = encode(&SyntheticModel::new(3), PROMPT, SECRET, &config).unwrap();

    assert_eq!(a.text, b.text);
    assert_eq!(a.tokens, b.tokens);
    assert_eq!(a.report, b.report);
}

/// Test that the warm-up equals plain greedy generation
#[test]
fn test_greedy_prefix() {
    let model = SyntheticModel::new(17);
    let config = yoga_config();

    let encoded = encode(&model, PROMPT, SECRET, &config).unwrap();
    let greedy = generate_greedy(&model, PROMPT, &config, config.skip_start).unwrap();

    assert_eq!(greedy.len(), 8);
    assert_eq!(&encoded.tokens[..8], greedy.as_slice());
}

/// Test that the secret only changes tokens after the warm-up
#[test]
fn test_secret_does_not_touch_warm_up() {
    let model = SyntheticModel::new(17);
    let config = yoga_config();

    let a = encode(&model, PROMPT, b"first", &config).unwrap();
    let b = encode(&model, PROMPT, b"second", &config).unwrap();

    assert_eq!(a.tokens[..8], b.tokens[..8]);
    assert_ne!(a.tokens[8..], b.tokens[8..]);
}

/// Test the n-gram model end to end
#[test]
fn test_ngram_roundtrip() {
    let model = NgramModel::train(CORPUS, 3).unwrap();
    let config = SamplingConfig::new(4000, 8, 0.02, 0, 1.0);

    let encoded = encode(&model, PROMPT, b"om", &config).unwrap();
    assert!(encoded.report.entropy_steps > 0);

    let decoded = decode(&model, &encoded.text, &config).unwrap();
    assert_eq!(decoded.message, b"om");
}

/// Test that a carrier from one model does not decode with another
#[test]
fn test_wrong_model() {
    let config = yoga_config();
    let encoded = encode(&SyntheticModel::new(1), PROMPT, SECRET, &config).unwrap();

    let result = decode(&SyntheticModel::new(2), &encoded.text, &config);
    assert!(!silently_recovered(result, SECRET));
}

/// Test that a truncated carrier is rejected
#[test]
fn test_truncated_carrier() {
    let model = binary_model();
    let needed = 8 + 8 * compress(SECRET).unwrap().len() + 1;
    let config = SamplingConfig {
        token_budget: needed,
        ..yoga_config()
    };
    let encoded = encode(&model, PROMPT, SECRET, &config).unwrap();

    // The last token carries the sentinel bit
    let truncated = &encoded.text[..encoded.text.len() - 1];
    assert!(!silently_recovered(decode(&model, truncated, &config), SECRET));
}

/// Test that each altered sampling value breaks decoding
#[test]
fn test_sensitivity_to_sampling_values() {
    let model = SyntheticModel::new(77);
    let base = SamplingConfig {
        token_budget: 200,
        ..yoga_config()
    };
    let alterations = [
        SamplingConfig { top_k: 10, ..base },
        SamplingConfig { min_p: 0.05, ..base },
        SamplingConfig { temperature: 1.1, ..base },
        SamplingConfig { skip_start: base.skip_start + 1, ..base },
        SamplingConfig { skip_start: base.skip_start - 1, ..base },
    ];

    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    for _ in 0..25 {
        let len = rng.gen_range(1..24);
        let secret: Vec<u8> = (0..len).map(|_| rng.gen()).collect();

        let encoded = encode(&model, PROMPT, &secret, &base).unwrap();
        assert_eq!(decode(&model, &encoded.text, &base).unwrap().message, secret);

        for altered in &alterations {
            let result = decode(&model, &encoded.text, altered);
            assert!(
                !silently_recovered(result, &secret),
                "secret recovered with {:?}",
                altered
            );
        }
    }
}
