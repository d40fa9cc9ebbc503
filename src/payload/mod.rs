//! Payload handling: compression plus the integer view used for coding.
//!
//! `pack` turns a secret into a [`BitAccumulator`] ready for digit
//! extraction; `unpack` is its inverse. A failure anywhere in `unpack` is
//! reported as [`StegoError::CorruptPayload`], which is the only integrity
//! signal the codec has.

pub mod accumulator;
pub mod compression;

pub use accumulator::{AccumulatorError, BitAccumulator};
pub use compression::{compress, compression_ratio, decompress, CompressionError};

use crate::error::StegoError;

/// Compresses a secret and loads it into an accumulator.
pub fn pack(secret: &[u8]) -> Result<BitAccumulator, StegoError> {
    let compressed = compress(secret)?;
    Ok(BitAccumulator::from_payload(&compressed))
}

/// Recovers the secret from a fully reconstructed accumulator.
pub fn unpack(accumulator: BitAccumulator) -> Result<Vec<u8>, StegoError> {
    let compressed = accumulator
        .into_payload()
        .map_err(|e| StegoError::CorruptPayload(e.to_string()))?;

    decompress(&compressed).map_err(|e| StegoError::CorruptPayload(e.to_string()))
}

/// Number of bits the secret occupies once framed for encoding.
pub fn payload_bits(secret: &[u8]) -> Result<u64, StegoError> {
    Ok(pack(secret)?.remaining_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut acc: BitAccumulator, radix: usize) -> BitAccumulator {
        let mut out = BitAccumulator::new();
        while !acc.is_exhausted() {
            out.absorb_digit(acc.extract_digit(radix), radix);
        }
        out
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        let secret = b"This is a secret.";
        let restored = unpack(drain(pack(secret).unwrap(), 37)).unwrap();
        assert_eq!(restored, secret);
    }

    #[test]
    fn test_empty_secret() {
        assert_eq!(payload_bits(b"").unwrap(), 9);
        let restored = unpack(drain(pack(b"").unwrap(), 2)).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_payload_bits_matches_compressed_length() {
        let secret = b"namaste";
        let compressed = compress(secret).unwrap();
        assert_eq!(
            payload_bits(secret).unwrap(),
            compressed.len() as u64 * 8 + 1
        );
    }

    #[test]
    fn test_short_message_costs_less_than_raw() {
        let secret = b"This is a secret.";
        assert!(payload_bits(secret).unwrap() < 8 * secret.len() as u64);
    }

    #[test]
    fn test_unpack_rejects_non_canonical() {
        // Stored marker on bytes that deflate would shrink.
        let mut stored = vec![0u8];
        stored.extend_from_slice("aaaa".repeat(30).as_bytes());
        let acc = BitAccumulator::from_payload(&stored);
        assert!(matches!(unpack(acc), Err(StegoError::CorruptPayload(_))));
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        // Sentinel followed by an unknown marker byte.
        let acc = BitAccumulator::from_payload(&[7, 1, 2]);
        assert!(matches!(unpack(acc), Err(StegoError::CorruptPayload(_))));

        assert!(matches!(
            unpack(BitAccumulator::new()),
            Err(StegoError::CorruptPayload(_))
        ));
    }
}
