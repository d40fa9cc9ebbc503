//! Arbitrary-precision view of the payload for mixed-radix coding.
//!
//! The payload bytes are read as one big-endian integer with a sentinel `1`
//! bit on top:
//!
//! ```text
//! V = 2^(8n) + be_int(payload)        n = payload length in bytes
//! ```
//!
//! The sentinel keeps leading zero bytes and makes the length recoverable
//! from `bits(V)`. Encoding peels digits off the least significant end
//! (`d = V mod R`, `V = V div R`) in step order. Decoding rebuilds the value
//! in the same step order with a running place value (`V += d * place`,
//! `place *= R`), which is the same integer as applying `V = V * R + d` from
//! the last step back to the first.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use thiserror::Error;

/// Errors converting a reconstructed value back into payload bytes.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccumulatorError {
    #[error("No payload sentinel: the reconstructed value is zero")]
    MissingSentinel,

    #[error("Payload is {0} bits long, not a whole number of bytes")]
    Misaligned(u64),
}

/// Mixed-radix accumulator over the framed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitAccumulator {
    value: BigUint,
    place: BigUint,
}

impl BitAccumulator {
    /// Creates an empty accumulator for decoding.
    pub fn new() -> Self {
        Self {
            value: BigUint::zero(),
            place: BigUint::one(),
        }
    }

    /// Loads payload bytes for encoding.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut framed = Vec::with_capacity(payload.len() + 1);
        framed.push(1u8);
        framed.extend_from_slice(payload);

        Self {
            value: BigUint::from_bytes_be(&framed),
            place: BigUint::one(),
        }
    }

    /// Returns true once every payload bit has been turned into digits.
    pub fn is_exhausted(&self) -> bool {
        self.value.is_zero()
    }

    /// Number of significant bits still held.
    pub fn remaining_bits(&self) -> u64 {
        self.value.bits()
    }

    /// Removes the least significant digit in base `radix` and returns it.
    ///
    /// A radix below 2 carries no information: nothing is removed and the
    /// digit is 0.
    pub fn extract_digit(&mut self, radix: usize) -> usize {
        if radix < 2 {
            return 0;
        }

        let radix = BigUint::from(radix);
        let digit = &self.value % &radix;
        self.value /= &radix;

        // digit < radix, which came from a usize
        digit.to_usize().unwrap_or_default()
    }

    /// Appends the next digit in base `radix`, the inverse of
    /// [`extract_digit`](Self::extract_digit) taken in the same step order.
    pub fn absorb_digit(&mut self, digit: usize, radix: usize) {
        if radix < 2 {
            return;
        }
        debug_assert!(digit < radix, "digit {digit} out of range for radix {radix}");

        if digit != 0 {
            self.value += &self.place * BigUint::from(digit);
        }
        self.place *= BigUint::from(radix);
    }

    /// Converts the value back into the payload bytes.
    pub fn into_payload(self) -> Result<Vec<u8>, AccumulatorError> {
        let bits = self.value.bits();
        if bits == 0 {
            return Err(AccumulatorError::MissingSentinel);
        }

        let data_bits = bits - 1;
        if data_bits % 8 != 0 {
            return Err(AccumulatorError::Misaligned(data_bits));
        }

        let len = (data_bits / 8) as usize;
        let mut bytes = self.value.to_bytes_be();
        // Drop the sentinel byte; what is left is exactly `len` bytes.
        bytes.remove(0);
        debug_assert_eq!(bytes.len(), len);

        Ok(bytes)
    }
}

impl Default for BitAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
