//! Message compression for tokenhide.
//!
//! Uses DEFLATE compression to shrink the secret before it is spread over
//! token choices, so shorter generations can carry it. Both sides prime the
//! stream with the same preset dictionary of common English, which lets a
//! one-line message compress at all.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use thiserror::Error;

/// Marker for a payload stored as-is.
const MARKER_STORED: u8 = 0;

/// Marker for a DEFLATE-compressed payload.
const MARKER_DEFLATE: u8 = 1;

/// Preset dictionary shared by `compress` and `decompress`.
///
/// DEFLATE reaches back at most 32 KiB and shorter distances cost fewer
/// bits, so the most frequent fragments sit at the end. Changing a single
/// byte makes every existing carrier undecodable.
const DICTIONARY: &[u8] = b"\
0123456789 January February March April May June July August September \
October November December Monday Tuesday Wednesday Thursday Friday Saturday \
Sunday morning afternoon evening tonight tomorrow yesterday today o'clock \
hours minutes week month year north south east west left right street road \
station airport hotel office house home door room car train bus ticket \
money bank account number phone email address name password code key \
first second third last next before after between under over through \
around about again always never often still already only also just very \
really please thank you thanks sorry hello hi yes no okay maybe \
could would should might must will shall can cannot don't won't isn't \
I'm you're we're they're it's that's there's what's let's \
who what where when why how which whose whom \
send call bring take give keep find tell ask know think want need \
come go get make see look leave stay wait stop start meet \
the message is ready. The meeting is at noon. Meet me at the \
Do not tell anyone. Keep this a secret. This is a test. \
There is a secret. Here is the plan. We will meet at the usual place. \
I have the information. They are coming. It is time. \
with from into that this have will your they them their there \
what been were when which would about because people \
and the of to in is it for on as at by be or an a ";

/// Compression errors.
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Compresses data using DEFLATE algorithm.
///
/// The first byte is a marker: 0 = stored, 1 = deflated. The stored form is
/// used unless DEFLATE output is strictly smaller.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if data.is_empty() {
        return Ok(vec![MARKER_STORED]);
    }

    let compressed = deflate(data)?;

    let (marker, body) = if compressed.len() < data.len() {
        (MARKER_DEFLATE, compressed.as_slice())
    } else {
        (MARKER_STORED, data)
    };

    let mut result = Vec::with_capacity(body.len() + 1);
    result.push(marker);
    result.extend_from_slice(body);
    Ok(result)
}

/// Decompresses data that was compressed with `compress()`.
///
/// Only the exact bytes `compress()` produces for some input are accepted:
/// a stored body that would have deflated, or a stream with trailing bytes,
/// is rejected rather than turned into a best-effort message.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let Some((&marker, payload)) = data.split_first() else {
        return Err(CompressionError::DecompressionFailed(
            "Empty data".to_string(),
        ));
    };

    let decompressed = match marker {
        MARKER_STORED => payload.to_vec(),
        MARKER_DEFLATE => {
            if payload.is_empty() {
                return Err(CompressionError::DecompressionFailed(
                    "Empty deflate stream".to_string(),
                ));
            }
            inflate(payload)?
        }
        other => {
            return Err(CompressionError::DecompressionFailed(format!(
                "Invalid marker byte: {}",
                other
            )))
        }
    };

    if compress(&decompressed)? != data {
        return Err(CompressionError::DecompressionFailed(
            "Non-canonical payload".to_string(),
        ));
    }

    Ok(decompressed)
}

/// Raw DEFLATE at the best level, primed with `DICTIONARY`.
fn deflate(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = Compress::new(Compression::best(), false);
    encoder
        .set_dictionary(DICTIONARY)
        .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(data.len() + 64);
    loop {
        let consumed = encoder.total_in() as usize;
        let status = encoder
            .compress_vec(&data[consumed..], &mut out, FlushCompress::Finish)
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;

        if status == Status::StreamEnd {
            return Ok(out);
        }
        out.reserve(out.capacity().max(64));
    }
}

/// Inverse of `deflate`. Fails on a stream that ends early.
fn inflate(payload: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = Decompress::new(false);
    decoder
        .set_dictionary(DICTIONARY)
        .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(payload.len() * 4);
    loop {
        let consumed = decoder.total_in() as usize;
        let produced = decoder.total_out();
        let status = decoder
            .decompress_vec(&payload[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

        if status == Status::StreamEnd {
            return Ok(out);
        }

        let stalled = decoder.total_in() as usize == consumed && decoder.total_out() == produced;
        if stalled && out.len() < out.capacity() {
            return Err(CompressionError::DecompressionFailed(
                "Truncated deflate stream".to_string(),
            ));
        }
        out.reserve(out.capacity().max(64));
    }
}

/// Returns compression ratio (compressed_size / original_size).
/// Values < 1.0 mean compression helped.
pub fn compression_ratio(original: &[u8], compressed: &[u8]) -> f64 {
    if original.is_empty() {
        return 1.0;
    }
    compressed.len() as f64 / original.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress_roundtrip() {
        let data = b"Yoga is a physical, mental, and spiritual practice. \
                     Yoga is a physical, mental, and spiritual practice. \
                     Yoga is a physical, mental, and spiritual practice.";

        let compressed = compress(data).unwrap();
        let decompressed = decompress(&compressed).unwrap();

        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_short_secret_is_stored() {
        // Too short for DEFLATE to win
        let data = b"Hi";
        let compressed = compress(data).unwrap();

        assert_eq!(compressed, vec![MARKER_STORED, b'H', b'i']);
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_compress_empty() {
        let compressed = compress(b"").unwrap();
        assert_eq!(compressed, vec![MARKER_STORED]);

        let decompressed = decompress(&compressed).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn test_compression_actually_compresses() {
        let data = "breathe in, breathe out. ".repeat(20).into_bytes();

        let compressed = compress(&data).unwrap();

        assert_eq!(compressed[0], MARKER_DEFLATE);
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn test_short_message_shrinks() {
        let data = b"This is a secret.";
        let compressed = compress(data).unwrap();

        assert_eq!(compressed[0], MARKER_DEFLATE);
        assert!(compressed.len() < data.len());
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_dictionary_words_compress() {
        let data = b"Meet me at the station tomorrow morning.";
        let compressed = compress(data).unwrap();

        assert!(compressed.len() < data.len());
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_random_data_roundtrips() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let data: Vec<u8> = (0..100).map(|_| rng.gen()).collect();

        let compressed = compress(&data).unwrap();
        let decompressed = decompress(&compressed).unwrap();

        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_decompression_invalid_marker() {
        let result = decompress(&[99u8, 1, 2, 3]);
        assert!(matches!(result, Err(CompressionError::DecompressionFailed(_))));
    }

    #[test]
    fn test_decompression_empty_input() {
        assert!(decompress(&[]).is_err());
        assert!(decompress(&[MARKER_DEFLATE]).is_err());
    }

    #[test]
    fn test_stored_marker_on_compressible_data_rejected() {
        let text = "aaaa".repeat(30).into_bytes();
        assert_eq!(compress(&text).unwrap()[0], MARKER_DEFLATE);

        let mut stored = vec![MARKER_STORED];
        stored.extend_from_slice(&text);

        let result = decompress(&stored);
        assert!(matches!(result, Err(CompressionError::DecompressionFailed(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let text = "breathe in, breathe out. ".repeat(20).into_bytes();
        let mut compressed = compress(&text).unwrap();
        compressed.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        assert!(decompress(&compressed).is_err());
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let text = "breathe in, breathe out. ".repeat(20).into_bytes();
        let compressed = compress(&text).unwrap();

        assert!(decompress(&compressed[..compressed.len() - 2]).is_err());
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(compression_ratio(b"", b"\0"), 1.0);
        assert_eq!(compression_ratio(b"abcd", b"ab"), 0.5);
    }
}
