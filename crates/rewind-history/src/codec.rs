//! Binary-safe encoding of stored file content.
//!
//! Content blobs are stored as standard base64 so that NUL bytes, invalid
//! UTF-8 and line endings survive any text-oriented tooling untouched.
//! Stores written before the encoding existed hold raw bytes; decoding falls
//! back to returning those bytes unchanged.

use base64::{engine::general_purpose::STANDARD, Engine};

/// How a stored blob was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Base64,
    /// Raw bytes from a store that predates the encoding.
    Legacy,
}

/// Encode content for storage.
pub fn encode_content(content: &[u8]) -> Vec<u8> {
    STANDARD.encode(content).into_bytes()
}

/// Decode stored content, falling back to the raw bytes for legacy blobs.
pub fn decode_content(stored: &[u8]) -> (Vec<u8>, ContentEncoding) {
    match STANDARD.decode(stored) {
        Ok(decoded) => (decoded, ContentEncoding::Base64),
        Err(_) => (stored.to_vec(), ContentEncoding::Legacy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_content_is_plain_base64() {
        assert_eq!(encode_content(b"hello"), b"aGVsbG8=");
        assert!(encode_content(b"").is_empty());
    }

    #[test]
    fn binary_and_multibyte_content_round_trips() {
        let samples: [&[u8]; 4] = [
            b"\x00\x01\x02\xff\xfe\x00",
            "héllo wörld ✓ 日本語\r\n".as_bytes(),
            b"",
            b"line one\nline two\n\n",
        ];

        for sample in samples {
            let (decoded, encoding) = decode_content(&encode_content(sample));
            assert_eq!(decoded, sample);
            assert_eq!(encoding, ContentEncoding::Base64);
        }
    }

    #[test]
    fn legacy_plain_text_is_returned_unchanged() {
        let legacy = b"func main() {\n\tfmt.Println(\"hi\")\n}";
        let (decoded, encoding) = decode_content(legacy);
        assert_eq!(decoded, legacy);
        assert_eq!(encoding, ContentEncoding::Legacy);
    }

    #[test]
    fn legacy_binary_is_returned_unchanged() {
        let legacy = b"\x00raw\xffbytes";
        let (decoded, encoding) = decode_content(legacy);
        assert_eq!(decoded, legacy);
        assert_eq!(encoding, ContentEncoding::Legacy);
    }
}
