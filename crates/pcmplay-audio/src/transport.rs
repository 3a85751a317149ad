//! base64 transport framing for PCM payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pcmplay_core::{Error, Result};
use tracing::trace;

/// Decode a standard, padded base64 payload into raw bytes.
///
/// ASCII whitespace is skipped so line-wrapped encoder output is accepted,
/// the same way a browser's `atob` treats it. Any other non-alphabet
/// character or non-canonical padding is a [`Error::Decode`].
pub fn decode(payload: &str) -> Result<Vec<u8>> {
    let decoded = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)
    } else {
        STANDARD.decode(payload)
    };
    let bytes = decoded.map_err(|e| Error::Decode(e.to_string()))?;

    trace!("Decoded {} base64 chars into {} bytes", payload.len(), bytes.len());
    Ok(bytes)
}

/// Encode raw bytes as canonical, padded base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_two_samples() {
        let bytes = decode("AAD/fw==").unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0xff, 0x7f]);
    }

    #[test]
    fn test_decode_ignores_line_wraps() {
        let bytes = decode("AAD/\r\nfw==\n").unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0xff, 0x7f]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_alphabet() {
        let err = decode("AA*=").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_bad_padding() {
        assert!(matches!(decode("AQ="), Err(Error::Decode(_))));
        assert!(matches!(decode("AQ"), Err(Error::Decode(_))));
        assert!(matches!(decode("A"), Err(Error::Decode(_))));
    }

    proptest! {
        #[test]
        fn prop_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode(&bytes);
            prop_assert_eq!(decode(&encoded).unwrap(), bytes.clone());
            prop_assert_eq!(encode(&decode(&encoded).unwrap()), encoded);
        }
    }
}
