use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// RIPEMD-160(SHA-256(data)), the 20-byte hash committed to by P2PKH scripts.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

/// SHA-256(SHA-256(data)).
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// First 4 bytes of the double SHA-256 of `data`.
pub fn checksum4(data: &[u8]) -> [u8; 4] {
    let digest = sha256d(data);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Base58Check-encode `payload` (version byte(s) already prepended).
///
/// Appends the 4-byte double-SHA256 checksum and Base58-encodes the result.
/// Each leading zero byte becomes a leading `'1'`.
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 4);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum4(payload));
    bs58::encode(data).into_string()
}

/// Decode a Base58Check string and verify its checksum.
///
/// Returns the payload without the trailing checksum.
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CryptoError::InvalidBase58(e.to_string()))?;

    if decoded.len() < 5 {
        return Err(CryptoError::InvalidLength {
            expected: 5,
            actual: decoded.len(),
        });
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    if checksum != checksum4(payload) {
        return Err(CryptoError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash160_of_generator_pubkey() {
        // Compressed secp256k1 generator point G.
        let g = hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
            .unwrap();
        assert_eq!(
            hex::encode(hash160(&g)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn sha256d_empty_input() {
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn encode_generator_p2pkh_address() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(
            &hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap(),
        );
        assert_eq!(
            base58check_encode(&payload),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
    }

    #[test]
    fn leading_zero_bytes_become_ones() {
        let payload = [0u8; 21];
        let encoded = base58check_encode(&payload);
        // 21 zero bytes -> 21 leading '1' characters, then the checksum digits.
        assert!(encoded.starts_with(&"1".repeat(21)));
        assert_ne!(encoded.as_bytes()[21], b'1');
    }

    #[test]
    fn decode_roundtrip_returns_payload() {
        let payload = vec![0x6f, 1, 2, 3, 4, 5];
        let encoded = base58check_encode(&payload);
        assert_eq!(base58check_decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        // Genesis coinbase address with the last character altered.
        let result = base58check_decode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb");
        assert!(matches!(result, Err(CryptoError::ChecksumMismatch)));
    }

    #[test]
    fn decode_rejects_non_base58_characters() {
        let result = base58check_decode("0OIl");
        assert!(matches!(result, Err(CryptoError::InvalidBase58(_))));
    }

    #[test]
    fn decode_rejects_short_input() {
        let result = base58check_decode("1111");
        assert!(matches!(result, Err(CryptoError::InvalidLength { .. })));
    }
}
