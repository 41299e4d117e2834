//! Address encoding: base58-check over a curve-family-prefixed hash160,
//! with automatic decompression of a 33-byte compressed public key before
//! hashing.

use crate::config::CurveType;
use crate::error::AdapterError;
use p256::PublicKey;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 20;
const COMPRESSED_PUBKEY_LEN: usize = 33;
const CHECKSUM_LEN: usize = 4;

fn hash160(data: &[u8]) -> [u8; HASH_LEN] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&ripe);
    out
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let once = Sha256::digest(data);
    Sha256::digest(once).into()
}

fn decompress(compressed: &[u8]) -> Result<Vec<u8>, AdapterError> {
    let point = PublicKey::from_sec1_bytes(compressed)
        .map_err(|e| AdapterError::AbiInvalid(format!("invalid compressed public key: {e}")))?;
    Ok(point.to_encoded_point(false).as_bytes().to_vec())
}

/// Encodes a 20-byte hash160, or a 33-byte compressed public key
/// (decompressed first), into a base58-check address under the given
/// curve family.
pub fn encode(input: &[u8], curve: CurveType) -> Result<String, AdapterError> {
    let hash = if input.len() == COMPRESSED_PUBKEY_LEN {
        hash160(&decompress(input)?)
    } else if input.len() == HASH_LEN {
        let mut h = [0u8; HASH_LEN];
        h.copy_from_slice(input);
        h
    } else {
        hash160(input)
    };

    let mut payload = Vec::with_capacity(1 + HASH_LEN + CHECKSUM_LEN);
    payload.push(curve.prefix_byte());
    payload.extend_from_slice(&hash);
    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    Ok(bs58::encode(payload).into_string())
}

/// Decodes an address back to its 20-byte hash160, checking the prefix
/// matches `curve` and the checksum is valid.
pub fn decode(address: &str, curve: CurveType) -> Result<[u8; HASH_LEN], AdapterError> {
    let payload = bs58::decode(address)
        .into_vec()
        .map_err(|e| AdapterError::AddressNotFound(format!("invalid base58: {e}")))?;

    if payload.len() != 1 + HASH_LEN + CHECKSUM_LEN {
        return Err(AdapterError::AddressNotFound(
            "address has the wrong length".to_string(),
        ));
    }

    let (body, checksum) = payload.split_at(1 + HASH_LEN);
    let expected = double_sha256(body);
    if &expected[..CHECKSUM_LEN] != checksum {
        return Err(AdapterError::AddressNotFound(
            "address checksum mismatch".to_string(),
        ));
    }

    if body[0] != curve.prefix_byte() {
        return Err(AdapterError::AddressNotFound(
            "address curve prefix mismatch".to_string(),
        ));
    }

    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&body[1..]);
    Ok(hash)
}

/// True iff `address` decodes cleanly under `curve`.
pub fn verify(address: &str, curve: CurveType) -> bool {
    decode(address, curve).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_raw_hash() {
        let hash = [7u8; HASH_LEN];
        let addr = encode(&hash, CurveType::NistP256).unwrap();
        assert!(verify(&addr, CurveType::NistP256));
        assert_eq!(decode(&addr, CurveType::NistP256).unwrap(), hash);
    }

    #[test]
    fn rejects_wrong_curve_prefix() {
        let hash = [1u8; HASH_LEN];
        let addr = encode(&hash, CurveType::Gm).unwrap();
        assert!(!verify(&addr, CurveType::NistP256));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let hash = [9u8; HASH_LEN];
        let mut addr = encode(&hash, CurveType::NistP256).unwrap();
        addr.push('x');
        assert!(!verify(&addr, CurveType::NistP256));
    }
}
