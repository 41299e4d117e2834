//! Canonical digest hashing and ECDSA verification shared by the
//! native-coin and contract transaction builders.

use num_bigint::BigUint;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::PublicKey;
use serde::Serialize;
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};

use xuperchain_primitives::model::Transaction;
use xuperchain_primitives::AdapterError;

/// `sha256` of the transaction serialized without signatures or txid —
/// the message every signer signs, and the value `post_tx` compares
/// against the node-reported txid.
pub fn digest_hash(tx: &Transaction) -> Result<Vec<u8>, AdapterError> {
    let mut canon = tx.clone();
    canon.initiator_signs.clear();
    canon.auth_require_signs.clear();
    canon.txid.clear();
    let bytes = serde_json::to_vec(&canon)
        .map_err(|e| AdapterError::SignFailure(format!("encoding digest: {e}")))?;
    Ok(Sha256::digest(&bytes).to_vec())
}

/// Verifies a raw `r||s` (64-byte) signature over `digest` under a
/// 33-byte compressed public key.
pub fn verify_prehashed(
    pubkey_compressed: &[u8],
    digest: &[u8],
    rs: &[u8],
) -> Result<(), AdapterError> {
    if rs.len() != 64 {
        return Err(AdapterError::VerifyFailure(format!(
            "signature has wrong length: {}",
            rs.len()
        )));
    }
    let verifying_key = VerifyingKey::from_sec1_bytes(pubkey_compressed)
        .map_err(|e| AdapterError::VerifyFailure(format!("invalid public key: {e}")))?;
    let signature = Signature::from_slice(rs)
        .map_err(|e| AdapterError::VerifyFailure(format!("malformed signature: {e}")))?;
    verifying_key
        .verify_prehash(digest, &signature)
        .map_err(|e| AdapterError::VerifyFailure(format!("signature does not verify: {e}")))
}

/// Re-encodes a raw `r||s` signature as DER, for inclusion in a built
/// transaction's `SignatureInfo.sign`.
pub fn signature_to_der(rs: &[u8]) -> Result<Vec<u8>, AdapterError> {
    let signature = Signature::from_slice(rs)
        .map_err(|e| AdapterError::VerifyFailure(format!("malformed signature: {e}")))?;
    Ok(signature.to_der().as_bytes().to_vec())
}

#[derive(Serialize)]
struct PublicKeyJson {
    #[serde(rename = "Curvname")]
    curvname: &'static str,
    #[serde(rename = "X")]
    x: Box<RawValue>,
    #[serde(rename = "Y")]
    y: Box<RawValue>,
}

/// Big-endian bytes as a bare JSON integer literal, matching how Go's
/// `big.Int` marshals `ecdsa.PublicKey.X`/`.Y`.
fn bignum_raw(bytes: &[u8]) -> Result<Box<RawValue>, AdapterError> {
    let decimal = BigUint::from_bytes_be(bytes).to_str_radix(10);
    RawValue::from_string(decimal)
        .map_err(|e| AdapterError::VerifyFailure(format!("encoding public key: {e}")))
}

/// `{Curvname, X, Y}` JSON blob stored as `SignatureInfo.public_key`,
/// matching the node's `ecdsa.PublicKey` field names and `big.Int`
/// number encoding for X/Y.
pub fn public_key_json(pubkey_compressed: &[u8]) -> Result<String, AdapterError> {
    let key = PublicKey::from_sec1_bytes(pubkey_compressed)
        .map_err(|e| AdapterError::VerifyFailure(format!("invalid public key: {e}")))?;
    let point = key.to_encoded_point(false);
    let x = point
        .x()
        .ok_or_else(|| AdapterError::VerifyFailure("public key missing x".to_string()))?;
    let y = point
        .y()
        .ok_or_else(|| AdapterError::VerifyFailure("public key missing y".to_string()))?;
    let json = PublicKeyJson {
        curvname: "P-256",
        x: bignum_raw(x)?,
        y: bignum_raw(y)?,
    };
    serde_json::to_string(&json)
        .map_err(|e| AdapterError::VerifyFailure(format!("encoding public key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::hazmat::PrehashSigner;
    use p256::ecdsa::SigningKey;

    #[test]
    fn signs_and_verifies_a_digest() {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let verifying_key = VerifyingKey::from(&signing_key);
        let pubkey = verifying_key.to_encoded_point(true);

        let digest = Sha256::digest(b"hello").to_vec();
        let sig: Signature = signing_key.sign_prehash(&digest).unwrap();
        let rs = sig.to_bytes();

        verify_prehashed(pubkey.as_bytes(), &digest, &rs).unwrap();
    }

    #[test]
    fn rejects_wrong_length_signature() {
        let err = verify_prehashed(&[0u8; 33], &[0u8; 32], &[0u8; 10]).unwrap_err();
        assert!(matches!(err, AdapterError::VerifyFailure(_)));
    }
}
