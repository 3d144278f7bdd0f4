//! One-way digests, HMAC and constant-time comparison

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::RandomError;
use crate::random::random_bytes;

const PASSWORD_SALT_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Supported digest widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

/// Result of a digest or password-hash operation
///
/// Safe to persist: carries the digest, the salt needed to recompute it and
/// the algorithm identifier, but no secret material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResult {
    /// Hex-encoded digest
    pub digest: String,
    /// Hex-encoded salt, when one was mixed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    pub algorithm: HashAlgorithm,
    /// Iteration count for iterated records; plain digests leave this unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

fn digest_bytes(data: &[u8], algorithm: HashAlgorithm, salt: Option<&[u8]>) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            if let Some(salt) = salt {
                hasher.update(salt);
            }
            hasher.update(data);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            if let Some(salt) = salt {
                hasher.update(salt);
            }
            hasher.update(data);
            hasher.finalize().to_vec()
        }
    }
}

/// Compute a digest of `data`, mixing in `salt` when provided
///
/// Deterministic for fixed inputs.
pub fn digest(data: &[u8], algorithm: HashAlgorithm, salt: Option<&[u8]>) -> HashResult {
    HashResult {
        digest: hex::encode(digest_bytes(data, algorithm, salt)),
        salt: salt.map(hex::encode),
        algorithm,
        iterations: None,
    }
}

/// Compute an HMAC over `data` with `key`, hex encoded
pub fn hmac(data: &[u8], key: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => {
            // new_from_slice accepts any key length for HMAC
            let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            hex::encode(mac.finalize().into_bytes())
        }
        HashAlgorithm::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            hex::encode(mac.finalize().into_bytes())
        }
    }
}

/// Verify a hex-encoded HMAC signature in constant time
///
/// Returns false, never an error, for malformed signatures.
pub fn verify_hmac(data: &[u8], key: &[u8], signature: &str, algorithm: HashAlgorithm) -> bool {
    let expected = hmac(data, key, algorithm);
    let Ok(expected_bytes) = hex::decode(&expected) else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature) else {
        return false;
    };
    constant_time_equal(&expected_bytes, &signature_bytes)
}

/// Hash a password with a freshly generated random salt
///
/// The salt is always generated here; callers cannot supply their own, so two
/// records for the same password never share a digest.
pub fn hash_password(
    password: &str,
    algorithm: HashAlgorithm,
) -> Result<HashResult, RandomError> {
    let salt = random_bytes(PASSWORD_SALT_LEN)?;
    Ok(digest(password.as_bytes(), algorithm, Some(&salt)))
}

/// Verify a password against a stored [`HashResult`]
///
/// Recomputes with the stored salt and algorithm, then compares in constant
/// time. Malformed stored records verify as false.
pub fn verify_password(password: &str, stored: &HashResult) -> bool {
    let salt = match &stored.salt {
        Some(salt_hex) => match hex::decode(salt_hex) {
            Ok(salt) => Some(salt),
            Err(_) => return false,
        },
        None => None,
    };
    let computed = digest_bytes(password.as_bytes(), stored.algorithm, salt.as_deref());
    let Ok(stored_digest) = hex::decode(&stored.digest) else {
        return false;
    };
    constant_time_equal(&computed, &stored_digest)
}

/// Constant-time equality over byte slices
///
/// Fails closed: unequal lengths return false without examining content. The
/// comparison itself never short-circuits on the first differing byte.
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}
