//! Single-string codec for encrypted database fields
//!
//! Wraps an [`EncryptedPayload`] as `"enc:" + base64(salt || iv || tag ||
//! ciphertext)` so a sensitive value fits in one text column. Values without
//! the prefix are treated as plaintext and passed through unchanged, which
//! lets encrypted and legacy plaintext rows coexist in the same column.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::cipher::{decrypt, encrypt, EncryptOptions, EncryptedPayload, ALGORITHM_ID, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::KdfParams;

pub const ENC_PREFIX: &str = "enc:";

/// Whether a stored value is in the encrypted-field format
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENC_PREFIX)
}

/// Encrypt a field value into the single-string format
pub fn encrypt_field(value: &str, password: &str, options: &EncryptOptions) -> CryptoResult<String> {
    let payload = encrypt(value, password, options)?;
    let salt = STANDARD
        .decode(&payload.salt)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    let iv = STANDARD
        .decode(&payload.iv)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    let tag = STANDARD
        .decode(&payload.auth_tag)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    let ciphertext = STANDARD
        .decode(&payload.ciphertext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut packed = Vec::with_capacity(salt.len() + iv.len() + tag.len() + ciphertext.len());
    packed.extend_from_slice(&salt);
    packed.extend_from_slice(&iv);
    packed.extend_from_slice(&tag);
    packed.extend_from_slice(&ciphertext);

    Ok(format!("{ENC_PREFIX}{}", STANDARD.encode(&packed)))
}

/// Decrypt a field value from the single-string format
///
/// Values lacking the `enc:` prefix are returned unchanged rather than
/// treated as an error. Prefixed values that fail to parse or authenticate
/// return the opaque decryption failure.
pub fn decrypt_field(value: &str, password: &str, kdf: &KdfParams) -> CryptoResult<String> {
    let Some(encoded) = value.strip_prefix(ENC_PREFIX) else {
        return Ok(value.to_string());
    };

    let packed = STANDARD
        .decode(encoded)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    // salt || iv || tag, then ciphertext (possibly empty)
    if packed.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::DecryptionFailed);
    }

    let (salt, rest) = packed.split_at(SALT_LEN);
    let (iv, rest) = rest.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let payload = EncryptedPayload {
        algorithm: ALGORITHM_ID.to_string(),
        salt: STANDARD.encode(salt),
        iv: STANDARD.encode(iv),
        auth_tag: STANDARD.encode(tag),
        ciphertext: STANDARD.encode(ciphertext),
    };
    decrypt(&payload, password, kdf)
}
