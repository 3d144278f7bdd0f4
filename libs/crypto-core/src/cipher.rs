//! Authenticated symmetric encryption over password-derived keys
//!
//! AES-256-GCM with a 96-bit random nonce and 128-bit tag. The key never
//! arrives from the caller directly; it is derived per operation from a
//! password/master secret and a fresh random salt, so the persisted payload is
//! fully self-describing and carries no key material.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_key, KdfParams, MIN_SALT_LEN};
use crate::random::random_bytes;

pub const ALGORITHM_ID: &str = "aes-256-gcm";
pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const SALT_LEN: usize = 16;

/// Versioned, self-describing encryption record
///
/// Safe to persist long-term; every component is public. Salt and IV are
/// fresh per encryption call and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub algorithm: String,
    /// Base64 KDF salt (16 bytes)
    pub salt: String,
    /// Base64 GCM nonce (12 bytes)
    pub iv: String,
    /// Base64 authentication tag (16 bytes)
    pub auth_tag: String,
    /// Base64 ciphertext
    pub ciphertext: String,
}

/// Encryption options; defaults are correct for production use
#[derive(Debug, Clone, Default)]
pub struct EncryptOptions {
    pub kdf: KdfParams,
    /// Caller-supplied salt for deterministic re-derivation in tests only;
    /// production callers leave this unset and get a fresh random salt
    pub salt: Option<Vec<u8>>,
}

/// Encrypt a UTF-8 payload under a password-derived key
pub fn encrypt(
    plaintext: &str,
    password: &str,
    options: &EncryptOptions,
) -> CryptoResult<EncryptedPayload> {
    let salt = match &options.salt {
        Some(salt) => {
            if salt.len() < MIN_SALT_LEN {
                return Err(CryptoError::InvalidParameters(format!(
                    "supplied salt must be at least {MIN_SALT_LEN} bytes"
                )));
            }
            salt.clone()
        }
        None => random_bytes(SALT_LEN).map_err(|_| CryptoError::EncryptionFailed)?,
    };

    let key = derive_key(password.as_bytes(), &salt, KEY_LEN, &options.kdf)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let nonce_bytes = random_bytes(NONCE_LEN).map_err(|_| CryptoError::EncryptionFailed)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    // aes-gcm appends the tag to the ciphertext; store it separately
    let mut ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed)?;
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::EncryptionFailed);
    }
    let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

    Ok(EncryptedPayload {
        algorithm: ALGORITHM_ID.to_string(),
        salt: STANDARD.encode(&salt),
        iv: STANDARD.encode(&nonce_bytes),
        auth_tag: STANDARD.encode(&tag),
        ciphertext: STANDARD.encode(&ciphertext),
    })
}

/// Decrypt an [`EncryptedPayload`]
///
/// Every failure mode - wrong password, tampered tag, malformed component,
/// algorithm mismatch - returns the same opaque [`CryptoError::DecryptionFailed`]
/// so the error channel cannot distinguish tampering from a bad key.
pub fn decrypt(
    payload: &EncryptedPayload,
    password: &str,
    kdf: &KdfParams,
) -> CryptoResult<String> {
    if payload.algorithm != ALGORITHM_ID {
        return Err(CryptoError::DecryptionFailed);
    }

    let salt = STANDARD
        .decode(&payload.salt)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let nonce_bytes = STANDARD
        .decode(&payload.iv)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let tag = STANDARD
        .decode(&payload.auth_tag)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let mut ciphertext = STANDARD
        .decode(&payload.ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    if nonce_bytes.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(CryptoError::DecryptionFailed);
    }

    let key =
        derive_key(password.as_bytes(), &salt, KEY_LEN, kdf).map_err(|_| CryptoError::DecryptionFailed)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    ciphertext.extend_from_slice(&tag);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
}

/// Async [`encrypt`]; the key derivation dominates, so the whole operation is
/// offloaded to the blocking pool
pub async fn encrypt_async(
    plaintext: &str,
    password: &str,
    options: &EncryptOptions,
) -> CryptoResult<EncryptedPayload> {
    let plaintext = plaintext.to_string();
    let password = zeroize::Zeroizing::new(password.to_string());
    let options = options.clone();
    tokio::task::spawn_blocking(move || encrypt(&plaintext, &password, &options))
        .await
        .map_err(|_| CryptoError::DerivationTask)?
}

/// Async [`decrypt`], offloaded like [`encrypt_async`]
pub async fn decrypt_async(
    payload: &EncryptedPayload,
    password: &str,
    kdf: &KdfParams,
) -> CryptoResult<String> {
    let payload = payload.clone();
    let password = zeroize::Zeroizing::new(password.to_string());
    let kdf = kdf.clone();
    tokio::task::spawn_blocking(move || decrypt(&payload, &password, &kdf))
        .await
        .map_err(|_| CryptoError::DerivationTask)?
}
