//! Password-based key derivation
//!
//! Two interchangeable strategies: scrypt (memory-hard) and PBKDF2 (iterated).
//! Both are CPU-intensive by design; async callers must go through
//! [`derive_key_async`] so a cooperative scheduler is never blocked by a
//! derivation.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::hash::HashAlgorithm;
use crate::telemetry::timed;

/// Minimum salt length accepted for key derivation
pub const MIN_SALT_LEN: usize = 16;
/// Derived keys may be 1..=2048 bytes
pub const MAX_KEY_LEN: usize = 2048;
/// PBKDF2 floor; anything lower is a misconfiguration, not a tuning choice
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

const DEFAULT_SCRYPT_COST: u64 = 16_384; // 2^14
const DEFAULT_SCRYPT_BLOCK_SIZE: u32 = 8;
const DEFAULT_SCRYPT_PARALLELISM: u32 = 1;
const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Key derivation strategy and parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kdf", rename_all = "lowercase")]
pub enum KdfParams {
    /// Memory-hard derivation; `cost` is scrypt N and must be a power of two
    Scrypt {
        cost: u64,
        block_size: u32,
        parallelism: u32,
    },
    /// Purely iterated derivation with a configurable digest
    Pbkdf2 {
        iterations: u32,
        algorithm: HashAlgorithm,
    },
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfParams::Scrypt {
            cost: DEFAULT_SCRYPT_COST,
            block_size: DEFAULT_SCRYPT_BLOCK_SIZE,
            parallelism: DEFAULT_SCRYPT_PARALLELISM,
        }
    }
}

impl KdfParams {
    /// Interactive-strength PBKDF2 defaults (SHA-256, 100k iterations)
    pub fn pbkdf2_default() -> Self {
        KdfParams::Pbkdf2 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
            algorithm: HashAlgorithm::Sha256,
        }
    }

    fn validate(&self) -> CryptoResult<()> {
        match *self {
            KdfParams::Scrypt {
                cost,
                block_size,
                parallelism,
            } => {
                if cost < 2 || !cost.is_power_of_two() {
                    return Err(CryptoError::InvalidParameters(format!(
                        "scrypt cost must be a power of two greater than 1, got {cost}"
                    )));
                }
                if block_size == 0 {
                    return Err(CryptoError::InvalidParameters(
                        "scrypt block size must be greater than zero".to_string(),
                    ));
                }
                if parallelism == 0 {
                    return Err(CryptoError::InvalidParameters(
                        "scrypt parallelism must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
            KdfParams::Pbkdf2 { iterations, .. } => {
                if iterations < MIN_PBKDF2_ITERATIONS {
                    return Err(CryptoError::InvalidParameters(format!(
                        "pbkdf2 iterations must be at least {MIN_PBKDF2_ITERATIONS}, got {iterations}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Derive `key_len` bytes of key material from `secret` and `salt`
///
/// The returned buffer zeroes itself on drop. Callers that copy the key out
/// are responsible for wiping the copy via [`secure_wipe`].
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    key_len: usize,
    params: &KdfParams,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    params.validate()?;
    if key_len == 0 || key_len > MAX_KEY_LEN {
        return Err(CryptoError::InvalidParameters(format!(
            "key length must be within 1..={MAX_KEY_LEN} bytes, got {key_len}"
        )));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::InvalidParameters(format!(
            "salt must be at least {MIN_SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut output = Zeroizing::new(vec![0u8; key_len]);
    match *params {
        KdfParams::Scrypt {
            cost,
            block_size,
            parallelism,
        } => {
            // cost is validated as a power of two, so trailing_zeros is log2(N)
            let log_n = cost.trailing_zeros() as u8;
            // The len argument only feeds the password-hash API; the raw
            // scrypt function takes its length from the output buffer.
            let scrypt_params = scrypt::Params::new(log_n, block_size, parallelism, 32)
                .map_err(|e| CryptoError::InvalidParameters(e.to_string()))?;
            // scrypt has a 10-byte output floor; shorter keys take a
            // truncated prefix of a floor-sized derivation.
            let working_len = key_len.max(10);
            let mut working = Zeroizing::new(vec![0u8; working_len]);
            timed("scrypt_derive", || {
                scrypt::scrypt(secret, salt, &scrypt_params, &mut working)
            })
            .map_err(|e| CryptoError::InvalidParameters(e.to_string()))?;
            output.copy_from_slice(&working[..key_len]);
        }
        KdfParams::Pbkdf2 {
            iterations,
            algorithm,
        } => {
            timed("pbkdf2_derive", || match algorithm {
                HashAlgorithm::Sha256 => {
                    pbkdf2_hmac::<Sha256>(secret, salt, iterations, &mut output)
                }
                HashAlgorithm::Sha512 => {
                    pbkdf2_hmac::<Sha512>(secret, salt, iterations, &mut output)
                }
            });
        }
    }
    Ok(output)
}

/// Async variant of [`derive_key`], offloaded to the blocking thread pool
///
/// Mandatory on cooperative runtimes: a concurrent token verification must not
/// sit behind a scrypt invocation.
pub async fn derive_key_async(
    secret: &[u8],
    salt: &[u8],
    key_len: usize,
    params: &KdfParams,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let secret = Zeroizing::new(secret.to_vec());
    let salt = salt.to_vec();
    let params = params.clone();
    tokio::task::spawn_blocking(move || derive_key(&secret, &salt, key_len, &params))
        .await
        .map_err(|_| CryptoError::DerivationTask)?
}

/// Overwrite a buffer in place: two random passes, then zeros
///
/// Best-effort only. The allocator or compiler may have copied the data
/// elsewhere; this wipes the bytes we still control.
pub fn secure_wipe(buffer: &mut [u8]) {
    for _ in 0..2 {
        OsRng.fill_bytes(buffer);
    }
    buffer.zeroize();
}
