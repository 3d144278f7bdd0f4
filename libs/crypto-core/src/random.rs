//! Cryptographically secure random generation
//!
//! Everything here draws from the OS CSPRNG (`OsRng`). Seeded or thread-local
//! PRNGs are never used, even for non-secret values like UUIDs.

use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

use crate::error::RandomError;

const MIN_SECRET_LENGTH: usize = 32; // 256 bits minimum for signing secrets

/// Character classes available to [`random_password`]
#[derive(Debug, Clone, Copy)]
pub struct CharsetOptions {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
    /// Drop characters that are easy to misread (0/O, 1/l/I, etc.)
    pub exclude_ambiguous: bool,
}

impl Default for CharsetOptions {
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: false,
            exclude_ambiguous: false,
        }
    }
}

/// Generate `n` cryptographically secure random bytes
pub fn random_bytes(n: usize) -> Result<Vec<u8>, RandomError> {
    if n == 0 {
        return Err(RandomError::InvalidLength);
    }
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    Ok(buf)
}

/// Generate a hex-encoded random token of `length_bytes` bytes (default 32)
pub fn secure_token(length_bytes: usize) -> Result<String, RandomError> {
    Ok(hex::encode(random_bytes(length_bytes)?))
}

/// Generate a random UUID v4 string
///
/// `Builder::from_random_bytes` sets the RFC 4122 version and variant bits on
/// top of the 16 random bytes.
pub fn uuid_v4() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Generate a random UUID v4 as a typed value
pub fn uuid_v4_typed() -> Uuid {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Generate a uniform random integer in `[min, max_exclusive)`
///
/// Rejection-samples the raw 64-bit output so the result carries no modulo
/// bias.
pub fn random_int(min: i64, max_exclusive: i64) -> Result<i64, RandomError> {
    if min >= max_exclusive {
        return Err(RandomError::InvalidRange {
            min,
            max: max_exclusive,
        });
    }

    let span = (max_exclusive as i128 - min as i128) as u64;
    // 2^64 mod span; values at or above u64::MAX - rem + 1 would wrap unevenly
    let rem = ((u64::MAX % span) + 1) % span;
    loop {
        let v = OsRng.next_u64();
        if rem == 0 || v <= u64::MAX - rem {
            return Ok((min as i128 + (v % span) as i128) as i64);
        }
    }
}

/// Generate a random password from the configured character classes
pub fn random_password(length: usize, options: &CharsetOptions) -> Result<String, RandomError> {
    if length == 0 {
        return Err(RandomError::InvalidLength);
    }

    let mut charset = String::new();
    if options.uppercase {
        charset.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    }
    if options.lowercase {
        charset.push_str("abcdefghijklmnopqrstuvwxyz");
    }
    if options.digits {
        charset.push_str("0123456789");
    }
    if options.symbols {
        charset.push_str("!@#$%^&*()-_=+[]{};:,.<>?");
    }
    if charset.is_empty() {
        return Err(RandomError::EmptyCharset);
    }

    let chars: Vec<char> = if options.exclude_ambiguous {
        const AMBIGUOUS: &str = "0O1lI|`'\"";
        charset.chars().filter(|c| !AMBIGUOUS.contains(*c)).collect()
    } else {
        charset.chars().collect()
    };
    if chars.is_empty() {
        return Err(RandomError::EmptyCharset);
    }

    let mut password = String::with_capacity(length);
    for _ in 0..length {
        let idx = random_int(0, chars.len() as i64)? as usize;
        password.push(chars[idx]);
    }
    Ok(password)
}

/// Generate a base64-encoded secret suitable for HMAC signing keys
///
/// Enforces a 32-byte floor so accidentally short secrets never reach the
/// signing layer.
pub fn generate_secure_secret(length_bytes: usize) -> Result<String, RandomError> {
    if length_bytes < MIN_SECRET_LENGTH {
        return Err(RandomError::InvalidLength);
    }
    use base64::{engine::general_purpose::STANDARD, Engine};
    Ok(STANDARD.encode(random_bytes(length_bytes)?))
}
