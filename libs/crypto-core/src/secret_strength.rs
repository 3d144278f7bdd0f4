//! Signing-secret strength checks
//!
//! Gates HMAC signing secrets before they are accepted by the token layer:
//! length floor, Shannon entropy, and obvious keyboard patterns.

use crate::error::{CryptoError, CryptoResult};

const MIN_SECRET_LENGTH: usize = 32; // 256 bits
const RECOMMENDED_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_BYTE: f64 = 4.0;

/// Strength classification for a signing secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    /// Reject
    Weak,
    /// Accept with a warning
    Acceptable,
    /// Accept
    Strong,
}

/// Classify a signing secret
pub fn classify_secret(secret: &str) -> SecretStrength {
    let bytes = secret.as_bytes();

    if bytes.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }
    let entropy = shannon_entropy(bytes);
    if entropy < MIN_ENTROPY_BITS_PER_BYTE {
        return SecretStrength::Weak;
    }
    if has_obvious_patterns(bytes) {
        return SecretStrength::Weak;
    }

    if bytes.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= 5.0 {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Reject weak secrets outright; acceptable and strong secrets pass
pub fn require_strong_secret(secret: &str) -> CryptoResult<SecretStrength> {
    match classify_secret(secret) {
        SecretStrength::Weak => Err(CryptoError::WeakSecret),
        strength => Ok(strength),
    }
}

/// Shannon entropy in bits per byte (0-8)
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &count in freq.iter() {
        if count > 0 {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

/// Four or more repeated or sequential bytes in a row
fn has_obvious_patterns(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }

    let mut same_run = 1;
    let mut seq_run = 1;
    for window in data.windows(2) {
        if window[0] == window[1] {
            same_run += 1;
            if same_run >= 4 {
                return true;
            }
        } else {
            same_run = 1;
        }

        if window[1] as i16 - window[0] as i16 == 1 {
            seq_run += 1;
            if seq_run >= 4 {
                return true;
            }
        } else {
            seq_run = 1;
        }
    }
    false
}
