use thiserror::Error;

/// Random-generation misuse errors
#[derive(Debug, Error)]
pub enum RandomError {
    #[error("requested length must be greater than zero")]
    InvalidLength,

    #[error("invalid range: min ({min}) must be less than max ({max})")]
    InvalidRange { min: i64, max: i64 },

    #[error("password charset is empty - enable at least one character class")]
    EmptyCharset,
}

/// Cryptographic operation errors
///
/// Decryption failures are deliberately opaque: wrong key, tampered tag and
/// malformed payload all collapse into `DecryptionFailed` so the error cannot
/// be used as a padding/format oracle.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key derivation parameters: {0}")]
    InvalidParameters(String),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("secret does not meet minimum strength requirements")]
    WeakSecret,

    #[error("key derivation task failed")]
    DerivationTask,
}

pub type CryptoResult<T> = std::result::Result<T, CryptoError>;
