use thiserror::Error;

/// Signing input failures - programmer errors, verbose by design
#[derive(Debug, Error)]
pub enum SignError {
    #[error("invalid signing payload: {0}")]
    InvalidPayload(String),

    #[error("token encoding failed")]
    Encoding,
}

/// Verification outcomes
///
/// Returned as values, never raised, so the route layer can map each case to
/// an HTTP status without a catch-all. Messages carry no claim values and no
/// secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("signature verification failed")]
    BadSignature,

    #[error("malformed token")]
    Malformed,

    #[error("token missing subject claim")]
    MissingSubject,

    #[error("token missing or invalid type claim")]
    MissingType,

    #[error("token type does not match expected type")]
    WrongType,

    #[error("token issuer mismatch")]
    WrongIssuer,

    #[error("token audience mismatch")]
    WrongAudience,

    #[error("token has been revoked")]
    Revoked,
}

/// Refresh-rotation outcomes
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("invalid refresh token")]
    InvalidRefreshToken(#[source] VerifyError),

    #[error("presented token is not a refresh token")]
    WrongTokenType,

    #[error("refresh token expired")]
    RefreshTokenExpired,

    #[error(transparent)]
    Sign(#[from] SignError),
}

pub type VerifyResult<T> = std::result::Result<T, VerifyError>;
