//! Stateless token signing and verification
//!
//! HMAC-signed bearer tokens in the standard three-segment format
//! (`base64url(header).base64url(payload).base64url(signature)`). Signature
//! verification always runs before any claim is inspected; nothing here
//! trusts a parsed value from an unverified token except the explicitly
//! unsafe [`decode`].

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode as jwt_decode, encode as jwt_encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::claims::{sanitize_custom_claims, TokenClaims, TokenType};
use crate::error::{SignError, VerifyError, VerifyResult};

/// HMAC signing algorithms accepted by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    HS256,
    HS384,
    HS512,
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        SigningAlgorithm::HS256
    }
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Options for [`sign`]
#[derive(Debug, Clone)]
pub struct SignOptions {
    pub expires_in: Duration,
    pub not_before: Option<Duration>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Explicit token id; a UUID v4 is generated when unset
    pub token_id: Option<String>,
    pub algorithm: SigningAlgorithm,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            expires_in: Duration::minutes(15),
            not_before: None,
            issuer: None,
            audience: None,
            token_id: None,
            algorithm: SigningAlgorithm::default(),
        }
    }
}

/// Options for [`verify`]
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Upper bound on token age measured from `iat`
    pub max_age: Option<Duration>,
    /// Clock skew tolerance in seconds; zero unless explicitly configured
    pub clock_tolerance_secs: u64,
    pub algorithm: SigningAlgorithm,
}

/// Unverified token parts returned by [`decode`]
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Value,
    pub claims: Value,
    /// Raw base64url signature segment, untouched
    pub signature: String,
}

// Lenient mirror of TokenClaims so a missing subject or type yields its own
// verification error instead of a generic parse failure.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    #[serde(rename = "type")]
    token_type: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
    nbf: Option<i64>,
    jti: Option<String>,
    iss: Option<String>,
    aud: Option<String>,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

/// Sign a token carrying `subject`, `token_type` and the given custom claims
///
/// Reserved claim names in `custom` are dropped rather than allowed to shadow
/// the signed fields. A unique `jti` is generated when the options do not
/// supply one.
pub fn sign(
    subject: &str,
    token_type: TokenType,
    custom: Map<String, Value>,
    secret: &str,
    options: &SignOptions,
) -> Result<String, SignError> {
    if subject.trim().is_empty() {
        return Err(SignError::InvalidPayload(
            "subject must not be empty".to_string(),
        ));
    }

    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject.to_string(),
        token_type,
        iat: now.timestamp(),
        exp: (now + options.expires_in).timestamp(),
        nbf: options.not_before.map(|d| (now + d).timestamp()),
        jti: Some(
            options
                .token_id
                .clone()
                .unwrap_or_else(crypto_core::uuid_v4),
        ),
        iss: options.issuer.clone(),
        aud: options.audience.clone(),
        custom: sanitize_custom_claims(custom),
    };

    jwt_encode(
        &Header::new(options.algorithm.into()),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| SignError::Encoding)
}

/// Verify a token's signature and temporal claims, returning its claims
pub fn verify(token: &str, secret: &str, options: &VerifyOptions) -> VerifyResult<TokenClaims> {
    let mut validation = Validation::new(options.algorithm.into());
    validation.leeway = options.clock_tolerance_secs;
    validation.validate_exp = true;
    // nbf is checked manually below so an absent claim is not an error
    validation.validate_nbf = false;
    validation.validate_aud = options.audience.is_some();
    if let Some(aud) = &options.audience {
        validation.set_audience(&[aud]);
    }
    if let Some(iss) = &options.issuer {
        validation.set_issuer(&[iss]);
    }

    let data = jwt_decode::<RawClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(map_jwt_error)?;
    let raw = data.claims;

    // jsonwebtoken only compares iss/aud when the claim is present; a token
    // minted without them must not satisfy a verifier that demands them
    if options.issuer.is_some() && raw.iss.is_none() {
        return Err(VerifyError::WrongIssuer);
    }
    if options.audience.is_some() && raw.aud.is_none() {
        return Err(VerifyError::WrongAudience);
    }

    let now = Utc::now().timestamp();
    let leeway = options.clock_tolerance_secs as i64;

    if let Some(nbf) = raw.nbf {
        if nbf > now + leeway {
            return Err(VerifyError::NotYetValid);
        }
    }
    if let Some(max_age) = options.max_age {
        let iat = raw.iat.ok_or(VerifyError::Malformed)?;
        if now - iat > max_age.num_seconds() + leeway {
            return Err(VerifyError::Expired);
        }
    }

    let sub = match raw.sub {
        Some(sub) if !sub.trim().is_empty() => sub,
        _ => return Err(VerifyError::MissingSubject),
    };
    let token_type = raw
        .token_type
        .as_deref()
        .and_then(|s| s.parse::<TokenType>().ok())
        .ok_or(VerifyError::MissingType)?;

    Ok(TokenClaims {
        sub,
        token_type,
        iat: raw.iat.unwrap_or_default(),
        exp: raw.exp.unwrap_or_default(),
        nbf: raw.nbf,
        jti: raw.jti,
        iss: raw.iss,
        aud: raw.aud,
        custom: raw.custom,
    })
}

/// Verify a token and additionally require its declared type
///
/// Distinguishes a valid-but-wrong-type token ([`VerifyError::WrongType`])
/// from every other verification failure, so a refresh endpoint can reject an
/// access token with a precise error.
pub fn validate_type(
    token: &str,
    secret: &str,
    expected: TokenType,
    options: &VerifyOptions,
) -> VerifyResult<TokenClaims> {
    let claims = verify(token, secret, options)?;
    if claims.token_type != expected {
        return Err(VerifyError::WrongType);
    }
    Ok(claims)
}

/// Decode a token WITHOUT verifying its signature
///
/// Unsafe for authorization decisions: nothing in the result can be trusted.
/// Intended only for non-security metadata, e.g. reading `exp` client-side to
/// decide whether to refresh proactively.
pub fn decode(token: &str) -> Option<DecodedToken> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(parts[0]).ok()?;
    let claim_bytes = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let header: Value = serde_json::from_slice(&header_bytes).ok()?;
    let claims: Value = serde_json::from_slice(&claim_bytes).ok()?;

    Some(DecodedToken {
        header,
        claims,
        signature: parts[2].to_string(),
    })
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> VerifyError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => VerifyError::BadSignature,
        ErrorKind::InvalidIssuer => VerifyError::WrongIssuer,
        ErrorKind::InvalidAudience => VerifyError::WrongAudience,
        _ => VerifyError::Malformed,
    }
}
