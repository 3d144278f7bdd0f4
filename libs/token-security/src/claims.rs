//! Token claim model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Claim names owned by the signing layer; never copied from or into the
/// custom claim map
pub const RESERVED_CLAIMS: &[&str] = &["sub", "type", "iat", "exp", "nbf", "jti", "iss", "aud"];

/// Discriminates what a token is for; a verifier must demand the type it
/// expects, so a refresh token can never pass as an access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
    Verification,
    PasswordReset,
    Api,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::Verification => "verification",
            TokenType::PasswordReset => "password_reset",
            TokenType::Api => "api",
        };
        f.write_str(s)
    }
}

impl FromStr for TokenType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            "verification" => Ok(TokenType::Verification),
            "password_reset" => Ok(TokenType::PasswordReset),
            "api" => Ok(TokenType::Api),
            _ => Err(()),
        }
    }
}

/// Verified claims of a signed token
///
/// Immutable once signed: rotation mints a new token, it never mutates an
/// existing one. Application claims (tenant id, roles, permissions, session
/// id, device id) ride in the flattened `custom` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Principal identifier
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Unique token identifier, used by the revocation layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl TokenClaims {
    /// Fetch a custom claim by name
    pub fn custom_claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Fetch a custom string claim by name
    pub fn custom_str(&self, name: &str) -> Option<&str> {
        self.custom.get(name).and_then(Value::as_str)
    }
}

/// Strip reserved claim names from a custom claim map
pub(crate) fn sanitize_custom_claims(mut claims: Map<String, Value>) -> Map<String, Value> {
    for reserved in RESERVED_CLAIMS {
        claims.remove(*reserved);
    }
    claims
}
