//! Token security library for Meridian services
//!
//! Signed bearer tokens for the platform's auth surface: stateless HMAC
//! signing and verification ([`service`]), typed claims with a flattened
//! custom map ([`claims`]), access/refresh pair issuance with rotation
//! ([`lifecycle`]), revocation by token id ([`blacklist`]) and
//! environment-driven configuration ([`config`]).
//!
//! ## Security design
//!
//! - Signature verification always precedes claim inspection; the only way
//!   around it is the explicitly documented [`service::decode`]
//! - Token types are enforced, so a refresh token never passes where an
//!   access token is expected
//! - Reserved claim names cannot be shadowed by caller-supplied claims
//! - Verification errors are specific values, not strings, and carry no
//!   claim or secret material

pub mod blacklist;
pub mod claims;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod service;

pub use blacklist::BlacklistChecker;
pub use claims::{TokenClaims, TokenType, RESERVED_CLAIMS};
pub use config::{ConfigError, SigningSecrets, TokenConfig};
pub use error::{RefreshError, SignError, VerifyError, VerifyResult};
pub use lifecycle::{
    requires_reauthentication, IssueRequest, RefreshOptions, RefreshOutcome, TokenLifecycleManager,
    TokenPair,
};
pub use service::{
    decode, sign, validate_type, verify, DecodedToken, SignOptions, SigningAlgorithm,
    VerifyOptions,
};
