//! Token pair issuance and refresh rotation
//!
//! A signed-in principal holds a short-lived access token and a long-lived
//! refresh token sharing one session id. Refreshing verifies the presented
//! refresh token, copies only allow-listed claims forward, and mints a new
//! pair; by default the refresh token itself is rotated on every use.
//!
//! This module does not make a refresh token single-use on its own - the
//! session store consumes a rotated token's jti through
//! [`crate::blacklist::BlacklistChecker`].

use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::claims::{TokenType, RESERVED_CLAIMS};
use crate::config::SigningSecrets;
use crate::error::{RefreshError, SignError, VerifyError};
use crate::service::{sign, verify, SignOptions, SigningAlgorithm, VerifyOptions};

const SESSION_ID_CLAIM: &str = "session_id";

const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Pair-issuance input: the principal plus the claims the caller wants
/// carried by the access token (tenant id, roles, permissions, device id)
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub subject: String,
    /// Session id shared by the pair; generated when unset
    pub session_id: Option<String>,
    pub claims: Map<String, Value>,
}

impl IssueRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            session_id: None,
            claims: Map::new(),
        }
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }
}

/// An issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub issued_at: i64,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

/// Options for [`TokenLifecycleManager::refresh`]
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub access_expires_in: Option<Duration>,
    pub refresh_expires_in: Option<Duration>,
    /// Rotate the refresh token on use (default); when false the presented
    /// refresh token is returned unchanged
    pub rotate_refresh_token: bool,
    /// Allow-list of custom claims copied from the old refresh token into the
    /// new access token; reserved claims are never copied
    pub preserve_claims: Vec<String>,
    /// Claims merged into the new access token after preservation
    pub additional_claims: Map<String, Value>,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            access_expires_in: None,
            refresh_expires_in: None,
            rotate_refresh_token: true,
            preserve_claims: Vec::new(),
            additional_claims: Map::new(),
        }
    }
}

/// Outcome of a refresh, with rotation metadata for the caller's audit trail
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub rotated_refresh_token: bool,
    /// Custom claims actually copied forward
    pub preserved_claims: Vec<String>,
    pub issued_at: i64,
}

/// Orchestrates pair issuance and refresh rotation; stateless apart from its
/// configured defaults
#[derive(Debug, Clone)]
pub struct TokenLifecycleManager {
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: Option<String>,
    audience: Option<String>,
    algorithm: SigningAlgorithm,
}

impl Default for TokenLifecycleManager {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            issuer: None,
            audience: None,
            algorithm: SigningAlgorithm::default(),
        }
    }
}

impl TokenLifecycleManager {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access_ttl,
            refresh_ttl,
            ..Default::default()
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    fn sign_options(&self, ttl: Duration) -> SignOptions {
        SignOptions {
            expires_in: ttl,
            not_before: None,
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            token_id: None,
            algorithm: self.algorithm,
        }
    }

    fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            max_age: None,
            clock_tolerance_secs: 0,
            algorithm: self.algorithm,
        }
    }

    /// Mint an access/refresh pair sharing a session id
    ///
    /// The access token carries every requested claim; the refresh token
    /// deliberately carries only the session id, so a leaked refresh token
    /// discloses as little as possible.
    pub fn issue_pair(
        &self,
        request: &IssueRequest,
        secrets: &SigningSecrets,
    ) -> Result<TokenPair, SignError> {
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(crypto_core::uuid_v4);
        let now = Utc::now().timestamp();

        let mut access_claims = request.claims.clone();
        access_claims.insert(SESSION_ID_CLAIM.to_string(), Value::from(session_id.clone()));
        let access_token = sign(
            &request.subject,
            TokenType::Access,
            access_claims,
            secrets.signing_secret(),
            &self.sign_options(self.access_ttl),
        )?;

        let mut refresh_claims = Map::new();
        refresh_claims.insert(SESSION_ID_CLAIM.to_string(), Value::from(session_id.clone()));
        let refresh_token = sign(
            &request.subject,
            TokenType::Refresh,
            refresh_claims,
            secrets.refresh_secret(),
            &self.sign_options(self.refresh_ttl),
        )?;

        info!(session_id = %session_id, "issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
            session_id,
            issued_at: now,
            access_expires_at: now + self.access_ttl.num_seconds(),
            refresh_expires_at: now + self.refresh_ttl.num_seconds(),
        })
    }

    /// Exchange a refresh token for a new pair
    pub fn refresh(
        &self,
        refresh_token: &str,
        secrets: &SigningSecrets,
        options: &RefreshOptions,
    ) -> Result<RefreshOutcome, RefreshError> {
        // 1. Signature and temporal checks; any failure invalidates the token
        let claims = verify(refresh_token, secrets.refresh_secret(), &self.verify_options())
            .map_err(RefreshError::InvalidRefreshToken)?;

        // 2. Only refresh tokens may be exchanged
        if claims.token_type != TokenType::Refresh {
            return Err(RefreshError::WrongTokenType);
        }

        // 3. Defense in depth: re-check expiry even though verify already did
        let now = Utc::now().timestamp();
        if claims.exp <= now {
            return Err(RefreshError::RefreshTokenExpired);
        }

        // 4. Copy forward only allow-listed claims
        let mut new_claims = Map::new();
        let mut preserved = Vec::new();
        for name in &options.preserve_claims {
            if RESERVED_CLAIMS.contains(&name.as_str()) {
                continue;
            }
            if let Some(value) = claims.custom.get(name) {
                new_claims.insert(name.clone(), value.clone());
                preserved.push(name.clone());
            }
        }
        for (name, value) in &options.additional_claims {
            new_claims.insert(name.clone(), value.clone());
        }
        // The session id always survives rotation; it is the pair's identity
        if let Some(session_id) = claims.custom.get(SESSION_ID_CLAIM) {
            new_claims.insert(SESSION_ID_CLAIM.to_string(), session_id.clone());
        }

        // 5. Always a new access token
        let access_ttl = options.access_expires_in.unwrap_or(self.access_ttl);
        let access_token = sign(
            &claims.sub,
            TokenType::Access,
            new_claims,
            secrets.signing_secret(),
            &self.sign_options(access_ttl),
        )?;

        // 6. Rotate the refresh token unless explicitly disabled
        let (new_refresh_token, rotated) = if options.rotate_refresh_token {
            let mut refresh_claims = Map::new();
            if let Some(session_id) = claims.custom.get(SESSION_ID_CLAIM) {
                refresh_claims.insert(SESSION_ID_CLAIM.to_string(), session_id.clone());
            }
            let refresh_ttl = options.refresh_expires_in.unwrap_or(self.refresh_ttl);
            let token = sign(
                &claims.sub,
                TokenType::Refresh,
                refresh_claims,
                secrets.refresh_secret(),
                &self.sign_options(refresh_ttl),
            )?;
            (token, true)
        } else {
            (refresh_token.to_string(), false)
        };

        debug!(
            rotated,
            preserved = preserved.len(),
            "refresh token exchanged"
        );
        Ok(RefreshOutcome {
            access_token,
            refresh_token: new_refresh_token,
            rotated_refresh_token: rotated,
            preserved_claims: preserved,
            issued_at: now,
        })
    }
}

/// Convenience check used by callers that only need the error mapping:
/// whether a refresh failure means the client must re-authenticate
pub fn requires_reauthentication(err: &RefreshError) -> bool {
    matches!(
        err,
        RefreshError::InvalidRefreshToken(VerifyError::Expired)
            | RefreshError::InvalidRefreshToken(VerifyError::Revoked)
            | RefreshError::RefreshTokenExpired
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::validate_type;
    use secrecy::SecretString;
    use serde_json::json;

    fn secrets() -> SigningSecrets {
        SigningSecrets::new(SecretString::from("lifecycle-test-secret-0123456789".to_string()))
    }

    #[test]
    fn test_issue_pair_shares_session_id() {
        let manager = TokenLifecycleManager::default();
        let request = IssueRequest::new("u1")
            .claim("tenant_id", json!("t-9"))
            .claim("roles", json!(["ops"]));
        let pair = manager.issue_pair(&request, &secrets()).unwrap();

        let access = validate_type(
            &pair.access_token,
            secrets().signing_secret(),
            TokenType::Access,
            &VerifyOptions::default(),
        )
        .unwrap();
        let refresh = validate_type(
            &pair.refresh_token,
            secrets().refresh_secret(),
            TokenType::Refresh,
            &VerifyOptions::default(),
        )
        .unwrap();

        assert_eq!(access.custom_str("session_id"), Some(pair.session_id.as_str()));
        assert_eq!(refresh.custom_str("session_id"), Some(pair.session_id.as_str()));
        assert_eq!(access.custom_str("tenant_id"), Some("t-9"));
        // Refresh tokens carry the minimal claim set
        assert!(refresh.custom_claim("tenant_id").is_none());
        assert!(refresh.custom_claim("roles").is_none());
    }

    #[test]
    fn test_access_shorter_lived_than_refresh() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();
        assert!(pair.access_expires_at < pair.refresh_expires_at);
    }

    #[test]
    fn test_refresh_rotates_by_default() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();

        let outcome = manager
            .refresh(&pair.refresh_token, &secrets(), &RefreshOptions::default())
            .unwrap();
        assert!(outcome.rotated_refresh_token);
        assert_ne!(outcome.refresh_token, pair.refresh_token);
        assert_ne!(outcome.access_token, pair.access_token);

        // The rotated refresh token still belongs to the same session
        let rotated = validate_type(
            &outcome.refresh_token,
            secrets().refresh_secret(),
            TokenType::Refresh,
            &VerifyOptions::default(),
        )
        .unwrap();
        assert_eq!(rotated.custom_str("session_id"), Some(pair.session_id.as_str()));
    }

    #[test]
    fn test_refresh_without_rotation_returns_same_token() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();

        let options = RefreshOptions {
            rotate_refresh_token: false,
            ..Default::default()
        };
        let outcome = manager.refresh(&pair.refresh_token, &secrets(), &options).unwrap();
        assert!(!outcome.rotated_refresh_token);
        assert_eq!(outcome.refresh_token, pair.refresh_token);
    }

    #[test]
    fn test_refresh_preserves_allow_listed_claims() {
        let manager = TokenLifecycleManager::default();
        // Issue a refresh token that happens to carry extra custom claims
        let token = sign(
            "u1",
            TokenType::Refresh,
            [
                ("tenant_id".to_string(), json!("t-4")),
                ("device_id".to_string(), json!("d-1")),
            ]
            .into_iter()
            .collect(),
            secrets().refresh_secret(),
            &SignOptions {
                expires_in: Duration::days(7),
                ..Default::default()
            },
        )
        .unwrap();

        let options = RefreshOptions {
            preserve_claims: vec![
                "tenant_id".to_string(),
                "sub".to_string(),    // reserved - skipped
                "missing".to_string(), // absent - skipped
            ],
            ..Default::default()
        };
        let outcome = manager.refresh(&token, &secrets(), &options).unwrap();
        assert_eq!(outcome.preserved_claims, vec!["tenant_id".to_string()]);

        let access = verify(
            &outcome.access_token,
            secrets().signing_secret(),
            &VerifyOptions::default(),
        )
        .unwrap();
        assert_eq!(access.custom_str("tenant_id"), Some("t-4"));
        // Not on the allow-list, so not copied
        assert!(access.custom_claim("device_id").is_none());
        assert_eq!(access.sub, "u1");
    }

    #[test]
    fn test_refresh_merges_additional_claims() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();

        let options = RefreshOptions {
            additional_claims: [("elevated".to_string(), json!(true))].into_iter().collect(),
            ..Default::default()
        };
        let outcome = manager.refresh(&pair.refresh_token, &secrets(), &options).unwrap();
        let access = verify(
            &outcome.access_token,
            secrets().signing_secret(),
            &VerifyOptions::default(),
        )
        .unwrap();
        assert_eq!(access.custom_claim("elevated"), Some(&json!(true)));
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();

        // With a shared secret the access token verifies but is the wrong type
        let err = manager
            .refresh(&pair.access_token, &secrets(), &RefreshOptions::default())
            .unwrap_err();
        assert!(matches!(err, RefreshError::WrongTokenType));
    }

    #[test]
    fn test_refresh_rejects_expired_token() {
        let manager = TokenLifecycleManager::default();
        let token = sign(
            "u1",
            TokenType::Refresh,
            Map::new(),
            secrets().refresh_secret(),
            &SignOptions {
                expires_in: Duration::seconds(-10),
                ..Default::default()
            },
        )
        .unwrap();

        let err = manager
            .refresh(&token, &secrets(), &RefreshOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            RefreshError::InvalidRefreshToken(VerifyError::Expired)
        ));
        assert!(requires_reauthentication(&err));
    }

    #[test]
    fn test_refresh_rejects_tampered_token() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();
        let tampered = format!("{}x", pair.refresh_token);

        let err = manager
            .refresh(&tampered, &secrets(), &RefreshOptions::default())
            .unwrap_err();
        assert!(matches!(err, RefreshError::InvalidRefreshToken(_)));
    }

    #[test]
    fn test_distinct_refresh_secret() {
        let manager = TokenLifecycleManager::default();
        let secrets = SigningSecrets::new(SecretString::from("access-secret-0123456789abcdef".to_string()))
            .with_refresh_secret(SecretString::from("refresh-secret-0123456789abcdef".to_string()));

        let pair = manager.issue_pair(&IssueRequest::new("u1"), &secrets).unwrap();

        // The refresh token does not verify under the access secret
        assert!(verify(
            &pair.refresh_token,
            secrets.signing_secret(),
            &VerifyOptions::default()
        )
        .is_err());
        assert!(manager
            .refresh(&pair.refresh_token, &secrets, &RefreshOptions::default())
            .is_ok());
    }

    #[test]
    fn test_rotation_issues_fresh_identifiers() {
        let manager = TokenLifecycleManager::default();
        let pair = manager
            .issue_pair(&IssueRequest::new("u1"), &secrets())
            .unwrap();

        let old_refresh = verify(
            &pair.refresh_token,
            secrets().refresh_secret(),
            &VerifyOptions::default(),
        )
        .unwrap();
        let outcome = manager
            .refresh(&pair.refresh_token, &secrets(), &RefreshOptions::default())
            .unwrap();
        let new_refresh = verify(
            &outcome.refresh_token,
            secrets().refresh_secret(),
            &VerifyOptions::default(),
        )
        .unwrap();

        assert_ne!(old_refresh.jti, new_refresh.jti);
    }
}
