//! End-to-end token lifecycle scenarios
//!
//! Exercises the crate the way the auth service does: issue a pair at login,
//! verify access tokens per request, rotate on refresh, and consume rotated
//! refresh tokens through the revocation set.

use secrecy::SecretString;
use serde_json::json;
use token_security::{
    validate_type, verify, BlacklistChecker, IssueRequest, RefreshError, RefreshOptions,
    SigningSecrets, TokenLifecycleManager, TokenType, VerifyError, VerifyOptions,
};

fn secrets() -> SigningSecrets {
    SigningSecrets::new(SecretString::from(
        "integration-signing-secret-0123456789abcdef".to_string(),
    ))
    .with_refresh_secret(SecretString::from(
        "integration-refresh-secret-0123456789abcdef".to_string(),
    ))
}

fn manager() -> TokenLifecycleManager {
    TokenLifecycleManager::default()
        .with_issuer("meridian-auth")
        .with_audience("meridian-api")
}

fn verify_options() -> VerifyOptions {
    VerifyOptions {
        issuer: Some("meridian-auth".to_string()),
        audience: Some("meridian-api".to_string()),
        ..Default::default()
    }
}

#[test]
fn login_issue_verify_request() {
    let manager = manager();
    let secrets = secrets();
    let request = IssueRequest::new("user-42")
        .claim("tenant_id", json!("tenant-7"))
        .claim("roles", json!(["billing", "reports"]));

    let pair = manager.issue_pair(&request, &secrets).unwrap();

    // A request handler validates the access token and reads its claims
    let claims = validate_type(
        &pair.access_token,
        secrets.signing_secret(),
        TokenType::Access,
        &verify_options(),
    )
    .unwrap();
    assert_eq!(claims.sub, "user-42");
    assert_eq!(claims.custom_str("tenant_id"), Some("tenant-7"));
    assert_eq!(claims.iss.as_deref(), Some("meridian-auth"));

    // The access token is useless at the refresh endpoint
    assert!(matches!(
        manager.refresh(&pair.access_token, &secrets, &RefreshOptions::default()),
        Err(RefreshError::InvalidRefreshToken(_) | RefreshError::WrongTokenType)
    ));
}

#[test]
fn refresh_rotation_with_revocation_of_spent_token() {
    let manager = manager();
    let secrets = secrets();
    let blacklist = BlacklistChecker::default();

    let pair = manager
        .issue_pair(&IssueRequest::new("user-42"), &secrets)
        .unwrap();

    // First refresh succeeds and rotates
    let old_claims = blacklist
        .verify(&pair.refresh_token, secrets.refresh_secret(), &verify_options())
        .unwrap();
    let outcome = manager
        .refresh(&pair.refresh_token, &secrets, &RefreshOptions::default())
        .unwrap();
    assert!(outcome.rotated_refresh_token);

    // The session store consumes the spent token's id
    blacklist.revoke(old_claims.jti.as_deref().unwrap());

    // Replaying the spent refresh token is caught by the revocation set
    assert_eq!(
        blacklist
            .verify(&pair.refresh_token, secrets.refresh_secret(), &verify_options())
            .unwrap_err(),
        VerifyError::Revoked
    );

    // The rotated token still works and keeps the session id
    let rotated = blacklist
        .verify(&outcome.refresh_token, secrets.refresh_secret(), &verify_options())
        .unwrap();
    assert_eq!(rotated.custom_str("session_id"), Some(pair.session_id.as_str()));
}

#[test]
fn refresh_preserves_tenant_context_across_rotations() {
    let manager = manager();
    let secrets = secrets();

    let pair = manager
        .issue_pair(
            &IssueRequest::new("user-42").claim("tenant_id", json!("tenant-7")),
            &secrets,
        )
        .unwrap();

    // The refresh token carries only the session id, so preservation pulls
    // from whatever the caller re-supplies plus the allow-list
    let options = RefreshOptions {
        additional_claims: [("tenant_id".to_string(), json!("tenant-7"))]
            .into_iter()
            .collect(),
        ..Default::default()
    };

    let mut refresh_token = pair.refresh_token.clone();
    for _ in 0..3 {
        let outcome = manager.refresh(&refresh_token, &secrets, &options).unwrap();
        let access = verify(
            &outcome.access_token,
            secrets.signing_secret(),
            &verify_options(),
        )
        .unwrap();
        assert_eq!(access.custom_str("tenant_id"), Some("tenant-7"));
        assert_eq!(access.custom_str("session_id"), Some(pair.session_id.as_str()));
        refresh_token = outcome.refresh_token;
    }
}

#[test]
fn tokens_do_not_cross_verifier_configurations() {
    let manager = manager();
    let secrets = secrets();
    let pair = manager
        .issue_pair(&IssueRequest::new("user-42"), &secrets)
        .unwrap();

    // A verifier expecting a different audience rejects the token
    let other_audience = VerifyOptions {
        issuer: Some("meridian-auth".to_string()),
        audience: Some("partner-api".to_string()),
        ..Default::default()
    };
    assert_eq!(
        verify(&pair.access_token, secrets.signing_secret(), &other_audience).unwrap_err(),
        VerifyError::WrongAudience
    );

    // The refresh secret never verifies an access token
    assert_eq!(
        verify(&pair.access_token, secrets.refresh_secret(), &verify_options()).unwrap_err(),
        VerifyError::BadSignature
    );
}

#[test]
fn verification_token_flow() {
    // Email verification uses the same signing layer with a dedicated type
    let secrets = secrets();
    let token = token_security::sign(
        "user-42",
        TokenType::Verification,
        [("email".to_string(), json!("user@example.com"))]
            .into_iter()
            .collect(),
        secrets.signing_secret(),
        &token_security::SignOptions {
            expires_in: chrono::Duration::hours(24),
            ..Default::default()
        },
    )
    .unwrap();

    let claims = validate_type(
        &token,
        secrets.signing_secret(),
        TokenType::Verification,
        &VerifyOptions::default(),
    )
    .unwrap();
    assert_eq!(claims.custom_str("email"), Some("user@example.com"));

    // The same token cannot be spent as an access token
    assert_eq!(
        validate_type(
            &token,
            secrets.signing_secret(),
            TokenType::Access,
            &VerifyOptions::default(),
        )
        .unwrap_err(),
        VerifyError::WrongType
    );
}
