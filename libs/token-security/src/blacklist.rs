//! In-process token revocation
//!
//! Tracks revoked token ids (`jti`) so a stolen or rotated-out token stops
//! working before its natural expiry. Process-local by design: a deployment
//! with more than one instance shares the revocation set through its session
//! store and feeds it in via [`BlacklistChecker::new`].

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::claims::TokenClaims;
use crate::error::{VerifyError, VerifyResult};
use crate::service::{verify, VerifyOptions};

/// Revocation-aware verifier wrapper
#[derive(Debug, Clone, Default)]
pub struct BlacklistChecker {
    revoked: Arc<RwLock<HashSet<String>>>,
}

impl BlacklistChecker {
    /// Start with an already-known set of revoked token ids
    pub fn new(revoked: impl IntoIterator<Item = String>) -> Self {
        Self {
            revoked: Arc::new(RwLock::new(revoked.into_iter().collect())),
        }
    }

    /// Revoke a token by its id; idempotent
    pub fn revoke(&self, token_id: &str) {
        let mut revoked = match self.revoked.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if revoked.insert(token_id.to_string()) {
            info!(token_id = %token_id, "token revoked");
        }
    }

    pub fn is_revoked(&self, token_id: &str) -> bool {
        let revoked = match self.revoked.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        revoked.contains(token_id)
    }

    pub fn revoked_count(&self) -> usize {
        let revoked = match self.revoked.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        revoked.len()
    }

    /// Verify a token and additionally reject revoked ids
    ///
    /// Signature and temporal checks run first; only a token that is valid in
    /// every other respect can report [`VerifyError::Revoked`]. A valid token
    /// without a `jti` cannot be matched against the set and passes.
    pub fn verify(
        &self,
        token: &str,
        secret: &str,
        options: &VerifyOptions,
    ) -> VerifyResult<TokenClaims> {
        let claims = verify(token, secret, options)?;
        if let Some(jti) = &claims.jti {
            if self.is_revoked(jti) {
                warn!("rejected revoked token");
                return Err(VerifyError::Revoked);
            }
        }
        Ok(claims)
    }
}
