//! Issuance orchestration.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::IssuerError;
use crate::issuance::request::{IssuanceDefaults, IssuanceRequest};
use crate::issuance::validator::{IssuanceValidator, ValidatedRequest};
use crate::jwks::{Jwk, JwkExporter};
use crate::jwt::{TokenClaims, TokenSigner};
use crate::keystore::KeyStore;
use crate::metrics;

/// A signed token and the key that verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Public half of the signing key.
    pub jwk: Jwk,
    /// Compact RS256 token.
    pub jwt: String,
    /// True when this call created or rotated the signing key.
    pub private_key_changed: bool,
}

/// Validates requests and issues tokens against a shared [`KeyStore`].
#[derive(Clone)]
pub struct IssuanceService {
    store: Arc<KeyStore>,
    defaults: IssuanceDefaults,
}

impl IssuanceService {
    /// Create a service with the standard defaults.
    #[must_use]
    pub fn new(store: Arc<KeyStore>) -> Self {
        Self {
            store,
            defaults: IssuanceDefaults::default(),
        }
    }

    /// Override the request defaults.
    #[must_use]
    pub const fn with_defaults(mut self, defaults: IssuanceDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Issue a token for `request`.
    ///
    /// Validation failures return before the key store is consulted.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad request, a key storage error if
    /// the key slot fails, or a crypto error if key generation or signing fails.
    pub async fn issue(&self, request: IssuanceRequest) -> Result<IssuedToken, IssuerError> {
        let start = Instant::now();

        let result = match IssuanceValidator::validate(self.defaults.resolve(request)) {
            Ok(request) => self.sign(request).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => metrics::record_issue_latency(start.elapsed().as_secs_f64()),
            Err(e) if e.is_client_error() => {
                metrics::record_request_error(e.code());
                info!(error = %e, "Issuance request rejected");
            }
            Err(e) => {
                metrics::record_request_error(e.code());
                warn!(error = %e, code = e.code(), "Issuance failed");
            }
        }

        result
    }

    async fn sign(&self, request: ValidatedRequest) -> Result<IssuedToken, IssuerError> {
        let operation = if request.rotate { "rotate" } else { "load" };
        let active = if request.rotate {
            self.store.rotate().await
        } else {
            self.store.load_or_create().await
        };
        let active = match active {
            Ok(active) => {
                metrics::record_key_operation(operation, "success");
                active
            }
            Err(e) => {
                metrics::record_key_operation(operation, "error");
                return Err(e);
            }
        };

        let issued_at = chrono::Utc::now().timestamp();
        let claims = TokenClaims::new(
            &request.client_id,
            &request.audience,
            issued_at,
            request.valid_for,
        );

        let jwk = JwkExporter::export(&active, &request.kid);
        let jwt = TokenSigner::issue(&claims, &request.kid, &active)?;
        let private_key_changed = active.created();
        drop(active);

        metrics::record_token_issued(private_key_changed);
        info!(
            client_id = %request.client_id,
            audience = %request.audience,
            kid = %request.kid,
            jti = %claims.jti,
            exp = claims.exp,
            private_key_changed,
            "Token issued"
        );

        Ok(IssuedToken {
            jwk,
            jwt,
            private_key_changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::keystore::{KeySlot, MemoryKeySlot};

    fn service() -> IssuanceService {
        IssuanceService::new(Arc::new(KeyStore::new(Arc::new(MemoryKeySlot::new()))))
    }

    fn claims_of(token: &IssuedToken) -> TokenClaims {
        let payload = token.jwt.split('.').nth(1).unwrap();
        serde_json::from_slice(&codec::decode_base64_url(payload).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_first_issue_creates_key() {
        let service = service();
        let token = service.issue(IssuanceRequest::new("c1", "a1")).await.unwrap();

        assert!(token.private_key_changed);
        assert_eq!(token.jwt.split('.').count(), 3);
        assert!(uuid::Uuid::parse_str(&token.jwk.kid).is_ok());

        let claims = claims_of(&token);
        assert_eq!(claims.iss, "c1");
        assert_eq!(claims.sub, "c1");
        assert_eq!(claims.aud, "a1");
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[tokio::test]
    async fn test_repeat_issue_keeps_key() {
        let service = service();
        let first = service.issue(IssuanceRequest::new("c1", "a1")).await.unwrap();
        let second = service.issue(IssuanceRequest::new("c1", "a1")).await.unwrap();
        let third = service.issue(IssuanceRequest::new("c1", "a1")).await.unwrap();

        assert!(first.private_key_changed);
        assert!(!second.private_key_changed);
        assert!(!third.private_key_changed);
        assert_eq!(second.jwk.n, third.jwk.n);
        assert_ne!(claims_of(&second).jti, claims_of(&third).jti);
    }

    #[tokio::test]
    async fn test_rotate_changes_key() {
        let service = service();
        let before = service.issue(IssuanceRequest::new("c1", "a1")).await.unwrap();
        let rotated = service
            .issue(IssuanceRequest::new("c1", "a1").with_rotate(true))
            .await
            .unwrap();

        assert!(rotated.private_key_changed);
        assert_ne!(rotated.jwk.n, before.jwk.n);
    }

    #[tokio::test]
    async fn test_kid_is_echoed_in_header_and_jwk() {
        let service = service();
        let token = service
            .issue(IssuanceRequest::new("c1", "a1").with_kid("key-7").with_valid_for(60))
            .await
            .unwrap();

        assert_eq!(token.jwk.kid, "key-7");
        let claims = claims_of(&token);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_key_store() {
        let slot = Arc::new(MemoryKeySlot::new());
        let service = IssuanceService::new(Arc::new(KeyStore::new(slot.clone())));

        let err = service
            .issue(IssuanceRequest::new("c1", "a1").with_valid_for(4000))
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert!(slot.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_configured_default_lifetime() {
        let service = service().with_defaults(IssuanceDefaults::default().with_valid_for(120));
        let token = service.issue(IssuanceRequest::new("c1", "a1")).await.unwrap();

        let claims = claims_of(&token);
        assert_eq!(claims.exp - claims.iat, 120);
    }
}
