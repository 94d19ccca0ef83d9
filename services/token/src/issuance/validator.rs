//! Request shape rules, checked before any key material is touched.

use crate::error::IssuerError;
use crate::issuance::request::ResolvedRequest;

/// Longest lifetime a token may be issued for.
pub const MAX_VALID_FOR: i64 = 3600;

/// A request that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// Requesting client.
    pub client_id: String,
    /// Intended recipient.
    pub audience: String,
    /// Key id.
    pub kid: String,
    /// Lifetime in seconds, at most [`MAX_VALID_FOR`].
    pub valid_for: i64,
    /// Rotate before signing.
    pub rotate: bool,
}

/// Stateless rule check over a resolved request.
pub struct IssuanceValidator;

impl IssuanceValidator {
    /// Apply the rules in priority order; the first failing rule is reported.
    ///
    /// # Errors
    ///
    /// Returns a validation error carrying the message for the caller.
    pub fn validate(request: ResolvedRequest) -> Result<ValidatedRequest, IssuerError> {
        let (client_id, audience) = match (request.client_id, request.audience) {
            (None, None) => {
                return Err(IssuerError::validation(
                    "audience and client_id are mandatory!",
                ))
            }
            (None, Some(_)) => return Err(IssuerError::validation("client_id is mandatory!")),
            (Some(_), None) => return Err(IssuerError::validation("audience is mandatory!")),
            (Some(client_id), Some(audience)) => (client_id, audience),
        };

        let too_long = || {
            IssuerError::validation(format!(
                "valid_for must not be higher than {MAX_VALID_FOR} seconds (1 hour)!"
            ))
        };

        let valid_for = match (request.valid_for.as_i64(), request.valid_for.as_u64()) {
            (Some(seconds), _) => seconds,
            // Beyond i64 but still an integer.
            (None, Some(_)) => return Err(too_long()),
            (None, None) => return Err(IssuerError::validation("valid_for must be a integer!")),
        };

        if valid_for > MAX_VALID_FOR {
            return Err(too_long());
        }

        Ok(ValidatedRequest {
            client_id,
            audience,
            kid: request.kid,
            valid_for,
            rotate: request.rotate,
        })
    }
}
