//! Inbound request shape and default resolution.

use serde::Deserialize;
use serde_json::Value;

/// Token lifetime when the request does not ask for one.
pub const DEFAULT_VALID_FOR: i64 = 600;

/// An issuance request as received from the caller.
///
/// Every body field is optional here; presence rules are enforced by the
/// validator so callers get a specific message instead of a parse failure.
/// `valid_for` is kept as raw JSON so a non-integer can be reported as such.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssuanceRequest {
    /// Requesting client; becomes `iss` and `sub`.
    pub client_id: Option<String>,
    /// Intended recipient; becomes `aud`.
    pub audience: Option<String>,
    /// Key id for the header and JWK.
    pub kid: Option<String>,
    /// Requested lifetime in seconds, any JSON value.
    pub valid_for: Option<Value>,
    /// Replace the signing key before issuing. Not part of the body.
    #[serde(skip)]
    pub rotate: bool,
}

impl IssuanceRequest {
    /// Request for `client_id` targeting `audience`, everything else defaulted.
    #[must_use]
    pub fn new(client_id: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            audience: Some(audience.into()),
            ..Self::default()
        }
    }

    /// Set the key id.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Set the requested lifetime in seconds.
    #[must_use]
    pub fn with_valid_for(mut self, seconds: i64) -> Self {
        self.valid_for = Some(Value::from(seconds));
        self
    }

    /// Ask for key rotation before signing.
    #[must_use]
    pub const fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }
}

/// A request after defaults have been applied, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// Requesting client, if given.
    pub client_id: Option<String>,
    /// Intended recipient, if given.
    pub audience: Option<String>,
    /// Key id, defaulted when missing or empty.
    pub kid: String,
    /// Lifetime, defaulted when missing or empty-valued.
    pub valid_for: Value,
    /// Rotate before signing.
    pub rotate: bool,
}

/// Fallbacks for the optional request fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceDefaults {
    /// Lifetime used when `valid_for` is missing or empty-valued.
    pub valid_for: i64,
}

impl Default for IssuanceDefaults {
    fn default() -> Self {
        Self {
            valid_for: DEFAULT_VALID_FOR,
        }
    }
}

impl IssuanceDefaults {
    /// Set the default lifetime.
    #[must_use]
    pub const fn with_valid_for(mut self, seconds: i64) -> Self {
        self.valid_for = seconds;
        self
    }

    /// Fill in `kid` and `valid_for`.
    ///
    /// A missing or empty `kid` becomes a fresh UUID. A missing `valid_for`,
    /// or one that is `null`, `false`, zero, `""`, `[]` or `{}`, becomes the
    /// default lifetime.
    #[must_use]
    pub fn resolve(&self, request: IssuanceRequest) -> ResolvedRequest {
        let kid = request
            .kid
            .filter(|kid| !kid.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let valid_for = match request.valid_for {
            Some(value) if !is_empty_value(&value) => value,
            _ => Value::from(self.valid_for),
        };

        ResolvedRequest {
            client_id: request.client_id,
            audience: request.audience,
            kid,
            valid_for,
            rotate: request.rotate,
        }
    }
}

#[allow(clippy::float_cmp)]
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
