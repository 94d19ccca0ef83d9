//! HTTP transport: request parsing, routing and error mapping.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::IssuerError;
use crate::issuance::{IssuanceRequest, IssuanceService, IssuedToken};
use crate::metrics;

/// Message returned for internal failures; details stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Query parameters of the issuance endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IssueParams {
    /// Rotate the key before signing. Only the text `true` (any case) enables it.
    pub rotate: bool,
}

impl IssueParams {
    /// Read the parameters from decoded query pairs.
    ///
    /// Repeated keys are allowed; the first occurrence wins.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let rotate = pairs
            .iter()
            .find(|(key, _)| key == "rotate")
            .is_some_and(|(_, value)| value.eq_ignore_ascii_case("true"));

        Self { rotate }
    }
}

/// Error payload, `{"Error": "..."}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable message.
    #[serde(rename = "Error")]
    pub error: String,
}

impl IntoResponse for IssuerError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            error!(error = %self, code = self.code(), "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
            )
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Parse an issuance request body.
///
/// The content type is not checked; any body that parses as a JSON object is
/// accepted.
///
/// # Errors
///
/// Returns [`IssuerError::MalformedRequest`] if the body is not a JSON object
/// of the expected shape.
pub fn parse_body(body: &[u8]) -> Result<IssuanceRequest, IssuerError> {
    serde_json::from_slice(body).map_err(|_| IssuerError::MalformedRequest)
}

async fn issue(
    State(service): State<IssuanceService>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Json<IssuedToken>, IssuerError> {
    let params = IssueParams::from_pairs(&pairs);
    let request = parse_body(&body)
        .inspect_err(|e| metrics::record_request_error(e.code()))?
        .with_rotate(params.rotate);

    service.issue(request).await.map(Json)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics_text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}

/// Build the application router.
pub fn router(service: IssuanceService) -> Router {
    Router::new()
        .route("/", post(issue))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> IssueParams {
        let uri: axum::http::Uri = format!("/?{query}").parse().unwrap();
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri).unwrap();
        IssueParams::from_pairs(&pairs)
    }

    #[test]
    fn test_rotate_flag_parsing() {
        assert!(params("rotate=true").rotate);
        assert!(params("rotate=TRUE").rotate);
        assert!(params("rotate=True").rotate);
        assert!(!params("rotate=yes").rotate);
        assert!(!params("rotate=1").rotate);
        assert!(!params("rotate=").rotate);
        assert!(!params("other=true").rotate);
        assert!(!params("").rotate);
        assert!(params("rotate=%74rue").rotate);
        assert!(!params("rotate=%FF").rotate);
    }

    #[test]
    fn test_repeated_rotate_uses_first_value() {
        assert!(params("rotate=true&rotate=true").rotate);
        assert!(params("rotate=true&rotate=no").rotate);
        assert!(!params("rotate=no&rotate=true").rotate);
        assert!(params("other=1&rotate=True&other=2").rotate);
    }

    #[test]
    fn test_parse_body() {
        let request = parse_body(br#"{"client_id":"c1","audience":"a1","valid_for":60}"#).unwrap();
        assert_eq!(request.client_id.as_deref(), Some("c1"));

        assert!(matches!(parse_body(b"{not json"), Err(IssuerError::MalformedRequest)));
        assert!(matches!(parse_body(b"[1,2]"), Err(IssuerError::MalformedRequest)));
        assert!(matches!(parse_body(b""), Err(IssuerError::MalformedRequest)));
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            error: "client_id is mandatory!".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"Error":"client_id is mandatory!"}"#
        );
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let response = IssuerError::key_storage("/secret/path unreadable").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = IssuerError::validation("audience is mandatory!").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
