//! Response mapping for dispatch failures.
//!
//! # Design Decisions
//! - Both dispatch failures are 404 to the client
//! - The `reason` field keeps them distinguishable
//! - Partial chains stay in the logs, not in the body

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::routing::DispatchError;

/// JSON body returned for per-request failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            reason: self.reason().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_route_not_found_body() {
        let err = DispatchError::RouteNotFound {
            method: Method::GET,
            path: "/unknown".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.reason, "route_not_found");
        assert_eq!(body.error, "no route matches GET /unknown");
    }
}
