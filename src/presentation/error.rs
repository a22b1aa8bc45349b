// HTTP error mapping
use crate::application::vitals_repository::FetchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Fetch(FetchError::InvalidDevice) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_carries_message_verbatim() {
        let response = ApiError::from(FetchError::Transport("connection reset".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "Telemetry request failed: connection reset");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(FetchError::InvalidDevice).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(FetchError::Status { status: 503, body: "down".to_string() }).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::from(FetchError::Decode("eof".to_string())).status(), StatusCode::BAD_GATEWAY);
    }
}
