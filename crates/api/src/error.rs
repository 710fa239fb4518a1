//! HTTP rendering of application errors.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use sketchmotion_core::generation::{GenerationError, Stage};
use sketchmotion_shared::AppError;

/// Error returned by handlers. Renders as `{"error": message, "code": CODE}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let app = match (&err, err.stage()) {
            (GenerationError::InvalidSketch(inner), _) => {
                AppError::Validation(format!("Invalid image_data: {inner}"))
            }
            (GenerationError::Timeout(_), _) => {
                AppError::Timeout(format!("Failed to generate video: {err}"))
            }
            (_, Stage::Image) => {
                AppError::ExternalService(format!("Failed to generate image: {err}"))
            }
            (_, Stage::Video | Stage::Input) => {
                AppError::ExternalService(format!("Failed to generate video: {err}"))
            }
        };
        Self(app)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!(
                "Request body too large: {}",
                rejection.body_text()
            ))
        } else {
            AppError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
        };
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            Json(json!({
                "error": self.0.message(),
                "code": self.0.error_code(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use sketchmotion_core::sketch::SketchError;
    use sketchmotion_core::storage::StorageError;

    fn mapped(err: GenerationError) -> AppError {
        ApiError::from(err).0
    }

    #[test]
    fn test_invalid_sketch_is_bad_request() {
        let err = mapped(GenerationError::from(SketchError::NotAnImage));
        assert_eq!(err.status_code(), 400);
        assert!(err.message().starts_with("Invalid image_data: "));
    }

    #[test]
    fn test_image_stage_message() {
        let err = mapped(GenerationError::no_image("Gemini did not return an image"));
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.message(),
            "Failed to generate image: Gemini did not return an image"
        );
    }

    #[test]
    fn test_video_stage_message() {
        let err = mapped(GenerationError::video("quota exceeded"));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Failed to generate video: quota exceeded");

        let err = mapped(GenerationError::from(StorageError::operation("denied")));
        assert_eq!(err.status_code(), 500);
        assert!(err.message().starts_with("Failed to generate video: "));
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let err = mapped(GenerationError::Timeout(Duration::from_secs(300)));
        assert_eq!(err.status_code(), 504);
        assert_eq!(
            err.message(),
            "Failed to generate video: Video generation timed out after 300s"
        );
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        use http_body_util::BodyExt;

        let response = ApiError(AppError::Validation("Missing image_data in request".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            value,
            json!({ "error": "Missing image_data in request", "code": "VALIDATION_ERROR" })
        );
    }
}
