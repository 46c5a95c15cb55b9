use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("upload rejected: {message}")]
    Upload { status: StatusCode, message: String },
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("model execution failed: {0}")]
    Inference(String),
    #[error("model artifact error: {0}")]
    ModelArtifact(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("other: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Upload { status, .. } => *status,
            ServiceError::Image(_)
            | ServiceError::Inference(_)
            | ServiceError::ModelArtifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for ServiceError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ServiceError::Upload {
            status: err.status(),
            message: err.body_text(),
        }
    }
}
