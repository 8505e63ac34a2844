use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the upload, listing and static-serving paths.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The request carried no file parts.
    #[error("No files uploaded")]
    EmptyUpload,

    /// The declared content type is outside the allow-list.
    #[error("Unsupported file type: {content_type}")]
    UnsupportedType { content_type: String },

    /// A requested static file does not exist.
    #[error("Not Found")]
    NotFound,

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl MediaError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyUpload | Self::UnsupportedType { .. } => StatusCode::BAD_REQUEST,
            // Body-limit overruns come back from axum as 413, malformed forms as 400.
            Self::Multipart(err) => err.status(),
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Io(err) => {
                tracing::error!("storage failure: {err}");
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
