//! REST API module.
//!
//! One handler module per record kind, plus the Spotify and tutor-contact
//! endpoints. Every response is a `{success, data|error, message?}` envelope.

mod blogs;
mod event_proposals;
mod extract;
mod listings;
mod spotify;
mod subscribers;
mod support;
mod tutors;

pub use blogs::*;
pub use event_proposals::*;
pub use extract::*;
pub use listings::*;
pub use spotify::*;
pub use subscribers::*;
pub use support::*;
pub use tutors::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            status,
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(StatusCode::OK, data))
}

/// Create a 201 response for a newly stored record.
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(StatusCode::CREATED, data))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError) -> ApiResult<T> {
    Err(err)
}

/// Resolve the image for a new record: an uploaded file wins, a remote URL is
/// re-hosted when an image host is configured, anything else is kept as given.
async fn resolve_image(
    state: &AppState,
    upload: Option<UploadedImage>,
    url: Option<&String>,
) -> Result<Option<String>, AppError> {
    if let Some(upload) = upload {
        let host = state
            .images
            .as_ref()
            .ok_or_else(|| AppError::Internal("Image uploads are not configured".to_string()))?;
        return host
            .upload_bytes(upload.bytes, &upload.filename)
            .await
            .map(Some);
    }

    let url = match url.map(|u| u.trim()).filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => return Ok(None),
    };
    let is_remote = url.starts_with("http://") || url.starts_with("https://");
    match &state.images {
        Some(host) if is_remote => host.upload_url(url).await.map(Some),
        _ => Ok(Some(url.to_string())),
    }
}
