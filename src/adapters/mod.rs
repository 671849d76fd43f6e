//! Outbound integrations.
//!
//! Handlers depend on these traits; the concrete clients talk to Resend,
//! Cloudinary and Spotify. None of them own persistent state.

mod email;
mod images;
mod spotify;

pub use email::*;
pub use images::*;
pub use spotify::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::PlaylistSummary;

/// A single transactional email.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Transactional email sender. One call is one send; failures are returned.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

/// Image hosting. Both methods return the hosted URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload_bytes(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AppError>;
    async fn upload_url(&self, url: &str) -> Result<String, AppError>;
}

/// Read-only playlist metadata.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn playlists(&self, ids: &[String]) -> Result<Vec<PlaylistSummary>, AppError>;
}

/// Turn a non-2xx provider response into an error carrying its body.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to decode error response".to_string());
    Err(AppError::Provider(format!(
        "{} returned {}: {}",
        provider, status, body
    )))
}
