use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{check_status, ImageHost};
use crate::config::CloudinaryConfig;
use crate::errors::AppError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Signed uploads to Cloudinary.
pub struct CloudinaryUploader {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    base_url: String,
}

impl CloudinaryUploader {
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Form fields shared by every upload, signature included.
    fn signed_form(&self, timestamp: i64) -> Form {
        let timestamp = timestamp.to_string();
        let signature = sign_upload(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );
        Form::new()
            .text("api_key", self.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn upload(&self, form: Form) -> Result<String, AppError> {
        let response = self
            .client
            .post(format!(
                "{}/v1_1/{}/image/upload",
                self.base_url, self.cloud_name
            ))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = check_status("Image host", response).await?.json().await?;

        tracing::info!("Uploaded image to {}", uploaded.secure_url);
        Ok(uploaded.secure_url)
    }
}

#[async_trait]
impl ImageHost for CloudinaryUploader {
    async fn upload_bytes(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AppError> {
        let form = self
            .signed_form(chrono::Utc::now().timestamp())
            .part("file", Part::bytes(bytes).file_name(filename.to_string()));
        self.upload(form).await
    }

    async fn upload_url(&self, url: &str) -> Result<String, AppError> {
        let form = self
            .signed_form(chrono::Utc::now().timestamp())
            .text("file", url.to_string());
        self.upload(form).await
    }
}

/// Hex SHA-256 over `k=v` pairs sorted by key and joined with `&`, followed
/// by the API secret.
pub fn sign_upload(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
