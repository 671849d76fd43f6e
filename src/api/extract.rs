//! Request extractors that reject with the JSON error envelope.

use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Multipart part name that carries an uploaded image.
pub const IMAGE_FIELD: &str = "image";

/// An image file received in a multipart body.
#[derive(Debug)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// A request body from either `application/json` or `multipart/form-data`.
///
/// Multipart text fields are collected into a JSON object and deserialized
/// into `T`; a file part named `image` is returned separately.
pub struct Payload<T> {
    pub body: T,
    pub image: Option<UploadedImage>,
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
            return Ok(Self { body, image: None });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;

        let mut fields = Map::new();
        let mut image = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
                    // Browsers send an empty part when no file was chosen
                    if name == IMAGE_FIELD && !bytes.is_empty() {
                        image = Some(UploadedImage {
                            bytes: bytes.to_vec(),
                            filename,
                        });
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
                    fields.insert(name, Value::String(text));
                }
            }
        }

        let body = serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e)))?;
        Ok(Self { body, image })
    }
}

/// Query string parameters, rejecting with the JSON error envelope.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
        Ok(Self(value))
    }
}
