//! Cloudinary signed uploads.
//!
//! The admin frontend never sees the API secret: files are posted here and
//! forwarded to `POST {api_base}/v1_1/{cloud}/image/upload` with a
//! SHA-256 signature over the sorted upload parameters.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use crate::config::CloudinaryConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from the Cloudinary upload API.
#[derive(Debug, Error)]
pub enum CloudinaryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary answered with an error.
    #[error("Cloudinary error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Where an uploaded file ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    #[serde(rename(deserialize = "secure_url"))]
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Compute an upload signature.
///
/// Parameters are sorted by name, joined as `k=v` pairs with `&`, the API
/// secret is appended, and the whole string is hashed with SHA-256.
#[must_use]
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by_key(|(k, _)| *k);

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Client for Cloudinary's signed upload API.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::Http` if the HTTP client cannot be built.
    pub fn new(config: CloudinaryConfig) -> Result<Self, CloudinaryError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base, self.config.cloud_name
        )
    }

    /// Upload an image.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::Http` if the request fails and
    /// `CloudinaryError::Api` if Cloudinary rejects the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, CloudinaryError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let folder = self.config.folder.as_str();

        let signature = sign(
            &[("folder", folder), ("timestamp", &timestamp)],
            self.config.api_secret.expose_secret(),
        );

        let mut part = Part::bytes(bytes).file_name(file_name.to_owned());
        if let Some(mime) = content_type {
            part = part.mime_str(mime)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_owned())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map_or_else(|_| "upload rejected".to_owned(), |e| e.error.message);
            tracing::warn!(status = status.as_u16(), %message, "Cloudinary upload failed");
            return Err(CloudinaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadedImage = response.json().await?;
        tracing::info!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(uploaded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_sorts_params() {
        let secret = "a676b67565c6767a6767d6767f676fe1";
        let a = sign(&[("timestamp", "1315060510"), ("folder", "sonic")], secret);
        let b = sign(&[("folder", "sonic"), ("timestamp", "1315060510")], secret);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_sign_matches_manual_digest() {
        let secret = "abcd";
        let expected = hex::encode(Sha256::digest(b"folder=sonic&timestamp=1315060510abcd"));
        assert_eq!(
            sign(&[("timestamp", "1315060510"), ("folder", "sonic")], secret),
            expected
        );
    }

    #[test]
    fn test_sign_skips_empty_values() {
        let secret = "abcd";
        assert_eq!(
            sign(&[("timestamp", "1315060510"), ("folder", "")], secret),
            sign(&[("timestamp", "1315060510")], secret)
        );
    }

    #[test]
    fn test_upload_url() {
        let config = crate::config::tests::test_config().cloudinary.unwrap();
        let client = CloudinaryClient::new(config).unwrap();
        assert_eq!(
            client.upload_url(),
            "https://api.cloudinary.com/v1_1/sonic-demo/image/upload"
        );
    }

    #[test]
    fn test_parse_upload_response() {
        let uploaded: UploadedImage = serde_json::from_value(serde_json::json!({
            "public_id": "sonic/pump_x3",
            "secure_url": "https://res.cloudinary.com/sonic-demo/image/upload/v1/sonic/pump_x3.jpg",
            "url": "http://res.cloudinary.com/sonic-demo/image/upload/v1/sonic/pump_x3.jpg",
            "bytes": 120_253
        }))
        .unwrap();

        assert!(uploaded.url.starts_with("https://"));
        let json = serde_json::to_value(&uploaded).unwrap();
        assert_eq!(json["public_id"], "sonic/pump_x3");
        assert!(json["url"].as_str().unwrap().starts_with("https://"));
    }
}
