use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::models::errors::AppError;
use crate::utils::config::CloudinaryConfig;

/// Remote folder every image lands in
pub const UPLOAD_FOLDER: &str = "blog_uploads";
/// Format the provider converts every image to
pub const UPLOAD_FORMAT: &str = "png";

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// A file received from a client, ready to forward
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
    pub public_id: String,
}

/// Where the provider put the file
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload_image(&self, upload: ImageUpload) -> Result<StoredImage, AppError>;
}

/// Builds the provider's public id from the client filename: extension dropped,
/// anything outside `[A-Za-z0-9_-]` replaced with `_`.
pub fn public_id_from_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        Uuid::new_v4().to_string()
    } else {
        sanitized
    }
}

/// Cloudinary request signature: parameters sorted by key, joined as `k=v&k=v`,
/// the API secret appended, then SHA-1 in lowercase hex.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Signed uploads to Cloudinary's REST upload endpoint
pub struct CloudinaryStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", CLOUDINARY_API_BASE, self.config.cloud_name)
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload_image(&self, upload: ImageUpload) -> Result<StoredImage, AppError> {
        if !self.config.is_configured() {
            return Err(AppError::storage_failed("Cloudinary credentials are not configured"));
        }

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("folder", UPLOAD_FOLDER),
                ("format", UPLOAD_FORMAT),
                ("public_id", upload.public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let size = upload.data.len();
        let mut file_part = reqwest::multipart::Part::bytes(upload.data).file_name(upload.filename);
        if let Some(content_type) = upload.content_type.as_deref() {
            file_part = file_part
                .mime_str(content_type)
                .map_err(|e| AppError::unsupported_media(e.to_string()))?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("folder", UPLOAD_FOLDER)
            .text("format", UPLOAD_FORMAT)
            .text("public_id", upload.public_id.clone());

        tracing::debug!(
            "Uploading {} bytes to Cloudinary as {}/{}",
            size,
            UPLOAD_FOLDER,
            upload.public_id
        );

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::storage_failed(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("Provider returned {}", status));
            tracing::warn!("Cloudinary rejected upload {}: {}", upload.public_id, message);
            return Err(AppError::upload_rejected(message));
        }
        if !status.is_success() {
            return Err(AppError::storage_failed(format!(
                "Cloudinary returned {}",
                status
            )));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            AppError::storage_failed(format!("Unreadable Cloudinary response: {}", e))
        })?;

        tracing::info!("Stored image {} at {}", body.public_id, body.secure_url);
        Ok(StoredImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }
}
