use axum::{
    body::Body,
    extract::{Request, State},
    response::Json,
};
use futures_util::TryStreamExt;
use multer::{Constraints, Multipart, SizeLimit};
use serde::Serialize;

use crate::models::errors::AppError;
use crate::services::media_storage::{public_id_from_filename, ImageUpload};
use crate::AppState;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

// Room for boundaries, part headers and small text fields around the file
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub public_id: String,
}

/// Accept a single image in the `file` field and forward it to the media provider
pub async fn upload_image(
    State(app_state): State<AppState>,
    request: Request<Body>,
) -> Result<Json<UploadResponse>, AppError> {
    let boundary = request
        .headers()
        .get("content-type")
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::validation_failed("Expected a multipart/form-data body"))?;

    let max_file_size = app_state.config.max_file_size;
    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(max_file_size as u64 + MULTIPART_OVERHEAD)
            .per_field(max_file_size as u64),
    );

    // Convert the request body to a stream
    let stream = request
        .into_body()
        .into_data_stream()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));

    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != FILE_FIELD {
            tracing::debug!("Ignoring multipart field: {}", name);
            continue;
        }

        if upload.is_some() {
            return Err(AppError::validation_failed("Only one file may be uploaded"));
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::validation_failed("Field 'file' must be a file, not a text value"))?;

        let content_type = field.content_type().cloned();
        if let Some(mime_type) = &content_type {
            let acceptable =
                mime_type.type_() == mime::IMAGE || *mime_type == mime::APPLICATION_OCTET_STREAM;
            if !acceptable {
                return Err(AppError::unsupported_media(format!(
                    "Expected an image, got {}",
                    mime_type
                )));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?;

        if data.is_empty() {
            return Err(AppError::validation_failed("Uploaded file is empty"));
        }

        tracing::debug!(
            "Received upload: {} ({} bytes, content_type: {:?})",
            filename,
            data.len(),
            content_type
        );

        upload = Some(ImageUpload {
            public_id: public_id_from_filename(&filename),
            data: data.to_vec(),
            filename,
            content_type: content_type.map(|m| m.to_string()),
        });
    }

    let upload = upload.ok_or_else(|| {
        AppError::validation_failed(format!("No file uploaded; expected multipart field '{}'", FILE_FIELD))
    })?;

    let stored = app_state.media.upload_image(upload).await?;

    tracing::info!("Uploaded image {} -> {}", stored.public_id, stored.url);
    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        url: stored.url,
        public_id: stored.public_id,
    }))
}

fn multipart_error(error: multer::Error, max_file_size: usize) -> AppError {
    match error {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            AppError::payload_too_large(max_file_size)
        }
        other => {
            tracing::debug!("Failed to read multipart body: {}", other);
            AppError::validation_failed(format!("Invalid multipart data: {}", other))
        }
    }
}
