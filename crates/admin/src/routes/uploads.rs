//! Image uploads proxied to Cloudinary.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireEditor;
use crate::services::UploadedImage;
use crate::state::AppState;

/// Largest accepted image.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for the upload route. Leaves room for the multipart
/// framing so an oversized file is caught by the size check below.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// `POST /api/uploads`
///
/// Expects a multipart body with a single image in the `file` field.
#[instrument(skip_all, fields(user_id = %staff.id))]
pub async fn upload(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>)> {
    let Some(client) = state.cloudinary() else {
        return Err(AppError::Unavailable(
            "Image uploads are not configured".to_string(),
        ));
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().map(ToOwned::to_owned);
        if !content_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
        {
            return Err(AppError::BadRequest("file must be an image".to_string()));
        }

        let bytes = field.bytes().await?;
        check_size(bytes.len())?;

        let uploaded = client
            .upload(&file_name, content_type.as_deref(), bytes.to_vec())
            .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::BadRequest("multipart field 'file' is required".to_string()))
}

fn check_size(len: usize) -> Result<()> {
    if len == 0 {
        return Err(AppError::BadRequest("file is empty".to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("file exceeds the 10 MiB limit".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limits() {
        assert!(check_size(0).is_err());
        assert!(check_size(1).is_ok());
        assert!(check_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(check_size(MAX_UPLOAD_BYTES + 1).is_err());
    }
}
