use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, ErrorBody},
    models::UploadResponse,
    storage::{StorageError, image_extension, object_key},
};

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// upload_image
///
/// [Admin Route] Accepts one image as multipart field `file`, validates its extension and
/// size, stores it as `<uuid>.<ext>` and returns the URL it is served from.
///
/// Only the extension is checked; the bytes are stored as-is.
#[utoipa::path(
    post,
    path = "/api/admin/upload",
    responses(
        (status = 201, description = "Stored", body = UploadResponse),
        (status = 400, description = "Missing file, bad extension or too large", body = ErrorBody)
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let max_bytes = state.config.max_upload_bytes;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "unreadable multipart body");
        AppError::invalid("업로드 요청을 읽을 수 없습니다.")
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::invalid("파일 이름이 없습니다."))?;
        let ext = image_extension(&original)?;

        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, "failed to read upload field");
            AppError::from(StorageError::TooLarge(max_bytes / (1024 * 1024)))
        })?;
        if bytes.len() > max_bytes {
            return Err(StorageError::TooLarge(max_bytes / (1024 * 1024)).into());
        }
        if bytes.is_empty() {
            return Err(AppError::invalid("빈 파일은 업로드할 수 없습니다."));
        }

        let filename = object_key(&ext);
        let url = state.storage.store(&filename, &bytes).await?;
        tracing::info!(original = %original, stored = %filename, size = bytes.len(), "image uploaded");

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url,
                filename,
                size: bytes.len(),
            }),
        ));
    }

    Err(AppError::invalid("'file' 필드에 업로드할 이미지를 첨부해주세요."))
}
