//! Upload Handlers
//!
//! `multipart/form-data` with a `type` text part and a `file` part. The
//! part order does not matter; unknown parts are skipped.

use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
};

use crate::application::dto::response::UploadResponse;
use crate::application::services::UploadedFile;
use crate::domain::UploadKind;
use crate::presentation::middleware::AuthContext;
use crate::shared::error::AppError;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge {
            max_bytes: UploadKind::largest_limit(),
        }
    } else {
        AppError::invalid_field("file", &e.body_text())
    }
}

pub async fn upload(
    State(state): State<AppState>,
    ctx: AuthContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    let mut multipart = multipart.map_err(|e| AppError::invalid_field("file", &e.body_text()))?;

    let mut kind: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("type") => {
                kind = Some(field.text().await.map_err(multipart_error)?.trim().to_string());
            }
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile { content_type, bytes });
            }
            _ => {}
        }
    }

    let stored = state
        .upload_service()
        .upload(ctx.user_id, kind.as_deref(), file)
        .await?;

    Ok(ApiResponse::created(stored.into()))
}
