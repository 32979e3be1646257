use crate::auth::OwnerContext;
use crate::constants::UPLOAD_FIELD_NAME;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use filevault_core::{check_upload_file_name, AppError, RenameFileRequest, UploadResponse};
use futures::TryStreamExt;
use std::io;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use uuid::Uuid;

fn multipart_error(e: MultipartError) -> HttpAppError {
    HttpAppError(AppError::BadRequest(format!("Invalid multipart body: {}", e)))
}

/// Stream the `file` part of a multipart body through the chunked upload pipeline.
///
/// The part is never buffered whole: it is read in chunks while earlier
/// chunks are already being stored.
#[tracing::instrument(skip(state, multipart), fields(owner_id = %owner.owner_id))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("File name is required".to_string()))?;
        check_upload_file_name(&file_name)?;

        let reader = StreamReader::new(Box::pin(field.map_err(io::Error::other)));
        let file = state
            .uploads
            .upload(owner.owner_id, &file_name, reader)
            .await?;

        return Ok((StatusCode::CREATED, Json(UploadResponse::from(&file))));
    }

    Err(AppError::BadRequest(format!(
        "Multipart field '{}' is required",
        UPLOAD_FIELD_NAME
    ))
    .into())
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = state.catalog.list_files(owner.owner_id).await?;
    Ok(Json(files))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = state.catalog.get_file(owner.owner_id, id).await?;
    Ok(Json(file))
}

pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RenameFileRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = state
        .catalog
        .rename_file(owner.owner_id, id, request)
        .await?;
    Ok(Json(file))
}
