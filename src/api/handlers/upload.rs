use crate::AppState;
use crate::api::error::AppError;
use crate::infrastructure::staging::StagedUpload;
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

const FILE_FIELD: &str = "file";

/// Multipart form accepted by `POST /upload`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    /// CSV file whose first row holds the field names
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "All rows committed", body = UploadResponse),
        (status = 400, description = "No file uploaded", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Parse or insert failure, nothing committed", body = ErrorResponse)
    ),
    tag = "import"
)]
pub async fn upload_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // A body that is not multipart at all cannot carry a file either.
    let Ok(mut multipart) = multipart else {
        return Err(no_file());
    };

    let mut staged: Option<StagedUpload> = None;

    let received: Result<(), AppError> = async {
        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let is_file_part = field.name() == Some(FILE_FIELD) && field.file_name().is_some();
            if is_file_part && staged.is_none() {
                let reader = StreamReader::new(field.map_err(std::io::Error::other));
                let upload = state
                    .staging
                    .stage(reader)
                    .await
                    .map_err(staging_error)?;
                tracing::debug!("📥 Staged upload at {}", upload.path().display());
                staged = Some(upload);
            } else {
                // Text fields (even one named `file`) and repeated files are
                // read and discarded.
                while field.chunk().await.map_err(multipart_error)?.is_some() {}
            }
        }
        Ok(())
    }
    .await;

    // On error `staged` (if any) is dropped here, which deletes the file.
    received?;

    let upload = staged.ok_or_else(no_file)?;

    let outcome = state.import_service.import_file(&upload).await;
    upload.remove();

    let rows = outcome?;
    tracing::info!("📦 Imported {} users", rows);

    Ok(Json(UploadResponse {
        message: "Data uploaded successfully".to_string(),
    }))
}

fn no_file() -> AppError {
    AppError::BadRequest("No file uploaded".to_string())
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::Internal(format!("Failed to receive upload: {}", e))
    }
}

/// Body errors surface from the staging copy wrapped in `io::Error`.
fn staging_error(e: std::io::Error) -> AppError {
    let too_large = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .is_some_and(|m| m.status() == StatusCode::PAYLOAD_TOO_LARGE);

    if too_large {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::Internal(format!("Failed to stage upload: {}", e))
    }
}
