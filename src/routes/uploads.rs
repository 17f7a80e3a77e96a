use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::ALLOWED_MIME_TYPES,
    error::AppError,
    models::{DataSetRecord, FileUploadRecord, NewFileUpload, UploadResponse},
    services::{
        chart::suggest_chart,
        dataset_store::DatasetStore,
        excel::ingest_path,
        upload::TempUpload,
    },
    AppState,
};

/// Multipart field carrying the spreadsheet.
pub const UPLOAD_FIELD: &str = "excelFile";

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/api/upload/excel", post(upload_excel))
        .route("/api/uploads/:id", get(get_upload))
        .route("/api/datasets/:id", get(get_dataset))
        .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD))
        .layer(cors)
}

struct ReceivedFile {
    original_name: String,
    data: Bytes,
}

async fn upload_excel(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let start = Instant::now();

    let received = read_excel_field(&mut multipart, state.config.max_file_size).await?;
    tracing::info!(
        "Received upload {}, size: {}KB",
        received.original_name,
        received.data.len() / 1024
    );

    let spooled = TempUpload::create(&state.config.upload_dir, &received.original_name, &received.data)?;
    drop(received);

    let store = Arc::clone(&state.store);
    let preview_rows = state.config.preview_rows;
    let response = tokio::task::spawn_blocking(move || process_upload(spooled, &store, preview_rows))
        .await
        .map_err(|e| AppError::Internal(format!("Ingestion task failed: {}", e)))??;

    tracing::info!(
        "Upload {} processed in {:?}: {} sheets, default sheet {}",
        response.file_id,
        start.elapsed(),
        response.total_sheets,
        response.default_sheet_index
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// Ingests a spooled upload, releases it, and persists the result.
pub fn process_upload(
    upload: TempUpload,
    store: &DatasetStore,
    preview_rows: usize,
) -> Result<UploadResponse, AppError> {
    let ingested = ingest_path(upload.path());

    let new_upload = NewFileUpload {
        filename: upload.file_name(),
        original_name: upload.original_name().to_string(),
        file_size: upload.size(),
    };
    if let Err(e) = upload.release() {
        tracing::warn!("Failed to remove spooled upload {}: {}", new_upload.filename, e);
    }

    let workbook = ingested?;
    let saved = store.save_upload(&new_upload, &workbook)?;
    let suggested_chart = workbook
        .default_sheet()
        .and_then(|sheet| suggest_chart(&sheet.column_types));

    Ok(UploadResponse::new(saved, &workbook, preview_rows, suggested_chart))
}

async fn read_excel_field(
    multipart: &mut Multipart,
    max_file_size: usize,
) -> Result<ReceivedFile, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        validate_content_type(field.content_type())?;
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        check_file_size(data.len(), max_file_size)?;

        return Ok(ReceivedFile {
            original_name,
            data,
        });
    }

    Err(AppError::InvalidInput(
        "Please provide an excel file to proceed.".to_string(),
    ))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(err.body_text())
    }
}

pub fn validate_content_type(content_type: Option<&str>) -> Result<(), AppError> {
    let essence = content_type.map(|ct| {
        ct.split(';')
            .next()
            .unwrap_or(ct)
            .trim()
            .to_ascii_lowercase()
    });

    match essence {
        Some(mime) if ALLOWED_MIME_TYPES.contains(&mime.as_str()) => Ok(()),
        other => Err(AppError::WrongFileType(format!(
            "Uploaded file must be an Excel spreadsheet (.xls or .xlsx), got {}",
            other.as_deref().unwrap_or("no content type")
        ))),
    }
}

pub fn check_file_size(len: usize, max_file_size: usize) -> Result<(), AppError> {
    if len > max_file_size {
        return Err(AppError::FileTooLarge(format!(
            "File is {} bytes, the limit is {} bytes",
            len, max_file_size
        )));
    }
    Ok(())
}

async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<FileUploadRecord>, AppError> {
    state
        .store
        .get_upload(id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("upload {}", id)))
}

async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DataSetRecord>, AppError> {
    state
        .store
        .get_dataset(id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("dataset {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn accepts_both_excel_content_types() {
        assert!(validate_content_type(Some("application/vnd.ms-excel")).is_ok());
        assert!(validate_content_type(Some(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        ))
        .is_ok());
        assert!(validate_content_type(Some("Application/Vnd.MS-Excel; charset=binary")).is_ok());
    }

    #[test]
    fn rejects_other_content_types() {
        for content_type in [Some("text/csv"), Some("application/pdf"), None] {
            let err = validate_content_type(content_type).unwrap_err();
            assert_eq!(err.code(), "WRONG_TYPE");
        }
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        assert!(check_file_size(10, 10).is_ok());
        assert_eq!(check_file_size(11, 10).unwrap_err().code(), "LIMIT_FILE_SIZE");
    }

    #[test]
    fn undecodable_upload_is_rejected_and_released() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::in_memory().unwrap();
        let upload = TempUpload::create(dir.path(), "broken.xlsx", b"not a workbook").unwrap();
        let path = upload.path().to_path_buf();

        let err = process_upload(upload, &store, 10).unwrap_err();
        assert_eq!(err.code(), "UNPARSABLE_FILE");
        assert!(!path.exists());
        assert!(store.get_upload(1).unwrap().is_none());
    }
}
