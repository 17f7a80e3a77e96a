use super::extractor::extract_sheet;
use super::types::{SheetData, WorkbookResult};
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Reader};
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unparsable file: {0}")]
    UnparsableFile(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes a whole workbook (legacy `.xls` or zipped-XML `.xlsx`) and types
/// every column of every sheet.
///
/// Any sheet that fails to decode aborts the whole ingestion; there is no
/// partial result.
pub fn ingest(file_data: impl Into<Bytes>) -> Result<WorkbookResult, IngestError> {
    let start = Instant::now();
    let file_data: Bytes = file_data.into();
    tracing::info!("Ingesting workbook of {}KB", file_data.len() / 1024);

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(file_data)).map_err(|e| {
        tracing::error!("Failed to open workbook: {}", e);
        IngestError::UnparsableFile(format!("Failed to open workbook: {}", e))
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        tracing::error!("Workbook contains no sheets");
        return Err(IngestError::UnparsableFile(
            "Workbook contains no sheets".to_string(),
        ));
    }
    tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let sheets = sheet_names
        .iter()
        .map(|sheet_name| {
            extract_sheet(&mut workbook, sheet_name).map_err(|e| {
                tracing::error!("Failed to read sheet {}: {}", sheet_name, e);
                IngestError::UnparsableFile(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })
        })
        .collect::<Result<Vec<SheetData>, IngestError>>()?;

    let result = WorkbookResult::new(sheet_names, sheets);
    tracing::info!(
        "Ingested {} sheets in {:?}, default sheet index {}",
        result.total_sheets,
        start.elapsed(),
        result.default_sheet_index
    );
    Ok(result)
}

pub fn ingest_path(path: &Path) -> Result<WorkbookResult, IngestError> {
    tracing::debug!("Reading workbook from {}", path.display());
    let file_data = std::fs::read(path)?;
    ingest(file_data)
}
