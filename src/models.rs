use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::services::chart::ChartSuggestion;
use crate::services::excel::{ColumnTypeInfo, SheetPreview, WorkbookResult};

/// Metadata of an upload about to be persisted.
#[derive(Debug, Clone)]
pub struct NewFileUpload {
    pub filename: String,
    pub original_name: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedUpload {
    pub file_id: i64,
    pub data_set_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadRecord {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_size: u64,
    pub sheet_names: Vec<String>,
    pub default_sheet_index: usize,
    pub data_set_ids: Vec<i64>,
    pub created_at: String,
}

/// One persisted sheet. Rows are kept as stored JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetRecord {
    pub id: i64,
    pub file_upload_id: i64,
    pub sheet_index: usize,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub column_types: Vec<ColumnTypeInfo>,
    pub data: JsonValue,
    pub total_rows: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_id: i64,
    pub data_set_ids: Vec<i64>,
    pub sheet_names: Vec<String>,
    pub total_sheets: usize,
    pub default_sheet_index: usize,
    pub sheets: Vec<SheetPreview>,
    pub suggested_chart: Option<ChartSuggestion>,
}

impl UploadResponse {
    pub fn new(
        saved: SavedUpload,
        workbook: &WorkbookResult,
        preview_rows: usize,
        suggested_chart: Option<ChartSuggestion>,
    ) -> Self {
        Self {
            message: "File uploaded and processed successfully".to_string(),
            file_id: saved.file_id,
            data_set_ids: saved.data_set_ids,
            sheet_names: workbook.sheet_names.clone(),
            total_sheets: workbook.total_sheets,
            default_sheet_index: workbook.default_sheet_index,
            sheets: workbook
                .sheets
                .iter()
                .map(|sheet| sheet.preview(preview_rows))
                .collect(),
            suggested_chart,
        }
    }
}
