use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{DataSetRecord, FileUploadRecord, NewFileUpload, SavedUpload};
use crate::services::excel::{ColumnTypeInfo, WorkbookResult};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS file_uploads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        original_name TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        sheet_names TEXT NOT NULL,
        default_sheet_index INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS data_sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_upload_id INTEGER NOT NULL REFERENCES file_uploads(id) ON DELETE CASCADE,
        sheet_index INTEGER NOT NULL,
        sheet_name TEXT NOT NULL,
        headers TEXT NOT NULL,
        column_types TEXT NOT NULL,
        data TEXT NOT NULL,
        total_rows INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_data_sets_upload ON data_sets(file_upload_id);
";

/// SQLite persistence for ingested workbooks: one `file_uploads` row per
/// upload with one `data_sets` row per sheet.
pub struct DatasetStore {
    conn: Mutex<Connection>,
}

struct RawDataSet {
    id: i64,
    file_upload_id: i64,
    sheet_index: i64,
    sheet_name: String,
    headers: String,
    column_types: String,
    data: String,
    total_rows: i64,
    created_at: String,
}

impl DatasetStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        info!("Opening dataset store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, AppError> {
        debug!("Opening in-memory dataset store");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persists the upload and all of its sheets in one transaction.
    pub fn save_upload(
        &self,
        upload: &NewFileUpload,
        workbook: &WorkbookResult,
    ) -> Result<SavedUpload, AppError> {
        let created_at = Utc::now().to_rfc3339();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO file_uploads (filename, original_name, file_size, sheet_names, default_sheet_index, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                upload.filename,
                upload.original_name,
                upload.file_size as i64,
                serde_json::to_string(&workbook.sheet_names)?,
                workbook.default_sheet_index as i64,
                created_at,
            ],
        )?;
        let file_id = tx.last_insert_rowid();

        let mut data_set_ids = Vec::with_capacity(workbook.sheets.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO data_sets (file_upload_id, sheet_index, sheet_name, headers, column_types, data, total_rows, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (sheet_index, sheet) in workbook.sheets.iter().enumerate() {
                stmt.execute(params![
                    file_id,
                    sheet_index as i64,
                    sheet.sheet_name,
                    serde_json::to_string(&sheet.headers)?,
                    serde_json::to_string(&sheet.column_types)?,
                    serde_json::to_string(&sheet.rows)?,
                    sheet.total_rows as i64,
                    created_at,
                ])?;
                data_set_ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;

        info!(
            "Saved upload {} ({}) with {} data sets",
            file_id,
            upload.original_name,
            data_set_ids.len()
        );
        Ok(SavedUpload {
            file_id,
            data_set_ids,
        })
    }

    pub fn get_upload(&self, id: i64) -> Result<Option<FileUploadRecord>, AppError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, filename, original_name, file_size, sheet_names, default_sheet_index, created_at
                 FROM file_uploads WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, filename, original_name, file_size, sheet_names, default_sheet_index, created_at)) = row
        else {
            debug!("Upload {} not found", id);
            return Ok(None);
        };

        let mut stmt =
            conn.prepare("SELECT id FROM data_sets WHERE file_upload_id = ?1 ORDER BY sheet_index")?;
        let data_set_ids = stmt
            .query_map(params![id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(FileUploadRecord {
            id,
            filename,
            original_name,
            file_size: file_size as u64,
            sheet_names: serde_json::from_str(&sheet_names)?,
            default_sheet_index: default_sheet_index as usize,
            data_set_ids,
            created_at,
        }))
    }

    pub fn get_dataset(&self, id: i64) -> Result<Option<DataSetRecord>, AppError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT id, file_upload_id, sheet_index, sheet_name, headers, column_types, data, total_rows, created_at
                 FROM data_sets WHERE id = ?1",
                params![id],
                read_raw_data_set,
            )
            .optional()?;

        raw.map(RawDataSet::into_record).transpose()
    }

    pub fn list_datasets(&self, file_upload_id: i64) -> Result<Vec<DataSetRecord>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, file_upload_id, sheet_index, sheet_name, headers, column_types, data, total_rows, created_at
             FROM data_sets WHERE file_upload_id = ?1 ORDER BY sheet_index",
        )?;
        let raws = stmt
            .query_map(params![file_upload_id], read_raw_data_set)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(RawDataSet::into_record).collect()
    }
}

fn read_raw_data_set(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDataSet> {
    Ok(RawDataSet {
        id: row.get(0)?,
        file_upload_id: row.get(1)?,
        sheet_index: row.get(2)?,
        sheet_name: row.get(3)?,
        headers: row.get(4)?,
        column_types: row.get(5)?,
        data: row.get(6)?,
        total_rows: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl RawDataSet {
    fn into_record(self) -> Result<DataSetRecord, AppError> {
        let column_types: Vec<ColumnTypeInfo> = serde_json::from_str(&self.column_types)?;
        Ok(DataSetRecord {
            id: self.id,
            file_upload_id: self.file_upload_id,
            sheet_index: self.sheet_index as usize,
            sheet_name: self.sheet_name,
            headers: serde_json::from_str(&self.headers)?,
            column_types,
            data: serde_json::from_str(&self.data)?,
            total_rows: self.total_rows as usize,
            created_at: self.created_at,
        })
    }
}
