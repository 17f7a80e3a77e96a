pub mod classifier;
pub mod extractor;
pub mod ingest;
pub mod normalizer;
pub mod types;

pub use classifier::classify;
pub use extractor::extract_sheet;
pub use ingest::{ingest, ingest_path, IngestError};
pub use normalizer::normalize;
pub use types::{CellValue, ColumnType, ColumnTypeInfo, SheetData, SheetPreview, WorkbookResult};
