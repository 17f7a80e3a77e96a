use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Largest integral magnitude an f64 can carry without losing precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// One decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDateTime),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// The column type this value votes for, `None` for nulls.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            CellValue::Number(_) => Some(ColumnType::Numeric),
            CellValue::Bool(_) => Some(ColumnType::Boolean),
            CellValue::Str(_) => Some(ColumnType::String),
            CellValue::Date(_) => Some(ColumnType::Date),
            CellValue::Null => None,
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER
}

pub fn format_date(dt: &NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Str(s) => f.write_str(s),
            CellValue::Date(dt) => f.write_str(&format_date(dt)),
            CellValue::Null => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) | CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Str(s) => serializer.serialize_str(s),
            CellValue::Date(dt) => serializer.collect_str(&format_date(dt)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    String,
    Boolean,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// One sheet as a header row plus decoded data rows.
///
/// `column_types` is parallel to `headers`, and every row holds exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub column_types: Vec<ColumnTypeInfo>,
    pub rows: Vec<Vec<CellValue>>,
    pub total_rows: usize,
}

impl SheetData {
    pub fn empty(sheet_name: &str) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            headers: Vec::new(),
            column_types: Vec::new(),
            rows: Vec::new(),
            total_rows: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }

    /// The UI-facing subset: schema plus the first `limit` rows.
    pub fn preview(&self, limit: usize) -> SheetPreview {
        SheetPreview {
            sheet_name: self.sheet_name.clone(),
            headers: self.headers.clone(),
            column_types: self.column_types.clone(),
            data: self.rows.iter().take(limit).cloned().collect(),
            total_rows: self.total_rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPreview {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub column_types: Vec<ColumnTypeInfo>,
    pub data: Vec<Vec<CellValue>>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookResult {
    pub sheet_names: Vec<String>,
    pub sheets: Vec<SheetData>,
    pub total_sheets: usize,
    pub default_sheet_index: usize,
}

impl WorkbookResult {
    pub fn new(sheet_names: Vec<String>, sheets: Vec<SheetData>) -> Self {
        let default_sheet_index = sheets
            .iter()
            .position(|sheet| sheet.total_rows > 0)
            .unwrap_or(0);

        Self {
            total_sheets: sheet_names.len(),
            sheet_names,
            sheets,
            default_sheet_index,
        }
    }

    pub fn default_sheet(&self) -> Option<&SheetData> {
        self.sheets.get(self.default_sheet_index)
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|sheet| sheet.sheet_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn sheet_with_rows(name: &str, total_rows: usize) -> SheetData {
        SheetData {
            sheet_name: name.to_string(),
            headers: vec!["a".to_string()],
            column_types: vec![ColumnTypeInfo {
                name: "a".to_string(),
                column_type: ColumnType::Numeric,
            }],
            rows: (0..total_rows).map(|i| vec![CellValue::Number(i as f64)]).collect(),
            total_rows,
        }
    }

    #[test]
    fn default_sheet_is_first_with_rows() {
        let result = WorkbookResult::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![SheetData::empty("a"), SheetData::empty("b"), sheet_with_rows("c", 2)],
        );
        assert_eq!(result.default_sheet_index, 2);
        assert_eq!(result.total_sheets, 3);
        assert_eq!(result.default_sheet().map(|s| s.sheet_name.as_str()), Some("c"));
    }

    #[test]
    fn default_sheet_falls_back_to_zero() {
        let result = WorkbookResult::new(
            vec!["a".into(), "b".into()],
            vec![SheetData::empty("a"), SheetData::empty("b")],
        );
        assert_eq!(result.default_sheet_index, 0);
    }

    #[test]
    fn cell_values_serialize_as_plain_json() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let with_time = NaiveDate::from_ymd_opt(2023, 1, 5)
            .and_then(|d| d.and_hms_opt(13, 30, 0))
            .unwrap();
        let row = vec![
            CellValue::Number(3.0),
            CellValue::Number(2.5),
            CellValue::Bool(true),
            CellValue::Str("x".into()),
            CellValue::Date(date),
            CellValue::Date(with_time),
            CellValue::Null,
        ];
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!([3, 2.5, true, "x", "2023-01-05", "2023-01-05T13:30:00", null])
        );
    }

    #[test]
    fn sheet_serializes_with_camel_case_fields() {
        let value = serde_json::to_value(sheet_with_rows("Sales", 1)).unwrap();
        assert_eq!(value["sheetName"], "Sales");
        assert_eq!(value["columnTypes"][0], json!({"name": "a", "type": "numeric"}));
        assert_eq!(value["totalRows"], 1);
    }

    #[test]
    fn preview_truncates_rows_but_keeps_total() {
        let preview = sheet_with_rows("s", 10).preview(3);
        assert_eq!(preview.data.len(), 3);
        assert_eq!(preview.total_rows, 10);
    }
}
