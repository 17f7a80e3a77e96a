use super::classifier::classify_column;
use super::normalizer::decode;
use super::types::{CellValue, ColumnTypeInfo, SheetData};
use calamine::{Data, Reader, Sheets};
use rand::Rng;
use rayon::prelude::*;
use std::collections::HashSet;
use std::io::{Read, Seek};

pub const PLACEHOLDER_PREFIX: &str = "Column";
const PLACEHOLDER_SUFFIX_LEN: usize = 5;
const PLACEHOLDER_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Decodes one sheet of an open workbook. Decode errors are returned as-is
/// for the caller to treat as fatal.
pub fn extract_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet_name: &str,
) -> Result<SheetData, calamine::Error> {
    let range = workbook.worksheet_range(sheet_name)?;
    let (height, width) = range.get_size();
    tracing::debug!("Sheet {} spans {} rows x {} columns", sheet_name, height, width);

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    Ok(build_sheet(sheet_name, &rows))
}

/// Builds a [`SheetData`] from row-major raw cells, the first row being the
/// header row.
pub fn build_sheet(sheet_name: &str, raw_rows: &[Vec<Data>]) -> SheetData {
    let Some((header_row, data_rows)) = raw_rows.split_first() else {
        tracing::warn!("Sheet {} is empty", sheet_name);
        return SheetData::empty(sheet_name);
    };

    let width = raw_rows.iter().map(Vec::len).max().unwrap_or(0);
    let headers = resolve_headers(header_row, width);

    let rows: Vec<Vec<CellValue>> = data_rows
        .par_iter()
        .map(|row| decode_row(row, width))
        .collect();

    let column_types: Vec<ColumnTypeInfo> = headers
        .par_iter()
        .enumerate()
        .map(|(idx, name)| ColumnTypeInfo {
            name: name.clone(),
            column_type: classify_column(&rows, idx),
        })
        .collect();

    tracing::debug!(
        "Sheet {}: {} columns, {} data rows",
        sheet_name,
        headers.len(),
        rows.len()
    );

    SheetData {
        sheet_name: sheet_name.to_string(),
        total_rows: rows.len(),
        headers,
        column_types,
        rows,
    }
}

/// Pads (or trims) a raw row to `width` decoded cells.
fn decode_row(row: &[Data], width: usize) -> Vec<CellValue> {
    let mut cells: Vec<CellValue> = row.iter().take(width).map(decode).collect();
    cells.resize(width, CellValue::Null);
    cells
}

/// Text headers are only trimmed; other cells use their display form.
fn header_label(cell: &Data) -> Option<String> {
    let label = match cell {
        Data::String(s) => s.trim().to_string(),
        other => decode(other).to_string().trim().to_string(),
    };
    (!label.is_empty()).then_some(label)
}

/// Header labels for `width` columns. Blank header cells get a generated
/// placeholder that does not collide with any other header in the sheet.
pub fn resolve_headers(header_row: &[Data], width: usize) -> Vec<String> {
    let labels: Vec<Option<String>> = (0..width)
        .map(|idx| header_row.get(idx).and_then(header_label))
        .collect();

    let mut namer = PlaceholderNamer::new(labels.iter().flatten().cloned());
    labels
        .into_iter()
        .map(|label| label.unwrap_or_else(|| namer.next_name()))
        .collect()
}

/// Hands out `Column<suffix>` names with a random base-36 suffix, retrying
/// until the name is unused.
struct PlaceholderNamer {
    taken: HashSet<String>,
}

impl PlaceholderNamer {
    fn new(existing: impl IntoIterator<Item = String>) -> Self {
        Self {
            taken: existing.into_iter().collect(),
        }
    }

    fn next_name(&mut self) -> String {
        let mut rng = rand::rng();
        loop {
            let suffix: String = (0..PLACEHOLDER_SUFFIX_LEN)
                .map(|_| PLACEHOLDER_ALPHABET[rng.random_range(0..PLACEHOLDER_ALPHABET.len())] as char)
                .collect();
            let name = format!("{}{}", PLACEHOLDER_PREFIX, suffix);
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::types::ColumnType;

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn is_placeholder(name: &str) -> bool {
        name.len() == PLACEHOLDER_PREFIX.len() + PLACEHOLDER_SUFFIX_LEN
            && name.starts_with(PLACEHOLDER_PREFIX)
    }

    #[test]
    fn first_row_becomes_trimmed_headers() {
        let rows = vec![
            vec![s("  Region "), s("Revenue"), Data::Int(2024)],
            vec![s("North"), Data::Float(10.5), Data::Bool(true)],
        ];
        let sheet = build_sheet("Sales", &rows);
        assert_eq!(sheet.headers, ["Region", "Revenue", "2024"]);
        assert_eq!(sheet.total_rows, 1);
        assert_eq!(
            sheet.rows[0],
            vec![CellValue::Str("North".into()), CellValue::Number(10.5), CellValue::Bool(true)]
        );
    }

    #[test]
    fn text_headers_are_kept_verbatim() {
        let rows = vec![
            vec![s("TRUE"), s("007"), s(" 01/02/2023 "), s("1.50")],
            vec![Data::Int(1), Data::Int(2), Data::Int(3), Data::Int(4)],
        ];
        let sheet = build_sheet("Labels", &rows);
        assert_eq!(sheet.headers, ["TRUE", "007", "01/02/2023", "1.50"]);
        assert_eq!(sheet.column_types[1].name, "007");
    }

    #[test]
    fn data_cells_keep_their_text_while_columns_classify_on_meaning() {
        let rows = vec![
            vec![s("code"), s("flag"), s("when")],
            vec![s("007"), s("TRUE"), s("Jan 5, 2023")],
            vec![s("1e3"), s("false"), s("2023-02-01")],
        ];
        let sheet = build_sheet("Codes", &rows);
        assert_eq!(
            sheet.rows[0],
            vec![
                CellValue::Str("007".into()),
                CellValue::Str("TRUE".into()),
                CellValue::Str("Jan 5, 2023".into()),
            ]
        );
        assert_eq!(sheet.rows[1][0], CellValue::Str("1e3".into()));
        let types: Vec<ColumnType> = sheet.column_types.iter().map(|c| c.column_type).collect();
        assert_eq!(types, [ColumnType::Numeric, ColumnType::Boolean, ColumnType::Date]);
    }

    #[test]
    fn columns_are_classified_independently() {
        let rows = vec![
            vec![s("id"), s("name"), s("active"), s("joined")],
            vec![Data::Int(1), s("Ann"), s("TRUE"), s("2023-01-01")],
            vec![Data::Int(2), s("Bob"), s("false"), s("2023-02-01")],
            vec![s("3"), s("Cy"), Data::Bool(true), s("2023-03-01")],
        ];
        let sheet = build_sheet("People", &rows);
        let types: Vec<ColumnType> = sheet.column_types.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            [ColumnType::Numeric, ColumnType::String, ColumnType::Boolean, ColumnType::Date]
        );
        assert_eq!(sheet.column_types[1].name, "name");
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let rows = vec![
            vec![s("a"), s("b"), s("c")],
            vec![Data::Int(1)],
            vec![Data::Int(2), s("x"), Data::Empty],
        ];
        let sheet = build_sheet("Ragged", &rows);
        assert!(sheet.rows.iter().all(|row| row.len() == sheet.headers.len()));
        assert_eq!(sheet.rows[0], vec![CellValue::Number(1.0), CellValue::Null, CellValue::Null]);
        assert_eq!(sheet.column_types[2].column_type, ColumnType::String);
    }

    #[test]
    fn blank_headers_get_unique_placeholders() {
        let rows = vec![
            vec![s("a"), Data::Empty, s("   "), s(""), s("d")],
            vec![Data::Int(1), Data::Int(2), Data::Int(3), Data::Int(4), Data::Int(5)],
        ];
        let sheet = build_sheet("Blanks", &rows);
        assert_eq!(sheet.headers[0], "a");
        assert_eq!(sheet.headers[4], "d");
        for name in &sheet.headers[1..4] {
            assert!(is_placeholder(name), "{name}");
        }
        let unique: HashSet<&String> = sheet.headers.iter().collect();
        assert_eq!(unique.len(), sheet.headers.len());
        assert_eq!(sheet.column_types.len(), sheet.headers.len());
    }

    #[test]
    fn columns_wider_than_the_header_row_get_placeholders() {
        let rows = vec![
            vec![s("only")],
            vec![Data::Int(1), Data::Int(2)],
        ];
        let sheet = build_sheet("Wide", &rows);
        assert_eq!(sheet.headers.len(), 2);
        assert!(is_placeholder(&sheet.headers[1]));
        assert_eq!(sheet.column_types[1].column_type, ColumnType::Numeric);
    }

    #[test]
    fn placeholders_avoid_existing_names() {
        let mut namer = PlaceholderNamer::new(vec!["Columnabcde".to_string()]);
        let names: HashSet<String> = (0..500).map(|_| namer.next_name()).collect();
        assert_eq!(names.len(), 500);
        assert!(!names.contains("Columnabcde"));
    }

    #[test]
    fn sheet_without_rows_is_empty_not_an_error() {
        let sheet = build_sheet("Nothing", &[]);
        assert_eq!(sheet, SheetData::empty("Nothing"));
        assert_eq!(sheet.total_rows, 0);
    }

    #[test]
    fn header_only_sheet_keeps_headers() {
        let sheet = build_sheet("Schema", &[vec![s("a"), s("b")]]);
        assert_eq!(sheet.headers, ["a", "b"]);
        assert_eq!(sheet.total_rows, 0);
        assert!(sheet
            .column_types
            .iter()
            .all(|c| c.column_type == ColumnType::String));
    }
}
