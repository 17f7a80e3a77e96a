use crate::services::excel::{ColumnType, ColumnTypeInfo};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Scatter,
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSuggestion {
    pub chart_type: ChartKind,
    pub x_axis: String,
    pub y_axis: String,
}

fn columns_of(columns: &[ColumnTypeInfo], column_type: ColumnType) -> impl Iterator<Item = &ColumnTypeInfo> {
    columns.iter().filter(move |c| c.column_type == column_type)
}

fn suggestion(chart_type: ChartKind, x: &ColumnTypeInfo, y: &ColumnTypeInfo) -> ChartSuggestion {
    ChartSuggestion {
        chart_type,
        x_axis: x.name.clone(),
        y_axis: y.name.clone(),
    }
}

/// Picks an initial chart and axes from a sheet's typed columns.
pub fn suggest_chart(columns: &[ColumnTypeInfo]) -> Option<ChartSuggestion> {
    let first = columns.first()?;

    let numeric: Vec<&ColumnTypeInfo> = columns_of(columns, ColumnType::Numeric).collect();
    let first_string = columns_of(columns, ColumnType::String).next();
    let first_date = columns_of(columns, ColumnType::Date).next();

    let chart = match (numeric.as_slice(), first_string, first_date) {
        ([x, y, ..], _, _) => suggestion(ChartKind::Scatter, x, y),
        ([y], Some(x), _) => suggestion(ChartKind::Bar, x, y),
        ([y], None, Some(x)) => suggestion(ChartKind::Line, x, y),
        _ => suggestion(ChartKind::Scatter, first, columns.get(1).unwrap_or(first)),
    };
    Some(chart)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, column_type: ColumnType) -> ColumnTypeInfo {
        ColumnTypeInfo {
            name: name.to_string(),
            column_type,
        }
    }

    #[test]
    fn two_numeric_columns_make_a_scatter() {
        let columns = [
            col("label", ColumnType::String),
            col("height", ColumnType::Numeric),
            col("weight", ColumnType::Numeric),
        ];
        let chart = suggest_chart(&columns).unwrap();
        assert_eq!(chart.chart_type, ChartKind::Scatter);
        assert_eq!((chart.x_axis.as_str(), chart.y_axis.as_str()), ("height", "weight"));
    }

    #[test]
    fn category_and_value_make_a_bar() {
        let columns = [
            col("when", ColumnType::Date),
            col("region", ColumnType::String),
            col("sales", ColumnType::Numeric),
        ];
        let chart = suggest_chart(&columns).unwrap();
        assert_eq!(chart.chart_type, ChartKind::Bar);
        assert_eq!((chart.x_axis.as_str(), chart.y_axis.as_str()), ("region", "sales"));
    }

    #[test]
    fn date_and_value_make_a_line() {
        let columns = [col("day", ColumnType::Date), col("visits", ColumnType::Numeric)];
        let chart = suggest_chart(&columns).unwrap();
        assert_eq!(chart.chart_type, ChartKind::Line);
        assert_eq!((chart.x_axis.as_str(), chart.y_axis.as_str()), ("day", "visits"));
    }

    #[test]
    fn fallback_uses_the_first_two_columns() {
        let columns = [col("a", ColumnType::String), col("b", ColumnType::Boolean)];
        let chart = suggest_chart(&columns).unwrap();
        assert_eq!(chart.chart_type, ChartKind::Scatter);
        assert_eq!((chart.x_axis.as_str(), chart.y_axis.as_str()), ("a", "b"));

        let single = suggest_chart(&[col("only", ColumnType::String)]).unwrap();
        assert_eq!(single.y_axis, "only");
    }

    #[test]
    fn no_columns_no_chart() {
        assert_eq!(suggest_chart(&[]), None);
    }

    #[test]
    fn serializes_for_the_ui() {
        let chart = suggest_chart(&[col("d", ColumnType::Date), col("n", ColumnType::Numeric)]).unwrap();
        assert_eq!(
            serde_json::to_value(chart).unwrap(),
            serde_json::json!({"chartType": "line", "xAxis": "d", "yAxis": "n"})
        );
    }
}
