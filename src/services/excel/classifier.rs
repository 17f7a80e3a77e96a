use super::normalizer::normalize_value;
use super::types::{CellValue, ColumnType};
use rayon::prelude::*;

/// Share of non-null values (in percent) at which a type wins outright.
pub const DOMINANCE_THRESHOLD_PERCENT: usize = 90;

/// Order in which types are checked against the dominance threshold.
pub const DOMINANCE_ORDER: [ColumnType; 4] = [
    ColumnType::Numeric,
    ColumnType::Boolean,
    ColumnType::Date,
    ColumnType::String,
];

/// Order used to break plurality ties: the earliest type wins.
pub const PLURALITY_ORDER: [ColumnType; 4] = [
    ColumnType::Numeric,
    ColumnType::String,
    ColumnType::Boolean,
    ColumnType::Date,
];

/// Type reported for columns without a single non-null value.
pub const DEFAULT_COLUMN_TYPE: ColumnType = ColumnType::String;

/// Per-type tally over the non-null values of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeDistribution {
    numeric: usize,
    string: usize,
    boolean: usize,
    date: usize,
}

impl TypeDistribution {
    pub fn from_values(values: &[CellValue]) -> Self {
        values
            .par_iter()
            .fold(TypeDistribution::default, |mut tally, value| {
                tally.observe(value);
                tally
            })
            .reduce(TypeDistribution::default, TypeDistribution::merge)
    }

    pub fn observe(&mut self, value: &CellValue) {
        if let Some(column_type) = value.column_type() {
            self.record(column_type);
        }
    }

    pub fn record(&mut self, column_type: ColumnType) {
        match column_type {
            ColumnType::Numeric => self.numeric += 1,
            ColumnType::String => self.string += 1,
            ColumnType::Boolean => self.boolean += 1,
            ColumnType::Date => self.date += 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            numeric: self.numeric + other.numeric,
            string: self.string + other.string,
            boolean: self.boolean + other.boolean,
            date: self.date + other.date,
        }
    }

    pub fn count(&self, column_type: ColumnType) -> usize {
        match column_type {
            ColumnType::Numeric => self.numeric,
            ColumnType::String => self.string,
            ColumnType::Boolean => self.boolean,
            ColumnType::Date => self.date,
        }
    }

    pub fn total(&self) -> usize {
        self.numeric + self.string + self.boolean + self.date
    }

    pub fn percentage(&self, column_type: ColumnType) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(column_type) as f64 * 100.0 / total as f64,
        }
    }

    // Compared on counts so that e.g. 9 of 10 is exactly 90%.
    pub fn is_dominant(&self, column_type: ColumnType) -> bool {
        let total = self.total();
        total > 0 && self.count(column_type) * 100 >= DOMINANCE_THRESHOLD_PERCENT * total
    }

    pub fn dominant_type(&self) -> Option<ColumnType> {
        DOMINANCE_ORDER
            .into_iter()
            .find(|column_type| self.is_dominant(*column_type))
    }

    pub fn plurality_type(&self) -> ColumnType {
        PLURALITY_ORDER
            .into_iter()
            .fold(None, |best: Option<ColumnType>, candidate| match best {
                Some(current) if self.count(candidate) <= self.count(current) => Some(current),
                _ => Some(candidate),
            })
            .unwrap_or(DEFAULT_COLUMN_TYPE)
    }

    pub fn decide(&self) -> ColumnType {
        if self.total() == 0 {
            return DEFAULT_COLUMN_TYPE;
        }
        self.dominant_type()
            .unwrap_or_else(|| self.plurality_type())
    }
}

/// Declared type of a column of normalized values.
pub fn classify(values: &[CellValue]) -> ColumnType {
    TypeDistribution::from_values(values).decide()
}

/// Declared type of column `index` across decoded `rows`. Each cell is
/// normalized before it is counted; short rows count as null.
pub fn classify_column(rows: &[Vec<CellValue>], index: usize) -> ColumnType {
    rows.iter()
        .filter_map(|row| row.get(index))
        .map(normalize_value)
        .fold(TypeDistribution::default(), |mut tally, value| {
            tally.observe(&value);
            tally
        })
        .decide()
}
