use serde::{Deserialize, Serialize};

/// Well-known column names shared by adapters and the fusion engine.
pub mod columns {
    /// Instrument symbol column.
    pub const SYMBOL: &str = "symbol";
    /// Observation date column (ISO-8601 date or datetime string).
    pub const DATE: &str = "date";
    /// Opening price.
    pub const OPEN: &str = "open";
    /// High price.
    pub const HIGH: &str = "high";
    /// Low price.
    pub const LOW: &str = "low";
    /// Closing price.
    pub const CLOSE: &str = "close";
    /// Traded volume.
    pub const VOLUME: &str = "volume";
    /// Percent change versus the previous observation.
    pub const PCT_CHANGE: &str = "pct_change";
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Cell {
    /// Missing value.
    Null,
    /// Integer value (counts, volumes).
    Int(i64),
    /// Floating point value (prices, ratios).
    Float(f64),
    /// Text value (symbols, dates, names).
    Text(String),
}

impl Cell {
    /// Numeric view of the cell, if it holds a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => {
                // i64 -> f64 may round for very large magnitudes; volumes and
                // prices stay far below the 2^53 mantissa limit.
                #[allow(clippy::cast_precision_loss)]
                Some(*v as f64)
            }
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the cell, if it holds text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True when the cell is missing.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Provider-neutral column-oriented payload.
///
/// Every adapter returns its data in this shape so the fusion engine and the
/// cache never see provider-specific structures. Rows are ordered; columns
/// are named and shared across all rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataTable {
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Rows; each row has exactly `columns.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Build a table from column names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Rows shorter than the header are padded with nulls;
    /// longer rows are truncated.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    /// Index of a named column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `(row, column-name)`.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    /// Number of null cells.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.iter().filter(|c| c.is_null()).count())
            .sum()
    }

    /// Identity key for a row: its `(symbol, date)` pair as text.
    ///
    /// Tables without both identity columns key rows by position instead, so
    /// single-symbol snapshot tables still fuse deterministically.
    #[must_use]
    pub fn row_key(&self, row: usize) -> (String, String) {
        let text = |col: &str| {
            self.cell(row, col)
                .and_then(Cell::as_text)
                .map(str::to_owned)
        };
        match (text(columns::SYMBOL), text(columns::DATE)) {
            (Some(symbol), Some(date)) => (symbol, date),
            _ => (String::new(), format!("#{row}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        let mut t = DataTable::new([columns::SYMBOL, columns::DATE, columns::CLOSE]);
        t.push_row(vec![
            Cell::Text("AAPL".into()),
            Cell::Text("2024-01-02".into()),
            Cell::Float(185.5),
        ]);
        t.push_row(vec![
            Cell::Text("AAPL".into()),
            Cell::Text("2024-01-03".into()),
            Cell::Null,
        ]);
        t
    }

    #[test]
    fn missing_count_counts_nulls() {
        let t = sample();
        assert_eq!(t.cell_count(), 6);
        assert_eq!(t.missing_count(), 1);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut t = DataTable::new(["a", "b", "c"]);
        t.push_row(vec![Cell::Int(1)]);
        assert_eq!(t.rows[0].len(), 3);
        assert!(t.rows[0][2].is_null());
    }

    #[test]
    fn row_key_uses_symbol_and_date() {
        let t = sample();
        assert_eq!(t.row_key(0), ("AAPL".into(), "2024-01-02".into()));
    }

    #[test]
    fn row_key_falls_back_to_position() {
        let mut t = DataTable::new(["value"]);
        t.push_row(vec![Cell::Float(1.0)]);
        assert_eq!(t.row_key(0), (String::new(), "#0".into()));
    }
}
