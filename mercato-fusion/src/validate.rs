use serde::{Deserialize, Serialize};

use mercato_core::{Cell, DataTable, columns};

/// How strictly a fused table is checked before being handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValidationLevel {
    /// Non-empty and carries the identity columns.
    #[default]
    Basic,
    /// Basic, plus no non-positive close prices.
    Strict,
    /// Strict; reserved for future cross-field checks.
    Comprehensive,
}

/// Check `table` at the given level.
///
/// Returns the list of issues found; empty means the table passed. Failed
/// validation never discards data: callers attach the issues to the response
/// and let the consumer decide.
#[must_use]
pub fn validate_table(table: &DataTable, level: ValidationLevel) -> Vec<String> {
    let mut issues = Vec::new();

    if table.is_empty() {
        issues.push("table has no rows".to_owned());
    }
    for col in [columns::SYMBOL, columns::DATE] {
        if table.column_index(col).is_none() {
            issues.push(format!("missing identity column: {col}"));
        }
    }
    if level == ValidationLevel::Basic {
        return issues;
    }

    if table.column_index(columns::CLOSE).is_some() {
        let bad = (0..table.row_count())
            .filter(|&row| {
                table
                    .cell(row, columns::CLOSE)
                    .and_then(Cell::as_f64)
                    .is_some_and(|v| v <= 0.0)
            })
            .count();
        if bad > 0 {
            issues.push(format!("{bad} rows with non-positive close"));
        }
    }

    issues
}
