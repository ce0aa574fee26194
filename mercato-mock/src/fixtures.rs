use chrono::NaiveDate;

use mercato_core::{Cell, DataTable, columns};

/// Deterministic per-symbol base price derived from the symbol's bytes.
fn base_close(symbol: &str) -> f64 {
    let sum: u32 = symbol.bytes().map(u32::from).sum();
    f64::from(50 + sum % 200)
}

/// Build a deterministic daily OHLCV table for the given symbols and range.
///
/// Without an explicit range, three consecutive business-agnostic days
/// starting 2024-01-02 are produced. Close prices walk upward by one unit per
/// day from a per-symbol base, shifted by `close_offset`.
#[must_use]
pub fn daily_table(
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    close_offset: f64,
) -> DataTable {
    let default_start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default();
    let start = start.unwrap_or(default_start);
    let end = end.unwrap_or_else(|| start + chrono::Duration::days(2));

    let mut table = DataTable::new([
        columns::SYMBOL,
        columns::DATE,
        columns::OPEN,
        columns::HIGH,
        columns::LOW,
        columns::CLOSE,
        columns::VOLUME,
        columns::PCT_CHANGE,
    ]);

    for symbol in symbols {
        let base = base_close(symbol) + close_offset;
        let mut day = start;
        let mut step = 0f64;
        while day <= end {
            let close = base + step;
            let open = close - 0.5;
            table.push_row(vec![
                Cell::Text(symbol.clone()),
                Cell::Text(day.to_string()),
                Cell::Float(open),
                Cell::Float(close + 0.5),
                Cell::Float(open - 0.5),
                Cell::Float(close),
                Cell::Int(1_000_000 + (step as i64) * 10_000),
                Cell::Float(if step == 0.0 { 0.0 } else { 100.0 * (1.0 / (close - 1.0)) }),
            ]);
            day += chrono::Duration::days(1);
            step += 1.0;
        }
    }
    table
}
