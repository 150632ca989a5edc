//! Read-only reference tables curated outside this service: Links and
//! Templates. Both readers fail softly with an `error` string.

pub mod collation;
pub mod handlers;
pub mod links;
pub mod templates;

use crate::store::CellValue;

/// Sort position used when `order` is blank or not a number.
pub const DEFAULT_ORDER: i64 = 999;

pub fn parse_order(cell: &CellValue) -> i64 {
    match cell {
        CellValue::Number(n) if n.is_finite() => n.trunc() as i64,
        CellValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|n| n.is_finite()).map(|n| n.trunc() as i64))
                .unwrap_or(DEFAULT_ORDER)
        }
        _ => DEFAULT_ORDER,
    }
}
