use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Shared blank cell for lookups past the end of a short row.
pub static EMPTY_CELL: CellValue = CellValue::Empty;

/// A single cell as held by the tabular store.
///
/// Dates are wall-clock values in the workbook time zone. They are never
/// shifted through UTC on the way in or out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Date { date: NaiveDateTime },
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn date(d: NaiveDate) -> Self {
        CellValue::Date {
            date: d.and_hms_opt(0, 0, 0).unwrap_or_default(),
        }
    }

    pub fn timestamp(t: NaiveDateTime) -> Self {
        CellValue::Date { date: t }
    }

    /// Blank means empty, or text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Plain-text rendering used for comparisons and error messages.
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Date { date } => date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Reads the cell as a date/time. Spreadsheet serial numbers are decoded;
    /// text is not parsed.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date { date } => Some(*date),
            CellValue::Number(n) => serial_to_datetime(*n),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Spreadsheet serial day numbers count from 1899-12-30.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_decodes_date_and_time() {
        let dt = serial_to_datetime(45731.5).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-03-15 12:00:00");
    }

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::text("   ").is_blank());
        assert!(!CellValue::Bool(false).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_display_integral_number_has_no_fraction() {
        assert_eq!(CellValue::Number(120000.0).as_display(), "120000");
        assert_eq!(CellValue::Number(1.5).as_display(), "1.5");
    }

    #[test]
    fn test_seed_json_shapes() {
        let cells: Vec<CellValue> =
            serde_json::from_str(r#"[null, true, 3, "abc", {"date": "2025-03-15T00:00:00"}]"#)
                .unwrap();
        assert_eq!(cells[0], CellValue::Empty);
        assert_eq!(cells[1], CellValue::Bool(true));
        assert_eq!(cells[2], CellValue::Number(3.0));
        assert_eq!(cells[3], CellValue::text("abc"));
        assert_eq!(
            cells[4],
            CellValue::date(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
        );
    }
}
