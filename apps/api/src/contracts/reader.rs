use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::WorkbookConfig;
use crate::contracts::models::{ContractsData, UnitUpStatus};
use crate::errors::AppError;
use crate::schema::{is_truthy, ColumnIndex, ContractField, Field};
use crate::store::cell::EMPTY_CELL;
use crate::store::{CellValue, TableStore};

/// Headers every listing depends on.
pub const LIST_FIELDS: &[ContractField] = &[
    ContractField::StaffName,
    ContractField::ContractEndDate,
    ContractField::Status,
    ContractField::TemplateType,
    ContractField::UnitUpRealized,
    ContractField::RegisteredAt,
    ContractField::LastUpdatedAt,
    ContractField::Completed,
];

const DATE_ONLY_FIELDS: &[ContractField] = &[
    ContractField::ContractStartDate,
    ContractField::ContractEndDate,
    ContractField::UnitUpReflectDate,
];

const TIMESTAMP_FIELDS: &[ContractField] =
    &[ContractField::RegisteredAt, ContractField::LastUpdatedAt];

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    DateOnly,
    Timestamp,
    Plain,
}

/// Lists every contract that is not completed.
///
/// Never fails: any error is reported through `ContractsData::error` with
/// empty data, so callers must check it before use.
pub async fn list_contracts(store: &dyn TableStore, workbook: &WorkbookConfig) -> ContractsData {
    match try_list_contracts(store, workbook).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Listing {} failed: {e}", workbook.contracts_table);
            ContractsData::failed(e.to_string())
        }
    }
}

async fn try_list_contracts(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
) -> Result<ContractsData, AppError> {
    let values = store.read_all(&workbook.contracts_table).await?;
    let Some((header_row, data_rows)) = values.split_first() else {
        return Ok(ContractsData::failed("No data"));
    };

    let index = ColumnIndex::from_header_row(header_row);
    let cols = index.require(LIST_FIELDS)?;
    let kinds = column_kinds(&index);
    let unit_up_col = cols.col(ContractField::UnitUpRealized)?;

    let mut rows = Vec::new();
    let mut row_numbers = Vec::new();

    for (offset, row) in data_rows.iter().enumerate() {
        if is_truthy(cols.cell(row, ContractField::Completed)) {
            continue;
        }

        // cells past the last header are kept as plain values
        let width = kinds.len().max(row.len());
        let rendered: Vec<Value> = (0..width)
            .map(|i| {
                let cell = row.get(i).unwrap_or(&EMPTY_CELL);
                if i == unit_up_col {
                    Value::String(UnitUpStatus::display_cell(cell))
                } else {
                    render_cell(cell, kinds.get(i).copied().unwrap_or(ColumnKind::Plain))
                }
            })
            .collect();

        rows.push(rendered);
        // header row is position 1, first data row is 2
        row_numbers.push(offset as u32 + 2);
    }

    debug!(
        "Listed {} active contracts out of {} rows",
        rows.len(),
        data_rows.len()
    );

    Ok(ContractsData {
        headers: index.headers().to_vec(),
        rows,
        row_numbers,
        error: String::new(),
    })
}

fn column_kinds(index: &ColumnIndex) -> Vec<ColumnKind> {
    let mut kinds = vec![ColumnKind::Plain; index.len()];
    for (fields, kind) in [
        (DATE_ONLY_FIELDS, ColumnKind::DateOnly),
        (TIMESTAMP_FIELDS, ColumnKind::Timestamp),
    ] {
        for f in fields {
            if let Some(i) = index.position(f.header()) {
                kinds[i] = kind;
            }
        }
    }
    kinds
}

fn render_cell(cell: &CellValue, kind: ColumnKind) -> Value {
    let dated = match (kind, cell) {
        (_, CellValue::Date { date }) => Some(*date),
        // Serial numbers only mean a date inside a date column.
        (ColumnKind::DateOnly | ColumnKind::Timestamp, CellValue::Number(_)) => cell.as_datetime(),
        _ => None,
    };
    if let Some(dt) = dated {
        return Value::String(format_datetime(dt, kind));
    }

    match cell {
        CellValue::Empty => Value::String(String::new()),
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Value::from(*n as i64),
        CellValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string())),
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Date { date } => Value::String(date.to_string()),
    }
}

/// Stored dates are already wall-clock values in the workbook zone, so only
/// the pattern depends on the column.
fn format_datetime(dt: NaiveDateTime, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::DateOnly => dt.format("%Y-%m-%d").to_string(),
        ColumnKind::Timestamp | ColumnKind::Plain => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}
