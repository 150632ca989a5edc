//! Mutating operations on the Contracts table.
//!
//! Every single-row writer validates its arguments, resolves headers and
//! checks guards before the first cell is written. Multi-cell updates are
//! issued one cell at a time and are not atomic.

use chrono::{NaiveDateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::WorkbookConfig;
use crate::contracts::models::{UnitUpStatus, STATUS_ACTIVE};
use crate::contracts::validation::{parse_amount, parse_ymd, row_position, unit_up_status};
use crate::errors::AppError;
use crate::schema::{is_truthy, ColumnIndex, Columns, ContractField, Field};
use crate::store::{CellValue, Rows, TableStore};

/// Display format applied to the price cell so it stays a grouped integer.
pub const PRICE_FORMAT: &str = "#,##0";

const ADD_FIELDS: &[ContractField] = &[
    ContractField::Id,
    ContractField::Status,
    ContractField::UnitUpRealized,
    ContractField::StaffName,
    ContractField::ContractEndDate,
    ContractField::TemplateType,
    ContractField::RegisteredAt,
    ContractField::LastUpdatedAt,
    ContractField::Completed,
];

const COMPLETE_FIELDS: &[ContractField] = &[ContractField::Completed, ContractField::LastUpdatedAt];

const UNIT_UP_FIELDS: &[ContractField] = &[
    ContractField::UnitUpRealized,
    ContractField::Completed,
    ContractField::LastUpdatedAt,
];

const REFLECT_FIELDS: &[ContractField] = &[
    ContractField::UnitUpRealized,
    ContractField::UnitUpReflectDate,
    ContractField::Completed,
    ContractField::LastUpdatedAt,
];

const REFLECT_AMOUNT_FIELDS: &[ContractField] = &[
    ContractField::UnitUpRealized,
    ContractField::UnitUpReflectDate,
    ContractField::UnitPrice,
    ContractField::Completed,
    ContractField::LastUpdatedAt,
];

/// Current wall-clock time in the workbook zone.
pub fn now_local(workbook: &WorkbookConfig) -> NaiveDateTime {
    Utc::now().with_timezone(&workbook.utc_offset).naive_local()
}

/// Appends a new ACTIVE contract and returns its generated id.
pub async fn add_contract(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    staff_name: &str,
    contract_end_date: &str,
    template_type: &str,
) -> Result<Uuid, AppError> {
    let staff_name = staff_name.trim();
    if staff_name.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "{} (staffName) must not be empty",
            ContractField::StaffName.header()
        )));
    }
    let end_date = parse_ymd(contract_end_date, ContractField::ContractEndDate.header())?;

    let header = store.read_header_row(&workbook.contracts_table).await?;
    let index = ColumnIndex::from_header_row(&header);
    let cols = index.require(ADD_FIELDS)?;

    let id = Uuid::new_v4();
    let now = now_local(workbook);

    let mut row = vec![CellValue::Empty; index.len()];
    let mut put = |field: ContractField, value: CellValue| -> Result<(), AppError> {
        row[cols.col(field)?] = value;
        Ok(())
    };
    put(ContractField::Id, CellValue::text(id.to_string()))?;
    put(ContractField::Status, CellValue::text(STATUS_ACTIVE))?;
    put(ContractField::UnitUpRealized, CellValue::text(UnitUpStatus::Pending.as_str()))?;
    put(ContractField::StaffName, CellValue::text(staff_name))?;
    put(ContractField::ContractEndDate, CellValue::date(end_date))?;
    put(ContractField::TemplateType, CellValue::text(template_type.trim()))?;
    put(ContractField::RegisteredAt, CellValue::timestamp(now))?;
    put(ContractField::LastUpdatedAt, CellValue::timestamp(now))?;
    put(ContractField::Completed, CellValue::Bool(false))?;

    store.append_row(&workbook.contracts_table, row).await?;
    info!("Added contract {id} for '{staff_name}' ending {end_date}");
    Ok(id)
}

/// Marks one row completed. Idempotent on already-completed rows.
pub async fn complete_contract(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    row: i64,
) -> Result<(), AppError> {
    let row = row_position(row)?;
    let (rows, index) = load(store, workbook).await?;
    let cols = index.require(COMPLETE_FIELDS)?;
    existing_row(&rows, row, workbook)?;

    mark_completed(store, workbook, &cols, row).await?;
    info!("Completed contract at row {row}");
    Ok(())
}

/// Marks several rows completed. Invalid or out-of-range positions are
/// dropped without error, duplicates are collapsed. Returns how many rows
/// were written.
pub async fn complete_contracts(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    positions: &[i64],
) -> Result<usize, AppError> {
    let (rows, index) = load(store, workbook).await?;
    let cols = index.require(COMPLETE_FIELDS)?;

    let mut targets: Vec<u32> = Vec::with_capacity(positions.len());
    for &p in positions {
        let Ok(row) = row_position(p) else { continue };
        if (row as usize) <= rows.len() && !targets.contains(&row) {
            targets.push(row);
        }
    }

    for &row in &targets {
        mark_completed(store, workbook, &cols, row).await?;
    }
    info!(
        "Completed {} of {} requested contract rows",
        targets.len(),
        positions.len()
    );
    Ok(targets.len())
}

/// Sets the unit-up outcome on a row that is not completed.
pub async fn set_unit_up_realized(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    row: i64,
    value: &str,
) -> Result<(), AppError> {
    let status = unit_up_status(value)?;
    let row = row_position(row)?;
    let (rows, index) = load(store, workbook).await?;
    let cols = index.require(UNIT_UP_FIELDS)?;
    let current = existing_row(&rows, row, workbook)?;
    ensure_open(&cols, current, row)?;

    let table = &workbook.contracts_table;
    store
        .write_cell(table, row, cols.col(ContractField::UnitUpRealized)?, CellValue::text(status.as_str()))
        .await?;
    touch(store, workbook, &cols, row).await?;
    info!("Set unit-up to {status} on row {row}");
    Ok(())
}

/// Sets the reflect date on a realized (〇) row that is not completed.
pub async fn set_unit_up_reflect_date(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    row: i64,
    reflect_date: &str,
) -> Result<(), AppError> {
    let date = parse_ymd(reflect_date, ContractField::UnitUpReflectDate.header())?;
    let row = row_position(row)?;
    let (rows, index) = load(store, workbook).await?;
    let cols = index.require(REFLECT_FIELDS)?;
    let current = existing_row(&rows, row, workbook)?;
    ensure_open(&cols, current, row)?;
    ensure_realized(&cols, current, ContractField::UnitUpReflectDate)?;

    store
        .write_cell(
            &workbook.contracts_table,
            row,
            cols.col(ContractField::UnitUpReflectDate)?,
            CellValue::date(date),
        )
        .await?;
    touch(store, workbook, &cols, row).await?;
    info!("Set reflect date {date} on row {row}");
    Ok(())
}

/// Sets the reflect date and the new unit price together. Returns the parsed
/// amount.
pub async fn set_unit_up_reflect_and_amount(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    row: i64,
    reflect_date: &str,
    amount: &str,
) -> Result<f64, AppError> {
    let date = parse_ymd(reflect_date, ContractField::UnitUpReflectDate.header())?;
    let price = parse_amount(amount)?;
    let row = row_position(row)?;
    let (rows, index) = load(store, workbook).await?;
    let cols = index.require(REFLECT_AMOUNT_FIELDS)?;
    let current = existing_row(&rows, row, workbook)?;
    ensure_open(&cols, current, row)?;
    ensure_realized(&cols, current, ContractField::UnitUpReflectDate)?;

    let table = &workbook.contracts_table;
    let price_col = cols.col(ContractField::UnitPrice)?;
    // Sequential writes; a failure part-way leaves the earlier cells written.
    store
        .write_cell(table, row, cols.col(ContractField::UnitUpReflectDate)?, CellValue::date(date))
        .await?;
    store
        .write_cell(table, row, price_col, CellValue::Number(price))
        .await?;
    store
        .set_number_format(table, row, price_col, PRICE_FORMAT)
        .await?;
    touch(store, workbook, &cols, row).await?;
    info!("Set reflect date {date} and unit price {price} on row {row}");
    Ok(price)
}

async fn load(store: &dyn TableStore, workbook: &WorkbookConfig) -> Result<(Rows, ColumnIndex), AppError> {
    let rows = store.read_all(&workbook.contracts_table).await?;
    let index = rows
        .first()
        .map(|h| ColumnIndex::from_header_row(h))
        .unwrap_or_default();
    Ok((rows, index))
}

fn existing_row<'a>(
    rows: &'a Rows,
    row: u32,
    workbook: &WorkbookConfig,
) -> Result<&'a [CellValue], AppError> {
    rows.get(row as usize - 1).map(Vec::as_slice).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "row {row} does not exist in {} (last row is {})",
            workbook.contracts_table,
            rows.len()
        ))
    })
}

fn ensure_open(cols: &Columns<ContractField>, row_cells: &[CellValue], row: u32) -> Result<(), AppError> {
    if is_truthy(cols.cell(row_cells, ContractField::Completed)) {
        return Err(AppError::InvalidState(format!(
            "row {row} is already completed and cannot be modified"
        )));
    }
    Ok(())
}

fn ensure_realized(
    cols: &Columns<ContractField>,
    row_cells: &[CellValue],
    field: ContractField,
) -> Result<(), AppError> {
    let current = cols.cell(row_cells, ContractField::UnitUpRealized);
    if UnitUpStatus::parse(&current.as_display()) != Some(UnitUpStatus::Achieved) {
        return Err(AppError::InvalidState(format!(
            "{} can only be set when {} is {} (current: {})",
            field.header(),
            ContractField::UnitUpRealized.header(),
            UnitUpStatus::Achieved,
            UnitUpStatus::display_cell(current)
        )));
    }
    Ok(())
}

async fn mark_completed(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    cols: &Columns<ContractField>,
    row: u32,
) -> Result<(), AppError> {
    store
        .write_cell(
            &workbook.contracts_table,
            row,
            cols.col(ContractField::Completed)?,
            CellValue::Bool(true),
        )
        .await?;
    touch(store, workbook, cols, row).await
}

async fn touch(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
    cols: &Columns<ContractField>,
    row: u32,
) -> Result<(), AppError> {
    store
        .write_cell(
            &workbook.contracts_table,
            row,
            cols.col(ContractField::LastUpdatedAt)?,
            CellValue::timestamp(now_local(workbook)),
        )
        .await?;
    Ok(())
}
