//! Header/column resolution.
//!
//! Each table has a fixed set of named fields. A header row is resolved once
//! per operation into a `ColumnIndex`; `require` then hands back a typed
//! `Columns` accessor, or a `MissingColumn` error naming every absent header.

use std::collections::HashMap;
use std::hash::Hash;

use crate::errors::AppError;
use crate::store::cell::EMPTY_CELL;
use crate::store::CellValue;

/// A named column of some table.
pub trait Field: Copy + Eq + Hash {
    fn header(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractField {
    Id,
    Status,
    UnitUpRealized,
    StaffName,
    ContractStartDate,
    ContractEndDate,
    TemplateType,
    RegisteredAt,
    LastUpdatedAt,
    Completed,
    UnitUpReflectDate,
    UnitPrice,
}

impl Field for ContractField {
    fn header(self) -> &'static str {
        match self {
            ContractField::Id => "契約ID",
            ContractField::Status => "契約ステータス",
            ContractField::UnitUpRealized => "単価UP実現",
            ContractField::StaffName => "スタッフ名",
            ContractField::ContractStartDate => "契約開始日",
            ContractField::ContractEndDate => "契約終了日",
            ContractField::TemplateType => "テンプレ種別",
            ContractField::RegisteredAt => "登録日時",
            ContractField::LastUpdatedAt => "最終更新日",
            ContractField::Completed => "完了フラグ",
            ContractField::UnitUpReflectDate => "単価UP反映日",
            ContractField::UnitPrice => "単価",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkField {
    Enabled,
    Label,
    Url,
    Order,
}

impl Field for LinkField {
    fn header(self) -> &'static str {
        match self {
            LinkField::Enabled => "enabled",
            LinkField::Label => "label",
            LinkField::Url => "url",
            LinkField::Order => "order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateField {
    Enabled,
    TemplateKey,
    TemplateType,
    Label,
    Body,
    Order,
}

impl Field for TemplateField {
    fn header(self) -> &'static str {
        match self {
            TemplateField::Enabled => "enabled",
            TemplateField::TemplateKey => "template_key",
            TemplateField::TemplateType => "template_type",
            TemplateField::Label => "label",
            TemplateField::Body => "body",
            TemplateField::Order => "order",
        }
    }
}

/// Header text -> zero-based position. Headers are trimmed; on duplicates
/// the leftmost column wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    headers: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn from_header_row(row: &[CellValue]) -> Self {
        let headers: Vec<String> = row.iter().map(|c| c.as_display().trim().to_string()).collect();
        let mut positions = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            if !h.is_empty() {
                positions.entry(h.clone()).or_insert(i);
            }
        }
        Self { headers, positions }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn position(&self, header: &str) -> Option<usize> {
        self.positions.get(header).copied()
    }

    /// Resolves every field or fails listing all of the missing headers.
    pub fn require<F: Field>(&self, fields: &[F]) -> Result<Columns<F>, AppError> {
        let mut resolved = HashMap::with_capacity(fields.len());
        let mut missing = Vec::new();

        for &f in fields {
            match self.position(f.header()) {
                Some(i) => {
                    resolved.insert(f, i);
                }
                None => missing.push(f.header().to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(AppError::MissingColumn(missing));
        }
        Ok(Columns { resolved })
    }
}

/// Typed accessor over a resolved set of fields.
#[derive(Debug, Clone)]
pub struct Columns<F: Field> {
    resolved: HashMap<F, usize>,
}

impl<F: Field> Columns<F> {
    pub fn col(&self, field: F) -> Result<usize, AppError> {
        self.resolved
            .get(&field)
            .copied()
            .ok_or_else(|| AppError::MissingColumn(vec![field.header().to_string()]))
    }

    /// The cell for `field` in `row`, `Empty` when the row is short.
    pub fn cell<'r>(&self, row: &'r [CellValue], field: F) -> &'r CellValue {
        self.resolved
            .get(&field)
            .and_then(|&i| row.get(i))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, row: &[CellValue], field: F) -> String {
        self.cell(row, field).as_display().trim().to_string()
    }
}

/// The one boolean decoder for flag columns: `true`, `"true"` (any case),
/// `"1"` and `1` are true; everything else is false.
pub fn is_truthy(cell: &CellValue) -> bool {
    match cell {
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => *n == 1.0,
        CellValue::Text(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        _ => false,
    }
}
