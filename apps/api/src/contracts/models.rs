use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::CellValue;

/// Status written to every new contract.
pub const STATUS_ACTIVE: &str = "ACTIVE";

/// Outcome of a unit-price-up negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitUpStatus {
    #[serde(rename = "未")]
    Pending,
    #[serde(rename = "〇")]
    Achieved,
    #[serde(rename = "×")]
    Rejected,
}

impl UnitUpStatus {
    pub const ALL: [UnitUpStatus; 3] = [
        UnitUpStatus::Pending,
        UnitUpStatus::Achieved,
        UnitUpStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UnitUpStatus::Pending => "未",
            UnitUpStatus::Achieved => "〇",
            UnitUpStatus::Rejected => "×",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    /// Text shown for a stored cell: blank reads as `未`.
    pub fn display_cell(cell: &CellValue) -> String {
        if cell.is_blank() {
            UnitUpStatus::Pending.as_str().to_string()
        } else {
            cell.as_display().trim().to_string()
        }
    }
}

impl fmt::Display for UnitUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full listing of active contracts.
///
/// `row_numbers[i]` is the 1-based table position of `rows[i]` (header = 1).
/// On failure `error` is non-empty and the data vectors are empty.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractsData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_numbers: Vec<u32>,
    pub error: String,
}

impl ContractsData {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

/// Diagnostic view: headers plus the first listed row only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSample {
    pub headers: Vec<String>,
    pub row0: Vec<Value>,
    pub error: String,
}

impl From<ContractsData> for ContractSample {
    fn from(data: ContractsData) -> Self {
        Self {
            headers: data.headers,
            row0: data.rows.into_iter().next().unwrap_or_default(),
            error: data.error,
        }
    }
}
