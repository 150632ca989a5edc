//! Tabular store capability — the external spreadsheet-like data source.
//!
//! Every reader and writer goes through `TableStore`. `AppState` carries an
//! `Arc<dyn TableStore>`, chosen at startup from `STORE_BACKEND`.

pub mod cell;
pub mod memory;
pub mod sheets;

use async_trait::async_trait;
use thiserror::Error;

pub use cell::CellValue;
pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// Ordered rows of ordered cells. Row 0 is the header row.
pub type Rows = Vec<Vec<CellValue>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Sheet not found: {0}")]
    TableNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported store operation: {0}")]
    Unsupported(String),
}

/// Addressing: `row` is 1-based (header row = 1), `col` is 0-based.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn read_all(&self, table: &str) -> Result<Rows, StoreError>;

    async fn read_header_row(&self, table: &str) -> Result<Vec<CellValue>, StoreError>;

    async fn write_cell(
        &self,
        table: &str,
        row: u32,
        col: usize,
        value: CellValue,
    ) -> Result<(), StoreError>;

    async fn append_row(&self, table: &str, values: Vec<CellValue>) -> Result<(), StoreError>;

    /// Applies a display number format (e.g. `#,##0`) to one cell.
    async fn set_number_format(
        &self,
        table: &str,
        row: u32,
        col: usize,
        pattern: &str,
    ) -> Result<(), StoreError>;
}
