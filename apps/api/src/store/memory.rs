use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::store::{CellValue, Rows, StoreError, TableStore};

#[derive(Debug, Default, Clone)]
struct Table {
    rows: Rows,
    formats: HashMap<(u32, usize), String>,
}

/// In-process table store. Backs local runs (optionally seeded from a JSON
/// file) and every test in the crate.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{ "<table>": [[cell, ...], ...], ... }` from disk.
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: HashMap<String, Rows> = serde_json::from_str(&raw)
            .with_context(|| format!("Seed file {} is not valid JSON", path.display()))?;

        let tables = seed
            .into_iter()
            .map(|(name, rows)| {
                info!("Seeded table '{}' with {} rows", name, rows.len());
                (
                    name,
                    Table {
                        rows,
                        formats: HashMap::new(),
                    },
                )
            })
            .collect();

        Ok(Self {
            tables: Mutex::new(tables),
        })
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Builder-style helper: registers `name` with the given rows.
    pub fn with_table(mut self, name: &str, rows: Rows) -> Self {
        self.tables.get_mut().insert(
            name.to_string(),
            Table {
                rows,
                formats: HashMap::new(),
            },
        );
        self
    }

    /// Returns a copy of one cell, `Empty` when out of range.
    pub async fn cell(&self, table: &str, row: u32, col: usize) -> CellValue {
        let tables = self.tables.lock().await;
        tables
            .get(table)
            .and_then(|t| t.rows.get((row as usize).checked_sub(1)?))
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn number_format(&self, table: &str, row: u32, col: usize) -> Option<String> {
        let tables = self.tables.lock().await;
        tables
            .get(table)
            .and_then(|t| t.formats.get(&(row, col)))
            .cloned()
    }

    pub async fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.lock().await;
        tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }
}

fn not_found(table: &str) -> StoreError {
    StoreError::TableNotFound(table.to_string())
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn read_all(&self, table: &str) -> Result<Rows, StoreError> {
        let tables = self.tables.lock().await;
        let t = tables.get(table).ok_or_else(|| not_found(table))?;
        Ok(t.rows.clone())
    }

    async fn read_header_row(&self, table: &str) -> Result<Vec<CellValue>, StoreError> {
        let tables = self.tables.lock().await;
        let t = tables.get(table).ok_or_else(|| not_found(table))?;
        Ok(t.rows.first().cloned().unwrap_or_default())
    }

    async fn write_cell(
        &self,
        table: &str,
        row: u32,
        col: usize,
        value: CellValue,
    ) -> Result<(), StoreError> {
        if row == 0 {
            return Err(StoreError::Unsupported("row positions are 1-based".to_string()));
        }
        let mut tables = self.tables.lock().await;
        let t = tables.get_mut(table).ok_or_else(|| not_found(table))?;

        let r = row as usize - 1;
        if t.rows.len() <= r {
            t.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut t.rows[r];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
        Ok(())
    }

    async fn append_row(&self, table: &str, values: Vec<CellValue>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let t = tables.get_mut(table).ok_or_else(|| not_found(table))?;
        t.rows.push(values);
        Ok(())
    }

    async fn set_number_format(
        &self,
        table: &str,
        row: u32,
        col: usize,
        pattern: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let t = tables.get_mut(table).ok_or_else(|| not_found(table))?;
        t.formats.insert((row, col), pattern.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> MemoryStore {
        MemoryStore::new().with_table(
            "Links",
            vec![
                vec![CellValue::text("label"), CellValue::text("url")],
                vec![CellValue::text("Docs"), CellValue::text("https://example.com")],
            ],
        )
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let store = sample();
        let err = store.read_all("Nope").await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(ref t) if t == "Nope"));
    }

    #[tokio::test]
    async fn test_write_cell_extends_short_rows() {
        let store = sample();
        store
            .write_cell("Links", 2, 4, CellValue::Bool(true))
            .await
            .unwrap();
        assert_eq!(store.cell("Links", 2, 4).await, CellValue::Bool(true));
        assert_eq!(store.cell("Links", 2, 3).await, CellValue::Empty);
    }

    #[tokio::test]
    async fn test_append_and_header() {
        let store = sample();
        store
            .append_row("Links", vec![CellValue::text("x"), CellValue::text("y")])
            .await
            .unwrap();
        assert_eq!(store.row_count("Links").await, 3);
        let header = store.read_header_row("Links").await.unwrap();
        assert_eq!(header[0], CellValue::text("label"));
    }

    #[tokio::test]
    async fn test_seed_file_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Links": [["label", "url"], ["Docs", "https://example.com"]]}}"#
        )
        .unwrap();

        let store = MemoryStore::from_seed_file(file.path()).unwrap();
        let rows = store.read_all("Links").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], CellValue::text("Docs"));
    }
}
