use std::sync::Arc;

use crate::config::WorkbookConfig;
use crate::store::TableStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// External tabular store. `MemoryStore` or `SheetsStore`, chosen via STORE_BACKEND.
    pub store: Arc<dyn TableStore>,
    /// Table names and the fixed time zone used by every operation.
    pub workbook: WorkbookConfig,
}
