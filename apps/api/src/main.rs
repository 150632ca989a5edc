mod config;
mod contracts;
mod errors;
mod reference;
mod routes;
mod schema;
mod state;
mod store;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, SheetsStore, TableStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Contracts API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config.backend)?;
    info!(
        "Workbook tables: {}, {}, {} (UTC offset {})",
        config.workbook.contracts_table,
        config.workbook.links_table,
        config.workbook.templates_table,
        config.workbook.utc_offset
    );

    let state = AppState {
        store,
        workbook: config.workbook.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front-end host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the table store selected by STORE_BACKEND.
fn build_store(backend: &StoreBackend) -> Result<Arc<dyn TableStore>> {
    match backend {
        StoreBackend::Memory { seed_path } => {
            let store = match seed_path {
                Some(path) => MemoryStore::from_seed_file(Path::new(path))?,
                None => MemoryStore::new(),
            };
            info!("In-memory table store initialized");
            Ok(Arc::new(store))
        }
        StoreBackend::Sheets {
            api_base,
            spreadsheet_id,
            access_token,
        } => {
            let store = SheetsStore::new(api_base, spreadsheet_id.clone(), access_token.clone())?;
            info!("Google Sheets store initialized (spreadsheet {spreadsheet_id})");
            Ok(Arc::new(store))
        }
    }
}
