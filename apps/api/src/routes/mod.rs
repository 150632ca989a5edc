pub mod exec;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::contracts::handlers as contracts;
use crate::reference::handlers as reference;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/exec", get(exec::handle_exec))
        // Datasets
        .route("/api/v1/contracts", get(contracts::handle_list_contracts))
        .route("/api/v1/links", get(reference::handle_list_links))
        .route("/api/v1/templates", get(reference::handle_list_templates))
        // Mutations
        .route("/api/v1/rpc/:procedure", post(contracts::handle_rpc))
        .with_state(state)
}
