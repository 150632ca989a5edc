use axum::{extract::State, Json};

use crate::reference::links::{list_links, LinksData};
use crate::reference::templates::{list_templates, TemplatesData};
use crate::state::AppState;

/// GET /api/v1/links
pub async fn handle_list_links(State(state): State<AppState>) -> Json<LinksData> {
    Json(list_links(state.store.as_ref(), &state.workbook).await)
}

/// GET /api/v1/templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Json<TemplatesData> {
    Json(list_templates(state.store.as_ref(), &state.workbook).await)
}
