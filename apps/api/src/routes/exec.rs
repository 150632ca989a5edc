//! Single-entry GET surface: `?format=` selects a dataset, otherwise `?page=`
//! selects a view descriptor for the front-end.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::contracts::models::ContractSample;
use crate::contracts::reader::list_contracts;
use crate::reference::links::list_links;
use crate::reference::templates::list_templates;
use crate::state::AppState;

const DEFAULT_DETAIL_TYPE: &str = "contract";

#[derive(Debug, Default, Deserialize)]
pub struct ExecQuery {
    pub format: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
}

/// Which page the front-end should render.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewDescriptor {
    pub page: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    pub title: String,
}

impl ViewDescriptor {
    pub fn for_query(query: &ExecQuery) -> Self {
        match query.page.as_deref() {
            Some("detail") => ViewDescriptor {
                page: "detail".to_string(),
                record_type: Some(
                    query
                        .record_type
                        .as_deref()
                        .filter(|t| !t.is_empty())
                        .unwrap_or(DEFAULT_DETAIL_TYPE)
                        .to_string(),
                ),
                title: "契約詳細".to_string(),
            },
            _ => ViewDescriptor {
                page: "index".to_string(),
                record_type: None,
                title: "Contracts 一覧".to_string(),
            },
        }
    }
}

/// GET /exec
///
/// - `format=json`      all active contracts
/// - `format=json1`     headers and the first active contract
/// - `format=links`     enabled links
/// - `format=templates` enabled templates
pub async fn handle_exec(State(state): State<AppState>, Query(query): Query<ExecQuery>) -> Response {
    let store = state.store.as_ref();
    let wb = &state.workbook;
    let mode = query.format.as_deref().unwrap_or("").to_lowercase();

    match mode.as_str() {
        "json" => Json(list_contracts(store, wb).await).into_response(),
        "json1" => Json(ContractSample::from(list_contracts(store, wb).await)).into_response(),
        "links" => Json(list_links(store, wb).await).into_response(),
        "templates" => Json(list_templates(store, wb).await).into_response(),
        _ => Json(ViewDescriptor::for_query(&query)).into_response(),
    }
}
