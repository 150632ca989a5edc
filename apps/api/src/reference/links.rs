use serde::Serialize;
use tracing::warn;

use crate::config::WorkbookConfig;
use crate::errors::AppError;
use crate::reference::parse_order;
use crate::schema::{is_truthy, ColumnIndex, LinkField};
use crate::store::TableStore;

const LINK_FIELDS: &[LinkField] = &[
    LinkField::Enabled,
    LinkField::Label,
    LinkField::Url,
    LinkField::Order,
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Link {
    pub label: String,
    pub url: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinksData {
    pub links: Vec<Link>,
    pub error: String,
}

/// Enabled links with a label and url, ascending by `order`.
pub async fn list_links(store: &dyn TableStore, workbook: &WorkbookConfig) -> LinksData {
    match try_list_links(store, workbook).await {
        Ok(links) => LinksData {
            links,
            error: String::new(),
        },
        Err(e) => {
            warn!("Listing {} failed: {e}", workbook.links_table);
            LinksData {
                links: Vec::new(),
                error: e.to_string(),
            }
        }
    }
}

async fn try_list_links(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
) -> Result<Vec<Link>, AppError> {
    let values = store.read_all(&workbook.links_table).await?;
    if values.len() < 2 {
        return Ok(Vec::new());
    }

    let index = ColumnIndex::from_header_row(&values[0]);
    let cols = index.require(LINK_FIELDS)?;

    let mut links: Vec<Link> = values[1..]
        .iter()
        .filter(|r| is_truthy(cols.cell(r, LinkField::Enabled)))
        .map(|r| Link {
            label: cols.text(r, LinkField::Label),
            url: cols.text(r, LinkField::Url),
            order: parse_order(cols.cell(r, LinkField::Order)),
        })
        .filter(|l| !l.label.is_empty() && !l.url.is_empty())
        .collect();

    // stable: equal orders keep sheet order
    links.sort_by_key(|l| l.order);
    Ok(links)
}
