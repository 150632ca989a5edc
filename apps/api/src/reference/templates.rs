use serde::Serialize;
use tracing::warn;

use crate::config::WorkbookConfig;
use crate::errors::AppError;
use crate::reference::collation::JaCollator;
use crate::reference::parse_order;
use crate::schema::{is_truthy, ColumnIndex, TemplateField};
use crate::store::TableStore;

const TEMPLATE_FIELDS: &[TemplateField] = &[
    TemplateField::Enabled,
    TemplateField::TemplateKey,
    TemplateField::TemplateType,
    TemplateField::Label,
    TemplateField::Body,
    TemplateField::Order,
];

/// A message template. `template_type` groups templates by contract event
/// (renewal, price change, details change).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Template {
    pub template_key: String,
    pub template_type: String,
    pub label: String,
    pub body: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplatesData {
    pub templates: Vec<Template>,
    pub error: String,
}

/// Enabled templates sorted by type, then order, then label.
pub async fn list_templates(store: &dyn TableStore, workbook: &WorkbookConfig) -> TemplatesData {
    match try_list_templates(store, workbook).await {
        Ok(templates) => TemplatesData {
            templates,
            error: String::new(),
        },
        Err(e) => {
            warn!("Listing {} failed: {e}", workbook.templates_table);
            TemplatesData {
                templates: Vec::new(),
                error: e.to_string(),
            }
        }
    }
}

async fn try_list_templates(
    store: &dyn TableStore,
    workbook: &WorkbookConfig,
) -> Result<Vec<Template>, AppError> {
    let values = store.read_all(&workbook.templates_table).await?;
    if values.len() < 2 {
        return Ok(Vec::new());
    }

    let index = ColumnIndex::from_header_row(&values[0]);
    let cols = index.require(TEMPLATE_FIELDS)?;

    let mut templates: Vec<Template> = values[1..]
        .iter()
        .filter(|r| is_truthy(cols.cell(r, TemplateField::Enabled)))
        .map(|r| Template {
            template_key: cols.text(r, TemplateField::TemplateKey),
            template_type: cols.text(r, TemplateField::TemplateType),
            label: cols.text(r, TemplateField::Label),
            // body keeps its surrounding whitespace
            body: cols.cell(r, TemplateField::Body).as_display(),
            order: parse_order(cols.cell(r, TemplateField::Order)),
        })
        .filter(|t| !t.template_key.is_empty() && !t.template_type.is_empty() && !t.label.is_empty())
        .collect();

    let collator = JaCollator::new()?;
    templates.sort_by(|a, b| {
        collator
            .compare(&a.template_type, &b.template_type)
            .then(a.order.cmp(&b.order))
            .then_with(|| collator.compare(&a.label, &b.label))
    });
    Ok(templates)
}
