//! Axum route handlers for the Contracts API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::contracts::models::ContractsData;
use crate::contracts::reader::list_contracts;
use crate::contracts::writer;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Positional arguments of a remote procedure call.
struct Args(Vec<Value>);

impl Args {
    fn get(&self, i: usize) -> Option<&Value> {
        self.0.get(i).filter(|v| !v.is_null())
    }

    /// Text argument; absent or null reads as empty.
    fn text(&self, i: usize) -> String {
        match self.get(i) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// Row position: a JSON integer or a numeric string.
    fn row(&self, i: usize) -> Result<i64, AppError> {
        let v = self
            .get(i)
            .ok_or_else(|| AppError::InvalidInput("rowPosition is required".to_string()))?;
        as_row(v).ok_or_else(|| {
            AppError::InvalidInput(format!("rowPosition must be an integer, got {v}"))
        })
    }

    /// List of row positions; unreadable entries are dropped.
    fn rows(&self, i: usize) -> Vec<i64> {
        match self.get(i) {
            Some(Value::Array(items)) => items.iter().filter_map(as_row).collect(),
            Some(single) => as_row(single).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn as_row(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// GET /api/v1/contracts
pub async fn handle_list_contracts(State(state): State<AppState>) -> Json<ContractsData> {
    Json(list_contracts(state.store.as_ref(), &state.workbook).await)
}

/// POST /api/v1/rpc/:procedure
///
/// Named mutations with positional `args`, mirroring the spreadsheet
/// front-end's remote calls. Success is always `{ "ok": true, ... }`.
pub async fn handle_rpc(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    payload: Result<Json<RpcRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        AppError::InvalidInput(format!(
            "request body must be {{\"args\": [...]}}: {}",
            rejection.body_text()
        ))
    })?;
    let store = state.store.as_ref();
    let wb = &state.workbook;
    let args = Args(req.args);
    debug!("RPC {procedure} with {} args", args.0.len());

    let body = match procedure.as_str() {
        "addContract" => {
            let id = writer::add_contract(store, wb, &args.text(0), &args.text(1), &args.text(2)).await?;
            json!({ "ok": true, "id": id })
        }
        "completeContract" => {
            let row = args.row(0)?;
            writer::complete_contract(store, wb, row).await?;
            json!({ "ok": true, "rowNumber": row })
        }
        "completeContracts" => {
            let count = writer::complete_contracts(store, wb, &args.rows(0)).await?;
            json!({ "ok": true, "count": count })
        }
        "setUnitUpRealized" => {
            let row = args.row(0)?;
            let value = args.text(1);
            writer::set_unit_up_realized(store, wb, row, &value).await?;
            json!({ "ok": true, "rowNumber": row, "value": value.trim() })
        }
        "setUnitUpReflectDate" => {
            let row = args.row(0)?;
            let date = args.text(1);
            writer::set_unit_up_reflect_date(store, wb, row, &date).await?;
            json!({ "ok": true, "rowNumber": row, "reflectDate": date.trim() })
        }
        "setUnitUpReflectAndAmount" => {
            let row = args.row(0)?;
            let date = args.text(1);
            let amount =
                writer::set_unit_up_reflect_and_amount(store, wb, row, &date, &args.text(2)).await?;
            json!({ "ok": true, "rowNumber": row, "reflectDate": date.trim(), "amount": amount })
        }
        other => return Err(AppError::NotFound(format!("Unknown procedure: {other}"))),
    };

    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_args_accept_numbers_and_numeric_strings() {
        let args = Args(vec![json!(5), json!("7"), json!(3.0), json!("x"), Value::Null]);
        assert_eq!(args.row(0).unwrap(), 5);
        assert_eq!(args.row(1).unwrap(), 7);
        assert_eq!(args.row(2).unwrap(), 3);
        assert!(matches!(args.row(3), Err(AppError::InvalidInput(_))));
        assert!(matches!(args.row(4), Err(AppError::InvalidInput(ref m)) if m.contains("required")));
        assert!(args.row(9).is_err());
    }

    #[test]
    fn test_rows_arg_drops_unreadable_entries() {
        let args = Args(vec![json!([2, "3", "abc", null, 4.5, 6])]);
        assert_eq!(args.rows(0), vec![2, 3, 6]);
        assert!(Args(vec![]).rows(0).is_empty());
    }

    #[test]
    fn test_text_args() {
        let args = Args(vec![json!("Taro"), Value::Null, json!(12)]);
        assert_eq!(args.text(0), "Taro");
        assert_eq!(args.text(1), "");
        assert_eq!(args.text(2), "12");
        assert_eq!(args.text(3), "");
    }
}
