//! Google Sheets v4 adapter for `TableStore`.
//!
//! One spreadsheet, one sheet per table. Values are read unformatted with
//! dates as serial numbers; writes go through `USER_ENTERED` so dates and
//! numbers land as typed cells, while text is sent behind a leading `'` so it
//! stays literal. Single requests only: no retry, no backoff.
use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Timelike;
use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{CellValue, Rows, StoreError, TableStore};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

pub struct SheetsStore {
    client: Client,
    base: Url,
    spreadsheet_id: String,
    access_token: String,
    /// title -> numeric sheetId, filled lazily from spreadsheet metadata.
    sheet_ids: RwLock<HashMap<String, i64>>,
}

impl SheetsStore {
    pub fn new(api_base: &str, spreadsheet_id: String, access_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        let base = Url::parse(api_base)
            .with_context(|| format!("SHEETS_API_BASE '{api_base}' is not a valid URL"))?;

        Ok(Self {
            client,
            base,
            spreadsheet_id,
            access_token,
            sheet_ids: RwLock::new(HashMap::new()),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::Unsupported(format!("cannot-be-a-base URL: {}", self.base)))?;
            path.pop_if_empty();
            path.push(&self.spreadsheet_id);
            for s in segments {
                path.push(s);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolves a sheet title to its numeric id. An unknown title means the
    /// table does not exist.
    async fn sheet_id(&self, table: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.sheet_ids.read().await.get(table) {
            return Ok(*id);
        }

        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let meta: SpreadsheetMeta = self.send(self.client.get(url)).await?;

        let mut ids = self.sheet_ids.write().await;
        for sheet in meta.sheets {
            ids.insert(sheet.properties.title, sheet.properties.sheet_id);
        }
        debug!("Loaded {} sheet ids from spreadsheet metadata", ids.len());

        ids.get(table)
            .copied()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn read_range(&self, range: &str) -> Result<Rows, StoreError> {
        let mut url = self.url(&["values", range])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "SERIAL_NUMBER");
        let body: ValueRange = self.send(self.client.get(url)).await?;
        Ok(body
            .values
            .into_iter()
            .map(|r| r.into_iter().map(json_to_cell).collect())
            .collect())
    }
}

#[async_trait]
impl TableStore for SheetsStore {
    async fn read_all(&self, table: &str) -> Result<Rows, StoreError> {
        self.sheet_id(table).await?;
        self.read_range(&quote_sheet(table)).await
    }

    async fn read_header_row(&self, table: &str) -> Result<Vec<CellValue>, StoreError> {
        self.sheet_id(table).await?;
        let range = format!("{}!1:1", quote_sheet(table));
        Ok(self.read_range(&range).await?.into_iter().next().unwrap_or_default())
    }

    async fn write_cell(
        &self,
        table: &str,
        row: u32,
        col: usize,
        value: CellValue,
    ) -> Result<(), StoreError> {
        self.sheet_id(table).await?;
        let range = format!("{}!{}", quote_sheet(table), a1(row, col));
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let body = json!({ "range": range, "values": [[cell_to_json(&value)]] });
        let _: Value = self.send(self.client.put(url).json(&body)).await?;
        debug!("Wrote {range}");
        Ok(())
    }

    async fn append_row(&self, table: &str, values: Vec<CellValue>) -> Result<(), StoreError> {
        self.sheet_id(table).await?;
        let range = format!("{}!A1", quote_sheet(table));
        let mut url = self.url(&["values", &format!("{range}:append")])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let row: Vec<Value> = values.iter().map(cell_to_json).collect();
        let body = json!({ "values": [row] });
        let _: Value = self.send(self.client.post(url).json(&body)).await?;
        debug!("Appended one row to {table}");
        Ok(())
    }

    async fn set_number_format(
        &self,
        table: &str,
        row: u32,
        col: usize,
        pattern: &str,
    ) -> Result<(), StoreError> {
        let sheet_id = self.sheet_id(table).await?;
        let url = self.url(&[])?;
        // batchUpdate is addressed as "<id>:batchUpdate", so rebuild the last segment.
        let url = {
            let mut u = url;
            u.path_segments_mut()
                .map_err(|_| StoreError::Unsupported("cannot-be-a-base URL".to_string()))?
                .pop()
                .push(&format!("{}:batchUpdate", self.spreadsheet_id));
            u
        };

        let body = json!({
            "requests": [{
                "repeatCell": {
                    "range": {
                        "sheetId": sheet_id,
                        "startRowIndex": row.saturating_sub(1),
                        "endRowIndex": row,
                        "startColumnIndex": col,
                        "endColumnIndex": col + 1
                    },
                    "cell": {
                        "userEnteredFormat": {
                            "numberFormat": { "type": "NUMBER", "pattern": pattern }
                        }
                    },
                    "fields": "userEnteredFormat.numberFormat"
                }
            }]
        });
        let _: Value = self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

/// `Contracts` -> `'Contracts'`; embedded quotes are doubled.
fn quote_sheet(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// 0 -> A, 25 -> Z, 26 -> AA.
fn column_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn a1(row: u32, col: usize) -> String {
    format!("{}{}", column_letters(col), row)
}

fn json_to_cell(v: Value) -> CellValue {
    match v {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
        Value::String(s) if s.is_empty() => CellValue::Empty,
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

fn cell_to_json(c: &CellValue) -> Value {
    match c {
        CellValue::Empty => Value::String(String::new()),
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string())),
        CellValue::Date { date } if date.num_seconds_from_midnight() == 0 => {
            Value::String(date.format("%Y-%m-%d").to_string())
        }
        CellValue::Date { date } => Value::String(date.format("%Y-%m-%d %H:%M:%S").to_string()),
        CellValue::Text(s) if s.is_empty() => Value::String(String::new()),
        // `'` forces a literal string; Sheets does not store the quote.
        CellValue::Text(s) => Value::String(format!("'{s}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{header, HeaderMap, Method, StatusCode, Uri},
        response::{IntoResponse, Response},
        Json, Router,
    };
    use chrono::NaiveDate;

    use super::*;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: Method,
        path: String,
        query: String,
        auth: String,
        body: String,
    }

    type Log = Arc<Mutex<Vec<Recorded>>>;

    /// Stands in for the Sheets API: records every request and answers with
    /// canned bodies. Any path mentioning `Locked` is refused.
    async fn fake_sheets(
        State(log): State<Log>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> Response {
        let path = uri.path().to_string();
        log.lock().unwrap().push(Recorded {
            method: method.clone(),
            path: path.clone(),
            query: uri.query().unwrap_or_default().to_string(),
            auth: headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
            body,
        });

        if path.contains("Locked") {
            let error = json!({ "error": { "code": 403, "message": "The caller does not have permission" } });
            return (StatusCode::FORBIDDEN, Json(error)).into_response();
        }
        if path == "/v4/spreadsheets/abc" {
            return Json(json!({
                "sheets": [
                    { "properties": { "sheetId": 7, "title": "Contracts" } },
                    { "properties": { "sheetId": 9, "title": "Locked" } }
                ]
            }))
            .into_response();
        }
        if method == Method::GET {
            return Json(json!({ "values": [["契約ID", "スタッフ名"], ["c-1", "山田太郎", 45731]] }))
                .into_response();
        }
        Json(json!({})).into_response()
    }

    async fn fake_store() -> (SheetsStore, Log) {
        let log: Log = Arc::default();
        let app = Router::new().fallback(fake_sheets).with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base = format!("http://{addr}/v4/spreadsheets");
        let store = SheetsStore::new(&base, "abc".to_string(), "secret".to_string()).unwrap();
        (store, log)
    }

    fn requests(log: &Log) -> Vec<Recorded> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_table_not_found() {
        let (store, log) = fake_store().await;

        let err = store.read_all("Links").await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(ref t) if t == "Links"));

        let seen = requests(&log);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/v4/spreadsheets/abc");
        assert!(seen[0].query.starts_with("fields="));
        assert_eq!(seen[0].auth, "Bearer secret");
    }

    #[tokio::test]
    async fn test_read_all_decodes_values_and_caches_sheet_ids() {
        let (store, log) = fake_store().await;

        let rows = store.read_all("Contracts").await.unwrap();
        assert_eq!(rows[0][0], CellValue::text("契約ID"));
        assert_eq!(rows[1][2], CellValue::Number(45731.0));
        store.read_header_row("Contracts").await.unwrap();

        let seen = requests(&log);
        let metadata_calls = seen.iter().filter(|r| r.path == "/v4/spreadsheets/abc").count();
        assert_eq!(metadata_calls, 1);
        assert!(seen[1].query.contains("valueRenderOption=UNFORMATTED_VALUE"));
        assert!(seen[1].query.contains("dateTimeRenderOption=SERIAL_NUMBER"));
    }

    #[tokio::test]
    async fn test_append_row_posts_to_append_range() {
        let (store, log) = fake_store().await;

        store
            .append_row("Contracts", vec![CellValue::text("c-2"), CellValue::Bool(false)])
            .await
            .unwrap();

        let append = requests(&log).pop().unwrap();
        assert_eq!(append.method, Method::POST);
        assert!(append.path.starts_with("/v4/spreadsheets/abc/values/"));
        assert!(append.path.ends_with("Contracts'!A1:append"));
        assert!(append.query.contains("valueInputOption=USER_ENTERED"));
        assert!(append.query.contains("insertDataOption=INSERT_ROWS"));

        let body: Value = serde_json::from_str(&append.body).unwrap();
        assert_eq!(body["values"], json!([["'c-2", false]]));
    }

    #[tokio::test]
    async fn test_write_cell_puts_a1_range() {
        let (store, log) = fake_store().await;

        store
            .write_cell("Contracts", 3, 27, CellValue::Number(120000.0))
            .await
            .unwrap();

        let put = requests(&log).pop().unwrap();
        assert_eq!(put.method, Method::PUT);
        assert!(put.path.ends_with("Contracts'!AB3"));
        let body: Value = serde_json::from_str(&put.body).unwrap();
        assert_eq!(body["values"], json!([[120000.0]]));
    }

    #[tokio::test]
    async fn test_set_number_format_uses_batch_update() {
        let (store, log) = fake_store().await;

        store.set_number_format("Contracts", 2, 4, "#,##0").await.unwrap();

        let update = requests(&log).pop().unwrap();
        assert_eq!(update.method, Method::POST);
        assert_eq!(update.path, "/v4/spreadsheets/abc:batchUpdate");

        let body: Value = serde_json::from_str(&update.body).unwrap();
        let range = &body["requests"][0]["repeatCell"]["range"];
        assert_eq!(range["sheetId"], 7);
        assert_eq!(range["startRowIndex"], 1);
        assert_eq!(range["endRowIndex"], 2);
        assert_eq!(range["startColumnIndex"], 4);
        assert_eq!(
            body["requests"][0]["repeatCell"]["cell"]["userEnteredFormat"]["numberFormat"]["pattern"],
            "#,##0"
        );
    }

    #[tokio::test]
    async fn test_api_errors_carry_status_and_message() {
        let (store, _) = fake_store().await;

        let err = store.read_all("Locked").await.unwrap_err();
        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_a1_and_quoting() {
        assert_eq!(a1(2, 10), "K2");
        assert_eq!(quote_sheet("Contracts"), "'Contracts'");
        assert_eq!(quote_sheet("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_json_to_cell() {
        assert_eq!(json_to_cell(Value::Null), CellValue::Empty);
        assert_eq!(json_to_cell(json!("")), CellValue::Empty);
        assert_eq!(json_to_cell(json!(true)), CellValue::Bool(true));
        assert_eq!(json_to_cell(json!(45731)), CellValue::Number(45731.0));
        assert_eq!(json_to_cell(json!("未")), CellValue::text("未"));
    }

    #[test]
    fn test_dates_written_as_user_entered_text() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(cell_to_json(&CellValue::date(d)), json!("2025-03-15"));

        let t = d.and_hms_opt(9, 30, 5).unwrap();
        assert_eq!(
            cell_to_json(&CellValue::timestamp(t)),
            json!("2025-03-15 09:30:05")
        );
        assert_eq!(cell_to_json(&CellValue::Number(120000.0)), json!(120000.0));
    }

    #[test]
    fn test_text_is_written_literally() {
        assert_eq!(cell_to_json(&CellValue::text("=IMPORTXML(a1)")), json!("'=IMPORTXML(a1)"));
        assert_eq!(cell_to_json(&CellValue::text("1/2")), json!("'1/2"));
        assert_eq!(cell_to_json(&CellValue::text("山田太郎")), json!("'山田太郎"));
        assert_eq!(cell_to_json(&CellValue::text("")), json!(""));
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let store = SheetsStore::new(DEFAULT_API_BASE, "abc".to_string(), "t".to_string()).unwrap();
        let url = store.url(&["values", "Staff Sheet"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Staff%20Sheet"
        );
    }
}
