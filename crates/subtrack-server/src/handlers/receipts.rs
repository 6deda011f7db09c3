//! Email receipt scanner handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::read_json;
use crate::{AppError, AppState, CurrentUser};
use subtrack_core::import::{import_receipts, ImportReceipt};
use subtrack_core::receipt::{parse_multiple_receipts, ParsedReceipt};

/// Response for scan mode
#[derive(Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub receipts: Vec<ParsedReceipt>,
}

/// Response for import mode
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
    pub imported_count: usize,
    pub skipped_count: usize,
}

/// POST /api/receipt-scanner - Scan receipt texts, or import selected receipts
///
/// `{ "receipts": ["..."] }` parses the texts and returns candidate
/// subscriptions. `{ "type": "import", "receipts": [...] }` creates
/// subscriptions for the selected records, skipping ones already tracked.
pub async fn receipt_scanner(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Response, AppError> {
    let body: Value = read_json(request).await?;

    let kind = body.get("type").filter(|v| !v.is_null());
    let receipts = body.get("receipts").filter(|v| !v.is_null());

    match (kind, receipts) {
        (None, Some(receipts)) => {
            let texts = receipt_texts(receipts)
                .ok_or_else(|| AppError::bad_request("No receipt texts provided"))?;

            let parsed = parse_multiple_receipts(&texts);
            info!(user = %user.id, texts = texts.len(), found = parsed.len(), "Scanned receipts");

            Ok(Json(ScanResponse {
                success: true,
                receipts: parsed,
            })
            .into_response())
        }
        (Some(kind), Some(receipts)) if kind.as_str() == Some("import") => {
            let records: Vec<ImportReceipt> = serde_json::from_value(receipts.clone())
                .map_err(|_| AppError::bad_request("Invalid receipt records"))?;

            let result = import_receipts(&state.db, &user.id, &records, Utc::now())?;

            Ok(Json(ImportResponse {
                success: true,
                imported_count: result.imported.len(),
                skipped_count: result.skipped.len(),
                imported: result.imported,
                skipped: result.skipped,
            })
            .into_response())
        }
        _ => Err(AppError::bad_request("Invalid request type")),
    }
}

/// A non-empty array of strings, or `None`
fn receipt_texts(value: &Value) -> Option<Vec<&str>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items.iter().map(Value::as_str).collect()
}
