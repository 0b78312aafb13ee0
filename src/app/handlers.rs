use crate::app::server::AppState;
use crate::core::cart::Cart;
use crate::domain::model::{CartEntry, MedicineRecord, OrderReceipt};
use crate::utils::error::{PharmacyError, Result};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartEntry>,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "medicines": state.catalog.len(),
    }))
}

pub async fn list_medicines(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<MedicineRecord>> {
    let query = params.q.unwrap_or_default();
    let hits = state.catalog.search(&query);
    tracing::debug!("Search '{}' returned {} medicines", query, hits.len());
    Json(hits.into_iter().cloned().collect())
}

pub async fn get_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MedicineRecord>> {
    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(PharmacyError::MedicineNotFound { id })
}

/// `POST /api/process-prescription` with a multipart `file` field.
pub async fn process_prescription(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.max_upload_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().unwrap_or("prescription").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?;
        tracing::info!("📄 Received '{}' ({} bytes)", file_name, bytes.len());
        upload = Some((content_type, bytes.to_vec()));
    }

    let (content_type, bytes) = upload.ok_or(PharmacyError::EmptyUpload)?;
    let report = state
        .prescriptions
        .process(&bytes, content_type.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "medicines": report.medicines,
        "matched": report.result.matched,
        "unmatched": report.result.unmatched,
        "outcome": report.outcome,
        "summary": report.summary(),
    })))
}

/// Re-validates a client-held cart and returns its totals.
pub async fn quote_cart(
    State(state): State<AppState>,
    Json(request): Json<CartRequest>,
) -> Result<Json<Value>> {
    let cart = Cart::from_entries(&state.catalog, &request.items)?;
    Ok(Json(serde_json::to_value(cart.summary())?))
}

pub async fn pay(
    State(state): State<AppState>,
    Json(request): Json<CartRequest>,
) -> Result<Json<OrderReceipt>> {
    let cart = Cart::from_entries(&state.catalog, &request.items)?;
    let receipt = state.payment.pay(&cart).await?;
    Ok(Json(receipt))
}

fn multipart_error(e: MultipartError, limit: usize) -> PharmacyError {
    // 超過請求上限時檔案尚未讀完，實際大小未知
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return PharmacyError::UploadTooLarge { limit };
    }
    PharmacyError::ValidationError {
        message: format!("invalid upload: {}", e.body_text()),
    }
}
