//! # HTTP Handlers
//!
//! ## Checkout Flow
//! ```text
//! POST /checkout (raw bytes)
//!      │
//!      ├── request_id = v4, span "checkout"
//!      │
//!      ▼
//! parse_checkout_request ──► 400 / 404 (no database access)
//!      │
//!      ▼
//! db.health_check ─────────► 503
//!      │
//!      ▼
//! db.checkout (BEGIN … COMMIT / ROLLBACK)
//!      │
//!      ├── Err ──► 400 / 404 / 503 / 500
//!      ▼
//! 200 { success, data: { transaction, receiptHtml, batteryBillHtml, … } }
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, field, info, info_span, Instrument};
use ts_rs::TS;
use uuid::Uuid;

use garage_core::{parse_checkout_request, CoreError, Transaction};

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub data: CheckoutData,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    pub transaction: Transaction,
    pub receipt_html: Option<String>,
    pub battery_bill_html: Option<String>,
    pub is_battery: bool,
    pub request_id: Uuid,
    /// Milliseconds spent in the handler.
    #[ts(type = "number")]
    pub processing_time: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("checkout", %request_id, location_id = field::Empty);

    run_checkout(&state, &body, request_id)
        .instrument(span)
        .await
        .map(Json)
        .map_err(|error| ApiError::new(request_id, error))
}

async fn run_checkout(
    state: &AppState,
    body: &[u8],
    request_id: Uuid,
) -> Result<CheckoutResponse, CoreError> {
    let started = Instant::now();

    let input = parse_checkout_request(body)?;
    tracing::Span::current().record("location_id", field::display(input.location_id));
    debug!(
        cart_items = input.cart.len(),
        trade_ins = input.trade_ins.len(),
        "Checkout request validated"
    );

    state.db.health_check().await?;
    debug!("Database probe passed");

    let outcome = state.db.checkout(&state.engine, &input).await?;
    let processing_time = started.elapsed().as_millis() as u64;

    info!(
        reference_number = %outcome.transaction.reference_number,
        total = %outcome.transaction.total_amount,
        items = input.cart.len(),
        is_battery = outcome.is_battery,
        processing_time_ms = processing_time,
        "Checkout completed"
    );

    let receipt_html = outcome.receipt_html().map(String::from);
    let battery_bill_html = outcome.battery_bill_html().map(String::from);

    Ok(CheckoutResponse {
        success: true,
        data: CheckoutData {
            transaction: outcome.transaction,
            receipt_html,
            battery_bill_html,
            is_battery: outcome.is_battery,
            request_id,
            processing_time,
            timestamp: Utc::now().to_rfc3339(),
        },
    })
}

/// Runs the same probe as the checkout pre-flight.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        )
            .into_response(),
        Err(err) => ApiError::new(Uuid::new_v4(), err).into_response(),
    }
}
