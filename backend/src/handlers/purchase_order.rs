//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::PurchaseOrder;

use crate::error::AppResult;
use crate::services::{purchase_order::PurchaseOrderDetail, PurchaseOrderService};
use crate::AppState;

/// List purchase orders, oldest sequence first
pub async fn list_purchase_orders(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let service = PurchaseOrderService::new(state.db);
    let pos = service.list_pos().await?;
    Ok(Json(pos))
}

/// Get a purchase order with per-line fill figures
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrderDetail>> {
    let service = PurchaseOrderService::new(state.db);
    let po = service.get_po(po_id).await?;
    Ok(Json(po))
}

/// Manager action: close a purchase order
pub async fn close_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let po = service.close_po(po_id).await?;
    Ok(Json(po))
}
