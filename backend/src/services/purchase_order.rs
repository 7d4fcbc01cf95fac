//! Purchase order read surface and manual close
//!
//! Exposes per-PO aggregate fill figures for reporting (ordered, good,
//! damaged, remaining, overs) and the explicit manual close action. Counts
//! never close a PO automatically; over- and under-delivery are routine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{PoLine, PoStatus, PurchaseOrder};

use crate::error::{AppError, AppResult};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

/// Fill figures for one PO line
#[derive(Debug, Serialize)]
pub struct PoLineFigures {
    pub line_id: Uuid,
    pub flavor_id: Uuid,
    pub flavor_name: String,
    pub quantity_ordered: i64,
    pub good_count: i64,
    pub damaged_count: i64,
    pub remaining: i64,
    pub overs: i64,
}

/// A purchase order with per-line fill figures
#[derive(Debug, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub po: PurchaseOrder,
    pub lines: Vec<PoLineFigures>,
}

#[derive(Debug, sqlx::FromRow)]
struct PoRow {
    id: Uuid,
    external_ref: String,
    po_number: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PoRow {
    fn into_po(self) -> AppResult<PurchaseOrder> {
        let status = PoStatus::from_str(&self.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown PO status '{}'", self.status))
        })?;
        Ok(PurchaseOrder {
            id: self.id,
            external_ref: self.external_ref,
            po_number: self.po_number,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineFiguresRow {
    line_id: Uuid,
    po_id: Uuid,
    flavor_id: Uuid,
    flavor_name: String,
    quantity_ordered: i64,
    good_count: i64,
    damaged_count: i64,
}

impl LineFiguresRow {
    fn into_figures(self) -> PoLineFigures {
        let line = PoLine {
            id: self.line_id,
            po_id: self.po_id,
            flavor_id: self.flavor_id,
            quantity_ordered: self.quantity_ordered,
            good_count: self.good_count,
            damaged_count: self.damaged_count,
        };
        PoLineFigures {
            line_id: line.id,
            flavor_id: line.flavor_id,
            flavor_name: self.flavor_name,
            quantity_ordered: line.quantity_ordered,
            good_count: line.good_count,
            damaged_count: line.damaged_count,
            remaining: line.remaining(),
            overs: line.overs(),
        }
    }
}

impl PurchaseOrderService {
    /// Create a new PurchaseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List purchase orders, oldest sequence first
    pub async fn list_pos(&self) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PoRow>(
            "SELECT id, external_ref, po_number, status, created_at, updated_at FROM purchase_orders ORDER BY po_number",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PoRow::into_po).collect()
    }

    /// Get a purchase order with per-line fill figures
    pub async fn get_po(&self, po_id: Uuid) -> AppResult<PurchaseOrderDetail> {
        let po = self.fetch_po(po_id).await?;

        let lines = sqlx::query_as::<_, LineFiguresRow>(
            r#"
            SELECT pl.id AS line_id, pl.po_id, pl.flavor_id, f.name AS flavor_name,
                   pl.quantity_ordered, pl.good_count, pl.damaged_count
            FROM po_lines pl
            JOIN flavors f ON f.id = pl.flavor_id
            WHERE pl.po_id = $1
            ORDER BY f.name
            "#,
        )
        .bind(po_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseOrderDetail {
            po,
            lines: lines.into_iter().map(LineFiguresRow::into_figures).collect(),
        })
    }

    /// Manager action: close a purchase order. Never automatic; over- and
    /// under-delivered orders stay open until someone decides they are done.
    pub async fn close_po(&self, po_id: Uuid) -> AppResult<PurchaseOrder> {
        let po = self.fetch_po(po_id).await?;
        if !po.status.can_close() {
            return Err(AppError::InvalidStateTransition(format!(
                "cannot close a {} purchase order",
                po.status
            )));
        }

        let updated = sqlx::query(
            "UPDATE purchase_orders SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(PoStatus::Closed.as_str())
        .bind(po_id)
        .bind(po.status.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(
                "purchase order status changed concurrently".to_string(),
            ));
        }

        tracing::info!(%po_id, "purchase order closed");
        self.fetch_po(po_id).await
    }

    async fn fetch_po(&self, po_id: Uuid) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PoRow>(
            "SELECT id, external_ref, po_number, status, created_at, updated_at FROM purchase_orders WHERE id = $1",
        )
        .bind(po_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        row.into_po()
    }
}
