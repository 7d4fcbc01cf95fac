//! Status coordination for purchase orders
//!
//! PO status is derived, never set directly except by an explicit manual
//! close. The only automatic transition is open -> processing once any
//! allocation has landed; over- and under-delivery are common, so counts
//! alone never close a PO.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use shared::PoStatus;

use crate::error::{AppError, AppResult};

/// Re-derive a purchase order's status from its aggregate allocation.
///
/// Called inside the allocating transaction for every PO a placement or
/// reassignment touched.
pub async fn reevaluate_po(tx: &mut Transaction<'_, Postgres>, po_id: Uuid) -> AppResult<()> {
    let row = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT po.status,
               COALESCE(SUM(pl.good_count + pl.damaged_count), 0)::BIGINT AS total_allocated
        FROM purchase_orders po
        LEFT JOIN po_lines pl ON pl.po_id = po.id
        WHERE po.id = $1
        GROUP BY po.id, po.status
        "#,
    )
    .bind(po_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

    let status = PoStatus::from_str(&row.0)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown PO status '{}'", row.0)))?;

    let next = status.after_allocation(row.1);
    if next != status {
        sqlx::query("UPDATE purchase_orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next.as_str())
            .bind(po_id)
            .execute(&mut **tx)
            .await?;

        tracing::info!(%po_id, from = %status, to = %next, "purchase order status advanced");
    }

    Ok(())
}
