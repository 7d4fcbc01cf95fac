//! Purchase order allocation: applies the shared sequential-fill planner to
//! the store inside the caller's transaction.
//!
//! Eligible orders are the open/processing POs for the submission's flavor,
//! oldest PO sequence first. When the matched bag (or its receive) already
//! implies a PO, the counts go to that order alone, overs included.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use shared::{plan_fill, LineState, Placement};

use crate::error::AppResult;

/// Row for eligible line queries
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    line_id: Uuid,
    po_id: Uuid,
    quantity_ordered: i64,
    good_count: i64,
    damaged_count: i64,
}

impl LineRow {
    fn into_state(self) -> LineState {
        LineState {
            line_id: self.line_id,
            po_id: self.po_id,
            quantity_ordered: self.quantity_ordered,
            good_count: self.good_count,
            damaged_count: self.damaged_count,
        }
    }
}

/// Allocate a submission's counts across PO lines for the flavor.
///
/// Returns the applied placements, oldest PO first; empty when there is no
/// eligible PO (the counts then stay unallocated on the submission).
pub async fn allocate(
    tx: &mut Transaction<'_, Postgres>,
    flavor_id: Uuid,
    implied_po: Option<Uuid>,
    good_count: i64,
    damaged_count: i64,
) -> AppResult<Vec<Placement>> {
    let lines = match implied_po {
        Some(po_id) => {
            let lines = lines_for_po(tx, po_id, flavor_id).await?;
            if lines.is_empty() {
                // The implied PO is draft, closed, or has no line for this
                // flavor; fall back to fresh oldest-first selection
                eligible_lines(tx, flavor_id).await?
            } else {
                lines
            }
        }
        None => eligible_lines(tx, flavor_id).await?,
    };

    let placements = plan_fill(&lines, good_count, damaged_count);

    for placement in &placements {
        sqlx::query(
            "UPDATE po_lines SET good_count = good_count + $1, damaged_count = damaged_count + $2 WHERE id = $3",
        )
        .bind(placement.good)
        .bind(placement.damaged)
        .bind(placement.line_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(placements)
}

/// Open/processing PO lines for a flavor, oldest PO sequence first.
/// Rows are locked so concurrent allocations for the same flavor serialize
/// through the store rather than application locks.
async fn eligible_lines(
    tx: &mut Transaction<'_, Postgres>,
    flavor_id: Uuid,
) -> AppResult<Vec<LineState>> {
    let rows = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT pl.id AS line_id, pl.po_id, pl.quantity_ordered, pl.good_count, pl.damaged_count
        FROM po_lines pl
        JOIN purchase_orders po ON po.id = pl.po_id
        WHERE pl.flavor_id = $1 AND po.status IN ('open', 'processing')
        ORDER BY po.po_number ASC
        FOR UPDATE OF pl
        "#,
    )
    .bind(flavor_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(LineRow::into_state).collect())
}

/// The implied PO's line for a flavor, if the PO is still allocatable
async fn lines_for_po(
    tx: &mut Transaction<'_, Postgres>,
    po_id: Uuid,
    flavor_id: Uuid,
) -> AppResult<Vec<LineState>> {
    let rows = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT pl.id AS line_id, pl.po_id, pl.quantity_ordered, pl.good_count, pl.damaged_count
        FROM po_lines pl
        JOIN purchase_orders po ON po.id = pl.po_id
        WHERE pl.po_id = $1 AND pl.flavor_id = $2 AND po.status IN ('open', 'processing')
        FOR UPDATE OF pl
        "#,
    )
    .bind(po_id)
    .bind(flavor_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(LineRow::into_state).collect())
}
