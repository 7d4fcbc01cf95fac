//! Reassignment coordination: manager actions that move or confirm a
//! submission's PO assignment.
//!
//! A reassignment is a single transaction; the decrement and increment
//! either both commit or neither does, so the total allocated quantity for a
//! flavor is conserved. A plain approve touches no counts at all.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{transfer_counts, PoLine, PoStatus};

use crate::error::{AppError, AppResult};
use crate::services::status;

/// Reassignment service for manager corrections
#[derive(Clone)]
pub struct ReassignmentService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    po_id: Uuid,
    flavor_id: Uuid,
    quantity_ordered: i64,
    good_count: i64,
    damaged_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct AssignedSubmissionRow {
    flavor_id: Uuid,
    po_id: Option<Uuid>,
    good_count: i64,
    damaged_count: i64,
}

impl ReassignmentService {
    /// Create a new ReassignmentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Move a submission's allocated counts from its current PO to the
    /// target PO chosen by a manager, and mark the assignment verified.
    pub async fn reassign(&self, submission_id: Uuid, target_po_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let submission = sqlx::query_as::<_, AssignedSubmissionRow>(
            "SELECT flavor_id, po_id, good_count, damaged_count FROM submissions WHERE id = $1 FOR UPDATE",
        )
        .bind(submission_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission".to_string()))?;

        let current_po_id = submission.po_id.ok_or_else(|| {
            AppError::InvalidStateTransition(
                "submission has no PO assignment to move".to_string(),
            )
        })?;

        if current_po_id == target_po_id {
            return Err(AppError::Validation {
                field: "target_po_id".to_string(),
                message: "Target PO is the same as the current assignment".to_string(),
            });
        }

        let target_status = self.po_status(&mut tx, target_po_id).await?;
        if !target_status.is_allocatable() {
            return Err(AppError::InvalidStateTransition(format!(
                "target PO is {} and cannot receive allocations",
                target_status
            )));
        }

        // Move the counts; both lines must exist and the source line must
        // still hold what the submission put there
        let mut source = self
            .fetch_line(&mut tx, current_po_id, submission.flavor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Current PO line for flavor".to_string()))?;
        let mut target = self
            .fetch_line(&mut tx, target_po_id, submission.flavor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Target PO line for flavor".to_string()))?;

        if source.good_count < submission.good_count
            || source.damaged_count < submission.damaged_count
        {
            return Err(AppError::ConcurrencyConflict(
                "current PO line no longer holds the submission's counts".to_string(),
            ));
        }

        transfer_counts(
            &mut source,
            &mut target,
            submission.good_count,
            submission.damaged_count,
        );

        for line in [&source, &target] {
            sqlx::query(
                "UPDATE po_lines SET good_count = $1, damaged_count = $2 WHERE id = $3",
            )
            .bind(line.good_count)
            .bind(line.damaged_count)
            .bind(line.id)
            .execute(&mut *tx)
            .await?;
        }

        status::reevaluate_po(&mut tx, current_po_id).await?;
        status::reevaluate_po(&mut tx, target_po_id).await?;

        // Conditioned on the assignment read at the top of the transaction
        let updated = sqlx::query(
            r#"
            UPDATE submissions
            SET po_id = $1, assignment_verified = TRUE, updated_at = NOW()
            WHERE id = $2 AND po_id = $3
            "#,
        )
        .bind(target_po_id)
        .bind(submission_id)
        .bind(current_po_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(
                "submission was reassigned concurrently".to_string(),
            ));
        }

        tx.commit().await?;

        tracing::info!(
            %submission_id,
            from = %current_po_id,
            to = %target_po_id,
            "submission reassigned"
        );
        Ok(())
    }

    /// Confirm a submission's PO assignment without changing it
    pub async fn approve(&self, submission_id: Uuid) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE submissions SET assignment_verified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(submission_id)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Submission".to_string()));
        }

        Ok(())
    }

    /// Lock and fetch a flavor's line on a PO, if the PO has one
    async fn fetch_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        po_id: Uuid,
        flavor_id: Uuid,
    ) -> AppResult<Option<PoLine>> {
        let row = sqlx::query_as::<_, LineRow>(
            "SELECT id, po_id, flavor_id, quantity_ordered, good_count, damaged_count FROM po_lines WHERE po_id = $1 AND flavor_id = $2 FOR UPDATE",
        )
        .bind(po_id)
        .bind(flavor_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|r| PoLine {
            id: r.id,
            po_id: r.po_id,
            flavor_id: r.flavor_id,
            quantity_ordered: r.quantity_ordered,
            good_count: r.good_count,
            damaged_count: r.damaged_count,
        }))
    }

    async fn po_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        po_id: Uuid,
    ) -> AppResult<PoStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM purchase_orders WHERE id = $1",
        )
        .bind(po_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        PoStatus::from_str(&status)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown PO status '{}'", status)))
    }
}
