//! Submission pipeline: one transaction per submission covering receipt
//! inheritance, bag matching, PO allocation and status re-evaluation.
//!
//! Bag resolution happens against a pre-read snapshot; the claiming writes
//! inside the transaction are conditioned on that snapshot still holding, so
//! two submissions racing for the same unresolved bag cannot both succeed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use shared::{choose_candidate, BagCandidate, MatchOutcome, Submission, SubmissionKind};

use crate::error::{AppError, AppResult};
use crate::services::{allocation, status, BagMatcherService};

/// Submission service orchestrating the matching and allocation pipeline
#[derive(Clone)]
pub struct SubmissionService {
    db: PgPool,
}

/// Input for creating a production submission
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionInput {
    pub kind: SubmissionKind,
    pub flavor_id: Uuid,
    #[validate(range(min = 1, message = "Bag number must be at least 1"))]
    pub bag_number: i32,
    pub box_number: Option<i32>,
    #[validate(length(min = 1, max = 64, message = "Receipt key must be 1-64 characters"))]
    pub receipt_key: Option<String>,
    #[validate(range(min = 0, message = "Good count cannot be negative"))]
    pub good_count: i64,
    #[validate(range(min = 0, message = "Damaged count cannot be negative"))]
    pub damaged_count: i64,
}

/// A created or fetched submission together with its match outcome
#[derive(Debug, Serialize)]
pub struct SubmissionResult {
    pub submission: Submission,
    pub outcome: MatchOutcome,
}

#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    kind: String,
    flavor_id: Uuid,
    bag_number: i32,
    box_number: Option<i32>,
    receipt_key: Option<String>,
    bag_id: Option<Uuid>,
    po_id: Option<Uuid>,
    good_count: i64,
    damaged_count: i64,
    needs_review: bool,
    assignment_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubmissionRow {
    fn into_submission(self) -> AppResult<Submission> {
        let kind = SubmissionKind::from_str(&self.kind).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown submission kind '{}'", self.kind))
        })?;
        Ok(Submission {
            id: self.id,
            kind,
            flavor_id: self.flavor_id,
            bag_number: self.bag_number,
            box_number: self.box_number,
            receipt_key: self.receipt_key,
            bag_id: self.bag_id,
            po_id: self.po_id,
            good_count: self.good_count,
            damaged_count: self.damaged_count,
            needs_review: self.needs_review,
            assignment_verified: self.assignment_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SUBMISSION_COLUMNS: &str = "id, kind, flavor_id, bag_number, box_number, receipt_key, \
     bag_id, po_id, good_count, damaged_count, needs_review, assignment_verified, \
     created_at, updated_at";

impl SubmissionService {
    /// Create a new SubmissionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Run the full submission pipeline:
    /// receipt inheritance -> bag matching -> allocation -> status update.
    ///
    /// Ambiguous matches and missing receives are valid recorded outcomes;
    /// only validation failures and cross-product receipts reject the
    /// submission outright.
    pub async fn create_submission(
        &self,
        input: CreateSubmissionInput,
    ) -> AppResult<SubmissionResult> {
        input.validate()?;

        let flavor_name = self.get_flavor_name(input.flavor_id).await?;
        let matcher = BagMatcherService::new(self.db.clone());

        // Resolve the bag: a receipt key short-circuits matching entirely
        let (outcome, inherited) = match input.receipt_key.as_deref() {
            Some(key) => match matcher
                .resolve_receipt(key, input.flavor_id, &flavor_name)
                .await?
            {
                Some(bag) => (MatchOutcome::Matched { bag }, true),
                None => (
                    matcher
                        .match_bag(input.flavor_id, input.bag_number, input.box_number)
                        .await?,
                    false,
                ),
            },
            None => (
                matcher
                    .match_bag(input.flavor_id, input.bag_number, input.box_number)
                    .await?,
                false,
            ),
        };

        // An inherited submission takes its bag/box numbers from the earlier
        // submission's resolved bag
        let (bag_number, box_number) = match (&outcome, inherited) {
            (MatchOutcome::Matched { bag }, true) => (bag.bag_number, bag.box_number),
            _ => (input.bag_number, input.box_number),
        };

        let (bag_id, needs_review) = match &outcome {
            MatchOutcome::Matched { bag } => (Some(bag.bag_id), false),
            MatchOutcome::Ambiguous { .. } => (None, true),
            MatchOutcome::Unmatched => (None, false),
        };

        let mut tx = self.db.begin().await?;

        let submission_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO submissions (kind, flavor_id, bag_number, box_number, receipt_key,
                                     bag_id, good_count, damaged_count, needs_review)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(input.kind.as_str())
        .bind(input.flavor_id)
        .bind(bag_number)
        .bind(box_number)
        .bind(&input.receipt_key)
        .bind(bag_id)
        .bind(input.good_count)
        .bind(input.damaged_count)
        .bind(needs_review)
        .fetch_one(&mut *tx)
        .await?;

        if let MatchOutcome::Matched { bag } = &outcome {
            self.allocate_for_bag(
                &mut tx,
                submission_id,
                bag,
                input.flavor_id,
                input.good_count,
                input.damaged_count,
            )
            .await?;
        }

        tx.commit().await?;

        let submission = self.fetch_submission(submission_id).await?;
        Ok(SubmissionResult {
            submission,
            outcome,
        })
    }

    /// Manager action: resolve an ambiguous submission by picking one of the
    /// surfaced candidate bags.
    pub async fn resolve_ambiguous(
        &self,
        submission_id: Uuid,
        bag_id: Uuid,
    ) -> AppResult<Submission> {
        let submission = self.fetch_submission(submission_id).await?;

        if !submission.needs_review || submission.bag_id.is_some() {
            return Err(AppError::InvalidStateTransition(
                "submission is not awaiting review".to_string(),
            ));
        }

        // The chosen bag must be one the matcher actually surfaced for this
        // submission's signature; anything else is rejected so the stored
        // resolution always agrees with the candidate read surface
        let matcher = BagMatcherService::new(self.db.clone());
        let candidates = matcher
            .find_candidates(
                submission.flavor_id,
                submission.bag_number,
                submission.box_number,
            )
            .await?;
        let bag = choose_candidate(candidates, bag_id).ok_or_else(|| AppError::Validation {
            field: "bag_id".to_string(),
            message: "Chosen bag is not a candidate for this submission".to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        // Claim conditioned on the pre-read unresolved state
        let claimed = sqlx::query(
            r#"
            UPDATE submissions
            SET bag_id = $1, needs_review = FALSE, assignment_verified = TRUE,
                updated_at = NOW()
            WHERE id = $2 AND bag_id IS NULL AND needs_review = TRUE
            "#,
        )
        .bind(bag_id)
        .bind(submission_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(
                "submission was resolved concurrently".to_string(),
            ));
        }

        self.allocate_for_bag(
            &mut tx,
            submission_id,
            &bag,
            submission.flavor_id,
            submission.good_count,
            submission.damaged_count,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(%submission_id, %bag_id, "ambiguous submission resolved by manager");
        self.fetch_submission(submission_id).await
    }

    /// Get a submission; ambiguous submissions include their current
    /// candidate list so a manager can choose
    pub async fn get_submission(&self, submission_id: Uuid) -> AppResult<SubmissionResult> {
        let submission = self.fetch_submission(submission_id).await?;
        let matcher = BagMatcherService::new(self.db.clone());

        let outcome = if submission.needs_review {
            let candidates = matcher
                .find_candidates(
                    submission.flavor_id,
                    submission.bag_number,
                    submission.box_number,
                )
                .await?;
            MatchOutcome::Ambiguous { candidates }
        } else if let Some(bag_id) = submission.bag_id {
            let candidates = matcher
                .find_candidates(
                    submission.flavor_id,
                    submission.bag_number,
                    submission.box_number,
                )
                .await?;
            match candidates.into_iter().find(|c| c.bag_id == bag_id) {
                Some(bag) => MatchOutcome::Matched { bag },
                // Resolved bag's receive has since been closed
                None => MatchOutcome::Unmatched,
            }
        } else {
            MatchOutcome::Unmatched
        };

        Ok(SubmissionResult {
            submission,
            outcome,
        })
    }

    /// List submissions flagged for manager review
    pub async fn list_needing_review(&self) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {} FROM submissions WHERE needs_review = TRUE ORDER BY created_at",
            SUBMISSION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }

    /// Allocate counts for a matched bag inside the pipeline transaction:
    /// apply placements, link the bag to its PO, update touched PO statuses
    /// and record the submission's primary PO.
    async fn allocate_for_bag(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        submission_id: Uuid,
        bag: &BagCandidate,
        flavor_id: Uuid,
        good_count: i64,
        damaged_count: i64,
    ) -> AppResult<()> {
        // Zero-quantity submissions are recorded but allocate nothing
        if good_count == 0 && damaged_count == 0 {
            return Ok(());
        }

        let placements =
            allocation::allocate(tx, flavor_id, bag.po_id, good_count, damaged_count).await?;

        let Some(first) = placements.first() else {
            // No eligible PO; counts stay unallocated on the submission
            tracing::warn!(%submission_id, %flavor_id, "no eligible purchase order for allocation");
            return Ok(());
        };
        let primary_po = first.po_id;

        for placement in &placements {
            status::reevaluate_po(tx, placement.po_id).await?;
        }

        // First allocation claims the bag for its PO; the condition fails if
        // a concurrent submission already linked it elsewhere
        if bag.po_id.is_none() {
            let claimed = sqlx::query(
                "UPDATE bags SET po_id = $1, updated_at = NOW() WHERE id = $2 AND po_id IS NULL",
            )
            .bind(primary_po)
            .bind(bag.bag_id)
            .execute(&mut **tx)
            .await?;

            if claimed.rows_affected() == 0 {
                return Err(AppError::ConcurrencyConflict(
                    "bag was claimed by a concurrent submission".to_string(),
                ));
            }
        }

        sqlx::query("UPDATE submissions SET po_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(primary_po)
            .bind(submission_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    async fn fetch_submission(&self, submission_id: Uuid) -> AppResult<Submission> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {} FROM submissions WHERE id = $1",
            SUBMISSION_COLUMNS
        ))
        .bind(submission_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission".to_string()))?;

        row.into_submission()
    }

    async fn get_flavor_name(&self, flavor_id: Uuid) -> AppResult<String> {
        sqlx::query_scalar::<_, String>("SELECT name FROM flavors WHERE id = $1")
            .bind(flavor_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Flavor".to_string()))
    }
}
