//! Bag matching service: resolves a submission's (flavor, bag_number,
//! box_number) signature to a physical bag, and short-circuits matching for
//! chained submissions carrying a receipt correlation key.
//!
//! Bag numbers are global per flavor within a receive, so the same signature
//! can exist in several concurrently active receives. Anything other than
//! exactly one candidate is never guessed: it is surfaced as an ambiguous,
//! reviewable outcome instead.

use sqlx::PgPool;
use uuid::Uuid;

use shared::{box_numbers_compatible, check_receipt_flavor, BagCandidate, MatchOutcome};

use crate::error::AppResult;

/// Bag matcher service
#[derive(Clone)]
pub struct BagMatcherService {
    db: PgPool,
}

/// Row for the candidate bag query
#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    bag_id: Uuid,
    receive_id: Uuid,
    receive_name: String,
    flavor_id: Uuid,
    bag_number: i32,
    box_number: Option<i32>,
    label_count: i64,
    bag_po_id: Option<Uuid>,
    receive_po_id: Option<Uuid>,
}

impl CandidateRow {
    fn into_candidate(self) -> BagCandidate {
        BagCandidate {
            bag_id: self.bag_id,
            receive_id: self.receive_id,
            receive_name: self.receive_name,
            flavor_id: self.flavor_id,
            bag_number: self.bag_number,
            box_number: self.box_number,
            label_count: self.label_count,
            // The bag's own PO link wins over the receive-level assignment
            po_id: self.bag_po_id.or(self.receive_po_id),
        }
    }
}

/// Row for the receipt inheritance query
#[derive(Debug, sqlx::FromRow)]
struct PriorSubmissionRow {
    prior_flavor_id: Uuid,
    prior_flavor_name: String,
    bag_id: Uuid,
    receive_id: Uuid,
    receive_name: String,
    bag_number: i32,
    box_number: Option<i32>,
    label_count: i64,
    bag_po_id: Option<Uuid>,
    receive_po_id: Option<Uuid>,
}

impl BagMatcherService {
    /// Create a new BagMatcherService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Find all open bags matching the signature in published, non-closed
    /// receives
    ///
    /// The candidate list stays queryable after an ambiguous match so a
    /// manager can later pick one explicitly.
    pub async fn find_candidates(
        &self,
        flavor_id: Uuid,
        bag_number: i32,
        box_number: Option<i32>,
    ) -> AppResult<Vec<BagCandidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT b.id AS bag_id, b.receive_id, r.name AS receive_name, b.flavor_id,
                   b.bag_number, bx.box_number, b.label_count,
                   b.po_id AS bag_po_id, r.po_id AS receive_po_id
            FROM bags b
            JOIN receives r ON r.id = b.receive_id
            LEFT JOIN boxes bx ON bx.id = b.box_id
            WHERE r.status = 'published' AND r.closed = FALSE
              AND b.status = 'open'
              AND b.flavor_id = $1 AND b.bag_number = $2
            ORDER BY r.created_at, b.id
            "#,
        )
        .bind(flavor_id)
        .bind(bag_number)
        .fetch_all(&self.db)
        .await?;

        // Box tolerance is applied here, not in SQL, so the legacy-vs-new
        // numbering rule lives in exactly one function
        Ok(rows
            .into_iter()
            .map(CandidateRow::into_candidate)
            .filter(|c| box_numbers_compatible(box_number, c.box_number))
            .collect())
    }

    /// Resolve a submission signature to a match outcome
    pub async fn match_bag(
        &self,
        flavor_id: Uuid,
        bag_number: i32,
        box_number: Option<i32>,
    ) -> AppResult<MatchOutcome> {
        let candidates = self
            .find_candidates(flavor_id, bag_number, box_number)
            .await?;
        let outcome = MatchOutcome::from_candidates(candidates);

        if outcome.needs_review() {
            tracing::warn!(
                %flavor_id,
                bag_number,
                "ambiguous bag match, flagging submission for review"
            );
        }

        Ok(outcome)
    }

    /// Inherit the resolved bag from an earlier submission with the same
    /// receipt correlation key, if one exists.
    ///
    /// Guard: the prior submission's flavor must equal the new submission's
    /// flavor. On mismatch the submission is rejected outright; falling back
    /// to box/bag matching here is exactly the silent cross-flavor
    /// misattribution this resolver exists to prevent.
    pub async fn resolve_receipt(
        &self,
        receipt_key: &str,
        flavor_id: Uuid,
        flavor_name: &str,
    ) -> AppResult<Option<BagCandidate>> {
        let row = sqlx::query_as::<_, PriorSubmissionRow>(
            r#"
            SELECT s.flavor_id AS prior_flavor_id, f.name AS prior_flavor_name,
                   b.id AS bag_id, b.receive_id, r.name AS receive_name,
                   b.bag_number, bx.box_number, b.label_count,
                   b.po_id AS bag_po_id, r.po_id AS receive_po_id
            FROM submissions s
            JOIN bags b ON b.id = s.bag_id
            JOIN receives r ON r.id = b.receive_id
            JOIN flavors f ON f.id = s.flavor_id
            LEFT JOIN boxes bx ON bx.id = b.box_id
            WHERE s.receipt_key = $1 AND s.bag_id IS NOT NULL
            ORDER BY s.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(receipt_key)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        check_receipt_flavor(
            row.prior_flavor_id,
            &row.prior_flavor_name,
            flavor_id,
            flavor_name,
        )?;

        Ok(Some(BagCandidate {
            bag_id: row.bag_id,
            receive_id: row.receive_id,
            receive_name: row.receive_name,
            flavor_id: row.prior_flavor_id,
            bag_number: row.bag_number,
            box_number: row.box_number,
            label_count: row.label_count,
            po_id: row.bag_po_id.or(row.receive_po_id),
        }))
    }
}
