//! Receive and bag lifecycle service
//!
//! Publishing a receive is one-way and all-or-nothing; the closed flag marks
//! a physically emptied receive. Both states remove the receive's bags from
//! the bag matcher's candidate set. Closing a bag is the prerequisite for
//! pushing it to the external inventory platform, and the push is guarded so
//! it happens at most once per bag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{next_bag_number, push_eligibility, BagStatus, PushEligibility, Receive, ReceiveStatus};

use crate::error::{AppError, AppResult};
use crate::external::inventory_platform::{BagPushRequest, InventoryPlatformClient};

/// Receive service for shipment and bag state transitions
#[derive(Clone)]
pub struct ReceiveService {
    db: PgPool,
    platform: InventoryPlatformClient,
}

/// A receive with its bags, for the read surface
#[derive(Debug, Serialize)]
pub struct ReceiveWithBags {
    #[serde(flatten)]
    pub receive: Receive,
    pub bags: Vec<BagSummary>,
}

/// Bag listing entry within a receive
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BagSummary {
    pub id: Uuid,
    pub flavor_id: Uuid,
    pub flavor_name: String,
    pub bag_number: i32,
    pub box_number: Option<i32>,
    pub label_count: i64,
    pub status: String,
    pub pushed: bool,
    pub external_ref: Option<String>,
    pub po_id: Option<Uuid>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReceiveRow {
    id: Uuid,
    name: String,
    status: String,
    closed: bool,
    po_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReceiveRow {
    fn into_receive(self) -> AppResult<Receive> {
        let status = ReceiveStatus::from_str(&self.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown receive status '{}'", self.status))
        })?;
        Ok(Receive {
            id: self.id,
            name: self.name,
            status,
            closed: self.closed,
            po_id: self.po_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ReceiveService {
    /// Create a new ReceiveService instance
    pub fn new(db: PgPool, platform: InventoryPlatformClient) -> Self {
        Self { db, platform }
    }

    /// Get a receive with its bags
    pub async fn get_receive(&self, receive_id: Uuid) -> AppResult<ReceiveWithBags> {
        let receive = self.fetch_receive(receive_id).await?;

        let bags = sqlx::query_as::<_, BagSummary>(
            r#"
            SELECT b.id, b.flavor_id, f.name AS flavor_name, b.bag_number,
                   bx.box_number, b.label_count, b.status, b.pushed, b.external_ref, b.po_id
            FROM bags b
            JOIN flavors f ON f.id = b.flavor_id
            LEFT JOIN boxes bx ON bx.id = b.box_id
            WHERE b.receive_id = $1
            ORDER BY f.name, b.bag_number
            "#,
        )
        .bind(receive_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ReceiveWithBags { receive, bags })
    }

    /// Manager action: publish a draft receive, making its bags visible to
    /// matching. One-way; there is no unpublish.
    pub async fn publish_receive(&self, receive_id: Uuid) -> AppResult<Receive> {
        let receive = self.fetch_receive(receive_id).await?;
        if receive.status == ReceiveStatus::Published {
            return Err(AppError::InvalidStateTransition(
                "receive is already published".to_string(),
            ));
        }

        let updated = sqlx::query(
            "UPDATE receives SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(ReceiveStatus::Published.as_str())
        .bind(receive_id)
        .bind(ReceiveStatus::Draft.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(
                "receive status changed concurrently".to_string(),
            ));
        }

        tracing::info!(%receive_id, "receive published");
        self.fetch_receive(receive_id).await
    }

    /// Manager action: mark a published receive as physically emptied,
    /// removing its bags from the matcher's candidate set
    pub async fn close_receive(&self, receive_id: Uuid) -> AppResult<Receive> {
        let receive = self.fetch_receive(receive_id).await?;
        if receive.status != ReceiveStatus::Published {
            return Err(AppError::InvalidStateTransition(
                "only published receives can be closed".to_string(),
            ));
        }
        if receive.closed {
            return Err(AppError::InvalidStateTransition(
                "receive is already closed".to_string(),
            ));
        }

        sqlx::query("UPDATE receives SET closed = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(receive_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%receive_id, "receive closed");
        self.fetch_receive(receive_id).await
    }

    /// Manager action: close a fully packaged bag, making it eligible for
    /// the external push
    pub async fn close_bag(&self, bag_id: Uuid) -> AppResult<()> {
        let status = sqlx::query_scalar::<_, String>("SELECT status FROM bags WHERE id = $1")
            .bind(bag_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Bag".to_string()))?;

        if status == BagStatus::Closed.as_str() {
            return Err(AppError::InvalidStateTransition(
                "bag is already closed".to_string(),
            ));
        }

        sqlx::query("UPDATE bags SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(BagStatus::Closed.as_str())
            .bind(bag_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%bag_id, "bag closed");
        Ok(())
    }

    /// Push a closed bag to the external inventory platform.
    ///
    /// The pushed flag is claimed before the external call, so a second push
    /// attempt is rejected without any duplicate API call; if the call fails
    /// the claim is released.
    pub async fn push_bag(&self, bag_id: Uuid) -> AppResult<String> {
        let bag = sqlx::query_as::<_, PushBagRow>(
            r#"
            SELECT b.bag_number, b.label_count, b.status, b.pushed, f.name AS flavor_name
            FROM bags b
            JOIN flavors f ON f.id = b.flavor_id
            WHERE b.id = $1
            "#,
        )
        .bind(bag_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bag".to_string()))?;

        let status = BagStatus::from_str(&bag.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown bag status '{}'", bag.status))
        })?;
        match push_eligibility(status, bag.pushed) {
            PushEligibility::AlreadyPushed => {
                return Err(AppError::DuplicatePush(bag_id.to_string()));
            }
            PushEligibility::NotClosed => {
                return Err(AppError::InvalidStateTransition(
                    "bag must be closed before pushing".to_string(),
                ));
            }
            PushEligibility::Eligible => {}
        }

        // Claim the push before calling out; losing the race means another
        // request already pushed this bag
        let claimed =
            sqlx::query("UPDATE bags SET pushed = TRUE, updated_at = NOW() WHERE id = $1 AND pushed = FALSE")
                .bind(bag_id)
                .execute(&self.db)
                .await?;
        if claimed.rows_affected() == 0 {
            return Err(AppError::DuplicatePush(bag_id.to_string()));
        }

        let (good_count, damaged_count) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COALESCE(SUM(good_count), 0)::BIGINT, COALESCE(SUM(damaged_count), 0)::BIGINT FROM submissions WHERE bag_id = $1",
        )
        .bind(bag_id)
        .fetch_one(&self.db)
        .await?;

        let request = BagPushRequest {
            bag_id,
            flavor: bag.flavor_name,
            bag_number: bag.bag_number,
            label_count: bag.label_count,
            good_count,
            damaged_count,
        };

        let external_ref = match self.platform.push_bag(&request).await {
            Ok(external_ref) => external_ref,
            Err(err) => {
                // Release the claim so the push can be retried
                sqlx::query("UPDATE bags SET pushed = FALSE, updated_at = NOW() WHERE id = $1")
                    .bind(bag_id)
                    .execute(&self.db)
                    .await?;
                return Err(err);
            }
        };

        sqlx::query("UPDATE bags SET external_ref = $1, updated_at = NOW() WHERE id = $2")
            .bind(&external_ref)
            .bind(bag_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%bag_id, %external_ref, "bag pushed to inventory platform");
        Ok(external_ref)
    }

    /// Next bag number for a flavor within a receive, derived from persisted
    /// state rather than a mutable counter
    pub async fn next_bag_number(&self, receive_id: Uuid, flavor_id: Uuid) -> AppResult<i32> {
        // Receive must exist even if it has no bags yet
        self.fetch_receive(receive_id).await?;

        let current_max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(bag_number) FROM bags WHERE receive_id = $1 AND flavor_id = $2",
        )
        .bind(receive_id)
        .bind(flavor_id)
        .fetch_one(&self.db)
        .await?;

        Ok(next_bag_number(current_max))
    }

    async fn fetch_receive(&self, receive_id: Uuid) -> AppResult<Receive> {
        let row = sqlx::query_as::<_, ReceiveRow>(
            "SELECT id, name, status, closed, po_id, created_at, updated_at FROM receives WHERE id = $1",
        )
        .bind(receive_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Receive".to_string()))?;

        row.into_receive()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PushBagRow {
    bag_number: i32,
    label_count: i64,
    status: String,
    pushed: bool,
    flavor_name: String,
}
