//! Receive, box and bag models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{BagStatus, ReceiveStatus};

/// An incoming shipment of tablets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receive {
    pub id: Uuid,
    pub name: String,
    pub status: ReceiveStatus,
    /// Set once the shipment has been physically emptied; closed receives are
    /// invisible to matching even when published
    pub closed: bool,
    /// Optional purchase order this whole receive was ordered against
    pub po_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receive {
    /// Whether this receive's bags participate in bag matching
    pub fn is_matchable(&self) -> bool {
        self.status == ReceiveStatus::Published && !self.closed
    }
}

/// A physical box grouping bags within a receive
///
/// Box numbers are location labels, not identity keys; bag identity is
/// (flavor, bag_number) per receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveBox {
    pub id: Uuid,
    pub receive_id: Uuid,
    pub box_number: i32,
}

/// The smallest physical inventory unit, numbered per flavor per receive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bag {
    pub id: Uuid,
    pub receive_id: Uuid,
    pub box_id: Option<Uuid>,
    pub flavor_id: Uuid,
    pub bag_number: i32,
    /// Expected tablet count from the bag label
    pub label_count: i64,
    pub status: BagStatus,
    /// Idempotency guard for pushing this bag to the external platform
    pub pushed: bool,
    /// External record id, set once pushed
    pub external_ref: Option<String>,
    /// Purchase order this bag's production is allocated against
    pub po_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a bag may be pushed to the external inventory platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEligibility {
    Eligible,
    /// The idempotency guard: a pushed bag is never pushed twice
    AlreadyPushed,
    /// Only fully packaged, closed bags leave the building
    NotClosed,
}

/// Gate for the external push, checked before the store claim is taken
pub fn push_eligibility(status: BagStatus, pushed: bool) -> PushEligibility {
    if pushed {
        PushEligibility::AlreadyPushed
    } else if status != BagStatus::Closed {
        PushEligibility::NotClosed
    } else {
        PushEligibility::Eligible
    }
}

/// A bag that matched a submission's (flavor, bag_number, box_number)
/// signature, with enough context for a manager to tell candidates apart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagCandidate {
    pub bag_id: Uuid,
    pub receive_id: Uuid,
    pub receive_name: String,
    pub flavor_id: Uuid,
    pub bag_number: i32,
    pub box_number: Option<i32>,
    pub label_count: i64,
    /// PO implied by the bag itself or its receive, if any
    pub po_id: Option<Uuid>,
}
