//! Purchase order and line item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::PoStatus;

/// A purchase order synced from the external inventory platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    /// Record id on the external inventory platform
    pub external_ref: String,
    /// Numeric PO sequence; oldest-first fill orders by this, not by date
    pub po_number: i64,
    pub status: PoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One flavor line on a purchase order
///
/// `good_count + damaged_count` may exceed `quantity_ordered`; the excess is
/// tracked as overs, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoLine {
    pub id: Uuid,
    pub po_id: Uuid,
    pub flavor_id: Uuid,
    pub quantity_ordered: i64,
    pub good_count: i64,
    pub damaged_count: i64,
}

impl PoLine {
    /// Total tablets allocated to this line so far
    pub fn total_allocated(&self) -> i64 {
        self.good_count + self.damaged_count
    }

    /// Unfilled capacity; zero once the line is at or past its order quantity
    pub fn remaining(&self) -> i64 {
        (self.quantity_ordered - self.total_allocated()).max(0)
    }

    /// Quantity allocated beyond the order quantity
    pub fn overs(&self) -> i64 {
        (self.total_allocated() - self.quantity_ordered).max(0)
    }
}

/// Move `good` and `damaged` counts from one line to another.
///
/// This is the arithmetic behind manager reassignment: the decrement and
/// increment happen together, so the total allocated quantity for the flavor
/// is conserved. The caller persists both lines in one transaction.
pub fn transfer_counts(source: &mut PoLine, target: &mut PoLine, good: i64, damaged: i64) {
    source.good_count -= good;
    source.damaged_count -= damaged;
    target.good_count += good;
    target.damaged_count += damaged;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ordered: i64, good: i64, damaged: i64) -> PoLine {
        PoLine {
            id: Uuid::new_v4(),
            po_id: Uuid::new_v4(),
            flavor_id: Uuid::new_v4(),
            quantity_ordered: ordered,
            good_count: good,
            damaged_count: damaged,
        }
    }

    #[test]
    fn test_remaining_counts_both_good_and_damaged() {
        let l = line(1000, 600, 150);
        assert_eq!(l.remaining(), 250);
        assert_eq!(l.overs(), 0);
    }

    #[test]
    fn test_overs_past_order_quantity() {
        let l = line(1000, 950, 100);
        assert_eq!(l.remaining(), 0);
        assert_eq!(l.overs(), 50);
    }

    #[test]
    fn test_exactly_filled_line() {
        let l = line(500, 500, 0);
        assert_eq!(l.remaining(), 0);
        assert_eq!(l.overs(), 0);
    }
}
