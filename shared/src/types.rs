//! Status enums and submission kinds used across the platform

use serde::{Deserialize, Serialize};

/// Purchase order lifecycle status
///
/// Draft orders are never eligible for allocation. The open -> processing
/// transition happens automatically once any allocation lands on the order;
/// closing is always an explicit manual action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoStatus {
    Draft,
    Open,
    Processing,
    Closed,
}

impl PoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoStatus::Draft => "draft",
            PoStatus::Open => "open",
            PoStatus::Processing => "processing",
            PoStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PoStatus::Draft),
            "open" => Some(PoStatus::Open),
            "processing" => Some(PoStatus::Processing),
            "closed" => Some(PoStatus::Closed),
            _ => None,
        }
    }

    /// Whether allocation may place counts on this order
    pub fn is_allocatable(&self) -> bool {
        matches!(self, PoStatus::Open | PoStatus::Processing)
    }

    /// Whether a manual close is allowed from this status
    pub fn can_close(&self) -> bool {
        matches!(self, PoStatus::Open | PoStatus::Processing)
    }

    /// Status after an allocation pass given the order's aggregate count.
    /// The only automatic transition is open -> processing once anything
    /// has landed; every other status is left alone.
    pub fn after_allocation(self, total_allocated: i64) -> Self {
        if self == PoStatus::Open && total_allocated > 0 {
            PoStatus::Processing
        } else {
            self
        }
    }
}

impl std::fmt::Display for PoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receive (incoming shipment) status
///
/// Publishing is one-way and all-or-nothing; draft receives are invisible to
/// the bag matcher. A published receive additionally carries a `closed` flag
/// once physically emptied, which also hides its bags from matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveStatus {
    Draft,
    Published,
}

impl ReceiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveStatus::Draft => "draft",
            ReceiveStatus::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ReceiveStatus::Draft),
            "published" => Some(ReceiveStatus::Published),
            _ => None,
        }
    }
}

/// Bag status; closing a bag is a manual action once it is fully packaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagStatus {
    Open,
    Closed,
}

impl BagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BagStatus::Open => "open",
            BagStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(BagStatus::Open),
            "closed" => Some(BagStatus::Closed),
            _ => None,
        }
    }
}

/// Kind of production submission entered by a warehouse worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    MachineCount,
    Packaged,
    BagCount,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::MachineCount => "machine_count",
            SubmissionKind::Packaged => "packaged",
            SubmissionKind::BagCount => "bag_count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "machine_count" => Some(SubmissionKind::MachineCount),
            "packaged" => Some(SubmissionKind::Packaged),
            "bag_count" => Some(SubmissionKind::BagCount),
            _ => None,
        }
    }
}
