//! Production submission model and match outcome

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::BagCandidate;
use crate::types::SubmissionKind;

/// A warehouse production count entered against a bag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub flavor_id: Uuid,
    pub bag_number: i32,
    /// Legacy-compatibility only; new receives treat box numbers as metadata
    pub box_number: Option<i32>,
    /// Correlation key linking chained submissions (packaging after a
    /// machine count) so they inherit the same resolved bag
    pub receipt_key: Option<String>,
    pub bag_id: Option<Uuid>,
    pub po_id: Option<Uuid>,
    pub good_count: i64,
    pub damaged_count: i64,
    /// True when bag matching was ambiguous and a manager must resolve it
    pub needs_review: bool,
    /// True once a manager has confirmed or corrected the PO assignment
    pub assignment_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of resolving a submission signature against candidate bags
///
/// Ambiguity is a valid persisted state, not an error: a wrong silent match
/// corrupts counts across flavors and receives, so anything other than
/// exactly one candidate is surfaced for human review instead of guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched { bag: BagCandidate },
    Ambiguous { candidates: Vec<BagCandidate> },
    Unmatched,
}

impl MatchOutcome {
    /// Resolve a candidate set: one candidate auto-matches, two or more are
    /// ambiguous, none is unmatched
    pub fn from_candidates(mut candidates: Vec<BagCandidate>) -> Self {
        match candidates.len() {
            0 => MatchOutcome::Unmatched,
            1 => MatchOutcome::Matched {
                bag: candidates.remove(0),
            },
            _ => MatchOutcome::Ambiguous { candidates },
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    pub fn needs_review(&self) -> bool {
        matches!(self, MatchOutcome::Ambiguous { .. })
    }
}

/// Pick a manager's chosen bag out of a submission's current candidate set.
///
/// Resolution is only ever allowed onto a bag the matcher actually surfaced
/// for the submission's signature; any other bag id yields `None` and the
/// resolution is rejected.
pub fn choose_candidate(candidates: Vec<BagCandidate>, bag_id: Uuid) -> Option<BagCandidate> {
    candidates.into_iter().find(|c| c.bag_id == bag_id)
}

/// Receipt inheritance guard failure: a chained submission referenced a
/// receipt resolved for a different flavor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("receipt was resolved for flavor '{original}' but submission is for flavor '{attempted}'")]
pub struct CrossProductReceipt {
    pub original: String,
    pub attempted: String,
}

/// Check that a chained submission's flavor matches the flavor of the
/// submission it inherits from. Re-matching by box/bag number alone used to
/// attribute counts to the wrong flavor's receive whenever two products
/// shared a bag number; inheritance plus this guard removes that bug class.
pub fn check_receipt_flavor(
    original_flavor_id: Uuid,
    original_flavor_name: &str,
    attempted_flavor_id: Uuid,
    attempted_flavor_name: &str,
) -> Result<(), CrossProductReceipt> {
    if original_flavor_id == attempted_flavor_id {
        Ok(())
    } else {
        Err(CrossProductReceipt {
            original: original_flavor_name.to_string(),
            attempted: attempted_flavor_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(bag_number: i32) -> BagCandidate {
        BagCandidate {
            bag_id: Uuid::new_v4(),
            receive_id: Uuid::new_v4(),
            receive_name: "R1".to_string(),
            flavor_id: Uuid::new_v4(),
            bag_number,
            box_number: None,
            label_count: 5000,
            po_id: None,
        }
    }

    #[test]
    fn test_single_candidate_auto_matches() {
        let c = candidate(2);
        let outcome = MatchOutcome::from_candidates(vec![c.clone()]);
        assert_eq!(outcome, MatchOutcome::Matched { bag: c });
        assert!(!outcome.needs_review());
    }

    #[test]
    fn test_two_candidates_are_ambiguous() {
        let outcome = MatchOutcome::from_candidates(vec![candidate(2), candidate(2)]);
        assert!(outcome.needs_review());
        match outcome {
            MatchOutcome::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_no_candidates_is_unmatched() {
        assert_eq!(MatchOutcome::from_candidates(vec![]), MatchOutcome::Unmatched);
    }

    #[test]
    fn test_receipt_guard_names_both_flavors() {
        let blue = Uuid::new_v4();
        let mint = Uuid::new_v4();
        let err = check_receipt_flavor(blue, "BlueRazz", mint, "Spearmint").unwrap_err();
        assert_eq!(err.original, "BlueRazz");
        assert_eq!(err.attempted, "Spearmint");
        assert!(err.to_string().contains("BlueRazz"));
        assert!(err.to_string().contains("Spearmint"));
    }

    #[test]
    fn test_receipt_guard_accepts_same_flavor() {
        let blue = Uuid::new_v4();
        assert!(check_receipt_flavor(blue, "BlueRazz", blue, "BlueRazz").is_ok());
    }
}
