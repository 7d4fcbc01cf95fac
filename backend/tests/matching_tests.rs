//! Tests for bag matching and receipt inheritance
//!
//! Covers candidate resolution (exactly one candidate auto-matches, anything
//! else goes to review), box-number tolerance across legacy and new
//! receives, and the cross-product receipt guard.

use proptest::prelude::*;
use uuid::Uuid;

use shared::{
    box_numbers_compatible, check_receipt_flavor, choose_candidate, BagCandidate, MatchOutcome,
    Receive, ReceiveStatus,
};

fn candidate(flavor_id: Uuid, bag_number: i32, box_number: Option<i32>) -> BagCandidate {
    BagCandidate {
        bag_id: Uuid::new_v4(),
        receive_id: Uuid::new_v4(),
        receive_name: "Receive A".to_string(),
        flavor_id,
        bag_number,
        box_number,
        label_count: 5000,
        po_id: None,
    }
}

fn receive(status: ReceiveStatus, closed: bool) -> Receive {
    let now = chrono::Utc::now();
    Receive {
        id: Uuid::new_v4(),
        name: "Shipment 12".to_string(),
        status,
        closed,
        po_id: None,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Candidate resolution
// =============================================================================

mod candidate_resolution {
    use super::*;

    #[test]
    fn single_candidate_matches_automatically() {
        let flavor = Uuid::new_v4();
        let c = candidate(flavor, 3, Some(1));
        let outcome = MatchOutcome::from_candidates(vec![c.clone()]);

        assert!(outcome.is_matched());
        assert_eq!(outcome, MatchOutcome::Matched { bag: c });
    }

    #[test]
    fn duplicate_signature_across_receives_goes_to_review() {
        // Two published receives each hold BlueRazz bag 2; a wrong silent
        // pick would put counts on the wrong shipment, so neither is chosen
        let flavor = Uuid::new_v4();
        let outcome = MatchOutcome::from_candidates(vec![
            candidate(flavor, 2, None),
            candidate(flavor, 2, None),
        ]);

        assert!(outcome.needs_review());
        assert!(!outcome.is_matched());
    }

    #[test]
    fn no_candidates_records_unmatched_without_review() {
        let outcome = MatchOutcome::from_candidates(vec![]);
        assert_eq!(outcome, MatchOutcome::Unmatched);
        assert!(!outcome.needs_review());
    }
}

// =============================================================================
// Box-number tolerance
// =============================================================================

mod box_tolerance {
    use super::*;

    #[test]
    fn legacy_submission_with_box_matches_new_bag_without_one() {
        // Old clients still send box numbers; bags in new receives do not
        // carry them. Absence on either side is compatible.
        assert!(box_numbers_compatible(Some(4), None));
    }

    #[test]
    fn new_submission_without_box_matches_legacy_bag() {
        assert!(box_numbers_compatible(None, Some(4)));
    }

    #[test]
    fn conflicting_box_numbers_exclude_the_bag() {
        assert!(!box_numbers_compatible(Some(4), Some(7)));
    }

    #[test]
    fn matching_box_numbers_are_compatible() {
        assert!(box_numbers_compatible(Some(4), Some(4)));
    }

    proptest! {
        /// A present box number only ever excludes bags that carry a
        /// different present box number
        #[test]
        fn prop_only_present_conflicts_exclude(
            requested in proptest::option::of(1i32..30),
            on_bag in proptest::option::of(1i32..30),
        ) {
            let compatible = box_numbers_compatible(requested, on_bag);
            match (requested, on_bag) {
                (Some(a), Some(b)) => prop_assert_eq!(compatible, a == b),
                _ => prop_assert!(compatible),
            }
        }
    }
}

// =============================================================================
// Manager resolution of ambiguous matches
// =============================================================================

mod ambiguity_resolution {
    use super::*;

    #[test]
    fn resolution_picks_a_surfaced_candidate() {
        let flavor = Uuid::new_v4();
        let a = candidate(flavor, 2, None);
        let b = candidate(flavor, 2, None);
        let chosen_id = b.bag_id;

        let chosen = choose_candidate(vec![a, b.clone()], chosen_id);
        assert_eq!(chosen, Some(b));
    }

    #[test]
    fn bag_outside_the_candidate_set_is_rejected() {
        // A manager resolving a bag_number=2 submission onto a bag_number=9
        // bag would leave the stored resolution disagreeing with every later
        // candidate read; the selection refuses bags the matcher never
        // surfaced for the signature
        let flavor = Uuid::new_v4();
        let candidates = vec![candidate(flavor, 2, None), candidate(flavor, 2, None)];
        let other_bag = candidate(flavor, 9, None);

        assert_eq!(choose_candidate(candidates, other_bag.bag_id), None);
    }

    #[test]
    fn empty_candidate_set_resolves_nothing() {
        assert_eq!(choose_candidate(vec![], Uuid::new_v4()), None);
    }
}

// =============================================================================
// Receive visibility
// =============================================================================

mod receive_visibility {
    use super::*;

    #[test]
    fn draft_receive_is_invisible_to_matching() {
        assert!(!receive(ReceiveStatus::Draft, false).is_matchable());
    }

    #[test]
    fn published_receive_is_matchable_until_closed() {
        assert!(receive(ReceiveStatus::Published, false).is_matchable());
        assert!(!receive(ReceiveStatus::Published, true).is_matchable());
    }
}

// =============================================================================
// Receipt inheritance guard
// =============================================================================

mod receipt_inheritance {
    use super::*;

    #[test]
    fn chained_submission_same_flavor_inherits() {
        let blue = Uuid::new_v4();
        assert!(check_receipt_flavor(blue, "BlueRazz", blue, "BlueRazz").is_ok());
    }

    #[test]
    fn cross_product_receipt_is_rejected_with_both_names() {
        // Packaging entered under a machine-count receipt for a different
        // flavor must fail loudly instead of landing on the wrong receive
        let blue = Uuid::new_v4();
        let mint = Uuid::new_v4();
        let err = check_receipt_flavor(blue, "BlueRazz", mint, "Spearmint").unwrap_err();

        assert_eq!(err.original, "BlueRazz");
        assert_eq!(err.attempted, "Spearmint");
        let msg = err.to_string();
        assert!(msg.contains("BlueRazz"));
        assert!(msg.contains("Spearmint"));
    }

    proptest! {
        /// The guard depends only on flavor identity, never on names
        #[test]
        fn prop_guard_is_identity_based(
            same in any::<bool>(),
            name_a in "[A-Za-z]{3,12}",
            name_b in "[A-Za-z]{3,12}",
        ) {
            let a = Uuid::new_v4();
            let b = if same { a } else { Uuid::new_v4() };
            let result = check_receipt_flavor(a, &name_a, b, &name_b);
            prop_assert_eq!(result.is_ok(), same);
        }
    }
}
