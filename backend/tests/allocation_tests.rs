//! Tests for sequential-fill purchase order allocation
//!
//! Exercises the planner the way the submission pipeline drives it: a stream
//! of submissions for one flavor landing on the flavor's open PO lines in
//! oldest-first order, with overs on the last line touched.

use proptest::prelude::*;
use uuid::Uuid;

use shared::{plan_fill, total_placed, LineState, PoLine, PoStatus};

fn line(ordered: i64, good: i64, damaged: i64) -> LineState {
    LineState {
        line_id: Uuid::new_v4(),
        po_id: Uuid::new_v4(),
        quantity_ordered: ordered,
        good_count: good,
        damaged_count: damaged,
    }
}

/// Apply a plan back onto the line snapshots, as the store transaction does
fn apply_plan(lines: &mut [LineState], plan: &[shared::Placement]) {
    for p in plan {
        let l = lines.iter_mut().find(|l| l.line_id == p.line_id).unwrap();
        l.apply(p);
    }
}

// =============================================================================
// Oldest-first fill
// =============================================================================

mod oldest_first_fill {
    use super::*;

    #[test]
    fn submission_spans_two_orders() {
        // PO-1001 has 500 remaining, PO-1002 is untouched; 700 good tablets
        // fill 1001 to its order quantity and put 200 on 1002
        let mut lines = vec![line(1000, 500, 0), line(800, 0, 0)];
        let plan = plan_fill(&lines, 700, 0);
        apply_plan(&mut lines, &plan);

        assert_eq!(lines[0].total_allocated(), 1000);
        assert_eq!(lines[0].capacity(), 0);
        assert_eq!(lines[1].good_count, 200);
    }

    #[test]
    fn younger_order_untouched_while_older_has_room() {
        let mut lines = vec![line(1000, 0, 0), line(800, 0, 0)];
        let plan = plan_fill(&lines, 400, 100);
        apply_plan(&mut lines, &plan);

        assert_eq!(lines[0].good_count, 400);
        assert_eq!(lines[0].damaged_count, 100);
        assert_eq!(lines[1].total_allocated(), 0);
    }

    #[test]
    fn stream_of_submissions_fills_in_sequence() {
        let mut lines = vec![line(300, 0, 0), line(300, 0, 0)];
        for (good, damaged) in [(120, 5), (150, 0), (100, 10)] {
            let plan = plan_fill(&lines, good, damaged);
            apply_plan(&mut lines, &plan);
        }

        // 385 total; the first line holds its full 300
        assert_eq!(lines[0].total_allocated(), 300);
        assert_eq!(lines[1].total_allocated(), 85);
    }
}

// =============================================================================
// Overs
// =============================================================================

mod overs {
    use super::*;

    #[test]
    fn over_delivery_lands_on_the_only_order() {
        // 1000 ordered, 950 already in; 150 more arrives. Nothing is
        // rejected; the line goes 100 past its quantity.
        let mut lines = vec![line(1000, 950, 0)];
        let plan = plan_fill(&lines, 150, 0);
        apply_plan(&mut lines, &plan);

        let figures = PoLine {
            id: lines[0].line_id,
            po_id: lines[0].po_id,
            flavor_id: Uuid::new_v4(),
            quantity_ordered: lines[0].quantity_ordered,
            good_count: lines[0].good_count,
            damaged_count: lines[0].damaged_count,
        };
        assert_eq!(figures.remaining(), 0);
        assert_eq!(figures.overs(), 100);
    }

    #[test]
    fn overs_stay_on_last_touched_order_not_the_oldest() {
        let mut lines = vec![line(100, 100, 0), line(100, 0, 0)];
        let plan = plan_fill(&lines, 180, 0);
        apply_plan(&mut lines, &plan);

        assert_eq!(lines[0].total_allocated(), 100);
        assert_eq!(lines[1].good_count, 180);
    }

    #[test]
    fn all_orders_full_puts_everything_on_the_final_line() {
        let lines = vec![line(100, 100, 0), line(50, 50, 0)];
        let plan = plan_fill(&lines, 60, 10);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].line_id, lines[1].line_id);
        assert_eq!(plan[0].good, 60);
        assert_eq!(plan[0].damaged, 10);
    }
}

// =============================================================================
// Eligibility and empty plans
// =============================================================================

mod eligibility {
    use super::*;

    #[test]
    fn draft_and_closed_orders_are_filtered_before_planning() {
        // The store query only hands open/processing lines to the planner;
        // this is the status predicate it uses
        assert!(!PoStatus::Draft.is_allocatable());
        assert!(!PoStatus::Closed.is_allocatable());
        assert!(PoStatus::Open.is_allocatable());
        assert!(PoStatus::Processing.is_allocatable());
    }

    #[test]
    fn no_eligible_orders_leaves_counts_unallocated() {
        assert!(plan_fill(&[], 700, 25).is_empty());
    }

    #[test]
    fn zero_count_submission_touches_nothing() {
        let lines = vec![line(500, 0, 0), line(500, 0, 0)];
        assert!(plan_fill(&lines, 0, 0).is_empty());
    }
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    /// Every unit of a submission stream ends up on some line
    #[test]
    fn prop_stream_conserves_totals(
        capacities in prop::collection::vec(1i64..1000, 1..6),
        submissions in prop::collection::vec((0i64..500, 0i64..200), 1..10),
    ) {
        let mut lines: Vec<LineState> =
            capacities.iter().map(|c| line(*c, 0, 0)).collect();

        let mut expected_good = 0;
        let mut expected_damaged = 0;
        for (good, damaged) in submissions {
            let plan = plan_fill(&lines, good, damaged);
            let (g, d) = total_placed(&plan);
            prop_assert_eq!(g, good);
            prop_assert_eq!(d, damaged);
            apply_plan(&mut lines, &plan);
            expected_good += good;
            expected_damaged += damaged;
        }

        let total_good: i64 = lines.iter().map(|l| l.good_count).sum();
        let total_damaged: i64 = lines.iter().map(|l| l.damaged_count).sum();
        prop_assert_eq!(total_good, expected_good);
        prop_assert_eq!(total_damaged, expected_damaged);
    }

    /// Overs only exist once every line's capacity is exhausted
    #[test]
    fn prop_no_overs_while_capacity_remains(
        capacities in prop::collection::vec(1i64..500, 1..6),
        good in 0i64..3000,
    ) {
        let mut lines: Vec<LineState> =
            capacities.iter().map(|c| line(*c, 0, 0)).collect();
        let plan = plan_fill(&lines, good, 0);
        apply_plan(&mut lines, &plan);

        let any_overs = lines
            .iter()
            .any(|l| l.total_allocated() > l.quantity_ordered);
        if any_overs {
            let remaining: i64 = lines.iter().map(LineState::capacity).sum();
            prop_assert_eq!(remaining, 0);
        }
    }
}
