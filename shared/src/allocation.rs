//! Sequential-fill purchase order allocation planner
//!
//! Pure planning logic: given the open PO lines for a flavor in oldest-first
//! order, decide where a submission's good and damaged counts land. The
//! backend applies the resulting placements inside a store transaction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of one eligible PO line, oldest PO first in the slice passed to
/// [`plan_fill`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineState {
    pub line_id: Uuid,
    pub po_id: Uuid,
    pub quantity_ordered: i64,
    pub good_count: i64,
    pub damaged_count: i64,
}

impl LineState {
    /// Unfilled capacity shared by good and damaged counts
    pub fn capacity(&self) -> i64 {
        (self.quantity_ordered - self.total_allocated()).max(0)
    }

    /// Total units already on this line
    pub fn total_allocated(&self) -> i64 {
        self.good_count + self.damaged_count
    }

    /// Apply a placement to this line's counts
    pub fn apply(&mut self, placement: &Placement) {
        self.good_count += placement.good;
        self.damaged_count += placement.damaged;
    }
}

/// Counts to add to one PO line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub line_id: Uuid,
    pub po_id: Uuid,
    pub good: i64,
    pub damaged: i64,
}

/// Plan a sequential (FIFO) fill of `good_count` and `damaged_count` across
/// `lines`, which must be ordered oldest PO first.
///
/// Each count fills remaining capacity oldest-first; once no capacity
/// remains, the leftover lands on the last line touched as overs. Overs are
/// expected for over-delivery and are never rejected. With no eligible lines
/// at all the plan is empty and the counts stay unallocated.
pub fn plan_fill(lines: &[LineState], good_count: i64, damaged_count: i64) -> Vec<Placement> {
    if lines.is_empty() {
        return Vec::new();
    }

    let mut caps: Vec<i64> = lines.iter().map(LineState::capacity).collect();

    let (good_placed, good_last) = sequential_fill(&mut caps, good_count, None);
    let (damaged_placed, _) = sequential_fill(&mut caps, damaged_count, good_last);

    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| good_placed[*i] > 0 || damaged_placed[*i] > 0)
        .map(|(i, line)| Placement {
            line_id: line.line_id,
            po_id: line.po_id,
            good: good_placed[i],
            damaged: damaged_placed[i],
        })
        .collect()
}

/// Fill `amount` into `caps` front to back, returning per-line placements and
/// the index of the last line touched. Any remainder past total capacity goes
/// to the last touched line, falling back to `fallback` and then to the final
/// line.
fn sequential_fill(
    caps: &mut [i64],
    amount: i64,
    fallback: Option<usize>,
) -> (Vec<i64>, Option<usize>) {
    let mut placed = vec![0i64; caps.len()];
    let mut remaining = amount;
    let mut last_touched = None;

    for (i, cap) in caps.iter_mut().enumerate() {
        if remaining == 0 {
            break;
        }
        let take = (*cap).min(remaining);
        if take > 0 {
            placed[i] += take;
            *cap -= take;
            remaining -= take;
            last_touched = Some(i);
        }
    }

    if remaining > 0 {
        let i = last_touched.or(fallback).unwrap_or(caps.len() - 1);
        placed[i] += remaining;
        last_touched = Some(i);
    }

    (placed, last_touched)
}

/// Total good and damaged counts across a plan
pub fn total_placed(placements: &[Placement]) -> (i64, i64) {
    placements.iter().fold((0, 0), |(g, d), p| (g + p.good, d + p.damaged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(ordered: i64, good: i64, damaged: i64) -> LineState {
        LineState {
            line_id: Uuid::new_v4(),
            po_id: Uuid::new_v4(),
            quantity_ordered: ordered,
            good_count: good,
            damaged_count: damaged,
        }
    }

    #[test]
    fn test_fifo_splits_across_two_orders() {
        // P1 oldest with 500 remaining, P2 with 500 remaining, 700 good in
        let lines = vec![line(500, 0, 0), line(500, 0, 0)];
        let plan = plan_fill(&lines, 700, 0);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].line_id, lines[0].line_id);
        assert_eq!(plan[0].good, 500);
        assert_eq!(plan[1].good, 200);
    }

    #[test]
    fn test_overs_land_on_single_order() {
        // 900 of 1000 already filled, 150 more arrives with nowhere else to go
        let lines = vec![line(1000, 900, 0)];
        let plan = plan_fill(&lines, 150, 0);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].good, 150);

        let mut l = lines[0].clone();
        l.apply(&plan[0]);
        assert_eq!(l.good_count, 1050);
    }

    #[test]
    fn test_overs_land_on_last_touched_order() {
        let lines = vec![line(100, 0, 0), line(100, 0, 0)];
        let plan = plan_fill(&lines, 350, 0);

        assert_eq!(plan[0].good, 100);
        // 100 capacity plus 150 overs
        assert_eq!(plan[1].good, 250);
    }

    #[test]
    fn test_damaged_fills_same_order_as_good() {
        let lines = vec![line(100, 0, 0), line(500, 0, 0)];
        let plan = plan_fill(&lines, 80, 50);

        // Good takes 80 of the first line, damaged takes the remaining 20
        // then spills into the second
        assert_eq!(plan[0].good, 80);
        assert_eq!(plan[0].damaged, 20);
        assert_eq!(plan[1].damaged, 30);
    }

    #[test]
    fn test_fully_filled_lines_get_overs_not_capacity() {
        let lines = vec![line(100, 100, 0), line(100, 100, 0)];
        let plan = plan_fill(&lines, 40, 0);

        // No capacity anywhere; everything is overs on the final line
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].line_id, lines[1].line_id);
        assert_eq!(plan[0].good, 40);
    }

    #[test]
    fn test_zero_quantity_is_empty_plan() {
        let lines = vec![line(500, 0, 0)];
        assert!(plan_fill(&lines, 0, 0).is_empty());
    }

    #[test]
    fn test_no_eligible_lines_is_empty_plan() {
        assert!(plan_fill(&[], 700, 10).is_empty());
    }

    proptest! {
        /// Everything requested is placed somewhere, nothing invented
        #[test]
        fn prop_counts_conserved(
            capacities in prop::collection::vec((0i64..2000, 0i64..2000), 1..8),
            good in 0i64..5000,
            damaged in 0i64..5000,
        ) {
            let lines: Vec<LineState> = capacities
                .iter()
                .map(|(ordered, filled)| line(*ordered, (*filled).min(*ordered), 0))
                .collect();
            let plan = plan_fill(&lines, good, damaged);
            let (g, d) = total_placed(&plan);
            prop_assert_eq!(g, good);
            prop_assert_eq!(d, damaged);
        }

        /// A younger order only receives units once every older order is full
        #[test]
        fn prop_oldest_first(
            capacities in prop::collection::vec(1i64..500, 2..6),
            good in 1i64..3000,
        ) {
            let lines: Vec<LineState> = capacities.iter().map(|c| line(*c, 0, 0)).collect();
            let plan = plan_fill(&lines, good, 0);

            let mut after: Vec<LineState> = lines.clone();
            for p in &plan {
                let l = after.iter_mut().find(|l| l.line_id == p.line_id).unwrap();
                l.apply(p);
            }
            for w in after.windows(2) {
                if w[1].total_allocated() > 0 {
                    prop_assert_eq!(w[0].capacity(), 0);
                }
            }
        }

        /// Aggregate totals are order-independent across two submissions,
        /// even though which PO gets which units is FIFO-deterministic
        #[test]
        fn prop_totals_commute(
            capacities in prop::collection::vec(1i64..500, 1..5),
            a in 0i64..1000,
            b in 0i64..1000,
        ) {
            let lines: Vec<LineState> = capacities.iter().map(|c| line(*c, 0, 0)).collect();

            let run = |first: i64, second: i64| -> i64 {
                let mut state = lines.clone();
                for amount in [first, second] {
                    let plan = plan_fill(&state, amount, 0);
                    for p in &plan {
                        let l = state.iter_mut().find(|l| l.line_id == p.line_id).unwrap();
                        l.apply(p);
                    }
                }
                state.iter().map(LineState::total_allocated).sum()
            };

            prop_assert_eq!(run(a, b), run(b, a));
        }
    }
}
