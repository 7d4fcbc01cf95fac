//! Validation rules for the production matching and allocation engine

/// Box-tolerant comparison used by the bag matcher.
///
/// Legacy receives carried box_number as part of bag identity; new receives
/// treat it as optional metadata. Two box numbers are compatible when either
/// side is absent or both are equal. This is the single place the rule lives
/// so old and new numbering schemes stay comparable everywhere.
pub fn box_numbers_compatible(requested: Option<i32>, on_bag: Option<i32>) -> bool {
    match (requested, on_bag) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Next bag number for a flavor within a receive, computed from the current
/// persisted maximum rather than an external mutable counter
pub fn next_bag_number(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}
