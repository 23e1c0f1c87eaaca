//! Integrity scoring for classification results

use crate::sanitize::CategoryTag;

/// Points deducted per distinct detected category.
pub const PENALTY_PER_CATEGORY: u32 = 25;

/// Compute the 0-100 integrity score for a set of detected categories.
///
/// Every category costs the same 25 points; four or more floor the score
/// at zero.
pub fn integrity_score(categories: &[CategoryTag]) -> u8 {
    let penalty = PENALTY_PER_CATEGORY.saturating_mul(categories.len() as u32);
    100u32.saturating_sub(penalty) as u8
}

/// Whether a classification constitutes a policy violation.
pub fn is_violation(categories: &[CategoryTag]) -> bool {
    !categories.is_empty()
}
