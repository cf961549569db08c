use crate::matcher::Branch;
use std::cmp::Ordering;

/// Ranks and gates branches while they are expanded.
///
/// Implementations must be pure functions of the branch state, so the
/// same branch always scores the same.
pub trait WeightingStrategy {
    /// The matched factor of the branch. Lower values are better.
    fn score(&self, branch: &Branch) -> f64;

    /// Total order over branches, better branches sort first.
    ///
    /// Uses the cached [`Branch::matched_factor`] when present.
    fn compare(&self, a: &Branch, b: &Branch) -> Ordering;

    /// Whether the branch is still a plausible explanation of the track.
    ///
    /// With a `window`, only the last `window` segments are examined,
    /// which is how freshly appended continuations are checked.
    fn is_valid(&self, branch: &Branch, window: Option<usize>) -> bool;
}

impl<W> WeightingStrategy for &W
where
    W: WeightingStrategy + ?Sized,
{
    fn score(&self, branch: &Branch) -> f64 {
        (**self).score(branch)
    }

    fn compare(&self, a: &Branch, b: &Branch) -> Ordering {
        (**self).compare(a, b)
    }

    fn is_valid(&self, branch: &Branch, window: Option<usize>) -> bool {
        (**self).is_valid(branch, window)
    }
}
