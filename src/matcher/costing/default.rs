use crate::matcher::{Branch, WeightingStrategy};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Distance-based weighting.
///
/// The matched factor is the mean distance of the matched points to their
/// segments, where every point the branch failed to match, every U-turn,
/// every shortest-path search and every segment passed through without a
/// routed reason adds a fixed penalty.
///
/// ```math
/// factor = (Σ distances + u·unmatched + t·uturns + p·searches + e·empty) / max(matched, 1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultWeighting {
    /// Penalty per point the branch spans but does not match, in meters.
    pub unmatched_penalty: f64,
    /// Penalty per U-turn, in meters.
    pub uturn_penalty: f64,
    /// Penalty per shortest-path search which was merged, in meters.
    pub path_search_penalty: f64,
    /// Penalty per empty segment not introduced by a path search, in meters.
    pub empty_segment_penalty: f64,

    /// Longest run of empty, non-routed segments a valid branch may contain.
    pub max_consecutive_empty: usize,
    /// Most U-turns a valid branch may contain within the examined window.
    pub max_uturns: usize,
}

impl Default for DefaultWeighting {
    fn default() -> Self {
        DefaultWeighting {
            unmatched_penalty: 50.0,
            uturn_penalty: 100.0,
            path_search_penalty: 1.0,
            empty_segment_penalty: 2.0,
            max_consecutive_empty: 12,
            max_uturns: 2,
        }
    }
}

impl DefaultWeighting {
    fn factor(&self, branch: &Branch) -> f64 {
        branch
            .matched_factor()
            .unwrap_or_else(|| self.score(branch))
    }
}

impl WeightingStrategy for DefaultWeighting {
    fn score(&self, branch: &Branch) -> f64 {
        let matched = branch.matched_points();
        let spanned = branch.frontier().saturating_sub(branch.first_index());
        let unmatched = spanned.saturating_sub(matched) + branch.unmatched_tail();

        let empty = branch.empty_segments();

        let penalties = unmatched as f64 * self.unmatched_penalty
            + branch.uturns() as f64 * self.uturn_penalty
            + branch.path_searches() as f64 * self.path_search_penalty
            + empty as f64 * self.empty_segment_penalty;

        (branch.distance_sum() + penalties) / matched.max(1) as f64
    }

    fn compare(&self, a: &Branch, b: &Branch) -> Ordering {
        self.factor(a)
            .total_cmp(&self.factor(b))
            .then_with(|| b.matched_points().cmp(&a.matched_points()))
            .then_with(|| a.len().cmp(&b.len()))
    }

    fn is_valid(&self, branch: &Branch, window: Option<usize>) -> bool {
        let segments = branch.segments();
        if segments.is_empty() {
            return false;
        }

        let from = window.map_or(0, |window| segments.len().saturating_sub(window));
        let examined = &segments[from..];

        let mut empty_run = 0;
        let mut uturns = 0;

        for segment in examined {
            if segment.is_u_turn() {
                uturns += 1;
            }

            match segment.is_empty() && !segment.is_from_path_search() {
                true => empty_run += 1,
                false => empty_run = 0,
            }

            if empty_run > self.max_consecutive_empty || uturns > self.max_uturns {
                return false;
            }
        }

        true
    }
}
