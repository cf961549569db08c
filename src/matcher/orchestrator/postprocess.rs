//! Cleans up finished branches before they are handed out.

use crate::graph::{RoadNetwork, SegmentId};
use crate::matcher::{Branch, MatchContext, MatchedSegment, WeightingStrategy};

use itertools::Itertools;
use log::debug;

/// Turns the finished branches of a match into its ranked result.
///
/// Branches without any matched point are dropped, as are sections of
/// fewer than `min_segments_per_section` matching segments and empty
/// segments at either end. Point ranges and directions are repaired, the
/// branches rescored and duplicates removed. With a `forced` start segment,
/// the best branch starting on it is moved to the front.
pub fn finalize<N, W>(ctx: &MatchContext<'_, N, W>, finished: Vec<Branch>, forced: Option<SegmentId>) -> Vec<Branch>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    let points = ctx.points();
    let mut result: Vec<Branch> = Vec::with_capacity(finished.len());

    for mut branch in finished {
        if branch.segments().iter().all(MatchedSegment::is_empty) {
            continue;
        }

        remove_short_sections(&mut branch, ctx.config.min_segments_per_section);
        trim_empty_ends(&mut branch);

        if branch.is_empty() {
            continue;
        }

        if !branch.edit(|segments| points.recalculate_segment_indexes(segments, 0)) {
            debug!("Dropped finished branch with irreparable point ranges");
            continue;
        }

        branch.correct_directions_from(0);
        branch.recount_uturns();
        branch.rescore(ctx.weighting);

        if result.iter().any(|kept| kept.same_route(&branch)) {
            continue;
        }

        result.push(branch);
    }

    result.sort_by(|a, b| ctx.weighting.compare(a, b));

    if let Some(id) = forced {
        let starting = result
            .iter()
            .position(|branch| branch.first().is_some_and(|first| first.id() == id));

        if let Some(position) = starting {
            let branch = result.remove(position);
            result.insert(0, branch);
        }
    }

    result
}

/// Removes every section, a run of segments between two skipped parts of
/// the track, holding fewer than `min_segments` segments with matched points.
pub fn remove_short_sections(branch: &mut Branch, min_segments: usize) {
    let sections = branch
        .segments()
        .iter()
        .enumerate()
        .filter(|(index, segment)| *index == 0 || segment.is_after_skipped_part())
        .map(|(index, _)| index)
        .chain([branch.len()])
        .tuple_windows::<(usize, usize)>()
        .collect::<Vec<_>>();

    let short = sections
        .into_iter()
        .filter(|&(start, end)| {
            branch.segments()[start..end]
                .iter()
                .filter(|segment| !segment.is_empty())
                .count()
                < min_segments
        })
        .collect::<Vec<_>>();

    if short.is_empty() {
        return;
    }

    debug!("Removing {} sections with fewer than {min_segments} matched segments", short.len());

    branch.edit(|segments| {
        for (start, end) in short.into_iter().rev() {
            segments.drain(start..end);
        }
    });
}

/// Removes empty segments from both ends of the branch.
pub fn trim_empty_ends(branch: &mut Branch) {
    branch.edit(|segments| {
        let leading = segments.iter().take_while(|segment| segment.is_empty()).count();
        segments.drain(..leading);

        let kept = segments.len() - segments.iter().rev().take_while(|segment| segment.is_empty()).count();
        segments.truncate(kept);
    });
}
