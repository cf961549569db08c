use crate::graph::Anchor;
use crate::matcher::{AlternativePath, MatchConfig, MatchedSegment, Track};
use crate::util::geometry::fraction_along;

use log::trace;

/// Decides whether a routed continuation can physically have been driven
/// between two track points.
#[derive(Debug, Clone, Copy)]
pub struct Feasibility<'a> {
    track: &'a Track,
    config: &'a MatchConfig,
}

impl<'a> Feasibility<'a> {
    pub fn new(track: &'a Track, config: &'a MatchConfig) -> Self {
        Feasibility { track, config }
    }

    /// Length of `segment` between the point at `index` and `anchor`.
    fn remaining(&self, segment: &MatchedSegment, index: usize, anchor: Anchor) -> f64 {
        let fraction = fraction_along(&self.track.point(index).position, &segment.segment().geometry);

        match anchor {
            Anchor::Start => segment.length() * fraction,
            Anchor::End => segment.length() * (1.0 - fraction),
            Anchor::Center => segment.length() / 2.0,
        }
    }

    /// Fastest plausible time, in seconds, to drive from the point at `from`
    /// on `last` over `path` to the point at `to`.
    ///
    /// Only the part of `last` ahead of the first point and the part of the
    /// final segment before the second point count towards the distance.
    pub fn minimum_duration(&self, last: &MatchedSegment, path: &AlternativePath, from: usize, to: usize) -> f64 {
        let duration = |segment: &MatchedSegment, length: f64| {
            let speed = segment.class().max_speed_ms(segment.segment().urban) * self.config.speed_tolerance;
            length / speed
        };

        let Some((target, between)) = path.segments.split_last() else {
            return 0.0;
        };

        let exit = between
            .first()
            .unwrap_or(target)
            .entry_node()
            .and_then(|node| last.segment().anchor_of(node))
            .unwrap_or_else(|| last.direction().exit());

        let head = duration(last, self.remaining(last, from, exit));
        let body = between
            .iter()
            .map(|segment| duration(segment, segment.length()))
            .sum::<f64>();
        let tail = duration(target, self.remaining(target, to, target.direction().entry()));

        head + body + tail
    }

    /// Whether the track allows for the path in the time elapsed between
    /// the points at `from` and `to`, with every routed segment travelled
    /// in a proper direction.
    pub fn is_feasible(&self, last: &MatchedSegment, path: &AlternativePath, from: usize, to: usize) -> bool {
        if path.segments.iter().any(|segment| segment.direction().is_degenerate()) {
            trace!("Rejected path onto {:?}, degenerate direction", path.segments.last().map(|s| s.id()));
            return false;
        }

        let elapsed = self.track.elapsed(from, to);
        let minimum = self.minimum_duration(last, path, from, to);

        if elapsed < minimum {
            trace!("Rejected path, needs {minimum:.1}s but only {elapsed:.1}s elapsed");
            return false;
        }

        true
    }
}
