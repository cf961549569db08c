use crate::graph::Anchor;
use crate::matcher::{Direction, MatchedSegment, WeightingStrategy};

use geo::{Coord, LineString};
use wkt::ToWkt;

/// One route hypothesis explaining a prefix of the track.
///
/// Owns its segments outright, so a clone can be extended or revised
/// without affecting the branch it was cloned from. Every mutation goes
/// through a method which refreshes the derived totals and clears the
/// cached score, which [`Branch::rescore`] recomputes.
#[derive(Debug, Clone, Default)]
pub struct Branch {
    segments: Vec<MatchedSegment>,

    length: f64,
    matched_points: usize,
    matched_factor: Option<f64>,

    pub(crate) step: usize,
    /// Frontier at the last step advance.
    reached: usize,
    finished: bool,
    unmatched_tail: usize,

    uturns: usize,
    path_searches: usize,

    /// Number of leading segments moved into the shared certain path.
    pub(crate) certain_len: usize,
    /// Copy of the last segment moved into the certain path.
    pub(crate) certain_end: Option<MatchedSegment>,
    certain: CertainTotals,
}

/// Totals of the segments moved into the certain path, kept so the
/// branch scores the same whether or not its prefix is attached.
#[derive(Debug, Clone, Copy, Default)]
struct CertainTotals {
    first_index: usize,
    matched_points: usize,
    distance_sum: f64,
    length: f64,
    uturns: usize,
    empty_segments: usize,
}

impl CertainTotals {
    fn add(&mut self, segment: &MatchedSegment) {
        self.matched_points += segment.matched_points();
        self.distance_sum += segment.distance_sum();
        self.length += segment.length();
        self.uturns += usize::from(segment.is_u_turn());
        self.empty_segments += usize::from(is_unexplained(segment));
    }
}

/// An empty segment no shortest-path search accounts for.
fn is_unexplained(segment: &MatchedSegment) -> bool {
    segment.is_empty() && !segment.is_from_path_search()
}

impl Branch {
    pub fn new(segments: Vec<MatchedSegment>) -> Self {
        let mut branch = Branch {
            segments,
            ..Branch::default()
        };

        branch.refresh();
        branch
    }

    fn refresh(&mut self) {
        self.length = self.certain.length + self.segments.iter().map(MatchedSegment::length).sum::<f64>();
        self.matched_points = self.certain.matched_points
            + self.segments.iter().map(MatchedSegment::matched_points).sum::<usize>();
        self.matched_factor = None;
    }

    /// Applies an arbitrary edit to the segments, refreshing the derived fields afterwards.
    pub(crate) fn edit<R>(&mut self, edit: impl FnOnce(&mut Vec<MatchedSegment>) -> R) -> R {
        let result = edit(&mut self.segments);
        self.refresh();
        result
    }

    pub(crate) fn push(&mut self, segment: MatchedSegment) {
        self.edit(|segments| segments.push(segment))
    }

    pub(crate) fn pop(&mut self) -> Option<MatchedSegment> {
        self.edit(|segments| segments.pop())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.edit(|segments| segments.truncate(len))
    }

    #[inline]
    pub fn segments(&self) -> &[MatchedSegment] {
        &self.segments
    }

    #[inline]
    pub fn first(&self) -> Option<&MatchedSegment> {
        self.segments.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&MatchedSegment> {
        self.segments.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the next track point not yet explained by the branch.
    pub fn frontier(&self) -> usize {
        self.segments
            .last()
            .or(self.certain_end.as_ref())
            .map_or(0, MatchedSegment::end_index)
    }

    /// Index of the first track point covered by the branch, including
    /// its detached certain prefix.
    pub fn first_index(&self) -> usize {
        if self.certain_len > 0 {
            return self.certain.first_index;
        }

        self.segments.first().map_or(0, MatchedSegment::start_index)
    }

    #[inline]
    pub fn matched_points(&self) -> usize {
        self.matched_points
    }

    /// Sum of the network lengths of every segment, in meters.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn distance_sum(&self) -> f64 {
        self.certain.distance_sum + self.segments.iter().map(MatchedSegment::distance_sum).sum::<f64>()
    }

    /// Empty segments which were not introduced by a shortest-path search.
    pub fn empty_segments(&self) -> usize {
        self.certain.empty_segments + self.segments.iter().filter(|s| is_unexplained(s)).count()
    }

    /// The score assigned by the last [`Branch::rescore`], cleared by any mutation.
    #[inline]
    pub fn matched_factor(&self) -> Option<f64> {
        self.matched_factor
    }

    pub fn rescore(&mut self, weighting: &impl WeightingStrategy) -> f64 {
        let factor = weighting.score(self);
        self.matched_factor = Some(factor);
        factor
    }

    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Counts a step if the frontier moved past where the last step ended.
    pub(crate) fn advance_step(&mut self) -> bool {
        let frontier = self.frontier();
        if frontier <= self.reached {
            return false;
        }

        self.step += 1;
        self.reached = frontier;
        true
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    /// Finishes a branch which cannot explain the points beyond its frontier.
    pub(crate) fn finish_with_tail(&mut self, track_len: usize) {
        self.unmatched_tail = track_len.saturating_sub(self.frontier());
        self.matched_factor = None;
        self.finished = true;
    }

    /// Points at the end of the track left unmatched when the branch finished.
    #[inline]
    pub fn unmatched_tail(&self) -> usize {
        self.unmatched_tail
    }

    #[inline]
    pub fn uturns(&self) -> usize {
        self.uturns
    }

    pub(crate) fn record_uturn(&mut self) {
        self.uturns += 1;
        self.matched_factor = None;
    }

    #[inline]
    pub fn path_searches(&self) -> usize {
        self.path_searches
    }

    pub(crate) fn record_path_search(&mut self) {
        self.path_searches += 1;
        self.matched_factor = None;
    }

    /// Recounts the U-turns from the segment flags, after segments were spliced.
    pub(crate) fn recount_uturns(&mut self) {
        self.uturns = self.certain.uturns + self.segments.iter().filter(|s| s.is_u_turn()).count();
        self.matched_factor = None;
    }

    #[inline]
    pub fn certain_len(&self) -> usize {
        self.certain_len
    }

    /// Moves the first `count` segments out of the branch, recording them as certain.
    ///
    /// Their totals stay part of the branch, so neither its score nor its
    /// ranking against branches sharing the prefix changes.
    pub(crate) fn detach_prefix(&mut self, count: usize) -> Vec<MatchedSegment> {
        let detached = self.segments.drain(..count.min(self.segments.len())).collect::<Vec<_>>();

        if let (0, Some(first)) = (self.certain_len, detached.first()) {
            self.certain.first_index = first.start_index();
        }

        for segment in &detached {
            self.certain.add(segment);
        }

        if let Some(end) = detached.last() {
            self.certain_end = Some(end.clone());
        }

        self.certain_len += detached.len();
        self.refresh();
        detached
    }

    /// Restores the detached certain prefix in front of the active segments.
    pub(crate) fn reattach(&mut self, certain: &[MatchedSegment]) {
        let prefix = &certain[..self.certain_len.min(certain.len())];
        self.certain = CertainTotals::default();

        self.edit(|segments| {
            segments.splice(0..0, prefix.iter().cloned());
        });

        self.certain_len = 0;
        self.certain_end = None;
    }

    /// Re-resolves the direction of every segment from `from` onwards,
    /// using the nodes shared with their neighbours.
    pub(crate) fn correct_directions_from(&mut self, from: usize) {
        for index in from..self.segments.len() {
            let previous = match index {
                0 => self.certain_end.as_ref(),
                _ => self.segments.get(index - 1),
            };

            let direction =
                resolve_direction(previous, &self.segments[index], self.segments.get(index + 1));
            self.segments[index].direction = direction;
        }
    }

    /// Every range lies within the track and ranges never move backwards.
    pub fn is_monotonic(&self, track_len: usize) -> bool {
        let mut reached = self.certain_end.as_ref().map_or(0, MatchedSegment::end_index);

        self.segments.iter().all(|segment| {
            let valid = segment.start_index() <= segment.end_index()
                && segment.end_index() <= track_len
                && segment.start_index() >= reached;

            reached = segment.end_index();
            valid
        })
    }

    /// Same segments, directions and point ranges.
    pub fn same_route(&self, other: &Branch) -> bool {
        self.len() == other.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_match(b))
    }

    /// Geometry of the route, each segment oriented in its direction of travel.
    pub fn linestring(&self) -> LineString {
        let mut coords: Vec<Coord> = Vec::new();

        for segment in &self.segments {
            let geometry = &segment.segment().geometry;
            let reversed = matches!(segment.direction().exit(), Anchor::Start);

            let oriented: Box<dyn Iterator<Item = &Coord>> = match reversed {
                true => Box::new(geometry.0.iter().rev()),
                false => Box::new(geometry.0.iter()),
            };

            for coord in oriented {
                if coords.last() != Some(coord) {
                    coords.push(*coord);
                }
            }
        }

        LineString::new(coords)
    }

    pub fn wkt(&self) -> String {
        self.linestring().wkt_string()
    }
}

/// The direction of `segment` given its neighbours within the branch.
///
/// The entry follows from the node shared with the previous segment, the
/// exit from the node shared with the next one. Without a neighbour the
/// known anchor is kept and the other one is assumed to be opposite.
pub(crate) fn resolve_direction(
    previous: Option<&MatchedSegment>,
    segment: &MatchedSegment,
    next: Option<&MatchedSegment>,
) -> Direction {
    let network = segment.segment();

    let entry = match previous {
        Some(previous) if !segment.is_after_skipped_part() => previous
            .exit_node()
            .filter(|node| network.touches(*node))
            .or_else(|| previous.segment().shared_node(network, None))
            .and_then(|node| network.anchor_of(node))
            .unwrap_or(Anchor::Center),
        _ => segment.direction().entry(),
    };

    if segment.is_u_turn() {
        return match entry {
            Anchor::Center => segment.direction(),
            anchor => Direction::from_anchors(anchor, anchor),
        };
    }

    let exit = match next {
        Some(next) if !next.is_after_skipped_part() => {
            let preference = match entry {
                Anchor::End => [Anchor::Start, Anchor::End],
                _ => [Anchor::End, Anchor::Start],
            };

            preference
                .into_iter()
                .find(|anchor| {
                    network
                        .node_at(*anchor)
                        .is_some_and(|node| next.segment().touches(node))
                })
                .unwrap_or_else(|| segment.direction().exit())
        }
        _ => match entry {
            Anchor::Center => segment.direction().exit(),
            anchor => anchor.opposite(),
        },
    };

    Direction::from_anchors(entry, exit)
}

/// A continuation proposed for a stalled branch.
#[derive(Debug, Clone)]
pub struct AlternativePath {
    pub segments: Vec<MatchedSegment>,
    /// The continuation restarts after points which could not be matched.
    pub after_skipped_part: bool,
    /// The continuation leaves the last segment through the node it entered by.
    pub causes_uturn: bool,
}

/// A stalled branch paired with the track point its search continues from.
#[derive(Debug, Clone)]
pub struct SearchCursor {
    pub next_index: usize,
    pub branch: Branch,
}
