//! Prunes the branches after every iteration of the matching loop.

use crate::error::MatchError;
use crate::graph::{Anchor, NetworkSegment, RoadNetwork, SegmentId};
use crate::matcher::{
    Branch, DirectExpander, Direction, MatchContext, MatchedSegment, SegmentFlags, WeightingStrategy,
};

use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::Level;


type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// The branches of one matching run.
#[derive(Debug, Clone, Default)]
pub struct BranchSet {
    /// Branches still being expanded, best first.
    pub active: Vec<Branch>,
    /// Branches explaining the whole track.
    pub finished: Vec<Branch>,
    /// Prefix shared by every active branch, detached from them.
    pub certain: Vec<MatchedSegment>,
    /// Furthest frontier reached by any branch so far.
    pub furthest: usize,
}

impl BranchSet {
    pub fn new(active: Vec<Branch>) -> Self {
        let furthest = active.iter().map(Branch::frontier).max().unwrap_or_default();

        BranchSet {
            active,
            furthest,
            ..BranchSet::default()
        }
    }

    /// Finished branches with the certain prefix restored in front of them.
    pub fn build_finished_paths(&self) -> Vec<Branch> {
        self.finished
            .iter()
            .cloned()
            .map(|mut branch| {
                branch.reattach(&self.certain);
                branch
            })
            .collect()
    }
}

/// Keeps the number of branches bounded while giving lagging hypotheses a
/// chance to catch up before they are discarded.
pub struct BranchFilter<'a, N, W> {
    ctx: &'a MatchContext<'a, N, W>,
}

impl<'a, N, W> BranchFilter<'a, N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    pub fn new(ctx: &'a MatchContext<'a, N, W>) -> Self {
        BranchFilter { ctx }
    }

    /// Replaces the active branches of the set by the filtered `candidates`.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all))]
    pub fn apply(&self, set: &mut BranchSet, mut candidates: Vec<Branch>) -> Result<(), MatchError> {
        for branch in &mut candidates {
            branch.advance_step();
            set.furthest = set.furthest.max(branch.frontier());
        }

        let candidates = self.cull_stragglers(candidates);
        let candidates = self.best_per_last_segment(candidates);
        let candidates = self.promote_finished(set, candidates);
        let candidates = self.cap(candidates);

        let expanded = self.expand_slow_paths(candidates)?;

        let expanded = self.best_per_last_segment(expanded);
        let expanded = self.promote_finished(set, expanded);
        set.active = self.cap(expanded);

        self.extract_certain_prefix(set);

        debug!(
            "Filtered to {} active and {} finished branches, {} certain segments",
            set.active.len(),
            set.finished.len(),
            set.certain.len()
        );

        Ok(())
    }

    /// Drops branches lagging too many steps behind, unless they matched as
    /// many points as the best. Finished branches are never dropped.
    pub fn cull_stragglers(&self, branches: Vec<Branch>) -> Vec<Branch> {
        let max_step = branches.iter().map(Branch::step).max().unwrap_or_default();
        let max_matched = branches.iter().map(Branch::matched_points).max().unwrap_or_default();
        let lag = self.ctx.config.max_step_lag;

        branches
            .into_iter()
            .filter(|branch| {
                branch.is_finished()
                    || max_step - branch.step() <= lag
                    || branch.matched_points() >= max_matched
            })
            .collect()
    }

    /// Keeps the best branch per last segment and direction, in order of first appearance.
    pub fn best_per_last_segment(&self, branches: Vec<Branch>) -> Vec<Branch> {
        let mut best: FxIndexMap<(SegmentId, Direction), Branch> = FxIndexMap::default();

        for branch in branches {
            let Some(key) = branch.last().map(|last| (last.id(), last.direction())) else {
                continue;
            };

            match best.get(&key) {
                Some(kept) if !self.ctx.is_better(&branch, kept) => {}
                _ => {
                    best.insert(key, branch);
                }
            }
        }

        best.into_values().collect()
    }

    /// Moves finished branches into the set, skipping routes it already holds.
    fn promote_finished(&self, set: &mut BranchSet, branches: Vec<Branch>) -> Vec<Branch> {
        let (finished, active): (Vec<_>, Vec<_>) = branches.into_iter().partition(Branch::is_finished);

        for branch in finished {
            if set.finished.iter().any(|kept| kept.same_route(&branch)) {
                continue;
            }

            self.ctx.record(|stats| stats.finished_branches += 1);
            set.finished.push(branch);
        }

        active
    }

    /// Sorts best first and keeps at most `max_active_branches`.
    pub fn cap(&self, mut branches: Vec<Branch>) -> Vec<Branch> {
        branches.sort_by(|a, b| self.ctx.weighting.compare(a, b));
        branches.truncate(self.ctx.config.max_active_branches);
        branches
    }

    /// Brings every branch behind the best one up to its frontier.
    ///
    /// The best branch, which comes first, is left untouched. Each other
    /// branch behind it is expanded directly until it reaches the leader's
    /// frontier; failing that, it is spliced onto the leader where their
    /// routes meet, and dropped otherwise. With bypass detection, every
    /// branch may additionally yield a variant avoiding a lower-class detour.
    pub fn expand_slow_paths(&self, branches: Vec<Branch>) -> Result<Vec<Branch>, MatchError> {
        let mut branches = branches.into_iter();
        let Some(leader) = branches.next() else {
            return Ok(vec![]);
        };

        let target = leader.frontier();
        let mut result = Vec::new();

        for branch in branches {
            if branch.frontier() >= target {
                result.push(branch);
                continue;
            }

            let caught = self.catch_up(branch.clone(), target)?;
            if !caught.is_empty() {
                result.extend(caught);
                continue;
            }

            match self.merge_segments(&branch, &leader) {
                Some(merged) => result.push(merged),
                None => debug!("Dropped branch lagging at {} behind {target}", branch.frontier()),
            }
        }

        result.insert(0, leader);

        if self.ctx.config.bypass_detection {
            let mut variants = Vec::new();
            for branch in &result {
                variants.extend(self.bypass_variant(branch)?);
            }

            result.extend(variants);
        }

        Ok(result)
    }

    /// Expands the branch directly, at most `max_catch_up_steps` times,
    /// returning the descendants which reached `target` or finished.
    pub fn catch_up(&self, branch: Branch, target: usize) -> Result<Vec<Branch>, MatchError> {
        let expander = DirectExpander::new(self.ctx);
        let mut pending = vec![branch];
        let mut caught = Vec::new();

        for _ in 0..self.ctx.config.max_catch_up_steps {
            if pending.is_empty() {
                break;
            }

            let expansion = expander.expand(pending)?;
            let mut next = Vec::new();

            for child in expansion.extended.into_iter().chain(expansion.finished) {
                match child.is_finished() || child.frontier() >= target {
                    true => caught.push(child),
                    false => next.push(child),
                }
            }

            pending = self.cap(next);
        }

        Ok(caught)
    }

    /// Continues the branch along the leader from the point where the
    /// leader passes the branch's last segment in the same direction.
    pub fn merge_segments(&self, branch: &Branch, leader: &Branch) -> Option<Branch> {
        let last = branch.last()?;
        let position = leader
            .segments()
            .iter()
            .position(|segment| segment.id() == last.id() && segment.direction() == last.direction())?;

        let points = self.ctx.points();
        let junction = &leader.segments()[position];
        let base = branch.len() - 1;

        let mut merged = branch.clone();
        let valid = merged.edit(|segments| {
            if let Some(joined) = segments.last_mut() {
                let start = joined.start_index();
                let end = joined.end_index().max(junction.end_index());

                joined.flags = joined.flags.union(junction.flags());
                points.assign(joined, start, end);
            }

            segments.extend(leader.segments()[position + 1..].iter().cloned());
            points.recalculate_segment_indexes(segments, base)
        });

        if !valid {
            return None;
        }

        merged.correct_directions_from(base);
        merged.recount_uturns();

        self.ctx.accept(merged, None)
    }

    /// A variant of the branch which takes a higher-class route around a
    /// short detour on lower-class roads between two segments of the same class.
    pub fn bypass_variant(&self, branch: &Branch) -> Result<Option<Branch>, MatchError> {
        let config = self.ctx.config;
        let segments = branch.segments();

        for before in 0..segments.len() {
            let class = segments[before].class();
            let limit = (before + config.bypass_max_detour_segments + 1).min(segments.len() - 1);

            for after in before + 2..=limit {
                let detour = &segments[before + 1..after];

                let lower = detour.iter().all(|segment| segment.class().weight() > class.weight());
                let points = detour.iter().map(MatchedSegment::matched_points).sum::<usize>();

                if !lower || points > config.bypass_max_points || segments[after].class() != class {
                    continue;
                }

                let route = self.ctx.shortest_path(segments[before].id(), segments[after].id())?;
                let Some(route) = route.as_deref() else {
                    continue;
                };

                let between = &route[1..route.len().saturating_sub(1).max(1)];
                let higher = between.iter().all(|segment| segment.class.weight() <= class.weight());

                if between.is_empty() || !higher {
                    continue;
                }

                if let Some(variant) = self.splice_route(branch, before, after, between) {
                    debug!(
                        "Bypassing {} lower-class segments after {}",
                        detour.len(),
                        segments[before].id()
                    );
                    return Ok(Some(variant));
                }
            }
        }

        Ok(None)
    }

    /// Replaces the segments strictly between `before` and `after` by `route`.
    fn splice_route(
        &self,
        branch: &Branch,
        before: usize,
        after: usize,
        route: &[Arc<NetworkSegment>],
    ) -> Option<Branch> {
        let points = self.ctx.points();
        let segments = branch.segments();

        let start = segments[before].end_index();
        let mut node = segments[before]
            .exit_node()
            .filter(|node| route[0].touches(*node))
            .or_else(|| segments[before].segment().shared_node(&route[0], None))?;

        let flags = SegmentFlags {
            from_path_search: true,
            ..SegmentFlags::default()
        };

        let mut replacement = Vec::with_capacity(route.len());
        for segment in route {
            let entry = segment.anchor_of(node).unwrap_or(Anchor::Center);
            replacement.push(
                MatchedSegment::new(segment.clone(), start, Direction::from_anchors(entry, entry.opposite()))
                    .with_flags(flags),
            );
            node = segment.other_node(node);
        }

        let mut variant = branch.clone();
        let valid = variant.edit(|segments| {
            segments.splice(before + 1..after, replacement);
            points.recalculate_segment_indexes(segments, before)
        });

        if !valid {
            return None;
        }

        variant.correct_directions_from(before);
        variant.recount_uturns();
        variant.record_path_search();

        self.ctx.accept(variant, None)
    }

    /// Detaches the longest prefix shared by every active branch into the
    /// certain path, leaving each branch at least one segment.
    pub fn extract_certain_prefix(&self, set: &mut BranchSet) {
        let Some(shortest) = set.active.iter().map(Branch::len).min() else {
            return;
        };

        let first = &set.active[0];
        let count = (0..shortest.saturating_sub(1))
            .take_while(|&index| {
                let reference = &first.segments()[index];
                set.active
                    .iter()
                    .all(|branch| branch.segments()[index].same_position(reference))
            })
            .count();

        if count == 0 {
            return;
        }

        let prefix = first.segments()[..count]
            .iter()
            .cloned()
            .map(|mut segment| {
                segment.flags.certain = true;
                segment
            })
            .collect::<Vec<_>>();

        for branch in &mut set.active {
            branch.detach_prefix(count);
        }

        debug!("Moved {count} segments into the certain path");
        set.certain.extend(prefix);
    }
}
