use crate::error::MatchError;
use crate::graph::{Anchor, NetworkSegment, RoadNetwork};
use crate::matcher::primitives::cache::Candidates;
use crate::matcher::{Branch, Direction, MatchContext, MatchedSegment, SegmentFlags, WeightingStrategy};

use log::debug;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::Level;


/// Seeds branches at the start of a track, or wherever matching restarts.
pub struct InitialSegmentLocator<'a, N, W> {
    ctx: &'a MatchContext<'a, N, W>,
}

impl<'a, N, W> InitialSegmentLocator<'a, N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    pub fn new(ctx: &'a MatchContext<'a, N, W>) -> Self {
        InitialSegmentLocator { ctx }
    }

    /// Segments within `radius` of the point, closest first, at most `max_count`.
    pub fn find_start_candidates(
        &self,
        index: usize,
        radius: f64,
        max_count: usize,
    ) -> Result<Arc<Candidates>, MatchError> {
        self.ctx.nearest(index, radius, max_count)
    }

    /// Seeds every start candidate around the point at `index`.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip(self)))]
    pub fn seed(&self, index: usize) -> Result<Vec<Branch>, MatchError> {
        let config = self.ctx.config;
        let candidates =
            self.find_start_candidates(index, config.initial_radius, config.max_initial_candidates)?;

        let mut seeds = Vec::new();
        for (candidate, _) in candidates.iter() {
            seeds.extend(self.seed_branches(candidate, index)?);
        }

        debug!("Seeded {} branches from {} candidates at point {index}", seeds.len(), candidates.len());
        Ok(seeds)
    }

    /// Seeds the branches starting on `candidate` at the point at `index`.
    ///
    /// Every neighbour reachable from the candidate which matches the
    /// following points yields a two-segment branch. Without any, one
    /// single-segment branch is created per direction the candidate may
    /// be travelled in.
    pub fn seed_branches(
        &self,
        candidate: &Arc<NetworkSegment>,
        index: usize,
    ) -> Result<Vec<Branch>, MatchError> {
        let points = self.ctx.points();

        let end = points.match_forward(candidate, index);
        if end == index {
            return Ok(vec![]);
        }

        let flags = SegmentFlags {
            start_segment: true,
            ..SegmentFlags::default()
        };

        let mut head = MatchedSegment::new(candidate.clone(), index, Direction::CenterToCenter)
            .with_flags(flags);
        points.assign(&mut head, index, end);

        let exits = [Anchor::End, Anchor::Start]
            .into_iter()
            .filter(|anchor| candidate.one_way.allows_exit(*anchor))
            .collect::<Vec<_>>();

        let mut seeds = Vec::new();

        for &exit in &exits {
            let Some(node) = candidate.node_at(exit) else {
                continue;
            };

            for neighbour in self.ctx.adjacent(candidate.id, node)? {
                if neighbour.id == candidate.id {
                    continue;
                }

                let neighbour_end = points.match_forward(&neighbour, end);
                if neighbour_end == end {
                    continue;
                }

                let mut first = head.clone();
                first.direction = Direction::from_anchors(Anchor::Center, exit);

                let entry = neighbour.anchor_of(node).unwrap_or(Anchor::Center);
                let mut second = MatchedSegment::new(
                    neighbour.clone(),
                    end,
                    Direction::from_anchors(entry, entry.opposite()),
                );

                // Trailing points closer to the neighbour move over to it
                let split = points.steal_trailing(&first, &neighbour, 1);
                points.remove_diff_distances(&mut first, split);
                points.assign(&mut second, split, neighbour_end);

                if let Some(branch) = self.ctx.accept(Branch::new(vec![first, second]), None) {
                    seeds.push(branch);
                }
            }
        }

        if seeds.is_empty() {
            for &exit in &exits {
                let mut single = head.clone();
                single.direction = Direction::from_anchors(Anchor::Center, exit);

                if let Some(branch) = self.ctx.accept(Branch::new(vec![single]), None) {
                    seeds.push(branch);
                }
            }
        }

        Ok(seeds)
    }
}
