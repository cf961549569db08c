//! Drives the matching of one track from seeding to the ranked result.

use crate::error::MatchError;
use crate::graph::{RoadNetwork, SegmentId};
use crate::matcher::{
    AlternativeSearcher, Branch, BranchFilter, BranchSet, CancellationToken, DirectExpander,
    InitialSegmentLocator, MatchCaches, MatchConfig, MatchContext, MatchStatistics, Track,
    TrackPreprocessor, WeightingStrategy,
};

use log::{debug, info};
use measure_time::debug_time;
use std::cell::RefCell;
#[cfg(feature = "tracing")]
use tracing::Level;

pub mod postprocess;


/// Where a match starts from.
#[derive(Debug, Clone, Default)]
pub enum EntryMode {
    /// Seed at the first point with nearby segments.
    #[default]
    Cold,
    /// Seed on a known segment, as when continuing an earlier match online.
    ///
    /// With `force`, branches starting on the segment are ranked first.
    FromSegment { id: SegmentId, force: bool },
    /// Continue from the branches of an earlier match of the same track.
    Resume(Vec<Branch>),
}

/// The ranked branches of a match, best first.
#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    pub branches: Vec<Branch>,
    pub statistics: MatchStatistics,
}

impl MatchOutput {
    #[inline]
    pub fn best(&self) -> Option<&Branch> {
        self.branches.first()
    }

    pub fn into_best(self) -> Option<Branch> {
        self.branches.into_iter().next()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// Matches tracks onto a road network.
///
/// Holds the start-candidate and shortest-path caches, which are reused
/// by every track matched through the same orchestrator.
pub struct MatchOrchestrator<N, W> {
    network: N,
    weighting: W,
    config: MatchConfig,
    caches: RefCell<MatchCaches>,
}

impl<N, W> MatchOrchestrator<N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    pub fn new(network: N, weighting: W, config: MatchConfig) -> Self {
        let caches = MatchCaches::new(config.candidate_cache_capacity, config.path_cache_capacity);

        MatchOrchestrator {
            network,
            weighting,
            config,
            caches: RefCell::new(caches),
        }
    }

    #[inline]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[inline]
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Drops every cached query result.
    pub fn clear_caches(&self) {
        self.caches.borrow_mut().clear();
    }

    /// Matches the track, returning the best branch only.
    pub fn match_best(&self, track: &Track, cancel: &CancellationToken) -> Result<Option<Branch>, MatchError> {
        self.match_track(track, EntryMode::Cold, cancel)
            .map(MatchOutput::into_best)
    }

    /// Matches the track, returning every finished branch, best first.
    ///
    /// Tracks too short or outside the network yield an empty output
    /// without querying the network.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::INFO, skip_all, fields(points = track.len())))]
    pub fn match_track(
        &self,
        track: &Track,
        entry: EntryMode,
        cancel: &CancellationToken,
    ) -> Result<MatchOutput, MatchError> {
        debug_time!("Matched track of {} points", track.len());

        let preprocessor = TrackPreprocessor::new(&self.config);
        if track.len() < self.config.min_track_points {
            info!("Track of {} points is too short to match", track.len());
            return Ok(MatchOutput::default());
        }

        if !preprocessor.validate(track, self.network.covered_area()) {
            return Ok(MatchOutput::default());
        }

        let statistics = RefCell::new(MatchStatistics::default());
        let ctx = MatchContext::new(
            &self.network,
            &self.weighting,
            &self.config,
            track,
            preprocessor.analyze(track),
            cancel,
            &self.caches,
            &statistics,
        );

        let forced = match &entry {
            EntryMode::FromSegment { id, force: true } => Some(*id),
            _ => None,
        };

        let finished = self.run(&ctx, entry)?;
        let branches = postprocess::finalize(&ctx, finished, forced);

        let statistics = statistics.into_inner();
        info!(
            "Matched {} branches in {} iterations ({} restarts, {} alternative searches, {}/{} cached paths)",
            branches.len(),
            statistics.iterations,
            statistics.restarts,
            statistics.alternative_searches,
            statistics.path_cache_hits,
            statistics.path_queries,
        );

        Ok(MatchOutput { branches, statistics })
    }

    /// Runs the matching loop until some branch finishes, restarting further
    /// along the track whenever a run ends without any.
    fn run(&self, ctx: &MatchContext<'_, N, W>, entry: EntryMode) -> Result<Vec<Branch>, MatchError> {
        let track_len = ctx.track.len();

        let mut initial = match entry {
            EntryMode::Cold => vec![],
            EntryMode::FromSegment { id, .. } => self.seed_from_segment(ctx, id)?,
            EntryMode::Resume(branches) => branches,
        };

        let mut start = 0;
        loop {
            ctx.checkpoint()?;

            let seeds = match initial.is_empty() {
                true => self.seed_cold(ctx, &mut start)?,
                false => std::mem::take(&mut initial),
            };

            if seeds.is_empty() {
                debug!("No segments found near the track beyond point {start}");
                return Ok(vec![]);
            }

            let set = self.run_from(ctx, seeds)?;
            let finished = set.build_finished_paths();
            if !finished.is_empty() {
                return Ok(finished);
            }

            start = set.furthest.max(start) + 1;
            if start >= track_len {
                return Ok(vec![]);
            }

            ctx.record(|stats| stats.restarts += 1);
            debug!("Restarting at point {start}");
        }
    }

    /// Seeds at the first point from `start` onwards which yields any branch.
    fn seed_cold(&self, ctx: &MatchContext<'_, N, W>, start: &mut usize) -> Result<Vec<Branch>, MatchError> {
        let locator = InitialSegmentLocator::new(ctx);
        let preprocessor = TrackPreprocessor::new(ctx.config);

        while *start < ctx.track.len() {
            let seeds = locator.seed(*start)?;
            if !seeds.is_empty() {
                return Ok(seeds);
            }

            *start += preprocessor
                .next_search_point(ctx.track, *start, ctx.config.envelope_side_length)
                .max(1);
        }

        Ok(vec![])
    }

    /// Seeds on the segment at the first point matching it.
    fn seed_from_segment(&self, ctx: &MatchContext<'_, N, W>, id: SegmentId) -> Result<Vec<Branch>, MatchError> {
        let segment = ctx.network.segment(id)?;
        let points = ctx.points();

        let Some(index) = (0..ctx.track.len()).find(|index| points.matches(&segment, *index)) else {
            debug!("Start segment {id} matches no point of the track");
            return Ok(vec![]);
        };

        InitialSegmentLocator::new(ctx).seed_branches(&segment, index)
    }

    /// Expands the seeds until no branch is left active, or no branch got
    /// any further for `max_stall_iterations` iterations.
    fn run_from(&self, ctx: &MatchContext<'_, N, W>, seeds: Vec<Branch>) -> Result<BranchSet, MatchError> {
        let expander = DirectExpander::new(ctx);
        let searcher = AlternativeSearcher::new(ctx);
        let filter = BranchFilter::new(ctx);

        let mut set = BranchSet::default();
        filter.apply(&mut set, seeds)?;

        let mut stalls = 0;
        while !set.active.is_empty() {
            ctx.checkpoint()?;
            ctx.record(|stats| stats.iterations += 1);

            let reached = set.furthest;
            let expansion = expander.expand(std::mem::take(&mut set.active))?;
            let mut candidates = expansion.finished;

            match expansion.extended.is_empty() {
                true if expansion.any_matched => candidates.extend(searcher.search(expansion.stalled)?),
                true => {}
                false => {
                    let mut extended = expansion.extended;
                    expander.correct_segment_directions(&mut extended);

                    candidates.extend(extended);
                    candidates.extend(expansion.stalled);
                }
            }

            filter.apply(&mut set, candidates)?;

            match set.furthest > reached {
                true => stalls = 0,
                false => stalls += 1,
            }

            if stalls > ctx.config.max_stall_iterations {
                debug!("No progress beyond point {} for {stalls} iterations", set.furthest);
                break;
            }
        }

        Ok(set)
    }
}
