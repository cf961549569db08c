use crate::error::MatchError;
use crate::graph::{NetworkSegment, NodeId, RoadNetwork, SegmentId};
use crate::matcher::primitives::cache::{CachedPath, CandidateKey, Candidates, PathKey};
use crate::matcher::{
    Branch, CancellationToken, MatchCaches, MatchConfig, PointMatcher, SamplingProfile, Track,
    WeightingStrategy,
};

use log::debug;
use std::cell::RefCell;
use std::sync::Arc;

/// Counters describing the work done for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStatistics {
    /// Outer iterations of the expansion loop.
    pub iterations: usize,
    /// Cold restarts after every branch was lost.
    pub restarts: usize,
    /// Rounds of the alternative search.
    pub alternative_searches: usize,
    /// Shortest-path requests, answered by cache or network.
    pub path_queries: usize,
    pub path_cache_hits: usize,
    /// Start-candidate requests, answered by cache or network.
    pub candidate_queries: usize,
    pub candidate_cache_hits: usize,
    pub finished_branches: usize,
}

/// Everything the matching components share while one track is matched.
///
/// The components borrow the context instead of each other, so it is
/// the single place holding the network, the weighting, the caches and
/// the cancellation flag.
pub struct MatchContext<'a, N, W> {
    pub network: &'a N,
    pub weighting: &'a W,
    pub config: &'a MatchConfig,
    pub track: &'a Track,
    pub profile: SamplingProfile,

    cancel: &'a CancellationToken,
    caches: &'a RefCell<MatchCaches>,
    statistics: &'a RefCell<MatchStatistics>,
}

impl<'a, N, W> MatchContext<'a, N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        network: &'a N,
        weighting: &'a W,
        config: &'a MatchConfig,
        track: &'a Track,
        profile: SamplingProfile,
        cancel: &'a CancellationToken,
        caches: &'a RefCell<MatchCaches>,
        statistics: &'a RefCell<MatchStatistics>,
    ) -> Self {
        MatchContext {
            network,
            weighting,
            config,
            track,
            profile,
            cancel,
            caches,
            statistics,
        }
    }

    /// Fails with [`MatchError::Cancelled`] once cancellation was requested.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), MatchError> {
        match self.cancel.is_cancelled() {
            true => Err(MatchError::Cancelled),
            false => Ok(()),
        }
    }

    #[inline]
    pub fn points(&self) -> PointMatcher<'a> {
        PointMatcher::new(self.track, self.config.matching_radius)
    }

    pub fn record(&self, update: impl FnOnce(&mut MatchStatistics)) {
        update(&mut self.statistics.borrow_mut());
    }

    /// Segments within `radius` of the point at `index`, closest first.
    pub fn nearest(&self, index: usize, radius: f64, max_count: usize) -> Result<Arc<Candidates>, MatchError> {
        self.checkpoint()?;
        self.record(|stats| stats.candidate_queries += 1);

        let point = self.track.point(index);
        let calculate = || -> Result<Candidates, MatchError> {
            let found = self.network.nearest_segments(&point.position, radius, max_count)?;

            let mut candidates = found
                .into_iter()
                .filter(|(_, distance)| *distance <= radius)
                .map(|(id, distance)| Ok((self.network.segment(id)?, distance)))
                .collect::<Result<Vec<_>, MatchError>>()?;

            candidates.sort_by(|(a, a_distance), (b, b_distance)| {
                a_distance.total_cmp(b_distance).then(a.id.cmp(&b.id))
            });
            candidates.truncate(max_count);

            Ok(candidates)
        };

        let Some(point_key) = point.key() else {
            return calculate().map(Arc::new);
        };

        let key = CandidateKey {
            point: point_key,
            radius_cm: (radius * 100.0).round() as u64,
            max_count,
        };

        let mut caches = self.caches.borrow_mut();
        let hits = caches.candidates.hits();
        let candidates = caches.candidates.query(key, calculate)?;

        if caches.candidates.hits() > hits {
            self.record(|stats| stats.candidate_cache_hits += 1);
        }

        Ok(candidates)
    }

    /// Segments enterable after leaving `id` through `exit`.
    pub fn adjacent(&self, id: SegmentId, exit: NodeId) -> Result<Vec<Arc<NetworkSegment>>, MatchError> {
        self.checkpoint()?;
        Ok(self.network.adjacent_segments(id, exit)?)
    }

    /// Shortest path within the hop budget of the track's sampling profile.
    pub fn shortest_path(&self, from: SegmentId, to: SegmentId) -> Result<Arc<CachedPath>, MatchError> {
        self.checkpoint()?;
        self.record(|stats| stats.path_queries += 1);

        let key = PathKey {
            from,
            to,
            max_hops: self.profile.max_hops,
        };

        let mut caches = self.caches.borrow_mut();
        let hits = caches.paths.hits();
        let path = caches.paths.query(key, || {
            debug!("Querying path {from} -> {to}");
            self.network.shortest_path(from, to, key.max_hops)
        })?;

        if caches.paths.hits() > hits {
            self.record(|stats| stats.path_cache_hits += 1);
        }

        Ok(path)
    }

    /// Scores the branch and keeps it only if it is well-formed and passes
    /// the validity gate over `window`. Branches explaining the whole
    /// track are marked finished.
    pub fn accept(&self, mut branch: Branch, window: Option<usize>) -> Option<Branch> {
        if branch.is_empty() || !branch.is_monotonic(self.track.len()) {
            return None;
        }

        if !self.weighting.is_valid(&branch, window) {
            return None;
        }

        if branch.frontier() >= self.track.len() {
            branch.finish();
        }

        branch.rescore(self.weighting);
        Some(branch)
    }

    /// The better of two branches according to the weighting.
    pub fn is_better(&self, a: &Branch, b: &Branch) -> bool {
        self.weighting.compare(a, b).is_lt()
    }
}
