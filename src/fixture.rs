//! Builds networks and tracks from the `branchmatch_fixtures` crate.

use crate::graph::{MemoryNetwork, NetworkSegment, NodeId, OneWay, RoadClass, SegmentId};
use crate::matcher::{
    CancellationToken, DefaultWeighting, MatchCaches, MatchConfig, MatchContext, MatchStatistics,
    Track, TrackPoint, TrackPreprocessor,
};

use branchmatch_fixtures::{to_lng_lat, RoadFixture};
use chrono::{DateTime, TimeDelta, Utc};
use geo::{LineString, Point};
use std::cell::RefCell;
use std::str::FromStr;

pub(crate) use branchmatch_fixtures::*;

pub(crate) fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

pub(crate) fn point(x: f64, y: f64) -> Point {
    let (lng, lat) = to_lng_lat((x, y));
    Point::new(lng, lat)
}

pub(crate) fn segment(road: &RoadFixture) -> NetworkSegment {
    let geometry = road
        .path
        .iter()
        .map(|(x, y)| point(*x, *y))
        .collect::<LineString>();

    NetworkSegment::new(
        SegmentId(road.id),
        (NodeId(road.start), NodeId(road.end)),
        geometry,
        RoadClass::from_str(road.class).expect("fixture class must be valid"),
        OneWay::from_tag(road.one_way),
        road.urban,
    )
}

pub(crate) fn network(name: &str, roads: Vec<RoadFixture>) -> MemoryNetwork {
    MemoryNetwork::new(name, roads.iter().map(segment))
}

pub(crate) fn track(points: &[(f64, f64, i64)]) -> Track {
    Track::new(points.iter().map(|(x, y, seconds)| {
        TrackPoint::new(point(*x, *y), start_time() + TimeDelta::seconds(*seconds))
    }))
}

/// Owns everything a [`MatchContext`] borrows, for testing single components.
pub(crate) struct Harness {
    pub network: MemoryNetwork,
    pub weighting: DefaultWeighting,
    pub config: MatchConfig,
    pub track: Track,
    pub cancel: CancellationToken,
    pub caches: RefCell<MatchCaches>,
    pub statistics: RefCell<MatchStatistics>,
}

impl Harness {
    pub fn new(roads: Vec<RoadFixture>, points: &[(f64, f64, i64)]) -> Self {
        let config = MatchConfig::default();

        Harness {
            network: network("harness", roads),
            weighting: DefaultWeighting::default(),
            caches: RefCell::new(MatchCaches::new(
                config.candidate_cache_capacity,
                config.path_cache_capacity,
            )),
            config,
            track: track(points),
            cancel: CancellationToken::new(),
            statistics: RefCell::new(MatchStatistics::default()),
        }
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context(&self) -> MatchContext<'_, MemoryNetwork, DefaultWeighting> {
        let profile = TrackPreprocessor::new(&self.config).analyze(&self.track);

        MatchContext::new(
            &self.network,
            &self.weighting,
            &self.config,
            &self.track,
            profile,
            &self.cancel,
            &self.caches,
            &self.statistics,
        )
    }
}
