use crate::matcher::{MatchConfig, Track};
use crate::util::geometry::square_around;

use geo::{Intersects, Rect};
use log::{debug, info};

#[cfg(test)]
mod test;

/// Sampling characteristics of a track, decided once per match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingProfile {
    /// Mean seconds between consecutive points.
    pub mean_interval: f64,
    pub low_sampling: bool,
    /// Hop budget for shortest-path queries.
    pub max_hops: usize,
}

/// Inspects a track before and while it is matched.
#[derive(Debug, Clone, Copy)]
pub struct TrackPreprocessor<'a> {
    config: &'a MatchConfig,
}

impl<'a> TrackPreprocessor<'a> {
    pub fn new(config: &'a MatchConfig) -> Self {
        TrackPreprocessor { config }
    }

    /// Determines the sampling profile. Low-sampled tracks get twice the
    /// shortest-path hop budget, since points are further apart.
    pub fn analyze(&self, track: &Track) -> SamplingProfile {
        let mean_interval = track.metadata().mean_interval;
        let low_sampling = mean_interval > self.config.low_sampling_interval;

        let max_hops = match low_sampling {
            true => self.config.max_path_hops * 2,
            false => self.config.max_path_hops,
        };

        debug!("Track sampled every {mean_interval:.1}s (low sampling: {low_sampling}), {max_hops} hops");

        SamplingProfile {
            mean_interval,
            low_sampling,
            max_hops,
        }
    }

    /// Whether the track overlaps the area covered by the network.
    pub fn validate(&self, track: &Track, covered_area: Option<Rect>) -> bool {
        let valid = match (track.bounding_rect(), covered_area) {
            (Some(bounds), Some(area)) => bounds.intersects(&area),
            _ => false,
        };

        if !valid {
            info!("Track of {} points lies outside the network, skipping", track.len());
        }

        valid
    }

    /// Number of points to advance from `from` so the next search starts
    /// outside the square of `side_length` around the point at `from`.
    ///
    /// Returns the number of remaining points when all of them lie within it.
    pub fn next_search_point(&self, track: &Track, from: usize, side_length: f64) -> usize {
        let Some(origin) = track.get(from) else {
            return 0;
        };

        let envelope = square_around(origin.position, side_length);

        track.points()[from + 1..]
            .iter()
            .position(|point| !envelope.intersects(&point.position))
            .map_or(track.len() - from - 1, |offset| offset + 1)
    }
}
