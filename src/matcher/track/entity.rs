use chrono::{DateTime, Utc};
use geo::{BoundingRect, Distance, Haversine, LineString, MultiPoint, Point, Rect};
use itertools::Itertools;
use log::debug;

/// Length of the geohash used for point keys, roughly 4cm x 2cm cells.
const KEY_PRECISION: usize = 12;

/// A single GPS fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position: Point,
    pub timestamp: DateTime<Utc>,
}

/// Hashable value identity of a [`TrackPoint`], used to key caches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointKey {
    cell: String,
    timestamp: i64,
}

impl TrackPoint {
    pub fn new(position: Point, timestamp: DateTime<Utc>) -> Self {
        TrackPoint {
            position,
            timestamp,
        }
    }

    /// The cache key of the point. `None` if the position cannot be geohashed.
    pub fn key(&self) -> Option<PointKey> {
        geohash::encode(self.position.0, KEY_PRECISION)
            .ok()
            .map(|cell| PointKey {
                cell,
                timestamp: self.timestamp.timestamp_millis(),
            })
    }

    /// Seconds elapsed since the `earlier` point, negative if it is in fact later.
    #[inline]
    pub fn seconds_since(&self, earlier: &TrackPoint) -> f64 {
        (self.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1_000.0
    }

    #[inline]
    pub fn distance(&self, other: &TrackPoint) -> f64 {
        Haversine.distance(self.position, other.position)
    }
}

/// Summary of a [`Track`], recomputed whenever the track changes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackMetadata {
    /// Sum of the distances between consecutive points, in meters.
    pub length: f64,
    pub point_count: usize,
    /// Mean time between consecutive points, in seconds.
    pub mean_interval: f64,
    /// Mean distance between consecutive points, in meters.
    pub mean_distance: f64,
}

impl TrackMetadata {
    fn compute(points: &[TrackPoint]) -> Self {
        let (length, duration) = points
            .iter()
            .tuple_windows()
            .fold((0.0, 0.0), |(length, duration), (a, b)| {
                (length + a.distance(b), duration + b.seconds_since(a))
            });

        let gaps = points.len().saturating_sub(1).max(1) as f64;

        TrackMetadata {
            length,
            point_count: points.len(),
            mean_interval: duration / gaps,
            mean_distance: length / gaps,
        }
    }
}

/// An ordered sequence of GPS fixes to be matched.
///
/// The [`TrackMetadata`] is computed on construction and kept
/// current by [`Track::push`]; a track is otherwise immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
    metadata: TrackMetadata,
}

impl From<Vec<TrackPoint>> for Track {
    fn from(points: Vec<TrackPoint>) -> Self {
        let metadata = TrackMetadata::compute(&points);
        Track { points, metadata }
    }
}

impl Track {
    pub fn new(points: impl IntoIterator<Item = TrackPoint>) -> Self {
        Track::from(points.into_iter().collect::<Vec<_>>())
    }

    /// Appends a fix to the end of the track, refreshing its metadata.
    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
        self.metadata = TrackMetadata::compute(&self.points);
    }

    /// Removes fixes which cannot be matched in sequence: exact
    /// duplicates of the previous fix and fixes whose timestamp does
    /// not advance past the last kept one.
    pub fn sanitize(self) -> Self {
        let total = self.points.len();
        let mut kept: Vec<TrackPoint> = Vec::with_capacity(total);

        for point in self.points {
            match kept.last() {
                Some(last) if last == &point => continue,
                Some(last) if point.timestamp <= last.timestamp => continue,
                _ => kept.push(point),
            }
        }

        if kept.len() != total {
            debug!("Sanitized track from {total} to {} points", kept.len());
        }

        Track::from(kept)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// The fix at `index`, which must be within the track.
    #[inline]
    pub fn point(&self, index: usize) -> &TrackPoint {
        &self.points[index]
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    #[inline]
    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// Straight-line distance between two fixes, in meters.
    #[inline]
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.point(from).distance(self.point(to))
    }

    /// Seconds elapsed between two fixes.
    #[inline]
    pub fn elapsed(&self, from: usize, to: usize) -> f64 {
        self.point(to).seconds_since(self.point(from))
    }

    /// Converts the track into a [`LineString`].
    pub fn linestring(&self) -> LineString {
        self.points.iter().map(|point| point.position).collect()
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        self.points
            .iter()
            .map(|point| point.position)
            .collect::<MultiPoint>()
            .bounding_rect()
    }
}
