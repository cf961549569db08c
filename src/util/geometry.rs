//! Small geodesic helpers shared by the graph backend and the matcher.

use geo::{
    Destination, Distance, Geodesic, Haversine, InterpolatableLine, LineLocatePoint, LineString,
    Point, Rect,
};
use std::f64::consts::SQRT_2;

/// Haversine length of a linestring, in meters.
#[inline]
pub fn line_length(line: &LineString) -> f64 {
    line.lines().fold(0.0, |length, segment| {
        length + Haversine.distance(segment.start_point(), segment.end_point())
    })
}

/// Shortest haversine distance, in meters, between the point and the linestring.
///
/// Every line of the linestring is projected upon in turn, the closest
/// projection wins. Returns [`f64::INFINITY`] for an empty linestring.
pub fn distance_to_line(point: &Point, line: &LineString) -> f64 {
    line.lines()
        .map(|segment| {
            // Zero-length lines cannot be located upon, their start is the projection
            let fraction = segment.line_locate_point(point).unwrap_or(0.0);
            let projected = segment.point_at_ratio_from_start(&Haversine, fraction);

            Haversine.distance(projected, *point)
        })
        .fold(f64::INFINITY, f64::min)
}

/// The fraction, in `[0, 1]`, of the linestring's length at which the point
/// is projected upon it.
#[inline]
pub fn fraction_along(point: &Point, line: &LineString) -> f64 {
    line.line_locate_point(point)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

/// An axis-aligned square with the given side length, in meters, centered on the point.
///
/// The corners are found geodesically along the diagonals, as a square-scan does.
pub fn square_around(point: Point, side_length: f64) -> Rect {
    let half_diagonal = side_length / 2.0 * SQRT_2;

    let bottom_right = Geodesic.destination(point, 135.0, half_diagonal);
    let top_left = Geodesic.destination(point, 315.0, half_diagonal);

    Rect::new(top_left.0, bottom_right.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{wkt, Intersects};

    #[test]
    fn measures_line_length() {
        // Roughly 1.112km along the equator, per 0.01 degree
        let line = wkt! { LINESTRING (13.0 0.0, 13.01 0.0, 13.02 0.0) };
        assert_relative_eq!(line_length(&line), 2_223.9, max_relative = 0.001);
    }

    #[test]
    fn distance_uses_closest_projection() {
        let line = wkt! { LINESTRING (13.0 0.0, 13.001 0.0, 13.001 0.001) };

        let beside = Point::new(13.0005, 0.00002);
        assert_relative_eq!(distance_to_line(&beside, &line), 2.22, max_relative = 0.01);

        let beyond = Point::new(13.0011, 0.0005);
        assert_relative_eq!(distance_to_line(&beyond, &line), 11.12, max_relative = 0.01);
    }

    #[test]
    fn fraction_is_clamped() {
        let line = wkt! { LINESTRING (13.0 0.0, 13.001 0.0) };

        assert_relative_eq!(fraction_along(&Point::new(13.00025, 0.0001), &line), 0.25, epsilon = 1e-6);
        assert_relative_eq!(fraction_along(&Point::new(12.9, 0.0), &line), 0.0);
        assert_relative_eq!(fraction_along(&Point::new(13.1, 0.0), &line), 1.0);
    }

    #[test]
    fn square_contains_its_center() {
        let center = Point::new(13.0, 0.0);
        let square = square_around(center, 10.0);

        assert!(square.intersects(&center));
        assert!(!square.intersects(&Point::new(13.0001, 0.0)));
        assert_relative_eq!(square.width() * 111_195.08, 10.0, max_relative = 0.01);
    }
}
