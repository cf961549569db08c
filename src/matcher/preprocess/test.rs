use crate::fixture::{self, ladder, track, FAR_AWAY, LADDER_SPARSE, LADDER_STRAIGHT};
use crate::graph::RoadNetwork;
use crate::matcher::{MatchConfig, TrackPreprocessor};

#[test]
fn dense_tracks_keep_the_hop_budget() {
    let config = MatchConfig::default();
    let profile = TrackPreprocessor::new(&config).analyze(&track(LADDER_STRAIGHT));

    assert!(!profile.low_sampling);
    assert_eq!(profile.max_hops, config.max_path_hops);
}

#[test]
fn low_sampling_doubles_the_hop_budget() {
    let config = MatchConfig {
        low_sampling_interval: 5.0,
        ..MatchConfig::default()
    };

    // Fourteen seconds between points on average
    let profile = TrackPreprocessor::new(&config).analyze(&track(LADDER_SPARSE));

    assert!(profile.low_sampling);
    assert_eq!(profile.max_hops, config.max_path_hops * 2);
}

#[test]
fn tracks_outside_the_network_are_invalid() {
    let config = MatchConfig::default();
    let network = fixture::network("ladder", ladder());
    let preprocessor = TrackPreprocessor::new(&config);

    assert!(preprocessor.validate(&track(LADDER_STRAIGHT), network.covered_area()));
    assert!(!preprocessor.validate(&track(FAR_AWAY), network.covered_area()));
    assert!(!preprocessor.validate(&track(LADDER_STRAIGHT), None));
}

#[test]
fn next_search_point_skips_clustered_points() {
    let config = MatchConfig::default();
    let preprocessor = TrackPreprocessor::new(&config);

    let clustered = track(&[
        (0.0, 0.0, 0),
        (1.0, 1.0, 1),
        (2.0, 0.0, 2),
        (-3.0, 2.0, 3),
        (30.0, 0.0, 4),
        (60.0, 0.0, 5),
    ]);

    assert_eq!(preprocessor.next_search_point(&clustered, 0, 10.0), 4);
    assert_eq!(preprocessor.next_search_point(&clustered, 4, 10.0), 1);
    assert_eq!(preprocessor.next_search_point(&clustered, 5, 10.0), 0);
}

#[test]
fn next_search_point_covers_remaining_cluster() {
    let config = MatchConfig::default();
    let preprocessor = TrackPreprocessor::new(&config);

    let parked = track(&[(0.0, 0.0, 0), (1.0, 0.0, 10), (0.0, 1.0, 20)]);
    assert_eq!(preprocessor.next_search_point(&parked, 0, 10.0), 2);
}
