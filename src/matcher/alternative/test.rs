use crate::fixture::{gap, ladder, Harness, GAP_CROSSING, LADDER_SPARSE, LADDER_STRAIGHT, LADDER_TELEPORT};
use crate::graph::{RoadNetwork, SegmentId};
use crate::matcher::alternative::Feasibility;
use crate::matcher::{
    AlternativePath, AlternativeSearcher, Branch, Direction, InitialSegmentLocator, MatchedSegment,
    SegmentFlags, WeightingStrategy,
};

use approx::assert_relative_eq;

fn ids(branch: &Branch) -> Vec<u64> {
    branch.segments().iter().map(|segment| segment.id().0).collect()
}

fn ranked(harness: &Harness, mut branches: Vec<Branch>) -> Vec<Branch> {
    branches.sort_by(|a, b| harness.weighting.compare(a, b));
    branches
}

#[test_log::test]
fn stalled_branches_are_routed_to_the_next_match() {
    let harness = Harness::new(ladder(), LADDER_SPARSE);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    assert_eq!(seeds.len(), 2);

    let found = AlternativeSearcher::new(&ctx).search(seeds).expect("search must succeed");
    let found = ranked(&harness, found);
    assert_eq!(found.len(), 2);

    let best = &found[0];
    assert_eq!(ids(best), vec![1, 2, 3]);
    assert!(best.is_finished());
    assert_eq!(best.path_searches(), 1);
    assert_eq!(best.uturns(), 0);

    let passed = &best.segments()[1];
    assert!(passed.is_empty());
    assert!(passed.is_from_path_search());
    assert_eq!(passed.direction(), Direction::StartToEnd);

    let target = &best.segments()[2];
    assert_eq!((target.start_index(), target.end_index()), (3, 6));

    // Heading away from node 2 first, the other seed has to turn around
    let reversed = &found[1];
    assert_eq!(reversed.uturns(), 1);
    assert!(reversed.segments()[0].is_u_turn());
    assert_eq!(reversed.segments()[0].direction(), Direction::EndToEnd);

    assert_eq!(harness.statistics.borrow().alternative_searches, 1);
}

#[test]
fn disconnected_target_is_reached_by_skipping() {
    let harness = Harness::new(gap(), GAP_CROSSING);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let found = AlternativeSearcher::new(&ctx).search(seeds).expect("search must succeed");

    assert!(!found.is_empty());
    for branch in &found {
        assert_eq!(ids(branch), vec![10, 11]);
        assert!(branch.is_finished());
        assert_eq!(branch.path_searches(), 0);

        let skipped = &branch.segments()[1];
        assert!(skipped.is_after_skipped_part());
        assert_eq!((skipped.start_index(), skipped.end_index()), (5, 9));
    }
}

#[test]
fn implausibly_fast_routes_are_skipped_instead() {
    let harness = Harness::new(ladder(), LADDER_TELEPORT);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let found = AlternativeSearcher::new(&ctx).search(seeds).expect("search must succeed");

    assert!(!found.is_empty());
    for branch in &found {
        assert_eq!(ids(branch), vec![1, 3]);
        assert!(branch.segments()[1].is_after_skipped_part());
    }
}

#[test]
fn exhausted_track_finishes_with_unmatched_tail() {
    const OFF_ROAD: &[(f64, f64, i64)] = &[
        (10.0, 4.0, 0),
        (60.0, 4.0, 5),
        (110.0, 4.0, 10),
        (1000.0, 500.0, 20),
        (1040.0, 500.0, 24),
    ];

    let harness = Harness::new(ladder(), OFF_ROAD);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let found = AlternativeSearcher::new(&ctx).search(seeds).expect("search must succeed");

    assert_eq!(found.len(), 2);
    for branch in &found {
        assert!(branch.is_finished());
        assert_eq!(branch.unmatched_tail(), 2);
        assert_eq!(ids(branch), vec![1]);
    }
}

#[test]
fn merging_the_same_segment_keeps_a_single_copy() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let branch = &seeds[0];
    assert_eq!(ids(branch), vec![1, 2]);

    let routed = SegmentFlags {
        from_path_search: true,
        ..SegmentFlags::default()
    };

    let repeated = MatchedSegment::new(
        harness.network.segment(SegmentId(2)).expect("segment exists"),
        11,
        Direction::StartToEnd,
    )
    .with_flags(routed);

    let mut next = MatchedSegment::new(
        harness.network.segment(SegmentId(3)).expect("segment exists"),
        11,
        Direction::StartToEnd,
    )
    .with_flags(routed);
    ctx.points().assign(&mut next, 11, 16);

    let path = AlternativePath {
        segments: vec![repeated, next],
        after_skipped_part: false,
        causes_uturn: false,
    };

    let merged = AlternativeSearcher::new(&ctx)
        .merge_continuation(branch, &path, true)
        .expect("continuation must merge");

    assert_eq!(ids(&merged), vec![1, 2, 3]);

    let second = &merged.segments()[1];
    assert!(second.is_from_path_search());
    assert!(!second.is_u_turn());
    assert_eq!(second.start_index(), 5);

    // The point just past node 3 moves on to segment 3
    assert_eq!(second.end_index(), 10);
    assert_eq!(merged.segments()[2].start_index(), 10);
    assert_eq!(merged.path_searches(), 1);

    // The original branch is left untouched
    assert_eq!(ids(branch), vec![1, 2]);
    assert!(!branch.segments()[1].is_from_path_search());
}

#[test]
fn continuation_back_onto_the_start_segment_is_rejected() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");

    let mut back = MatchedSegment::new(
        harness.network.segment(SegmentId(1)).expect("segment exists"),
        11,
        Direction::EndToStart,
    );
    ctx.points().assign(&mut back, 11, 11);

    let path = AlternativePath {
        segments: vec![back],
        after_skipped_part: true,
        causes_uturn: false,
    };

    let merged = AlternativeSearcher::new(&ctx).merge_continuation(&seeds[0], &path, false);
    assert!(merged.is_none());
}

#[test]
fn minimum_duration_counts_partial_segments() {
    let harness = Harness::new(ladder(), LADDER_SPARSE);
    let ctx = harness.context();
    let searcher = AlternativeSearcher::new(&ctx);

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let last = seeds[0].last().expect("seed is not empty");
    assert_eq!(last.direction(), Direction::CenterToEnd);

    let route = harness
        .network
        .shortest_path(SegmentId(1), SegmentId(3), 20)
        .expect("query must succeed")
        .expect("route must exist");

    let path = searcher.routed_path(last, &route, 3, 6).expect("route starts on the last segment");
    assert!(!path.causes_uturn);

    // 90m left on segment 1, all of segment 2 and 50m of segment 3 at 60 km/h
    let feasibility = Feasibility::new(&harness.track, &harness.config);
    assert_relative_eq!(
        feasibility.minimum_duration(last, &path, 2, 3),
        340.0 / (50.0 / 3.6 * 1.2),
        epsilon = 0.5
    );

    assert!(feasibility.is_feasible(last, &path, 2, 3));
}
