use crate::fixture::{
    connector, corner, gap, ladder, looped_connector, motorway_chain, Harness, CONNECTOR_TRACK,
    CORNER_TRACK, GAP_CROSSING, LADDER_STRAIGHT, MOTORWAY_SPARSE,
};
use crate::graph::{RoadNetwork, SegmentId};
use crate::matcher::expand::BranchExpansion;
use crate::matcher::{Branch, DirectExpander, Direction, InitialSegmentLocator, MatchedSegment};

fn ids(branch: &Branch) -> Vec<u64> {
    branch.segments().iter().map(|segment| segment.id().0).collect()
}

fn ranges(branch: &Branch) -> Vec<(usize, usize)> {
    branch
        .segments()
        .iter()
        .map(|segment| (segment.start_index(), segment.end_index()))
        .collect()
}

/// A single-segment branch on `id`, matching `start..end`.
fn branch_on(harness: &Harness, id: u64, direction: Direction, start: usize, end: usize) -> Branch {
    let segment = harness
        .network
        .segment(SegmentId(id))
        .expect("fixture segment must exist");

    let mut matched = MatchedSegment::new(segment, start, direction);
    harness.context().points().assign(&mut matched, start, end);
    Branch::new(vec![matched])
}

#[test_log::test]
fn dense_points_are_followed_to_the_next_segment() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let expander = DirectExpander::new(&ctx);

    let BranchExpansion::Extended(children) = expander.expand_branch(&seeds[0]).expect("must expand") else {
        panic!("branch must be extended");
    };

    // The side street at node 3 does not match the next point
    assert_eq!(children.len(), 1);

    let child = &children[0];
    assert_eq!(ids(child), vec![1, 2, 3]);
    assert_eq!(ranges(child), vec![(0, 5), (5, 10), (10, 16)]);
    assert_eq!(child.segments()[2].direction(), Direction::StartToEnd);
    assert!(!child.is_finished());
}

#[test_log::test]
fn expansion_finishes_at_the_end_of_the_track() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let ctx = harness.context();

    let seeds = InitialSegmentLocator::new(&ctx).seed(0).expect("seeding must succeed");
    let expander = DirectExpander::new(&ctx);

    let first = expander.expand(seeds).expect("must expand");
    assert_eq!(first.extended.len(), 1);
    assert!(first.any_matched);

    let second = expander.expand(first.extended).expect("must expand");
    assert!(second.extended.is_empty());
    assert_eq!(second.finished.len(), 1);

    let done = &second.finished[0];
    assert_eq!(ids(done), vec![1, 2, 3, 4]);
    assert_eq!(done.frontier(), LADDER_STRAIGHT.len());
    assert!(done.is_monotonic(LADDER_STRAIGHT.len()));
}

#[test]
fn isolated_segment_stalls() {
    let harness = Harness::new(gap(), GAP_CROSSING);
    let ctx = harness.context();

    let branch = branch_on(&harness, 10, Direction::CenterToEnd, 0, 5);
    let expansion = DirectExpander::new(&ctx).expand(vec![branch]).expect("must expand");

    assert!(expansion.extended.is_empty());
    assert!(expansion.finished.is_empty());
    assert_eq!(expansion.stalled.len(), 1);
    assert_eq!(expansion.stalled[0].frontier(), 5);
}

#[test]
fn motorway_chain_is_walked_until_a_segment_matches() {
    let harness = Harness::new(motorway_chain(), MOTORWAY_SPARSE);
    let ctx = harness.context();

    let branch = branch_on(&harness, 200, Direction::CenterToEnd, 0, 1);

    let BranchExpansion::Extended(children) =
        DirectExpander::new(&ctx).expand_branch(&branch).expect("must expand")
    else {
        panic!("branch must be extended");
    };

    assert_eq!(children.len(), 1);

    let child = &children[0];
    assert_eq!(ids(child), vec![200, 201, 202, 203]);
    assert_eq!(ranges(child), vec![(0, 1), (1, 1), (1, 1), (1, 2)]);
    assert!(child.segments()[1..].iter().all(|s| s.direction() == Direction::StartToEnd));
}

#[test]
fn motorway_chain_stops_at_the_configured_length() {
    let mut harness = Harness::new(motorway_chain(), MOTORWAY_SPARSE);
    harness.config.max_motorway_chain = 1;
    let ctx = harness.context();

    let branch = branch_on(&harness, 200, Direction::CenterToEnd, 0, 1);
    let expansion = DirectExpander::new(&ctx).expand_branch(&branch).expect("must expand");

    assert!(matches!(expansion, BranchExpansion::Stalled));
}

#[test]
fn consumed_points_are_handed_to_a_better_successor() {
    let harness = Harness::new(corner(), CORNER_TRACK);
    let ctx = harness.context();

    let branch = branch_on(&harness, 20, Direction::CenterToEnd, 0, 3);

    let BranchExpansion::Extended(children) =
        DirectExpander::new(&ctx).expand_branch(&branch).expect("must expand")
    else {
        panic!("branch must be extended");
    };

    assert_eq!(children.len(), 1);
    assert_eq!(ids(&children[0]), vec![20, 21]);
    assert_eq!(ranges(&children[0]), vec![(0, 2), (2, 3)]);
}

#[test]
fn finished_branches_are_passed_through() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let ctx = harness.context();

    let branch = branch_on(&harness, 1, Direction::CenterToEnd, 0, 5);
    let mut finished = branch.clone();
    finished.finish();

    let expansion = DirectExpander::new(&ctx).expand(vec![finished]).expect("must expand");
    assert_eq!(expansion.finished.len(), 1);
    assert!(expansion.extended.is_empty());
}

#[test]
fn directions_are_corrected_against_successors() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let ctx = harness.context();

    // Heading towards node 1, although the successor lies at node 2
    let mut branch = branch_on(&harness, 1, Direction::CenterToStart, 0, 5);
    let second = branch_on(&harness, 2, Direction::StartToEnd, 5, 11);
    branch.push(second.segments()[0].clone());

    let mut branches = vec![branch];
    DirectExpander::new(&ctx).correct_segment_directions(&mut branches);

    let segments = branches[0].segments();
    assert_eq!(segments[0].direction(), Direction::CenterToEnd);
    assert_eq!(segments[1].direction(), Direction::StartToEnd);
}

#[test_log::test]
fn short_connector_is_passed_through() {
    let mut harness = Harness::new(connector(), CONNECTOR_TRACK);
    harness.config.matching_radius = 5.0;

    let ctx = harness.context();
    let branch = branch_on(&harness, 40, Direction::CenterToEnd, 0, 3);

    let BranchExpansion::Extended(children) =
        DirectExpander::new(&ctx).expand_branch(&branch).expect("must expand")
    else {
        panic!("branch must be extended over the connector");
    };

    assert_eq!(children.len(), 1);

    let child = &children[0];
    assert_eq!(ids(child), vec![40, 41, 42]);
    assert_eq!(ranges(child), vec![(0, 3), (3, 3), (3, 6)]);
    assert!(child.segments()[1].is_empty());
    assert_eq!(child.segments()[1].direction(), Direction::StartToEnd);
    assert!(child.is_finished());
}

#[test]
fn connector_longer_than_the_point_gap_stalls() {
    // The 41m between the last two fixes allow at most 61.5m of pass-through
    let mut harness = Harness::new(looped_connector(), CONNECTOR_TRACK);
    harness.config.matching_radius = 5.0;

    let ctx = harness.context();
    let branch = branch_on(&harness, 40, Direction::CenterToEnd, 0, 3);

    let expansion = DirectExpander::new(&ctx).expand_branch(&branch).expect("must expand");
    assert!(matches!(expansion, BranchExpansion::Stalled));
}

#[test]
fn connector_longer_than_the_configured_pass_through_stalls() {
    let mut harness = Harness::new(connector(), CONNECTOR_TRACK);
    harness.config.matching_radius = 5.0;
    harness.config.max_passthrough_length = 20.0;

    let ctx = harness.context();
    let branch = branch_on(&harness, 40, Direction::CenterToEnd, 0, 3);

    let expansion = DirectExpander::new(&ctx).expand_branch(&branch).expect("must expand");
    assert!(matches!(expansion, BranchExpansion::Stalled));
}
